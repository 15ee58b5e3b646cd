//! Configuration error types.
//!
//! Everything that can be wrong with a build configuration is detected while
//! configuring, before any compiler process is spawned.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error in the build configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("could not find `Forge.toml` in `{}` or any parent directory", .dir.display())]
    #[diagnostic(
        code(extforge::config::no_manifest),
        help("run extforge from the package root or pass --manifest-path")
    )]
    ManifestNotFound { dir: PathBuf },

    #[error("module `{module}`: source file not found: {}", .path.display())]
    #[diagnostic(
        code(extforge::config::missing_source),
        help("check the module's `auto_cpp_source` and `extra_cpp_sources` entries")
    )]
    MissingSource { module: String, path: PathBuf },

    #[error("native source directory not found: {}", .path.display())]
    #[diagnostic(
        code(extforge::config::missing_source_dir),
        help("set `native_src_dir` in [package] relative to the package `dir`")
    )]
    MissingSourceDir { path: PathBuf },

    #[error("native source directory contains no translation units: {}", .path.display())]
    #[diagnostic(code(extforge::config::empty_source_dir))]
    EmptySourceDir { path: PathBuf },

    #[error("{context}: malformed macro `{spec}` (expected NAME or NAME=VALUE)")]
    #[diagnostic(code(extforge::config::malformed_macro))]
    MalformedMacro { context: String, spec: String },

    #[error("cannot resolve module `{name}`: module names must be identifiers")]
    #[diagnostic(
        code(extforge::config::invalid_module),
        help("module names start with a letter or underscore and contain only letters, digits and underscores")
    )]
    InvalidModuleName { name: String },

    #[error("invalid build configuration:{}", bullet_list(.errors))]
    #[diagnostic(
        code(extforge::config::invalid),
        help("fix the entries above in Forge.toml; nothing has been compiled")
    )]
    Invalid { errors: Vec<ConfigError> },
}

impl ConfigError {
    /// Collapse a batch of errors into one, keeping single errors unwrapped.
    ///
    /// Returns `None` for an empty batch.
    pub fn collect(errors: Vec<ConfigError>) -> Option<ConfigError> {
        if errors.is_empty() {
            None
        } else {
            Some(Self::from_batch(errors))
        }
    }

    /// Combine a non-empty batch of errors.
    pub fn from_batch(mut errors: Vec<ConfigError>) -> ConfigError {
        if errors.len() == 1 {
            if let Some(err) = errors.pop() {
                return err;
            }
        }
        ConfigError::Invalid { errors }
    }

    /// Flatten into individual errors.
    pub fn into_errors(self) -> Vec<ConfigError> {
        match self {
            ConfigError::Invalid { errors } => errors
                .into_iter()
                .flat_map(ConfigError::into_errors)
                .collect(),
            other => vec![other],
        }
    }
}

fn bullet_list(errors: &[ConfigError]) -> String {
    errors.iter().map(|e| format!("\n  - {}", e)).collect()
}
