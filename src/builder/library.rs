//! The shared static library.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::core::errors::ConfigError;
use crate::core::macros::Macro;

/// Static library compiled from every translation unit in one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeLibraryDescriptor {
    pub name: String,
    /// Translation units, sorted by path
    pub sources: Vec<PathBuf>,
    /// Package macros only; compatibility macros are for extensions
    pub macros: Vec<Macro>,
    pub compile_flags: Vec<String>,
    pub include_dirs: Vec<PathBuf>,
}

impl NativeLibraryDescriptor {
    /// Collect the translation units of `src_dir` (non-recursive).
    pub fn from_dir(
        name: &str,
        src_dir: &Path,
        macros: Vec<Macro>,
        compile_flags: Vec<String>,
        include_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let sources = translation_units(src_dir)?;

        tracing::debug!(
            "native library `{}`: {} translation unit(s) in {}",
            name,
            sources.len(),
            src_dir.display()
        );

        Ok(NativeLibraryDescriptor {
            name: name.to_string(),
            sources,
            macros,
            compile_flags,
            include_dirs: vec![include_dir],
        })
    }
}

/// Every regular file directly inside `dir`, sorted for a stable build order.
pub fn translation_units(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::MissingSourceDir {
            path: dir.to_path_buf(),
        });
    }

    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    sources.sort();

    if sources.is_empty() {
        return Err(ConfigError::EmptySourceDir {
            path: dir.to_path_buf(),
        });
    }

    Ok(sources)
}
