//! Extension module descriptors.
//!
//! One [`ExtensionDescriptor`] is built per entry of the module table. It
//! starts from the build-wide [`GlobalSettings`] and applies the module's
//! overrides, each of which replaces its default as a whole.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::flags::BuildFlags;
use crate::core::errors::ConfigError;
use crate::core::macros::Macro;
use crate::core::manifest::ModuleOptions;

/// Build-wide defaults shared by every extension module.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalSettings {
    /// Package name, the prefix of qualified module names
    pub package: String,
    /// Directory of the interface sources
    pub package_dir: PathBuf,
    /// Directory of the native sources
    pub native_src_dir: PathBuf,
    /// Interface source extension (without the dot)
    pub interface_ext: String,
    /// Name of the shared static library
    pub library_name: String,
    /// Package and compatibility macros
    pub macros: Vec<Macro>,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// External libraries in link order
    pub external_libs: Vec<String>,
    /// Assembled compile and link flags
    pub flags: BuildFlags,
}

/// Everything needed to compile and link one extension module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDescriptor {
    /// `<package>.<module>`
    pub qualified_name: String,
    /// Module name as configured
    pub module_name: String,
    /// Interface source first, then native sources
    pub sources: Vec<PathBuf>,
    pub macros: Vec<Macro>,
    pub include_dirs: Vec<PathBuf>,
    /// Native library first, then external libraries
    pub libraries: Vec<String>,
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
}

impl ExtensionDescriptor {
    /// The interface source of the module, if the descriptor has any sources.
    pub fn interface_source(&self) -> Option<&PathBuf> {
        self.sources.first()
    }

    /// The native sources compiled alongside the interface source.
    pub fn native_sources(&self) -> &[PathBuf] {
        self.sources
            .split_first()
            .map(|(_, rest)| rest)
            .unwrap_or_default()
    }
}

/// Builds extension descriptors against a fixed set of global settings.
pub struct ExtensionDescriptorBuilder<'a> {
    globals: &'a GlobalSettings,
}

impl<'a> ExtensionDescriptorBuilder<'a> {
    pub fn new(globals: &'a GlobalSettings) -> Self {
        ExtensionDescriptorBuilder { globals }
    }

    /// Build the descriptor of one module.
    ///
    /// All problems with the module are reported together: an invalid name,
    /// malformed macro overrides and every missing source file.
    pub fn build(
        &self,
        module_name: &str,
        options: &ModuleOptions,
    ) -> Result<ExtensionDescriptor, ConfigError> {
        let g = self.globals;
        let mut errors = Vec::new();

        if !is_valid_module_name(module_name) {
            return Err(ConfigError::InvalidModuleName {
                name: module_name.to_string(),
            });
        }

        let sources = self.sources(module_name, options);
        for path in &sources {
            if !path.is_file() {
                errors.push(ConfigError::MissingSource {
                    module: module_name.to_string(),
                    path: path.clone(),
                });
            }
        }

        let macros = match &options.define_macros {
            Some(specs) => {
                let mut macros = Vec::new();
                for spec in specs {
                    match Macro::parse(spec) {
                        Some(m) => macros.push(m),
                        None => errors.push(ConfigError::MalformedMacro {
                            context: format!("module `{}`", module_name),
                            spec: spec.clone(),
                        }),
                    }
                }
                macros
            }
            None => g.macros.clone(),
        };

        if let Some(err) = ConfigError::collect(errors) {
            return Err(err);
        }

        let external_libs = options.libraries.as_ref().unwrap_or(&g.external_libs);

        let descriptor = ExtensionDescriptor {
            qualified_name: format!("{}.{}", g.package, module_name),
            module_name: module_name.to_string(),
            sources,
            macros,
            include_dirs: options
                .include_dirs
                .clone()
                .unwrap_or_else(|| g.include_dirs.clone()),
            libraries: link_order(&g.library_name, external_libs),
            compile_flags: options
                .extra_compile_args
                .clone()
                .unwrap_or_else(|| g.flags.compile_flags.clone()),
            link_flags: options
                .extra_link_args
                .clone()
                .unwrap_or_else(|| g.flags.link_flags.clone()),
        };

        tracing::debug!(
            "configured {} ({} source(s))",
            descriptor.qualified_name,
            descriptor.sources.len()
        );

        Ok(descriptor)
    }

    /// Source files of a module, interface source first.
    fn sources(&self, module_name: &str, options: &ModuleOptions) -> Vec<PathBuf> {
        let g = self.globals;

        let mut sources = vec![g
            .package_dir
            .join(format!("{}.{}", module_name, g.interface_ext))];

        if options.auto_cpp_source {
            sources.push(g.native_src_dir.join(native_source_name(module_name)));
        }

        for extra in &options.extra_cpp_sources {
            sources.push(g.native_src_dir.join(extra));
        }

        sources
    }
}

/// Native source file name derived from a module name.
///
/// Leading underscores are dropped, so the private module `_particles` maps
/// to `particles.cpp`.
pub fn native_source_name(module_name: &str) -> String {
    format!("{}.cpp", module_name.trim_start_matches('_'))
}

/// Library list with the native library pinned first.
///
/// Symbols are resolved left to right by order-sensitive linkers, so the
/// static library must precede the libraries it depends on.
pub fn link_order(native_lib: &str, external_libs: &[String]) -> Vec<String> {
    std::iter::once(native_lib.to_string())
        .chain(
            external_libs
                .iter()
                .filter(|lib| lib.as_str() != native_lib)
                .cloned(),
        )
        .collect()
}

/// Module names must be identifiers.
pub fn is_valid_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
