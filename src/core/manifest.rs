//! Forge.toml manifest parsing.
//!
//! The manifest is the declarative input of a build: where the package's
//! sources live, which macros and libraries every translation unit gets, and
//! the module table naming each extension module to build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::language::Language;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Forge.toml";

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "FORGE";

/// Package metadata from the [package] section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name, used as the prefix of every extension module name
    pub name: String,

    /// Directory holding the interface sources (relative to the manifest)
    #[serde(default = "default_package_dir")]
    pub dir: PathBuf,

    /// Header directory, relative to `dir`
    #[serde(default = "default_include_dir")]
    pub include_dir: PathBuf,

    /// Native (C/C++) source directory, relative to `dir`
    #[serde(default = "default_native_src_dir")]
    pub native_src_dir: PathBuf,
}

fn default_package_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_dir() -> PathBuf {
    PathBuf::from("include")
}

fn default_native_src_dir() -> PathBuf {
    PathBuf::from("src")
}

/// The shared static library from the [library] section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library name (defaults to the package name)
    #[serde(default)]
    pub name: Option<String>,

    /// Package-specific macros (`NAME` or `NAME=VALUE`)
    #[serde(default)]
    pub macros: Vec<String>,

    /// Numeric-library compatibility macros, extensions only
    #[serde(default)]
    pub compat_macros: Vec<String>,
}

/// Build-wide settings from the [build] section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Language mode of the compiler driver
    #[serde(default)]
    pub language: Language,

    /// Prefix of the environment variables read at configure time
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// External libraries, in link order
    #[serde(default)]
    pub external_libs: Vec<String>,

    /// Additional include directories for extension modules
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// File suffix of built extension modules
    #[serde(default = "default_ext_suffix")]
    pub ext_suffix: String,

    /// Build output directory (relative to the manifest)
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            language: Language::default(),
            env_prefix: default_env_prefix(),
            external_libs: Vec::new(),
            include_dirs: Vec::new(),
            ext_suffix: default_ext_suffix(),
            build_dir: default_build_dir(),
        }
    }
}

fn default_env_prefix() -> String {
    DEFAULT_ENV_PREFIX.to_string()
}

fn default_ext_suffix() -> String {
    ".so".to_string()
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("build")
}

/// Interface source handling from the [interface] section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// File extension of interface sources
    #[serde(default = "default_interface_ext")]
    pub extension: String,

    /// Translator turning interface sources into C++ (empty = compile directly)
    #[serde(default = "default_translator")]
    pub translator: String,

    /// Extra translator arguments
    #[serde(default = "default_translator_args")]
    pub args: Vec<String>,

    /// Translator directives, passed as `-X key=value`
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        InterfaceConfig {
            extension: default_interface_ext(),
            translator: default_translator(),
            args: default_translator_args(),
            directives: BTreeMap::new(),
        }
    }
}

impl InterfaceConfig {
    /// The translator program, if interface sources need translating.
    pub fn translator(&self) -> Option<&str> {
        let t = self.translator.trim();
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    }
}

fn default_interface_ext() -> String {
    "pyx".to_string()
}

fn default_translator() -> String {
    "cython".to_string()
}

fn default_translator_args() -> Vec<String> {
    vec!["--cplus".to_string()]
}

/// Toolchain settings from the [toolchain] section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolchainSettings {
    /// Archiver (defaults to `AR` or `ar`)
    #[serde(default)]
    pub ar: Option<PathBuf>,

    /// Base driver flags, applied to every compile before per-target flags
    #[serde(default)]
    pub cflags: Vec<String>,
}

/// Per-module options from a `[modules.<name>]` table.
///
/// Override fields replace the corresponding global default wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleOptions {
    /// Add `<native_src_dir>/<name without leading underscores>.cpp`
    #[serde(default)]
    pub auto_cpp_source: bool,

    /// Additional native sources, relative to the native source directory
    #[serde(default)]
    pub extra_cpp_sources: Vec<String>,

    /// Override of the global macros
    #[serde(default)]
    pub define_macros: Option<Vec<String>>,

    /// Override of the global include directories
    #[serde(default)]
    pub include_dirs: Option<Vec<PathBuf>>,

    /// Override of the external libraries (the native library stays first)
    #[serde(default)]
    pub libraries: Option<Vec<String>>,

    /// Override of the assembled compile flags
    #[serde(default)]
    pub extra_compile_args: Option<Vec<String>>,

    /// Override of the assembled link flags
    #[serde(default)]
    pub extra_link_args: Option<Vec<String>>,
}

/// The parsed Forge.toml manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: PackageMetadata,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub interface: InterfaceConfig,

    #[serde(default)]
    pub toolchain: ToolchainSettings,

    /// Extension modules to build, by module name
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleOptions>,

    /// The directory containing this manifest
    #[serde(skip)]
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        manifest.manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        if manifest.modules.is_empty() {
            tracing::warn!(
                "manifest at {} declares no [modules]; only the native library will be built",
                path.display()
            );
        }

        Ok(manifest)
    }

    /// Name of the shared static library.
    pub fn library_name(&self) -> &str {
        self.library.name.as_deref().unwrap_or(&self.package.name)
    }

    /// Directory of the interface sources.
    pub fn package_dir(&self) -> PathBuf {
        self.manifest_dir.join(&self.package.dir)
    }

    /// Package header directory.
    pub fn include_dir(&self) -> PathBuf {
        self.package_dir().join(&self.package.include_dir)
    }

    /// Native source directory.
    pub fn native_src_dir(&self) -> PathBuf {
        self.package_dir().join(&self.package.native_src_dir)
    }

    /// Build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.manifest_dir.join(&self.build.build_dir)
    }
}

/// Find the manifest by walking up from `start`.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}
