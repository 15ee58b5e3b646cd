//! Build context - the configured, immutable description of one build.
//!
//! [`BuildContext::configure`] is the whole configure phase: it resolves the
//! platform, assembles flags, enumerates the native library and builds every
//! extension descriptor. It validates everything up front and reports all
//! problems at once, so no compiler runs on a broken configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::builder::descriptor::{ExtensionDescriptor, ExtensionDescriptorBuilder, GlobalSettings};
use crate::builder::flags::BuildFlags;
use crate::builder::library::NativeLibraryDescriptor;
use crate::builder::parallel::ParallelismDirective;
use crate::builder::toolchain::{GccToolchain, Toolchain};
use crate::core::errors::ConfigError;
use crate::core::language::Language;
use crate::core::macros::{Macro, MacroSet};
use crate::core::manifest::{InterfaceConfig, Manifest};
use crate::core::platform::PlatformProfile;
use crate::util::config::EnvOverrides;

/// Output locations inside the build directory.
#[derive(Debug, Clone, Serialize)]
pub struct BuildLayout {
    /// Root of all build output
    pub build_dir: PathBuf,
    /// Package name, the subdirectory of built modules
    pub package: String,
}

impl BuildLayout {
    pub fn new(build_dir: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        BuildLayout {
            build_dir: build_dir.into(),
            package: package.into(),
        }
    }

    /// Object files and the static library.
    pub fn temp_dir(&self) -> PathBuf {
        self.build_dir.join("temp")
    }

    /// Object directory of one target.
    pub fn obj_dir(&self, target: &str) -> PathBuf {
        self.temp_dir().join(target)
    }

    /// Translated interface sources.
    pub fn gen_dir(&self) -> PathBuf {
        self.build_dir.join("gen")
    }

    /// Built extension modules.
    pub fn module_dir(&self) -> PathBuf {
        self.build_dir.join("lib").join(&self.package)
    }
}

/// Translator producing C++ from interface sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceTranslator {
    pub program: String,
    pub args: Vec<String>,
    /// `(key, value)` pairs passed as `-X key=value`
    pub directives: Vec<(String, String)>,
}

impl InterfaceTranslator {
    pub fn from_config(config: &InterfaceConfig) -> Option<Self> {
        let program = config.translator()?;
        Some(InterfaceTranslator {
            program: program.to_string(),
            args: config.args.clone(),
            directives: config
                .directives
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }
}

/// The configured build.
#[derive(Clone)]
pub struct BuildContext {
    /// Language mode of the compiler driver
    pub language: Language,

    /// Active platform profile
    pub profile: PlatformProfile,

    /// Environment captured at configure time
    pub env: EnvOverrides,

    /// Assembled compile and link flags
    pub flags: BuildFlags,

    /// Defaults shared by every extension module
    pub globals: GlobalSettings,

    /// The shared static library
    pub library: NativeLibraryDescriptor,

    /// One descriptor per configured module
    pub extensions: Vec<ExtensionDescriptor>,

    /// Job directive from the environment
    pub directive: ParallelismDirective,

    /// Interface translator, if interface sources need translating
    pub translator: Option<InterfaceTranslator>,

    /// Output locations
    pub layout: BuildLayout,

    /// Suffix of built extension modules
    pub ext_suffix: String,

    /// Base driver flags, before language-mode filtering
    pub driver_cflags: Vec<String>,

    /// Toolchain implementation
    pub toolchain: Arc<dyn Toolchain>,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("language", &self.language)
            .field("profile", &self.profile)
            .field("compiler", &self.toolchain.compiler_path())
            .field("flags", &self.flags)
            .field("library", &self.library.name)
            .field("extensions", &self.extensions.len())
            .field("directive", &self.directive)
            .field("layout", &self.layout)
            .finish()
    }
}

impl BuildContext {
    /// Configure a build for the host platform.
    pub fn configure(manifest: &Manifest, env: EnvOverrides) -> Result<Self, ConfigError> {
        Self::configure_for(manifest, env, std::env::consts::OS)
    }

    /// Configure a build for an explicit operating system identifier.
    pub fn configure_for(
        manifest: &Manifest,
        env: EnvOverrides,
        os: &str,
    ) -> Result<Self, ConfigError> {
        let profile = PlatformProfile::resolve(os);
        let flags = BuildFlags::assemble(&env, &profile);
        let mut errors = Vec::new();

        let macros = MacroSet::new(
            parse_macros("[library] macros", &manifest.library.macros, &mut errors),
            parse_macros(
                "[library] compat_macros",
                &manifest.library.compat_macros,
                &mut errors,
            ),
        );

        let include_dir = manifest.include_dir();
        let library = NativeLibraryDescriptor::from_dir(
            manifest.library_name(),
            &manifest.native_src_dir(),
            macros.package.clone(),
            flags.compile_flags.clone(),
            include_dir.clone(),
        );

        let mut include_dirs = vec![include_dir];
        include_dirs.extend(
            manifest
                .build
                .include_dirs
                .iter()
                .map(|dir| manifest.manifest_dir.join(dir)),
        );
        include_dirs.extend(env_include_dirs(&env.includes, manifest));

        let globals = GlobalSettings {
            package: manifest.package.name.clone(),
            package_dir: manifest.package_dir(),
            native_src_dir: manifest.native_src_dir(),
            interface_ext: manifest.interface.extension.trim_start_matches('.').to_string(),
            library_name: manifest.library_name().to_string(),
            macros: macros.all(),
            include_dirs,
            external_libs: manifest.build.external_libs.clone(),
            flags: flags.clone(),
        };

        let builder = ExtensionDescriptorBuilder::new(&globals);
        let mut extensions = Vec::new();
        for (name, options) in &manifest.modules {
            match builder.build(name, options) {
                Ok(ext) => extensions.push(ext),
                Err(e) => errors.extend(e.into_errors()),
            }
        }

        let library = match library {
            Ok(library) => library,
            Err(e) => {
                errors.insert(0, e);
                return Err(ConfigError::from_batch(errors));
            }
        };

        if let Some(err) = ConfigError::collect(errors) {
            return Err(err);
        }

        let compiler = resolve_program(env.compiler.as_deref().unwrap_or(&profile.compiler));
        let ar = manifest
            .toolchain
            .ar
            .clone()
            .or_else(|| env.ar.clone())
            .unwrap_or_else(|| PathBuf::from("ar"));

        let mut driver_cflags = manifest.toolchain.cflags.clone();
        driver_cflags.extend(env.driver_cflags.split_whitespace().map(String::from));

        let directive = ParallelismDirective::from_option(env.parallel.as_deref());

        tracing::info!(
            "configured {} extension module(s) for platform `{}` with {}",
            extensions.len(),
            profile.platform_key,
            compiler.display()
        );

        Ok(BuildContext {
            language: manifest.build.language,
            toolchain: Arc::new(GccToolchain::new(compiler, ar, profile.platform_key)),
            profile,
            env,
            flags,
            globals,
            library,
            extensions,
            directive,
            translator: InterfaceTranslator::from_config(&manifest.interface),
            layout: BuildLayout::new(manifest.build_dir(), manifest.package.name.clone()),
            ext_suffix: manifest.build.ext_suffix.clone(),
            driver_cflags,
        })
    }

    /// Replace the toolchain.
    pub fn with_toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Replace the build directory.
    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.layout.build_dir = build_dir.into();
        self
    }

    /// Get the active toolchain.
    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }
}

fn parse_macros(context: &str, specs: &[String], errors: &mut Vec<ConfigError>) -> Vec<Macro> {
    let mut macros = Vec::new();
    for spec in specs {
        match Macro::parse(spec) {
            Some(m) => macros.push(m),
            None => errors.push(ConfigError::MalformedMacro {
                context: context.to_string(),
                spec: spec.clone(),
            }),
        }
    }
    macros
}

/// Include directories from the environment.
///
/// `-I` markers are optional. Directories inside the package are dropped,
/// since the package include directory always comes first.
fn env_include_dirs(includes: &str, manifest: &Manifest) -> Vec<PathBuf> {
    let package_dir = manifest.package_dir();
    let relative = manifest.package.dir.to_string_lossy();
    let filter_relative = !(relative.is_empty() || relative == ".");

    includes
        .split_whitespace()
        .map(|token| token.strip_prefix("-I").unwrap_or(token))
        .filter(|token| !token.is_empty())
        .filter(|token| {
            let inside = Path::new(token).starts_with(&package_dir)
                || (filter_relative && token.contains(relative.as_ref()));
            if inside {
                tracing::debug!("dropping package-internal include `{}`", token);
            }
            !inside
        })
        .map(PathBuf::from)
        .collect()
}

/// Resolve a program through PATH, keeping the bare name if it is not found.
fn resolve_program(name: &str) -> PathBuf {
    match which::which(name) {
        Ok(path) => path,
        Err(_) => {
            tracing::debug!("`{}` not found in PATH; using it as given", name);
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[package]
name = "triumvirate"
dir = "src/triumvirate"
native_src_dir = "src/modules"

[library]
name = "trv"
macros = ["TRV_EXTCALL"]
compat_macros = ["NPY_NO_DEPRECATED_API=NPY_1_7_API_VERSION"]

[build]
external_libs = ["gsl", "gslcblas", "m", "fftw3"]
include_dirs = ["/opt/numpy/include"]

[modules.parameters]

[modules._threept]
auto_cpp_source = true
"#;

    fn package(manifest: &str) -> (TempDir, Manifest) {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("src/triumvirate");
        fs::create_dir_all(pkg.join("src/modules")).unwrap();
        fs::create_dir_all(pkg.join("include")).unwrap();
        fs::write(pkg.join("parameters.pyx"), "").unwrap();
        fs::write(pkg.join("_threept.pyx"), "").unwrap();
        fs::write(pkg.join("src/modules/threept.cpp"), "").unwrap();
        fs::write(pkg.join("src/modules/field.cpp"), "").unwrap();

        let path = tmp.path().join("Forge.toml");
        fs::write(&path, manifest).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        (tmp, manifest)
    }

    fn env(pairs: &[(&str, &str)]) -> EnvOverrides {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvOverrides::from_map("FORGE", &vars)
    }

    #[test]
    fn test_configure_builds_every_descriptor() {
        let (_tmp, manifest) = package(MANIFEST);
        let ctx = BuildContext::configure_for(&manifest, env(&[]), "linux").unwrap();

        assert_eq!(ctx.library.name, "trv");
        assert_eq!(ctx.library.sources.len(), 2);
        assert_eq!(ctx.library.macros, vec![Macro::new("TRV_EXTCALL", None::<String>)]);

        let names: Vec<_> = ctx.extensions.iter().map(|e| e.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["triumvirate._threept", "triumvirate.parameters"]);

        for ext in &ctx.extensions {
            assert_eq!(ext.libraries[0], "trv");
            assert_eq!(ext.macros.len(), 2);
            assert!(ext.include_dirs[0].ends_with("src/triumvirate/include"));
            assert_eq!(ext.include_dirs[1], PathBuf::from("/opt/numpy/include"));
        }
        assert_eq!(ctx.directive, ParallelismDirective::Unset);
        assert_eq!(ctx.translator.as_ref().unwrap().program, "cython");
    }

    #[test]
    fn test_configure_reports_all_errors() {
        let manifest_text = format!(
            "{}\n[modules._fftlog]\nauto_cpp_source = true\n\n[modules.dataobjs]\nextra_cpp_sources = [\"missing.cpp\"]\n",
            MANIFEST.replace("[\"TRV_EXTCALL\"]", "[\"TRV_EXTCALL\", \"=bad\"]")
        );
        let (_tmp, manifest) = package(&manifest_text);

        let err = BuildContext::configure_for(&manifest, env(&[]), "linux").unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(message.contains("=bad"));
        assert!(message.contains("_fftlog.pyx"));
        assert!(message.contains("fftlog.cpp"));
        assert!(message.contains("dataobjs.pyx"));
        assert!(message.contains("missing.cpp"));
    }

    #[test]
    fn test_env_includes_filtered() {
        let (tmp, manifest) = package(MANIFEST);
        let inside = tmp.path().join("src/triumvirate/include");
        let includes = format!("-I/usr/include/gsl {} -Isrc/triumvirate/include", inside.display());

        let ctx =
            BuildContext::configure_for(&manifest, env(&[("FORGE_INCLUDES", &includes)]), "linux")
                .unwrap();

        let dirs = &ctx.globals.include_dirs;
        assert_eq!(dirs.len(), 3);
        assert_eq!(dirs[2], PathBuf::from("/usr/include/gsl"));
    }

    #[test]
    fn test_compiler_override_and_directive() {
        let (_tmp, manifest) = package(MANIFEST);
        let ctx = BuildContext::configure_for(
            &manifest,
            env(&[
                ("FORGE_CXX", "definitely-not-a-compiler++"),
                ("FORGE_BUILD_PARALLEL", "-j3"),
            ]),
            "darwin",
        )
        .unwrap();

        assert_eq!(
            ctx.toolchain().compiler_path(),
            Path::new("definitely-not-a-compiler++")
        );
        assert_eq!(ctx.directive, ParallelismDirective::Fixed(3));
        assert_eq!(ctx.flags.link_flags, vec!["-lfftw3_omp"]);
    }

    #[test]
    fn test_driver_cflags_collected() {
        let content = format!("{}\n[toolchain]\ncflags = [\"-Wall\"]\n", MANIFEST);
        let (_tmp, manifest) = package(&content);
        let ctx = BuildContext::configure_for(
            &manifest,
            env(&[("CFLAGS", "-Wstrict-prototypes -O2")]),
            "linux",
        )
        .unwrap();

        assert_eq!(ctx.driver_cflags, vec!["-Wall", "-Wstrict-prototypes", "-O2"]);
    }
}
