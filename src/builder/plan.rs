//! Build plan generation.
//!
//! A BuildPlan lays the configured descriptors out as concrete steps: the
//! native library's compile and archive steps, then each extension module's
//! translate, compile and link steps. The plan is serializable so it can be
//! inspected with `extforge build --plan` without running anything.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::builder::context::{BuildContext, BuildLayout, InterfaceTranslator};
use crate::builder::descriptor::ExtensionDescriptor;
use crate::builder::library::NativeLibraryDescriptor;
use crate::core::language::Language;
use crate::core::macros::Macro;

/// A complete build plan.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// The shared static library, built first
    pub library: LibraryPlan,

    /// Extension modules, independent of each other
    pub extensions: Vec<ExtensionPlan>,
}

/// Steps producing the static library.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryPlan {
    pub name: String,
    pub compile_steps: Vec<CompileStep>,
    pub archive: ArchiveStep,
}

/// Steps producing one extension module.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionPlan {
    /// `<package>.<module>`
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translate: Option<TranslateStep>,
    pub compile_steps: Vec<CompileStep>,
    pub link: LinkStep,
}

/// A single compilation step.
#[derive(Debug, Clone, Serialize)]
pub struct CompileStep {
    /// Source file
    pub source: PathBuf,

    /// Output object file
    pub output: PathBuf,

    /// Target name
    pub target: String,

    /// Include directories
    pub include_dirs: Vec<PathBuf>,

    /// Preprocessor defines
    pub defines: Vec<Macro>,

    /// Compiler flags (driver flags are added at execution)
    pub cflags: Vec<String>,

    /// Source language
    pub lang: Language,
}

/// A step to create a static library.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveStep {
    /// Object files to archive
    pub objects: Vec<PathBuf>,
    /// Output archive file
    pub output: PathBuf,
    /// Target name
    pub target: String,
}

/// A step translating an interface source into C++.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateStep {
    pub program: String,
    pub args: Vec<String>,
    pub source: PathBuf,
    pub output: PathBuf,
    pub target: String,
}

/// A step linking one extension module.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStep {
    /// Object files to link
    pub objects: Vec<PathBuf>,

    /// Output file
    pub output: PathBuf,

    /// Target name
    pub target: String,

    /// Library search paths
    pub lib_dirs: Vec<PathBuf>,

    /// Libraries, native library first
    pub libs: Vec<String>,

    /// Linker flags
    pub ldflags: Vec<String>,

    /// Language of the linker driver
    pub lang: Language,
}

impl BuildPlan {
    /// Lay out the configured build as steps.
    pub fn new(ctx: &BuildContext) -> Self {
        let obj_ext = ctx.toolchain().object_extension();
        let archive = ctx
            .layout
            .temp_dir()
            .join(ctx.toolchain().static_lib_filename(&ctx.library.name));

        let library = library_plan(&ctx.library, &ctx.layout, &archive, obj_ext, ctx.language);

        let extensions = ctx
            .extensions
            .iter()
            .map(|ext| {
                extension_plan(
                    ext,
                    ctx.translator.as_ref(),
                    &ctx.layout,
                    &ctx.globals.native_src_dir,
                    obj_ext,
                    &ctx.ext_suffix,
                    ctx.language,
                )
            })
            .collect();

        BuildPlan {
            library,
            extensions,
        }
    }

    /// Number of compile steps.
    pub fn compile_count(&self) -> usize {
        self.library.compile_steps.len()
            + self
                .extensions
                .iter()
                .map(|e| e.compile_steps.len())
                .sum::<usize>()
    }

    /// Number of archive and link steps.
    pub fn link_count(&self) -> usize {
        1 + self.extensions.len()
    }

    /// Number of translate steps.
    pub fn translate_count(&self) -> usize {
        self.extensions.iter().filter(|e| e.translate.is_some()).count()
    }

    /// Serialize the plan as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn library_plan(
    lib: &NativeLibraryDescriptor,
    layout: &BuildLayout,
    archive: &Path,
    obj_ext: &str,
    lang: Language,
) -> LibraryPlan {
    let obj_dir = layout.obj_dir(&lib.name);

    let compile_steps: Vec<CompileStep> = lib
        .sources
        .iter()
        .map(|source| CompileStep {
            source: source.clone(),
            output: object_path(&obj_dir, source, obj_ext),
            target: lib.name.clone(),
            include_dirs: lib.include_dirs.clone(),
            defines: lib.macros.clone(),
            cflags: lib.compile_flags.clone(),
            lang,
        })
        .collect();

    LibraryPlan {
        name: lib.name.clone(),
        archive: ArchiveStep {
            objects: compile_steps.iter().map(|s| s.output.clone()).collect(),
            output: archive.to_path_buf(),
            target: lib.name.clone(),
        },
        compile_steps,
    }
}

fn extension_plan(
    ext: &ExtensionDescriptor,
    translator: Option<&InterfaceTranslator>,
    layout: &BuildLayout,
    native_src_dir: &Path,
    obj_ext: &str,
    ext_suffix: &str,
    lang: Language,
) -> ExtensionPlan {
    let target = ext.qualified_name.clone();
    let obj_dir = layout.obj_dir(&ext.module_name);

    let interface = ext.interface_source();
    let translate = translator.zip(interface).map(|(t, interface)| {
        let output = layout.gen_dir().join(format!("{}.cpp", ext.module_name));
        TranslateStep {
            program: t.program.clone(),
            args: translate_args(t, interface, &output),
            source: interface.clone(),
            output,
            target: target.clone(),
        }
    });

    let interface_cpp = translate
        .as_ref()
        .map(|t| t.output.clone())
        .or_else(|| interface.cloned());

    let compile_step = |source: &PathBuf, output: PathBuf| CompileStep {
        source: source.clone(),
        output,
        target: target.clone(),
        include_dirs: ext.include_dirs.clone(),
        defines: ext.macros.clone(),
        cflags: ext.compile_flags.clone(),
        lang,
    };

    // Interface objects get their own directory so `dataobjs.pyx` and a
    // native `dataobjs.cpp` do not collide.
    let mut compile_steps = Vec::new();
    if let Some(interface_cpp) = &interface_cpp {
        compile_steps.push(compile_step(
            interface_cpp,
            object_path(&obj_dir.join("interface"), interface_cpp, obj_ext),
        ));
    }
    for source in ext.native_sources() {
        let rel = confined_relative(source, native_src_dir);
        compile_steps.push(compile_step(source, obj_dir.join(rel).with_extension(obj_ext)));
    }

    let link = LinkStep {
        objects: compile_steps.iter().map(|s| s.output.clone()).collect(),
        output: layout
            .module_dir()
            .join(format!("{}{}", ext.module_name, ext_suffix)),
        target: target.clone(),
        lib_dirs: vec![layout.temp_dir()],
        libs: ext.libraries.clone(),
        ldflags: ext.link_flags.clone(),
        lang,
    };

    ExtensionPlan {
        qualified_name: target,
        translate,
        compile_steps,
        link,
    }
}

fn translate_args(t: &InterfaceTranslator, source: &Path, output: &Path) -> Vec<String> {
    let mut args = t.args.clone();
    for (key, value) in &t.directives {
        args.push("-X".to_string());
        args.push(format!("{}={}", key, value));
    }
    args.push(source.display().to_string());
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args
}

/// Path of `source` relative to `base`, made safe to join onto an object dir.
///
/// Roots and prefixes are dropped and each `..` becomes `__`, so sources
/// outside `base` still land below the object dir and stay distinct.
fn confined_relative(source: &Path, base: &Path) -> PathBuf {
    source
        .strip_prefix(base)
        .unwrap_or(source)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_os_string()),
            Component::ParentDir => Some(OsString::from("__")),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect()
}

fn object_path(obj_dir: &Path, source: &Path, obj_ext: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    obj_dir.join(stem).with_extension(obj_ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Manifest;
    use crate::util::config::EnvOverrides;
    use std::fs;
    use tempfile::TempDir;

    fn configured(interface: &str) -> (TempDir, BuildContext) {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(pkg.join("dataobjs.pyx"), "").unwrap();
        fs::write(pkg.join("_twopt.pyx"), "").unwrap();
        fs::write(pkg.join("src/dataobjs.cpp"), "").unwrap();
        fs::write(pkg.join("src/twopt.cpp"), "").unwrap();

        let content = format!(
            r#"
[package]
name = "triumvirate"
dir = "pkg"

[library]
name = "trv"

[build]
external_libs = ["gsl", "m"]

{}

[modules.dataobjs]
auto_cpp_source = true

[modules._twopt]
auto_cpp_source = true
"#,
            interface
        );
        let path = tmp.path().join("Forge.toml");
        fs::write(&path, content).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let ctx = BuildContext::configure_for(&manifest, EnvOverrides::default(), "linux").unwrap();
        (tmp, ctx)
    }

    #[test]
    fn test_library_plan() {
        let (tmp, ctx) = configured("");
        let plan = BuildPlan::new(&ctx);

        assert_eq!(plan.library.compile_steps.len(), 2);
        assert_eq!(
            plan.library.archive.output,
            tmp.path().join("build/temp/libtrv.a")
        );
        assert_eq!(plan.library.archive.objects.len(), 2);
        assert_eq!(plan.link_count(), 3);
        assert_eq!(plan.compile_count(), 6);
    }

    #[test]
    fn test_extension_plan_with_translator() {
        let (tmp, ctx) = configured(
            "[interface]\nargs = [\"--cplus\"]\ndirectives = { language_level = \"3\" }\n",
        );
        let plan = BuildPlan::new(&ctx);

        let dataobjs = &plan.extensions[1];
        assert_eq!(dataobjs.qualified_name, "triumvirate.dataobjs");

        let translate = dataobjs.translate.as_ref().unwrap();
        assert_eq!(translate.program, "cython");
        assert_eq!(translate.output, tmp.path().join("build/gen/dataobjs.cpp"));
        assert_eq!(&translate.args[..3], &["--cplus", "-X", "language_level=3"]);

        assert_eq!(dataobjs.compile_steps[0].source, translate.output);
        assert_ne!(
            dataobjs.compile_steps[0].output,
            dataobjs.compile_steps[1].output
        );

        assert_eq!(dataobjs.link.libs, vec!["trv", "gsl", "m"]);
        assert_eq!(
            dataobjs.link.output,
            tmp.path().join("build/lib/triumvirate/dataobjs.so")
        );
        assert_eq!(dataobjs.link.lib_dirs, vec![tmp.path().join("build/temp")]);
        assert_eq!(plan.translate_count(), 2);
    }

    #[test]
    fn test_extension_plan_without_translator() {
        let (_tmp, ctx) = configured("[interface]\ntranslator = \"\"\n");
        let plan = BuildPlan::new(&ctx);

        let twopt = &plan.extensions[0];
        assert!(twopt.translate.is_none());
        assert!(twopt.compile_steps[0].source.ends_with("_twopt.pyx"));
        assert_eq!(plan.translate_count(), 0);
    }

    #[test]
    fn test_outside_sources_stay_in_module_obj_dir() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("pkg");
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(pkg.join("a.pyx"), "").unwrap();
        fs::write(pkg.join("b.pyx"), "").unwrap();
        fs::write(pkg.join("src/field.cpp"), "").unwrap();
        fs::write(pkg.join("common.cpp"), "").unwrap();
        let helpers = tmp.path().join("helpers.cpp");
        fs::write(&helpers, "").unwrap();

        let content = format!(
            r#"
[package]
name = "triumvirate"
dir = "pkg"

[interface]
translator = ""

[modules.a]
extra_cpp_sources = ['{}', "../common.cpp"]

[modules.b]
extra_cpp_sources = ["../common.cpp"]
"#,
            helpers.display()
        );
        let path = tmp.path().join("Forge.toml");
        fs::write(&path, content).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        let ctx = BuildContext::configure_for(&manifest, EnvOverrides::default(), "linux").unwrap();

        let plan = BuildPlan::new(&ctx);
        let temp = tmp.path().join("build/temp");
        let (a, b) = (&plan.extensions[0], &plan.extensions[1]);

        for step in a.compile_steps.iter().chain(&b.compile_steps) {
            assert!(step.output.starts_with(&temp), "{}", step.output.display());
            assert!(step
                .output
                .components()
                .all(|c| c != Component::ParentDir));
        }
        assert!(a.compile_steps[1].output.starts_with(temp.join("a")));
        assert!(a.compile_steps[1].output.ends_with("helpers.o"));
        assert_eq!(a.compile_steps[2].output, temp.join("a/__/common.o"));
        assert_eq!(b.compile_steps[1].output, temp.join("b/__/common.o"));
    }

    #[test]
    fn test_confined_relative() {
        let base = Path::new("/pkg/src");
        assert_eq!(
            confined_relative(Path::new("/pkg/src/sub/x.cpp"), base),
            PathBuf::from("sub/x.cpp")
        );
        assert_eq!(
            confined_relative(Path::new("/pkg/src/../y.cpp"), base),
            PathBuf::from("__/y.cpp")
        );
        assert_eq!(
            confined_relative(Path::new("/opt/z.cpp"), base),
            PathBuf::from("opt/z.cpp")
        );
    }

    #[test]
    fn test_plan_serializes() {
        let (_tmp, ctx) = configured("");
        let json = BuildPlan::new(&ctx).to_json().unwrap();
        assert!(json.contains("\"library\""));
        assert!(json.contains("triumvirate._twopt"));
    }
}
