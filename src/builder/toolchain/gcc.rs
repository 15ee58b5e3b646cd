//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use crate::core::language::Language;
use crate::core::platform::PlatformKey;

use super::{ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};

/// GCC-compatible toolchain (g++, clang++).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the compiler driver, used for compiling and linking
    pub compiler: PathBuf,
    /// Path to the archiver
    pub ar: PathBuf,
    /// Platform whose linker conventions apply
    pub platform: PlatformKey,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(compiler: PathBuf, ar: PathBuf, platform: PlatformKey) -> Self {
        GccToolchain {
            compiler,
            ar,
            platform,
        }
    }

    /// Flags producing a dynamically loadable module on this platform.
    fn module_link_flags(&self) -> &'static [&'static str] {
        match self.platform {
            // Loadable bundles resolve interpreter symbols at load time
            PlatformKey::Darwin => &["-bundle", "-undefined", "dynamic_lookup"],
            PlatformKey::Linux | PlatformKey::Default => &["-shared"],
        }
    }
}

impl Toolchain for GccToolchain {
    fn compiler_path(&self) -> &Path {
        &self.compiler
    }

    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.compiler);

        // Compile only, position independent for the shared modules
        cmd = cmd.arg("-c").arg("-fPIC");

        if lang == Language::C {
            cmd = cmd.arg("-x").arg("c");
        }

        // Include directories
        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        // Defines
        for define in &input.defines {
            cmd = cmd.arg(define.to_flag());
        }

        // Custom flags
        cmd = cmd.args(input.cflags.iter().cloned());

        // Input and output
        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        cmd
    }

    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.ar);

        // Create archive with symbol index, replace files
        cmd = cmd.arg("rcs");
        cmd = cmd.arg(input.output.display().to_string());

        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        cmd
    }

    fn link_shared_command(&self, input: &LinkInput, _lang: Language) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.compiler);

        cmd = cmd.args(self.module_link_flags().iter().copied());

        // Output
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        // Object files
        for obj in &input.objects {
            cmd = cmd.arg(obj.display().to_string());
        }

        // Library search paths
        for dir in &input.lib_dirs {
            cmd = cmd.arg(format!("-L{}", dir.display()));
        }

        // Libraries, order preserved
        for lib in &input.libs {
            cmd = cmd.arg(format!("-l{}", lib));
        }

        // Custom flags
        cmd = cmd.args(input.ldflags.iter().cloned());

        cmd
    }
}
