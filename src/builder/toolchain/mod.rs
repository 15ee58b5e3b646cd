//! Toolchain abstraction for the native build.
//!
//! A [`Toolchain`] only generates commands; running them is the job of the
//! [`NativeBuilder`](crate::builder::native::NativeBuilder), and adjusting
//! them for the language mode and job count is the job of the
//! [`ToolchainAdapter`](crate::builder::adapter::ToolchainAdapter).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::language::Language;
use crate::core::macros::Macro;

mod gcc;

pub use gcc::GccToolchain;

/// A command to execute: program and arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    /// The program to run (e.g., "g++", "ar")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor defines
    pub defines: Vec<Macro>,
    /// Compiler flags, driver flags first
    pub cflags: Vec<String>,
}

/// Input for an archive step (creating static library).
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    /// Object files to archive
    pub objects: Vec<PathBuf>,
    /// Output archive file
    pub output: PathBuf,
}

/// Input for a link step.
#[derive(Debug, Clone)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output file
    pub output: PathBuf,
    /// Library search paths
    pub lib_dirs: Vec<PathBuf>,
    /// Libraries to link (without -l prefix), in link order
    pub libs: Vec<String>,
    /// Additional linker flags, placed after the libraries
    pub ldflags: Vec<String>,
}

/// Trait for toolchain implementations.
///
/// Each toolchain knows how to generate commands for its specific compiler.
pub trait Toolchain: Send + Sync {
    /// Get the compiler path.
    fn compiler_path(&self) -> &Path;

    /// Generate a compile command.
    fn compile_command(&self, input: &CompileInput, lang: Language) -> CommandSpec;

    /// Generate an archive command (create static library).
    fn archive_command(&self, input: &ArchiveInput) -> CommandSpec;

    /// Generate a link command for a dynamically loadable module.
    fn link_shared_command(&self, input: &LinkInput, lang: Language) -> CommandSpec;

    /// Get the object file extension.
    fn object_extension(&self) -> &str {
        "o"
    }

    /// Get the static library file name for a library name.
    fn static_lib_filename(&self, name: &str) -> String {
        format!("lib{}.a", name)
    }
}
