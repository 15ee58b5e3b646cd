//! Native extension build system.
//!
//! Configuration produces an immutable [`BuildContext`]; the context becomes a
//! [`BuildPlan`]; the [`BuildExecutor`] runs the plan through the
//! [`ToolchainAdapter`], advancing a [`BuildPipeline`] as each phase completes.

pub mod adapter;
pub mod context;
pub mod descriptor;
pub mod errors;
pub mod executor;
pub mod flags;
pub mod library;
pub mod native;
pub mod parallel;
pub mod pipeline;
pub mod plan;
pub mod toolchain;

pub use adapter::{strip_rejected_flags, ToolchainAdapter};
pub use context::{BuildContext, BuildLayout, InterfaceTranslator};
pub use descriptor::{ExtensionDescriptor, ExtensionDescriptorBuilder, GlobalSettings};
pub use errors::BuildError;
pub use executor::{BuildExecutor, BuildOutput};
pub use flags::BuildFlags;
pub use library::NativeLibraryDescriptor;
pub use native::NativeBuilder;
pub use parallel::ParallelismDirective;
pub use pipeline::{BuildPipeline, PipelineError, PipelineState};
pub use plan::BuildPlan;
pub use toolchain::{CommandSpec, GccToolchain, Toolchain};
