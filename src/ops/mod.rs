//! High-level operations.
//!
//! This module contains the implementation of extforge commands.

pub mod forge_build;
pub mod forge_clean;
pub mod forge_flags;

pub use forge_build::{
    build, build_configured, build_tracked, configure, load_manifest, BuildOptions, BuildResult,
};
pub use forge_clean::clean;
pub use forge_flags::FlagsReport;
