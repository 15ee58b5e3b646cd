//! extforge - a build orchestrator for hybrid native extension packages
//!
//! A package is one shared static library, compiled from every translation
//! unit in a native source directory, plus extension modules built from
//! interface sources and linked against that library. This crate resolves
//! the platform toolchain, assembles flags and per-module descriptors, and
//! drives the native build with correct link order and optional parallelism.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use builder::{BuildContext, BuildError, BuildPlan, PipelineState};
pub use self::core::{ConfigError, Manifest};
pub use util::EnvOverrides;
