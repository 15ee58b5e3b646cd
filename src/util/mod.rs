//! Shared utilities

pub mod config;
pub mod fs;
pub mod log;
pub mod process;

pub use config::EnvOverrides;
