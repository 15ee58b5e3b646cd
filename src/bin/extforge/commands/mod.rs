//! Command implementations

pub mod build;
pub mod clean;
pub mod flags;

use std::path::Path;

use anyhow::{Context, Result};

use extforge::ops::load_manifest;
use extforge::Manifest;

/// Load the manifest named on the command line, or find it from the cwd.
pub fn manifest(explicit: Option<&Path>) -> Result<Manifest> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    load_manifest(explicit, &cwd)
}
