//! `extforge clean` command

use std::path::Path;

use anyhow::Result;

use crate::cli::CleanArgs;
use extforge::ops::clean;

pub fn execute(args: CleanArgs, manifest_path: Option<&Path>) -> Result<()> {
    let manifest = super::manifest(manifest_path)?;

    match clean(&manifest, args.build_dir.as_deref())? {
        Some(dir) => eprintln!("     Removed {}", dir.display()),
        None => eprintln!("     Nothing to clean"),
    }

    Ok(())
}
