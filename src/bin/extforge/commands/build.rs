//! `extforge build` command

use std::path::Path;
use std::sync::atomic::AtomicBool;

use anyhow::Result;

use crate::cli::BuildArgs;
use extforge::ops::forge_build::{build, BuildOptions};

pub fn execute(
    args: BuildArgs,
    manifest_path: Option<&Path>,
    verbose: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let manifest = super::manifest(manifest_path)?;

    let opts = BuildOptions {
        jobs: args.jobs,
        emit_plan: args.plan,
        build_dir: args.build_dir,
        verbose,
    };

    let result = build(&manifest, &opts, cancel)?;

    if let Some(output) = &result.output {
        eprintln!("     Archive {}", output.library.display());
        for module in &output.extensions {
            eprintln!("      Module {}", module.display());
        }
    }

    Ok(())
}
