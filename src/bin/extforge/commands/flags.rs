//! `extforge flags` command

use std::path::Path;

use anyhow::Result;

use crate::cli::FlagsArgs;
use extforge::ops::forge_build::configure;
use extforge::ops::FlagsReport;

pub fn execute(args: FlagsArgs, manifest_path: Option<&Path>) -> Result<()> {
    let manifest = super::manifest(manifest_path)?;
    let ctx = configure(&manifest, None)?;
    let report = FlagsReport::new(&ctx);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.link {
        println!("{}", report.link_line());
    } else if args.compile {
        println!("{}", report.compile_line());
    } else {
        print!("{}", report);
    }

    Ok(())
}
