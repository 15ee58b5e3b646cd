//! extforge CLI - build a native library and its extension modules

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use extforge::util::log::init_logging;
use extforge::{BuildError, ConfigError};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        std::process::exit(report(e));
    }
}

fn run(cli: Cli) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
            tracing::debug!("interrupt handler not installed: {}", e);
        }
    }

    let manifest_path = cli.manifest_path.as_deref();

    match cli.command {
        Commands::Build(args) => {
            commands::build::execute(args, manifest_path, cli.verbose, &cancel)
        }
        Commands::Flags(args) => commands::flags::execute(args, manifest_path),
        Commands::Clean(args) => commands::clean::execute(args, manifest_path),
    }
}

/// Print an error and pick the exit status.
fn report(err: anyhow::Error) -> i32 {
    let err = match err.downcast::<ConfigError>() {
        Ok(config) => {
            // Paths in configuration errors must stay on one line
            let _ = miette::set_hook(Box::new(|_| {
                Box::new(miette::MietteHandlerOpts::new().width(400).build())
            }));
            eprintln!("{:?}", miette::Report::new(config));
            return 1;
        }
        Err(err) => err,
    };

    if let Some(build) = err.downcast_ref::<BuildError>() {
        if let Some(stderr) = build.stderr() {
            eprint!("{}", stderr);
        }
        eprintln!("error: {:#}", err);
        return build.exit_code();
    }

    eprintln!("error: {:#}", err);
    1
}
