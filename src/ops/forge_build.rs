//! Implementation of `extforge build`.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::Result;

use crate::builder::{
    BuildContext, BuildExecutor, BuildOutput, BuildPipeline, BuildPlan, PipelineState,
};
use crate::core::errors::ConfigError;
use crate::core::manifest::{find_manifest, Manifest};
use crate::util::config::EnvOverrides;

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Number of parallel jobs; overrides the environment directive
    pub jobs: Option<usize>,

    /// Print the build plan as JSON instead of building
    pub emit_plan: bool,

    /// Build output directory, overriding the manifest
    pub build_dir: Option<PathBuf>,

    /// Verbose output
    pub verbose: bool,
}

/// Result of a build.
#[derive(Debug)]
pub struct BuildResult {
    /// Final pipeline state
    pub state: PipelineState,

    /// The executed (or emitted) plan
    pub plan: BuildPlan,

    /// Built artifacts; `None` when only the plan was emitted
    pub output: Option<BuildOutput>,
}

/// Locate and load the manifest.
///
/// An explicit path is used as given; otherwise the manifest is searched
/// for from `cwd` upwards.
pub fn load_manifest(explicit: Option<&Path>, cwd: &Path) -> Result<Manifest> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_manifest(cwd).ok_or_else(|| ConfigError::ManifestNotFound {
            dir: cwd.to_path_buf(),
        })?,
    };
    Manifest::load(&path)
}

/// Configure a build from the manifest and the process environment.
pub fn configure(manifest: &Manifest, build_dir: Option<&Path>) -> Result<BuildContext> {
    let env = EnvOverrides::from_env(&manifest.build.env_prefix);
    let ctx = BuildContext::configure(manifest, env)?;
    Ok(match build_dir {
        Some(dir) => ctx.with_build_dir(dir),
        None => ctx,
    })
}

/// Build the package.
///
/// Configuration errors abort before any native tool runs.
pub fn build(manifest: &Manifest, opts: &BuildOptions, cancel: &AtomicBool) -> Result<BuildResult> {
    build_tracked(manifest, opts, cancel, &mut BuildPipeline::new())
}

/// Build the package, driving `pipeline` from `Unconfigured`.
///
/// A configuration error leaves the pipeline `Failed`.
pub fn build_tracked(
    manifest: &Manifest,
    opts: &BuildOptions,
    cancel: &AtomicBool,
    pipeline: &mut BuildPipeline,
) -> Result<BuildResult> {
    let ctx = match configure(manifest, opts.build_dir.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => {
            pipeline.fail();
            return Err(err);
        }
    };
    run(&ctx, opts, cancel, pipeline)
}

/// Build from an already configured context.
pub fn build_configured(
    ctx: &BuildContext,
    opts: &BuildOptions,
    cancel: &AtomicBool,
) -> Result<BuildResult> {
    run(ctx, opts, cancel, &mut BuildPipeline::new())
}

fn run(
    ctx: &BuildContext,
    opts: &BuildOptions,
    cancel: &AtomicBool,
    pipeline: &mut BuildPipeline,
) -> Result<BuildResult> {
    pipeline.advance(PipelineState::Configured)?;

    let plan = BuildPlan::new(ctx);

    if opts.emit_plan {
        println!("{}", plan.to_json()?);
        return Ok(BuildResult {
            state: pipeline.state(),
            plan,
            output: None,
        });
    }

    let output = BuildExecutor::new(ctx, cancel)
        .jobs(opts.jobs)
        .verbose(opts.verbose)
        .execute(&plan, pipeline)?;

    Ok(BuildResult {
        state: pipeline.state(),
        plan,
        output: Some(output),
    })
}
