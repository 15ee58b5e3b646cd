//! Build executor with progress reporting.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::adapter::ToolchainAdapter;
use crate::builder::context::BuildContext;
use crate::builder::pipeline::{BuildPipeline, PipelineError, PipelineState};
use crate::builder::plan::BuildPlan;

/// Artifacts of a finished build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The static library
    pub library: PathBuf,
    /// Extension modules, in plan order
    pub extensions: Vec<PathBuf>,
}

impl BuildOutput {
    pub fn artifact_count(&self) -> usize {
        1 + self.extensions.len()
    }
}

/// Runs the library and extension phases of a configured build.
pub struct BuildExecutor<'a> {
    ctx: &'a BuildContext,
    cancel: &'a AtomicBool,
    jobs: Option<usize>,
    verbose: bool,
}

impl<'a> BuildExecutor<'a> {
    /// Create a new build executor.
    pub fn new(ctx: &'a BuildContext, cancel: &'a AtomicBool) -> Self {
        BuildExecutor {
            ctx,
            cancel,
            jobs: None,
            verbose: false,
        }
    }

    /// Fix the job count, overriding the environment directive.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute a build plan, advancing `pipeline` through the build states.
    ///
    /// The pipeline must be `Configured`. On any failure it ends `Failed`.
    pub fn execute(&self, plan: &BuildPlan, pipeline: &mut BuildPipeline) -> Result<BuildOutput> {
        let result = self.run_phases(plan, pipeline);
        if result.is_err() {
            pipeline.fail();
        }
        result
    }

    fn run_phases(&self, plan: &BuildPlan, pipeline: &mut BuildPipeline) -> Result<BuildOutput> {
        if pipeline.state() != PipelineState::Configured {
            return Err(PipelineError::InvalidTransition {
                from: pipeline.state(),
                to: PipelineState::LibraryBuilt,
            }
            .into());
        }

        let start = Instant::now();

        if self.verbose {
            eprintln!(" Translating {} interface source(s)", plan.translate_count());
            eprintln!("   Compiling {} file(s)", plan.compile_count());
            eprintln!("     Linking {} target(s)", plan.link_count());
        }

        let total = plan.translate_count() + plan.compile_count() + plan.link_count();
        let pb = if !self.verbose && total > 1 {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            Some(pb)
        } else {
            None
        };

        let adapter = ToolchainAdapter::from_context(self.ctx)
            .with_parallelism(self.jobs, self.ctx.directive)
            .with_progress(pb.clone());

        if let Some(pb) = &pb {
            pb.set_message(plan.library.name.clone());
        }
        let library = adapter.build_library(&plan.library, self.cancel)?;
        pipeline.advance(PipelineState::LibraryBuilt)?;

        if let Some(pb) = &pb {
            pb.set_message("extensions");
        }
        let extensions = adapter.build_extensions(&plan.extensions, self.cancel)?;
        pipeline.advance(PipelineState::ExtensionsBuilt)?;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let output = BuildOutput {
            library,
            extensions,
        };

        eprintln!(
            "    Finished {} target(s) in {:.2}s",
            output.artifact_count(),
            start.elapsed().as_secs_f64()
        );

        pipeline.advance(PipelineState::Done)?;
        Ok(output)
    }
}
