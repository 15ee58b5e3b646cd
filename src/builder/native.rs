//! Native compiler driver.
//!
//! Runs the steps of a [`BuildPlan`](crate::builder::plan::BuildPlan): the
//! library's compile steps and archive, then every extension's translate,
//! compile and link steps. Steps run on a dedicated rayon pool sized to the
//! resolved job count; one job means strictly serial execution.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::builder::errors::BuildError;
use crate::builder::plan::{CompileStep, ExtensionPlan, LibraryPlan, LinkStep, TranslateStep};
use crate::builder::toolchain::{ArchiveInput, CommandSpec, CompileInput, LinkInput, Toolchain};
use crate::core::language::Language;
use crate::util::fs::ensure_parent;
use crate::util::log::native_message;
use crate::util::process::ProcessBuilder;

/// Native builder.
pub struct NativeBuilder<'a> {
    toolchain: &'a dyn Toolchain,
    /// Driver flags, placed before each step's own flags
    driver_cflags: &'a [String],
    jobs: usize,
    cancel: &'a AtomicBool,
    progress: Option<ProgressBar>,
}

impl<'a> NativeBuilder<'a> {
    /// Create a new native builder.
    pub fn new(
        toolchain: &'a dyn Toolchain,
        driver_cflags: &'a [String],
        jobs: Option<usize>,
        cancel: &'a AtomicBool,
    ) -> Self {
        NativeBuilder {
            toolchain,
            driver_cflags,
            jobs: jobs.unwrap_or(1).max(1),
            cancel,
            progress: None,
        }
    }

    /// Advance a progress bar after every finished step.
    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Compile and archive the static library.
    pub fn build_library(&self, plan: &LibraryPlan) -> Result<PathBuf> {
        tracing::info!(
            "building static library `{}` from {} source(s)",
            plan.name,
            plan.compile_steps.len()
        );

        self.in_pool(|| {
            plan.compile_steps
                .par_iter()
                .try_for_each(|step| self.compile(step))
        })?;

        let input = ArchiveInput {
            objects: plan.archive.objects.clone(),
            output: plan.archive.output.clone(),
        };
        let spec = self.toolchain.archive_command(&input);
        self.run(spec, "archiving", &plan.archive.output, Language::C, false)?;

        Ok(plan.archive.output.clone())
    }

    /// Build every extension module.
    ///
    /// Modules are independent: they translate, compile and link in parallel
    /// with no relative order.
    pub fn build_extensions(&self, plans: &[ExtensionPlan]) -> Result<Vec<PathBuf>> {
        tracing::info!("building {} extension module(s)", plans.len());

        self.in_pool(|| {
            plans
                .par_iter()
                .map(|plan| self.build_extension(plan))
                .collect()
        })
    }

    fn build_extension(&self, plan: &ExtensionPlan) -> Result<PathBuf> {
        tracing::debug!("building extension `{}`", plan.qualified_name);

        if let Some(step) = &plan.translate {
            self.translate(step)?;
        }

        plan.compile_steps
            .par_iter()
            .try_for_each(|step| self.compile(step))?;

        self.link(&plan.link)
            .with_context(|| format!("failed to build extension `{}`", plan.qualified_name))?;

        Ok(plan.link.output.clone())
    }

    fn translate(&self, step: &TranslateStep) -> Result<()> {
        let spec = CommandSpec::new(&step.program).args(step.args.iter().cloned());
        self.run(spec, "translating", &step.output, Language::Cxx, false)
    }

    fn compile(&self, step: &CompileStep) -> Result<()> {
        let mut cflags = self.driver_cflags.to_vec();
        cflags.extend(step.cflags.iter().cloned());

        let input = CompileInput {
            source: step.source.clone(),
            output: step.output.clone(),
            include_dirs: step.include_dirs.clone(),
            defines: step.defines.clone(),
            cflags,
        };

        let spec = self.toolchain.compile_command(&input, step.lang);
        self.run(spec, "compiling", &step.output, step.lang, true)
    }

    fn link(&self, step: &LinkStep) -> Result<()> {
        let input = LinkInput {
            objects: step.objects.clone(),
            output: step.output.clone(),
            lib_dirs: step.lib_dirs.clone(),
            libs: step.libs.clone(),
            ldflags: step.ldflags.clone(),
        };

        let spec = self.toolchain.link_shared_command(&input, step.lang);
        self.run(spec, "linking", &step.output, step.lang, true)
    }

    /// Run one tool invocation.
    ///
    /// Diagnostics of a successful native tool are relayed as warnings.
    fn run(
        &self,
        spec: CommandSpec,
        action: &'static str,
        output: &Path,
        lang: Language,
        native: bool,
    ) -> Result<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(BuildError::Cancelled.into());
        }

        ensure_parent(output)?;

        let cmd = ProcessBuilder::from(spec);
        tracing::debug!("{}", native_message(&cmd.display_command(), native, lang));

        let result = cmd.exec()?;
        let stderr = String::from_utf8_lossy(&result.stderr);

        if !result.status.success() {
            return Err(BuildError::Toolchain {
                action,
                output: output.to_path_buf(),
                command: cmd.display_command(),
                status: result.status.code(),
                stderr: stderr.into_owned(),
            }
            .into());
        }

        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::warn!("{}", native_message(line, native, lang));
        }

        if let Some(pb) = &self.progress {
            pb.inc(1);
        }

        Ok(())
    }

    fn in_pool<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send,
        T: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .context("failed to start build workers")?;
        pool.install(op)
    }
}
