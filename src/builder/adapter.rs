//! Toolchain adapter.
//!
//! Sits between the pipeline and the [`NativeBuilder`]: it filters the base
//! driver flags for the active language mode and installs the job count
//! before each of the two build phases is delegated.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;

use crate::builder::context::BuildContext;
use crate::builder::native::NativeBuilder;
use crate::builder::parallel::{effective_jobs, ParallelismDirective};
use crate::builder::plan::{ExtensionPlan, LibraryPlan};
use crate::builder::toolchain::Toolchain;
use crate::core::language::Language;

/// Remove flags the compiler rejects in the given language mode.
pub fn strip_rejected_flags(flags: &[String], lang: Language) -> Vec<String> {
    let rejected = lang.rejected_flags();
    flags
        .iter()
        .filter(|flag| {
            let keep = !rejected.contains(&flag.as_str());
            if !keep {
                tracing::debug!("dropping `{}` in {} mode", flag, lang.display_name());
            }
            keep
        })
        .cloned()
        .collect()
}

/// Adapts the compiler driver to the language mode and job count.
#[derive(Clone)]
pub struct ToolchainAdapter {
    toolchain: Arc<dyn Toolchain>,
    language: Language,
    compiler_flags: Vec<String>,
    jobs: Option<usize>,
    progress: Option<ProgressBar>,
}

impl ToolchainAdapter {
    /// Create an adapter, filtering the base driver flags for `language`.
    pub fn new(toolchain: Arc<dyn Toolchain>, language: Language, base_cflags: &[String]) -> Self {
        ToolchainAdapter {
            toolchain,
            language,
            compiler_flags: strip_rejected_flags(base_cflags, language),
            jobs: None,
            progress: None,
        }
    }

    /// Create an adapter for a configured build.
    pub fn from_context(ctx: &BuildContext) -> Self {
        Self::new(ctx.toolchain.clone(), ctx.language, &ctx.driver_cflags)
    }

    /// Install the job count. A job count fixed by the caller always wins.
    pub fn with_parallelism(mut self, caller: Option<usize>, directive: ParallelismDirective) -> Self {
        self.jobs = effective_jobs(caller, directive);
        match (caller, self.jobs) {
            (Some(n), _) => tracing::debug!("using {} job(s) requested by the caller", n),
            (None, Some(n)) => tracing::debug!("using {} job(s) from {}", n, directive),
            (None, None) => tracing::debug!("no job count set; building serially"),
        }
        self
    }

    /// Report finished steps on a progress bar.
    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Driver flags after language-mode filtering.
    pub fn compiler_flags(&self) -> &[String] {
        &self.compiler_flags
    }

    /// Resolved job count; `None` means serial.
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Language mode of the driver.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Build the static library.
    pub fn build_library(&self, plan: &LibraryPlan, cancel: &AtomicBool) -> Result<PathBuf> {
        self.native(cancel).build_library(plan)
    }

    /// Build all extension modules.
    pub fn build_extensions(
        &self,
        plans: &[ExtensionPlan],
        cancel: &AtomicBool,
    ) -> Result<Vec<PathBuf>> {
        self.native(cancel).build_extensions(plans)
    }

    fn native<'a>(&'a self, cancel: &'a AtomicBool) -> NativeBuilder<'a> {
        NativeBuilder::new(self.toolchain.as_ref(), &self.compiler_flags, self.jobs, cancel)
            .with_progress(self.progress.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::GccToolchain;
    use crate::core::platform::PlatformKey;

    fn adapter(language: Language, flags: &[&str]) -> ToolchainAdapter {
        let toolchain = Arc::new(GccToolchain::new(
            PathBuf::from("g++"),
            PathBuf::from("ar"),
            PlatformKey::Linux,
        ));
        let flags: Vec<String> = flags.iter().map(|s| s.to_string()).collect();
        ToolchainAdapter::new(toolchain, language, &flags)
    }

    #[test]
    fn test_strict_prototypes_stripped_in_cxx_mode() {
        let adapter = adapter(Language::Cxx, &["-O2", "-Wstrict-prototypes", "-Wall"]);
        assert_eq!(adapter.compiler_flags(), &["-O2", "-Wall"]);
    }

    #[test]
    fn test_c_mode_keeps_flags() {
        let flags = vec!["-Wstrict-prototypes".to_string()];
        assert_eq!(strip_rejected_flags(&flags, Language::C), flags);
    }

    #[test]
    fn test_caller_jobs_win_over_directive() {
        let adapter = adapter(Language::Cxx, &[])
            .with_parallelism(Some(2), ParallelismDirective::Fixed(8));
        assert_eq!(adapter.jobs(), Some(2));
    }

    #[test]
    fn test_directive_installed_when_caller_unset() {
        let adapter = adapter(Language::Cxx, &[]);
        assert_eq!(adapter.jobs(), None);

        let fixed = adapter
            .clone()
            .with_parallelism(None, ParallelismDirective::Fixed(4));
        assert_eq!(fixed.jobs(), Some(4));

        let serial = adapter.with_parallelism(None, ParallelismDirective::Unset);
        assert_eq!(serial.jobs(), None);
    }
}
