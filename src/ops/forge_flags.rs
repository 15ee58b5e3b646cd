//! Implementation of `extforge flags`.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::builder::adapter::strip_rejected_flags;
use crate::builder::descriptor::link_order;
use crate::builder::{BuildContext, ParallelismDirective};
use crate::core::macros::Macro;
use crate::core::platform::PlatformKey;

/// The resolved configuration of a build, as the compiler will see it.
#[derive(Debug, Clone, Serialize)]
pub struct FlagsReport {
    pub platform: PlatformKey,
    pub compiler: PathBuf,
    /// Driver flags after language-mode filtering
    pub driver_flags: Vec<String>,
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
    /// Package and compatibility macros shared by modules
    pub macros: Vec<Macro>,
    pub include_dirs: Vec<PathBuf>,
    /// Library link order shared by modules without a `libraries` override
    pub libraries: Vec<String>,
    pub directive: ParallelismDirective,
}

impl FlagsReport {
    pub fn new(ctx: &BuildContext) -> Self {
        FlagsReport {
            platform: ctx.profile.platform_key,
            compiler: ctx.toolchain().compiler_path().to_path_buf(),
            driver_flags: strip_rejected_flags(&ctx.driver_cflags, ctx.language),
            compile_flags: ctx.flags.compile_flags.clone(),
            link_flags: ctx.flags.link_flags.clone(),
            macros: ctx.globals.macros.clone(),
            include_dirs: ctx.globals.include_dirs.clone(),
            libraries: link_order(&ctx.globals.library_name, &ctx.globals.external_libs),
            directive: ctx.directive,
        }
    }

    /// Link-side view: search paths, libraries, then link flags.
    pub fn link_line(&self) -> String {
        let mut parts: Vec<String> = self.libraries.iter().map(|l| format!("-l{}", l)).collect();
        parts.extend(self.link_flags.iter().cloned());
        parts.join(" ")
    }

    /// Compile-side view: driver flags, macros, include paths, compile flags.
    pub fn compile_line(&self) -> String {
        let mut parts = self.driver_flags.clone();
        parts.extend(self.macros.iter().map(Macro::to_flag));
        parts.extend(self.include_dirs.iter().map(|d| format!("-I{}", d.display())));
        parts.extend(self.compile_flags.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for FlagsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "platform:      {}", self.platform)?;
        writeln!(f, "compiler:      {}", self.compiler.display())?;
        writeln!(f, "compile flags: {}", self.compile_flags.join(" "))?;
        writeln!(f, "link flags:    {}", self.link_flags.join(" "))?;
        writeln!(f, "libraries:     {}", self.libraries.join(" "))?;
        let macros: Vec<String> = self.macros.iter().map(|m| m.to_string()).collect();
        writeln!(f, "macros:        {}", macros.join(" "))?;
        writeln!(f, "jobs:          {}", self.directive)?;
        writeln!(f, "include dirs:")?;
        for dir in &self.include_dirs {
            writeln!(f, "  {}", dir.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::Manifest;
    use crate::util::config::EnvOverrides;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn report(vars: &[(&str, &str)]) -> FlagsReport {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/field.cpp"), "").unwrap();
        let path = tmp.path().join("Forge.toml");
        fs::write(
            &path,
            "[package]\nname = \"triumvirate\"\n\n[library]\nname = \"trv\"\nmacros = [\"TRV_EXTCALL\"]\ncompat_macros = [\"NPY_NO_DEPRECATED_API=NPY_1_7_API_VERSION\"]\n\n[build]\nexternal_libs = [\"gsl\", \"trv\", \"m\"]\n",
        )
        .unwrap();

        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let manifest = Manifest::load(&path).unwrap();
        let ctx = BuildContext::configure_for(&manifest, EnvOverrides::from_map("FORGE", &vars), "linux")
            .unwrap();
        FlagsReport::new(&ctx)
    }

    #[test]
    fn test_report_lists_openmp_and_library_order() {
        let report = report(&[]);

        assert_eq!(report.platform, PlatformKey::Linux);
        assert!(report.compile_flags.contains(&"-fopenmp".to_string()));
        assert_eq!(report.libraries, vec!["trv", "gsl", "m"]);
        assert_eq!(report.link_line(), "-ltrv -lgsl -lm -lfftw3_omp -lgomp");
    }

    #[test]
    fn test_report_driver_flags_filtered() {
        let report = report(&[("CFLAGS", "-Wstrict-prototypes -g"), ("FORGE_NO_OMP", "1")]);

        assert_eq!(report.driver_flags, vec!["-g"]);
        assert!(report
            .compile_line()
            .starts_with("-g -DTRV_EXTCALL -DNPY_NO_DEPRECATED_API=NPY_1_7_API_VERSION -I"));
        assert!(report.compile_flags.is_empty());
        assert!(report.to_string().contains("platform:      linux"));
    }
}
