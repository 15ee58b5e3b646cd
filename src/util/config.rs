//! Environment configuration for a build.
//!
//! Every setting is read from a `<PREFIX>_<NAME>` environment variable, where
//! the prefix comes from the manifest (`FORGE` unless overridden):
//!
//! - `<PREFIX>_CXX`: compiler executable override
//! - `<PREFIX>_CFLAGS`: extra compile flags
//! - `<PREFIX>_LDFLAGS`: extra link flags (`-l` tokens are ignored)
//! - `<PREFIX>_INCLUDES`: extra include directories
//! - `<PREFIX>_NO_OMP`: disables OpenMP when set to any value
//! - `<PREFIX>_LDOMP`: OpenMP link flags replacing the platform default
//! - `<PREFIX>_BUILD_PARALLEL`: job directive (`-j` or `-jN`)
//!
//! The unprefixed `CFLAGS` and `AR` variables feed the toolchain driver the
//! way they do for other C build tools.
//!
//! All variables are optional; absence yields the platform defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

/// Environment settings captured once at configure time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvOverrides {
    /// Compiler executable override
    pub compiler: Option<String>,

    /// Extra compile flags (whitespace separated)
    pub cflags: String,

    /// Extra link flags (whitespace separated)
    pub ldflags: String,

    /// Extra include directories (whitespace separated, `-I` optional)
    pub includes: String,

    /// OpenMP disabled
    pub no_openmp: bool,

    /// OpenMP link flags replacing the platform default
    pub openmp_link: Option<String>,

    /// Job directive (`-j`, `-jN`)
    pub parallel: Option<String>,

    /// Base driver flags (`CFLAGS`)
    pub driver_cflags: String,

    /// Archiver override (`AR`)
    pub ar: Option<PathBuf>,
}

impl EnvOverrides {
    /// Capture the overrides from the process environment.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Capture the overrides from an explicit map.
    pub fn from_map(prefix: &str, vars: &HashMap<String, String>) -> Self {
        Self::from_lookup(prefix, |key| vars.get(key).cloned())
    }

    /// Capture the overrides through a variable lookup function.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", prefix, name));
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let overrides = EnvOverrides {
            compiler: non_empty(var("CXX")),
            cflags: var("CFLAGS").unwrap_or_default(),
            ldflags: var("LDFLAGS").unwrap_or_default(),
            includes: var("INCLUDES").unwrap_or_default(),
            no_openmp: var("NO_OMP").is_some(),
            openmp_link: var("LDOMP"),
            parallel: non_empty(var("BUILD_PARALLEL")),
            driver_cflags: lookup("CFLAGS").unwrap_or_default(),
            ar: non_empty(lookup("AR")).map(PathBuf::from),
        };

        tracing::debug!("environment overrides ({}_*): {:?}", prefix, overrides);
        overrides
    }
}
