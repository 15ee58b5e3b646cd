//! Platform resolution.
//!
//! Maps the host operating system onto a [`PlatformProfile`]: the default
//! compiler executable and the OpenMP runtime library to link. Unknown
//! systems fall back to the `default` profile, so resolution never fails.

use std::fmt;

use serde::Serialize;

/// Platforms with a dedicated profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKey {
    Linux,
    Darwin,
    Default,
}

impl PlatformKey {
    /// Map an operating system identifier to a platform key.
    ///
    /// Matching is case-insensitive; `macos` is accepted as an alias of
    /// `darwin` so `std::env::consts::OS` can be passed directly.
    pub fn from_os(os: &str) -> Self {
        match os.trim().to_ascii_lowercase().as_str() {
            "linux" => PlatformKey::Linux,
            "darwin" | "macos" => PlatformKey::Darwin,
            _ => PlatformKey::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::Linux => "linux",
            PlatformKey::Darwin => "darwin",
            PlatformKey::Default => "default",
        }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler and OpenMP runtime choice for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Which profile was selected
    pub platform_key: PlatformKey,
    /// Compiler executable name
    pub compiler: String,
    /// OpenMP runtime library name (empty when it must be supplied externally)
    pub openmp_lib: String,
}

impl PlatformProfile {
    /// Resolve the profile for an operating system identifier.
    pub fn resolve(os: &str) -> Self {
        let platform_key = PlatformKey::from_os(os);
        if platform_key == PlatformKey::Default {
            tracing::debug!("unrecognised platform `{}`, using default profile", os);
        }
        Self::for_key(platform_key)
    }

    /// The fixed profile for a platform key.
    pub fn for_key(platform_key: PlatformKey) -> Self {
        let (compiler, openmp_lib) = match platform_key {
            PlatformKey::Linux => ("g++", "gomp"),
            // Apple toolchains ship no libgomp; the runtime (usually libomp)
            // has to come from the OpenMP link override.
            PlatformKey::Darwin => ("g++", ""),
            PlatformKey::Default => ("g++", "gomp"),
        };

        PlatformProfile {
            platform_key,
            compiler: compiler.to_string(),
            openmp_lib: openmp_lib.to_string(),
        }
    }

    /// The default OpenMP link token, if the profile declares a runtime.
    pub fn openmp_link_flag(&self) -> Option<String> {
        if self.openmp_lib.is_empty() {
            None
        } else {
            Some(format!("-l{}", self.openmp_lib))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_has_a_compiler() {
        for os in ["linux", "darwin", "windows", "freebsd", ""] {
            let profile = PlatformProfile::resolve(os);
            assert!(!profile.compiler.is_empty(), "no compiler for `{}`", os);
        }
    }

    #[test]
    fn test_only_darwin_has_no_openmp_lib() {
        assert_eq!(PlatformProfile::resolve("linux").openmp_lib, "gomp");
        assert_eq!(PlatformProfile::resolve("windows").openmp_lib, "gomp");
        assert_eq!(PlatformProfile::resolve("darwin").openmp_lib, "");
        assert_eq!(PlatformProfile::resolve("macos").openmp_lib, "");
    }

    #[test]
    fn test_unknown_platform_resolves_to_default() {
        let profile = PlatformProfile::resolve("plan9");
        assert_eq!(profile.platform_key, PlatformKey::Default);
        assert_eq!(PlatformKey::from_os("Linux"), PlatformKey::Linux);
    }

    #[test]
    fn test_openmp_link_flag() {
        assert_eq!(
            PlatformProfile::for_key(PlatformKey::Linux).openmp_link_flag(),
            Some("-lgomp".to_string())
        );
        assert_eq!(
            PlatformProfile::for_key(PlatformKey::Darwin).openmp_link_flag(),
            None
        );
    }
}
