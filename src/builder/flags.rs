//! Compile and link flag assembly.
//!
//! Externally supplied flags come first, in the order given; computed
//! defaults are appended after them. Every flag appears at most once, at the
//! position of its first occurrence.

use serde::Serialize;

use crate::core::platform::PlatformProfile;
use crate::util::config::EnvOverrides;

/// Compile flags enabling OpenMP in the native sources.
pub const OPENMP_COMPILE_FLAGS: [&str; 3] = ["-fopenmp", "-DTRV_USE_OMP", "-DTRV_USE_FFTWOMP"];

/// Companion FFTW library for OpenMP-threaded transforms.
pub const FFTW_OPENMP_LINK_FLAG: &str = "-lfftw3_omp";

/// Assembled compile and link flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildFlags {
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
}

impl BuildFlags {
    /// Merge environment flags with the platform's OpenMP defaults.
    pub fn assemble(env: &EnvOverrides, profile: &PlatformProfile) -> Self {
        let mut flags = BuildFlags::default();

        for flag in env.cflags.split_whitespace() {
            push_unique(&mut flags.compile_flags, flag);
        }

        // Libraries travel through the library list so their order stays
        // under our control.
        for flag in env.ldflags.split_whitespace() {
            if is_library_flag(flag) {
                tracing::debug!("ignoring `{}` in link flags; libraries are set per module", flag);
                continue;
            }
            push_unique(&mut flags.link_flags, flag);
        }

        if env.no_openmp {
            tracing::info!("OpenMP disabled");
            return flags;
        }

        let default_openmp_link = profile.openmp_link_flag().unwrap_or_default();
        let openmp_link = env.openmp_link.as_deref().unwrap_or(&default_openmp_link);

        for flag in OPENMP_COMPILE_FLAGS {
            push_unique(&mut flags.compile_flags, flag);
        }

        push_unique(&mut flags.link_flags, FFTW_OPENMP_LINK_FLAG);
        for flag in openmp_link.split_whitespace() {
            push_unique(&mut flags.link_flags, flag);
        }

        if openmp_link.trim().is_empty() {
            tracing::info!(
                "no OpenMP runtime library for platform `{}`; supply one via the LDOMP override",
                profile.platform_key
            );
        }

        flags
    }
}

/// Whether a link token requests a library (`-lfoo`).
pub fn is_library_flag(flag: &str) -> bool {
    flag.starts_with("-l")
}

fn push_unique(flags: &mut Vec<String>, flag: &str) {
    if !flags.iter().any(|f| f == flag) {
        flags.push(flag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformKey;

    fn env(cflags: &str, ldflags: &str) -> EnvOverrides {
        EnvOverrides {
            cflags: cflags.to_string(),
            ldflags: ldflags.to_string(),
            ..Default::default()
        }
    }

    fn linux() -> PlatformProfile {
        PlatformProfile::for_key(PlatformKey::Linux)
    }

    #[test]
    fn test_defaults_appended_after_external_flags() {
        let flags = BuildFlags::assemble(&env("-O3 -fopenmp", "-L/opt/lib"), &linux());

        assert_eq!(
            flags.compile_flags,
            vec!["-O3", "-fopenmp", "-DTRV_USE_OMP", "-DTRV_USE_FFTWOMP"]
        );
        assert_eq!(flags.link_flags, vec!["-L/opt/lib", "-lfftw3_omp", "-lgomp"]);
    }

    #[test]
    fn test_library_flags_stripped_from_external_link_flags() {
        let flags = BuildFlags::assemble(&env("", "-lgsl -Wl,-rpath,/opt -lm"), &linux());

        assert!(!flags.link_flags.contains(&"-lgsl".to_string()));
        assert!(!flags.link_flags.contains(&"-lm".to_string()));
        assert_eq!(flags.link_flags[0], "-Wl,-rpath,/opt");
    }

    #[test]
    fn test_no_duplicates() {
        let flags = BuildFlags::assemble(&env("-O2 -O2 -DTRV_USE_OMP", "-s -s"), &linux());

        for seq in [&flags.compile_flags, &flags.link_flags] {
            let mut seen = std::collections::HashSet::new();
            assert!(seq.iter().all(|f| seen.insert(f)), "duplicate in {:?}", seq);
        }
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let env = env("-O3 -g", "-L/usr/local/lib -lfftw3");
        let first = BuildFlags::assemble(&env, &linux());
        let second = BuildFlags::assemble(&env, &linux());
        assert_eq!(first, second);
    }

    #[test]
    fn test_disabling_openmp_keeps_external_flags() {
        let mut env = env("-O3 -march=native", "-L/opt/lib");
        env.no_openmp = true;

        let flags = BuildFlags::assemble(&env, &linux());

        assert_eq!(flags.compile_flags, vec!["-O3", "-march=native"]);
        assert_eq!(flags.link_flags, vec!["-L/opt/lib"]);
        for flag in OPENMP_COMPILE_FLAGS {
            assert!(!flags.compile_flags.contains(&flag.to_string()));
        }
        assert!(!flags.link_flags.contains(&FFTW_OPENMP_LINK_FLAG.to_string()));
    }

    #[test]
    fn test_darwin_links_no_openmp_runtime_by_default() {
        let flags = BuildFlags::assemble(
            &env("", ""),
            &PlatformProfile::for_key(PlatformKey::Darwin),
        );
        assert_eq!(flags.link_flags, vec!["-lfftw3_omp"]);
        assert!(flags.compile_flags.contains(&"-fopenmp".to_string()));
    }

    #[test]
    fn test_openmp_link_override() {
        let mut env = env("", "");
        env.openmp_link = Some("-L/opt/homebrew/opt/libomp/lib -lomp".to_string());

        let flags = BuildFlags::assemble(&env, &PlatformProfile::for_key(PlatformKey::Darwin));

        assert_eq!(
            flags.link_flags,
            vec!["-lfftw3_omp", "-L/opt/homebrew/opt/libomp/lib", "-lomp"]
        );
    }
}
