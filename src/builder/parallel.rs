//! Build-job parallelism directive.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// How many compiler processes may run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "jobs", rename_all = "lowercase")]
pub enum ParallelismDirective {
    /// Leave the toolchain default (serial) in place
    #[default]
    Unset,
    /// One job per available processing unit
    Auto,
    /// A fixed number of jobs
    Fixed(usize),
}

impl ParallelismDirective {
    /// Parse a directive token.
    ///
    /// `-j` means [`Auto`](Self::Auto) and `-jN` means
    /// [`Fixed(N)`](Self::Fixed). Anything else, `-j0` included, falls back to
    /// [`Unset`](Self::Unset) without failing.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();

        if token.is_empty() {
            return ParallelismDirective::Unset;
        }

        if token == "-j" {
            return ParallelismDirective::Auto;
        }

        let parsed = token
            .strip_prefix("-j")
            .filter(|digits| digits.chars().all(|c| c.is_ascii_digit()))
            .and_then(|digits| digits.parse::<usize>().ok());

        match parsed {
            Some(0) | None => {
                tracing::info!("ignoring unrecognised parallel build directive `{}`", token);
                ParallelismDirective::Unset
            }
            Some(n) => ParallelismDirective::Fixed(n),
        }
    }

    /// Parse an optional directive; absence is [`Unset`](Self::Unset).
    pub fn from_option(token: Option<&str>) -> Self {
        token.map(Self::parse).unwrap_or_default()
    }

    /// Worker count implied by the directive, resolved now.
    pub fn resolve(&self) -> Option<usize> {
        match self {
            ParallelismDirective::Unset => None,
            ParallelismDirective::Auto => Some(available_units()),
            ParallelismDirective::Fixed(n) => Some(*n),
        }
    }
}

impl FromStr for ParallelismDirective {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ParallelismDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParallelismDirective::Unset => f.write_str("unset"),
            ParallelismDirective::Auto => f.write_str("-j"),
            ParallelismDirective::Fixed(n) => write!(f, "-j{}", n),
        }
    }
}

/// Number of processing units available to this process.
pub fn available_units() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Settle the job count: a value fixed by the caller always wins.
pub fn effective_jobs(caller: Option<usize>, directive: ParallelismDirective) -> Option<usize> {
    caller.or_else(|| directive.resolve())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_flag_is_auto() {
        let directive = ParallelismDirective::parse("-j");
        assert_eq!(directive, ParallelismDirective::Auto);
        assert_eq!(directive.resolve(), Some(available_units()));
    }

    #[test]
    fn test_numeric_suffix_is_fixed() {
        assert_eq!(ParallelismDirective::parse("-j4"), ParallelismDirective::Fixed(4));
        assert_eq!(ParallelismDirective::parse(" -j16 "), ParallelismDirective::Fixed(16));
        assert_eq!(ParallelismDirective::parse("-j4").resolve(), Some(4));
    }

    #[test]
    fn test_invalid_directives_are_unset() {
        for token in ["-jx", "-j4x", "-j-2", "4", "--jobs", "-j0", "j4"] {
            assert_eq!(
                ParallelismDirective::parse(token),
                ParallelismDirective::Unset,
                "token `{}`",
                token
            );
        }
    }

    #[test]
    fn test_absent_directive_is_unset() {
        assert_eq!(ParallelismDirective::from_option(None), ParallelismDirective::Unset);
        assert_eq!(ParallelismDirective::parse(""), ParallelismDirective::Unset);
        assert_eq!(ParallelismDirective::Unset.resolve(), None);
    }

    #[test]
    fn test_caller_value_wins() {
        assert_eq!(effective_jobs(Some(2), ParallelismDirective::Fixed(8)), Some(2));
        assert_eq!(effective_jobs(None, ParallelismDirective::Fixed(8)), Some(8));
        assert_eq!(effective_jobs(None, ParallelismDirective::Unset), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ParallelismDirective::Fixed(3).to_string(), "-j3");
        assert_eq!(ParallelismDirective::Auto.to_string(), "-j");
    }
}
