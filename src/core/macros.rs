//! Preprocessor macro sets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single preprocessor definition: `NAME` or `NAME=VALUE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Macro {
    pub name: String,
    pub value: Option<String>,
}

impl Macro {
    pub fn new(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Macro {
            name: name.into(),
            value: value.map(Into::into),
        }
    }

    /// Parse `NAME` or `NAME=VALUE`.
    ///
    /// A leading `-D` is tolerated so flags copied from a command line parse
    /// too. Returns `None` when the name is empty.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let rest = spec.strip_prefix("-D").unwrap_or(spec);

        let (name, value) = match rest.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.to_string())),
            None => (rest, None),
        };

        if name.is_empty() {
            return None;
        }

        Some(Macro {
            name: name.to_string(),
            value,
        })
    }

    /// Render as a GCC-style `-D` flag.
    pub fn to_flag(&self) -> String {
        match &self.value {
            Some(v) => format!("-D{}={}", self.name, v),
            None => format!("-D{}", self.name),
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// Package macros plus numeric-library compatibility macros.
///
/// The two subsets are kept apart because the static library only needs the
/// package macros, while extension modules get both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MacroSet {
    pub package: Vec<Macro>,
    pub compat: Vec<Macro>,
}

impl MacroSet {
    pub fn new(package: Vec<Macro>, compat: Vec<Macro>) -> Self {
        MacroSet { package, compat }
    }

    /// Package macros followed by compatibility macros.
    pub fn all(&self) -> Vec<Macro> {
        self.package.iter().chain(self.compat.iter()).cloned().collect()
    }
}
