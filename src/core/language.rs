//! Source language of the native build.

use serde::{Deserialize, Serialize};

/// Language mode the compiler driver runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language
    C,
    /// C++ language (default)
    #[default]
    #[serde(alias = "cpp", alias = "cxx", alias = "c++")]
    Cxx,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
        }
    }

    /// Label used when tagging messages that originate from native code.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C++",
        }
    }

    /// Driver flags that the compiler rejects (or warns about) in this mode.
    ///
    /// `-Wstrict-prototypes` is only meaningful for C; a C++ driver warns on
    /// every translation unit when it is present.
    pub fn rejected_flags(&self) -> &'static [&'static str] {
        match self {
            Language::C => &[],
            Language::Cxx => &["-Wstrict-prototypes"],
        }
    }
}

impl std::str::FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "C" => Ok(Language::C),
            "c++" | "cpp" | "cxx" | "C++" => Ok(Language::Cxx),
            _ => Err(LanguageParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid language string.
#[derive(Debug, Clone)]
pub struct LanguageParseError(pub String);

impl std::fmt::Display for LanguageParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid language '{}', valid values: c, c++", self.0)
    }
}

impl std::error::Error for LanguageParseError {}
