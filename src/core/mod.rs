//! Core data model: manifest, platform profiles, macros and languages.

pub mod errors;
pub mod language;
pub mod macros;
pub mod manifest;
pub mod platform;

pub use errors::ConfigError;
pub use language::Language;
pub use macros::{Macro, MacroSet};
pub use manifest::{Manifest, ModuleOptions};
pub use platform::{PlatformKey, PlatformProfile};
