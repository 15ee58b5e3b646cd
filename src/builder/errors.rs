//! Build-phase errors.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status reported when a build is interrupted.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Failure while running native tools.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A tool ran and exited unsuccessfully.
    #[error("{action} failed for {}{}", .output.display(), status_suffix(.status))]
    Toolchain {
        action: &'static str,
        output: PathBuf,
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The build was interrupted before the next tool invocation.
    #[error("build cancelled")]
    Cancelled,
}

impl BuildError {
    /// Process exit status for this failure.
    ///
    /// Tool failures keep the tool's own status; a tool killed by a signal
    /// has none and maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::Toolchain { status, .. } => match status {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            BuildError::Cancelled => CANCELLED_EXIT_CODE,
        }
    }

    /// Tool diagnostics, relayed verbatim.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            BuildError::Toolchain { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit status {})", code),
        None => " (terminated by signal)".to_string(),
    }
}
