//! Build pipeline state machine.
//!
//! A build moves strictly forward through
//! `Unconfigured -> Configured -> LibraryBuilt -> ExtensionsBuilt -> Done`.
//! Any failure moves it to `Failed`, which is terminal. There is no retry.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Stage of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Unconfigured,
    Configured,
    LibraryBuilt,
    ExtensionsBuilt,
    Done,
    Failed,
}

impl PipelineState {
    /// The state a successful step leads to.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Unconfigured => Some(PipelineState::Configured),
            PipelineState::Configured => Some(PipelineState::LibraryBuilt),
            PipelineState::LibraryBuilt => Some(PipelineState::ExtensionsBuilt),
            PipelineState::ExtensionsBuilt => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }

    /// Whether `target` is the immediate successor of this state.
    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        self.next() == Some(target)
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Unconfigured => "unconfigured",
            PipelineState::Configured => "configured",
            PipelineState::LibraryBuilt => "library-built",
            PipelineState::ExtensionsBuilt => "extensions-built",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected pipeline transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("cannot move build from `{from}` to `{to}`")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },

    #[error("build already finished as `{0}`")]
    Terminal(PipelineState),
}

/// Tracks the stage of one build invocation.
#[derive(Debug, Default)]
pub struct BuildPipeline {
    state: PipelineState,
}

impl BuildPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `to`, which must be the immediate successor.
    pub fn advance(&mut self, to: PipelineState) -> Result<PipelineState, PipelineError> {
        if self.state.is_terminal() {
            return Err(PipelineError::Terminal(self.state));
        }
        if !self.state.can_transition_to(to) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        tracing::debug!("build state: {} -> {}", self.state, to);
        self.state = to;
        Ok(to)
    }

    /// Mark the build failed. Failing a finished build is a no-op.
    pub fn fail(&mut self) -> PipelineState {
        if self.state != PipelineState::Done {
            tracing::debug!("build state: {} -> failed", self.state);
            self.state = PipelineState::Failed;
        }
        self.state
    }
}
