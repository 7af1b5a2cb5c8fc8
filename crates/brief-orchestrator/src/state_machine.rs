use brief_core::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of working stages between `Idle` and a terminal state.
pub const PIPELINE_STAGE_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
/// Enumerates supported `PipelineState` values.
pub enum PipelineState {
    Idle,
    Uploading,
    Embedding,
    Retrieving,
    Drafting,
    Finalizing,
    Completed,
    Failed { kind: ErrorKind },
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Embedding => "embedding",
            Self::Retrieving => "retrieving",
            Self::Drafting => "drafting",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Zero-based index of a working stage.
    pub fn stage_index(self) -> Option<usize> {
        match self {
            Self::Uploading => Some(0),
            Self::Embedding => Some(1),
            Self::Retrieving => Some(2),
            Self::Drafting => Some(3),
            Self::Finalizing => Some(4),
            Self::Idle | Self::Completed | Self::Failed { .. } => None,
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Uploading => Some("Uploading document securely..."),
            Self::Embedding => Some("Embedding document..."),
            Self::Retrieving => Some("Retrieving similar cases..."),
            Self::Drafting => Some("Generating preliminary memo..."),
            Self::Finalizing => Some("Finalizing analysis..."),
            Self::Idle | Self::Completed | Self::Failed { .. } => None,
        }
    }

    /// Progress reached once this stage completes.
    pub fn checkpoint(self) -> Option<u8> {
        self.stage_index().map(|index| ((index + 1) * 20) as u8)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    fn next_stage(self) -> Option<Self> {
        match self {
            Self::Uploading => Some(Self::Embedding),
            Self::Embedding => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Drafting),
            Self::Drafting => Some(Self::Finalizing),
            Self::Finalizing => Some(Self::Completed),
            Self::Idle | Self::Completed | Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
/// Enumerates supported `PipelineEvent` values.
pub enum PipelineEvent {
    Start,
    StageCompleted,
    StageFailed { kind: ErrorKind },
}

impl PipelineEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::StageCompleted => "stage_completed",
            Self::StageFailed { .. } => "stage_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What the driver must do after a transition.
pub enum PipelineEffect {
    /// A run began; progress resets to zero.
    BeginRun,
    /// A stage finished; progress moves to its checkpoint.
    Checkpoint { progress: u8 },
    /// The last stage finished; the result may be exposed.
    Complete,
    /// The run stopped; no result is exposed.
    Abort { kind: ErrorKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "illegal pipeline transition: {event_name} while {state_name}",
    event_name = .event.as_str(),
    state_name = .state.as_str()
)]
pub struct TransitionError {
    pub state: PipelineState,
    pub event: PipelineEvent,
}

/// Pure transition function for the analysis pipeline.
///
/// Runs move forward one stage at a time. `Start` is accepted from `Idle` and
/// from either terminal state, which begins a fresh run.
pub fn transition(
    state: PipelineState,
    event: PipelineEvent,
) -> Result<(PipelineState, PipelineEffect), TransitionError> {
    let illegal = TransitionError { state, event };
    match event {
        PipelineEvent::Start => match state {
            PipelineState::Idle | PipelineState::Completed | PipelineState::Failed { .. } => {
                Ok((PipelineState::Uploading, PipelineEffect::BeginRun))
            }
            _ => Err(illegal),
        },
        PipelineEvent::StageCompleted => {
            let (Some(next), Some(progress)) = (state.next_stage(), state.checkpoint()) else {
                return Err(illegal);
            };
            if next == PipelineState::Completed {
                Ok((next, PipelineEffect::Complete))
            } else {
                Ok((next, PipelineEffect::Checkpoint { progress }))
            }
        }
        PipelineEvent::StageFailed { kind } => {
            if state.stage_index().is_none() {
                return Err(illegal);
            }
            Ok((PipelineState::Failed { kind }, PipelineEffect::Abort { kind }))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Stateful wrapper that applies events and tracks monotonic progress.
pub struct PipelineMachine {
    state: PipelineState,
    progress: u8,
}

impl Default for PipelineMachine {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
            progress: 0,
        }
    }
}

impl PipelineMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn apply(&mut self, event: PipelineEvent) -> Result<PipelineEffect, TransitionError> {
        let (next, effect) = transition(self.state, event)?;
        match effect {
            PipelineEffect::BeginRun => self.progress = 0,
            PipelineEffect::Checkpoint { progress } => {
                self.progress = self.progress.max(progress);
            }
            PipelineEffect::Complete => self.progress = 100,
            PipelineEffect::Abort { .. } => {}
        }
        self.state = next;
        Ok(effect)
    }
}
