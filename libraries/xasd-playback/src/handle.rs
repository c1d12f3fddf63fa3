//! Per-handle lifecycle
//!
//! Every decoder handle moves through a small state machine driven by the
//! commands the controller issues and the notifications the engine sends
//! back. The controller consults it instead of ad hoc callback flags.
//!
//! ```text
//!            load            Ready            start
//! Idle ───────────▶ Loading ──────▶ Ready ─────────▶ Playing ──Ended──▶ Ended
//!                     │   ▲ start (pending)            │  ▲              │
//!                     │   └────────────────────────────┘  │ start        │ start
//!                     │ LoadFailed              pause     │              ▼
//!                     ▼                        ───────▶ Paused       Playing
//!                  Errored                        stop ──▶ Stopped
//! ```

use crate::engine::EngineEvent;
use serde::{Deserialize, Serialize};

/// Lifecycle state of one decoder handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleState {
    /// Created, no load issued yet
    Idle,

    /// Load issued, duration unknown
    Loading {
        /// A start was requested and runs once the source is ready
        start_pending: bool,
    },

    /// Loaded and idle at the start
    Ready,

    /// Producing audio
    Playing,

    /// Paused mid-track
    Paused,

    /// Stopped and rewound
    Stopped,

    /// Reached the end naturally
    Ended,

    /// Load or decode failed; the handle is unusable
    Errored,
}

/// Command issued by the controller to a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleCommand {
    Load,
    Start,
    Pause,
    Stop,
}

impl HandleState {
    /// State after the controller issues `command`
    pub fn on_command(self, command: HandleCommand) -> Self {
        use HandleState::*;

        match (self, command) {
            (Errored, _) => Errored,

            (Idle, HandleCommand::Load) => Loading {
                start_pending: false,
            },
            (state, HandleCommand::Load) => state,

            (Loading { .. }, HandleCommand::Start) => Loading {
                start_pending: true,
            },
            (Idle, HandleCommand::Start) => Idle,
            (_, HandleCommand::Start) => Playing,

            (Playing, HandleCommand::Pause) => Paused,
            (Loading { .. }, HandleCommand::Pause | HandleCommand::Stop) => Loading {
                start_pending: false,
            },
            (state, HandleCommand::Pause) => state,

            (Idle, HandleCommand::Stop) => Idle,
            (_, HandleCommand::Stop) => Stopped,
        }
    }

    /// State after the engine reports `event`
    ///
    /// Notifications that make no sense in the current state (a late `Ended`
    /// after a stop, say) leave the state untouched.
    pub fn on_event(self, event: &EngineEvent) -> Self {
        use HandleState::*;

        match (self, event) {
            (_, EngineEvent::LoadFailed { .. }) => Errored,
            (Errored, _) => Errored,

            (Loading { start_pending }, EngineEvent::Ready { .. }) => {
                if start_pending {
                    Playing
                } else {
                    Ready
                }
            }

            (Playing, EngineEvent::Ended) => Ended,
            (Playing, EngineEvent::Paused) => Paused,
            (Playing | Paused | Ready | Ended, EngineEvent::Stopped) => Stopped,

            (state, _) => state,
        }
    }

    /// Whether a start has been requested and not paused or stopped since
    pub fn wants_audio(self) -> bool {
        matches!(
            self,
            HandleState::Playing
                | HandleState::Loading {
                    start_pending: true
                }
        )
    }

    /// Whether the engine has delivered the duration
    pub fn is_loaded(self) -> bool {
        !matches!(
            self,
            HandleState::Idle | HandleState::Loading { .. } | HandleState::Errored
        )
    }
}
