//! Master volume control
//!
//! Volume range is 0-100%, handed to the engine as a linear 0.0-1.0 factor.

/// Level restored by `toggle_mute` when currently silent
pub const DEFAULT_UNMUTE_LEVEL: u8 = 50;

/// Process-wide volume level
///
/// Muting is not a separate flag: a muted player simply has level 0, and
/// unmuting always restores [`DEFAULT_UNMUTE_LEVEL`], not the previous level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    level: u8,
}

impl Volume {
    /// Create new volume controller, clamping to 100
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
        }
    }

    /// Set volume level (0-100)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Toggle between silence and the default level
    pub fn toggle_mute(&mut self) {
        self.level = if self.level > 0 {
            0
        } else {
            DEFAULT_UNMUTE_LEVEL
        };
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.level == 0
    }

    /// Linear gain for the engine's master volume (0.0-1.0)
    pub fn gain(&self) -> f32 {
        f32::from(self.level) / 100.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(DEFAULT_UNMUTE_LEVEL)
    }
}
