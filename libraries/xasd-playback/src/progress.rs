//! Playback progress
//!
//! The progress loop is a cancellable periodic timer bound to one decoder
//! handle. The controller arms it when a handle starts producing audio and
//! cancels it on pause, stop, track change and end of track. The host only
//! needs to call `tick` at (or after) `next_deadline`.

use crate::engine::HandleId;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Format seconds as `M:SS`
pub fn format_time(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Format a duration as `M:SS`, rounding to the nearest second
pub fn format_duration(duration: Duration) -> String {
    format_time(duration.as_secs_f64().round() as u64)
}

/// Elapsed share of the track in percent
///
/// Unknown or zero duration (or any non-finite result) is 0%.
pub fn percentage(elapsed: Duration, duration: Option<Duration>) -> f64 {
    let Some(duration) = duration else {
        return 0.0;
    };
    let value = elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0;
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// What the UI shows for the current track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDisplay {
    /// Elapsed time, `M:SS`
    pub timestamp: String,

    /// Total duration, `M:SS`
    pub track_length: String,

    /// Elapsed share, 0-100
    pub percentage: f64,
}

impl ProgressDisplay {
    /// Recompute elapsed time and percentage
    pub fn update_position(&mut self, elapsed: Duration, duration: Option<Duration>) {
        self.timestamp = format_duration(elapsed);
        self.percentage = percentage(elapsed, duration);
    }

    /// Record the track length once the engine knows it
    pub fn set_track_length(&mut self, duration: Duration) {
        self.track_length = format_duration(duration);
    }

    /// Back to `0:00` / `0:00` / 0%
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self {
            timestamp: format_time(0),
            track_length: format_time(0),
            percentage: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    handle: HandleId,
    due: Instant,
}

/// Single outstanding periodic timer
///
/// Never more than one schedule exists: arming replaces any previous one.
#[derive(Debug, Clone)]
pub struct ProgressTimer {
    interval: Duration,
    armed: Option<Armed>,
}

impl ProgressTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            armed: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule the first tick one interval after `now`
    pub fn arm(&mut self, handle: HandleId, now: Instant) {
        self.armed = Some(Armed {
            handle,
            due: now + self.interval,
        });
    }

    /// Drop the schedule
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Handle the timer is bound to
    pub fn handle(&self) -> Option<HandleId> {
        self.armed.map(|armed| armed.handle)
    }

    /// When the host should call `tick` next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.due)
    }

    /// Take a due tick
    ///
    /// Returns the bound handle if the tick is due; the schedule is consumed
    /// and the caller decides whether to `reschedule`.
    pub fn take_due(&mut self, now: Instant) -> Option<HandleId> {
        match self.armed {
            Some(armed) if armed.due <= now => {
                self.armed = None;
                Some(armed.handle)
            }
            _ => None,
        }
    }

    /// Re-arm for the same handle after a completed tick
    pub fn reschedule(&mut self, handle: HandleId, now: Instant) {
        self.arm(handle, now);
    }
}
