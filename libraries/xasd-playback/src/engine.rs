//! Audio engine abstraction
//!
//! The controller never decodes audio itself. Platform code (an HTML audio
//! backend in the browser, a native player elsewhere) implements these traits
//! and forwards the engine's notifications back through
//! [`PlaybackController::handle_engine_event`](crate::PlaybackController::handle_engine_event).

use crate::error::Result;
use std::fmt;
use std::time::Duration;

/// Identifier the controller assigns to every loaded decoder handle
///
/// Engines tag their notifications with it so that events from a handle that
/// is no longer current (or was evicted) can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notification emitted by the engine for one handle
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Source decoded far enough that the duration is known
    Ready { duration: Duration },

    /// Playback reached the end of the source
    Ended,

    /// Engine confirmed a pause
    Paused,

    /// Engine confirmed a stop
    Stopped,

    /// Engine finished a seek
    Seeked { position: Duration },

    /// Source could not be fetched or decoded
    LoadFailed { reason: String },
}

/// Process-wide audio engine
pub trait AudioEngine {
    /// Create a decoder handle bound to `url`
    ///
    /// Loading may complete asynchronously: the handle reports `duration() ==
    /// None` until the engine delivers [`EngineEvent::Ready`]. A synchronous
    /// `Err` means the source was rejected outright.
    ///
    /// # Arguments
    /// * `id` - Identifier to attach to this handle's notifications
    /// * `url` - Fully-qualified audio URL
    /// * `streaming` - Prefer streaming over full buffering (large files)
    fn load(&mut self, id: HandleId, url: &str, streaming: bool) -> Result<Box<dyn DecoderHandle>>;

    /// Set master volume for every loaded handle (0.0-1.0)
    fn set_master_volume(&mut self, volume: f32);
}

/// A loaded audio source
pub trait DecoderHandle {
    /// Begin or resume playback
    ///
    /// Idempotent when already playing. Starting a handle that is still
    /// loading queues the start until it is ready.
    fn start(&mut self) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Stop playback and rewind
    fn stop(&mut self);

    /// Move the play head
    fn seek(&mut self, position: Duration);

    /// Current play head position
    fn position(&self) -> Duration;

    /// Total duration, once known
    fn duration(&self) -> Option<Duration>;

    /// Whether the engine reports this handle as audibly playing
    fn is_playing(&self) -> bool;

    /// Free the underlying resource
    ///
    /// Called exactly once when the handle leaves the controller's cache.
    fn release(&mut self) {
        self.stop();
    }
}
