//! xasd - Playback
//!
//! Queue and playback state machine for the xasd music player.
//!
//! This crate provides:
//! - An ordered, duplicate-free play queue
//! - A playback slot (current track + playing flag)
//! - A bounded cache of decoder handles, released on eviction
//! - Progress polling with a single cancellable timer
//! - Percentage seek and volume/mute control
//! - An event queue for UI synchronization
//!
//! # Architecture
//!
//! `xasd-playback` never touches an audio device. Decoding and output live
//! behind the [`AudioEngine`] and [`DecoderHandle`] traits; the engine's
//! asynchronous notifications come back through
//! [`PlaybackController::handle_engine_event`]. Everything runs on the
//! caller's thread, so the host decides how notifications and progress ticks
//! are scheduled.
//!
//! # Example
//!
//! ```rust
//! use xasd_playback::{
//!     PlaybackConfig, PlaybackController, PlaybackState, Track, TrackId, VirtualEngine,
//! };
//! use std::time::Duration;
//!
//! let engine = VirtualEngine::new(Duration::from_secs(200));
//! let mut controller =
//!     PlaybackController::new(PlaybackConfig::default(), Box::new(engine.clone())).unwrap();
//!
//! let track = Track::new(TrackId(1), "Song", "Artist", "/music/song.mp3");
//! controller.select(track).unwrap();
//! engine.pump(&mut controller);
//! assert_eq!(controller.state(), PlaybackState::Playing);
//!
//! engine.advance(Duration::from_secs(50));
//! controller.tick(controller.next_deadline().unwrap());
//! assert_eq!(controller.display().timestamp, "0:50");
//! assert_eq!(controller.display().percentage, 25.0);
//!
//! controller.pause();
//! assert_eq!(controller.state(), PlaybackState::Paused);
//! ```

mod cache;
mod controller;
mod engine;
mod error;
mod events;
pub mod handle;
pub mod progress;
mod queue;
pub mod types;
mod virtual_engine;
mod volume;

// Public exports
pub use cache::{CachedHandle, DecoderCache};
pub use controller::PlaybackController;
pub use engine::{AudioEngine, DecoderHandle, EngineEvent, HandleId};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use handle::HandleState;
pub use progress::{ProgressDisplay, ProgressTimer};
pub use queue::Queue;
pub use types::{PlaybackConfig, PlaybackState, Track, TrackId};
pub use virtual_engine::{EngineCall, VirtualEngine};
pub use volume::Volume;
