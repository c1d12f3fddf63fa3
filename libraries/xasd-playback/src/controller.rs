//! Playback controller - core orchestration
//!
//! Owns the queue and the playback slot, drives the audio engine, and keeps
//! the two consistent as the user selects, pauses, seeks and skips and as
//! tracks finish on their own.

use crate::{
    cache::{CachedHandle, DecoderCache},
    engine::{AudioEngine, EngineEvent, HandleId},
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    handle::HandleState,
    progress::{ProgressDisplay, ProgressTimer},
    queue::Queue,
    types::{PlaybackConfig, PlaybackState, Track, TrackId},
    volume::Volume,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Central playback state machine
///
/// Invariants held after every public call:
/// - `current_index` is `None` or a valid queue index
/// - when `current_index` is `None`, no decoder handle is playing
/// - at most one progress timer is armed, bound to the current handle
/// - the decoder cache never exceeds its capacity
pub struct PlaybackController {
    engine: Box<dyn AudioEngine>,

    // Queue and slot
    queue: Queue,
    current_index: Option<usize>,
    playing: bool,

    // Decoder handles
    cache: DecoderCache,
    next_handle_id: u64,

    // Progress
    timer: ProgressTimer,
    display: ProgressDisplay,

    // Settings
    volume: Volume,
    media_base: Url,
    streaming: bool,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
    last_state: PlaybackState,
}

impl PlaybackController {
    /// Create a controller driving `engine`
    ///
    /// Applies the configured volume to the engine immediately.
    pub fn new(config: PlaybackConfig, mut engine: Box<dyn AudioEngine>) -> Result<Self> {
        let media_base = config.media_base()?;
        let volume = Volume::new(config.volume);
        engine.set_master_volume(volume.gain());

        Ok(Self {
            engine,
            queue: Queue::new(),
            current_index: None,
            playing: false,
            cache: DecoderCache::new(config.handle_cache_capacity),
            next_handle_id: 0,
            timer: ProgressTimer::new(config.progress_interval()),
            display: ProgressDisplay::default(),
            volume,
            media_base,
            streaming: config.streaming,
            pending_events: Vec::new(),
            last_state: PlaybackState::Stopped,
        })
    }

    // ===== Queue Management =====

    /// Append a track to the queue
    ///
    /// Resolves the track's audio URL. Returns `Ok(false)` without touching
    /// the queue if a track with the same identity is already queued.
    pub fn enqueue(&mut self, mut track: Track) -> Result<bool> {
        if self.queue.contains(track.id) {
            debug!(track_id = %track.id, "Track already queued");
            return Ok(false);
        }

        track.resolve_source(&self.media_base)?;
        let track_id = track.id;
        self.queue.push(track);
        debug!(track_id = %track_id, length = self.queue.len(), "Track enqueued");
        self.emit_queue_changed();
        Ok(true)
    }

    /// Remove a track from the queue by identity
    ///
    /// Removing the current track stops playback and clears the slot;
    /// removing an earlier track keeps the slot on the same track.
    pub fn dequeue(&mut self, track_id: TrackId) -> Option<Track> {
        let (index, track) = self.queue.remove(track_id)?;

        match self.current_index {
            Some(current) if current == index => {
                info!(track_id = %track_id, "Current track dequeued, stopping playback");
                self.current_index = None;
                self.playing = false;
                self.timer.cancel();
                self.display.reset();
            }
            Some(current) if index < current => {
                self.current_index = Some(current - 1);
            }
            _ => {}
        }

        self.cache.release(track_id);
        self.emit_queue_changed();
        self.sync_state();
        Some(track)
    }

    /// Remove every track, stopping playback and releasing all handles
    pub fn clear_queue(&mut self) {
        self.cache.clear();
        self.queue.clear();
        self.current_index = None;
        self.playing = false;
        self.timer.cancel();
        self.display.reset();
        self.emit_queue_changed();
        self.sync_state();
    }

    /// Check whether a track identity is queued
    pub fn is_queued(&self, track_id: TrackId) -> bool {
        self.queue.contains(track_id)
    }

    /// Check whether the slot currently points at this track
    pub fn is_playing(&self, track_id: TrackId) -> bool {
        self.current_track_id() == Some(track_id)
    }

    /// All queued tracks in order
    pub fn queue(&self) -> &[Track] {
        self.queue.tracks()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    // ===== Slot =====

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_index.and_then(|index| self.queue.get(index))
    }

    pub fn current_track_id(&self) -> Option<TrackId> {
        self.current_track().map(|track| track.id)
    }

    pub fn current_title(&self) -> Option<&str> {
        self.current_track().map(|track| track.title.as_str())
    }

    pub fn current_artist(&self) -> Option<&str> {
        self.current_track().map(|track| track.artist.as_str())
    }

    pub fn current_audio_url(&self) -> Option<&str> {
        self.current_track().and_then(|track| track.audio_url.as_deref())
    }

    /// The playing flag of the slot
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// Playback state derived from the slot and the current handle
    pub fn state(&self) -> PlaybackState {
        let handle_state = self
            .current_track_id()
            .and_then(|id| self.cache.peek(id))
            .map(|cached| cached.state());

        match (self.current_index, self.playing, handle_state) {
            (None, _, _) => PlaybackState::Stopped,
            (Some(_), true, Some(HandleState::Loading { .. })) => PlaybackState::Loading,
            (Some(_), true, _) => PlaybackState::Playing,
            (Some(_), false, Some(HandleState::Paused)) => PlaybackState::Paused,
            (Some(_), false, _) => PlaybackState::Stopped,
        }
    }

    /// Elapsed/length/percentage as last computed
    pub fn display(&self) -> &ProgressDisplay {
        &self.display
    }

    /// Engine position of the current handle
    pub fn position(&self) -> Duration {
        self.current_handle()
            .map(|cached| cached.position())
            .unwrap_or(Duration::ZERO)
    }

    /// Duration of the current handle, once known
    pub fn duration(&self) -> Option<Duration> {
        self.current_handle().and_then(|cached| cached.duration())
    }

    /// Lifecycle state of the handle cached for a track
    pub fn handle_state(&self, track_id: TrackId) -> Option<HandleState> {
        self.cache.peek(track_id).map(|cached| cached.state())
    }

    /// Number of decoder handles currently held
    pub fn cached_handles(&self) -> usize {
        self.cache.len()
    }

    // ===== Playback Control =====

    /// Make `track` the current track and start it
    ///
    /// Queues the track first if needed. Whatever was playing is paused and
    /// rewound before switching, even when it is the same track. A paused
    /// track is not rewound, so selecting it again resumes where it stopped.
    pub fn select(&mut self, track: Track) -> Result<()> {
        if self.playing {
            self.rewind_current();
        }

        let track_id = track.id;
        let previous_track_id = self.current_track_id();

        if !self.queue.contains(track_id) {
            self.enqueue(track)?;
        }
        let index = self
            .queue
            .position(track_id)
            .ok_or(PlaybackError::TrackNotQueued(track_id))?;
        self.current_index = Some(index);

        if let Some(track) = self.queue.get_mut(index) {
            track.resolve_source(&self.media_base)?;
        }

        self.display.reset();
        if previous_track_id != Some(track_id) {
            info!(track_id = %track_id, previous = ?previous_track_id, "Track selected");
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id,
                previous_track_id,
            });
        }

        self.playing = true;
        self.play()
    }

    /// Start or resume the current track
    ///
    /// Reuses the cached decoder handle when there is one, otherwise loads a
    /// new one. Starting is idempotent.
    pub fn play(&mut self) -> Result<()> {
        let index = self.current_index.ok_or(PlaybackError::NoTrackLoaded)?;
        let track_id = self
            .queue
            .get(index)
            .map(|track| track.id)
            .ok_or(PlaybackError::NoTrackLoaded)?;

        if self.cache.contains(track_id) {
            debug!(track_id = %track_id, "Decoder handle cache hit");
        } else {
            debug!(track_id = %track_id, "Decoder handle cache miss, loading");
            self.load_handle(index, track_id)?;
        }

        let Some(cached) = self.cache.get_mut(track_id) else {
            return Err(PlaybackError::NoTrackLoaded);
        };
        let started = cached.start();
        let handle_id = cached.id();
        let loaded = cached.state().is_loaded();
        let duration = cached.duration();

        if let Err(e) = started {
            return Err(self.fail_load(track_id, e.to_string()));
        }

        self.playing = true;
        if loaded {
            if let Some(duration) = duration {
                self.display.set_track_length(duration);
            }
            self.timer.arm(handle_id, Instant::now());
            self.refresh_position();
        }
        self.sync_state();
        Ok(())
    }

    /// Pause the current track, keeping its position
    pub fn pause(&mut self) {
        if let Some(cached) = self.current_handle_mut() {
            cached.pause();
        }
        self.playing = false;
        self.timer.cancel();
        self.sync_state();
    }

    /// Stop the current track and rewind it; the slot keeps pointing at it
    pub fn stop(&mut self) {
        if let Some(cached) = self.current_handle_mut() {
            cached.stop();
        }
        self.playing = false;
        self.timer.cancel();
        self.display.update_position(Duration::ZERO, None);
        self.sync_state();
    }

    /// Flip between playing and paused; no-op without a current track
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.current_index.is_none() {
            return Ok(());
        }

        if self.playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Advance to the next queued track
    ///
    /// At the end of the queue the slot stays where it is. If the current
    /// track is no longer producing audio, the playing flag is cleared.
    pub fn next_track(&mut self) -> Result<()> {
        let Some(index) = self.current_index else {
            return Ok(());
        };

        match self.queue.get(index + 1).cloned() {
            Some(next) => self.select(next),
            None => {
                let still_audible = self
                    .current_handle()
                    .is_some_and(|cached| cached.state().wants_audio());
                if self.playing && !still_audible {
                    debug!("End of queue reached");
                    self.playing = false;
                    self.timer.cancel();
                    self.sync_state();
                }
                Ok(())
            }
        }
    }

    /// Go back to the previous queued track; no-op at the first one
    pub fn previous_track(&mut self) -> Result<()> {
        let Some(index) = self.current_index else {
            return Ok(());
        };
        let Some(previous) = index.checked_sub(1) else {
            return Ok(());
        };

        match self.queue.get(previous).cloned() {
            Some(track) => self.select(track),
            None => Ok(()),
        }
    }

    // ===== Seek =====

    /// Seek the current track to `percent` (0-100) of its duration
    ///
    /// Only a playing track is seekable; on a paused or stopped track this is
    /// a no-op.
    pub fn seek_to(&mut self, percent: f64) -> Result<()> {
        let cached = self.current_handle_mut().ok_or(PlaybackError::NoTrackLoaded)?;

        if !cached.is_playing() {
            debug!(percent, "Ignoring seek while not playing");
            return Ok(());
        }
        let Some(duration) = cached.duration() else {
            debug!(percent, "Ignoring seek before duration is known");
            return Ok(());
        };

        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let target = duration.mul_f64(percent / 100.0);
        cached.seek(target);
        debug!(percent, target_ms = target.as_millis() as u64, "Seeked");

        self.refresh_position();
        Ok(())
    }

    // ===== Volume =====

    /// Set volume (0-100) on the engine
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.apply_volume();
    }

    /// Toggle between silence and the default level
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    /// Get current volume level (0-100)
    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    // ===== Engine notifications =====

    /// Feed a notification from the engine into the state machine
    ///
    /// Notifications for handles that are no longer current only update that
    /// handle's lifecycle; notifications for released handles are dropped.
    pub fn handle_engine_event(&mut self, handle_id: HandleId, event: EngineEvent) {
        let Some(track_id) = self.cache.track_for(handle_id) else {
            debug!(handle = %handle_id, ?event, "Ignoring event for released handle");
            return;
        };
        let applied = self
            .cache
            .peek_mut(track_id)
            .is_some_and(|cached| cached.apply_event(&event));
        if !applied {
            debug!(handle = %handle_id, ?event, "Ignoring stale engine event");
            return;
        }

        if self.current_track_id() != Some(track_id) {
            debug!(handle = %handle_id, track_id = %track_id, ?event, "Event for inactive handle");
            if let EngineEvent::LoadFailed { .. } = event {
                self.cache.release(track_id);
            }
            return;
        }

        match event {
            EngineEvent::Ready { duration } => {
                debug!(track_id = %track_id, duration_ms = duration.as_millis() as u64, "Track ready");
                self.display.set_track_length(duration);
                self.pending_events.push(PlaybackEvent::DurationKnown {
                    track_id,
                    duration_ms: duration.as_millis() as u64,
                });
                if self.playing {
                    self.timer.arm(handle_id, Instant::now());
                    self.refresh_position();
                }
                self.sync_state();
            }
            EngineEvent::Ended => {
                info!(track_id = %track_id, "Track finished");
                self.timer.cancel();
                self.refresh_position();
                self.pending_events
                    .push(PlaybackEvent::TrackFinished { track_id });
                self.advance_after_end();
            }
            EngineEvent::Paused | EngineEvent::Stopped => {
                let audible = self
                    .current_handle()
                    .is_some_and(|cached| cached.state().wants_audio());
                if self.playing && !audible {
                    debug!(track_id = %track_id, "Engine halted playback");
                    self.playing = false;
                    self.timer.cancel();
                    self.sync_state();
                }
            }
            EngineEvent::Seeked { .. } => self.refresh_position(),
            EngineEvent::LoadFailed { reason } => {
                let _ = self.fail_load(track_id, reason);
            }
        }
    }

    // ===== Progress =====

    /// When the host should next call [`tick`](Self::tick)
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    /// Run the progress timer if it is due
    ///
    /// Refreshes the display and reschedules while the bound handle is the
    /// current one and the engine still reports it playing; otherwise the
    /// timer lapses. Returns whether a refresh happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(handle_id) = self.timer.take_due(now) else {
            return false;
        };

        let active = self
            .current_handle()
            .is_some_and(|cached| cached.id() == handle_id && cached.is_playing());
        if !active {
            debug!(handle = %handle_id, "Progress timer lapsed");
            return false;
        }

        self.refresh_position();
        self.timer.reschedule(handle_id, now);
        true
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events that have been emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn current_handle(&self) -> Option<&CachedHandle> {
        self.current_track_id().and_then(|id| self.cache.peek(id))
    }

    fn current_handle_mut(&mut self) -> Option<&mut CachedHandle> {
        let track_id = self.current_track_id()?;
        self.cache.get_mut(track_id)
    }

    fn allocate_handle_id(&mut self) -> HandleId {
        self.next_handle_id += 1;
        HandleId(self.next_handle_id)
    }

    fn load_handle(&mut self, index: usize, track_id: TrackId) -> Result<()> {
        let url = match self.queue.get_mut(index) {
            Some(track) => track.resolve_source(&self.media_base)?.to_string(),
            None => return Err(PlaybackError::NoTrackLoaded),
        };
        let handle_id = self.allocate_handle_id();

        match self.engine.load(handle_id, &url, self.streaming) {
            Ok(handle) => {
                debug!(track_id = %track_id, handle = %handle_id, url = %url, "Decoder handle loaded");
                self.cache
                    .insert(track_id, CachedHandle::new(handle_id, handle));
                Ok(())
            }
            Err(e) => Err(self.fail_load(track_id, e.to_string())),
        }
    }

    /// Put the slot into a consistent "failed" state and build the error
    fn fail_load(&mut self, track_id: TrackId, reason: String) -> PlaybackError {
        warn!(track_id = %track_id, reason = %reason, "Failed to load track");
        self.cache.release(track_id);
        self.playing = false;
        self.timer.cancel();

        let error = PlaybackError::Load { track_id, reason };
        self.pending_events.push(PlaybackEvent::Error {
            message: error.to_string(),
        });
        self.sync_state();
        error
    }

    /// Pause the current handle and seek it back to zero
    fn rewind_current(&mut self) {
        if let Some(cached) = self.current_handle_mut() {
            cached.pause();
            cached.seek(Duration::ZERO);
        }
        self.playing = false;
        self.timer.cancel();
    }

    fn advance_after_end(&mut self) {
        let next = self
            .current_index
            .and_then(|index| self.queue.get(index + 1))
            .cloned();

        match next {
            Some(track) => {
                if let Err(e) = self.select(track) {
                    warn!(error = %e, "Auto-advance failed");
                }
            }
            None => {
                info!("End of queue reached");
                self.playing = false;
                self.sync_state();
            }
        }
    }

    fn refresh_position(&mut self) {
        let Some((elapsed, duration)) = self
            .current_handle()
            .map(|cached| (cached.position(), cached.duration()))
        else {
            return;
        };

        self.display.update_position(elapsed, duration);
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms: elapsed.as_millis() as u64,
            duration_ms: duration.map_or(0, |d| d.as_millis() as u64),
            percentage: self.display.percentage,
        });
    }

    fn apply_volume(&mut self) {
        self.engine.set_master_volume(self.volume.gain());
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Emit `StateChanged` if the derived state moved
    fn sync_state(&mut self) {
        let state = self.state();
        if state != self.last_state {
            debug!(from = ?self.last_state, to = ?state, "Playback state changed");
            self.last_state = state;
            self.pending_events.push(PlaybackEvent::StateChanged { state });
        }
    }
}
