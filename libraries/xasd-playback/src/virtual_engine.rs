//! Headless audio engine on a virtual clock
//!
//! Produces no sound. Positions only move when the host calls
//! [`VirtualEngine::advance`], and notifications queue up until
//! [`VirtualEngine::pump`] (or [`drain_notifications`](VirtualEngine::drain_notifications))
//! hands them to the controller. Useful for dry runs and for exercising the
//! controller deterministically.

use crate::controller::PlaybackController;
use crate::engine::{AudioEngine, DecoderHandle, EngineEvent, HandleId};
use crate::error::{PlaybackError, Result};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

/// Command the engine received, in order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load {
        handle: HandleId,
        url: String,
        streaming: bool,
    },
    Start(HandleId),
    Pause(HandleId),
    Stop(HandleId),
    Seek(HandleId, Duration),
    Release(HandleId),
    SetVolume(f32),
}

#[derive(Debug)]
struct Source {
    url: String,
    duration: Duration,
    position: Duration,
    loaded: bool,
    playing: bool,
    start_pending: bool,
    released: bool,
}

#[derive(Debug)]
struct Inner {
    default_duration: Duration,
    durations: Vec<(String, Duration)>,
    rejected: Vec<String>,
    broken: Vec<String>,
    auto_ready: bool,
    sources: HashMap<HandleId, Source>,
    notifications: VecDeque<(HandleId, EngineEvent)>,
    master_volume: f32,
    calls: Vec<EngineCall>,
}

impl Inner {
    fn matches(patterns: &[String], url: &str) -> bool {
        patterns.iter().any(|suffix| url.ends_with(suffix.as_str()))
    }

    fn duration_for(&self, url: &str) -> Duration {
        self.durations
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map_or(self.default_duration, |(_, duration)| *duration)
    }

    fn complete_load(&mut self, id: HandleId) {
        let broken = match self.sources.get(&id) {
            Some(source) => Self::matches(&self.broken, &source.url),
            None => return,
        };

        if broken {
            if let Some(source) = self.sources.get_mut(&id) {
                source.start_pending = false;
            }
            self.notifications.push_back((
                id,
                EngineEvent::LoadFailed {
                    reason: "decode error".to_string(),
                },
            ));
            return;
        }

        if let Some(source) = self.sources.get_mut(&id) {
            source.loaded = true;
            if source.start_pending {
                source.start_pending = false;
                source.playing = true;
            }
            let duration = source.duration;
            self.notifications
                .push_back((id, EngineEvent::Ready { duration }));
        }
    }
}

/// Cloneable handle to a shared virtual engine
///
/// Clone it before boxing it into the controller to keep control of the
/// clock from the outside.
#[derive(Debug, Clone)]
pub struct VirtualEngine {
    inner: Rc<RefCell<Inner>>,
}

impl VirtualEngine {
    /// Engine whose sources all last `default_duration`
    pub fn new(default_duration: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                default_duration,
                durations: Vec::new(),
                rejected: Vec::new(),
                broken: Vec::new(),
                auto_ready: true,
                sources: HashMap::new(),
                notifications: VecDeque::new(),
                master_volume: 1.0,
                calls: Vec::new(),
            })),
        }
    }

    /// Give sources whose URL ends with `suffix` a specific duration
    pub fn set_duration(&self, suffix: impl Into<String>, duration: Duration) {
        self.inner
            .borrow_mut()
            .durations
            .push((suffix.into(), duration));
    }

    /// Refuse to load URLs ending with `suffix` (synchronous failure)
    pub fn reject(&self, suffix: impl Into<String>) {
        self.inner.borrow_mut().rejected.push(suffix.into());
    }

    /// Accept URLs ending with `suffix` but fail while decoding them
    pub fn break_source(&self, suffix: impl Into<String>) {
        self.inner.borrow_mut().broken.push(suffix.into());
    }

    /// Whether loads complete immediately (default) or wait for `finish_load`
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.inner.borrow_mut().auto_ready = auto_ready;
    }

    /// Complete a pending load
    pub fn finish_load(&self, id: HandleId) {
        self.inner.borrow_mut().complete_load(id);
    }

    /// Move the clock forward for every playing source
    pub fn advance(&self, elapsed: Duration) {
        let mut inner = self.inner.borrow_mut();
        let mut ended = Vec::new();

        for (id, source) in inner.sources.iter_mut() {
            if !source.playing || source.released {
                continue;
            }
            source.position = (source.position + elapsed).min(source.duration);
            if source.position >= source.duration {
                source.playing = false;
                ended.push(*id);
            }
        }

        ended.sort();
        for id in ended {
            inner.notifications.push_back((id, EngineEvent::Ended));
        }
    }

    /// Take queued notifications
    pub fn drain_notifications(&self) -> Vec<(HandleId, EngineEvent)> {
        self.inner.borrow_mut().notifications.drain(..).collect()
    }

    /// Deliver queued notifications until none are left
    ///
    /// Handling one notification may cause more (auto-advance loads the next
    /// track), so this loops. Returns how many were delivered.
    pub fn pump(&self, controller: &mut PlaybackController) -> usize {
        let mut delivered = 0;
        loop {
            let batch = self.drain_notifications();
            if batch.is_empty() {
                return delivered;
            }
            for (id, event) in batch {
                controller.handle_engine_event(id, event);
                delivered += 1;
            }
        }
    }

    /// Commands received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn master_volume(&self) -> f32 {
        self.inner.borrow().master_volume
    }

    /// Handles loaded and not yet released
    pub fn live_handles(&self) -> usize {
        self.inner
            .borrow()
            .sources
            .values()
            .filter(|source| !source.released)
            .count()
    }

    /// Handles currently producing audio
    pub fn playing_handles(&self) -> Vec<HandleId> {
        let inner = self.inner.borrow();
        let mut playing: Vec<HandleId> = inner
            .sources
            .iter()
            .filter(|(_, source)| source.playing && !source.released)
            .map(|(id, _)| *id)
            .collect();
        playing.sort();
        playing
    }

    /// Position of a handle, for inspection
    pub fn position_of(&self, id: HandleId) -> Option<Duration> {
        self.inner.borrow().sources.get(&id).map(|s| s.position)
    }

    /// Whether a handle is producing audio, for inspection
    pub fn is_playing(&self, id: HandleId) -> bool {
        self.inner
            .borrow()
            .sources
            .get(&id)
            .is_some_and(|s| s.playing)
    }
}

impl Default for VirtualEngine {
    fn default() -> Self {
        Self::new(Duration::from_secs(180))
    }
}

impl AudioEngine for VirtualEngine {
    fn load(&mut self, id: HandleId, url: &str, streaming: bool) -> Result<Box<dyn DecoderHandle>> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Load {
            handle: id,
            url: url.to_string(),
            streaming,
        });

        if Inner::matches(&inner.rejected, url) {
            return Err(PlaybackError::Engine(format!("cannot open {}", url)));
        }

        let duration = inner.duration_for(url);
        inner.sources.insert(
            id,
            Source {
                url: url.to_string(),
                duration,
                position: Duration::ZERO,
                loaded: false,
                playing: false,
                start_pending: false,
                released: false,
            },
        );
        if inner.auto_ready {
            inner.complete_load(id);
        }

        Ok(Box::new(VirtualHandle {
            id,
            inner: Rc::clone(&self.inner),
        }))
    }

    fn set_master_volume(&mut self, volume: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.master_volume = volume.clamp(0.0, 1.0);
        inner.calls.push(EngineCall::SetVolume(volume));
    }
}

struct VirtualHandle {
    id: HandleId,
    inner: Rc<RefCell<Inner>>,
}

impl VirtualHandle {
    fn with_source<T>(&self, f: impl FnOnce(&Source) -> T) -> Option<T> {
        self.inner.borrow().sources.get(&self.id).map(f)
    }
}

impl DecoderHandle for VirtualHandle {
    fn start(&mut self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Start(self.id));

        let source = inner
            .sources
            .get_mut(&self.id)
            .filter(|source| !source.released)
            .ok_or_else(|| PlaybackError::Engine(format!("handle {} released", self.id)))?;

        if source.loaded {
            if source.position >= source.duration {
                source.position = Duration::ZERO;
            }
            source.playing = true;
        } else {
            source.start_pending = true;
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Pause(self.id));

        let was_playing = match inner.sources.get_mut(&self.id) {
            Some(source) => {
                source.start_pending = false;
                std::mem::replace(&mut source.playing, false)
            }
            None => false,
        };
        if was_playing {
            inner.notifications.push_back((self.id, EngineEvent::Paused));
        }
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Stop(self.id));

        if let Some(source) = inner.sources.get_mut(&self.id) {
            source.start_pending = false;
            source.playing = false;
            source.position = Duration::ZERO;
            inner.notifications.push_back((self.id, EngineEvent::Stopped));
        }
    }

    fn seek(&mut self, position: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Seek(self.id, position));

        if let Some(source) = inner.sources.get_mut(&self.id) {
            source.position = position.min(source.duration);
            let position = source.position;
            inner
                .notifications
                .push_back((self.id, EngineEvent::Seeked { position }));
        }
    }

    fn position(&self) -> Duration {
        self.with_source(|s| s.position).unwrap_or(Duration::ZERO)
    }

    fn duration(&self) -> Option<Duration> {
        self.with_source(|s| s.loaded.then_some(s.duration))
            .flatten()
    }

    fn is_playing(&self) -> bool {
        self.with_source(|s| s.playing).unwrap_or(false)
    }

    fn release(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(EngineCall::Release(self.id));

        if let Some(source) = inner.sources.get_mut(&self.id) {
            source.released = true;
            source.playing = false;
            source.start_pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_before_load_waits_for_ready() {
        let mut engine = VirtualEngine::new(Duration::from_secs(10));
        engine.set_auto_ready(false);

        let mut handle = engine.load(HandleId(1), "https://m/a.mp3", true).unwrap();
        handle.start().unwrap();
        assert!(!handle.is_playing());
        assert!(handle.duration().is_none());

        engine.finish_load(HandleId(1));
        assert!(handle.is_playing());
        assert_eq!(handle.duration(), Some(Duration::from_secs(10)));
        assert_eq!(
            engine.drain_notifications(),
            vec![(
                HandleId(1),
                EngineEvent::Ready {
                    duration: Duration::from_secs(10)
                }
            )]
        );
    }

    #[test]
    fn advance_reports_end() {
        let mut engine = VirtualEngine::new(Duration::from_secs(10));
        let mut handle = engine.load(HandleId(1), "https://m/a.mp3", true).unwrap();
        engine.drain_notifications();

        handle.start().unwrap();
        engine.advance(Duration::from_secs(4));
        assert_eq!(handle.position(), Duration::from_secs(4));

        engine.advance(Duration::from_secs(10));
        assert_eq!(handle.position(), Duration::from_secs(10));
        assert!(!handle.is_playing());
        assert_eq!(
            engine.drain_notifications(),
            vec![(HandleId(1), EngineEvent::Ended)]
        );
    }

    #[test]
    fn rejected_and_broken_sources() {
        let mut engine = VirtualEngine::default();
        engine.reject("missing.mp3");
        engine.break_source("corrupt.mp3");

        assert!(engine.load(HandleId(1), "https://m/missing.mp3", true).is_err());

        let handle = engine.load(HandleId(2), "https://m/corrupt.mp3", true).unwrap();
        assert!(handle.duration().is_none());
        assert!(matches!(
            engine.drain_notifications().as_slice(),
            [(HandleId(2), EngineEvent::LoadFailed { .. })]
        ));
    }

    #[test]
    fn per_url_duration_and_volume() {
        let mut engine = VirtualEngine::default();
        engine.set_duration("long.mp3", Duration::from_secs(600));
        engine.set_master_volume(1.5);

        let handle = engine.load(HandleId(1), "https://m/long.mp3", false).unwrap();
        assert_eq!(handle.duration(), Some(Duration::from_secs(600)));
        assert_eq!(engine.master_volume(), 1.0);
        assert_eq!(engine.live_handles(), 1);
    }
}
