//! Bounded decoder-handle cache
//!
//! Maps track identity to its loaded decoder handle. Least-recently-played
//! handles are evicted once the capacity is reached, and every handle that
//! leaves the cache is released exactly once.

use crate::engine::{DecoderHandle, EngineEvent, HandleId};
use crate::handle::{HandleCommand, HandleState};
use crate::types::TrackId;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use tracing::debug;

/// A decoder handle plus the controller's view of its lifecycle
pub struct CachedHandle {
    id: HandleId,
    handle: Box<dyn DecoderHandle>,
    state: HandleState,
    duration: Option<Duration>,
}

impl CachedHandle {
    /// Wrap a freshly loaded handle
    pub fn new(id: HandleId, handle: Box<dyn DecoderHandle>) -> Self {
        Self {
            id,
            handle,
            state: HandleState::Idle.on_command(HandleCommand::Load),
            duration: None,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Duration from the Ready notification, falling back to the handle
    pub fn duration(&self) -> Option<Duration> {
        self.duration.or_else(|| self.handle.duration())
    }

    pub fn position(&self) -> Duration {
        self.handle.position()
    }

    /// Engine-reported playing flag
    pub fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    pub(crate) fn start(&mut self) -> crate::Result<()> {
        self.handle.start()?;
        self.state = self.state.on_command(HandleCommand::Start);
        Ok(())
    }

    pub(crate) fn pause(&mut self) {
        self.handle.pause();
        self.state = self.state.on_command(HandleCommand::Pause);
    }

    pub(crate) fn stop(&mut self) {
        self.handle.stop();
        self.state = self.state.on_command(HandleCommand::Stop);
    }

    pub(crate) fn seek(&mut self, position: Duration) {
        self.handle.seek(position);
    }

    /// Fold an engine notification into the lifecycle
    ///
    /// Returns `false` for stale notifications: a pause, stop or end that the
    /// engine reported before the handle was started again, or an end that
    /// arrives after the handle was paused or stopped.
    pub(crate) fn apply_event(&mut self, event: &EngineEvent) -> bool {
        match event {
            EngineEvent::Ready { duration } => self.duration = Some(*duration),
            EngineEvent::Paused | EngineEvent::Stopped | EngineEvent::Ended
                if self.handle.is_playing() =>
            {
                return false;
            }
            EngineEvent::Ended if self.state != HandleState::Playing => return false,
            _ => {}
        }
        self.state = self.state.on_event(event);
        true
    }

    fn release(mut self) {
        self.handle.release();
    }
}

impl fmt::Debug for CachedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedHandle")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// LRU cache of decoder handles keyed by track
pub struct DecoderCache {
    entries: LruCache<TrackId, CachedHandle>,
}

impl DecoderCache {
    /// Create a cache holding at most `capacity` handles (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up a handle, marking it most recently used
    pub fn get_mut(&mut self, track_id: TrackId) -> Option<&mut CachedHandle> {
        self.entries.get_mut(&track_id)
    }

    /// Look up a handle without touching recency
    pub fn peek(&self, track_id: TrackId) -> Option<&CachedHandle> {
        self.entries.peek(&track_id)
    }

    pub(crate) fn peek_mut(&mut self, track_id: TrackId) -> Option<&mut CachedHandle> {
        self.entries.peek_mut(&track_id)
    }

    /// Insert a handle, releasing whatever it displaces
    pub fn insert(&mut self, track_id: TrackId, handle: CachedHandle) {
        if let Some((evicted_track, evicted)) = self.entries.push(track_id, handle) {
            debug!(
                track_id = %evicted_track,
                handle = %evicted.id(),
                "Releasing evicted decoder handle"
            );
            evicted.release();
        }
    }

    /// Remove and release the handle for a track
    pub fn release(&mut self, track_id: TrackId) -> bool {
        match self.entries.pop(&track_id) {
            Some(handle) => {
                debug!(track_id = %track_id, handle = %handle.id(), "Releasing decoder handle");
                handle.release();
                true
            }
            None => false,
        }
    }

    /// Release every cached handle
    pub fn clear(&mut self) {
        while let Some((_, handle)) = self.entries.pop_lru() {
            handle.release();
        }
    }

    /// Find the track owning a handle id
    pub fn track_for(&self, id: HandleId) -> Option<TrackId> {
        self.entries
            .iter()
            .find(|(_, cached)| cached.id() == id)
            .map(|(track_id, _)| *track_id)
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.entries.contains(&track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Drop for DecoderCache {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountingHandle {
        released: Rc<RefCell<Vec<u64>>>,
        id: u64,
    }

    impl DecoderHandle for CountingHandle {
        fn start(&mut self) -> crate::Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn seek(&mut self, _position: Duration) {}
        fn position(&self) -> Duration {
            Duration::ZERO
        }
        fn duration(&self) -> Option<Duration> {
            None
        }
        fn is_playing(&self) -> bool {
            false
        }
        fn release(&mut self) {
            self.released.borrow_mut().push(self.id);
        }
    }

    fn cached(id: u64, released: &Rc<RefCell<Vec<u64>>>) -> CachedHandle {
        CachedHandle::new(
            HandleId(id),
            Box::new(CountingHandle {
                released: Rc::clone(released),
                id,
            }),
        )
    }

    #[test]
    fn evicts_least_recently_used() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut cache = DecoderCache::new(2);

        cache.insert(TrackId(1), cached(1, &released));
        cache.insert(TrackId(2), cached(2, &released));

        // Touch track 1 so track 2 becomes the eviction candidate
        assert!(cache.get_mut(TrackId(1)).is_some());

        cache.insert(TrackId(3), cached(3, &released));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(TrackId(1)));
        assert!(!cache.contains(TrackId(2)));
        assert_eq!(*released.borrow(), vec![2]);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut cache = DecoderCache::new(0);
        assert_eq!(cache.capacity(), 1);

        cache.insert(TrackId(1), cached(1, &released));
        cache.insert(TrackId(2), cached(2, &released));
        assert_eq!(cache.len(), 1);
        assert_eq!(*released.borrow(), vec![1]);
    }

    #[test]
    fn explicit_release_and_drop() {
        let released = Rc::new(RefCell::new(Vec::new()));
        {
            let mut cache = DecoderCache::new(4);
            cache.insert(TrackId(1), cached(1, &released));
            cache.insert(TrackId(2), cached(2, &released));

            assert!(cache.release(TrackId(1)));
            assert!(!cache.release(TrackId(1)));
            assert_eq!(*released.borrow(), vec![1]);
        }
        assert_eq!(*released.borrow(), vec![1, 2]);
    }

    #[test]
    fn finds_track_by_handle_id() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut cache = DecoderCache::new(4);
        cache.insert(TrackId(10), cached(7, &released));

        assert_eq!(cache.track_for(HandleId(7)), Some(TrackId(10)));
        assert_eq!(cache.track_for(HandleId(8)), None);
    }

    #[test]
    fn ready_event_records_duration() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let mut handle = cached(1, &released);
        assert!(handle.duration().is_none());

        assert!(handle.apply_event(&EngineEvent::Ready {
            duration: Duration::from_secs(200),
        }));
        assert_eq!(handle.duration(), Some(Duration::from_secs(200)));
        assert_eq!(handle.state(), HandleState::Ready);
    }

    #[test]
    fn end_after_pause_or_stop_is_stale() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let ready = EngineEvent::Ready {
            duration: Duration::from_secs(200),
        };

        let mut paused = cached(1, &released);
        paused.apply_event(&ready);
        paused.start().unwrap();
        paused.pause();
        assert!(!paused.apply_event(&EngineEvent::Ended));
        assert_eq!(paused.state(), HandleState::Paused);

        let mut stopped = cached(2, &released);
        stopped.apply_event(&ready);
        stopped.start().unwrap();
        stopped.stop();
        assert!(!stopped.apply_event(&EngineEvent::Ended));
        assert_eq!(stopped.state(), HandleState::Stopped);

        let mut playing = cached(3, &released);
        playing.apply_event(&ready);
        playing.start().unwrap();
        assert!(playing.apply_event(&EngineEvent::Ended));
        assert_eq!(playing.state(), HandleState::Ended);
    }
}
