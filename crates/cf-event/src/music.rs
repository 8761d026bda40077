//! Music Queue
//!
//! Best-effort add-on: one current track plus a FIFO of pending track
//! event names. The manager starts the next pending track once the current
//! one is no longer playing.

use std::collections::VecDeque;

use crate::voice::VoiceHandle;

/// The track currently owned by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicTrack {
    pub event_name: String,
    /// `None` when the event resolved to nothing playable
    pub voice: Option<VoiceHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct MusicQueue {
    current: Option<MusicTrack>,
    pending: VecDeque<String>,
}

impl MusicQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&MusicTrack> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn enqueue(&mut self, event_name: impl Into<String>) {
        self.pending.push_back(event_name.into());
    }

    /// Record the track that just started, returning the one it replaces
    pub fn set_current(&mut self, event_name: impl Into<String>, voice: Option<VoiceHandle>) -> Option<MusicTrack> {
        self.current.replace(MusicTrack {
            event_name: event_name.into(),
            voice,
        })
    }

    /// Forget the current track, returning it
    pub fn take_current(&mut self) -> Option<MusicTrack> {
        self.current.take()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Pop the next pending track if nothing is playing
    pub fn next_due<F>(&mut self, is_playing: F) -> Option<String>
    where
        F: Fn(VoiceHandle) -> bool,
    {
        let busy = self
            .current
            .as_ref()
            .and_then(|track| track.voice)
            .is_some_and(is_playing);
        if busy {
            return None;
        }
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_idle_pops_in_order() {
        let mut queue = MusicQueue::new();
        queue.enqueue("MUSIC:A");
        queue.enqueue("MUSIC:B");

        assert_eq!(queue.next_due(|_| false).as_deref(), Some("MUSIC:A"));
        assert_eq!(queue.next_due(|_| false).as_deref(), Some("MUSIC:B"));
        assert_eq!(queue.next_due(|_| false), None);
    }

    #[test]
    fn test_queue_waits_for_current() {
        let mut queue = MusicQueue::new();
        let voice = VoiceHandle::from_raw(7);
        queue.set_current("MUSIC:A", Some(voice));
        queue.enqueue("MUSIC:B");

        assert_eq!(queue.next_due(|_| true), None);
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(queue.next_due(|_| false).as_deref(), Some("MUSIC:B"));
    }

    #[test]
    fn test_silent_current_does_not_block() {
        let mut queue = MusicQueue::new();
        queue.set_current("MUSIC:MISSING", None);
        queue.enqueue("MUSIC:B");

        assert_eq!(queue.next_due(|_| true).as_deref(), Some("MUSIC:B"));
    }

    #[test]
    fn test_set_current_replaces() {
        let mut queue = MusicQueue::new();
        assert!(queue.set_current("A", None).is_none());
        let old = queue.set_current("B", None).unwrap();
        assert_eq!(old.event_name, "A");
        assert_eq!(queue.take_current().unwrap().event_name, "B");
        assert!(queue.current().is_none());
    }
}
