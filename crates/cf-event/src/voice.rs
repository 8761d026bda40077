//! Voice Management
//!
//! A voice is one playing instance of a resolved event, attached to an
//! anchor. The voice manager owns every live voice in creation order and
//! reaps finished ones once per tick.
//!
//! ## Per-tick rules (in order, per voice)
//!
//! 1. Follow the anchor when it moved, unless the event opts out.
//! 2. Release a loop whose anchor died, unless the event keeps it looping.
//! 3. Stop a voice whose anchor died when the event asks for it.
//!
//! Then every finished voice (playback ran out or was stopped) is removed
//! and its backend resource dropped.

use std::sync::Arc;

use cf_core::{CfResult, Position};

use crate::anchor::{AnchorRef, WeakAnchor, live_anchor};
use crate::event::{ClipHandle, EventDefinition};
use crate::playback::{PlaybackBackend, PlaybackVoice};

// ═══════════════════════════════════════════════════════════════════════════════
// VOICE HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Caller-side reference to a voice
///
/// Handles are never reused, so a stale handle simply stops matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    /// Raw id (diagnostics only)
    pub fn id(&self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOICE
// ═══════════════════════════════════════════════════════════════════════════════

/// One active playback instance
pub struct Voice {
    handle: VoiceHandle,
    definition: Arc<EventDefinition>,
    anchor: WeakAnchor,
    /// `None` once stopped: the resource is released immediately
    playback: Option<Box<dyn PlaybackVoice>>,
    position: Position,
    /// Anchor revision this voice last copied its position from
    seen_revision: u64,
}

impl Voice {
    pub fn handle(&self) -> VoiceHandle {
        self.handle
    }

    pub fn definition(&self) -> &Arc<EventDefinition> {
        &self.definition
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether the anchor is still alive
    pub fn has_anchor(&self) -> bool {
        live_anchor(&self.anchor).is_some()
    }

    pub fn is_looping(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| p.is_looping())
    }

    /// Playback ran out, or the voice was stopped
    pub fn is_finished(&self) -> bool {
        self.playback.as_ref().is_none_or(|p| !p.is_playing())
    }

    fn stop(&mut self) {
        if let Some(mut playback) = self.playback.take() {
            playback.stop();
        }
    }

    /// Apply the anchor rules for one tick
    fn update(&mut self) {
        let Some(playback) = self.playback.as_mut() else {
            return;
        };
        let policy = self.definition.policy;
        let anchor = live_anchor(&self.anchor);

        if !policy.do_not_track_anchor_movement {
            if let Some(anchor) = &anchor {
                let revision = anchor.revision();
                if revision != self.seen_revision {
                    self.seen_revision = revision;
                    self.position = anchor.position();
                    playback.set_position(self.position);
                }
            }
        }

        if anchor.is_none() {
            if playback.is_looping() && !policy.keep_looping_when_anchor_dies {
                playback.set_loop(false);
            }
            if policy.stop_when_anchor_dies {
                playback.stop();
            }
        }
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("handle", &self.handle)
            .field("event", &self.definition.event_name)
            .field("position", &self.position)
            .field("finished", &self.is_finished())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOICE MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Owner of all live voices
///
/// No voice limit is enforced here; the backend refuses voices when it runs
/// out of resources.
pub struct VoiceManager {
    backend: Box<dyn PlaybackBackend>,
    /// Live voices in creation order
    voices: Vec<Voice>,
    next_handle: u64,
}

impl VoiceManager {
    pub fn new(backend: Box<dyn PlaybackBackend>) -> Self {
        Self {
            backend,
            voices: Vec::new(),
            next_handle: 1,
        }
    }

    /// Create, configure and start a voice for a resolved event
    pub fn play(
        &mut self,
        definition: Arc<EventDefinition>,
        clip: &ClipHandle,
        anchor: &AnchorRef,
    ) -> CfResult<VoiceHandle> {
        let mut playback = self.backend.create_voice(clip)?;

        let seen_revision = anchor.revision();
        let position = anchor.position();
        playback.apply(&definition.params);
        playback.set_position(position);
        playback.play();

        let handle = VoiceHandle(self.next_handle);
        self.next_handle += 1;

        log::trace!(
            "Voice {} started for '{}'",
            handle.id(),
            definition.event_name
        );

        self.voices.push(Voice {
            handle,
            definition,
            anchor: Arc::downgrade(anchor),
            playback: Some(playback),
            position,
            seen_revision,
        });

        Ok(handle)
    }

    /// Stop a voice now. Unknown or already stopped handles are ignored.
    ///
    /// Returns whether a playing resource was stopped.
    pub fn stop(&mut self, handle: VoiceHandle) -> bool {
        match self.voices.iter_mut().find(|v| v.handle == handle) {
            Some(voice) if voice.playback.is_some() => {
                voice.stop();
                true
            }
            _ => false,
        }
    }

    /// Stop every voice
    pub fn stop_all(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    /// Apply anchor rules, then reap finished voices
    ///
    /// Returns the number of voices reaped.
    pub fn tick(&mut self) -> usize {
        for voice in &mut self.voices {
            voice.update();
        }

        let before = self.voices.len();
        self.voices.retain(|voice| {
            let finished = voice.is_finished();
            if finished {
                log::trace!(
                    "Reaping voice {} ('{}')",
                    voice.handle.id(),
                    voice.definition.event_name
                );
            }
            !finished
        });
        before - self.voices.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn get(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.iter().find(|v| v.handle == handle)
    }

    /// Whether the voice is tracked and still playing
    pub fn is_playing(&self, handle: VoiceHandle) -> bool {
        self.get(handle).is_some_and(|v| !v.is_finished())
    }

    /// Whether the voice is still in the live set (possibly awaiting reap)
    pub fn contains(&self, handle: VoiceHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    /// Live voices in creation order
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::TrackedAnchor;
    use crate::sim::{SimBackend, SimProbe};
    use cf_core::origin;

    fn manager() -> (VoiceManager, SimProbe) {
        let backend = SimBackend::new().with_clip_length("clip", 10);
        let probe = backend.probe();
        (VoiceManager::new(Box::new(backend)), probe)
    }

    fn event(def: EventDefinition) -> (Arc<EventDefinition>, ClipHandle) {
        (Arc::new(def), ClipHandle::from("clip"))
    }

    #[test]
    fn test_play_configures_voice() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(Position::new(5.0, 0.0, 0.0));
        let (def, clip) = event(EventDefinition::new("SHOT").with_volume(0.5));

        let handle = voices.play(def, &clip, &anchor).unwrap();

        assert!(voices.is_playing(handle));
        assert_eq!(voices.active_count(), 1);
        let state = probe.voice(0).unwrap();
        assert!(state.playing);
        assert_eq!(state.position, Position::new(5.0, 0.0, 0.0));
        assert_eq!(state.params.map(|p| p.volume), Some(0.5));
    }

    #[test]
    fn test_handles_unique() {
        let (mut voices, _probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));

        let a = voices.play(def.clone(), &clip, &anchor).unwrap();
        let b = voices.play(def, &clip, &anchor).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_finished_reaped_after_one_tick() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));

        let first = voices.play(def.clone(), &clip, &anchor).unwrap();
        let second = voices.play(def, &clip, &anchor).unwrap();

        probe.finish(0);
        assert!(voices.contains(first));

        assert_eq!(voices.tick(), 1);
        assert!(!voices.contains(first));
        assert!(voices.contains(second));
        assert_eq!(probe.live_count(), 1);
    }

    #[test]
    fn test_stop_is_immediate_and_idempotent() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));
        let handle = voices.play(def, &clip, &anchor).unwrap();

        assert!(voices.stop(handle));
        // Resource released before the next tick
        assert_eq!(probe.live_count(), 0);
        assert!(!voices.is_playing(handle));
        assert!(!voices.stop(handle));
        assert_eq!(probe.voice(0).unwrap().stop_calls, 1);

        voices.tick();
        assert!(!voices.contains(handle));
        assert!(!voices.stop(handle));
    }

    #[test]
    fn test_tracks_anchor_movement() {
        let (mut voices, probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (def, clip) = event(EventDefinition::new("ENGINE"));
        let handle = voices.play(def, &clip, &shared).unwrap();

        anchor.set_position(Position::new(0.0, 4.0, 0.0));
        voices.tick();

        assert_eq!(voices.get(handle).unwrap().position(), Position::new(0.0, 4.0, 0.0));
        assert_eq!(probe.voice(0).unwrap().position, Position::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn test_static_voice_ignores_movement() {
        let (mut voices, probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (def, clip) = event(EventDefinition::new("STATIC_SHOT").do_not_track_anchor_movement());
        let handle = voices.play(def, &clip, &shared).unwrap();

        anchor.set_position(Position::new(9.0, 9.0, 9.0));
        voices.tick();

        assert_eq!(voices.get(handle).unwrap().position(), origin());
        assert_eq!(probe.voice(0).unwrap().position, origin());
    }

    #[test]
    fn test_loop_released_on_anchor_death() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("DIE_RELEASE_LOOP").with_loop(true));
        let handle = voices.play(def, &clip, &anchor).unwrap();

        probe.advance(25);
        voices.tick();
        assert!(voices.get(handle).unwrap().is_looping());

        drop(anchor);
        voices.tick();

        // Loop released but still playing out the current pass
        let voice = voices.get(handle).unwrap();
        assert!(!voice.is_looping());
        assert!(!voice.is_finished());

        probe.advance(10);
        voices.tick();
        assert!(!voices.contains(handle));
    }

    #[test]
    fn test_keep_looping_when_anchor_dies() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(
            EventDefinition::new("ALARM")
                .with_loop(true)
                .keep_looping_when_anchor_dies(),
        );
        let handle = voices.play(def, &clip, &anchor).unwrap();

        drop(anchor);
        voices.tick();
        probe.advance(100);
        voices.tick();

        assert!(voices.is_playing(handle));
        assert!(voices.get(handle).unwrap().is_looping());
        assert!(!voices.get(handle).unwrap().has_anchor());
    }

    #[test]
    fn test_stop_when_anchor_dies() {
        let (mut voices, probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (def, clip) = event(
            EventDefinition::new("LOOP")
                .with_loop(true)
                .keep_looping_when_anchor_dies()
                .stop_when_anchor_dies(),
        );
        let handle = voices.play(def, &clip, &shared).unwrap();

        voices.tick();
        assert!(voices.contains(handle));

        anchor.despawn();
        assert_eq!(voices.tick(), 1);
        assert!(!voices.contains(handle));
        assert_eq!(probe.voice(0).unwrap().stop_calls, 1);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SHARED ANCHORS
    // ═══════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_shared_anchor_movement_reaches_every_voice() {
        let (mut voices, probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (def, clip) = event(EventDefinition::new("ENGINE"));

        let a = voices.play(def.clone(), &clip, &shared).unwrap();
        let b = voices.play(def.clone(), &clip, &shared).unwrap();

        anchor.set_position(Position::new(0.0, 4.0, 0.0));
        voices.tick();

        for (serial, handle) in [a, b].into_iter().enumerate() {
            assert_eq!(voices.get(handle).unwrap().position(), Position::new(0.0, 4.0, 0.0));
            assert_eq!(probe.voice(serial).unwrap().position, Position::new(0.0, 4.0, 0.0));
        }

        // A voice started after the move follows later moves too
        let c = voices.play(def, &clip, &shared).unwrap();
        anchor.set_position(Position::new(1.0, 1.0, 1.0));
        voices.tick();
        for handle in [a, b, c] {
            assert_eq!(voices.get(handle).unwrap().position(), Position::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_shared_anchor_static_voice_ignores_movement() {
        let (mut voices, _probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (static_def, clip) = event(EventDefinition::new("STATIC_SHOT").do_not_track_anchor_movement());
        let (tracking_def, _) = event(EventDefinition::new("SHOT"));

        let fixed = voices.play(static_def, &clip, &shared).unwrap();
        let follower = voices.play(tracking_def, &clip, &shared).unwrap();

        anchor.set_position(Position::new(5.0, 0.0, 0.0));
        voices.tick();

        assert_eq!(voices.get(fixed).unwrap().position(), origin());
        assert_eq!(voices.get(follower).unwrap().position(), Position::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_shared_anchor_death_releases_every_loop() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("DIE_RELEASE_LOOP").with_loop(true));

        let a = voices.play(def.clone(), &clip, &anchor).unwrap();
        let b = voices.play(def, &clip, &anchor).unwrap();

        drop(anchor);
        voices.tick();

        for handle in [a, b] {
            let voice = voices.get(handle).unwrap();
            assert!(!voice.is_looping());
            assert!(!voice.is_finished());
        }

        probe.advance(10);
        assert_eq!(voices.tick(), 2);
    }

    #[test]
    fn test_shared_anchor_death_stops_every_voice() {
        let (mut voices, probe) = manager();
        let anchor = TrackedAnchor::new(origin());
        let shared: AnchorRef = anchor.clone();
        let (stopping, clip) = event(
            EventDefinition::new("LOOP")
                .with_loop(true)
                .keep_looping_when_anchor_dies()
                .stop_when_anchor_dies(),
        );
        let (surviving, _) = event(
            EventDefinition::new("ALARM")
                .with_loop(true)
                .keep_looping_when_anchor_dies(),
        );

        let a = voices.play(stopping.clone(), &clip, &shared).unwrap();
        let b = voices.play(stopping, &clip, &shared).unwrap();
        let keep = voices.play(surviving, &clip, &shared).unwrap();

        anchor.despawn();
        assert_eq!(voices.tick(), 2);

        assert!(!voices.contains(a));
        assert!(!voices.contains(b));
        assert!(voices.is_playing(keep));
        assert_eq!(probe.voice(0).unwrap().stop_calls, 1);
        assert_eq!(probe.voice(1).unwrap().stop_calls, 1);
    }

    #[test]
    fn test_reap_preserves_order() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));

        let handles: Vec<_> = (0..5)
            .map(|_| voices.play(def.clone(), &clip, &anchor).unwrap())
            .collect();

        // Adjacent finished voices must not be skipped
        probe.finish(1);
        probe.finish(2);
        probe.finish(4);
        assert_eq!(voices.tick(), 3);

        let remaining: Vec<_> = voices.voices().iter().map(Voice::handle).collect();
        assert_eq!(remaining, vec![handles[0], handles[3]]);
    }

    #[test]
    fn test_backend_exhaustion() {
        let mut voices = VoiceManager::new(Box::new(SimBackend::with_capacity(1)));
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));

        assert!(voices.play(def.clone(), &clip, &anchor).is_ok());
        assert!(voices.play(def, &clip, &anchor).is_err());
        assert_eq!(voices.active_count(), 1);
    }

    #[test]
    fn test_stop_all() {
        let (mut voices, probe) = manager();
        let anchor: AnchorRef = TrackedAnchor::new(origin());
        let (def, clip) = event(EventDefinition::new("SHOT"));
        for _ in 0..3 {
            voices.play(def.clone(), &clip, &anchor).unwrap();
        }

        voices.stop_all();
        assert_eq!(probe.live_count(), 0);
        assert_eq!(voices.tick(), 3);
        assert_eq!(voices.active_count(), 0);
    }
}
