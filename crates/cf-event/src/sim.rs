//! Simulated Playback Backend
//!
//! Frame-counted stand-in for a real mixer, used by tests and the demo
//! scene. A [`SimProbe`] shares state with the backend so a host can
//! advance simulated time and inspect voices after the backend has been
//! moved into the manager.

use std::collections::HashMap;
use std::sync::Arc;

use cf_core::{CfError, CfResult, Position, origin};
use parking_lot::Mutex;

use crate::event::{ClipHandle, PlaybackParams};
use crate::playback::{PlaybackBackend, PlaybackVoice};

/// Clip length used when none was registered
pub const DEFAULT_CLIP_FRAMES: u32 = 30;

/// Observable state of one simulated voice
#[derive(Debug, Clone, PartialEq)]
pub struct SimVoiceState {
    /// Creation order (0-based)
    pub serial: usize,
    pub clip: ClipHandle,
    pub params: Option<PlaybackParams>,
    pub playing: bool,
    pub looping: bool,
    pub position: Position,
    /// Frames elapsed in the current pass through the clip
    pub elapsed: u32,
    pub length: u32,
    /// Times `stop` was called
    pub stop_calls: u32,
    /// The voice resource was dropped by its owner
    pub released: bool,
}

#[derive(Debug)]
struct SimShared {
    voices: Vec<Arc<Mutex<SimVoiceState>>>,
    capacity: Option<usize>,
    clip_lengths: HashMap<ClipHandle, u32>,
}

impl SimShared {
    fn live_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.lock().released).count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Simulated backend
#[derive(Debug, Clone)]
pub struct SimBackend {
    shared: Arc<Mutex<SimShared>>,
}

impl SimBackend {
    /// Backend with unlimited voices
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(SimShared {
                voices: Vec::new(),
                capacity: None,
                clip_lengths: HashMap::new(),
            })),
        }
    }

    /// Backend that refuses voices beyond `max_voices` live resources
    pub fn with_capacity(max_voices: usize) -> Self {
        let backend = Self::new();
        backend.shared.lock().capacity = Some(max_voices);
        backend
    }

    /// Register a clip length in frames
    pub fn with_clip_length(self, clip: impl Into<ClipHandle>, frames: u32) -> Self {
        self.shared.lock().clip_lengths.insert(clip.into(), frames.max(1));
        self
    }

    /// Inspection / control handle sharing this backend's state
    pub fn probe(&self) -> SimProbe {
        SimProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackBackend for SimBackend {
    fn create_voice(&mut self, clip: &ClipHandle) -> CfResult<Box<dyn PlaybackVoice>> {
        let mut shared = self.shared.lock();

        if let Some(capacity) = shared.capacity {
            if shared.live_count() >= capacity {
                return Err(CfError::VoiceUnavailable(format!(
                    "all {} simulated voices in use",
                    capacity
                )));
            }
        }

        let length = shared
            .clip_lengths
            .get(clip)
            .copied()
            .unwrap_or(DEFAULT_CLIP_FRAMES);
        let state = Arc::new(Mutex::new(SimVoiceState {
            serial: shared.voices.len(),
            clip: clip.clone(),
            params: None,
            playing: false,
            looping: false,
            position: origin(),
            elapsed: 0,
            length,
            stop_calls: 0,
            released: false,
        }));
        shared.voices.push(Arc::clone(&state));

        Ok(Box::new(SimVoice { state }))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VOICE
// ═══════════════════════════════════════════════════════════════════════════════

struct SimVoice {
    state: Arc<Mutex<SimVoiceState>>,
}

impl PlaybackVoice for SimVoice {
    fn apply(&mut self, params: &PlaybackParams) {
        let mut state = self.state.lock();
        state.looping = params.looping;
        state.params = Some(params.clone());
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        state.playing = true;
        state.elapsed = 0;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.stop_calls += 1;
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    fn set_loop(&mut self, looping: bool) {
        self.state.lock().looping = looping;
    }

    fn set_position(&mut self, position: Position) {
        self.state.lock().position = position;
    }
}

impl Drop for SimVoice {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.released = true;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROBE
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared view of a [`SimBackend`]
#[derive(Debug, Clone)]
pub struct SimProbe {
    shared: Arc<Mutex<SimShared>>,
}

impl SimProbe {
    /// Advance simulated time. Loops wrap; one-shots stop at clip end.
    pub fn advance(&self, frames: u32) {
        let shared = self.shared.lock();
        for voice in &shared.voices {
            let mut state = voice.lock();
            if !state.playing {
                continue;
            }
            state.elapsed = state.elapsed.saturating_add(frames);
            if state.elapsed >= state.length {
                if state.looping {
                    state.elapsed %= state.length;
                } else {
                    state.playing = false;
                }
            }
        }
    }

    /// End every playing voice as if its clip ran out
    pub fn finish_all(&self) {
        for voice in &self.shared.lock().voices {
            voice.lock().playing = false;
        }
    }

    /// End one voice by creation order
    pub fn finish(&self, serial: usize) {
        if let Some(voice) = self.shared.lock().voices.get(serial) {
            voice.lock().playing = false;
        }
    }

    /// Voices created so far (including released ones)
    pub fn created_count(&self) -> usize {
        self.shared.lock().voices.len()
    }

    /// Voices whose resource has not been released
    pub fn live_count(&self) -> usize {
        self.shared.lock().live_count()
    }

    pub fn playing_count(&self) -> usize {
        self.shared
            .lock()
            .voices
            .iter()
            .filter(|v| v.lock().playing)
            .count()
    }

    /// Snapshot of one voice by creation order
    pub fn voice(&self, serial: usize) -> Option<SimVoiceState> {
        self.shared
            .lock()
            .voices
            .get(serial)
            .map(|v| v.lock().clone())
    }

    /// Snapshot of every voice in creation order
    pub fn voice_states(&self) -> Vec<SimVoiceState> {
        self.shared
            .lock()
            .voices
            .iter()
            .map(|v| v.lock().clone())
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
