//! Event Manager
//!
//! Facade composing the bank registry, the resolver and the voice manager.
//! This is the surface gameplay code talks to:
//! - Bank mount/unmount (reference counted)
//! - `play` / `stop`
//! - The per-frame `tick`
//! - A best-effort music queue
//!
//! ## Threading
//!
//! Everything runs synchronously on the caller's thread. Hosts that call in
//! from several threads share one manager through [`SharedEventManager`],
//! which serializes access to the registry and the live voices together.

use std::sync::Arc;

use cf_core::{CfError, CfResult, Position};
use parking_lot::Mutex;

use crate::anchor::{AnchorRef, GlobalAnchor};
use crate::bank::{BankLoad, BankRegistry, BankSource, BankUnload};
use crate::config::ManagerConfig;
use crate::music::MusicQueue;
use crate::playback::PlaybackBackend;
use crate::resolver::EventResolver;
use crate::voice::{VoiceHandle, VoiceManager};

/// Manager shared between threads
pub type SharedEventManager = Arc<Mutex<EventManager>>;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Voices removed from the live set
    pub reaped: usize,
    /// Voices still live after the tick
    pub active: usize,
    /// A queued music track was started
    pub music_advanced: bool,
}

/// Single-owner audio event service
pub struct EventManager {
    config: ManagerConfig,
    registry: BankRegistry,
    resolver: EventResolver,
    voices: VoiceManager,
    source: Box<dyn BankSource>,
    /// Stands in for a missing anchor (2D playback)
    global_anchor: AnchorRef,
    music: MusicQueue,
}

impl EventManager {
    /// Create a manager over a playback backend and a bank source
    pub fn new(
        config: ManagerConfig,
        backend: Box<dyn PlaybackBackend>,
        source: Box<dyn BankSource>,
    ) -> Self {
        let resolver = match config.seed {
            Some(seed) => EventResolver::with_seed(seed),
            None => EventResolver::new(),
        };

        Self {
            config,
            registry: BankRegistry::new(),
            resolver,
            voices: VoiceManager::new(backend),
            source,
            global_anchor: Arc::new(GlobalAnchor),
            music: MusicQueue::new(),
        }
    }

    /// Wrap in a mutex for multi-threaded hosts
    pub fn into_shared(self) -> SharedEventManager {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ManagerConfig {
        &mut self.config
    }

    /// Restart the variant-selection sequence
    pub fn reseed(&mut self, seed: u64) {
        self.resolver.reseed(seed);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BANKS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Add a reference to a bank, loading it on the first one
    pub fn mount_bank(&mut self, bank_name: &str) -> BankLoad {
        let source = &mut self.source;
        let outcome = self
            .registry
            .load(bank_name, |name| source.load_bank(name));

        match &outcome {
            BankLoad::Loaded { events } if self.config.log_bank_loads => {
                log::info!("Loaded audio bank '{}' ({} events)", bank_name, events);
            }
            BankLoad::AlreadyMounted { ref_count } => {
                log::debug!("Audio bank '{}' ref count now {}", bank_name, ref_count);
            }
            _ => {}
        }
        outcome
    }

    /// Drop a reference to a bank, unloading it on the last one
    pub fn unmount_bank(&mut self, bank_name: &str) -> BankUnload {
        let outcome = self.registry.unload(bank_name);
        if let BankUnload::Released { ref_count } = outcome {
            log::debug!("Audio bank '{}' ref count now {}", bank_name, ref_count);
        }
        outcome
    }

    pub fn is_bank_mounted(&self, bank_name: &str) -> bool {
        self.registry.is_mounted(bank_name)
    }

    pub fn bank_ref_count(&self, bank_name: &str) -> u32 {
        self.registry.ref_count(bank_name)
    }

    pub fn registry(&self) -> &BankRegistry {
        &self.registry
    }

    /// Dump every mounted bank and its reference count
    pub fn log_bank_ref_counts(&self) {
        for (name, count) in self.registry.mounted_banks() {
            log::info!("{}:{}", name, count);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLAYBACK
    // ═══════════════════════════════════════════════════════════════════════════

    /// Play an event, attached to `anchor` (or the global 2D anchor)
    ///
    /// Event names are segments ordered most-specific first
    /// (`WOLF:GRAVEL:FOOTSTEP`); segments are stripped from the left until a
    /// mounted bank defines the name. Returns `None` when nothing could be
    /// played; that is never an error for the caller.
    pub fn play(&mut self, event_name: &str, anchor: Option<&AnchorRef>) -> Option<VoiceHandle> {
        match self.try_play(event_name, anchor) {
            Ok(handle) => Some(handle),
            Err(CfError::EmptyEventName) => None,
            Err(err) if err.is_not_found() => {
                if self.config.log_missing_events {
                    log::warn!("Missing sound event '{}'", event_name);
                }
                None
            }
            Err(err) => {
                log::warn!("Could not play '{}': {}", event_name, err);
                None
            }
        }
    }

    /// Like [`play`](Self::play), reporting why nothing plays
    pub fn try_play(&mut self, event_name: &str, anchor: Option<&AnchorRef>) -> CfResult<VoiceHandle> {
        if event_name.is_empty() {
            return Err(CfError::EmptyEventName);
        }

        let anchor = anchor.unwrap_or(&self.global_anchor);

        if self.config.log_all_events {
            log::info!("Trying event '{}'", event_name);
        }
        if self.config.log_lookups {
            log::debug!("Looking for sound event '{}'", event_name);
        }

        let resolved = self
            .resolver
            .resolve_detailed(&self.registry, event_name)
            .ok_or_else(|| CfError::EventNotFound(event_name.to_string()))?;

        if self.config.log_lookups {
            log::debug!("Found sound event '{}' for '{}'", resolved.matched_name, event_name);
        }

        let definition = resolved.definition;
        let Some(clip) = definition.clip.clone() else {
            return Err(CfError::MissingClip(event_name.to_string()));
        };

        self.voices.play(definition, &clip, anchor)
    }

    /// Stop a voice immediately. Stale handles are ignored.
    pub fn stop(&mut self, handle: VoiceHandle) {
        self.voices.stop(handle);
    }

    /// Stop every voice (the music queue keeps its pending tracks)
    pub fn stop_all(&mut self) {
        self.voices.stop_all();
    }

    /// Per-frame update: anchor rules, reaping, music queue
    pub fn tick(&mut self) -> TickReport {
        let reaped = self.voices.tick();
        let music_advanced = self.advance_music();

        TickReport {
            reaped,
            active: self.voices.active_count(),
            music_advanced,
        }
    }

    pub fn is_playing(&self, handle: VoiceHandle) -> bool {
        self.voices.is_playing(handle)
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.active_count()
    }

    pub fn voice_position(&self, handle: VoiceHandle) -> Option<Position> {
        self.voices.get(handle).map(|v| v.position())
    }

    pub fn voices(&self) -> &VoiceManager {
        &self.voices
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MUSIC
    // ═══════════════════════════════════════════════════════════════════════════

    /// Stop current music, drop the queue and play this track
    pub fn play_music(&mut self, event_name: &str) -> Option<VoiceHandle> {
        self.stop_music();
        self.start_music_track(event_name.to_string())
    }

    /// Play after the current track (and anything queued before) finishes
    pub fn queue_music(&mut self, event_name: &str) {
        self.music.enqueue(event_name);
    }

    /// Stop current music and drop the queue
    pub fn stop_music(&mut self) {
        self.music.clear_pending();
        if let Some(voice) = self.music.take_current().and_then(|track| track.voice) {
            self.voices.stop(voice);
        }
    }

    pub fn music(&self) -> &MusicQueue {
        &self.music
    }

    fn start_music_track(&mut self, event_name: String) -> Option<VoiceHandle> {
        let voice = self.play(&event_name, None);
        if let Some(previous) = self.music.set_current(event_name, voice) {
            if let Some(old) = previous.voice {
                self.voices.stop(old);
            }
        }
        voice
    }

    fn advance_music(&mut self) -> bool {
        let voices = &self.voices;
        match self.music.next_due(|handle| voices.is_playing(handle)) {
            Some(next) => {
                self.start_music_track(next);
                true
            }
            None => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
