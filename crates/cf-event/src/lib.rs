//! # CueForge Event System
//!
//! Gameplay code asks for sounds by hierarchical event name; this crate
//! decides what actually plays.
//!
//! ## Architecture
//!
//! - **Banks**: Named groups of event definitions, mounted with reference counting
//! - **Resolution**: Exact lookup, then progressively more general names
//!   (`WOLF:GRAVEL:FOOTSTEP` → `GRAVEL:FOOTSTEP` → `FOOTSTEP`)
//! - **Selection**: Weighted random choice among same-named variants
//! - **Voices**: Playing instances attached to anchors, reaped once finished
//! - **Manager**: The facade tying it together, plus a small music queue
//!
//! ## Example
//!
//! ```
//! use cf_event::{EventBank, EventDefinition, EventManager, ManagerConfig, MemoryBankSource, SimBackend};
//!
//! let banks = MemoryBankSource::new().with_bank(
//!     EventBank::new("Weapons").with_event(EventDefinition::new("SHOT").with_clip("shot.wav")),
//! );
//! let mut manager = EventManager::new(ManagerConfig::default(), Box::new(SimBackend::new()), Box::new(banks));
//!
//! manager.mount_bank("Weapons");
//! let voice = manager.play("LASER:SHOT", None).expect("falls back to SHOT");
//! assert!(manager.is_playing(voice));
//! ```

pub mod anchor;
pub mod bank;
pub mod config;
pub mod event;
pub mod manager;
pub mod music;
pub mod name;
pub mod playback;
pub mod resolver;
pub mod select;
pub mod sim;
pub mod voice;

pub use anchor::{Anchor, AnchorRef, GlobalAnchor, TrackedAnchor, WeakAnchor, live_anchor};
pub use bank::{BankLoad, BankRegistry, BankSource, BankUnload, MemoryBankSource};
pub use config::ManagerConfig;
pub use event::{AnchorPolicy, ClipHandle, EventBank, EventDefinition, PlaybackParams, RolloffMode};
pub use manager::{EventManager, SharedEventManager, TickReport};
pub use music::{MusicQueue, MusicTrack};
pub use name::{EVENT_NAME_SEPARATOR, FallbackChain, fallback_chain, generalize, make_event_name};
pub use playback::{PlaybackBackend, PlaybackVoice};
pub use resolver::{EventResolver, Resolved};
pub use select::{SelectionRng, select_weighted};
pub use sim::{DEFAULT_CLIP_FRAMES, SimBackend, SimProbe, SimVoiceState};
pub use voice::{Voice, VoiceHandle, VoiceManager};

pub use cf_core::{CfError, CfResult, Position};
