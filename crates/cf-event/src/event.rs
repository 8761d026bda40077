//! Event Definitions
//!
//! An event definition is one playable variant of a named event: a clip,
//! the playback parameters applied to the voice that plays it, a selection
//! weight and the policy for what happens when its anchor dies.
//!
//! Several definitions may share one event name; together they form a
//! variant group, disambiguated by weighted random selection.

use cf_core::{CfError, CfResult};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// CLIP HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reference to an audio clip, opaque to the event core
///
/// The playback backend decides what the string means (asset path,
/// package key, ...). The core only checks that one is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipHandle(pub String);

impl ClipHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClipHandle {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYBACK PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Distance attenuation curve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "keys")]
pub enum RolloffMode {
    /// Inverse-distance falloff
    #[default]
    Logarithmic,
    /// Linear falloff between min and max distance
    Linear,
    /// Authored curve of (normalized distance, gain) keys
    Custom(Vec<(f32, f32)>),
}

/// Parameters handed verbatim to the playback backend
///
/// Apart from `looping` (which the voice manager may release when an
/// anchor dies) none of these are interpreted by the event core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Linear gain (0.0 - 1.0)
    pub volume: f32,
    /// Playback rate multiplier
    pub pitch: f32,
    /// Voice priority (0 = most important, 256 = least)
    pub priority: u16,
    /// Caller-defined grouping id
    pub group_id: i32,
    /// Loop the clip until released or stopped
    pub looping: bool,
    pub mute: bool,
    pub bypass_effects: bool,
    pub bypass_listener_effects: bool,
    pub bypass_reverb_zones: bool,
    pub doppler_level: f32,
    /// Distance below which no attenuation applies
    pub min_distance: f32,
    /// Distance beyond which the voice is inaudible
    pub max_distance: f32,
    /// Stereo pan (-1.0 left .. 1.0 right)
    pub pan_stereo: f32,
    pub spatialize: bool,
    /// 0.0 = fully 2D, 1.0 = fully 3D
    pub spatial_blend: f32,
    pub reverb_zone_mix: f32,
    /// Name of the mixer group to route into (backend-defined)
    pub output_mixer_group: Option<String>,
    pub rolloff: RolloffMode,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            priority: 128,
            group_id: 0,
            looping: false,
            mute: false,
            bypass_effects: false,
            bypass_listener_effects: false,
            bypass_reverb_zones: false,
            doppler_level: 1.0,
            min_distance: 1.0,
            max_distance: 500.0,
            pan_stereo: 0.0,
            spatialize: false,
            spatial_blend: 0.0,
            reverb_zone_mix: 1.0,
            output_mixer_group: None,
            rolloff: RolloffMode::Logarithmic,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANCHOR POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// What a voice does when the object it is attached to moves or dies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorPolicy {
    /// Cut playback as soon as the anchor dies
    pub stop_when_anchor_dies: bool,
    /// Keep a loop running after the anchor dies (otherwise it is released)
    pub keep_looping_when_anchor_dies: bool,
    /// Stay where the voice started instead of following the anchor
    pub do_not_track_anchor_movement: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT DEFINITION
// ═══════════════════════════════════════════════════════════════════════════════

/// One playable variant of a named event
///
/// ## Example
///
/// ```rust
/// use cf_event::EventDefinition;
///
/// let shot = EventDefinition::new("LASER:SHOT")
///     .with_clip("sfx/laser_01.wav")
///     .with_weight(3.0)
///     .with_volume(0.8);
///
/// assert_eq!(shot.event_name, "LASER:SHOT");
/// assert!(shot.bank_name().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDefinition {
    /// Hierarchical event name (not unique)
    pub event_name: String,
    /// Relative selection weight within the variant group
    pub random_weight: f32,
    /// Clip to play; a definition without one never produces a voice
    pub clip: Option<ClipHandle>,
    /// Parameters applied to the voice
    pub params: PlaybackParams,
    /// Anchor lifecycle behaviour
    pub policy: AnchorPolicy,
    /// Owning bank, tagged once when the bank is indexed
    #[serde(skip)]
    bank_name: Option<String>,
}

impl Default for EventDefinition {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            random_weight: 1.0,
            clip: None,
            params: PlaybackParams::default(),
            policy: AnchorPolicy::default(),
            bank_name: None,
        }
    }
}

impl EventDefinition {
    /// Create a definition for an event name with default parameters
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Default::default()
        }
    }

    // === Builder methods ===

    pub fn with_clip(mut self, clip: impl Into<ClipHandle>) -> Self {
        self.clip = Some(clip.into());
        self
    }

    /// Set selection weight (negative values clamp to zero)
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.random_weight = weight.max(0.0);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.params.volume = volume;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.params.pitch = pitch;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.params.looping = looping;
        self
    }

    pub fn with_params(mut self, params: PlaybackParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_policy(mut self, policy: AnchorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn stop_when_anchor_dies(mut self) -> Self {
        self.policy.stop_when_anchor_dies = true;
        self
    }

    pub fn keep_looping_when_anchor_dies(mut self) -> Self {
        self.policy.keep_looping_when_anchor_dies = true;
        self
    }

    pub fn do_not_track_anchor_movement(mut self) -> Self {
        self.policy.do_not_track_anchor_movement = true;
        self
    }

    // === Queries ===

    /// Bank this definition was indexed from, if any
    pub fn bank_name(&self) -> Option<&str> {
        self.bank_name.as_deref()
    }

    /// Weight used for selection (negative and NaN weights count as zero)
    #[inline]
    pub fn selection_weight(&self) -> f32 {
        if self.random_weight.is_nan() {
            0.0
        } else {
            self.random_weight.max(0.0)
        }
    }

    /// Tag with the owning bank. Only the registry calls this, before the
    /// definition is shared.
    pub(crate) fn tagged(mut self, bank_name: &str) -> Self {
        self.bank_name = Some(bank_name.to_string());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT BANK
// ═══════════════════════════════════════════════════════════════════════════════

/// A named, loader-produced collection of event definitions
///
/// Order matters only as a stable tie-break: variants are indexed in the
/// order they appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBank {
    pub name: String,
    pub events: Vec<EventDefinition>,
}

impl EventBank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, event: EventDefinition) -> Self {
        self.events.push(event);
        self
    }

    pub fn add_event(&mut self, event: EventDefinition) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Reject authoring mistakes a loader should not silently index
    ///
    /// Every definition needs a name, and weights must be finite and
    /// non-negative.
    pub fn validate(&self) -> CfResult<()> {
        for (index, event) in self.events.iter().enumerate() {
            if event.event_name.is_empty() {
                return Err(CfError::InvalidParam(format!(
                    "bank '{}': event #{} has an empty event_name",
                    self.name, index
                )));
            }
            if !event.random_weight.is_finite() || event.random_weight < 0.0 {
                return Err(CfError::InvalidParam(format!(
                    "bank '{}': event '{}' has weight {}",
                    self.name, event.event_name, event.random_weight
                )));
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
