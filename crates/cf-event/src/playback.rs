//! Playback Primitive Boundary
//!
//! The event core never decodes or mixes audio. It asks a backend for a
//! voice resource, configures it and polls it once per tick.

use cf_core::{CfResult, Position};

use crate::event::{ClipHandle, PlaybackParams};

/// One playback resource created by a backend
pub trait PlaybackVoice: Send {
    /// Apply every parameter of an event (including the loop flag)
    fn apply(&mut self, params: &PlaybackParams);

    fn play(&mut self);

    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    fn is_looping(&self) -> bool;

    fn set_loop(&mut self, looping: bool);

    fn set_position(&mut self, position: Position);
}

/// Factory for playback resources
pub trait PlaybackBackend: Send {
    /// Acquire a voice for a clip.
    ///
    /// Fails with `CfError::VoiceUnavailable` when the backend is out of
    /// resources; the caller treats that as "nothing is playing".
    fn create_voice(&mut self, clip: &ClipHandle) -> CfResult<Box<dyn PlaybackVoice>>;
}
