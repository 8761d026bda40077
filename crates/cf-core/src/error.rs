//! Error types for CueForge

use thiserror::Error;

/// Core error type
///
/// Nothing in the event core is fatal: every variant degrades to
/// "nothing audible happens" at the public `play` surface.
#[derive(Error, Debug)]
pub enum CfError {
    #[error("Empty event name")]
    EmptyEventName,

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Event '{0}' has no clip")]
    MissingClip(String),

    #[error("Bank '{bank}' unavailable: {reason}")]
    BankUnavailable { bank: String, reason: String },

    #[error("Voice unavailable: {0}")]
    VoiceUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

impl CfError {
    /// Whether this error means "the name resolved to nothing playable"
    pub fn is_not_found(&self) -> bool {
        matches!(self, CfError::EventNotFound(_) | CfError::MissingClip(_))
    }
}

/// Result type alias
pub type CfResult<T> = Result<T, CfError>;
