//! Error types for the voxcart gateway

use thiserror::Error;

/// Result type alias for voxcart operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voxcart gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Platform lacks a needed speech capability; terminal for voice features
    #[error("speech unsupported: {0}")]
    Unsupported(String),

    /// Microphone access denied; the user may retry after granting access
    #[error("microphone permission denied: {0}")]
    Permission(String),

    /// Mutating command attempted without a signed-in user
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Referenced product or order does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Transcript parsed to no known intent
    #[error("command not understood: {0}")]
    AmbiguousCommand(String),

    /// Streaming session handshake or mid-session failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Hosted AI backend signalled throttling
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Hosted AI backend outage
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Storefront backend error
    #[error("backend error: {0}")]
    Backend(String),

    /// Streaming session tool dispatch error
    #[error("tool error: {0}")]
    Tool(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// True when the error means voice features should be disabled for good
    /// rather than retried.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// User-facing message for an executor boundary result.
    ///
    /// Infrastructure errors collapse into a generic apology so internals
    /// never leak into speech output.
    #[must_use]
    pub fn spoken_message(&self) -> String {
        match self {
            Self::Unsupported(_) => {
                "Voice features are not available on this device.".to_string()
            }
            Self::Permission(_) => {
                "I need microphone access to listen. Please allow it and try again.".to_string()
            }
            Self::NotAuthenticated(_) => "Please log in first.".to_string(),
            Self::NotFound(what) => format!("I couldn't find {what}."),
            Self::AmbiguousCommand(_) => {
                "Sorry, I didn't understand that. Say help to hear what I can do.".to_string()
            }
            Self::Connection(_) => {
                "The voice assistant connection failed. Please try again.".to_string()
            }
            Self::RateLimited(_) => {
                "The assistant is handling too many requests right now. Give it a moment."
                    .to_string()
            }
            Self::Upstream(_) => {
                "The assistant service is currently unavailable. Please try again later."
                    .to_string()
            }
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_is_terminal() {
        assert!(Error::Unsupported("no speech synthesis".into()).is_terminal());
        assert!(!Error::Permission("denied".into()).is_terminal());
        assert!(!Error::Connection("refused".into()).is_terminal());
    }

    #[test]
    fn spoken_messages_hide_internals() {
        let err = Error::Backend("row conflict on cart_items".into());
        assert!(!err.spoken_message().contains("cart_items"));

        let err = Error::NotAuthenticated("no session".into());
        assert!(err.spoken_message().to_lowercase().contains("log in"));
    }
}
