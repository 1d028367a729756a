//! Streaming voice session
//!
//! The second, independent voice pathway: a full-duplex connection to a
//! hosted realtime speech agent whose tool calls land on the same
//! [`crate::commerce::CommerceActions`] layer as the command executors.

mod audio;
mod events;
mod realtime;
mod tools;

pub use audio::{WIRE_SAMPLE_RATE, encode_pcm16_base64, resample};
pub use events::{ClientEvent, ConversationItem, ServerEvent, SessionConfig, ToolSchema};
pub use realtime::{EphemeralCredential, EventHandler, RealtimeSession, ToolDispatcher, mint_credential};
pub use tools::ToolRegistry;
