//! Voxcart - Voice command gateway for an accessible commerce storefront
//!
//! This library provides the core functionality of the voxcart gateway:
//! - Speech I/O (capture, playback, hosted STT/TTS)
//! - Intent resolution over an ordered pattern table
//! - Command execution against shared storefront operations
//! - A streaming voice-agent session with a tool-call bridge
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Dispatch surfaces                    │
//! │  Push-to-talk │ Assistant panel │ Streaming agent   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                CommerceActions                       │
//! │  one implementation of every storefront operation   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        Stores  │  Storefront backend (HTTP)         │
//! │  cart · wishlist · address · prefs · nav · auth     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod commerce;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod ptt;
pub mod session;
pub mod shortcuts;
pub mod speech;
pub mod store;

pub use app::App;
pub use commerce::{ActionOutcome, CommerceActions, HttpBackend, Product, StorefrontBackend};
pub use config::Config;
pub use dispatch::{Announcer, Feedback, LocalExecutor, StructuredExecutor, Toast};
pub use error::{Error, Result};
pub use intent::{Intent, IntentResolver, ParsedCommand};
pub use ptt::{CommandSink, PushToTalk, VoiceIo};
pub use session::{RealtimeSession, ToolDispatcher, ToolRegistry};
pub use shortcuts::{Chord, KeyEvent, ShortcutRegistry};
pub use speech::SpeechGateway;
pub use store::{NavState, Route};
