//! Configuration management for the voxcart gateway
//!
//! Configuration is read from `config.toml` in the platform config directory
//! and every field can be overridden with a `VOXCART_*` environment variable.
//! A missing file yields a usable default configuration.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

use crate::{Error, Result};

/// Default hold-chord for push-to-talk: hold Ctrl+V, release to submit
const DEFAULT_PTT_CHORD: &str = "ctrl+v";

/// Default chord that moves focus to the search box
const DEFAULT_SEARCH_CHORD: &str = "ctrl+k";

/// Default chord that toggles the shortcuts panel
const DEFAULT_PANEL_CHORD: &str = "ctrl+slash";

/// Voxcart gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Storefront backend base URL
    pub backend_url: String,

    /// Trusted endpoint minting ephemeral realtime credentials
    pub credential_url: String,

    /// ZIP/postal code lookup endpoint
    pub zip_lookup_url: String,

    /// Path to data directory (logs, caches)
    pub data_dir: PathBuf,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Streaming session configuration
    pub realtime: RealtimeConfig,

    /// Keyboard chords
    pub shortcuts: ShortcutConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Voice processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// STT provider: "whisper" or "deepgram"
    pub stt_provider: String,

    /// STT model (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS provider: "openai" or "elevenlabs"
    pub tts_provider: String,

    /// TTS model
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_provider: "whisper".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_provider: "openai".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Streaming voice session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Realtime model identifier sent in the session configuration
    pub model: String,

    /// Agent voice
    pub voice: String,

    /// Transcription model for user audio
    pub transcription_model: String,

    /// Server-side turn detection silence threshold, milliseconds
    pub turn_silence_ms: u32,

    /// Server-side turn detection activation threshold (0.0 to 1.0)
    pub turn_threshold: f32,

    /// Handshake timeout, seconds
    pub handshake_timeout_secs: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-realtime".to_string(),
            voice: "alloy".to_string(),
            transcription_model: "whisper-1".to_string(),
            turn_silence_ms: 500,
            turn_threshold: 0.5,
            handshake_timeout_secs: 10,
        }
    }
}

/// Keyboard chord configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Hold-chord for push-to-talk
    pub push_to_talk: String,

    /// Chord that focuses the search box
    pub focus_search: String,

    /// Chord that toggles the shortcuts panel
    pub shortcuts_panel: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            push_to_talk: DEFAULT_PTT_CHORD.to_string(),
            focus_search: DEFAULT_SEARCH_CHORD.to_string(),
            shortcuts_panel: DEFAULT_PANEL_CHORD.to_string(),
        }
    }
}

/// API keys for external services
///
/// `Debug` output is redacted by `SecretString`.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper STT and TTS)
    pub openai: Option<SecretString>,

    /// Deepgram API key (optional STT)
    pub deepgram: Option<SecretString>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<SecretString>,

    /// Storefront backend service key
    pub backend: Option<SecretString>,
}

/// On-disk shape of `config.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend_url: Option<String>,
    credential_url: Option<String>,
    zip_lookup_url: Option<String>,
    voice: VoiceConfig,
    realtime: RealtimeConfig,
    shortcuts: ShortcutConfig,
    keys: FileKeys,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileKeys {
    openai: Option<String>,
    deepgram: Option<String>,
    elevenlabs: Option<String>,
    backend: Option<String>,
}

impl Config {
    /// Load configuration from the default location with env overrides
    ///
    /// # Errors
    ///
    /// Returns error if the config file exists but cannot be parsed, or if
    /// no data directory can be determined.
    pub fn load() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("dev", "voxcart", "voxcart")
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;

        let path = dirs.config_dir().join("config.toml");
        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            FileConfig::default()
        };

        Self::from_file_config(file, dirs.data_dir().to_path_buf())
    }

    /// Build a config from parsed file contents plus env overrides
    fn from_file_config(file: FileConfig, data_dir: PathBuf) -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok();

        let backend_url = env("VOXCART_BACKEND_URL")
            .or(file.backend_url)
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        let credential_url = env("VOXCART_CREDENTIAL_URL")
            .or(file.credential_url)
            .unwrap_or_else(|| format!("{backend_url}/functions/realtime-token"));
        let zip_lookup_url = env("VOXCART_ZIP_LOOKUP_URL")
            .or(file.zip_lookup_url)
            .unwrap_or_else(|| "https://api.zippopotam.us/us".to_string());

        let secret = |env_name: &str, file_value: Option<String>| {
            env(env_name).or(file_value).map(SecretString::from)
        };

        let api_keys = ApiKeys {
            openai: secret("OPENAI_API_KEY", file.keys.openai),
            deepgram: secret("DEEPGRAM_API_KEY", file.keys.deepgram),
            elevenlabs: secret("ELEVENLABS_API_KEY", file.keys.elevenlabs),
            backend: secret("VOXCART_BACKEND_KEY", file.keys.backend),
        };

        Ok(Self {
            backend_url,
            credential_url,
            zip_lookup_url,
            data_dir,
            voice: file.voice,
            realtime: file.realtime,
            shortcuts: file.shortcuts,
            api_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_empty() {
        let config =
            Config::from_file_config(FileConfig::default(), PathBuf::from("/tmp/vx")).unwrap();
        assert_eq!(config.voice.stt_provider, "whisper");
        assert_eq!(config.shortcuts.push_to_talk, "ctrl+v");
        assert!((config.voice.tts_speed - 1.0).abs() < f32::EPSILON);
        // Credential endpoint is derived from the backend URL by default
        assert!(config.credential_url.starts_with(&config.backend_url));
    }

    #[test]
    fn file_values_parse() {
        let file: FileConfig = toml::from_str(
            r#"
            backend_url = "https://shop.example.com"

            [voice]
            stt_provider = "deepgram"
            stt_model = "nova-2"

            [realtime]
            turn_silence_ms = 700

            [shortcuts]
            push_to_talk = "meta+v"
            "#,
        )
        .unwrap();

        let config = Config::from_file_config(file, PathBuf::from("/tmp/vx")).unwrap();
        assert_eq!(config.voice.stt_provider, "deepgram");
        assert_eq!(config.realtime.turn_silence_ms, 700);
        assert_eq!(config.shortcuts.push_to_talk, "meta+v");
        // Unset fields keep their defaults
        assert_eq!(config.voice.tts_provider, "openai");
    }
}
