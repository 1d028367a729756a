//! Text-to-speech provider clients

use secrecy::ExposeSecret;

use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    OpenAi,
    ElevenLabs,
}

/// Synthesizes speech from text through the configured hosted provider
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: secrecy::SecretString,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Build the provider client selected by the voice config
    ///
    /// # Errors
    ///
    /// Returns error when the provider name is unknown or its API key is
    /// missing.
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys) -> Result<Self> {
        let (provider, api_key) = match voice.tts_provider.as_str() {
            "openai" => (
                TtsProvider::OpenAi,
                keys.openai.clone().ok_or_else(|| {
                    Error::Config("OpenAI API key required for TTS".to_string())
                })?,
            ),
            "elevenlabs" => (
                TtsProvider::ElevenLabs,
                keys.elevenlabs.clone().ok_or_else(|| {
                    Error::Config("ElevenLabs API key required for TTS".to_string())
                })?,
            ),
            other => {
                return Err(Error::Config(format!("unknown TTS provider: {other}")));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice: voice.tts_voice.clone(),
            speed: voice.tts_speed,
            model: voice.tts_model.clone(),
            provider,
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::RateLimited`] / [`Error::Upstream`] when the
    /// provider throttles or fails, [`Error::Tts`] otherwise.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::OpenAi => self.synthesize_openai(text).await,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await,
        }
    }

    /// Map a provider error status to the taxonomy
    fn provider_error(status: reqwest::StatusCode, body: &str) -> Error {
        match status.as_u16() {
            429 => Error::RateLimited(format!("TTS provider: {status}")),
            500..=599 => Error::Upstream(format!("TTS provider: {status}")),
            _ => Error::Tts(format!("TTS provider error {status}: {body}")),
        }
    }

    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::provider_error(status, &body));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("https://api.elevenlabs.io/v1/text-to-speech/{}", self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::provider_error(status, &body));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
