//! Speech I/O
//!
//! Audio capture and playback on the local device, hosted STT/TTS provider
//! clients, and the [`SpeechGateway`] facade the rest of the gateway talks
//! to. One utterance may be audible at a time and one capture may be open
//! at a time; the gateway enforces both.

mod capture;
mod gateway;
mod playback;
mod stt;
mod tts;

pub use capture::{AudioCapture, CaptureService, SAMPLE_RATE, rms_energy, samples_to_wav};
pub use gateway::SpeechGateway;
pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
