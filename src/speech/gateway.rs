//! Speech I/O gateway
//!
//! Facade over capture, playback, and the hosted STT/TTS providers. The
//! gateway owns the single-utterance and single-capture invariants: a new
//! `speak` cancels the one in flight, a new `listen_once` preempts the
//! prior session, and push-to-talk capture is exclusive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::config::Config;
use crate::dispatch::Announcer;
use crate::{Error, Result};

use super::capture::{CaptureService, SAMPLE_RATE, rms_energy, samples_to_wav};
use super::playback::AudioPlayback;
use super::stt::SpeechToText;
use super::tts::TextToSpeech;

/// Energy above which a poll chunk counts as speech
const ENERGY_THRESHOLD: f32 = 0.015;

/// Poll interval while listening
const POLL_MS: u64 = 100;

/// Trailing silence that ends an utterance
const SILENCE_MS: u64 = 800;

/// How long to wait for speech to start before giving up
const INITIAL_WAIT_MS: u64 = 4000;

/// Hard cap on a single utterance
const MAX_UTTERANCE_MS: u64 = 10_000;

/// Minimum speech length worth transcribing (samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = (SAMPLE_RATE as usize) * 3 / 10;

/// Two-way voice I/O for one client
pub struct SpeechGateway {
    tts: TextToSpeech,
    stt: SpeechToText,
    playback: AudioPlayback,
    capture: CaptureService,
    /// Cancel flag of the utterance currently audible
    utterance_cancel: std::sync::Mutex<Arc<AtomicBool>>,
    /// Bumped by each `listen_once`; a stale generation stops its loop
    listen_generation: AtomicU64,
    ptt_active: AtomicBool,
}

impl SpeechGateway {
    /// Construct the gateway, probing audio devices and provider config
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when the platform has no usable audio
    /// devices, [`Error::Config`] when a selected provider has no key.
    pub fn new(config: &Config) -> Result<Self> {
        let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;
        let stt = SpeechToText::from_config(&config.voice, &config.api_keys)?;
        let playback = AudioPlayback::new()?;
        let capture = CaptureService::spawn()?;

        Ok(Self {
            tts,
            stt,
            playback,
            capture,
            utterance_cancel: std::sync::Mutex::new(Arc::new(AtomicBool::new(false))),
            listen_generation: AtomicU64::new(0),
            ptt_active: AtomicBool::new(false),
        })
    }

    /// Install a fresh cancel flag, raising the previous one
    fn preempt_utterance(&self) -> Arc<AtomicBool> {
        let fresh = Arc::new(AtomicBool::new(false));
        let mut current = self.utterance_cancel.lock().unwrap();
        current.store(true, Ordering::Relaxed);
        *current = Arc::clone(&fresh);
        fresh
    }

    /// Synthesize and play `text`, cancelling any utterance in progress.
    /// Resolves when playback ends (or when a later call preempts it).
    ///
    /// # Errors
    ///
    /// Returns error when synthesis or playback fails.
    pub async fn speak(&self, text: &str) -> Result<()> {
        let cancel = self.preempt_utterance();

        let audio = self.tts.synthesize(text).await?;

        // A later speak may have preempted us during synthesis
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("utterance preempted before playback");
            return Ok(());
        }

        self.playback.play_mp3(&audio, cancel).await
    }

    /// Cancel any in-progress or queued utterance; idempotent
    pub fn stop(&self) {
        self.utterance_cancel
            .lock()
            .unwrap()
            .store(true, Ordering::Relaxed);
    }

    /// Capture a single utterance and transcribe it.
    ///
    /// Resolves with the transcript, or an empty string when no speech was
    /// detected before the timeout. A concurrent call preempts this one:
    /// the earlier call resolves with an empty string rather than two
    /// recognition sessions running at once.
    ///
    /// # Errors
    ///
    /// Returns error when capture cannot start or transcription fails.
    pub async fn listen_once(&self) -> Result<String> {
        if self.ptt_active.load(Ordering::Relaxed) {
            return Err(Error::Audio(
                "push-to-talk capture in progress".to_string(),
            ));
        }

        let my_gen = self.listen_generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.capture.clear_buffer();
        self.capture.start().await?;

        let mut collected: Vec<f32> = Vec::new();
        let mut speech_seen = false;
        let mut silence_ms: u64 = 0;
        let mut elapsed_ms: u64 = 0;

        loop {
            tokio::time::sleep(std::time::Duration::from_millis(POLL_MS)).await;
            elapsed_ms += POLL_MS;

            if self.listen_generation.load(Ordering::SeqCst) != my_gen {
                // Replaced by a newer session; it owns the capture now
                tracing::debug!("listen session preempted");
                return Ok(String::new());
            }

            let chunk = self.capture.take_buffer();

            let is_speech = rms_energy(&chunk) > ENERGY_THRESHOLD;
            if speech_seen {
                collected.extend_from_slice(&chunk);
                if is_speech {
                    silence_ms = 0;
                } else {
                    silence_ms += POLL_MS;
                }
                if silence_ms >= SILENCE_MS || elapsed_ms >= MAX_UTTERANCE_MS {
                    break;
                }
            } else if is_speech {
                speech_seen = true;
                collected.extend_from_slice(&chunk);
            } else if elapsed_ms >= INITIAL_WAIT_MS {
                // Recognizer ended without a result
                self.stop_capture_if_current(my_gen).await;
                return Ok(String::new());
            }
        }

        self.stop_capture_if_current(my_gen).await;

        if collected.len() < MIN_SPEECH_SAMPLES {
            return Ok(String::new());
        }

        let wav = samples_to_wav(&collected, SAMPLE_RATE)?;
        self.stt.transcribe(&wav).await
    }

    async fn stop_capture_if_current(&self, my_gen: u64) {
        if self.listen_generation.load(Ordering::SeqCst) == my_gen {
            self.capture.stop().await;
        }
    }

    /// Open the microphone for an explicit hold-to-talk capture. Resolves
    /// once the stream is actively listening.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] when a capture is already open, or the
    /// device errors from [`CaptureService::start`].
    pub async fn start_push_to_talk(&self) -> Result<()> {
        if self.ptt_active.swap(true, Ordering::SeqCst) {
            return Err(Error::Audio("push-to-talk already capturing".to_string()));
        }

        self.capture.clear_buffer();
        if let Err(e) = self.capture.start().await {
            self.ptt_active.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(())
    }

    /// Close the hold-to-talk capture and transcribe whatever accumulated.
    /// Resolves with an empty string when nothing useful was captured,
    /// including when no capture was open.
    ///
    /// # Errors
    ///
    /// Returns error when transcription fails.
    pub async fn stop_push_to_talk(&self) -> Result<String> {
        if !self.ptt_active.swap(false, Ordering::SeqCst) {
            return Ok(String::new());
        }

        self.capture.stop().await;
        let samples = self.capture.take_buffer();

        if samples.len() < MIN_SPEECH_SAMPLES || rms_energy(&samples) < ENERGY_THRESHOLD {
            tracing::debug!(samples = samples.len(), "no usable speech captured");
            return Ok(String::new());
        }

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        self.stt.transcribe(&wav).await
    }

    /// Teardown: cancel speech and force any open capture closed.
    /// Leaking an open microphone stream across navigation is a
    /// correctness bug, so page teardown must call this.
    pub async fn shutdown(&self) {
        self.stop();
        self.ptt_active.store(false, Ordering::SeqCst);
        self.capture.stop().await;
    }
}

#[async_trait]
impl Announcer for SpeechGateway {
    async fn announce(&self, text: &str) -> Result<()> {
        self.speak(text).await
    }
}
