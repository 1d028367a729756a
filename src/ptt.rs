//! Push-to-talk state machine
//!
//! Tracks the hold-chord gesture: press opens the microphone, release
//! closes it and submits the transcript to the local executor. Two states,
//! idle and capturing. A start while capturing is a no-op, capture never
//! begins while focus is editable, and teardown force-stops an in-flight
//! capture so no microphone stream outlives its owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::Result;
use crate::commerce::ActionOutcome;
use crate::dispatch::{Feedback, LocalExecutor};
use crate::shortcuts::{Chord, KeyEvent};
use crate::speech::SpeechGateway;
use crate::store::VoiceUi;

/// Spoken cue when capture opens
const CUE_LISTENING: &str = "Listening.";

/// Spoken cue when capture closes with audio to process
const CUE_PROCESSING: &str = "Got it, processing.";

/// Spoken cue when capture closes empty
const CUE_NO_SPEECH: &str = "No speech detected. Hold the shortcut and try again.";

/// Two-phase capture control, implemented by the speech gateway
#[async_trait]
pub trait VoiceIo: Send + Sync {
    /// Open the microphone; resolves once actively listening
    async fn start_capture(&self) -> Result<()>;
    /// Close the microphone and return the transcript, empty if none
    async fn stop_capture(&self) -> Result<String>;
    /// Speak a short cue
    async fn speak(&self, text: &str) -> Result<()>;
}

#[async_trait]
impl VoiceIo for SpeechGateway {
    async fn start_capture(&self) -> Result<()> {
        self.start_push_to_talk().await
    }

    async fn stop_capture(&self) -> Result<String> {
        self.stop_push_to_talk().await
    }

    async fn speak(&self, text: &str) -> Result<()> {
        SpeechGateway::speak(self, text).await
    }
}

/// Where released transcripts go
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Execute the transcript and return the outcome
    async fn dispatch(&self, transcript: &str) -> ActionOutcome;
}

#[async_trait]
impl CommandSink for LocalExecutor {
    async fn dispatch(&self, transcript: &str) -> ActionOutcome {
        self.execute(transcript).await
    }
}

/// The hold-chord capture state machine
pub struct PushToTalk {
    chord: Chord,
    voice: Arc<dyn VoiceIo>,
    sink: Arc<dyn CommandSink>,
    feedback: Arc<Feedback>,
    voice_ui: Arc<VoiceUi>,
    capturing: AtomicBool,
}

impl PushToTalk {
    /// Wire the state machine to its collaborators
    #[must_use]
    pub fn new(
        chord: Chord,
        voice: Arc<dyn VoiceIo>,
        sink: Arc<dyn CommandSink>,
        feedback: Arc<Feedback>,
        voice_ui: Arc<VoiceUi>,
    ) -> Self {
        Self {
            chord,
            voice,
            sink,
            feedback,
            voice_ui,
            capturing: AtomicBool::new(false),
        }
    }

    /// Whether a capture is open
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// Handle a keydown. Returns true when the event belonged to the
    /// hold-chord (matched it, or arrived while capturing).
    pub async fn on_key_down(&self, event: &KeyEvent) -> bool {
        if !self.chord.matches(event) {
            return false;
        }
        if event.editable_target {
            // Never hijack typing; the chord may be a native edit shortcut
            return false;
        }
        if self.capturing.swap(true, Ordering::SeqCst) {
            // Key repeat while held; capture already open
            return true;
        }

        tracing::debug!("push-to-talk capture starting");
        self.voice_ui.set_listening(true);

        if let Err(e) = self.voice.start_capture().await {
            tracing::warn!(error = %e, "push-to-talk capture failed to start");
            self.capturing.store(false, Ordering::SeqCst);
            self.voice_ui.set_listening(false);
            self.feedback
                .report(&ActionOutcome::fail(e.spoken_message()))
                .await;
            return true;
        }

        if let Err(e) = self.voice.speak(CUE_LISTENING).await {
            tracing::debug!(error = %e, "listening cue failed");
        }
        true
    }

    /// Handle a keyup. Release of either the modifier or the letter key
    /// ends the capture, tolerating partial key-up ordering.
    pub async fn on_key_up(&self, key: &str) {
        if !self.chord.releases(key) {
            return;
        }
        if !self.capturing.swap(false, Ordering::SeqCst) {
            return;
        }

        self.voice_ui.set_listening(false);

        let transcript = match self.voice.stop_capture().await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!(error = %e, "push-to-talk capture failed to stop");
                self.feedback
                    .report(&ActionOutcome::fail(e.spoken_message()))
                    .await;
                return;
            }
        };

        if transcript.trim().is_empty() {
            tracing::debug!("push-to-talk released with no speech");
            if let Err(e) = self.voice.speak(CUE_NO_SPEECH).await {
                tracing::debug!(error = %e, "no-speech cue failed");
            }
            return;
        }

        tracing::info!(transcript = %transcript, "push-to-talk transcript");
        if let Err(e) = self.voice.speak(CUE_PROCESSING).await {
            tracing::debug!(error = %e, "processing cue failed");
        }

        let outcome = self.sink.dispatch(&transcript).await;
        self.feedback.report(&outcome).await;
    }

    /// Teardown: force an in-progress capture closed and discard any
    /// in-flight audio
    pub async fn shutdown(&self) {
        if self.capturing.swap(false, Ordering::SeqCst) {
            tracing::debug!("push-to-talk teardown with open capture");
            let _ = self.voice.stop_capture().await;
        }
        self.voice_ui.set_listening(false);
    }
}
