//! Application wiring
//!
//! Builds the store/action/executor graph from configuration and drives the
//! two interactive front ends: the console loop (typed transcripts through
//! the same dispatch path speech would take) and the streaming conversation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commerce::{ActionOutcome, CommerceActions, HttpBackend, StorefrontBackend};
use crate::config::Config;
use crate::dispatch::{Announcer, Feedback, LocalExecutor, StructuredExecutor, Toast};
use crate::intent::IntentResolver;
use crate::ptt::PushToTalk;
use crate::session::{RealtimeSession, ToolRegistry};
use crate::shortcuts::{Chord, ShortcutRegistry};
use crate::speech::{AudioCapture, SAMPLE_RATE, SpeechGateway};
use crate::store::{
    AuthState, CartView, CheckoutAddress, NavState, Preferences, VoiceUi, WishlistView,
};
use crate::{Error, Result};

/// Handlers behind the standard application chords. The push-to-talk
/// hold-chord is not in this registry; it has its own press/release
/// lifecycle in [`PushToTalk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppShortcut {
    /// Move focus to the search box
    FocusSearch,
    /// Toggle the shortcuts panel
    ShortcutsPanel,
}

/// Console fallback announcer: prints instead of speaking
struct PrintAnnouncer;

#[async_trait]
impl Announcer for PrintAnnouncer {
    async fn announce(&self, text: &str) -> Result<()> {
        println!("[voice] {text}");
        Ok(())
    }
}

/// The assembled gateway application
pub struct App {
    /// Loaded configuration
    pub config: Config,
    /// Shared action layer
    pub actions: Arc<CommerceActions>,
    /// Transcript resolver
    pub resolver: IntentResolver,
    /// Structured executor
    pub structured: StructuredExecutor,
    /// Dense local executor
    pub local: Arc<LocalExecutor>,
    /// Speech gateway; `None` when voice is disabled or unsupported
    pub speech: Option<Arc<SpeechGateway>>,
    /// Push-to-talk state machine; present when speech is
    pub push_to_talk: Option<PushToTalk>,
    /// Streaming agent session
    pub session: RealtimeSession,
    /// Dispatch feedback sink
    pub feedback: Arc<Feedback>,
    /// Visual toast stream
    pub toasts: tokio::sync::mpsc::UnboundedReceiver<Toast>,
    /// Voice UI indicators
    pub voice_ui: Arc<VoiceUi>,
    /// Standard application chords (distinct from the hold-chord)
    pub shortcuts: ShortcutRegistry<AppShortcut>,
}

impl App {
    /// Wire the full component graph
    ///
    /// # Errors
    ///
    /// Returns error when the backend client cannot be built. A missing or
    /// unsupported audio stack disables voice instead of failing; only
    /// voice explicitly enabled with a broken provider config is an error.
    pub fn new(config: Config, disable_voice: bool) -> Result<Self> {
        let backend: Arc<dyn StorefrontBackend> = Arc::new(HttpBackend::new(
            config.backend_url.clone(),
            config.zip_lookup_url.clone(),
            config.api_keys.backend.clone(),
        )?);

        let auth = Arc::new(AuthState::new());
        let nav = Arc::new(NavState::new());
        let cart = Arc::new(CartView::new());
        let wishlist = Arc::new(WishlistView::new());
        let address = Arc::new(CheckoutAddress::new());
        let prefs = Arc::new(Preferences::new());
        let voice_ui = Arc::new(VoiceUi::new());

        let actions = Arc::new(CommerceActions::new(
            backend,
            auth,
            nav,
            cart,
            wishlist,
            address,
            prefs,
            Arc::clone(&voice_ui),
        ));

        let speech = if disable_voice || !config.voice.enabled {
            None
        } else {
            match SpeechGateway::new(&config) {
                Ok(gateway) => Some(Arc::new(gateway)),
                Err(e) if e.is_terminal() => {
                    // No speech stack on this platform: voice affordances
                    // are disabled rather than failing repeatedly
                    tracing::warn!(error = %e, "voice disabled: platform unsupported");
                    None
                }
                Err(e) => return Err(e),
            }
        };

        let (toast_tx, toasts) = tokio::sync::mpsc::unbounded_channel();
        let announcer: Arc<dyn Announcer> = speech.as_ref().map_or_else(
            || Arc::new(PrintAnnouncer) as Arc<dyn Announcer>,
            |gateway| Arc::clone(gateway) as Arc<dyn Announcer>,
        );
        let feedback = Arc::new(Feedback::new(announcer, toast_tx));

        let local = Arc::new(LocalExecutor::new(Arc::clone(&actions)));
        let structured = StructuredExecutor::new(Arc::clone(&actions));
        let resolver = IntentResolver::new();

        let push_to_talk = match &speech {
            Some(gateway) => Some(PushToTalk::new(
                Chord::parse(&config.shortcuts.push_to_talk)?,
                Arc::clone(gateway) as Arc<dyn crate::ptt::VoiceIo>,
                Arc::clone(&local) as Arc<dyn crate::ptt::CommandSink>,
                Arc::clone(&feedback),
                Arc::clone(&voice_ui),
            )),
            None => None,
        };

        let tools = Arc::new(ToolRegistry::new(Arc::clone(&actions)));
        let session = RealtimeSession::new(
            config.credential_url.clone(),
            config.realtime.clone(),
            tools,
        );

        let mut shortcuts = ShortcutRegistry::new();
        shortcuts.register(&config.shortcuts.focus_search, AppShortcut::FocusSearch)?;
        shortcuts.register(&config.shortcuts.shortcuts_panel, AppShortcut::ShortcutsPanel)?;

        Ok(Self {
            config,
            actions,
            resolver,
            structured,
            local,
            speech,
            push_to_talk,
            session,
            feedback,
            toasts,
            voice_ui,
            shortcuts,
        })
    }

    /// Dispatch one transcript the way the assistant panel does: the
    /// pattern table first, the dense local ruleset as fallback
    pub async fn dispatch(&self, transcript: &str) -> ActionOutcome {
        let outcome = match self.resolver.parse(transcript) {
            Some(command) => self.structured.execute(&command).await,
            None => self.local.execute(transcript).await,
        };
        self.feedback.report(&outcome).await;
        outcome
    }

    /// Interactive console: each stdin line is dispatched as a transcript
    /// and the resulting toast prints inline
    ///
    /// # Errors
    ///
    /// Returns error when stdin cannot be read.
    pub async fn run_console(&mut self) -> Result<()> {
        println!("voxcart console: type commands as you would speak them (ctrl-d to quit)");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            self.dispatch(&line).await;
            while let Ok(toast) = self.toasts.try_recv() {
                let tag = if toast.success { "ok" } else { "!!" };
                println!("[{tag}] {}", toast.message);
            }
        }

        if let Some(ptt) = &self.push_to_talk {
            ptt.shutdown().await;
        }
        if let Some(speech) = &self.speech {
            speech.shutdown().await;
        }
        self.session.disconnect().await;
        Ok(())
    }

    /// Run a streaming conversation until interrupted: microphone frames go
    /// up, agent events print as they arrive, tool calls run against the
    /// same stores as every other surface
    ///
    /// # Errors
    ///
    /// Returns error when the session cannot be established or the
    /// microphone cannot be opened.
    #[allow(clippy::future_not_send)]
    pub async fn run_conversation(&self) -> Result<()> {
        let handler: crate::session::EventHandler = Arc::new(|value| {
            if let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) {
                match kind {
                    "conversation.item.input_audio_transcription.completed" => {
                        if let Some(t) = value.get("transcript").and_then(serde_json::Value::as_str)
                        {
                            println!("you: {}", t.trim());
                        }
                    }
                    "response.audio_transcript.done" => {
                        if let Some(t) = value.get("transcript").and_then(serde_json::Value::as_str)
                        {
                            println!("agent: {}", t.trim());
                        }
                    }
                    _ => {}
                }
            }
        });

        self.session.connect(handler).await?;
        println!("conversation started; speak, ctrl-c to hang up");

        let mut capture = AudioCapture::new()?;
        capture.start()?;

        let result = self.pump_microphone(&capture).await;

        capture.stop();
        self.session.disconnect().await;
        println!("conversation ended");
        result
    }

    /// Forward microphone audio to the session until ctrl-c
    #[allow(clippy::future_not_send)]
    async fn pump_microphone(&self, capture: &AudioCapture) -> Result<()> {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    return Ok(());
                }
                () = tokio::time::sleep(std::time::Duration::from_millis(100)) => {
                    let chunk = capture.take_buffer();
                    if chunk.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.session.send_audio(&chunk, SAMPLE_RATE).await {
                        // Mid-session failure tears the session down; the
                        // caller invites the user to retry
                        return Err(Error::Connection(format!(
                            "audio stream failed: {e}"
                        )));
                    }
                }
            }
        }
    }
}
