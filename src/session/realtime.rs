//! Streaming voice session
//!
//! Full-duplex connection to the hosted realtime speech agent: mint an
//! ephemeral credential from the trusted backend, open the control channel,
//! advertise the tool schema, stream encoded microphone frames, and bridge
//! tool-call events to the registry. Every inbound message is relayed
//! verbatim to the caller's handler before interception, and each tool
//! round trip is keyed by its own call id so overlapping calls stay
//! independent.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::config::RealtimeConfig;
use crate::{Error, Result};

use super::audio::{WIRE_SAMPLE_RATE, encode_pcm16_base64, resample};
use super::events::{
    ClientEvent, ContentPart, ConversationItem, InputTranscription, ServerEvent, SessionConfig,
    TurnDetection,
};
use super::tools::ToolRegistry;

/// Instructions sent with the session configuration
const AGENT_INSTRUCTIONS: &str = "You are a friendly shopping assistant for a voice-first \
    accessible storefront. Keep replies short and spoken-friendly. Use the provided tools for \
    every cart, wishlist, order, navigation, and preference change instead of guessing.";

/// Caller-supplied handler receiving every control-channel message verbatim
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Ephemeral credential minted by the trusted backend endpoint
#[derive(Debug, serde::Deserialize)]
pub struct EphemeralCredential {
    /// Short-lived bearer token
    pub token: String,
    /// Agent endpoint to connect to with the token
    pub session_url: String,
}

/// Mint a short-lived credential for a direct client-to-provider connection
///
/// # Errors
///
/// Returns [`Error::RateLimited`] / [`Error::Upstream`] per the provider's
/// signal, [`Error::Connection`] for anything else including timeout.
pub async fn mint_credential(
    client: &reqwest::Client,
    credential_url: &str,
    timeout: Duration,
) -> Result<EphemeralCredential> {
    let response = tokio::time::timeout(timeout, client.post(credential_url).send())
        .await
        .map_err(|_| Error::Connection("credential request timed out".to_string()))?
        .map_err(|e| Error::Connection(format!("credential request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "credential endpoint error");
        return Err(match status.as_u16() {
            429 => Error::RateLimited(format!("credential endpoint: {status}")),
            500..=599 => Error::Upstream(format!("credential endpoint: {status}")),
            _ => Error::Connection(format!("credential endpoint: {status}")),
        });
    }

    response
        .json()
        .await
        .map_err(|e| Error::Connection(format!("credential response malformed: {e}")))
}

/// Bridges inbound control-channel messages to the tool registry
pub struct ToolDispatcher {
    tools: Arc<ToolRegistry>,
    outbound: mpsc::UnboundedSender<String>,
}

impl ToolDispatcher {
    /// Create a dispatcher writing results to `outbound`
    #[must_use]
    pub const fn new(tools: Arc<ToolRegistry>, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { tools, outbound }
    }

    /// Process one raw inbound message: relay it verbatim, then intercept
    /// completed tool invocations. Malformed JSON is logged and dropped.
    pub async fn handle_raw(&self, raw: &str, handler: &EventHandler) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable control-channel message");
                return;
            }
        };

        handler(value.clone());

        match ServerEvent::from_value(&value) {
            ServerEvent::FunctionCallDone {
                call_id,
                name,
                arguments,
            } => {
                self.handle_tool_call(&call_id, &name, &arguments).await;
            }
            ServerEvent::ErrorEvent { message } => {
                tracing::error!(message = %message, "agent reported an error");
            }
            ServerEvent::InputTranscriptCompleted { transcript } => {
                tracing::debug!(transcript = %transcript, "user turn transcribed");
            }
            event => {
                tracing::trace!(?event, "control-channel event");
            }
        }
    }

    /// Run one tool round trip. The round trip completes even when the
    /// implementation rejects; an unregistered name is logged and produces
    /// no reply at all.
    pub async fn handle_tool_call(&self, call_id: &str, name: &str, arguments: &str) {
        if !self.tools.names().contains(&name) {
            tracing::warn!(tool = name, call_id, "agent requested unregistered tool");
            return;
        }

        let args: Value = match serde_json::from_str(arguments) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(other) => {
                tracing::warn!(tool = name, ?other, "non-object tool arguments");
                Value::Object(serde_json::Map::new())
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "malformed tool arguments");
                self.send_output(
                    call_id,
                    &serde_json::json!({
                        "success": false,
                        "message": "The arguments for that tool call could not be read.",
                    }),
                );
                return;
            }
        };

        tracing::info!(tool = name, call_id, "dispatching tool call");
        let output = match self.tools.invoke(name, &args).await {
            Ok(outcome) => {
                let mut payload = serde_json::Map::new();
                payload.insert("success".to_string(), Value::Bool(outcome.success));
                payload.insert("message".to_string(), Value::String(outcome.message));
                if let Value::Object(data) = outcome.data {
                    for (key, value) in data {
                        payload.entry(key).or_insert(value);
                    }
                }
                Value::Object(payload)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool implementation rejected");
                serde_json::json!({
                    "success": false,
                    "message": e.spoken_message(),
                })
            }
        };

        self.send_output(call_id, &output);
    }

    /// Send the function output followed by a request for the agent to
    /// continue the turn
    fn send_output(&self, call_id: &str, output: &Value) {
        let item = ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: call_id.to_string(),
                output: output.to_string(),
            },
        };
        let follow_up = ClientEvent::ResponseCreate {};

        for event in [item, follow_up] {
            match event.to_wire() {
                Ok(wire) => {
                    if self.outbound.send(wire).is_err() {
                        tracing::warn!(call_id, "control channel closed before tool reply");
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize tool reply");
                    return;
                }
            }
        }
    }
}

struct ActiveSession {
    id: uuid::Uuid,
    outbound: mpsc::UnboundedSender<String>,
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
}

/// One client's streaming connection to the hosted agent.
/// At most one session is active at a time; a second `connect` fails until
/// `disconnect` runs.
pub struct RealtimeSession {
    http: reqwest::Client,
    credential_url: String,
    config: RealtimeConfig,
    tools: Arc<ToolRegistry>,
    active: tokio::sync::Mutex<Option<ActiveSession>>,
}

impl RealtimeSession {
    /// Create a disconnected session
    #[must_use]
    pub fn new(credential_url: String, config: RealtimeConfig, tools: Arc<ToolRegistry>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credential_url,
            config,
            tools,
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Establish the session: credential, handshake, configuration.
    /// On any failure nothing is left half-open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when a session is already active or
    /// any handshake step fails; rate-limit and outage signals pass
    /// through as their own variants.
    pub async fn connect(&self, handler: EventHandler) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(Error::Connection(
                "a voice session is already active".to_string(),
            ));
        }

        let timeout = Duration::from_secs(self.config.handshake_timeout_secs);
        let credential = mint_credential(&self.http, &self.credential_url, timeout).await?;

        let mut request = credential
            .session_url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::Connection(format!("bad session url: {e}")))?;
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {}", credential.token)
                .parse()
                .map_err(|_| Error::Connection("token not header-safe".to_string()))?,
        );

        let (stream, _response) =
            tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| Error::Connection("agent handshake timed out".to_string()))?
                .map_err(|e| Error::Connection(format!("agent handshake failed: {e}")))?;

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        // Session configuration goes out first on the fresh channel
        let session_update = ClientEvent::SessionUpdate {
            session: SessionConfig {
                modalities: vec!["audio", "text"],
                voice: self.config.voice.clone(),
                instructions: AGENT_INSTRUCTIONS.to_string(),
                input_audio_transcription: InputTranscription {
                    model: self.config.transcription_model.clone(),
                },
                turn_detection: TurnDetection {
                    kind: "server_vad",
                    threshold: self.config.turn_threshold,
                    silence_duration_ms: self.config.turn_silence_ms,
                },
                tools: self.tools.schemas(),
            },
        };
        outbound_tx
            .send(session_update.to_wire()?)
            .map_err(|_| Error::Connection("control channel closed".to_string()))?;

        let writer = tokio::spawn(async move {
            while let Some(wire) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(wire.into())).await {
                    tracing::warn!(error = %e, "control channel write failed");
                    break;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
            tracing::debug!("control channel writer stopped");
        });

        let dispatcher = Arc::new(ToolDispatcher::new(
            Arc::clone(&self.tools),
            outbound_tx.clone(),
        ));
        let reader = tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        // Each tool round trip runs independently so a slow
                        // tool never blocks the next inbound message
                        let dispatcher = Arc::clone(&dispatcher);
                        let handler = Arc::clone(&handler);
                        let text = text.to_string();
                        tokio::spawn(async move {
                            dispatcher.handle_raw(&text, &handler).await;
                        });
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("agent closed the control channel");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "control channel read failed");
                        break;
                    }
                }
            }
        });

        let session_id = uuid::Uuid::new_v4();
        *active = Some(ActiveSession {
            id: session_id,
            outbound: outbound_tx,
            reader,
            writer,
        });
        tracing::info!(session = %session_id, "voice session established");
        Ok(())
    }

    /// Whether a session is currently active
    pub async fn is_connected(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Inject a synthetic user turn
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the control channel is not open.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let active = self.active.lock().await;
        let session = active
            .as_ref()
            .ok_or_else(|| Error::Connection("control channel not open".to_string()))?;

        let item = ClientEvent::ConversationItemCreate {
            item: ConversationItem::Message {
                role: "user",
                content: vec![ContentPart {
                    kind: "input_text",
                    text: text.to_string(),
                }],
            },
        };
        for event in [item, ClientEvent::ResponseCreate {}] {
            session
                .outbound
                .send(event.to_wire()?)
                .map_err(|_| Error::Connection("control channel closed".to_string()))?;
        }
        Ok(())
    }

    /// Stream one chunk of microphone audio to the agent
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the control channel is not open,
    /// [`Error::Audio`] when resampling fails.
    pub async fn send_audio(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        let active = self.active.lock().await;
        let session = active
            .as_ref()
            .ok_or_else(|| Error::Connection("control channel not open".to_string()))?;

        let wire_samples = resample(samples, sample_rate, WIRE_SAMPLE_RATE)?;
        if wire_samples.is_empty() {
            return Ok(());
        }
        let event = ClientEvent::InputAudioBufferAppend {
            audio: encode_pcm16_base64(&wire_samples),
        };
        session
            .outbound
            .send(event.to_wire()?)
            .map_err(|_| Error::Connection("control channel closed".to_string()))?;
        Ok(())
    }

    /// Tear down the connection; safe to call multiple times
    pub async fn disconnect(&self) {
        let Some(session) = self.active.lock().await.take() else {
            return;
        };
        drop(session.outbound);
        session.reader.abort();
        session.writer.abort();
        tracing::info!(session = %session.id, "voice session closed");
    }
}
