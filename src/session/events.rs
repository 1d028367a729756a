//! Control-channel message shapes for the streaming voice session
//!
//! Client events serialize with a `type` tag matching the hosted agent's
//! protocol. Server events are parsed from raw JSON: known types become
//! typed variants, everything else is preserved as [`ServerEvent::Other`]
//! so the relay stays lossless.

use serde::Serialize;
use serde_json::Value;

/// Tool schema advertised in the session configuration
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    /// Always `"function"`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Stable tool name, must match a registry implementation
    pub name: &'static str,
    /// Natural-language description for the agent
    pub description: &'static str,
    /// JSON-schema parameters object
    pub parameters: Value,
}

/// Server-side turn detection settings
#[derive(Debug, Clone, Serialize)]
pub struct TurnDetection {
    /// Always `"server_vad"`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Activation threshold, 0.0 to 1.0
    pub threshold: f32,
    /// Silence that ends a user turn, milliseconds
    pub silence_duration_ms: u32,
}

/// Transcription settings for inbound user audio
#[derive(Debug, Clone, Serialize)]
pub struct InputTranscription {
    /// Transcription model identifier
    pub model: String,
}

/// The session configuration sent once the control channel opens
#[derive(Debug, Clone, Serialize)]
pub struct SessionConfig {
    /// Output modalities
    pub modalities: Vec<&'static str>,
    /// Agent voice
    pub voice: String,
    /// System instructions
    pub instructions: String,
    /// Inbound transcription settings
    pub input_audio_transcription: InputTranscription,
    /// Turn detection settings
    pub turn_detection: TurnDetection,
    /// Full tool schema for every supported operation
    pub tools: Vec<ToolSchema>,
}

/// One content part of a conversation item
#[derive(Debug, Clone, Serialize)]
pub struct ContentPart {
    /// Content type, e.g. `"input_text"`
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Text payload
    pub text: String,
}

/// A conversation item injected by the client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ConversationItem {
    /// A synthetic user turn
    #[serde(rename = "message")]
    Message {
        /// Always `"user"` from this client
        role: &'static str,
        /// Message content parts
        content: Vec<ContentPart>,
    },
    /// Result of a completed tool invocation
    #[serde(rename = "function_call_output")]
    FunctionCallOutput {
        /// Call id being answered
        call_id: String,
        /// JSON-serialized result
        output: String,
    },
}

/// Messages the client sends on the control channel
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Configure the session: voice, transcription, turn detection, tools
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// The configuration payload
        session: SessionConfig,
    },
    /// Append base64 PCM16 microphone audio
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded PCM16 frames
        audio: String,
    },
    /// Inject a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// The item
        item: ConversationItem,
    },
    /// Ask the agent to produce a response
    #[serde(rename = "response.create")]
    ResponseCreate {},
}

impl ClientEvent {
    /// Serialize for the wire
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_wire(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Typed view of an inbound control-channel message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Session established
    SessionCreated,
    /// User started speaking (server VAD)
    SpeechStarted,
    /// User stopped speaking
    SpeechStopped,
    /// Transcription of a completed user turn
    InputTranscriptCompleted {
        /// The transcript
        transcript: String,
    },
    /// A completed tool invocation request
    FunctionCallDone {
        /// Call id, echoed back with the output
        call_id: String,
        /// Requested tool name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
    },
    /// Agent-side error
    ErrorEvent {
        /// Error description
        message: String,
    },
    /// Anything this client does not interpret
    Other {
        /// The message's `type` tag
        event_type: String,
    },
}

impl ServerEvent {
    /// Classify a raw control-channel message
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let event_type = value.get("type").and_then(Value::as_str).unwrap_or("");
        match event_type {
            "session.created" => Self::SessionCreated,
            "input_audio_buffer.speech_started" => Self::SpeechStarted,
            "input_audio_buffer.speech_stopped" => Self::SpeechStopped,
            "conversation.item.input_audio_transcription.completed" => {
                Self::InputTranscriptCompleted {
                    transcript: value
                        .get("transcript")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                }
            }
            "response.function_call_arguments.done" => Self::FunctionCallDone {
                call_id: value
                    .get("call_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                name: value
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                arguments: value
                    .get("arguments")
                    .and_then(Value::as_str)
                    .unwrap_or("{}")
                    .to_string(),
            },
            "error" => Self::ErrorEvent {
                message: value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            },
            other => Self::Other {
                event_type: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_carry_type_tags() {
        let wire = ClientEvent::InputAudioBufferAppend {
            audio: "AAAA".to_string(),
        }
        .to_wire()
        .unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "input_audio_buffer.append");
        assert_eq!(value["audio"], "AAAA");
    }

    #[test]
    fn function_output_item_shape() {
        let wire = ClientEvent::ConversationItemCreate {
            item: ConversationItem::FunctionCallOutput {
                call_id: "call_1".to_string(),
                output: r#"{"success":true}"#.to_string(),
            },
        }
        .to_wire()
        .unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["item"]["type"], "function_call_output");
        assert_eq!(value["item"]["call_id"], "call_1");
    }

    #[test]
    fn parses_function_call_done() {
        let event = ServerEvent::from_value(&json!({
            "type": "response.function_call_arguments.done",
            "call_id": "call_7",
            "name": "add_to_cart",
            "arguments": "{\"quantity\":2}",
        }));
        assert_eq!(
            event,
            ServerEvent::FunctionCallDone {
                call_id: "call_7".to_string(),
                name: "add_to_cart".to_string(),
                arguments: "{\"quantity\":2}".to_string(),
            }
        );
    }

    #[test]
    fn unknown_types_become_other() {
        let event = ServerEvent::from_value(&json!({"type": "rate_limits.updated"}));
        assert_eq!(
            event,
            ServerEvent::Other {
                event_type: "rate_limits.updated".to_string()
            }
        );
    }
}
