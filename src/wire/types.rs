//! Chat protocol envelope types
//!
//! The service multiplexes several envelope kinds over one WebSocket: a
//! connection acknowledgement, typing indicators, the eventual answer (or an
//! explicit decline) and free-form additions we may not know about yet.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One typed unit of protocol exchange over the channel
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Session acknowledgement, the first inbound envelope after connect
    Connected(ConnectedPayload),
    /// Outbound question (client to service)
    UserMessage(UserMessagePayload),
    /// Progress signal: the service is still working on an answer
    Typing,
    /// Terminal envelope carrying an answer
    BotResponse(BotResponsePayload),
    /// Terminal envelope: the service declines to answer
    Error(ErrorPayload),
    /// Envelope with a wire tag this build does not recognize
    ///
    /// Kept as data so forward-compatible service additions never abort
    /// a run. `body` holds the complete decoded object.
    Unknown { kind: String, body: Value },
}

impl Envelope {
    /// The envelope's wire tag
    pub fn kind(&self) -> &str {
        match self {
            Envelope::Connected(_) => "connection",
            Envelope::UserMessage(_) => "user_message",
            Envelope::Typing => "typing",
            Envelope::BotResponse(_) => "bot_response",
            Envelope::Error(_) => "error",
            Envelope::Unknown { kind, .. } => kind,
        }
    }

    /// Build the outbound question envelope for one scenario step
    pub fn user_message(content: &str, session_id: &str, user_id: &str) -> Self {
        Envelope::UserMessage(UserMessagePayload {
            content: content.to_string(),
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
        })
    }
}

/// Payload of the `connection` acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub session_id: String,
    /// Welcome message shown to the user on connect
    #[serde(default)]
    pub message: String,
}

/// Payload of an outbound `user_message`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessagePayload {
    pub content: String,
    pub session_id: String,
    pub user_id: String,
}

/// Payload of a terminal `bot_response`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotResponsePayload {
    pub content: String,
    /// Follow-up questions the service offers, in presentation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Classified intent attached to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub category: String,
    pub confidence: f64,
}

/// Answer provenance and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Server-side processing time in milliseconds
    pub processing_time: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<String>,
}

/// Payload of a terminal `error` decline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
