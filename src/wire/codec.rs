//! Wire codec for the chat protocol
//!
//! Envelopes travel as JSON text frames with a `type` field selecting the
//! variant. Decoding buckets unrecognized `type` values into
//! [`Envelope::Unknown`] instead of failing, so additions on the service
//! side never abort a run; only byte-level garbage and known kinds with
//! broken payloads are errors.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::common::{Error, Result};

use super::types::*;

/// Encode an envelope to its wire representation
pub fn encode(envelope: &Envelope) -> Result<String> {
    let value = match envelope {
        Envelope::Connected(payload) => tagged("connection", payload)?,
        Envelope::UserMessage(payload) => tagged("user_message", payload)?,
        Envelope::Typing => json!({ "type": "typing" }),
        Envelope::BotResponse(payload) => tagged("bot_response", payload)?,
        Envelope::Error(payload) => tagged("error", payload)?,
        // Unknown envelopes keep their original object, tag included
        Envelope::Unknown { body, .. } => body.clone(),
    };
    Ok(serde_json::to_string(&value)?)
}

/// Serialize a payload struct and slot the wire tag in beside its fields
fn tagged<T: serde::Serialize>(kind: &str, payload: &T) -> Result<Value> {
    let mut value = serde_json::to_value(payload)?;
    match value.as_object_mut() {
        Some(fields) => {
            fields.insert("type".to_string(), Value::String(kind.to_string()));
            Ok(value)
        }
        None => Err(Error::MalformedEnvelope(format!(
            "payload for '{kind}' did not serialize to an object"
        ))),
    }
}

/// Decode one wire frame into an envelope
pub fn decode(text: &str) -> Result<Envelope> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::MalformedEnvelope(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(Error::MalformedEnvelope(
            "envelope is not a JSON object".to_string(),
        ));
    }

    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        Some(other) => {
            return Err(Error::UnknownKind(format!(
                "'type' is not a string: {other}"
            )))
        }
        None => return Err(Error::UnknownKind("missing 'type' field".to_string())),
    };

    match kind.as_str() {
        "connection" => payload::<ConnectedPayload>(&kind, value).map(Envelope::Connected),
        "user_message" => payload::<UserMessagePayload>(&kind, value).map(Envelope::UserMessage),
        "typing" => Ok(Envelope::Typing),
        "bot_response" => payload::<BotResponsePayload>(&kind, value).map(Envelope::BotResponse),
        "error" => payload::<ErrorPayload>(&kind, value).map(Envelope::Error),
        _ => Ok(Envelope::Unknown { kind, body: value }),
    }
}

/// Deserialize a known kind's payload; extra fields (the tag) are ignored
fn payload<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::MalformedEnvelope(format!("invalid '{kind}' payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(envelope: Envelope) {
        let text = encode(&envelope).unwrap();
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_round_trip_connected() {
        round_trip(Envelope::Connected(ConnectedPayload {
            session_id: "sess-1".to_string(),
            message: "Welcome!".to_string(),
        }));
    }

    #[test]
    fn test_round_trip_user_message() {
        round_trip(Envelope::user_message(
            "What is CircularSync?",
            "sess-1",
            "test-user-123",
        ));
    }

    #[test]
    fn test_round_trip_typing() {
        round_trip(Envelope::Typing);
    }

    #[test]
    fn test_round_trip_bot_response() {
        round_trip(Envelope::BotResponse(BotResponsePayload {
            content: "CircularSync is a marketplace.".to_string(),
            suggestions: vec!["What are your fees?".to_string()],
            intent: Some(Intent {
                category: "platform_info".to_string(),
                confidence: 0.92,
            }),
            metadata: Some(ResponseMetadata {
                processing_time: 12,
                data_sources: vec!["knowledge_base".to_string()],
            }),
        }));
    }

    #[test]
    fn test_round_trip_bot_response_bare() {
        // Optional fields absent on the wire must stay absent after decode
        round_trip(Envelope::BotResponse(BotResponsePayload {
            content: "Hello.".to_string(),
            suggestions: Vec::new(),
            intent: None,
            metadata: None,
        }));
    }

    #[test]
    fn test_round_trip_error() {
        round_trip(Envelope::Error(ErrorPayload {
            message: "Out of scope".to_string(),
        }));
    }

    #[test]
    fn test_round_trip_unknown() {
        let decoded =
            decode(r#"{"type":"debug_stats","cacheHits":7}"#).unwrap();
        match &decoded {
            Envelope::Unknown { kind, body } => {
                assert_eq!(kind, "debug_stats");
                assert_eq!(body["cacheHits"], 7);
            }
            other => panic!("Expected Unknown, got {other:?}"),
        }
        round_trip(decoded);
    }

    #[test]
    fn test_decode_wire_field_names() {
        let envelope = decode(
            r#"{"type":"user_message","content":"hi","sessionId":"s1","userId":"u1"}"#,
        )
        .unwrap();
        match envelope {
            Envelope::UserMessage(payload) => {
                assert_eq!(payload.session_id, "s1");
                assert_eq!(payload.user_id, "u1");
            }
            other => panic!("Expected UserMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed_json() {
        assert!(matches!(
            decode("not json"),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_non_object() {
        assert!(matches!(
            decode("[1, 2, 3]"),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_decode_missing_kind() {
        assert!(matches!(
            decode(r#"{"content":"hi"}"#),
            Err(Error::UnknownKind(_))
        ));
    }

    #[test]
    fn test_decode_non_string_kind() {
        assert!(matches!(
            decode(r#"{"type":42}"#),
            Err(Error::UnknownKind(_))
        ));
    }

    #[test]
    fn test_decode_broken_known_payload() {
        // bot_response without content is a known kind with a bad payload
        assert!(matches!(
            decode(r#"{"type":"bot_response","suggestions":[]}"#),
            Err(Error::MalformedEnvelope(_))
        ));
    }
}
