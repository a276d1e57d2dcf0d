//! Typed envelopes exchanged over the duplex channel.
//!
//! Inbound frames are `{type, content?, action?, data?}` JSON objects.
//! Outbound frames carry their `type` tag next to the payload fields.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use concierge_core::records::{HistoryEntry, Reservation};
use concierge_core::types::{Directive, EntityBag, Intent};

#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Message has no type")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Message of type {0} has no action")]
    MissingAction(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    ChatMessage { content: String },
    ReservationAction { action: String, data: Value },
    AutomationAction { action: String, data: Value },
}

impl Inbound {
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| EnvelopeError::Malformed("expected a JSON object".to_string()))?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EnvelopeError::MissingType)?;

        let action = |tag: &'static str| -> Result<(String, Value), EnvelopeError> {
            let action = object
                .get("action")
                .and_then(Value::as_str)
                .filter(|a| !a.is_empty())
                .ok_or(EnvelopeError::MissingAction(tag))?;
            let data = object.get("data").cloned().unwrap_or(Value::Null);
            Ok((action.to_string(), data))
        };

        match kind {
            "CHAT_MESSAGE" => {
                let content = object
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        EnvelopeError::Malformed("CHAT_MESSAGE requires content".to_string())
                    })?;
                Ok(Self::ChatMessage {
                    content: content.to_string(),
                })
            }
            "RESERVATION_ACTION" => {
                let (action, data) = action("RESERVATION_ACTION")?;
                Ok(Self::ReservationAction { action, data })
            }
            "AUTOMATION_ACTION" => {
                let (action, data) = action("AUTOMATION_ACTION")?;
                Ok(Self::AutomationAction { action, data })
            }
            other => Err(EnvelopeError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outbound {
    #[serde(rename_all = "camelCase")]
    ChatResponse {
        response: Directive,
        intent: Intent,
        entities: EntityBag,
        extra_intents: Vec<Intent>,
    },
    ReservationsUpdate {
        reservations: Vec<Reservation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        history: Option<Vec<HistoryEntry>>,
    },
    Error {
        message: String,
    },
    History {
        entries: Vec<HistoryEntry>,
    },
}

const SERIALIZATION_FAILED: &str = r#"{"type":"ERROR","message":"serialization failed"}"#;

impl Outbound {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize outbound envelope");
            SERIALIZATION_FAILED.to_string()
        })
    }
}
