//! Inbound background message: the opaque payload delivered by the push provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message delivered while the application has no active foreground page.
/// The payload is kept verbatim as delivered — received, logged, and
/// discarded, never parsed into a schema or persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundMessage(pub Value);

impl InboundMessage {
    /// Key/value data section of the payload, when present.
    pub fn data(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("data").and_then(Value::as_object)
    }

    /// Notification metadata (title/body), when present.
    pub fn notification(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("notification").and_then(Value::as_object)
    }

    /// Provider message id, when present. Used only in summary log lines.
    pub fn message_id(&self) -> Option<&str> {
        self.0.get("messageId").and_then(Value::as_str)
    }
}
