use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Request,
    Reply,
}

/// Envelope exchanged over the window-messaging transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub channel_id: String,
    pub correlation_id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub event_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

impl WireMessage {
    pub fn request(
        channel_id: impl Into<String>,
        correlation_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            correlation_id: correlation_id.into(),
            kind: MessageKind::Request,
            event_type: event_type.into(),
            payload,
            error: None,
        }
    }

    /// Builds the reply to `self`; an `Err` outcome is flagged with `error: true`.
    pub fn reply_to(&self, outcome: Result<Value, Value>) -> Self {
        let (payload, error) = match outcome {
            Ok(payload) => (payload, None),
            Err(reason) => (reason, Some(true)),
        };
        Self {
            channel_id: self.channel_id.clone(),
            correlation_id: self.correlation_id.clone(),
            kind: MessageKind::Reply,
            event_type: self.event_type.clone(),
            payload,
            error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error == Some(true)
    }

    /// Parses an inbound window message; foreign traffic yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// `true` iff `value` is an object whose `error` member is literally `true`.
pub fn has_error(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|object| object.get("error"))
        .is_some_and(|flag| flag == &Value::Bool(true))
}
