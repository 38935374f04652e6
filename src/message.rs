use serde::{Deserialize, Serialize};

/// A single inbound SMS as handed over by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Raw originating number. Always populated and the authoritative identity.
    pub sender_phone: String,
    /// Contact name resolved by the platform, if any. Not an identity key on its own.
    pub sender_name: Option<String>,
    pub body: String,
    /// Reception time in milliseconds since the Unix epoch.
    pub received_at_ms: i64,
}

impl Message {
    pub fn new(sender_phone: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_phone: sender_phone.into(),
            sender_name: None,
            body: body.into(),
            received_at_ms: 0,
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    pub fn with_timestamp(mut self, received_at_ms: i64) -> Self {
        self.received_at_ms = received_at_ms;
        self
    }
}
