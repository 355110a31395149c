//! Wire message types
//!
//! The protocol carries exactly two message variants: free-form text lines
//! (chat lines and the `SUBMITNAME`/`NAMEACCEPTED`/`MESSAGE` control lines)
//! and structured records, which the server relays without interpreting.

use crate::protocol::constants::{MESSAGE_PREFIX, NAMEACCEPTED, SUBMITNAME};

/// A structured payload, opaque to the server's broadcast logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Client-assigned identifier
    pub id: i32,
    /// Client-assigned label
    pub label: String,
}

impl Record {
    /// Create a new record
    pub fn new(id: i32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}, {}}}", self.id, self.label)
    }
}

/// A single wire message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A free-form line: a chat message or a protocol control line
    Text(String),
    /// A structured record, relayed verbatim
    Record(Record),
}

impl Message {
    /// Create a text message
    pub fn text(line: impl Into<String>) -> Self {
        Message::Text(line.into())
    }

    /// Create a record message
    pub fn record(id: i32, label: impl Into<String>) -> Self {
        Message::Record(Record::new(id, label))
    }

    /// The `SUBMITNAME` control line
    pub fn submit_name() -> Self {
        Message::Text(SUBMITNAME.to_string())
    }

    /// The `NAMEACCEPTED` control line
    pub fn name_accepted() -> Self {
        Message::Text(NAMEACCEPTED.to_string())
    }

    /// A `MESSAGE`-prefixed broadcast line
    pub fn broadcast_line(body: impl AsRef<str>) -> Self {
        Message::Text(format!("{}{}", MESSAGE_PREFIX, body.as_ref()))
    }

    /// Get the text content, if this is a text message
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(line) => Some(line),
            Message::Record(_) => None,
        }
    }

    /// Strip the `MESSAGE ` prefix, if this is a broadcast line
    ///
    /// This is what a displaying client renders verbatim.
    pub fn broadcast_body(&self) -> Option<&str> {
        self.as_text().and_then(|l| l.strip_prefix(MESSAGE_PREFIX))
    }
}
