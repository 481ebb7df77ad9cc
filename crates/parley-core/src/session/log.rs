//! Session log contract.
//!
//! A session log is the durable, human-inspectable mirror of one session's
//! messages. It is owned by exactly one [`SessionState`](super::SessionState);
//! `&mut self` receivers make that single-writer rule part of the signature.

use crate::error::Result;
use crate::message::{Message, SenderRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message as written to the log, tagged with its position in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLogRecord {
    /// Position of the message in the session at the time it was appended
    pub message_number: usize,
    pub timestamp: DateTime<Utc>,
    pub sender_name: String,
    pub sender_role: SenderRole,
    pub content: String,
    pub message_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PersistedLogRecord {
    pub fn from_message(message_number: usize, message: &Message) -> Self {
        Self {
            message_number,
            timestamp: message.timestamp,
            sender_name: message.sender_name.clone(),
            sender_role: message.sender_role,
            content: message.content.clone(),
            message_id: message.id.clone(),
            metadata: message.metadata.clone(),
        }
    }

    /// Rebuilds the in-memory message this record mirrors.
    pub fn to_message(&self) -> Message {
        Message {
            id: self.message_id.clone(),
            timestamp: self.timestamp,
            sender_name: self.sender_name.clone(),
            sender_role: self.sender_role,
            content: self.content.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Current view of a session log with every revision applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub messages: Vec<PersistedLogRecord>,
}

/// Durable, ordered mirror of a session's messages.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Fail with `ParleyError::Persistence` when the resource is unreadable or unwritable
/// - Fail with `ParleyError::Serialization` when existing content is malformed
/// - Make every successful call durable before returning
#[async_trait]
pub trait SessionLog: Send + Sync {
    /// Creates the backing resource for a new session.
    async fn initialize(&mut self, session_id: &str, start_time: DateTime<Utc>) -> Result<()>;

    /// Records a newly appended message.
    async fn append(&mut self, record: &PersistedLogRecord) -> Result<()>;

    /// Records a replacement of the message at `index`.
    ///
    /// `record.message_number` must equal `index`.
    async fn update(&mut self, index: usize, record: &PersistedLogRecord) -> Result<()>;

    /// Records the end of the session.
    async fn close(&mut self, end_time: DateTime<Utc>) -> Result<()>;

    /// Human-readable location of the backing resource, for diagnostics.
    fn location(&self) -> String;
}
