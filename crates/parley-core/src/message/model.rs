//! Message domain model.
//!
//! A `Message` is one utterance in a session. Once appended to a session it is
//! never removed; only its `content` may be replaced, in place, by compaction.

use crate::error::{ParleyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Role of the party that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    /// Session preamble and other host-authored instructions.
    System,
    /// Message typed by the human user.
    User,
    /// Message produced by the persona through the generation backend.
    Assistant,
}

impl SenderRole {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::System => "system",
            SenderRole::User => "user",
            SenderRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for SenderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderRole {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(ParleyError::validation("sender role must not be empty")),
            "system" => Ok(SenderRole::System),
            "user" => Ok(SenderRole::User),
            "assistant" => Ok(SenderRole::Assistant),
            other => Err(ParleyError::validation(format!(
                "unknown sender role '{other}'"
            ))),
        }
    }
}

/// One utterance record.
///
/// Equality is identity: two messages are equal when their ids match, even if
/// compaction has since replaced the content of one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (UUID format)
    pub id: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Display name of the sender
    pub sender_name: String,
    /// Role of the sender
    pub sender_role: SenderRole,
    /// Text of the message; replaced in place by compaction
    pub content: String,
    /// Open key-value bag, never sent to the generation backend
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Message {
    /// Creates a message after checking that name and content are non-empty.
    pub fn new(
        sender_name: impl Into<String>,
        sender_role: SenderRole,
        content: impl Into<String>,
    ) -> Result<Self> {
        let sender_name = sender_name.into();
        let content = content.into();

        if sender_name.trim().is_empty() {
            return Err(ParleyError::validation("sender name must not be empty"));
        }
        if content.trim().is_empty() {
            return Err(ParleyError::validation("message content must not be empty"));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            sender_name,
            sender_role,
            content,
            metadata: Map::new(),
        })
    }

    /// Adds or replaces a metadata entry.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Renders the message as a readable block for prompts and debugging.
    pub fn to_prompt_block(&self) -> String {
        let metadata = if self.metadata.is_empty() {
            "N/A".to_string()
        } else {
            Value::Object(self.metadata.clone()).to_string()
        };

        format!(
            "Message ID: {}\nTimestamp: {}\nSender: {} ({})\nMessage: {}\nMetadata: {}",
            self.id,
            self.timestamp.to_rfc3339(),
            self.sender_name,
            self.sender_role,
            self.content,
            metadata
        )
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_rejects_empty_sender_or_content() {
        let err = Message::new("", SenderRole::User, "hi").unwrap_err();
        assert!(err.is_validation());

        let err = Message::new("Ada", SenderRole::User, "   ").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn new_assigns_unique_ids() {
        let a = Message::new("Ada", SenderRole::User, "hello").unwrap();
        let b = Message::new("Ada", SenderRole::User, "hello").unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn equality_is_by_id() {
        let a = Message::new("Ada", SenderRole::User, "hello").unwrap();
        let mut b = a.clone();
        b.content = "summarized".to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn role_parses_case_insensitively_and_rejects_empty() {
        assert_eq!("Assistant".parse::<SenderRole>().unwrap(), SenderRole::Assistant);
        assert!("".parse::<SenderRole>().unwrap_err().is_validation());
        assert!("narrator".parse::<SenderRole>().unwrap_err().is_validation());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SenderRole::System).unwrap(), json!("system"));
    }

    #[test]
    fn prompt_block_reports_missing_metadata() {
        let mut message = Message::new("Ada", SenderRole::User, "hello").unwrap();
        assert!(message.to_prompt_block().ends_with("Metadata: N/A"));

        message.add_metadata("mood", "cheerful");
        let block = message.to_prompt_block();
        assert!(block.contains("Sender: Ada (user)"));
        assert!(block.contains("\"mood\":\"cheerful\""));
    }
}
