use super::model::{Message, SenderRole};
use serde::{Deserialize, Serialize};

/// The exact `{role, content}` pair handed to a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMessage {
    pub role: SenderRole,
    pub content: String,
}

impl From<&Message> for GenerationMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.sender_role,
            content: message.content.clone(),
        }
    }
}
