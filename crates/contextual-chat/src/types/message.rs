//! Chat message types

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grounding::CitationEntry;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Model,
    System,
}

/// A single message of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: MessageSender,
    /// RFC 3339 timestamp
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
    /// Numbered sources cited by a model answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url_context: Vec<CitationEntry>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatMessage {
    fn new(sender: MessageSender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now().to_rfc3339(),
            is_loading: false,
            url_context: Vec::new(),
            is_error: false,
        }
    }

    /// A message typed by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageSender::User, text)
    }

    /// An empty model message waiting for a streamed answer
    pub fn model_placeholder() -> Self {
        Self {
            is_loading: true,
            ..Self::new(MessageSender::Model, "")
        }
    }

    pub fn is_model(&self) -> bool {
        self.sender == MessageSender::Model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_loading_model_message() {
        let msg = ChatMessage::model_placeholder();
        assert!(msg.is_model());
        assert!(msg.is_loading);
        assert!(msg.text.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&msg.timestamp).is_ok());
    }

    #[test]
    fn test_serialization_omits_default_flags() {
        let msg = ChatMessage::user("hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["sender"], "user");
        assert!(value.get("isLoading").is_none());
        assert!(value.get("urlContext").is_none());
    }
}
