//! Data models for requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level JSON object returned by the API.
///
/// Its nested shape is provider-defined; the client only reads `data`
/// when listing models.
pub type Envelope = Map<String, Value>;

/// One entry of the `data` list returned by `list_models`.
pub type ModelDescriptor = Value;

/// Role of the message sender.
///
/// Roles outside the conventional set are kept as free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    #[serde(untagged)]
    Other(String),
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a message with an arbitrary role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
