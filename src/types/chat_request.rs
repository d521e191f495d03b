use serde::{Deserialize, Serialize};

/// Request body for the `/chat` and `/predict` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The free-text question, sent exactly as the user typed it.
    pub message: String,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ChatRequest {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ChatRequest {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
