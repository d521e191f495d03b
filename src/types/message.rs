use serde::{Deserialize, Serialize};

/// Who authored a message in the conversation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the person chatting.
    User,

    /// A backend reply, or the fallback text when the backend failed.
    Bot,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// A single entry in the conversation.
///
/// Messages are never edited after they are appended; the conversation
/// only hands out clones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The author of the message.
    pub role: Role,

    /// The message text, exactly as typed or received.
    pub text: String,
}

impl Message {
    /// Create a new `Message` with the given role and text.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a new user `Message`.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new bot `Message`.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Role::Bot, text)
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Returns true if this message came from the bot side.
    pub fn is_bot(&self) -> bool {
        self.role == Role::Bot
    }
}
