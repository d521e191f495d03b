use serde::{Deserialize, Serialize};

/// Successful response body from the `/chat` and `/predict` endpoints.
///
/// Any 2xx body without a string `reply` field fails to deserialize and is
/// treated as a malformed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    /// The bot's answer.
    pub reply: String,
}

impl ChatReply {
    /// Create a new `ChatReply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn reply_parses_and_ignores_extra_fields() {
        let reply: ChatReply =
            from_value(json!({"reply": "Good news!", "confidence": 0.7})).unwrap();
        assert_eq!(reply, ChatReply::new("Good news!"));
    }

    #[test]
    fn reply_without_text_is_malformed() {
        assert!(from_value::<ChatReply>(json!({})).is_err());
        assert!(from_value::<ChatReply>(json!({"reply": null})).is_err());
        assert!(from_value::<ChatReply>(json!({"reply": 42})).is_err());
        assert!(from_value::<ChatReply>(json!({"message": "hi"})).is_err());
    }
}
