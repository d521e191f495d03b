//! Endpoint selection for chat submissions.
//!
//! The backend exposes a general `/chat` endpoint and a `/predict` endpoint
//! with the same request/response contract. Which one a submission targets is
//! decided by a [`RoutingPolicy`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static PREDICTION_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)predict|forecast|future").expect("prediction intent pattern is valid")
});

/// A backend endpoint, relative to the configured base URL.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /chat`
    Chat,

    /// `POST /predict`
    Predict,

    /// `GET /info`
    Info,
}

impl Endpoint {
    /// The path segment for this endpoint, without a leading slash.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Chat => "chat",
            Endpoint::Predict => "predict",
            Endpoint::Info => "info",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// How a submission picks its endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Every submission goes to `/chat` and the backend classifies intent.
    #[default]
    ChatOnly,

    /// Input mentioning "predict", "forecast" or "future" (any case, anywhere
    /// in the text) goes to `/predict`; everything else goes to `/chat`.
    IntentRouting,
}

impl RoutingPolicy {
    /// Selects the endpoint for the raw user input.
    pub fn route(&self, text: &str) -> Endpoint {
        match self {
            RoutingPolicy::ChatOnly => Endpoint::Chat,
            RoutingPolicy::IntentRouting => {
                if has_prediction_intent(text) {
                    Endpoint::Predict
                } else {
                    Endpoint::Chat
                }
            }
        }
    }
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingPolicy::ChatOnly => write!(f, "chat"),
            RoutingPolicy::IntentRouting => write!(f, "intent"),
        }
    }
}

impl FromStr for RoutingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" | "chat-only" => Ok(RoutingPolicy::ChatOnly),
            "intent" | "intent-routing" => Ok(RoutingPolicy::IntentRouting),
            _ => Err(Error::validation(
                format!("unknown routing policy {s:?} (expected chat or intent)"),
                Some("routing".to_string()),
            )),
        }
    }
}

/// Returns true if the text asks for a price prediction.
pub fn has_prediction_intent(text: &str) -> bool {
    PREDICTION_INTENT.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_only_always_targets_chat() {
        let policy = RoutingPolicy::ChatOnly;
        assert_eq!(policy.route("price of maize white in Lagos"), Endpoint::Chat);
        assert_eq!(
            policy.route("predict price of beans in Abuja 3 months"),
            Endpoint::Chat
        );
    }

    #[test]
    fn intent_routing_matches_substrings_case_insensitively() {
        let policy = RoutingPolicy::IntentRouting;
        assert_eq!(
            policy.route("predict price of beans in Abuja 3 months"),
            Endpoint::Predict
        );
        assert_eq!(policy.route("FORECAST rice in Kano"), Endpoint::Predict);
        assert_eq!(policy.route("what does the Future hold"), Endpoint::Predict);
        assert_eq!(policy.route("unpredictable yam prices"), Endpoint::Predict);
        assert_eq!(policy.route("price of garri in Lokoja"), Endpoint::Chat);
        assert_eq!(policy.route("help"), Endpoint::Chat);
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Chat.path(), "chat");
        assert_eq!(Endpoint::Predict.to_string(), "/predict");
        assert_eq!(Endpoint::Info.to_string(), "/info");
    }

    #[test]
    fn policy_parses_from_str() {
        assert_eq!("chat".parse::<RoutingPolicy>().unwrap(), RoutingPolicy::ChatOnly);
        assert_eq!(
            "Chat-Only".parse::<RoutingPolicy>().unwrap(),
            RoutingPolicy::ChatOnly
        );
        assert_eq!(
            " intent ".parse::<RoutingPolicy>().unwrap(),
            RoutingPolicy::IntentRouting
        );
        assert_eq!(
            "intent-routing".parse::<RoutingPolicy>().unwrap(),
            RoutingPolicy::IntentRouting
        );
        let err = "sometimes".parse::<RoutingPolicy>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn policy_display_round_trips() {
        for policy in [RoutingPolicy::ChatOnly, RoutingPolicy::IntentRouting] {
            assert_eq!(policy.to_string().parse::<RoutingPolicy>().unwrap(), policy);
        }
    }
}
