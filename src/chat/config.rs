//! Configuration types for the chat application.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! the `CHOPWISE_BACKEND_URL` environment variable, then command-line flags
//! parsed via `arrrg`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::{BACKEND_URL_ENV, DEFAULT_BACKEND_URL};
use crate::error::{Error, Result};
use crate::routing::RoutingPolicy;

/// Fallback text used by the earliest chat widget.
pub const SERVICE_UNAVAILABLE_TEXT: &str = "⚠️ Service unavailable.";

/// Fallback text used by later chat widgets.
pub const APOLOGY_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// The bot message appended when the backend cannot produce a reply.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FallbackMessage {
    /// "⚠️ Service unavailable."
    ServiceUnavailable,

    /// "Sorry, something went wrong. Please try again."
    #[default]
    Apology,
}

impl FallbackMessage {
    /// The exact text appended to the conversation.
    pub fn text(&self) -> &'static str {
        match self {
            FallbackMessage::ServiceUnavailable => SERVICE_UNAVAILABLE_TEXT,
            FallbackMessage::Apology => APOLOGY_TEXT,
        }
    }
}

impl fmt::Display for FallbackMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackMessage::ServiceUnavailable => write!(f, "unavailable"),
            FallbackMessage::Apology => write!(f, "apology"),
        }
    }
}

impl FromStr for FallbackMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unavailable" | "service-unavailable" => Ok(FallbackMessage::ServiceUnavailable),
            "apology" | "sorry" => Ok(FallbackMessage::Apology),
            _ => Err(Error::validation(
                format!("unknown fallback message {s:?} (expected unavailable or apology)"),
                Some("fallback".to_string()),
            )),
        }
    }
}

/// Whether a new submission may start while a reply is still pending.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum InFlightPolicy {
    /// At most one request in flight; submissions while awaiting a reply are
    /// rejected without touching the conversation.
    #[default]
    Exclusive,

    /// Any number of overlapping requests. Replies are appended in the order
    /// they resolve.
    Concurrent,
}

impl fmt::Display for InFlightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InFlightPolicy::Exclusive => write!(f, "exclusive"),
            InFlightPolicy::Concurrent => write!(f, "concurrent"),
        }
    }
}

/// Command-line arguments for the chopwise-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML file with chat settings.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Base URL of the backend.
    #[arrrg(optional, "Backend base URL (default: $CHOPWISE_BACKEND_URL)", "URL")]
    pub backend_url: Option<String>,

    /// Endpoint routing policy.
    #[arrrg(optional, "Routing policy: chat or intent (default: chat)", "POLICY")]
    pub routing: Option<String>,

    /// Which fallback text to show on failure.
    #[arrrg(optional, "Fallback text: unavailable or apology (default: apology)", "STYLE")]
    pub fallback: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout_secs: Option<u64>,

    /// Allow overlapping requests.
    #[arrrg(flag, "Allow sending while a reply is pending")]
    pub concurrent: bool,

    /// Skip the reference data fetch at startup.
    #[arrrg(flag, "Do not fetch /info at startup")]
    pub no_info: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML configuration file.
///
/// Every field is optional; missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Base URL of the backend.
    pub backend_url: Option<String>,
    /// `chat` or `intent`.
    pub routing: Option<String>,
    /// `unavailable` or `apology`.
    pub fallback: Option<String>,
    /// Allow overlapping requests.
    pub concurrent: Option<bool>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Use ANSI colors.
    pub use_color: Option<bool>,
    /// Fetch `/info` at startup.
    pub fetch_info: Option<bool>,
}

impl FileConfig {
    /// Parses a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a YAML file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read {}", path.display()), err)
        })?;
        Self::from_yaml(&content)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after layering the
/// configuration file, environment and command-line arguments over the
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Base URL of the backend.
    pub backend_url: String,

    /// How submissions pick an endpoint.
    pub routing: RoutingPolicy,

    /// Text appended when the backend fails.
    pub fallback: FallbackMessage,

    /// Whether submissions may overlap.
    pub in_flight: InFlightPolicy,

    /// Optional client-side request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to fetch reference data at startup.
    pub fetch_info: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Backend: the hosted default URL
    /// - Routing: `/chat` only
    /// - Fallback: apology text
    /// - In-flight: exclusive
    /// - Timeout: none
    /// - Color: enabled
    /// - Reference data: fetched
    pub fn new() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            routing: RoutingPolicy::ChatOnly,
            fallback: FallbackMessage::Apology,
            in_flight: InFlightPolicy::Exclusive,
            timeout: None,
            use_color: true,
            fetch_info: true,
        }
    }

    /// Sets the backend base URL.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Sets the routing policy.
    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }

    /// Sets the fallback message.
    pub fn with_fallback(mut self, fallback: FallbackMessage) -> Self {
        self.fallback = fallback;
        self
    }

    /// Sets the in-flight policy.
    pub fn with_in_flight(mut self, in_flight: InFlightPolicy) -> Self {
        self.in_flight = in_flight;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets whether reference data is fetched at startup.
    pub fn with_fetch_info(mut self, fetch_info: bool) -> Self {
        self.fetch_info = fetch_info;
        self
    }

    /// Applies the settings present in a configuration file.
    pub fn merge_file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(url) = file.backend_url {
            self.backend_url = url;
        }
        if let Some(routing) = file.routing {
            self.routing = routing.parse()?;
        }
        if let Some(fallback) = file.fallback {
            self.fallback = fallback.parse()?;
        }
        if let Some(concurrent) = file.concurrent {
            self.in_flight = in_flight_for(concurrent);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(timeout_from_secs(secs)?);
        }
        if let Some(use_color) = file.use_color {
            self.use_color = use_color;
        }
        if let Some(fetch_info) = file.fetch_info {
            self.fetch_info = fetch_info;
        }
        Ok(self)
    }

    /// Applies command-line arguments. Flags only ever turn behavior on or
    /// off relative to what is already configured.
    pub fn merge_args(mut self, args: &ChatArgs) -> Result<Self> {
        if let Some(url) = &args.backend_url {
            self.backend_url = url.clone();
        }
        if let Some(routing) = &args.routing {
            self.routing = routing.parse()?;
        }
        if let Some(fallback) = &args.fallback {
            self.fallback = fallback.parse()?;
        }
        if let Some(secs) = args.timeout_secs {
            self.timeout = Some(timeout_from_secs(secs)?);
        }
        if args.concurrent {
            self.in_flight = InFlightPolicy::Concurrent;
        }
        if args.no_info {
            self.fetch_info = false;
        }
        if args.no_color {
            self.use_color = false;
        }
        Ok(self)
    }

    /// Resolves the full configuration: defaults, then the file named by
    /// `--config`, then `env_backend_url`, then the remaining arguments.
    pub fn resolve(args: &ChatArgs, env_backend_url: Option<String>) -> Result<Self> {
        let mut config = ChatConfig::new();
        if let Some(path) = &args.config {
            config = config.merge_file(FileConfig::from_file(path)?)?;
        }
        if let Some(url) = env_backend_url.filter(|u| !u.trim().is_empty()) {
            config.backend_url = url;
        }
        config.merge_args(args)
    }

    /// Like [`ChatConfig::resolve`], reading the backend URL from the
    /// process environment.
    pub fn from_args(args: &ChatArgs) -> Result<Self> {
        Self::resolve(args, std::env::var(BACKEND_URL_ENV).ok())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn in_flight_for(concurrent: bool) -> InFlightPolicy {
    if concurrent {
        InFlightPolicy::Concurrent
    } else {
        InFlightPolicy::Exclusive
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::validation(
            "timeout must be at least one second",
            Some("timeout_secs".to_string()),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.routing, RoutingPolicy::ChatOnly);
        assert_eq!(config.fallback, FallbackMessage::Apology);
        assert_eq!(config.in_flight, InFlightPolicy::Exclusive);
        assert!(config.timeout.is_none());
        assert!(config.use_color);
        assert!(config.fetch_info);
    }

    #[test]
    fn fallback_texts_are_exact() {
        assert_eq!(
            FallbackMessage::ServiceUnavailable.text(),
            "⚠️ Service unavailable."
        );
        assert_eq!(
            FallbackMessage::Apology.text(),
            "Sorry, something went wrong. Please try again."
        );
        assert_eq!(
            "unavailable".parse::<FallbackMessage>().unwrap(),
            FallbackMessage::ServiceUnavailable
        );
        assert!("shrug".parse::<FallbackMessage>().unwrap_err().is_validation());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::resolve(&ChatArgs::default(), None).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            config: None,
            backend_url: Some("http://localhost:8000".to_string()),
            routing: Some("intent".to_string()),
            fallback: Some("unavailable".to_string()),
            timeout_secs: Some(15),
            concurrent: true,
            no_info: true,
            no_color: true,
        };
        let config = ChatConfig::resolve(&args, None).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.routing, RoutingPolicy::IntentRouting);
        assert_eq!(config.fallback, FallbackMessage::ServiceUnavailable);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.in_flight, InFlightPolicy::Concurrent);
        assert!(!config.fetch_info);
        assert!(!config.use_color);
    }

    #[test]
    fn env_overrides_file_and_args_override_env() {
        let file = FileConfig::from_yaml("backend_url: http://file.example\n").unwrap();
        let config = ChatConfig::new().merge_file(file).unwrap();
        assert_eq!(config.backend_url, "http://file.example");

        let args = ChatArgs::default();
        let config = ChatConfig::resolve(&args, Some("http://env.example".to_string())).unwrap();
        assert_eq!(config.backend_url, "http://env.example");

        let args = ChatArgs {
            backend_url: Some("http://flag.example".to_string()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::resolve(&args, Some("http://env.example".to_string())).unwrap();
        assert_eq!(config.backend_url, "http://flag.example");

        let config = ChatConfig::resolve(&ChatArgs::default(), Some("  ".to_string())).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn yaml_file_settings() {
        let yaml = r#"
backend_url: https://chopwise.example.com
routing: intent
fallback: unavailable
concurrent: true
timeout_secs: 20
use_color: false
fetch_info: false
"#;
        let file = FileConfig::from_yaml(yaml).unwrap();
        let config = ChatConfig::new().merge_file(file).unwrap();
        assert_eq!(config.backend_url, "https://chopwise.example.com");
        assert_eq!(config.routing, RoutingPolicy::IntentRouting);
        assert_eq!(config.fallback, FallbackMessage::ServiceUnavailable);
        assert_eq!(config.in_flight, InFlightPolicy::Concurrent);
        assert_eq!(config.timeout, Some(Duration::from_secs(20)));
        assert!(!config.use_color);
        assert!(!config.fetch_info);
    }

    #[test]
    fn yaml_rejects_unknown_keys_and_bad_values() {
        assert!(FileConfig::from_yaml("model: gpt\n").unwrap_err().is_serialization());

        let file = FileConfig::from_yaml("routing: sideways\n").unwrap();
        assert!(ChatConfig::new().merge_file(file).unwrap_err().is_validation());

        let file = FileConfig::from_yaml("timeout_secs: 0\n").unwrap();
        assert!(ChatConfig::new().merge_file(file).unwrap_err().is_validation());
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let args = ChatArgs {
            config: Some("/nonexistent/chopwise.yaml".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::resolve(&args, None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_backend_url("http://localhost:8000")
            .with_routing(RoutingPolicy::IntentRouting)
            .with_fallback(FallbackMessage::ServiceUnavailable)
            .with_in_flight(InFlightPolicy::Concurrent)
            .with_timeout(Some(Duration::from_secs(5)))
            .without_color()
            .with_fetch_info(false);

        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.routing, RoutingPolicy::IntentRouting);
        assert_eq!(config.fallback, FallbackMessage::ServiceUnavailable);
        assert_eq!(config.in_flight, InFlightPolicy::Concurrent);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_color);
        assert!(!config.fetch_info);
    }
}
