use std::env;
use std::time::{Duration, Instant};

use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::routing::Endpoint;
use crate::types::{ChatReply, ChatRequest, ChatbotInfo};

/// Backend used when neither an explicit URL nor `CHOPWISE_BACKEND_URL` is given.
pub const DEFAULT_BACKEND_URL: &str = "https://your-backend.onrender.com";

/// Environment variable consulted for the backend base URL.
pub const BACKEND_URL_ENV: &str = "CHOPWISE_BACKEND_URL";

/// HTTP client for the ChopWise backend.
///
/// Requests carry no authentication; the only configuration is the base URL
/// and an optional timeout. Without a timeout a request waits as long as the
/// transport allows.
#[derive(Debug, Clone)]
pub struct ChopWise {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl ChopWise {
    /// Create a new ChopWise client.
    ///
    /// The base URL can be provided directly or read from the
    /// `CHOPWISE_BACKEND_URL` environment variable, falling back to
    /// [`DEFAULT_BACKEND_URL`].
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with a custom base URL and request timeout.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BACKEND_URL_ENV).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The absolute URL for `endpoint`.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        Ok(self.base_url.join(endpoint.path())?)
    }

    /// Send a question to `/chat`.
    pub async fn chat(&self, message: impl Into<String>) -> Result<ChatReply> {
        self.send(Endpoint::Chat, &ChatRequest::new(message)).await
    }

    /// Send a question to `/predict`.
    pub async fn predict(&self, message: impl Into<String>) -> Result<ChatReply> {
        self.send(Endpoint::Predict, &ChatRequest::new(message))
            .await
    }

    fn map_transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process a non-2xx response and convert it to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let path = response.url().path().to_string();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // FastAPI reports errors as {"detail": "..."}; validation errors use a list.
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(error_body);

        match status_code {
            404 => Error::not_found(error_message, Some(path)),
            408 => Error::timeout(error_message, None),
            422 => Error::validation(error_message, Some("message".to_string())),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_message),
        }
    }

    async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn finish<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        sent: std::result::Result<Response, reqwest::Error>,
        start: Instant,
    ) -> Result<T> {
        let result = match sent {
            Ok(response) if response.status().is_success() => Self::parse_body(response).await,
            Ok(response) => Err(Self::process_error_response(response).await),
            Err(e) => Err(self.map_transport_error(e)),
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::debug!(%endpoint, status = ?err.status_code(), error = %err, "backend request failed");
        }
        result
    }
}

#[async_trait::async_trait]
impl Backend for ChopWise {
    async fn send(&self, endpoint: Endpoint, request: &ChatRequest) -> Result<ChatReply> {
        if endpoint == Endpoint::Info {
            return Err(Error::validation(
                "questions can only be sent to /chat or /predict",
                Some("endpoint".to_string()),
            ));
        }
        let url = self.endpoint_url(endpoint)?;
        CLIENT_REQUESTS.click();
        tracing::debug!(%endpoint, %url, "posting question");

        let start = Instant::now();
        let sent = self.client.post(url).json(request).send().await;
        self.finish(endpoint, sent, start).await
    }

    async fn info(&self) -> Result<ChatbotInfo> {
        let url = self.endpoint_url(Endpoint::Info)?;
        CLIENT_REQUESTS.click();
        tracing::debug!(%url, "fetching reference data");

        let start = Instant::now();
        let sent = self.client.get(url).send().await;
        self.finish(Endpoint::Info, sent, start).await
    }
}

/// Parse a base URL, making sure it ends in `/` so endpoint paths are
/// appended rather than replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(
            format!("backend URL cannot be used as a base: {trimmed}"),
            None,
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ChopWise::new(Some("http://localhost:8000".to_string())).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(client.timeout(), None);

        let client = ChopWise::with_options(
            Some("https://chopwise.example.com/api".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://chopwise.example.com/api/");
        assert_eq!(client.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn endpoint_urls_keep_path_prefix() {
        let client = ChopWise::new(Some("https://chopwise.example.com/api/v1".to_string())).unwrap();
        assert_eq!(
            client.endpoint_url(Endpoint::Chat).unwrap().as_str(),
            "https://chopwise.example.com/api/v1/chat"
        );
        assert_eq!(
            client.endpoint_url(Endpoint::Predict).unwrap().as_str(),
            "https://chopwise.example.com/api/v1/predict"
        );
        assert_eq!(
            client.endpoint_url(Endpoint::Info).unwrap().as_str(),
            "https://chopwise.example.com/api/v1/info"
        );
    }

    #[test]
    fn invalid_base_urls_are_rejected() {
        assert!(matches!(
            ChopWise::new(Some("not a url".to_string())),
            Err(Error::Url { .. })
        ));
        assert!(matches!(
            ChopWise::new(Some("mailto:someone@example.com".to_string())),
            Err(Error::Url { .. })
        ));
    }

    #[tokio::test]
    async fn info_endpoint_cannot_take_questions() {
        let client = ChopWise::new(Some("http://127.0.0.1:9".to_string())).unwrap();
        let err = client
            .send(Endpoint::Info, &ChatRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
