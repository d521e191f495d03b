//! The seam between the chat controller and the service that answers it.

use std::sync::Arc;

use crate::error::Result;
use crate::routing::Endpoint;
use crate::types::{ChatReply, ChatRequest, ChatbotInfo};

/// A service that answers chat questions and serves reference data.
///
/// [`ChopWise`](crate::ChopWise) talks to the real backend over HTTP. Tests
/// and embedders can substitute their own implementation.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Sends a question to `endpoint` (`/chat` or `/predict`) and returns the reply.
    async fn send(&self, endpoint: Endpoint, request: &ChatRequest) -> Result<ChatReply>;

    /// Fetches the reference data from `/info`.
    async fn info(&self) -> Result<ChatbotInfo>;
}

#[async_trait::async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn send(&self, endpoint: Endpoint, request: &ChatRequest) -> Result<ChatReply> {
        (**self).send(endpoint, request).await
    }

    async fn info(&self) -> Result<ChatbotInfo> {
        (**self).info().await
    }
}
