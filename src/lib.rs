//! Client library for the ChopWise food price chatbot.
//!
//! The backend answers free-text questions (`POST /chat`, `POST /predict`)
//! and serves reference data (`GET /info`). [`ChopWise`] is the HTTP client;
//! [`chat::ChatController`] owns a conversation and turns user input into
//! requests and bot messages.

// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod error;
pub mod observability;
pub mod routing;
pub mod types;

// Re-exports
pub use backend::Backend;
pub use client::ChopWise;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use routing::{Endpoint, RoutingPolicy};
pub use types::*;
