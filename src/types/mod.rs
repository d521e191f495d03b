// Public modules
pub mod chat_reply;
pub mod chat_request;
pub mod chatbot_info;
pub mod message;

// Re-exports
pub use chat_reply::ChatReply;
pub use chat_request::ChatRequest;
pub use chatbot_info::{ChatbotInfo, DateRange};
pub use message::{Message, Role};
