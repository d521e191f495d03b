//! Interactive chat with the ChopWise backend.
//!
//! This module provides the chat interaction controller and the pieces the
//! `chopwise-chat` REPL is built from:
//!
//! - [`controller`]: conversation state and request dispatch
//! - [`config`]: CLI argument parsing and layered configuration
//! - [`commands`]: slash command parsing and handling
//! - [`render`]: terminal output

pub mod commands;
pub mod config;
pub mod controller;
pub mod render;

pub use commands::{ChatCommand, InfoSection, help_text, parse_command};
pub use config::{
    APOLOGY_TEXT, ChatArgs, ChatConfig, FallbackMessage, FileConfig, InFlightPolicy,
    SERVICE_UNAVAILABLE_TEXT,
};
pub use controller::{
    ChatController, ControllerState, Conversation, PendingReply, SessionStats, Submission,
};
pub use render::{PlainTextRenderer, Renderer, format_section, summarize_info};
