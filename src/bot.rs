//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `webhook`: Parses inbound webhook updates and answers the transport
//! - `orchestrator`: Runs one conversation turn end to end
//! - `sender`: Delivers replies back to the chat
//! - `ui_builder`: Formats draft summaries and reply notices

pub mod orchestrator;
pub mod sender;
pub mod ui_builder;
pub mod webhook;

pub use orchestrator::{InboundMessage, TurnOrchestrator};
pub use sender::{ReplySender, TelegramSender};
pub use webhook::{router as webhook_router, WebhookState};
