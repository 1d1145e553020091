//! Outbound delivery of replies to the chat transport

use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, error};

use crate::errors::DeliveryError;

#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Delivers replies through the Telegram Bot API as HTML messages
#[derive(Clone)]
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send_reply(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        debug!(chat_id, chars = text.len(), "Sending reply to Telegram");

        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(chat_id, error = %e, "Telegram refused the reply");
                DeliveryError(e.to_string())
            })
    }
}
