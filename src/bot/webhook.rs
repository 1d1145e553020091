//! Inbound Telegram webhook: parses update payloads and drives a turn.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::orchestrator::{InboundMessage, TurnOrchestrator};
use super::sender::ReplySender;
use crate::models::ChatIdentity;

const ERROR_MARKER: &str = "Error processing webhook";

#[derive(Debug, Deserialize)]
pub struct WebhookUpdate {
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: IncomingChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<IncomingUser>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingChat {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncomingUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl WebhookUpdate {
    /// The message to process, or `None` for updates without text
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let text = message.text.filter(|t| !t.trim().is_empty())?;
        let from = message.from.unwrap_or_default();

        Some(InboundMessage {
            identity: ChatIdentity {
                chat_id: message.chat.id,
                username: from.username,
                first_name: from.first_name,
                last_name: from.last_name,
                last_interaction: None,
            },
            text,
            language_code: from.language_code,
        })
    }
}

#[derive(Clone)]
pub struct WebhookState {
    pub orchestrator: Arc<TurnOrchestrator>,
    pub sender: Arc<dyn ReplySender>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook/telegram", post(telegram_webhook))
        .with_state(state)
}

async fn telegram_webhook(
    State(state): State<WebhookState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    // Anything that is not a text message is acknowledged and dropped
    let update: WebhookUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Ignoring unparseable webhook payload");
            return (StatusCode::OK, "OK");
        }
    };

    let Some(inbound) = update.into_inbound() else {
        debug!("Webhook update without text, nothing to do");
        return (StatusCode::OK, "OK");
    };

    let chat_id = inbound.chat_id();
    let reply = state.orchestrator.handle_turn(&inbound).await;

    match state.sender.send_reply(chat_id, &reply).await {
        Ok(()) => {
            info!(chat_id, "Reply delivered");
            (StatusCode::OK, "OK")
        }
        Err(e) => {
            error!(chat_id, error = %e, "Failed to deliver reply");
            (StatusCode::INTERNAL_SERVER_ERROR, ERROR_MARKER)
        }
    }
}
