//! Turn orchestrator: drives one request/response cycle per inbound message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogReader;
use crate::config::TurnConfig;
use crate::confirmation::{ConfirmationEngine, ConfirmationOutcome};
use crate::errors::OracleError;
use crate::localization::t_lang;
use crate::models::ChatIdentity;
use crate::oracle::AssistantOracle;
use crate::order_block::{apply_update, split_reply};
use crate::prompt::compose_prompt;
use crate::store::ConversationStore;

use super::ui_builder::{append_notice, format_confirmation, format_draft_summary};

/// A validated inbound chat message
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub identity: ChatIdentity,
    pub text: String,
    pub language_code: Option<String>,
}

impl InboundMessage {
    pub fn chat_id(&self) -> i64 {
        self.identity.chat_id
    }
}

type ChatLocks = HashMap<i64, Arc<tokio::sync::Mutex<()>>>;

pub struct TurnOrchestrator {
    conversations: Arc<dyn ConversationStore>,
    catalog: CatalogReader,
    oracle: Arc<dyn AssistantOracle>,
    engine: ConfirmationEngine,
    config: TurnConfig,
    chat_locks: Mutex<ChatLocks>,
}

impl TurnOrchestrator {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        catalog: CatalogReader,
        oracle: Arc<dyn AssistantOracle>,
        engine: ConfirmationEngine,
        config: TurnConfig,
    ) -> Self {
        Self {
            conversations,
            catalog,
            oracle,
            engine,
            config,
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    /// Run one turn and return the text to deliver.
    ///
    /// Never fails: every failure becomes a user-visible apology.
    pub async fn handle_turn(&self, inbound: &InboundMessage) -> String {
        let chat_id = inbound.chat_id();

        // Turns of one chat run one after another
        let chat_lock = self.chat_lock(chat_id);
        let reply = {
            let _turn = chat_lock.lock().await;
            self.run_turn(inbound).await
        };
        drop(chat_lock);
        self.release_chat_lock(chat_id);

        reply
    }

    /// Chats with a turn running or waiting
    pub fn active_chat_locks(&self) -> usize {
        self.locks().len()
    }

    async fn run_turn(&self, inbound: &InboundMessage) -> String {
        let chat_id = inbound.chat_id();
        let language_code = inbound
            .language_code
            .as_deref()
            .or(Some(self.config.default_language.as_str()));

        info!(chat_id, chars = inbound.text.len(), "Handling chat turn");

        if let Err(e) = self.conversations.upsert_identity(&inbound.identity).await {
            error!(chat_id, error = %e, "Failed to resolve chat identity");
            return t_lang("apology-processing", language_code);
        }

        let catalog = self.catalog.snapshot().await;

        let mut history = match self
            .conversations
            .recent_messages(chat_id, self.config.history_limit)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                warn!(chat_id, error = %e, "History unavailable, continuing without it");
                Vec::new()
            }
        };
        history.reverse();

        let draft = self.engine.drafts().current(chat_id);
        let prompt = compose_prompt(
            &catalog,
            &format_draft_summary(&draft, language_code),
            &history,
            &inbound.text,
        );

        let raw_reply = match self.ask_oracle(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(chat_id, error = %e, "Assistant oracle failed");
                let apology = t_lang("apology-processing", language_code);
                self.log_message(chat_id, &inbound.text, false).await;
                self.log_message(chat_id, &apology, true).await;
                return apology;
            }
        };

        let parsed = split_reply(&raw_reply);

        self.log_message(chat_id, &inbound.text, false).await;
        self.log_message(chat_id, &parsed.text, true).await;

        match self.engine.process(chat_id, &inbound.text).await {
            ConfirmationOutcome::NotTriggered => {
                if let Some(update) = parsed.update {
                    let mut unresolved = Vec::new();
                    let updated = self.engine.drafts().update(chat_id, |d| {
                        unresolved = apply_update(d, &update, &catalog);
                    });
                    if !unresolved.is_empty() {
                        warn!(chat_id, ?unresolved, "Reply named products missing from catalog");
                    }
                    debug!(chat_id, lines = updated.products.len(), "Draft updated from reply");
                }
                parsed.text
            }
            ConfirmationOutcome::Committed { order_id } => {
                let reply = format_confirmation(&parsed.text, order_id, language_code);
                self.log_message(chat_id, &reply, true).await;
                reply
            }
            ConfirmationOutcome::Cancelled => {
                let reply = append_notice(&parsed.text, "order-cancelled", language_code);
                self.log_message(chat_id, &reply, true).await;
                reply
            }
            ConfirmationOutcome::Failed(e) => {
                warn!(chat_id, error = %e, "Confirmation failed, apologizing");
                let reply = append_notice(&parsed.text, "apology-commit", language_code);
                self.log_message(chat_id, &reply, true).await;
                reply
            }
        }
    }

    async fn ask_oracle(&self, prompt: &str) -> Result<String, OracleError> {
        let reply = match timeout(self.config.oracle_timeout, self.oracle.generate(prompt)).await {
            Ok(result) => result?,
            Err(_) => return Err(OracleError::Timeout(self.config.oracle_timeout.as_secs())),
        };

        if split_reply(&reply).text.is_empty() {
            return Err(OracleError::InvalidResponse(
                "Reply had no customer-visible text".to_string(),
            ));
        }
        Ok(reply)
    }

    /// Message log writes never abort a turn
    async fn log_message(&self, chat_id: i64, text: &str, is_from_assistant: bool) {
        if let Err(e) = self
            .conversations
            .append_message(chat_id, text, is_from_assistant)
            .await
        {
            error!(chat_id, is_from_assistant, error = %e, "Failed to log message");
        }
    }

    fn chat_lock(&self, chat_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks();
        Arc::clone(locks.entry(chat_id).or_default())
    }

    /// Drop the chat's lock once no other turn holds or awaits it
    fn release_chat_lock(&self, chat_id: i64) {
        let mut locks = self.locks();
        if locks
            .get(&chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&chat_id);
        }
    }

    fn locks(&self) -> MutexGuard<'_, ChatLocks> {
        self.chat_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
