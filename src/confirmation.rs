//! # Confirmation Engine
//!
//! Decides from the customer's latest message whether the chat's draft must
//! be committed (or cancelled) and performs the commit through an
//! [`OrderStore`].
//!
//! ## Guarantees
//!
//! - A draft without products never produces an order
//! - The draft is reset only after the store reported a successful commit
//! - On failure the draft is left exactly as it was; nothing is retried

use std::sync::Arc;
use tracing::{error, info};

use crate::draft::{DraftBook, OrderDraft};
use crate::errors::CommitError;
use crate::intent::{Intent, IntentClassifier};
use crate::store::OrderStore;

/// Result of running the engine on one message
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    /// The message neither confirmed nor cancelled anything
    NotTriggered,
    /// The customer cancelled a non-empty draft; it was reset
    Cancelled,
    /// The draft was persisted as a new order
    Committed { order_id: i32 },
    /// The commit was attempted and rolled back
    Failed(CommitError),
}

pub struct ConfirmationEngine {
    orders: Arc<dyn OrderStore>,
    classifier: Arc<dyn IntentClassifier>,
    drafts: Arc<DraftBook>,
}

impl ConfirmationEngine {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        classifier: Arc<dyn IntentClassifier>,
        drafts: Arc<DraftBook>,
    ) -> Self {
        Self {
            orders,
            classifier,
            drafts,
        }
    }

    pub fn drafts(&self) -> &Arc<DraftBook> {
        &self.drafts
    }

    /// Classify `text` against the chat's current draft and act on it
    pub async fn process(&self, chat_id: i64, text: &str) -> ConfirmationOutcome {
        let draft = self.drafts.current(chat_id);

        match self.classifier.detect_intent(text, &draft) {
            Intent::Continue => ConfirmationOutcome::NotTriggered,
            Intent::Cancel if draft == OrderDraft::default() => ConfirmationOutcome::NotTriggered,
            Intent::Cancel => {
                self.drafts.reset(chat_id);
                info!(chat_id, "Draft cancelled by customer");
                ConfirmationOutcome::Cancelled
            }
            Intent::Confirm => match self.commit(chat_id, &draft).await {
                Ok(order_id) => ConfirmationOutcome::Committed { order_id },
                Err(e) => ConfirmationOutcome::Failed(e),
            },
        }
    }

    /// Persist `draft` for `chat_id`, resetting the chat's draft on success
    pub async fn commit(&self, chat_id: i64, draft: &OrderDraft) -> Result<i32, CommitError> {
        if !draft.is_committable() {
            return Err(CommitError::EmptyDraft);
        }

        match self.orders.commit_order(draft).await {
            Ok(order_id) => {
                self.drafts.reset(chat_id);
                info!(
                    chat_id,
                    order_id,
                    lines = draft.products.len(),
                    units = draft.total_units(),
                    "Order registered from chat"
                );
                Ok(order_id)
            }
            Err(e) => {
                error!(chat_id, error = %e, "Order registration failed, draft kept");
                Err(e)
            }
        }
    }
}
