//! Shared collaborators for the turn and webhook tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use order_assistant::bot::{ReplySender, TurnOrchestrator};
use order_assistant::catalog::CatalogReader;
use order_assistant::config::TurnConfig;
use order_assistant::confirmation::ConfirmationEngine;
use order_assistant::draft::{DraftBook, OrderDraft};
use order_assistant::errors::{DeliveryError, OracleError};
use order_assistant::intent::KeywordClassifier;
use order_assistant::models::{ChatIdentity, Product};
use order_assistant::oracle::AssistantOracle;
use order_assistant::seed::default_categories;
use order_assistant::store::memory::MemoryStore;

pub const ANA_CHAT: i64 = 4242;

/// Oracle answering from a script; an exhausted script repeats the fallback reply
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::new(vec![Err(OracleError::Http("connection refused".to_string()))])
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying("demasiado tarde")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl AssistantOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies
                .front()
                .cloned()
                .unwrap_or_else(|| Ok("¡Hola!".to_string()))
        }
    }
}

/// Sender that records deliveries and can be told to fail
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn send_reply(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError("Bad Gateway".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

pub fn assistant_product(stock: i32) -> Product {
    Product {
        id: 7,
        name: "AI Virtual Assistant".to_string(),
        category: "Assistants".to_string(),
        price: "€149.99".to_string(),
        stock,
        status: "Active".to_string(),
    }
}

pub fn store_with_stock(stock: i32) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_catalog(
        vec![assistant_product(stock)],
        default_categories(),
    ))
}

pub fn ana_draft() -> OrderDraft {
    let mut draft = OrderDraft {
        customer_name: "Ana".to_string(),
        delivery_address: "Calle 5".to_string(),
        payment_method: "cash".to_string(),
        delivery_date: "2024-06-01".to_string(),
        ..Default::default()
    };
    draft.add_product(7, "AI Virtual Assistant", 2);
    draft
}

pub fn ana_identity() -> ChatIdentity {
    ChatIdentity {
        chat_id: ANA_CHAT,
        username: Some("ana".to_string()),
        first_name: Some("Ana".to_string()),
        last_name: None,
        last_interaction: None,
    }
}

pub fn orchestrator(
    store: Arc<MemoryStore>,
    oracle: Arc<ScriptedOracle>,
    config: TurnConfig,
) -> TurnOrchestrator {
    let engine = ConfirmationEngine::new(
        store.clone(),
        Arc::new(KeywordClassifier::new(
            &config.confirm_keyword,
            &config.cancel_keyword,
        )),
        Arc::new(DraftBook::new()),
    );
    TurnOrchestrator::new(
        store.clone(),
        CatalogReader::new(store),
        oracle,
        engine,
        config,
    )
}
