//! Store capabilities consumed by the conversation core.
//!
//! The core only talks to these traits; [`PgStore`] backs them with Postgres
//! and [`memory::MemoryStore`] keeps everything in process.

pub mod memory;

use async_trait::async_trait;
use sqlx::postgres::PgPool;

use crate::db;
use crate::draft::OrderDraft;
use crate::errors::{CommitError, StoreError};
use crate::models::{Category, ChatIdentity, Product, StoredMessage};

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create the identity or refresh its attributes without erasing known values
    async fn upsert_identity(&self, identity: &ChatIdentity) -> Result<(), StoreError>;

    async fn append_message(
        &self,
        chat_id: i64,
        text: &str,
        is_from_assistant: bool,
    ) -> Result<(), StoreError>;

    /// Most recent messages of the chat, newest first
    async fn recent_messages(&self, chat_id: i64, limit: i64)
        -> Result<Vec<StoredMessage>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically persist the draft as a pending order and decrement stock.
    ///
    /// Returns the new order id.
    async fn commit_order(&self, draft: &OrderDraft) -> Result<i32, CommitError>;
}

/// Postgres-backed implementation of every store capability
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn upsert_identity(&self, identity: &ChatIdentity) -> Result<(), StoreError> {
        db::get_or_create_telegram_user(&self.pool, identity).await?;
        Ok(())
    }

    async fn append_message(
        &self,
        chat_id: i64,
        text: &str,
        is_from_assistant: bool,
    ) -> Result<(), StoreError> {
        db::save_message(&self.pool, chat_id, text, is_from_assistant).await?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        chat_id: i64,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        Ok(db::get_message_history(&self.pool, chat_id, limit).await?)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(db::list_products(&self.pool).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(db::list_categories(&self.pool).await?)
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn commit_order(&self, draft: &OrderDraft) -> Result<i32, CommitError> {
        db::register_order(&self.pool, draft).await
    }
}
