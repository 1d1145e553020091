//! In-process store with failure injection.
//!
//! Commits are staged on a copy of the whole state and swapped in only when
//! every step succeeded, which gives the same all-or-nothing visibility as
//! the Postgres transaction.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{CatalogStore, ConversationStore, OrderStore};
use crate::draft::OrderDraft;
use crate::errors::{CommitError, StoreError};
use crate::models::{
    stock_status, Category, ChatIdentity, Order, OrderItem, Product, StoredMessage,
};
use crate::seed::{default_categories, default_products};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: Vec<Product>,
    categories: Vec<Category>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    identities: HashMap<i64, ChatIdentity>,
    messages: Vec<StoredMessage>,
    next_order_id: i32,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
    catalog_unavailable: AtomicBool,
    fail_after_order_insert: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(products: Vec<Product>, categories: Vec<Category>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.products = products;
            state.categories = categories;
        }
        store
    }

    /// Store pre-filled with the built-in seed catalog
    pub fn seeded() -> Self {
        Self::with_catalog(default_products(), default_categories())
    }

    /// Make every operation fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only catalog reads fail
    pub fn set_catalog_unavailable(&self, unavailable: bool) {
        self.catalog_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Abort commits right after the order row was staged
    pub fn set_fail_after_order_insert(&self, fail: bool) {
        self.fail_after_order_insert.store(fail, Ordering::SeqCst);
    }

    pub fn product(&self, product_id: i32) -> Option<Product> {
        self.lock()
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lock().order_items.clone()
    }

    /// Every logged message of a chat, oldest first
    pub fn messages(&self, chat_id: i64) -> Vec<StoredMessage> {
        self.lock()
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn identity(&self, chat_id: i64) -> Option<ChatIdentity> {
        self.lock().identities.get(&chat_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn check_catalog_available(&self) -> Result<(), StoreError> {
        self.check_available()?;
        if self.catalog_unavailable.load(Ordering::SeqCst) {
            return Err(StoreError("catalog marked unavailable".to_string()));
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn upsert_identity(&self, identity: &ChatIdentity) -> Result<(), StoreError> {
        self.check_available()?;
        let now = Utc::now();
        let mut state = self.lock();
        state
            .identities
            .entry(identity.chat_id)
            .and_modify(|known| {
                known.last_interaction = Some(now);
                if identity.username.is_some() {
                    known.username = identity.username.clone();
                }
                if identity.first_name.is_some() {
                    known.first_name = identity.first_name.clone();
                }
                if identity.last_name.is_some() {
                    known.last_name = identity.last_name.clone();
                }
            })
            .or_insert_with(|| ChatIdentity {
                last_interaction: Some(now),
                ..identity.clone()
            });
        Ok(())
    }

    async fn append_message(
        &self,
        chat_id: i64,
        text: &str,
        is_from_assistant: bool,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.lock();
        if !state.identities.contains_key(&chat_id) {
            return Err(StoreError(format!("unknown chat identity {chat_id}")));
        }
        state.messages.push(StoredMessage {
            chat_id,
            text: text.to_string(),
            is_from_assistant,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        chat_id: i64,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        self.check_available()?;
        let state = self.lock();
        Ok(state
            .messages
            .iter()
            .rev()
            .filter(|m| m.chat_id == chat_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.check_catalog_available()?;
        Ok(self.lock().products.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.check_catalog_available()?;
        Ok(self.lock().categories.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn commit_order(&self, draft: &OrderDraft) -> Result<i32, CommitError> {
        if !draft.is_committable() {
            return Err(CommitError::EmptyDraft);
        }
        self.check_available()
            .map_err(|e| CommitError::StoreUnavailable(e.0))?;

        let mut state = self.lock();
        let mut staged = state.clone();

        staged.next_order_id += 1;
        let order_id = staged.next_order_id;
        staged.orders.push(Order {
            id: order_id,
            customer_name: non_empty(&draft.customer_name),
            delivery_address: non_empty(&draft.delivery_address),
            payment_method: non_empty(&draft.payment_method),
            delivery_date: non_empty(&draft.delivery_date),
            status: "pending".to_string(),
        });

        if self.fail_after_order_insert.load(Ordering::SeqCst) {
            return Err(CommitError::Integrity(
                "injected failure after order insert".to_string(),
            ));
        }

        for line in &draft.products {
            staged.order_items.push(OrderItem {
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
            });

            let product = staged
                .products
                .iter_mut()
                .find(|p| p.id == line.product_id)
                .ok_or_else(|| {
                    CommitError::Integrity(format!("product {} does not exist", line.product_id))
                })?;

            if product.stock < line.quantity {
                return Err(CommitError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                });
            }
            product.stock -= line.quantity;
            product.status = stock_status(product.stock, &product.status);
        }

        *state = staged;
        Ok(order_id)
    }
}
