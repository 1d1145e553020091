//! Order draft module holding the order being assembled across conversation turns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// One product mentioned by the customer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: i32,
    pub name: String,
    pub quantity: i32,
}

/// The not-yet-persisted order of one chat
///
/// Empty strings mean "not collected yet".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub products: Vec<DraftLine>,
    pub customer_name: String,
    pub delivery_address: String,
    pub payment_method: String,
    pub delivery_date: String,
}

impl OrderDraft {
    /// A draft without products can never be committed
    pub fn is_committable(&self) -> bool {
        !self.products.is_empty()
    }

    /// Add a product, merging quantities when it was already mentioned.
    ///
    /// Lines keep the order of first mention; non-positive quantities are ignored.
    /// A merge that would overflow leaves the existing line unchanged.
    pub fn add_product(&mut self, product_id: i32, name: &str, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        match self
            .products
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => match line.quantity.checked_add(quantity) {
                Some(merged) => line.quantity = merged,
                None => warn!(
                    product_id,
                    current = line.quantity,
                    added = quantity,
                    "Quantity overflow, keeping the existing line"
                ),
            },
            None => self.products.push(DraftLine {
                product_id,
                name: name.to_string(),
                quantity,
            }),
        }
    }

    /// Replace the product list, merging duplicates
    pub fn set_products(&mut self, lines: impl IntoIterator<Item = DraftLine>) {
        self.products.clear();
        for line in lines {
            self.add_product(line.product_id, &line.name, line.quantity);
        }
    }

    pub fn total_units(&self) -> i32 {
        self.products
            .iter()
            .fold(0i32, |total, line| total.saturating_add(line.quantity))
    }
}

/// Per-chat drafts, keyed by the transport's chat identifier
///
/// Every access goes through the internal mutex and works on whole values,
/// so readers never observe a half-reset draft.
#[derive(Debug, Default)]
pub struct DraftBook {
    drafts: Mutex<HashMap<i64, OrderDraft>>,
}

impl DraftBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the chat's current draft (empty if none was started)
    pub fn current(&self, chat_id: i64) -> OrderDraft {
        let drafts = self.lock();
        drafts.get(&chat_id).cloned().unwrap_or_default()
    }

    /// Mutate the chat's draft in place and return the resulting snapshot
    pub fn update<F>(&self, chat_id: i64, f: F) -> OrderDraft
    where
        F: FnOnce(&mut OrderDraft),
    {
        let mut drafts = self.lock();
        let draft = drafts.entry(chat_id).or_default();
        f(draft);
        draft.clone()
    }

    /// Forget the chat's draft; the next read starts from an empty one
    pub fn reset(&self, chat_id: i64) {
        let mut drafts = self.lock();
        drafts.remove(&chat_id);
    }

    /// Number of chats with a non-empty draft
    pub fn active_count(&self) -> usize {
        let drafts = self.lock();
        drafts.values().filter(|d| **d != OrderDraft::default()).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, OrderDraft>> {
        // Mutations touch one owned value each, so a poisoned map is still consistent
        self.drafts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_product_merges_duplicates() {
        let mut draft = OrderDraft::default();
        draft.add_product(7, "AI Virtual Assistant", 2);
        draft.add_product(3, "Content Generator", 1);
        draft.add_product(7, "AI Virtual Assistant", 1);

        assert_eq!(draft.products.len(), 2);
        assert_eq!(draft.products[0].product_id, 7);
        assert_eq!(draft.products[0].quantity, 3);
        assert_eq!(draft.products[1].product_id, 3);
        assert_eq!(draft.total_units(), 4);
    }

    #[test]
    fn test_add_product_ignores_non_positive_quantities() {
        let mut draft = OrderDraft::default();
        draft.add_product(7, "AI Virtual Assistant", 0);
        draft.add_product(7, "AI Virtual Assistant", -3);
        assert!(!draft.is_committable());
    }

    #[test]
    fn test_reset_is_per_chat() {
        let book = DraftBook::new();
        book.update(1, |d| d.add_product(7, "AI Virtual Assistant", 2));
        book.update(2, |d| {
            d.add_product(3, "Content Generator", 1);
            d.customer_name = "Luis".to_string();
        });

        book.reset(1);

        assert_eq!(book.current(1), OrderDraft::default());
        assert_eq!(book.current(2).customer_name, "Luis");
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn test_reset_drops_the_entry() {
        let book = DraftBook::new();
        for chat_id in 0..100 {
            book.update(chat_id, |d| d.add_product(7, "AI Virtual Assistant", 1));
        }
        for chat_id in 0..100 {
            book.reset(chat_id);
        }

        assert_eq!(book.lock().len(), 0);
        assert_eq!(book.current(42), OrderDraft::default());
    }

    #[test]
    fn test_merge_overflow_keeps_existing_quantity() {
        let mut draft = OrderDraft::default();
        draft.add_product(7, "AI Virtual Assistant", i32::MAX);
        draft.add_product(7, "AI Virtual Assistant", 1);

        assert_eq!(draft.products.len(), 1);
        assert_eq!(draft.products[0].quantity, i32::MAX);

        draft.add_product(3, "Content Generator", 5);
        assert_eq!(draft.total_units(), i32::MAX);
    }

    #[test]
    fn test_duplicate_lines_that_overflow_do_not_go_negative() {
        let mut draft = OrderDraft::default();
        draft.set_products(vec![
            DraftLine {
                product_id: 7,
                name: "AI Virtual Assistant".to_string(),
                quantity: i32::MAX - 1,
            },
            DraftLine {
                product_id: 7,
                name: "AI Virtual Assistant".to_string(),
                quantity: 10,
            },
        ]);

        assert_eq!(draft.products[0].quantity, i32::MAX - 1);
        assert!(draft.products.iter().all(|line| line.quantity > 0));
    }

    #[test]
    fn test_current_of_unknown_chat_is_empty() {
        let book = DraftBook::new();
        assert_eq!(book.current(99), OrderDraft::default());
    }
}
