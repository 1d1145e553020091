//! Rows read from and written to the relational store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remaining stock at or below which a product is flagged as low
pub const LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: String,
    pub stock: i32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub name: String,
    pub quantity: i32,
    pub color: Option<String>,
}

/// Status label a product gets after its stock dropped to `remaining`
pub fn stock_status(remaining: i32, current: &str) -> String {
    if remaining == 0 {
        "Out of stock".to_string()
    } else if remaining <= LOW_STOCK_THRESHOLD {
        "Low stock".to_string()
    } else {
        current.to_string()
    }
}

/// Where a catalog snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CatalogOrigin {
    Live,
    /// The store could not be read; the built-in seed data is used instead
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub origin: CatalogOrigin,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Case-insensitive product lookup by name
    pub fn find_product(&self, name: &str) -> Option<&Product> {
        let wanted = name.trim().to_lowercase();
        self.products
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
    }
}

/// A conversation participant as known by the chat transport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatIdentity {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Set by the store on every upsert
    pub last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredMessage {
    pub chat_id: i64,
    pub text: String,
    pub is_from_assistant: bool,
    pub created_at: DateTime<Utc>,
}

/// Back-office account; the password column never leaves the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub customer_name: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_labels() {
        assert_eq!(stock_status(0, "Active"), "Out of stock");
        assert_eq!(stock_status(3, "Active"), "Low stock");
        assert_eq!(stock_status(26, "Active"), "Active");
    }

    #[test]
    fn test_find_product_ignores_case() {
        let catalog = Catalog {
            origin: CatalogOrigin::Live,
            products: vec![Product {
                id: 7,
                name: "AI Virtual Assistant".to_string(),
                category: "Assistants".to_string(),
                price: "€149.99".to_string(),
                stock: 28,
                status: "Active".to_string(),
            }],
            categories: vec![],
        };
        assert_eq!(catalog.find_product(" ai virtual assistant ").map(|p| p.id), Some(7));
        assert!(catalog.find_product("Image Recognition").is_none());
    }
}
