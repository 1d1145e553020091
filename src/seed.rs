//! Built-in catalog used to seed an empty database and as the degraded-mode
//! catalog when the store cannot be read.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use tracing::info;

use crate::models::{Category, Product};

const DEFAULT_PRODUCTS: &[(&str, &str, &str, i32, &str)] = &[
    ("Advanced Data Analysis", "Analysis", "€299.99", 15, "Active"),
    ("AI Virtual Assistant", "Assistants", "€149.99", 28, "Active"),
    ("Content Generator", "Content", "€199.99", 10, "Active"),
    ("Image Recognition", "Vision", "€249.99", 5, "Low stock"),
    ("Business Chatbot", "Assistants", "€399.99", 0, "Out of stock"),
    ("Predictive Analysis", "Analysis", "€349.99", 12, "Active"),
];

const DEFAULT_CATEGORIES: &[(&str, i32, &str)] = &[
    ("Analysis", 2, "bg-lunexa-blue"),
    ("Assistants", 2, "bg-lunexa-blue"),
    ("Content", 1, "bg-lunexa-blue"),
    ("Vision", 1, "bg-lunexa-blue"),
];

/// Seed products, numbered in insertion order starting at 1
pub fn default_products() -> Vec<Product> {
    DEFAULT_PRODUCTS
        .iter()
        .enumerate()
        .map(|(i, (name, category, price, stock, status))| Product {
            id: i as i32 + 1,
            name: name.to_string(),
            category: category.to_string(),
            price: price.to_string(),
            stock: *stock,
            status: status.to_string(),
        })
        .collect()
}

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, quantity, color)| Category {
            name: name.to_string(),
            quantity: *quantity,
            color: Some(color.to_string()),
        })
        .collect()
}

/// Insert the built-in catalog in a single transaction
pub async fn seed_database(pool: &PgPool) -> Result<usize> {
    info!("Seeding database with the built-in catalog");

    let mut tx = pool.begin().await.context("Failed to begin seed transaction")?;

    let products = default_products();
    for product in &products {
        sqlx::query(
            "INSERT INTO products (name, category, price, stock, status) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.price)
        .bind(product.stock)
        .bind(&product.status)
        .execute(&mut *tx)
        .await
        .context("Failed to insert seed product")?;
    }

    for category in default_categories() {
        sqlx::query("INSERT INTO categories (name, quantity, color) VALUES ($1, $2, $3)")
            .bind(&category.name)
            .bind(category.quantity)
            .bind(&category.color)
            .execute(&mut *tx)
            .await
            .context("Failed to insert seed category")?;
    }

    tx.commit().await.context("Failed to commit seed transaction")?;

    info!(products = products.len(), "Database seeded successfully");
    Ok(products.len())
}
