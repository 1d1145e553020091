use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;
use tracing::{debug, info, warn};

use crate::draft::OrderDraft;
use crate::errors::CommitError;
use crate::models::{
    Category, ChatIdentity, Order, OrderItem, Product, Store, StoredMessage, User,
    LOW_STOCK_THRESHOLD,
};

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    let statements = [
        (
            "users",
            "CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                name TEXT
            )",
        ),
        (
            "store",
            "CREATE TABLE IF NOT EXISTS store (
                id SERIAL PRIMARY KEY,
                user_id INTEGER REFERENCES users(id),
                name TEXT NOT NULL,
                address TEXT
            )",
        ),
        (
            "products",
            "CREATE TABLE IF NOT EXISTS products (
                id SERIAL PRIMARY KEY,
                store_id INTEGER REFERENCES store(id),
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                price TEXT NOT NULL,
                stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
                status TEXT NOT NULL DEFAULT 'Active'
            )",
        ),
        (
            "categories",
            "CREATE TABLE IF NOT EXISTS categories (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 0,
                color TEXT
            )",
        ),
        (
            "orders",
            "CREATE TABLE IF NOT EXISTS orders (
                id SERIAL PRIMARY KEY,
                store_id INTEGER REFERENCES store(id),
                customer_name TEXT,
                delivery_address TEXT,
                payment_method TEXT,
                delivery_date TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        ),
        (
            "order_items",
            "CREATE TABLE IF NOT EXISTS order_items (
                id SERIAL PRIMARY KEY,
                order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id INTEGER NOT NULL REFERENCES products(id),
                quantity INTEGER NOT NULL CHECK (quantity > 0)
            )",
        ),
        (
            "telegram_user",
            "CREATE TABLE IF NOT EXISTS telegram_user (
                telegram_id BIGINT PRIMARY KEY,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                last_interaction TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        ),
        (
            "messages",
            "CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                telegram_id BIGINT NOT NULL REFERENCES telegram_user(telegram_id),
                message TEXT NOT NULL,
                is_bot BOOLEAN NOT NULL DEFAULT FALSE,
                create_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        ),
        (
            "messages index",
            "CREATE INDEX IF NOT EXISTS messages_telegram_id_idx
                ON messages (telegram_id, create_at DESC, id DESC)",
        ),
    ];

    for (name, sql) in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create {name}"))?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}

/// Create the chat identity on first contact, refresh it afterwards.
///
/// Missing attributes keep their stored values.
pub async fn get_or_create_telegram_user(pool: &PgPool, identity: &ChatIdentity) -> Result<i64> {
    debug!(chat_id = identity.chat_id, "Upserting telegram user");

    let telegram_id: i64 = sqlx::query_scalar(
        "INSERT INTO telegram_user (telegram_id, username, first_name, last_name, last_interaction)
         VALUES ($1, $2, $3, $4, NOW())
         ON CONFLICT (telegram_id) DO UPDATE SET
             last_interaction = NOW(),
             username = COALESCE(EXCLUDED.username, telegram_user.username),
             first_name = COALESCE(EXCLUDED.first_name, telegram_user.first_name),
             last_name = COALESCE(EXCLUDED.last_name, telegram_user.last_name)
         RETURNING telegram_id",
    )
    .bind(identity.chat_id)
    .bind(&identity.username)
    .bind(&identity.first_name)
    .bind(&identity.last_name)
    .fetch_one(pool)
    .await
    .context("Failed to upsert telegram user")?;

    Ok(telegram_id)
}

/// Read a chat identity back
pub async fn read_telegram_user(pool: &PgPool, telegram_id: i64) -> Result<Option<ChatIdentity>> {
    let identity = sqlx::query_as::<_, ChatIdentity>(
        "SELECT telegram_id AS chat_id, username, first_name, last_name, last_interaction
         FROM telegram_user WHERE telegram_id = $1",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read telegram user")?;

    Ok(identity)
}

/// Append one message to the conversation log
pub async fn save_message(
    pool: &PgPool,
    telegram_id: i64,
    message: &str,
    is_bot: bool,
) -> Result<()> {
    sqlx::query("INSERT INTO messages (telegram_id, message, is_bot) VALUES ($1, $2, $3)")
        .bind(telegram_id)
        .bind(message)
        .bind(is_bot)
        .execute(pool)
        .await
        .context("Failed to save message")?;

    Ok(())
}

/// The `limit` most recent messages of a chat, newest first
pub async fn get_message_history(
    pool: &PgPool,
    telegram_id: i64,
    limit: i64,
) -> Result<Vec<StoredMessage>> {
    let messages = sqlx::query_as::<_, StoredMessage>(
        "SELECT telegram_id AS chat_id, message AS text, is_bot AS is_from_assistant,
                create_at AS created_at
         FROM messages
         WHERE telegram_id = $1
         ORDER BY create_at DESC, id DESC
         LIMIT $2",
    )
    .bind(telegram_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to read message history")?;

    Ok(messages)
}

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, status FROM products ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list products")?;

    Ok(products)
}

pub async fn read_product(pool: &PgPool, product_id: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, status FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read product")?;

    Ok(product)
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT name, quantity, color FROM categories ORDER BY id")
            .fetch_all(pool)
            .await
            .context("Failed to list categories")?;

    Ok(categories)
}

/// Persist a draft as a pending order and take its units out of stock.
///
/// Runs in one transaction: either the order, all its line items and every
/// stock decrement become visible together, or nothing does.
pub async fn register_order(pool: &PgPool, draft: &OrderDraft) -> Result<i32, CommitError> {
    if !draft.is_committable() {
        return Err(CommitError::EmptyDraft);
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| CommitError::StoreUnavailable(e.to_string()))?;

    match write_order(&mut tx, draft).await {
        Ok(order_id) => {
            tx.commit()
                .await
                .map_err(|e| CommitError::StoreUnavailable(e.to_string()))?;
            info!(order_id, lines = draft.products.len(), "Order committed");
            Ok(order_id)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(
                    error = %rollback_err,
                    "Rollback failed, connection will discard the transaction"
                );
            }
            warn!(error = %e, "Order commit rolled back");
            Err(e)
        }
    }
}

async fn write_order(
    tx: &mut Transaction<'_, Postgres>,
    draft: &OrderDraft,
) -> Result<i32, CommitError> {
    let order_id: i32 = sqlx::query_scalar(
        "INSERT INTO orders (customer_name, delivery_address, payment_method, delivery_date, status)
         VALUES (NULLIF($1, ''), NULLIF($2, ''), NULLIF($3, ''), NULLIF($4, ''), 'pending')
         RETURNING id",
    )
    .bind(&draft.customer_name)
    .bind(&draft.delivery_address)
    .bind(&draft.payment_method)
    .bind(&draft.delivery_date)
    .fetch_one(&mut **tx)
    .await?;

    for line in &draft.products {
        sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut **tx)
            .await?;

        // The WHERE clause re-checks stock under the row lock taken by UPDATE
        let updated = sqlx::query(
            "UPDATE products
             SET stock = stock - $1,
                 status = CASE
                     WHEN stock - $1 = 0 THEN 'Out of stock'
                     WHEN stock - $1 <= $3 THEN 'Low stock'
                     ELSE status
                 END
             WHERE id = $2 AND stock >= $1",
        )
        .bind(line.quantity)
        .bind(line.product_id)
        .bind(LOW_STOCK_THRESHOLD)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CommitError::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
            });
        }
    }

    Ok(order_id)
}

pub async fn read_order(pool: &PgPool, order_id: i32) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT id, customer_name, delivery_address, payment_method, delivery_date, status
         FROM orders WHERE id = $1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read order")?;

    Ok(order)
}

pub async fn list_order_items(pool: &PgPool, order_id: i32) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT order_id, product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await
    .context("Failed to list order items")?;

    Ok(items)
}

// Back-office CRUD used by the REST surface

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT id, email, name FROM users ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    Ok(users)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT id, email, name FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to find user by email")?;

    Ok(user)
}

/// Stored password of a user, compared as an opaque string by the caller
pub async fn get_user_password(pool: &PgPool, email: &str) -> Result<Option<String>> {
    let password = sqlx::query_scalar::<_, String>("SELECT password FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to read user password")?;

    Ok(password)
}

pub async fn create_user(pool: &PgPool, email: &str, password: &str, name: &str) -> Result<User> {
    info!(email = email, "Creating user");

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, name) VALUES ($1, $2, $3) RETURNING id, email, name",
    )
    .bind(email)
    .bind(password)
    .bind(name)
    .fetch_one(pool)
    .await
    .context("Failed to create user")?;

    Ok(user)
}

pub async fn update_user(
    pool: &PgPool,
    user_id: i32,
    email: &str,
    name: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET email = $1, name = $2 WHERE id = $3 RETURNING id, email, name",
    )
    .bind(email)
    .bind(name)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update user")?;

    Ok(user)
}

pub async fn get_store_by_user(pool: &PgPool, user_id: i32) -> Result<Option<Store>> {
    let store = sqlx::query_as::<_, Store>(
        "SELECT id, user_id, name, address FROM store WHERE user_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read store")?;

    Ok(store)
}

pub async fn update_store(
    pool: &PgPool,
    store_id: i32,
    name: &str,
    address: &str,
) -> Result<Option<Store>> {
    let store = sqlx::query_as::<_, Store>(
        "UPDATE store SET name = $1, address = $2 WHERE id = $3
         RETURNING id, user_id, name, address",
    )
    .bind(name)
    .bind(address)
    .bind(store_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update store")?;

    Ok(store)
}

pub async fn list_store_products(pool: &PgPool, store_id: i32) -> Result<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, status FROM products
         WHERE store_id = $1 ORDER BY id",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
    .context("Failed to list store products")?;

    Ok(products)
}

pub async fn list_store_orders(pool: &PgPool, store_id: i32) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT id, customer_name, delivery_address, payment_method, delivery_date, status
         FROM orders WHERE store_id = $1 ORDER BY id",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await
    .context("Failed to list store orders")?;

    Ok(orders)
}

pub async fn update_store_product(
    pool: &PgPool,
    store_id: i32,
    product_id: i32,
    name: &str,
    price: &str,
    stock: i32,
) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $1, price = $2, stock = $3
         WHERE id = $4 AND store_id = $5
         RETURNING id, name, category, price, stock, status",
    )
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(product_id)
    .bind(store_id)
    .fetch_optional(pool)
    .await
    .context("Failed to update store product")?;

    Ok(product)
}
