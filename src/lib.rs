//! # Order Assistant
//!
//! A Telegram chat assistant that takes customer orders for a small shop.
//! Replies come from a text-generation service; when the customer confirms,
//! the order and its stock decrements are committed in one transaction.

pub mod api;
pub mod bot;
pub mod catalog;
pub mod config;
pub mod confirmation;
pub mod db;
pub mod draft;
pub mod errors;
pub mod intent;
pub mod localization;
pub mod models;
pub mod oracle;
pub mod order_block;
pub mod prompt;
pub mod seed;
pub mod server;
pub mod store;
