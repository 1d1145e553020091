//! # Error Types Module
//!
//! Structured error types for the order-taking flow: committing drafts,
//! calling the assistant oracle, talking to the stores and delivering replies.

/// Failures of the order commit transaction
#[derive(Debug, Clone, PartialEq)]
pub enum CommitError {
    /// The draft has no products and can never be committed
    EmptyDraft,
    /// Connection or transaction infrastructure failure
    StoreUnavailable(String),
    /// A product did not have enough stock left for the requested quantity
    InsufficientStock { product_id: i32, requested: i32 },
    /// Any other constraint violation raised while writing the order
    Integrity(String),
}

impl std::fmt::Display for CommitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitError::EmptyDraft => write!(f, "Commit error: draft has no products"),
            CommitError::StoreUnavailable(msg) => write!(f, "Store unavailable: {msg}"),
            CommitError::InsufficientStock {
                product_id,
                requested,
            } => write!(
                f,
                "Insufficient stock: product {product_id} cannot supply {requested} units"
            ),
            CommitError::Integrity(msg) => write!(f, "Integrity error: {msg}"),
        }
    }
}

impl std::error::Error for CommitError {}

impl From<sqlx::Error> for CommitError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => CommitError::Integrity(db_err.to_string()),
            other => CommitError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Failures of the external text-generation service
#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    /// Transport level failure (connection refused, TLS, ...)
    Http(String),
    /// The service answered with a non-success status
    Api(String),
    /// The service answered but the payload had no usable text
    InvalidResponse(String),
    /// No answer within the configured number of seconds
    Timeout(u64),
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Http(msg) => write!(f, "Oracle HTTP error: {msg}"),
            OracleError::Api(msg) => write!(f, "Oracle API error: {msg}"),
            OracleError::InvalidResponse(msg) => write!(f, "Oracle invalid response: {msg}"),
            OracleError::Timeout(secs) => write!(f, "Oracle timeout after {secs}s"),
        }
    }
}

impl std::error::Error for OracleError {}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Http(err.to_string())
    }
}

/// Conversation and catalog store failures
#[derive(Debug, Clone, PartialEq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError(format!("{err:#}"))
    }
}

/// The chat transport refused or never received an outbound reply
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryError(pub String);

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Delivery error: {}", self.0)
    }
}

impl std::error::Error for DeliveryError {}
