//! Capability traits consumed by the transaction service.
//! Production implementations live in `adapters` (store) and `clients`
//! (wallet/notification gateways); tests swap in doubles.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{Transaction, TransactionStatus};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no transaction matches {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence boundary for ledger rows. Rows are never deleted.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction>;

    /// When `include_refund` is false, rows of type REFUND never match.
    async fn find_by_reference(
        &self,
        reference: &str,
        include_refund: bool,
    ) -> RepositoryResult<Transaction>;

    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        additional_info: &str,
    ) -> RepositoryResult<()>;

    /// All rows owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Transaction>>;
}

/// Balance change request. `reference` doubles as the idempotency key on the
/// wallet side; repeated calls with the same reference must not double-apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceMutation {
    pub amount: BigDecimal,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceReceipt {
    pub message: String,
    #[serde(default)]
    pub balance: Option<BigDecimal>,
}

#[derive(Debug, Error)]
pub enum WalletGatewayError {
    #[error("wallet request failed: {0}")]
    Request(String),

    #[error("wallet rejected request: {0}")]
    Rejected(String),

    #[error("wallet circuit breaker open")]
    CircuitOpen,
}

/// External wallet service holding the actual balances.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    async fn credit(
        &self,
        token: &str,
        req: &BalanceMutation,
    ) -> Result<BalanceReceipt, WalletGatewayError>;

    async fn debit(
        &self,
        token: &str,
        req: &BalanceMutation,
    ) -> Result<BalanceReceipt, WalletGatewayError>;
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification request failed: {0}")]
    Request(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Templated message delivery. The service treats delivery as best effort.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        placeholders: HashMap<String, String>,
    ) -> Result<(), NotificationError>;
}
