//! Transaction domain entity.
//! Framework-agnostic representation of a wallet ledger entry.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Hours after `created_at` during which a SUCCESS transaction may still be reversed.
pub const REVERSAL_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Topup,
    Purchase,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Topup => "TOPUP",
            TransactionType::Purchase => "PURCHASE",
            TransactionType::Refund => "REFUND",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOPUP" => Ok(TransactionType::Topup),
            "PURCHASE" => Ok(TransactionType::Purchase),
            "REFUND" => Ok(TransactionType::Refund),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Reversed => "REVERSED",
        }
    }

    /// Fixed status lifecycle. Nothing re-enters PENDING and no status
    /// transitions to itself.
    pub fn can_transition_to(self, requested: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, requested),
            (Pending, Success) | (Pending, Failed) | (Failed, Success) | (Success, Reversed)
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            "REVERSED" => Ok(TransactionStatus::Reversed),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Ledger entry. `id` is store-assigned; `amount`, `transaction_type`,
/// `user_id` and `reference` are immutable once the row exists.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: BigDecimal,
    pub transaction_type: TransactionType,
    pub transaction_status: TransactionStatus,
    pub reference: String,
    pub description: String,
    pub additional_info: String,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: i64,
        amount: BigDecimal,
        transaction_type: TransactionType,
        transaction_status: TransactionStatus,
        reference: String,
        description: String,
        additional_info: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            amount,
            transaction_type,
            transaction_status,
            reference,
            description,
            additional_info,
            created_at: now,
            updated_at: now,
        }
    }

    /// Last instant at which a reversal is still accepted.
    pub fn reversal_deadline(&self) -> DateTime<Utc> {
        self.created_at + Duration::hours(REVERSAL_WINDOW_HOURS)
    }
}

/// Caller identity resolved by the token validator. `token` carries the raw
/// credential so it can be passed through to the wallet gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenData {
    pub user_id: i64,
    pub username: String,
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub token: String,
}

/// Opaque unique reference for a new ledger row.
pub fn generate_reference() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}
