//! Transaction lifecycle service: creation, status transitions, refunds.
//!
//! Status changes are the delicate part: the balance side effect is selected
//! from `(transaction_type, requested_status)`, sequenced strictly before the
//! status write, and never retried. There is no locking or row versioning
//! across the read-validate-call-write sequence; concurrent status changes on
//! one reference rely on the wallet service deduplicating by reference.

use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{
    generate_reference, TokenData, Transaction, TransactionStatus, TransactionType,
};
use crate::error::AppError;
use crate::ports::{
    BalanceMutation, NotificationGateway, TransactionRepository, WalletGateway,
};

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub amount: BigDecimal,
    pub transaction_type: TransactionType,
    pub description: String,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub reference: String,
    pub transaction_status: TransactionStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Filled from the request path, not the body.
    #[serde(default)]
    pub reference: String,
    pub transaction_status: TransactionStatus,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub reference: String,
    pub description: String,
    #[serde(default)]
    pub additional_info: String,
}

pub struct TransactionService {
    repository: Arc<dyn TransactionRepository>,
    wallet: Arc<dyn WalletGateway>,
    notifications: Arc<dyn NotificationGateway>,
}

impl TransactionService {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        wallet: Arc<dyn WalletGateway>,
        notifications: Arc<dyn NotificationGateway>,
    ) -> Self {
        Self {
            repository,
            wallet,
            notifications,
        }
    }

    /// Creates a new ledger row. Status is always forced to PENDING and the
    /// reference is always system-generated.
    pub async fn create_transaction(
        &self,
        token: &TokenData,
        req: CreateTransactionRequest,
    ) -> Result<CreateTransactionResponse, AppError> {
        if req.amount < BigDecimal::from(0) {
            return Err(AppError::Validation(
                "amount must not be negative".to_string(),
            ));
        }

        parse_info_object(&req.additional_info)?;

        let tx = Transaction::new(
            token.user_id,
            req.amount,
            req.transaction_type,
            TransactionStatus::Pending,
            generate_reference(),
            req.description,
            req.additional_info,
        );

        let created = self
            .repository
            .create(&tx)
            .await
            .map_err(|err| AppError::from_repository("failed to create transaction", err))?;

        Ok(CreateTransactionResponse {
            reference: created.reference,
            transaction_status: created.transaction_status,
        })
    }

    /// Moves a transaction along the status lifecycle, applying the matching
    /// balance side effect first. Refund rows are not addressable here.
    pub async fn update_status_transaction(
        &self,
        token: &TokenData,
        req: &UpdateStatusRequest,
    ) -> Result<(), AppError> {
        let trx = self
            .repository
            .find_by_reference(&req.reference, false)
            .await
            .map_err(|err| AppError::from_repository("failed to get transaction", err))?;

        if !trx
            .transaction_status
            .can_transition_to(req.transaction_status)
        {
            return Err(AppError::InvalidTransition {
                from: trx.transaction_status,
                requested: req.transaction_status,
            });
        }

        let mut balance_reference = trx.reference.clone();
        if req.transaction_status == TransactionStatus::Reversed {
            balance_reference = format!("REVERSED-{}", trx.reference);

            if Utc::now() > trx.reversal_deadline() {
                return Err(AppError::ReversalExpired);
            }
        }

        let mutation = BalanceMutation {
            amount: trx.amount.clone(),
            reference: balance_reference,
        };

        // FAILED transitions carry no balance effect; everything else maps to
        // exactly one credit or debit.
        let balance_result = match (trx.transaction_type, req.transaction_status) {
            (TransactionType::Topup, TransactionStatus::Success) => {
                Some(self.wallet.credit(&token.token, &mutation).await)
            }
            (TransactionType::Topup, TransactionStatus::Reversed) => {
                Some(self.wallet.debit(&token.token, &mutation).await)
            }
            (TransactionType::Purchase, TransactionStatus::Success) => {
                Some(self.wallet.debit(&token.token, &mutation).await)
            }
            (TransactionType::Purchase, TransactionStatus::Reversed) => {
                Some(self.wallet.credit(&token.token, &mutation).await)
            }
            _ => None,
        };

        if let Some(Err(err)) = balance_result {
            return Err(AppError::BalanceGateway(format!(
                "failed to update balance: {}",
                err
            )));
        }

        let merged_info = merge_additional_info(&trx.additional_info, &req.additional_info)?;

        self.repository
            .update_status(&trx.reference, req.transaction_status, &merged_info)
            .await
            .map_err(|err| {
                AppError::from_repository("failed to update status transaction", err)
            })?;

        self.send_notification(token, &trx, req.transaction_status)
            .await;

        Ok(())
    }

    pub async fn get_transaction_detail(&self, reference: &str) -> Result<Transaction, AppError> {
        self.repository
            .find_by_reference(reference, true)
            .await
            .map_err(|err| AppError::from_repository("failed to get transaction", err))
    }

    pub async fn get_transactions(&self, user_id: i64) -> Result<Vec<Transaction>, AppError> {
        self.repository
            .list_by_user(user_id)
            .await
            .map_err(|err| AppError::from_repository("failed to list transactions", err))
    }

    /// Creates a SUCCESS refund row for a successful purchase, crediting the
    /// caller's balance first. The original row is left untouched.
    pub async fn refund_transaction(
        &self,
        token: &TokenData,
        req: &RefundRequest,
    ) -> Result<CreateTransactionResponse, AppError> {
        let trx = self
            .repository
            .find_by_reference(&req.reference, true)
            .await
            .map_err(|err| AppError::from_repository("failed to get transaction", err))?;

        if trx.transaction_status != TransactionStatus::Success {
            return Err(AppError::RefundNotEligible(
                "transaction status is not SUCCESS".to_string(),
            ));
        }

        if trx.transaction_type != TransactionType::Purchase {
            return Err(AppError::RefundNotEligible(
                "transaction type is not PURCHASE".to_string(),
            ));
        }

        let refund_reference = format!("REFUND-{}", req.reference);
        let mutation = BalanceMutation {
            amount: trx.amount.clone(),
            reference: refund_reference.clone(),
        };

        self.wallet
            .credit(&token.token, &mutation)
            .await
            .map_err(|err| AppError::BalanceGateway(format!("failed to credit balance: {}", err)))?;

        let refund = Transaction::new(
            token.user_id,
            trx.amount.clone(),
            TransactionType::Refund,
            TransactionStatus::Success,
            refund_reference.clone(),
            req.description.clone(),
            req.additional_info.clone(),
        );

        let created = self
            .repository
            .create(&refund)
            .await
            .map_err(|err| {
                AppError::from_repository("failed to insert new transaction refund", err)
            })?;

        Ok(CreateTransactionResponse {
            reference: refund_reference,
            transaction_status: created.transaction_status,
        })
    }

    /// Fire and forget: a lost notification must never fail the status
    /// change, so the error is logged and dropped here.
    async fn send_notification(
        &self,
        token: &TokenData,
        trx: &Transaction,
        new_status: TransactionStatus,
    ) {
        if trx.transaction_type != TransactionType::Purchase
            || new_status != TransactionStatus::Success
        {
            return;
        }

        let placeholders = HashMap::from([
            ("full_name".to_string(), token.fullname.clone()),
            ("description".to_string(), trx.description.clone()),
            ("reference".to_string(), trx.reference.clone()),
            (
                "date".to_string(),
                trx.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        ]);

        if let Err(err) = self
            .notifications
            .send(&token.email, "purchase_success", placeholders)
            .await
        {
            tracing::warn!(
                reference = %trx.reference,
                "failed to send purchase_success notification: {}",
                err
            );
        }
    }
}

fn parse_info_object(raw: &str) -> Result<Map<String, Value>, AppError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::MalformedMetadata(
            "additional_info must be a JSON object".to_string(),
        )),
        Err(err) => Err(AppError::MalformedMetadata(format!(
            "failed to parse additional_info: {}",
            err
        ))),
    }
}

/// Shallow merge of two JSON-object strings; keys from `patch` win. Blank
/// input counts as an empty object.
fn merge_additional_info(current: &str, patch: &str) -> Result<String, AppError> {
    let mut merged = parse_info_object(current)?;
    for (key, value) in parse_info_object(patch)? {
        merged.insert(key, value);
    }

    serde_json::to_string(&merged).map_err(|err| AppError::Internal(err.to_string()))
}
