//! End-to-end flows through the service's public API, using an in-memory
//! repository, the real HTTP wallet client against a mock server, and a
//! recording notifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};

use ledger_core::clients::WalletClient;
use ledger_core::domain::{TokenData, Transaction, TransactionStatus, TransactionType};
use ledger_core::error::AppError;
use ledger_core::ports::{
    NotificationError, NotificationGateway, RepositoryError, RepositoryResult,
    TransactionRepository,
};
use ledger_core::services::{
    CreateTransactionRequest, RefundRequest, TransactionService, UpdateStatusRequest,
};

#[derive(Default)]
struct MemoryRepository {
    rows: Mutex<Vec<Transaction>>,
    updates: Mutex<Vec<(String, TransactionStatus, String)>>,
}

#[async_trait]
impl TransactionRepository for MemoryRepository {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let mut stored = tx.clone();
        let mut rows = self.rows.lock().unwrap();
        stored.id = rows.len() as i64 + 1;
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
        include_refund: bool,
    ) -> RepositoryResult<Transaction> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|t| {
                t.reference == reference
                    && (include_refund || t.transaction_type != TransactionType::Refund)
            })
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(reference.to_string()))
    }

    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        additional_info: &str,
    ) -> RepositoryResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().rev().find(|t| t.reference == reference) {
            row.transaction_status = status;
            row.additional_info = additional_info.to_string();
            row.updated_at = Utc::now();
        }
        self.updates.lock().unwrap().push((
            reference.to_string(),
            status,
            additional_info.to_string(),
        ));
        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationGateway for RecordingNotifier {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        _placeholders: HashMap<String, String>,
    ) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), template_name.to_string()));
        Ok(())
    }
}

fn token() -> TokenData {
    TokenData {
        user_id: 1,
        username: "jane".to_string(),
        fullname: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        token: "token-1".to_string(),
    }
}

fn build_service(wallet_url: String) -> (Arc<MemoryRepository>, TransactionService) {
    let repository = Arc::new(MemoryRepository::default());
    let service = TransactionService::new(
        repository.clone(),
        Arc::new(WalletClient::new(wallet_url)),
        Arc::new(RecordingNotifier::default()),
    );
    (repository, service)
}

#[tokio::test]
async fn create_then_transition_topup_to_success() {
    let mut server = mockito::Server::new_async().await;
    let credit_mock = server
        .mock("POST", "/wallet/v1/balance/credit")
        .match_header("Authorization", "token-1")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "amount": "100000",
        })))
        .with_status(200)
        .with_body(r#"{"message":"success"}"#)
        .create_async()
        .await;

    let (repository, service) = build_service(server.url());

    // Scenario A: create a pending topup.
    let created = service
        .create_transaction(
            &token(),
            CreateTransactionRequest {
                amount: BigDecimal::from(100000),
                transaction_type: TransactionType::Topup,
                description: "monthly topup".to_string(),
                additional_info: String::new(),
            },
        )
        .await
        .unwrap();

    assert!(!created.reference.is_empty());
    assert_eq!(created.transaction_status, TransactionStatus::Pending);

    // Scenario B: transition it to SUCCESS; exactly one credit call.
    service
        .update_status_transaction(
            &token(),
            &UpdateStatusRequest {
                reference: created.reference.clone(),
                transaction_status: TransactionStatus::Success,
                additional_info: String::new(),
            },
        )
        .await
        .unwrap();

    credit_mock.assert_async().await;

    let row = repository
        .find_by_reference(&created.reference, false)
        .await
        .unwrap();
    assert_eq!(row.transaction_status, TransactionStatus::Success);
}

#[tokio::test]
async fn stale_purchase_reversal_is_rejected_before_any_gateway_call() {
    let mut server = mockito::Server::new_async().await;
    let credit_mock = server
        .mock("POST", "/wallet/v1/balance/credit")
        .expect(0)
        .create_async()
        .await;
    let debit_mock = server
        .mock("POST", "/wallet/v1/balance/debit")
        .expect(0)
        .create_async()
        .await;

    let (repository, service) = build_service(server.url());

    // Scenario C: a SUCCESS purchase created 25 hours ago.
    let mut tx = Transaction::new(
        1,
        BigDecimal::from(50000),
        TransactionType::Purchase,
        TransactionStatus::Success,
        "TRXOLD".to_string(),
        "old purchase".to_string(),
        String::new(),
    );
    tx.created_at = Utc::now() - Duration::hours(25);
    repository.create(&tx).await.unwrap();

    let result = service
        .update_status_transaction(
            &token(),
            &UpdateStatusRequest {
                reference: "TRXOLD".to_string(),
                transaction_status: TransactionStatus::Reversed,
                additional_info: String::new(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::ReversalExpired)));
    credit_mock.assert_async().await;
    debit_mock.assert_async().await;

    let row = repository.find_by_reference("TRXOLD", false).await.unwrap();
    assert_eq!(row.transaction_status, TransactionStatus::Success);
}

#[tokio::test]
async fn refund_credits_wallet_then_stores_refund_row() {
    let mut server = mockito::Server::new_async().await;
    let credit_mock = server
        .mock("POST", "/wallet/v1/balance/credit")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "amount": "200000",
            "reference": "REFUND-REF1",
        })))
        .with_status(200)
        .with_body(r#"{"message":"success"}"#)
        .create_async()
        .await;

    let (repository, service) = build_service(server.url());

    let original = Transaction::new(
        1,
        BigDecimal::from(200000),
        TransactionType::Purchase,
        TransactionStatus::Success,
        "REF1".to_string(),
        "laptop".to_string(),
        String::new(),
    );
    repository.create(&original).await.unwrap();

    // Scenario D.
    let resp = service
        .refund_transaction(
            &token(),
            &RefundRequest {
                reference: "REF1".to_string(),
                description: "order cancelled".to_string(),
                additional_info: String::new(),
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.reference, "REFUND-REF1");
    assert_eq!(resp.transaction_status, TransactionStatus::Success);
    credit_mock.assert_async().await;

    let refund = repository
        .find_by_reference("REFUND-REF1", true)
        .await
        .unwrap();
    assert_eq!(refund.transaction_type, TransactionType::Refund);
    assert_eq!(refund.transaction_status, TransactionStatus::Success);
    assert_eq!(refund.amount, BigDecimal::from(200000));
}

#[tokio::test]
async fn wallet_rejection_leaves_the_ledger_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/wallet/v1/balance/debit")
        .with_status(400)
        .with_body(r#"{"message":"insufficient balance"}"#)
        .create_async()
        .await;

    let (repository, service) = build_service(server.url());

    let purchase = Transaction::new(
        1,
        BigDecimal::from(75000),
        TransactionType::Purchase,
        TransactionStatus::Pending,
        "TRXP".to_string(),
        "groceries".to_string(),
        String::new(),
    );
    repository.create(&purchase).await.unwrap();

    let result = service
        .update_status_transaction(
            &token(),
            &UpdateStatusRequest {
                reference: "TRXP".to_string(),
                transaction_status: TransactionStatus::Success,
                additional_info: String::new(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::BalanceGateway(_))));

    let row = repository.find_by_reference("TRXP", false).await.unwrap();
    assert_eq!(row.transaction_status, TransactionStatus::Pending);
}
