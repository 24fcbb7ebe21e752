//! Postgres implementation of TransactionRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Transaction, TransactionStatus};
use crate::ports::{RepositoryError, RepositoryResult, TransactionRepository};

/// Postgres-backed transaction repository.
#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                user_id, amount, transaction_type, transaction_status,
                reference, description, additional_info, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, amount, transaction_type, transaction_status,
                reference, description, additional_info, created_at, updated_at
            "#,
        )
        .bind(tx.user_id)
        .bind(&tx.amount)
        .bind(tx.transaction_type.as_str())
        .bind(tx.transaction_status.as_str())
        .bind(&tx.reference)
        .bind(&tx.description)
        .bind(&tx.additional_info)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        row.into_domain()
    }

    async fn find_by_reference(
        &self,
        reference: &str,
        include_refund: bool,
    ) -> RepositoryResult<Transaction> {
        let query = if include_refund {
            "SELECT * FROM transactions WHERE reference = $1 ORDER BY id DESC LIMIT 1"
        } else {
            "SELECT * FROM transactions WHERE reference = $1 AND transaction_type <> 'REFUND' \
             ORDER BY id DESC LIMIT 1"
        };

        let row = sqlx::query_as::<_, TransactionRow>(query)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.map(|r| r.into_domain())
            .transpose()?
            .ok_or_else(|| RepositoryError::NotFound(reference.to_string()))
    }

    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        additional_info: &str,
    ) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE transactions SET transaction_status = $1, additional_info = $2, \
             updated_at = NOW() WHERE reference = $3",
        )
        .bind(status.as_str())
        .bind(additional_info)
        .bind(reference)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: i64) -> RepositoryResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(|r| r.into_domain()).collect()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    user_id: i64,
    amount: bigdecimal::BigDecimal,
    transaction_type: String,
    transaction_status: String,
    reference: String,
    description: String,
    additional_info: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_domain(self) -> RepositoryResult<Transaction> {
        let transaction_type = self
            .transaction_type
            .parse()
            .map_err(RepositoryError::Database)?;
        let transaction_status = self
            .transaction_status
            .parse()
            .map_err(RepositoryError::Database)?;

        Ok(Transaction {
            id: self.id,
            user_id: self.user_id,
            amount: self.amount,
            transaction_type,
            transaction_status,
            reference: self.reference,
            description: self.description,
            additional_info: self.additional_info,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
