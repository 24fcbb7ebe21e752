pub mod postgres_transaction_repository;

pub use postgres_transaction_repository::PostgresTransactionRepository;
