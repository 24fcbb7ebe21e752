pub mod transaction;

pub use transaction::{
    CreateTransactionRequest, CreateTransactionResponse, RefundRequest, TransactionService,
    UpdateStatusRequest,
};
