pub mod transaction;

pub use transaction::{
    generate_reference, TokenData, Transaction, TransactionStatus, TransactionType,
    REVERSAL_WINDOW_HOURS,
};
