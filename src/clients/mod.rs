pub mod auth;
pub mod notification;
pub mod wallet;

pub use auth::AuthClient;
pub use notification::NotificationClient;
pub use wallet::WalletClient;
