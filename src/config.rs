use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub wallet_base_url: String,
    pub notification_base_url: String,
    pub auth_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            wallet_base_url: env::var("WALLET_SERVICE_URL")?,
            notification_base_url: env::var("NOTIFICATION_SERVICE_URL")?,
            auth_base_url: env::var("AUTH_SERVICE_URL")?,
        })
    }
}
