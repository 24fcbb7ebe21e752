use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::time::Duration;

pub struct ValidationReport {
    pub environment: bool,
    pub database: bool,
    pub wallet: bool,
    pub notification: bool,
    pub auth: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.database && self.wallet && self.notification && self.auth
    }

    /// Env vars and the database are required; the external services may come
    /// up later without blocking startup.
    pub fn core_is_valid(&self) -> bool {
        self.environment && self.database
    }

    pub fn print(&self) {
        println!("\n=== Startup Validation Report ===");
        println!("Environment Variables:    {}", status(self.environment));
        println!("Database Connectivity:    {}", status(self.database));
        println!("Wallet Service:           {}", status(self.wallet));
        println!("Notification Service:     {}", status(self.notification));
        println!("Auth Service:             {}", status(self.auth));

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!(
            "\nOverall Status: {}",
            if self.is_valid() { "✅ PASS" } else { "❌ FAIL" }
        );
        println!("=================================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok {
        "✅ OK"
    } else {
        "❌ FAIL"
    }
}

pub async fn validate_environment(config: &Config, pool: &PgPool) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        environment: true,
        database: true,
        wallet: true,
        notification: true,
        auth: true,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = validate_database(pool).await {
        report.database = false;
        report.errors.push(format!("Database: {}", e));
    }

    if let Err(e) = probe_service(&config.wallet_base_url).await {
        report.wallet = false;
        report.errors.push(format!("Wallet: {}", e));
    }

    if let Err(e) = probe_service(&config.notification_base_url).await {
        report.notification = false;
        report.errors.push(format!("Notification: {}", e));
    }

    if let Err(e) = probe_service(&config.auth_base_url).await {
        report.auth = false;
        report.errors.push(format!("Auth: {}", e));
    }

    Ok(report)
}

fn validate_env_vars(config: &Config) -> Result<()> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL is empty");
    }
    if config.server_port == 0 {
        anyhow::bail!("SERVER_PORT must be greater than 0");
    }

    url::Url::parse(&config.wallet_base_url).context("WALLET_SERVICE_URL is not a valid URL")?;
    url::Url::parse(&config.notification_base_url)
        .context("NOTIFICATION_SERVICE_URL is not a valid URL")?;
    url::Url::parse(&config.auth_base_url).context("AUTH_SERVICE_URL is not a valid URL")?;

    Ok(())
}

async fn validate_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .context("Failed to connect to database")?;

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to check migrations table")?;

    if applied == 0 {
        anyhow::bail!("No migrations applied");
    }

    Ok(())
}

async fn probe_service(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {}", base_url))?;

    if !response.status().is_success() {
        anyhow::bail!("{} returned status: {}", base_url, response.status());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/ledger".to_string(),
            wallet_base_url: "http://localhost:9001".to_string(),
            notification_base_url: "http://localhost:9002".to_string(),
            auth_base_url: "http://localhost:9003".to_string(),
        }
    }

    #[test]
    fn test_validate_env_vars_empty_database_url() {
        let mut cfg = config();
        cfg.database_url = String::new();

        assert!(validate_env_vars(&cfg).is_err());
    }

    #[test]
    fn test_validate_env_vars_invalid_url() {
        let mut cfg = config();
        cfg.wallet_base_url = "not-a-url".to_string();

        assert!(validate_env_vars(&cfg).is_err());
    }

    #[test]
    fn test_validate_env_vars_accepts_valid_config() {
        assert!(validate_env_vars(&config()).is_ok());
    }
}
