use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_core::adapters::PostgresTransactionRepository;
use ledger_core::clients::{AuthClient, NotificationClient, WalletClient};
use ledger_core::config::Config;
use ledger_core::services::TransactionService;
use ledger_core::{create_app, startup, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("database migrations completed");

    let report = startup::validate_environment(&config, &pool).await?;
    report.print();
    if !report.core_is_valid() {
        anyhow::bail!("startup validation failed");
    }
    if !report.is_valid() {
        tracing::warn!("one or more external services are unreachable; continuing startup");
    }

    let wallet = WalletClient::new(config.wallet_base_url.clone());
    let notifications = NotificationClient::new(config.notification_base_url.clone());
    let auth_client = AuthClient::new(config.auth_base_url.clone());

    let service = Arc::new(TransactionService::new(
        Arc::new(PostgresTransactionRepository::new(pool.clone())),
        Arc::new(wallet),
        Arc::new(notifications),
    ));

    let state = AppState {
        db: pool,
        service,
        auth_client,
    };
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
