pub mod adapters;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::clients::AuthClient;
use crate::services::TransactionService;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub service: Arc<TransactionService>,
    pub auth_client: AuthClient,
}

pub fn create_app(state: AppState) -> Router {
    // Full paths rather than `nest`: the list endpoint lives at the group
    // root and must resolve with and without the trailing slash.
    let transaction_routes = Router::new()
        .route(
            "/transaction/v1/create",
            post(handlers::transaction::create_transaction),
        )
        .route(
            "/transaction/v1/update-status/:reference",
            put(handlers::transaction::update_status),
        )
        .route(
            "/transaction/v1",
            get(handlers::transaction::get_transactions),
        )
        .route(
            "/transaction/v1/",
            get(handlers::transaction::get_transactions),
        )
        .route(
            "/transaction/v1/:reference",
            get(handlers::transaction::get_transaction_detail),
        )
        .route(
            "/transaction/v1/refund",
            post(handlers::transaction::refund),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::validate_token,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(transaction_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
