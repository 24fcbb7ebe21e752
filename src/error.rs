use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::TransactionStatus;
use crate::ports::RepositoryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {from} -> {requested}")]
    InvalidTransition {
        from: TransactionStatus,
        requested: TransactionStatus,
    },

    #[error("reversal window expired")]
    ReversalExpired,

    #[error("refund not eligible: {0}")]
    RefundNotEligible(String),

    #[error("malformed additional info: {0}")]
    MalformedMetadata(String),

    #[error("balance gateway error: {0}")]
    BalanceGateway(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps a repository failure with a stage-identifying message,
    /// preserving NotFound as its own kind.
    pub fn from_repository(stage: &str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Store(format!("{}: {}", stage, other)),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedMetadata(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. }
            | AppError::ReversalExpired
            | AppError::RefundNotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BalanceGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
