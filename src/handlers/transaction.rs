//! HTTP surface for the transaction service. Handlers stay thin: bind the
//! request, pull the caller identity from the middleware extension, delegate.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use crate::domain::TokenData;
use crate::error::AppError;
use crate::services::{CreateTransactionRequest, RefundRequest, UpdateStatusRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn with_data(data: T) -> Self {
        Self {
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    fn message_only() -> Self {
        Self {
            message: "success".to_string(),
            data: None,
        }
    }
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(token): Extension<TokenData>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }

    let resp = state.service.create_transaction(&token, req).await?;
    Ok(Json(ApiResponse::with_data(resp)))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(token): Extension<TokenData>,
    Path(reference): Path<String>,
    Json(mut req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.reference = reference;
    if req.reference.trim().is_empty() {
        return Err(AppError::Validation("reference is required".to_string()));
    }

    state.service.update_status_transaction(&token, &req).await?;
    Ok(Json(ApiResponse::message_only()))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(token): Extension<TokenData>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state.service.get_transactions(token.user_id).await?;
    Ok(Json(ApiResponse::with_data(rows)))
}

pub async fn get_transaction_detail(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if reference.trim().is_empty() {
        return Err(AppError::Validation("reference is required".to_string()));
    }

    let tx = state.service.get_transaction_detail(&reference).await?;
    Ok(Json(ApiResponse::with_data(tx)))
}

pub async fn refund(
    State(state): State<AppState>,
    Extension(token): Extension<TokenData>,
    Json(req): Json<RefundRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.reference.trim().is_empty() {
        return Err(AppError::Validation("reference is required".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }

    let resp = state.service.refund_transaction(&token, &req).await?;
    Ok(Json(ApiResponse::with_data(resp)))
}
