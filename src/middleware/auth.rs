//! Token-validation middleware. Resolves the Authorization header through the
//! auth service and attaches the resulting TokenData as a request extension.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;

pub async fn validate_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    if header.is_empty() {
        return Err(AppError::Unauthorized(
            "missing authorization header".to_string(),
        ));
    }

    let token_data = state
        .auth_client
        .validate_token(&header)
        .await
        .map_err(|err| AppError::Unauthorized(format!("token validation failed: {}", err)))?;

    req.extensions_mut().insert(token_data);
    Ok(next.run(req).await)
}
