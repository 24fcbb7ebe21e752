//! HTTP client for the user-management service's token validation endpoint.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::domain::TokenData;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token validation request failed: {0}")]
    Request(String),

    #[error("token rejected")]
    InvalidToken,

    #[error("invalid response from auth service: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ValidateTokenResponse {
    #[allow(dead_code)]
    message: String,
    data: TokenPayload,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    user_id: i64,
    username: String,
    full_name: String,
    email: String,
}

/// Resolves opaque credentials to caller identity. Invoked by the
/// token-validation middleware before any transaction handler runs.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        AuthClient { client, base_url }
    }

    pub async fn validate_token(&self, token: &str) -> Result<TokenData, AuthError> {
        let url = format!(
            "{}/ums/v1/token/validate",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidToken);
        }

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::InvalidResponse(format!(
                "unexpected status {}",
                status
            )));
        }

        let payload = response
            .json::<ValidateTokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(TokenData {
            user_id: payload.data.user_id,
            username: payload.data.username,
            fullname: payload.data.full_name,
            email: payload.data.email,
            token: token.to_string(),
        })
    }
}
