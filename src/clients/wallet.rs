//! HTTP client for the external wallet service (balance credits/debits).

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use std::time::Duration;

use crate::ports::{BalanceMutation, BalanceReceipt, WalletGateway, WalletGatewayError};

/// HTTP implementation of the WalletGateway.
///
/// The `reference` inside each BalanceMutation is the idempotency key the
/// wallet service deduplicates on; this client sends it verbatim and never
/// retries on its own.
#[derive(Clone)]
pub struct WalletClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl WalletClient {
    /// Creates a new WalletClient with the specified base URL
    pub fn new(base_url: String) -> Self {
        Self::with_circuit_breaker(base_url, 3, 60)
    }

    /// Creates a new WalletClient with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        WalletClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    async fn post_mutation(
        &self,
        path: &str,
        token: &str,
        req: &BalanceMutation,
    ) -> Result<BalanceReceipt, WalletGatewayError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let client = self.client.clone();
        let token = token.to_string();
        let body = req.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header("Authorization", token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| WalletGatewayError::Request(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(WalletGatewayError::Rejected(format!(
                        "{}: {}",
                        status, message
                    )));
                }

                response
                    .json::<BalanceReceipt>()
                    .await
                    .map_err(|e| WalletGatewayError::Request(e.to_string()))
            })
            .await;

        match result {
            Ok(receipt) => Ok(receipt),
            Err(FailsafeError::Rejected) => Err(WalletGatewayError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl WalletGateway for WalletClient {
    async fn credit(
        &self,
        token: &str,
        req: &BalanceMutation,
    ) -> Result<BalanceReceipt, WalletGatewayError> {
        self.post_mutation("/wallet/v1/balance/credit", token, req)
            .await
    }

    async fn debit(
        &self,
        token: &str,
        req: &BalanceMutation,
    ) -> Result<BalanceReceipt, WalletGatewayError> {
        self.post_mutation("/wallet/v1/balance/debit", token, req)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    fn mutation(reference: &str) -> BalanceMutation {
        BalanceMutation {
            amount: BigDecimal::from(100000),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn test_wallet_client_creation() {
        let client = WalletClient::new("http://localhost:9000".to_string());
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_credit_success() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/wallet/v1/balance/credit")
            .match_header("Authorization", "token-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"success","balance":"250000"}"#)
            .create_async()
            .await;

        let client = WalletClient::new(server.url());
        let receipt = client.credit("token-1", &mutation("TRX1")).await.unwrap();

        assert_eq!(receipt.message, "success");
        assert_eq!(receipt.balance, Some(BigDecimal::from(250000)));
    }

    #[tokio::test]
    async fn test_debit_rejected_on_error_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/wallet/v1/balance/debit")
            .with_status(400)
            .with_body(r#"{"message":"insufficient balance"}"#)
            .create_async()
            .await;

        let client = WalletClient::new(server.url());
        let result = client.debit("token-1", &mutation("TRX1")).await;

        assert!(matches!(result, Err(WalletGatewayError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/wallet/v1/balance/credit")
            .with_status(500)
            .expect_at_least(3)
            .create_async()
            .await;

        let client = WalletClient::with_circuit_breaker(server.url(), 3, 60);

        for _ in 0..3 {
            let _ = client.credit("token-1", &mutation("TRX1")).await;
        }

        let result = client.credit("token-1", &mutation("TRX1")).await;
        assert!(matches!(result, Err(WalletGatewayError::CircuitOpen)));
    }
}
