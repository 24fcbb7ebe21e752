//! HTTP client for the external notification service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::ports::{NotificationError, NotificationGateway};

#[derive(Debug, Serialize)]
struct SendNotificationRequest<'a> {
    recipient: &'a str,
    template_name: &'a str,
    placeholders: HashMap<String, String>,
}

/// HTTP implementation of the NotificationGateway. The caller decides whether
/// a delivery failure matters; this client just reports it.
#[derive(Clone)]
pub struct NotificationClient {
    client: Client,
    base_url: String,
}

impl NotificationClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        NotificationClient { client, base_url }
    }
}

#[async_trait]
impl NotificationGateway for NotificationClient {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        placeholders: HashMap<String, String>,
    ) -> Result<(), NotificationError> {
        let url = format!(
            "{}/notification/v1/send",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .json(&SendNotificationRequest {
                recipient,
                template_name,
                placeholders,
            })
            .send()
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!(
                "{}: {}",
                status, message
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/notification/v1/send")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "recipient": "user@example.com",
                "template_name": "purchase_success",
            })))
            .with_status(200)
            .with_body(r#"{"message":"queued"}"#)
            .create_async()
            .await;

        let client = NotificationClient::new(server.url());
        let placeholders = HashMap::from([("full_name".to_string(), "Jane Doe".to_string())]);
        let result = client
            .send("user@example.com", "purchase_success", placeholders)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_rejected_on_error_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/notification/v1/send")
            .with_status(500)
            .create_async()
            .await;

        let client = NotificationClient::new(server.url());
        let result = client
            .send("user@example.com", "purchase_success", HashMap::new())
            .await;

        assert!(matches!(result, Err(NotificationError::Rejected(_))));
    }
}
