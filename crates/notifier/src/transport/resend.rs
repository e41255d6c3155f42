use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use courier_common::error::AppError;

use crate::error::TransportError;
use crate::transport::Transport;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Delivery through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendTransport {
    client: Client,
    api_key: String,
    from: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendTransport {
    pub fn new(api_key: String, from: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            from,
            endpoint: RESEND_API_URL.to_string(),
        })
    }

    /// Point the transport at a different API base (self-hosted proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Transport for ResendTransport {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let payload = Payload {
            from: &self.from,
            to: [address],
            subject,
            html: body,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "resend"
    }
}
