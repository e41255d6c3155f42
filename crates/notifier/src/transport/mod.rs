//! Outbound delivery backends.

pub mod resend;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use courier_common::config::{AppConfig, EmailProvider};
use courier_common::error::AppError;

use crate::error::TransportError;

pub use resend::ResendTransport;
pub use smtp::SmtpTransport;

/// Sends one rendered message to one address.
///
/// A call performs a single attempt; retries are the caller's business (and
/// the dispatcher makes none).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), TransportError>;

    /// Human-readable backend name for logs (e.g., "smtp").
    fn name(&self) -> &'static str;
}

/// Build the transport selected by `config.email_provider`.
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn Transport>, AppError> {
    match config.email_provider {
        EmailProvider::Smtp => {
            let settings = config.smtp.as_ref().ok_or_else(|| {
                AppError::Config("SMTP_HOST is required when EMAIL_PROVIDER is smtp".to_string())
            })?;
            Ok(Arc::new(SmtpTransport::new(settings, &config.email_from)?))
        }
        EmailProvider::Resend => {
            let api_key = config.resend_api_key.clone().ok_or_else(|| {
                AppError::Config(
                    "RESEND_API_KEY is required when EMAIL_PROVIDER is resend".to_string(),
                )
            })?;
            Ok(Arc::new(ResendTransport::new(api_key, config.email_from.clone())?))
        }
    }
}
