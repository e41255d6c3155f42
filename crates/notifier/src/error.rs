//! Error taxonomy of a dispatch run.
//!
//! Only [`DispatchError`] ever leaves the engine. Render and transport errors
//! turn into a `failure` outcome, sink errors are logged and dropped.

use thiserror::Error;

/// Loading the recipient list failed. Fatal: nothing is dispatched.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Recipient source unavailable: {0}")]
    Unavailable(String),
}

/// The template could not be evaluated for one recipient.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template references missing field `{0}`")]
    MissingField(String),

    #[error("Recipient could not be converted into a template context: {0}")]
    Context(#[from] serde_json::Error),
}

/// A single delivery attempt failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Delivery failed: {0}")]
    Other(String),
}

/// Recording an outcome failed. Logged, never escalated.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Outcome sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the dispatch engine itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(i64),

    #[error("Failed to load recipients: {0}")]
    Source(#[from] SourceError),
}

/// Why a single recipient ended with a `failure` outcome.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Send failed: {0}")]
    Transport(#[from] TransportError),
}
