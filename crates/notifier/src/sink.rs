use async_trait::async_trait;
use courier_common::types::DeliveryOutcome;

use crate::error::SinkError;

/// Durably records delivery outcomes.
///
/// Called concurrently by every worker, one independent append per recipient.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn append(&self, outcome: &DeliveryOutcome) -> Result<(), SinkError>;
}
