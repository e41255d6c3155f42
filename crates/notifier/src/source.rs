use async_trait::async_trait;
use courier_common::types::Recipient;

use crate::error::SourceError;

/// Supplies the ordered batch of recipients for one run.
#[async_trait]
pub trait RecipientSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Recipient>, SourceError>;
}
