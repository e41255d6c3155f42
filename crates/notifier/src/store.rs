//! PostgreSQL-backed recipient source and outcome sink.

use async_trait::async_trait;
use sqlx::PgPool;

use courier_common::types::{DeliveryOutcome, Recipient};

use crate::error::{SinkError, SourceError};
use crate::sink::OutcomeSink;
use crate::source::RecipientSource;

/// Reads `recipients` and appends to `email_status`.
///
/// Every call checks a connection out of the pool, so concurrent appends from
/// different workers never share a connection.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientSource for PgStore {
    async fn fetch_all(&self) -> Result<Vec<Recipient>, SourceError> {
        let recipients = sqlx::query_as::<_, Recipient>(
            "SELECT id, name, email, created_at FROM recipients ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = recipients.len(), "Loaded recipients");
        Ok(recipients)
    }
}

#[async_trait]
impl OutcomeSink for PgStore {
    async fn append(&self, outcome: &DeliveryOutcome) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            INSERT INTO email_status (email, status, run_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&outcome.email)
        .bind(outcome.status.to_string())
        .bind(outcome.run_id)
        .bind(outcome.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
