use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One addressee of a bulk notification.
///
/// Loaded once per run and never mutated by the dispatcher. The whole record is
/// handed to the renderer as its template context; only `email` is read by the
/// dispatch pipeline itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    /// Unique delivery address.
    pub email: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Recipient {
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            created_at: None,
        }
    }
}

/// Terminal status of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Failure,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Success => write!(f, "success"),
            DeliveryStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Write-once record of how a single recipient's delivery attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub email: String,
    pub status: DeliveryStatus,
    /// Dispatch run that produced this outcome.
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DeliveryOutcome {
    /// Stamp a new outcome with the current time.
    pub fn new(email: impl Into<String>, status: DeliveryStatus, run_id: Uuid) -> Self {
        Self {
            email: email.into(),
            status,
            run_id,
            created_at: Utc::now(),
        }
    }
}
