//! Per-recipient delivery pipeline.
//!
//! Runs strictly in order for one recipient:
//! 1. Render the body (a render error skips delivery)
//! 2. Send it over the transport, exactly once
//! 3. Append the outcome to the sink (errors are logged, never propagated)
//! 4. Log one line with the worker, address and final status

use std::sync::Arc;

use uuid::Uuid;

use courier_common::types::{DeliveryOutcome, DeliveryStatus, Recipient};

use crate::error::DeliveryError;
use crate::renderer::Renderer;
use crate::sink::OutcomeSink;
use crate::transport::Transport;

/// Result of pushing one recipient through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemReport {
    pub status: DeliveryStatus,
    /// Whether the outcome reached the sink.
    pub recorded: bool,
}

/// Collaborators shared by every worker of a dispatch run.
pub struct Pipeline {
    renderer: Arc<dyn Renderer>,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn OutcomeSink>,
}

impl Pipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            renderer,
            transport,
            sink,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Process one dequeued recipient to completion.
    pub async fn process(
        &self,
        worker: usize,
        recipient: &Recipient,
        subject: &str,
        run_id: Uuid,
    ) -> ItemReport {
        let delivery = self.deliver(recipient, subject).await;

        let status = if delivery.is_ok() {
            DeliveryStatus::Success
        } else {
            DeliveryStatus::Failure
        };

        let outcome = DeliveryOutcome::new(recipient.email.as_str(), status, run_id);
        let recorded = match self.sink.append(&outcome).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    worker,
                    email = %recipient.email,
                    status = %status,
                    error = %e,
                    "Failed to record delivery outcome"
                );
                false
            }
        };

        match delivery {
            Ok(()) => tracing::info!(
                worker,
                email = %recipient.email,
                status = %status,
                "E-mail sent"
            ),
            Err(e) => tracing::warn!(
                worker,
                email = %recipient.email,
                status = %status,
                error = %e,
                "E-mail delivery failed"
            ),
        }

        ItemReport { status, recorded }
    }

    async fn deliver(&self, recipient: &Recipient, subject: &str) -> Result<(), DeliveryError> {
        let body = self.renderer.render(recipient)?;
        self.transport.send(&recipient.email, subject, &body).await?;
        Ok(())
    }
}
