//! Bounded concurrent dispatch engine.
//!
//! A run pushes the whole batch into a queue sized to the batch, closes it,
//! and lets a fixed pool of workers drain it. The call returns only once every
//! worker has observed the closed, empty queue and finished its last item.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use courier_common::config::AppConfig;
use courier_common::types::{DeliveryStatus, Recipient};

use crate::error::DispatchError;
use crate::pipeline::{ItemReport, Pipeline};
use crate::renderer::Renderer;
use crate::sink::OutcomeSink;
use crate::source::RecipientSource;
use crate::transport::Transport;

/// Per-run settings consumed by the engine.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of concurrent workers. Must be >= 1.
    pub worker_count: i64,
    /// Subject line shared by every message of the batch.
    pub subject: String,
}

impl DispatchConfig {
    pub fn new(worker_count: i64, subject: impl Into<String>) -> Self {
        Self {
            worker_count,
            subject: subject.into(),
        }
    }

    fn validated_worker_count(&self) -> Result<usize, DispatchError> {
        if self.worker_count < 1 {
            return Err(DispatchError::InvalidWorkerCount(self.worker_count));
        }
        usize::try_from(self.worker_count)
            .map_err(|_| DispatchError::InvalidWorkerCount(self.worker_count))
    }
}

impl From<&AppConfig> for DispatchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            worker_count: i64::try_from(config.num_workers).unwrap_or(i64::MAX),
            subject: config.email_subject.clone(),
        }
    }
}

/// Totals of a finished dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub run_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Outcomes the sink failed to record.
    pub unrecorded: usize,
}

impl DispatchSummary {
    fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            ..Self::default()
        }
    }

    /// Number of recipients that went through the pipeline.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    fn absorb(&mut self, tally: WorkerTally) {
        self.succeeded += tally.succeeded;
        self.failed += tally.failed;
        self.unrecorded += tally.unrecorded;
    }
}

#[derive(Debug, Default)]
struct WorkerTally {
    succeeded: usize,
    failed: usize,
    unrecorded: usize,
}

impl WorkerTally {
    fn record(&mut self, report: ItemReport) {
        match report.status {
            DeliveryStatus::Success => self.succeeded += 1,
            DeliveryStatus::Failure => self.failed += 1,
        }
        if !report.recorded {
            self.unrecorded += 1;
        }
    }
}

/// Owns the pipeline collaborators and runs batches through a worker pool.
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
}

impl Dispatcher {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::new(renderer, transport, sink)),
        }
    }

    /// Load the batch from `source` and dispatch it.
    ///
    /// A source failure aborts the run before any worker starts.
    pub async fn run(
        &self,
        source: &dyn RecipientSource,
        config: &DispatchConfig,
    ) -> Result<DispatchSummary, DispatchError> {
        config.validated_worker_count()?;

        let recipients = match source.fetch_all().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load recipients, nothing dispatched");
                return Err(e.into());
            }
        };

        if recipients.is_empty() {
            tracing::info!("No recipients found, nothing to dispatch");
        } else {
            tracing::info!(count = recipients.len(), "Recipients loaded, starting dispatch");
        }

        self.dispatch(recipients, config).await
    }

    /// Deliver to every recipient with `config.worker_count` concurrent workers.
    ///
    /// Returns once every recipient has had exactly one delivery attempt and
    /// one outcome append attempt. Per-recipient failures never abort the batch.
    pub async fn dispatch(
        &self,
        recipients: Vec<Recipient>,
        config: &DispatchConfig,
    ) -> Result<DispatchSummary, DispatchError> {
        let worker_count = config.validated_worker_count()?;
        let run_id = Uuid::new_v4();

        if recipients.is_empty() {
            return Ok(DispatchSummary::empty(run_id));
        }

        let span = tracing::info_span!("dispatch", run_id = %run_id);
        self.dispatch_batch(recipients, worker_count, config.subject.clone(), run_id)
            .instrument(span)
            .await
    }

    async fn dispatch_batch(
        &self,
        recipients: Vec<Recipient>,
        worker_count: usize,
        subject: String,
        run_id: Uuid,
    ) -> Result<DispatchSummary, DispatchError> {
        let started = Instant::now();
        let total = recipients.len();
        let subject: Arc<str> = subject.into();

        tracing::info!(
            total,
            workers = worker_count,
            transport = self.pipeline.transport_name(),
            "Dispatch run started"
        );

        // Capacity covers the whole batch, so publishing never waits on workers.
        let (jobs_tx, jobs_rx) = async_channel::bounded::<Recipient>(total);

        let mut workers = JoinSet::new();
        for id in 1..=worker_count {
            let jobs = jobs_rx.clone();
            let pipeline = Arc::clone(&self.pipeline);
            let subject = Arc::clone(&subject);
            workers.spawn(
                worker_loop(id, jobs, pipeline, subject, run_id).in_current_span(),
            );
        }
        drop(jobs_rx);

        for recipient in recipients {
            if let Err(e) = jobs_tx.send(recipient).await {
                tracing::error!(
                    email = %e.0.email,
                    "Job queue closed before the batch was published"
                );
                break;
            }
        }
        jobs_tx.close();

        let mut summary = DispatchSummary {
            run_id,
            total,
            ..DispatchSummary::default()
        };

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(tally) => summary.absorb(tally),
                Err(e) => tracing::error!(error = %e, "Worker task terminated abnormally"),
            }
        }

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            unrecorded = summary.unrecorded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatch run complete"
        );

        Ok(summary)
    }
}

/// Drain the queue until it is closed and empty.
async fn worker_loop(
    id: usize,
    jobs: async_channel::Receiver<Recipient>,
    pipeline: Arc<Pipeline>,
    subject: Arc<str>,
    run_id: Uuid,
) -> WorkerTally {
    let mut tally = WorkerTally::default();

    while let Ok(recipient) = jobs.recv().await {
        let report = pipeline.process(id, &recipient, &subject, run_id).await;
        tally.record(report);
    }

    tracing::debug!(
        worker = id,
        succeeded = tally.succeeded,
        failed = tally.failed,
        "Worker finished"
    );
    tally
}
