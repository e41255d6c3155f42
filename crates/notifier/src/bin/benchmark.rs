//! Courier Dispatch Benchmark
//!
//! Measures how the worker pool scales against a simulated transport with a
//! fixed per-message latency, to pick a sensible `NUM_WORKERS` for a relay.
//!
//! ## Usage
//!
//! ```bash
//! # 1000 recipients, 10 workers, 50ms per send
//! cargo run --bin benchmark
//!
//! # Customize
//! BENCHMARK_RECIPIENTS=5000 BENCHMARK_WORKERS=32 BENCHMARK_LATENCY_MS=120 cargo run --bin benchmark
//! ```
//!
//! The benchmark does NOT require a database or an SMTP relay.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use courier_common::types::{DeliveryOutcome, Recipient};
use courier_notifier::error::{SinkError, TransportError};
use courier_notifier::renderer::TemplateRenderer;
use courier_notifier::sink::OutcomeSink;
use courier_notifier::transport::Transport;
use courier_notifier::{DispatchConfig, Dispatcher};

const TEMPLATE: &str = "<p>Hello {{ name }}, this offer is for {{ email }}.</p>";

/// Transport that sleeps instead of talking to a relay.
struct SimulatedTransport {
    latency: Duration,
    send_ms: Mutex<Vec<f64>>,
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn send(&self, _address: &str, _subject: &str, _body: &str) -> Result<(), TransportError> {
        let started = Instant::now();
        tokio::time::sleep(self.latency).await;
        let elapsed = started.elapsed().as_secs_f64() * 1000.0;
        if let Ok(mut samples) = self.send_ms.lock() {
            samples.push(elapsed);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[derive(Default)]
struct CountingSink {
    appended: AtomicUsize,
}

#[async_trait]
impl OutcomeSink for CountingSink {
    async fn append(&self, _outcome: &DeliveryOutcome) -> Result<(), SinkError> {
        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn compute_percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f64 - 1.0)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_notifier=warn".into()),
        )
        .init();

    let recipient_count: usize = env_or("BENCHMARK_RECIPIENTS", 1000)?;
    let workers: i64 = env_or("BENCHMARK_WORKERS", 10)?;
    let latency_ms: u64 = env_or("BENCHMARK_LATENCY_MS", 50)?;

    let recipients: Vec<Recipient> = (1..=recipient_count as i64)
        .map(|i| Recipient::new(i, format!("User {i}"), format!("user{i}@example.com")))
        .collect();

    let transport = Arc::new(SimulatedTransport {
        latency: Duration::from_millis(latency_ms),
        send_ms: Mutex::new(Vec::with_capacity(recipient_count)),
    });
    let sink = Arc::new(CountingSink::default());
    let renderer = Arc::new(TemplateRenderer::parse(TEMPLATE)?);

    let dispatcher = Dispatcher::new(renderer, transport.clone(), sink.clone());
    let config = DispatchConfig::new(workers, "Benchmark");

    let wall_start = Instant::now();
    let summary = dispatcher.dispatch(recipients, &config).await?;
    let wall_elapsed = wall_start.elapsed();

    let mut samples = transport
        .send_ms
        .lock()
        .map_err(|_| anyhow::anyhow!("latency samples poisoned"))?
        .clone();
    samples.sort_by(|a, b| a.total_cmp(b));

    let throughput = summary.processed() as f64 / wall_elapsed.as_secs_f64().max(f64::EPSILON);
    let ideal_ms = (recipient_count as f64 / workers.max(1) as f64).ceil() * latency_ms as f64;

    println!();
    println!("══════════════════════════════════════════════════════════════");
    println!("  Courier Dispatch Benchmark Report");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!("  Recipients:         {}", summary.total);
    println!("  Workers:            {}", workers);
    println!("  Simulated latency:  {} ms", latency_ms);
    println!("  Outcomes recorded:  {}", sink.appended.load(Ordering::Relaxed));
    println!();
    println!("  Wall time:          {:.1} ms", wall_elapsed.as_secs_f64() * 1000.0);
    println!("  Ideal wall time:    {:.1} ms", ideal_ms);
    println!("  Throughput:         {:.1} msg/s", throughput);
    println!();
    println!("  Send p50:           {:.1} ms", compute_percentile(&samples, 50.0));
    println!("  Send p95:           {:.1} ms", compute_percentile(&samples, 95.0));
    println!("  Send p99:           {:.1} ms", compute_percentile(&samples, 99.0));
    println!();

    Ok(())
}
