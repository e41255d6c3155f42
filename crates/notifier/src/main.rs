use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use courier_common::config::AppConfig;
use courier_common::db;
use courier_notifier::cli::{Cli, LogFormat};
use courier_notifier::renderer::TemplateRenderer;
use courier_notifier::store::PgStore;
use courier_notifier::transport;
use courier_notifier::{DispatchConfig, Dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "courier_notifier=info,courier_common=info".into());
    match cli.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
    }

    tracing::info!("Courier bulk dispatch starting...");

    // Load configuration
    let overrides = cli.overrides();
    let config = if cli.prompt {
        AppConfig::from_prompt(&mut std::io::stdin().lock(), &mut std::io::stdout(), &overrides)?
    } else {
        AppConfig::from_env_with(&overrides)?
    };
    let dispatch_config = DispatchConfig::from(&config);

    // Connect to database
    let pool = db::create_pool(config.database.clone(), config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let renderer = Arc::new(TemplateRenderer::from_file(&config.template_path)?);
    let transport = transport::from_config(&config)?;
    let store = Arc::new(PgStore::new(pool));

    let dispatcher = Dispatcher::new(renderer, transport, store.clone());
    let summary = dispatcher.run(store.as_ref(), &dispatch_config).await?;

    tracing::info!(
        run_id = %summary.run_id,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Courier finished."
    );
    Ok(())
}
