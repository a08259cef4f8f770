//! Subcommand implementations.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use wfmap_core::defaults::{MAPPING_EXPORT_FILE, MAPPING_FILE, MAPPING_REVIEW_FILE};
use wfmap_inference::{backend_from_env, Classifier, OracleProvider};
use wfmap_jobs::{ClassificationPipeline, PipelineConfig, RunReport};
use wfmap_sources::{refresh, ChromestatusClient, RefreshConfig, RefreshReport, SnapshotSource};
use wfmap_store::{export_accepted, load_candidates, ExportOutcome, MappingStore, ReviewStore};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::review::{router, AppState};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    match cli.command {
        Commands::Refresh => {
            cmd_refresh(&config).await?;
        }
        Commands::Classify {
            from_snapshot,
            batch_size,
            backend,
        } => {
            cmd_classify(&config, from_snapshot, batch_size, backend).await?;
        }
        Commands::Review { .. } => {
            cmd_review(&config).await?;
        }
        Commands::Export => {
            cmd_export(&config).await?;
        }
    }
    Ok(())
}

async fn cmd_refresh(config: &AppConfig) -> anyhow::Result<RefreshReport> {
    let report = refresh(&RefreshConfig::from_env(), &config.backend())
        .await
        .context("Refreshing snapshots failed")?;
    println!(
        "Saved {} chromestatus entries and {} web-features entries ({})",
        report.chromestatus_entries, report.web_features_count, report.web_features_tag
    );
    Ok(report)
}

async fn cmd_classify(
    config: &AppConfig,
    from_snapshot: bool,
    batch_size: Option<usize>,
    provider: Option<OracleProvider>,
) -> anyhow::Result<RunReport> {
    let candidates = load_candidates(&config.web_features_path())?;
    let provider = match provider {
        Some(provider) => provider,
        None => OracleProvider::from_env()?,
    };
    let classifier = Classifier::new(backend_from_env(provider)?, Arc::new(candidates));

    let mut pipeline_config = PipelineConfig::from_env();
    if let Some(size) = batch_size {
        pipeline_config = pipeline_config.with_batch_size(size);
    }
    let pipeline = ClassificationPipeline::new(pipeline_config);
    let mut store = MappingStore::load(config.backend(), MAPPING_FILE).await?;

    info!(
        subsystem = "api",
        component = "cli",
        op = "classify",
        provider = %provider,
        model = %classifier.model_name(),
        candidate_count = classifier.candidates().len(),
        from_snapshot,
        "Starting classification"
    );

    let report = if from_snapshot {
        let source = SnapshotSource::load(&config.chromestatus_path())?;
        pipeline.run(&source, &classifier, &mut store).await?
    } else {
        let source = ChromestatusClient::from_env()?;
        pipeline.run(&source, &classifier, &mut store).await?
    };

    println!(
        "Classified {} entries in {} batches ({} proposals), {} already mapped, {} total",
        report.merged,
        report.batches,
        report.successes,
        report.already_mapped,
        store.len()
    );
    Ok(report)
}

async fn cmd_review(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::load(config).await?;
    let app = router(state.clone(), config.static_dir.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting review server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.flush().await?;
    info!("Review queue flushed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn cmd_export(config: &AppConfig) -> anyhow::Result<ExportOutcome> {
    let backend = config.backend();
    let queue = ReviewStore::new(backend.clone(), MAPPING_REVIEW_FILE)
        .load()
        .await?
        .with_context(|| {
            format!(
                "{} does not exist, run the review step first",
                backend.full_path(MAPPING_REVIEW_FILE).display()
            )
        })?;
    let candidates = load_candidates(&config.web_features_path())?;

    let outcome = export_accepted(&queue, &candidates, &backend, MAPPING_EXPORT_FILE).await?;
    match outcome {
        ExportOutcome::Written { rows } => println!(
            "Exported {} with {} rows",
            backend.full_path(MAPPING_EXPORT_FILE).display(),
            rows
        ),
        ExportOutcome::NothingToExport => println!("No accepted mappings, nothing exported"),
    }
    Ok(outcome)
}
