mod alert;
mod config;

use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::info;

use alert::AlertSink;
use config::AppConfig;
use ingest::{FrameLayout, IngestWorker};
use scoring::RiskEngine;

const STATS_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let config = AppConfig::load()?;

    let layout = FrameLayout::resolve(&config.config_dir.join(ingest::SCHEMA_FILE));
    let engine = RiskEngine::from_config_dir(&config.config_dir);
    let threshold = alert::resolve_threshold(&config.config_dir, config.risk_threshold);
    let sink = AlertSink::new(engine, threshold, config.emit_scores);
    let worker = IngestWorker::spawn(config.pipeline_config(layout), sink)?;

    info!(
        socket = %config.frame_socket.display(),
        fallback_csv = %config.frame_csv.display(),
        config_dir = %config.config_dir.display(),
        threshold,
        emit_scores = config.emit_scores,
        "frameguard core started"
    );

    let mut stats_tick = tokio::time::interval(STATS_INTERVAL);
    // The first interval tick completes immediately; skip it.
    stats_tick.tick().await;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            _ = stats_tick.tick() => {
                let stats = worker.stats();
                info!(
                    frames = stats.frames_dispatched,
                    rejected = stats.records_rejected,
                    bytes = stats.bytes_read,
                    source_switches = stats.source_switches,
                    "frame pipeline stats"
                );
            }
        }
    }

    let stats = worker.stop();
    info!(
        frames = stats.frames_dispatched,
        rejected = stats.records_rejected,
        "frameguard stopped"
    );
    Ok(())
}
