use std::path::PathBuf;
use std::time::Duration;

use ingest::{FrameLayout, PipelineConfig};

use super::constants::{DEFAULT_CONFIG_DIR, DEFAULT_POLL_INTERVAL_MS};

/// Runtime settings for the scoring daemon, layered from compiled defaults,
/// an optional TOML file and `FRAMEGUARD_*` environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub frame_socket: PathBuf,
    pub frame_csv: PathBuf,
    pub config_dir: PathBuf,
    pub poll_interval_ms: u64,
    /// When set, wins over the threshold from the calibrator file.
    pub risk_threshold: Option<f64>,
    /// Emit one JSON assessment line per frame on stdout.
    pub emit_scores: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_socket: PathBuf::from(ingest::DEFAULT_SOCKET_PATH),
            frame_csv: PathBuf::from(ingest::DEFAULT_CSV_PATH),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            risk_threshold: None,
            emit_scores: false,
        }
    }
}

impl AppConfig {
    pub fn pipeline_config(&self, layout: FrameLayout) -> PipelineConfig {
        PipelineConfig {
            socket_path: self.frame_socket.clone(),
            csv_path: self.frame_csv.clone(),
            layout,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
