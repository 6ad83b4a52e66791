use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::constants::{CONFIG_FILE_CANDIDATES, CONFIG_PATH_ENV};
use super::types::AppConfig;
use super::util::{env_non_empty, non_empty};

impl AppConfig {
    /// Applies the first config file found, if any. A missing file keeps
    /// the defaults; a present but unreadable or invalid file fails
    /// startup.
    pub(super) fn apply_file_config(&mut self) -> Result<bool> {
        let Some(path) = resolve_config_path()? else {
            return Ok(false);
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed reading config file {}", path.display()))?;
        let file_cfg: FileConfig = toml::from_str(&raw)
            .with_context(|| format!("failed parsing TOML config {}", path.display()))?;

        self.apply_file_pipeline(file_cfg.pipeline);
        self.apply_file_engine(file_cfg.engine);
        self.apply_file_alert(file_cfg.alert);

        Ok(true)
    }

    fn apply_file_pipeline(&mut self, pipeline: Option<FilePipelineConfig>) {
        let Some(pipeline) = pipeline else {
            return;
        };

        if let Some(v) = non_empty(pipeline.frame_socket) {
            self.frame_socket = PathBuf::from(v);
        }
        if let Some(v) = non_empty(pipeline.frame_csv) {
            self.frame_csv = PathBuf::from(v);
        }
        if let Some(v) = pipeline.poll_interval_ms {
            self.poll_interval_ms = v;
        }
    }

    fn apply_file_engine(&mut self, engine: Option<FileEngineConfig>) {
        let Some(engine) = engine else {
            return;
        };

        if let Some(v) = non_empty(engine.config_dir) {
            self.config_dir = PathBuf::from(v);
        }
    }

    fn apply_file_alert(&mut self, alert: Option<FileAlertConfig>) {
        let Some(alert) = alert else {
            return;
        };

        if let Some(v) = alert.threshold {
            self.risk_threshold = Some(v);
        }
        if let Some(v) = alert.emit_scores {
            self.emit_scores = v;
        }
    }
}

fn resolve_config_path() -> Result<Option<PathBuf>> {
    if let Some(p) = env_non_empty(CONFIG_PATH_ENV) {
        let path = PathBuf::from(p);
        if !path.exists() {
            anyhow::bail!(
                "configured {} does not exist: {}",
                CONFIG_PATH_ENV,
                path.display()
            );
        }
        return Ok(Some(path));
    }

    for candidate in CONFIG_FILE_CANDIDATES {
        let p = Path::new(candidate);
        if p.exists() {
            return Ok(Some(p.to_path_buf()));
        }
    }

    Ok(None)
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    pipeline: Option<FilePipelineConfig>,
    #[serde(default)]
    engine: Option<FileEngineConfig>,
    #[serde(default)]
    alert: Option<FileAlertConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FilePipelineConfig {
    #[serde(default)]
    frame_socket: Option<String>,
    #[serde(default)]
    frame_csv: Option<String>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileEngineConfig {
    #[serde(default)]
    config_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct FileAlertConfig {
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    emit_scores: Option<bool>,
}
