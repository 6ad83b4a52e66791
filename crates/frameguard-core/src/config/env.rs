use std::path::PathBuf;

use super::types::AppConfig;
use super::util::{env_non_empty, parse_bool};

impl AppConfig {
    pub(super) fn apply_env_overrides(&mut self) {
        if let Some(v) = env_non_empty("FRAMEGUARD_FRAME_SOCKET") {
            self.frame_socket = PathBuf::from(v);
        }
        if let Some(v) = env_non_empty("FRAMEGUARD_FRAME_CSV") {
            self.frame_csv = PathBuf::from(v);
        }
        if let Some(v) = env_non_empty("FRAMEGUARD_CONFIG_DIR") {
            self.config_dir = PathBuf::from(v);
        }
        if let Some(v) = env_non_empty("FRAMEGUARD_POLL_INTERVAL_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.poll_interval_ms = parsed;
            }
        }
        if let Some(v) = env_non_empty("FRAMEGUARD_RISK_THRESHOLD") {
            if let Ok(parsed) = v.parse::<f64>() {
                self.risk_threshold = Some(parsed);
            }
        }
        if let Some(v) = env_non_empty("FRAMEGUARD_EMIT_SCORES") {
            self.emit_scores = parse_bool(&v);
        }
    }
}
