/// Explicit config file override; the path must exist when set.
pub(super) const CONFIG_PATH_ENV: &str = "FRAMEGUARD_CONFIG";

pub(super) const CONFIG_FILE_CANDIDATES: [&str; 2] =
    ["/etc/frameguard/frameguard.toml", "frameguard.toml"];

/// Directory holding `forest.model`, `calibrator.cfg` and the feature
/// schema, relative to the working directory unless overridden.
pub(super) const DEFAULT_CONFIG_DIR: &str = "config";

pub(super) const DEFAULT_POLL_INTERVAL_MS: u64 = ingest::DEFAULT_POLL_INTERVAL.as_millis() as u64;
