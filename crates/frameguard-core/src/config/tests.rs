use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use super::*;

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn clear_env() {
    let vars = [
        "FRAMEGUARD_CONFIG",
        "FRAMEGUARD_FRAME_SOCKET",
        "FRAMEGUARD_FRAME_CSV",
        "FRAMEGUARD_CONFIG_DIR",
        "FRAMEGUARD_POLL_INTERVAL_MS",
        "FRAMEGUARD_RISK_THRESHOLD",
        "FRAMEGUARD_EMIT_SCORES",
    ];
    for v in vars {
        std::env::remove_var(v);
    }
}

fn temp_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("frameguard-{tag}-{nanos}"))
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let cfg = AppConfig::load().expect("load config");
    assert_eq!(cfg.frame_socket, PathBuf::from("/var/run/frameguard.frames"));
    assert_eq!(cfg.frame_csv, PathBuf::from("frames.csv"));
    assert_eq!(cfg.config_dir, PathBuf::from("config"));
    assert_eq!(cfg.poll_interval_ms, 100);
    assert_eq!(cfg.risk_threshold, None);
    assert!(!cfg.emit_scores);
}

#[test]
fn file_config_overrides_defaults() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = temp_path("config.toml");
    std::fs::write(
        &path,
        r#"
[pipeline]
frame_socket = "/tmp/other.frames"
poll_interval_ms = 250

[engine]
config_dir = "/etc/frameguard/models"

[alert]
threshold = 0.8
emit_scores = true
"#,
    )
    .expect("write config file");
    std::env::set_var("FRAMEGUARD_CONFIG", &path);

    let cfg = AppConfig::load().expect("load config");
    assert_eq!(cfg.frame_socket, PathBuf::from("/tmp/other.frames"));
    assert_eq!(cfg.frame_csv, PathBuf::from("frames.csv"));
    assert_eq!(cfg.config_dir, PathBuf::from("/etc/frameguard/models"));
    assert_eq!(cfg.poll_interval_ms, 250);
    assert_eq!(cfg.risk_threshold, Some(0.8));
    assert!(cfg.emit_scores);

    clear_env();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn env_overrides_win_over_file() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = temp_path("config.toml");
    std::fs::write(&path, "[pipeline]\nframe_csv = \"from-file.csv\"\n").expect("write config");
    std::env::set_var("FRAMEGUARD_CONFIG", &path);
    std::env::set_var("FRAMEGUARD_FRAME_CSV", "from-env.csv");
    std::env::set_var("FRAMEGUARD_RISK_THRESHOLD", "0.9");
    std::env::set_var("FRAMEGUARD_EMIT_SCORES", "yes");
    std::env::set_var("FRAMEGUARD_POLL_INTERVAL_MS", "not-a-number");

    let cfg = AppConfig::load().expect("load config");
    assert_eq!(cfg.frame_csv, PathBuf::from("from-env.csv"));
    assert_eq!(cfg.risk_threshold, Some(0.9));
    assert!(cfg.emit_scores);
    // Unparsable numeric overrides are ignored.
    assert_eq!(cfg.poll_interval_ms, 100);

    clear_env();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_explicit_config_path_fails() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    std::env::set_var("FRAMEGUARD_CONFIG", temp_path("no-such.toml"));
    assert!(AppConfig::load().is_err());

    clear_env();
}

#[test]
fn invalid_toml_fails_startup() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let path = temp_path("broken.toml");
    std::fs::write(&path, "[pipeline\nframe_csv = ").expect("write config");
    std::env::set_var("FRAMEGUARD_CONFIG", &path);
    assert!(AppConfig::load().is_err());

    clear_env();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn pipeline_config_carries_resolved_layout() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let cfg = AppConfig::load().expect("load config");
    let layout = ingest::FrameLayout::default();
    let pipeline = cfg.pipeline_config(layout);
    assert_eq!(pipeline.socket_path, cfg.frame_socket);
    assert_eq!(pipeline.csv_path, cfg.frame_csv);
    assert_eq!(pipeline.layout, layout);
    assert_eq!(pipeline.poll_interval.as_millis(), 100);
}
