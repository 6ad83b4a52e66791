use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use ingest::FrameSink;
use scoring::{parse_threshold, RiskEngine, CALIBRATOR_FILE};

/// Alert cutoff when neither the config nor the calibrator file names one.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.5;

/// Resolves the alert threshold: an explicit override wins, then a
/// `threshold`/`tau` entry in the calibrator file, then the default.
pub fn resolve_threshold(config_dir: &Path, override_threshold: Option<f64>) -> f64 {
    if let Some(threshold) = override_threshold {
        return threshold;
    }

    let path = config_dir.join(CALIBRATOR_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => match parse_threshold(&text) {
            Some(threshold) => {
                info!(path = %path.display(), threshold, "alert threshold from calibrator file");
                threshold
            }
            None => DEFAULT_RISK_THRESHOLD,
        },
        Err(err) => {
            debug!(
                path = %path.display(),
                error = %err,
                "no calibrator threshold, using default"
            );
            DEFAULT_RISK_THRESHOLD
        }
    }
}

/// Scores every dispatched frame and raises a log alert when the fused
/// risk crosses the threshold.
pub struct AlertSink {
    engine: RiskEngine,
    threshold: f64,
    emit_scores: bool,
}

impl AlertSink {
    pub fn new(engine: RiskEngine, threshold: f64, emit_scores: bool) -> Self {
        Self {
            engine,
            threshold,
            emit_scores,
        }
    }
}

impl FrameSink for AlertSink {
    fn dispatch_frame(&mut self, ts: f64, slots: &[f64]) {
        let assessment = self.engine.ingest_block(ts, slots);
        debug!(
            ts = assessment.ts,
            risk = assessment.risk,
            class = assessment.best_class,
            reason = %assessment.reason,
            "frame scored"
        );

        if assessment.risk > self.threshold {
            warn!(
                ts = assessment.ts,
                risk = assessment.risk,
                threshold = self.threshold,
                reason = %assessment.reason,
                "risk threshold exceeded"
            );
        }

        if self.emit_scores {
            match serde_json::to_string(&assessment) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, "failed encoding assessment"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use ingest::{FrameLayout, RecordFramer};
    use scoring::CalibratorWeights;

    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("frameguard-{tag}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn canonical_record(ts: f64, guard: u32) -> String {
        let features: Vec<String> = (0..16).map(|i| format!("0.{:02}", i + 1)).collect();
        format!("{ts},{},{guard}\n", features.join(","))
    }

    #[test]
    fn threshold_override_wins() {
        let dir = temp_dir("tau-override");
        std::fs::write(dir.join(CALIBRATOR_FILE), "threshold 0.9").expect("write calibrator");
        assert_eq!(resolve_threshold(&dir, Some(0.3)), 0.3);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn threshold_reads_calibrator_keys() {
        let dir = temp_dir("tau-file");
        std::fs::write(dir.join(CALIBRATOR_FILE), "w_rule 1.5 tau 0.65").expect("write calibrator");
        assert_eq!(resolve_threshold(&dir, None), 0.65);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn threshold_defaults_when_unconfigured() {
        let dir = temp_dir("tau-default");
        assert_eq!(resolve_threshold(&dir, None), DEFAULT_RISK_THRESHOLD);

        std::fs::write(dir.join(CALIBRATOR_FILE), "w_rule 1.5").expect("write calibrator");
        assert_eq!(resolve_threshold(&dir, None), DEFAULT_RISK_THRESHOLD);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sink_scores_framed_records_end_to_end() {
        // Degraded engine: no model file, so scoring runs on the no-signal
        // distribution and flags every frame novel.
        let mut sink = AlertSink::new(RiskEngine::default(), DEFAULT_RISK_THRESHOLD, false);
        let mut framer = RecordFramer::new(FrameLayout::default());

        let outcome = framer.push_bytes(canonical_record(0.5, 5).as_bytes(), &mut sink);
        assert_eq!(outcome.dispatched, 1);

        let reason = sink.engine.last_reason();
        assert!(reason.contains("rules:param replay"));
        assert!(reason.ends_with("nov=y"));
        assert!(sink.engine.last_risk() > 0.0 && sink.engine.last_risk() < 1.0);
    }

    #[test]
    fn sink_risk_matches_calibrated_fusion() {
        let weights = CalibratorWeights::default();
        let mut sink = AlertSink::new(
            RiskEngine::new(scoring::Forest::default(), weights),
            DEFAULT_RISK_THRESHOLD,
            false,
        );
        let mut framer = RecordFramer::new(FrameLayout::default());
        framer.push_bytes(canonical_record(1.0, 0b1111).as_bytes(), &mut sink);

        // No-signal distribution: p_cyber 0.33, novelty on, rule score 1.0.
        let expected = weights.score(0.33, 1.0, 1.0);
        assert!((sink.engine.last_risk() - expected).abs() < 1e-12);
    }
}
