use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calibrator::{CalibratorWeights, CALIBRATOR_FILE};
use crate::forest::{Forest, FOREST_MODEL_FILE};
use crate::frame::FeatureFrame;
use crate::ruleguard;

/// Model probability below which a frame counts as novel: no class reached
/// even coin-flip confidence.
const NOVELTY_CONFIDENCE_FLOOR: f64 = 0.5;

/// Outcome of scoring one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub ts: f64,
    /// Fused risk in (0, 1).
    pub risk: f64,
    /// Ensemble weight of the cyber class.
    pub p_cyber: f64,
    /// Winning class: 0 benign, 1 cyber, 2 fault. Ties resolve to 0.
    pub best_class: u8,
    /// True when no class reached the confidence floor.
    pub novel: bool,
    /// One-line operator summary of the signals behind `risk`.
    pub reason: String,
}

/// Fuses ensemble, rule and novelty signals into a per-frame risk score.
///
/// Scoring takes `&mut self`: the engine is owned and driven by a single
/// caller, and `last_risk`/`last_reason` are read on that caller's thread
/// between frames. Cross-thread sharing needs an external lock.
#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    forest: Forest,
    weights: CalibratorWeights,
    last_risk: f64,
    last_reason: String,
}

impl RiskEngine {
    pub fn new(forest: Forest, weights: CalibratorWeights) -> Self {
        Self {
            forest,
            weights,
            last_risk: 0.0,
            last_reason: String::new(),
        }
    }

    /// Builds an engine from `forest.model` and `calibrator.cfg` under
    /// `config_dir`. Either file may be missing: scoring then degrades to
    /// the no-signal distribution or the compiled default weights, and the
    /// degradation is logged rather than treated as fatal.
    pub fn from_config_dir(config_dir: &Path) -> Self {
        let model_path = config_dir.join(FOREST_MODEL_FILE);
        let forest = match Forest::load_file(&model_path) {
            Ok(forest) => {
                info!(
                    path = %model_path.display(),
                    trees = forest.tree_count(),
                    "forest model loaded"
                );
                forest
            }
            Err(err) => {
                warn!(
                    path = %model_path.display(),
                    error = %err,
                    "forest model unavailable, scoring degraded to no-signal distribution"
                );
                Forest::default()
            }
        };

        let weights_path = config_dir.join(CALIBRATOR_FILE);
        let weights = match CalibratorWeights::load_file(&weights_path) {
            Ok(weights) => weights,
            Err(err) => {
                warn!(
                    path = %weights_path.display(),
                    error = %err,
                    "calibrator config unavailable, using default fusion weights"
                );
                CalibratorWeights::default()
            }
        };

        Self::new(forest, weights)
    }

    /// Scores one frame and records it as the latest assessment.
    pub fn ingest(&mut self, frame: &FeatureFrame) -> RiskAssessment {
        let proba = self.forest.proba(&frame.features);
        let p_cyber = proba[1];
        let p_max = proba[0].max(proba[1]).max(proba[2]);
        let novel = p_max < NOVELTY_CONFIDENCE_FLOOR;
        let novelty = if novel { 1.0 } else { 0.0 };
        let rule_score = ruleguard::rule_score(frame.guard_bits);
        let risk = self.weights.score(p_cyber, rule_score, novelty);
        let best_class = best_class(&proba);

        let reason = format!(
            "pcyber={:.3} class={} {} nov={}",
            p_cyber,
            best_class,
            ruleguard::reason(frame.guard_bits),
            if novel { "y" } else { "n" }
        );

        self.last_risk = risk;
        self.last_reason.clone_from(&reason);

        RiskAssessment {
            ts: frame.ts,
            risk,
            p_cyber,
            best_class,
            novel,
            reason,
        }
    }

    /// Scores a raw ingest slot block, guard bits in the final slot.
    pub fn ingest_block(&mut self, ts: f64, slots: &[f64]) -> RiskAssessment {
        let frame = FeatureFrame::from_slots(ts, slots);
        self.ingest(&frame)
    }

    pub fn last_risk(&self) -> f64 {
        self.last_risk
    }

    pub fn last_reason(&self) -> &str {
        &self.last_reason
    }

    pub fn weights(&self) -> &CalibratorWeights {
        &self.weights
    }
}

/// Strict pairwise argmax over the three class weights; any tie falls back
/// to class 0.
fn best_class(proba: &[f64; 3]) -> u8 {
    if proba[1] > proba[0] && proba[1] > proba[2] {
        1
    } else if proba[2] > proba[0] && proba[2] > proba[1] {
        2
    } else {
        0
    }
}
