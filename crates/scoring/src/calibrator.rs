use std::fmt;
use std::fs;
use std::path::Path;

use crate::math::sigmoid;

/// Calibrator file name expected under the engine config directory.
pub const CALIBRATOR_FILE: &str = "calibrator.cfg";

#[derive(Debug)]
pub enum CalibratorError {
    Io(std::io::Error),
}

impl fmt::Display for CalibratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "calibrator file io error: {err}"),
        }
    }
}

impl std::error::Error for CalibratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CalibratorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Sigmoid fusion weights for the three risk signals plus a bias term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratorWeights {
    pub w_pcyber: f64,
    pub w_rule: f64,
    pub w_novelty: f64,
    pub bias: f64,
}

impl Default for CalibratorWeights {
    fn default() -> Self {
        Self {
            w_pcyber: 2.0,
            w_rule: 1.0,
            w_novelty: 1.0,
            bias: -1.0,
        }
    }
}

impl CalibratorWeights {
    /// Reads weights from a `key value` pair file. An unreadable file is
    /// the only error; any content parses via [`CalibratorWeights::from_text`].
    pub fn load_file(path: &Path) -> Result<Self, CalibratorError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// Parses whitespace-separated `key value` pairs. Unknown keys are
    /// skipped, keys present keep their last value, and scanning stops at
    /// the first unparsable value token. Absent keys keep their defaults.
    pub fn from_text(text: &str) -> Self {
        let mut weights = Self::default();
        scan_pairs(text, |key, value| match key {
            "w_pcyber" => weights.w_pcyber = value,
            "w_rule" => weights.w_rule = value,
            "w_novelty" => weights.w_novelty = value,
            "bias" => weights.bias = value,
            _ => {}
        });
        weights
    }

    /// Fused risk in (0, 1): a numerically stable sigmoid over the weighted
    /// signal sum.
    pub fn score(&self, p_cyber: f64, rule_score: f64, novelty: f64) -> f64 {
        sigmoid(
            self.w_pcyber * p_cyber + self.w_rule * rule_score + self.w_novelty * novelty
                + self.bias,
        )
    }
}

/// Scans the same pair format for an alert threshold under `threshold` or
/// `tau`. Returns `None` when neither key appears before the scan stops.
pub fn parse_threshold(text: &str) -> Option<f64> {
    let mut threshold = None;
    scan_pairs(text, |key, value| {
        if key == "threshold" || key == "tau" {
            threshold = Some(value);
        }
    });
    threshold
}

/// Drives `apply` with each `key value` pair until tokens run out or a
/// value fails to parse.
fn scan_pairs(text: &str, mut apply: impl FnMut(&str, f64)) {
    let mut tokens = text.split_whitespace();
    while let (Some(key), Some(value)) = (tokens.next(), tokens.next()) {
        let Ok(value) = value.parse::<f64>() else {
            break;
        };
        apply(key, value);
    }
}
