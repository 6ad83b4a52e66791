use serde::{Deserialize, Serialize};

/// Width of the model input vector.
pub const MODEL_FEATURE_COUNT: usize = 18;

/// Measured telemetry features per frame; the remaining two slots are
/// synthesized, not parsed.
pub const MEASURED_FEATURE_COUNT: usize = 16;

/// Reserved slot, always 0.0. Kept so trained models and live frames agree
/// on feature indices.
pub const RESERVED_RULE_SLOT: usize = 16;

/// Final slot, carries the guard violation bits as a float so tree splits
/// can condition on them.
pub const GUARD_ECHO_SLOT: usize = 17;

/// Column names of the model input vector, in slot order.
pub const FEATURE_NAMES: [&str; MODEL_FEATURE_COUNT] = [
    "bytes_per_s",
    "pkts_per_s",
    "iat_p50_ms",
    "iat_p95_ms",
    "retrans_pct",
    "ttl_var",
    "win_var",
    "flow_delta",
    "fivetuple_changes",
    "opcode",
    "subsystem",
    "mode",
    "param_bucket",
    "seq_gap",
    "resp_delay_ms",
    "ack_flag_rate",
    "rule_score",
    "guard_violation_bits",
];

/// One scoring-ready telemetry frame: a timestamp, the fixed-width feature
/// vector and the raw guard bits it echoes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    pub ts: f64,
    pub features: [f64; MODEL_FEATURE_COUNT],
    pub guard_bits: u32,
}

impl FeatureFrame {
    /// Builds a frame from measured features. Surplus values beyond
    /// [`MEASURED_FEATURE_COUNT`] are dropped, missing ones stay zero.
    pub fn new(ts: f64, measured: &[f64], guard_bits: u32) -> Self {
        let mut features = [0.0; MODEL_FEATURE_COUNT];
        let count = measured.len().min(MEASURED_FEATURE_COUNT);
        features[..count].copy_from_slice(&measured[..count]);
        features[GUARD_ECHO_SLOT] = f64::from(guard_bits);
        Self {
            ts,
            features,
            guard_bits,
        }
    }

    /// Builds a frame from an ingest slot block, where the final slot is the
    /// guard bits and every preceding slot is a measured feature.
    ///
    /// The guard float saturates into `u32` range, so negative or oversized
    /// values clamp instead of wrapping.
    pub fn from_slots(ts: f64, slots: &[f64]) -> Self {
        let Some((&guard_slot, measured)) = slots.split_last() else {
            return Self::new(ts, &[], 0);
        };
        Self::new(ts, measured, guard_slot as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_zero_fills_and_echoes_guard() {
        let frame = FeatureFrame::new(1.5, &[0.25, 0.5], 0b101);
        assert_eq!(frame.features[0], 0.25);
        assert_eq!(frame.features[1], 0.5);
        assert_eq!(frame.features[2], 0.0);
        assert_eq!(frame.features[RESERVED_RULE_SLOT], 0.0);
        assert_eq!(frame.features[GUARD_ECHO_SLOT], 5.0);
        assert_eq!(frame.guard_bits, 5);
    }

    #[test]
    fn new_drops_surplus_features() {
        let wide = [1.0; 32];
        let frame = FeatureFrame::new(0.0, &wide, 0);
        assert_eq!(frame.features[MEASURED_FEATURE_COUNT - 1], 1.0);
        assert_eq!(frame.features[RESERVED_RULE_SLOT], 0.0);
    }

    #[test]
    fn from_slots_takes_guard_from_final_slot() {
        let slots = [0.1, 0.2, 0.3, 7.0];
        let frame = FeatureFrame::from_slots(2.0, &slots);
        assert_eq!(frame.guard_bits, 7);
        assert_eq!(frame.features[0], 0.1);
        assert_eq!(frame.features[2], 0.3);
        assert_eq!(frame.features[3], 0.0);
        assert_eq!(frame.features[GUARD_ECHO_SLOT], 7.0);
    }

    #[test]
    fn from_slots_saturates_guard_cast() {
        let frame = FeatureFrame::from_slots(0.0, &[-3.0]);
        assert_eq!(frame.guard_bits, 0);
        let frame = FeatureFrame::from_slots(0.0, &[1e12]);
        assert_eq!(frame.guard_bits, u32::MAX);
    }

    #[test]
    fn from_slots_empty_is_all_zero() {
        let frame = FeatureFrame::from_slots(0.0, &[]);
        assert_eq!(frame.guard_bits, 0);
        assert!(frame.features.iter().all(|&v| v == 0.0));
    }
}
