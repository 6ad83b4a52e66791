//! Deterministic rule-hit scoring over guard violation bits.
//!
//! Upstream protocol validators set one bit per rule family they saw
//! violated; the bits ride alongside each frame. Scores and reason
//! fragments here depend only on the bit pattern.

/// Labels for the four known rule families, indexed by bit position.
/// Higher bits still count toward the score but carry no label.
pub const RULE_LABELS: [&str; 4] = ["param", "rate", "replay", "mode"];

/// Reason fragment for a frame with no guard bits set.
pub const NO_RULE_HIT: &str = "no-rule-hit";

/// Bits needed to saturate the rule score at 1.0.
const SATURATION_HITS: f64 = 4.0;

/// Saturating rule score: 0.0 for no bits, otherwise popcount / 4 capped
/// at 1.0.
pub fn rule_score(guard_bits: u32) -> f64 {
    let hits = guard_bits.count_ones();
    if hits == 0 {
        return 0.0;
    }
    (f64::from(hits) / SATURATION_HITS).min(1.0)
}

/// Human-readable rule summary: `no-rule-hit`, or `rules:` followed by the
/// labels of the set bits in bit order, space separated.
pub fn reason(guard_bits: u32) -> String {
    if guard_bits == 0 {
        return NO_RULE_HIT.to_string();
    }

    let mut out = String::from("rules:");
    for (bit, label) in RULE_LABELS.iter().enumerate() {
        if guard_bits & (1 << bit) != 0 {
            if !out.ends_with(':') {
                out.push(' ');
            }
            out.push_str(label);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bits_scores_zero() {
        assert_eq!(rule_score(0), 0.0);
        assert_eq!(reason(0), "no-rule-hit");
    }

    #[test]
    fn score_scales_with_popcount() {
        assert_eq!(rule_score(0b0001), 0.25);
        assert_eq!(rule_score(0b0011), 0.5);
        assert_eq!(rule_score(0b0111), 0.75);
        assert_eq!(rule_score(0b1111), 1.0);
    }

    #[test]
    fn score_saturates_above_four_bits() {
        assert_eq!(rule_score(0b11111), 1.0);
        assert_eq!(rule_score(u32::MAX), 1.0);
    }

    #[test]
    fn reason_lists_labels_in_bit_order() {
        assert_eq!(reason(0b0001), "rules:param");
        assert_eq!(reason(0b0101), "rules:param replay");
        assert_eq!(reason(0b1111), "rules:param rate replay mode");
    }

    #[test]
    fn unlabeled_high_bits_score_without_label() {
        assert_eq!(rule_score(0b10000), 0.25);
        assert_eq!(reason(0b10000), "rules:");
    }
}
