use std::fs;
use std::path::Path;

use tracing::{info, warn};

/// Schema file name expected under the engine config directory.
pub const SCHEMA_FILE: &str = "feature_schema.csv";

/// Compiled layout: 16 measured features, guard bits in column 17.
pub const DEFAULT_FEATURE_TOKENS: usize = 16;
pub const DEFAULT_GUARD_INDEX: usize = 17;

/// Column layout of one raw record: how many tokens after the timestamp are
/// measured features, and which token carries the guard violation bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub feature_tokens: usize,
    pub guard_index: usize,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            feature_tokens: DEFAULT_FEATURE_TOKENS,
            guard_index: DEFAULT_GUARD_INDEX,
        }
    }
}

impl FrameLayout {
    /// Slots per dispatched frame: the measured features plus one trailing
    /// guard slot.
    pub fn frame_slots(&self) -> usize {
        self.feature_tokens + 1
    }

    /// Resolves the layout from a schema CSV header. A missing or
    /// unreadable file keeps the compiled layout; resolution never fails.
    pub fn resolve(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let layout = Self::from_header(text.lines().next().unwrap_or(""));
                info!(
                    path = %path.display(),
                    feature_tokens = layout.feature_tokens,
                    guard_index = layout.guard_index,
                    "frame layout resolved"
                );
                layout
            }
            Err(err) => {
                info!(
                    path = %path.display(),
                    error = %err,
                    "feature schema not readable, keeping compiled layout"
                );
                Self::default()
            }
        }
    }

    /// Derives the layout from the header row: the final column is the
    /// guard column and everything between the timestamp and the guard is a
    /// feature. Headers too narrow to hold all three roles keep the
    /// compiled layout.
    pub fn from_header(header: &str) -> Self {
        let columns = header.split(',').count();
        if columns < 3 {
            warn!(columns, "feature schema too narrow, keeping compiled layout");
            return Self::default();
        }

        let guard_index = columns - 1;
        if guard_index <= 1 {
            warn!(guard_index, "guard column would shadow the timestamp, keeping compiled layout");
            return Self::default();
        }

        Self {
            feature_tokens: guard_index - 1,
            guard_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_compiled_constants() {
        let layout = FrameLayout::default();
        assert_eq!(layout.feature_tokens, 16);
        assert_eq!(layout.guard_index, 17);
        assert_eq!(layout.frame_slots(), 17);
    }

    #[test]
    fn header_with_full_schema_sets_guard_to_final_column() {
        // ts + 16 features + guard = 18 columns.
        let header = (0..18).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");
        let layout = FrameLayout::from_header(&header);
        assert_eq!(layout.guard_index, 17);
        assert_eq!(layout.feature_tokens, 16);
    }

    #[test]
    fn wide_header_extends_layout() {
        let header = (0..19).map(|i| format!("c{i}")).collect::<Vec<_>>().join(",");
        let layout = FrameLayout::from_header(&header);
        assert_eq!(layout.feature_tokens, 17);
        assert_eq!(layout.guard_index, 18);
    }

    #[test]
    fn narrow_headers_keep_compiled_layout() {
        assert_eq!(FrameLayout::from_header(""), FrameLayout::default());
        assert_eq!(FrameLayout::from_header("ts"), FrameLayout::default());
        assert_eq!(FrameLayout::from_header("ts,guard"), FrameLayout::default());
    }

    #[test]
    fn minimal_schema_resolves_one_feature() {
        let layout = FrameLayout::from_header("ts,bytes_per_s,guard_violation_bits");
        assert_eq!(layout.guard_index, 2);
        assert_eq!(layout.feature_tokens, 1);
        assert_eq!(layout.frame_slots(), 2);
    }

    #[test]
    fn resolve_missing_file_keeps_compiled_layout() {
        let path = std::env::temp_dir().join("frameguard-no-such-schema.csv");
        assert_eq!(FrameLayout::resolve(&path), FrameLayout::default());
    }
}
