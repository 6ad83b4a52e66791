use std::fmt;
use std::fs;
use std::path::Path;

/// Model file name expected under the engine config directory.
pub const FOREST_MODEL_FILE: &str = "forest.model";

/// Ensemble output when no tree contributes weight: near-uniform over the
/// three classes, marking the frame as low confidence.
pub(crate) const NO_SIGNAL_DISTRIBUTION: [f64; 3] = [0.34, 0.33, 0.33];

/// Tokens per serialized node record: positional index, feature, threshold,
/// left, right and three class weights.
const NODE_TOKENS: usize = 8;

#[derive(Debug)]
pub enum ForestError {
    Io(std::io::Error),
}

impl fmt::Display for ForestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "model file io error: {err}"),
        }
    }
}

impl std::error::Error for ForestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ForestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// One node of a serialized decision tree. Child fields index into the
/// owning tree's node vector; a node is a leaf when both are negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub leaf: bool,
    pub class_weights: [f64; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForestTree {
    pub nodes: Vec<ForestNode>,
}

impl ForestTree {
    /// Walks from the root to a leaf. Steps are bounded by the node count
    /// and every index is checked, so a cyclic or truncated model escapes
    /// with `None` instead of spinning or panicking.
    fn walk(&self, features: &[f64]) -> Option<&ForestNode> {
        let mut index = 0usize;
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(index)?;
            if node.leaf {
                return Some(node);
            }
            let value = *features.get(usize::try_from(node.feature).ok()?)?;
            let child = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            index = usize::try_from(child).ok()?;
        }
        None
    }
}

/// Decision-tree ensemble over [`MODEL_FEATURE_COUNT`]-wide frames.
///
/// [`MODEL_FEATURE_COUNT`]: crate::MODEL_FEATURE_COUNT
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    pub trees: Vec<ForestTree>,
}

impl Forest {
    /// Reads a serialized model. An unreadable file is the only error;
    /// malformed content degrades through [`Forest::from_text`] instead.
    pub fn load_file(path: &Path) -> Result<Self, ForestError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// Parses the `n_trees`/`tree` token stream. Parsing is permissive:
    /// missing or unparsable numeric tokens read as zero, and declared
    /// counts are clamped to what the remaining tokens can back so a
    /// corrupt header cannot force a huge allocation. Garbage input
    /// therefore yields an empty forest, never a failure.
    pub fn from_text(text: &str) -> Self {
        let mut cursor = TokenCursor::new(text);
        cursor.next_token();
        let declared_trees = cursor.next_usize();
        let tree_count = declared_trees.min(cursor.remaining() / 2);
        let mut trees = Vec::with_capacity(tree_count);

        for _ in 0..tree_count {
            cursor.next_token();
            let declared_nodes = cursor.next_usize();
            let node_count = declared_nodes.min(cursor.remaining() / NODE_TOKENS);
            let mut nodes = Vec::with_capacity(node_count);

            for _ in 0..node_count {
                // Leading positional index is redundant with vector order.
                cursor.next_i64();
                let feature = cursor.next_i64() as i32;
                let threshold = cursor.next_f64();
                let left = cursor.next_i64() as i32;
                let right = cursor.next_i64() as i32;
                let class_weights = [cursor.next_f64(), cursor.next_f64(), cursor.next_f64()];
                nodes.push(ForestNode {
                    feature,
                    threshold,
                    left,
                    right,
                    leaf: left < 0 && right < 0,
                    class_weights,
                });
            }

            trees.push(ForestTree { nodes });
        }

        Self { trees }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Mean-ensemble class distribution for one frame.
    ///
    /// Each tree contributes its leaf's class weights; trees that escape on
    /// malformed links contribute nothing. If the accumulated total is not
    /// positive the near-uniform no-signal distribution is returned.
    pub fn proba(&self, features: &[f64]) -> [f64; 3] {
        let mut acc = [0.0f64; 3];
        for tree in &self.trees {
            let Some(leaf) = tree.walk(features) else {
                continue;
            };
            for (slot, weight) in acc.iter_mut().zip(leaf.class_weights.iter()) {
                *slot += weight;
            }
        }

        let total: f64 = acc.iter().sum();
        if total <= 0.0 {
            return NO_SIGNAL_DISTRIBUTION;
        }
        [acc[0] / total, acc[1] / total, acc[2] / total]
    }
}

struct TokenCursor<'a> {
    tokens: std::str::SplitWhitespace<'a>,
    remaining: usize,
}

impl<'a> TokenCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace(),
            remaining: text.split_whitespace().count(),
        }
    }

    fn remaining(&self) -> usize {
        self.remaining
    }

    fn next_token(&mut self) -> &'a str {
        let token = self.tokens.next().unwrap_or("");
        self.remaining = self.remaining.saturating_sub(1);
        token
    }

    fn next_i64(&mut self) -> i64 {
        self.next_token().parse().unwrap_or(0)
    }

    fn next_usize(&mut self) -> usize {
        self.next_token().parse().unwrap_or(0)
    }

    fn next_f64(&mut self) -> f64 {
        self.next_token().parse().unwrap_or(0.0)
    }
}
