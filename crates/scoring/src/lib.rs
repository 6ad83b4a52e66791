mod calibrator;
mod forest;
mod frame;
mod math;
pub mod ruleguard;
mod risk;

pub use calibrator::{parse_threshold, CalibratorError, CalibratorWeights, CALIBRATOR_FILE};
pub use forest::{Forest, ForestError, ForestNode, ForestTree, FOREST_MODEL_FILE};
pub use frame::{
    FeatureFrame, FEATURE_NAMES, GUARD_ECHO_SLOT, MEASURED_FEATURE_COUNT, MODEL_FEATURE_COUNT,
    RESERVED_RULE_SLOT,
};
pub use risk::{RiskAssessment, RiskEngine};
