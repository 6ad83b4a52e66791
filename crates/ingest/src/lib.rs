mod framer;
mod schema;
mod source;
mod worker;

pub use framer::{FrameSink, FramerOutcome, RecordFramer};
pub use schema::{FrameLayout, DEFAULT_FEATURE_TOKENS, DEFAULT_GUARD_INDEX, SCHEMA_FILE};
pub use worker::{
    IngestWorker, PipelineConfig, PipelineStats, StopSignal, DEFAULT_CSV_PATH,
    DEFAULT_POLL_INTERVAL, DEFAULT_SOCKET_PATH,
};
