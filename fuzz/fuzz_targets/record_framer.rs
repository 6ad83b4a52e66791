#![no_main]

use std::sync::Mutex;

use ingest::{FrameLayout, FrameSink, RecordFramer};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static FRAMER: Lazy<Mutex<RecordFramer>> =
    Lazy::new(|| Mutex::new(RecordFramer::new(FrameLayout::default())));

struct NullSink;

impl FrameSink for NullSink {
    fn dispatch_frame(&mut self, _ts: f64, _slots: &[f64]) {}
}

fuzz_target!(|data: &[u8]| {
    let split = data.first().copied().unwrap_or_default() as usize % data.len().max(1);
    let (head, tail) = data.split_at(split);

    let mut sink = NullSink;
    if let Ok(mut framer) = FRAMER.lock() {
        let _ = framer.push_bytes(head, &mut sink);
        let _ = framer.push_bytes(tail, &mut sink);
        let _ = framer.drain(&mut sink);
    }
});
