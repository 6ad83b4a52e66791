#![no_main]

use libfuzzer_sys::fuzz_target;
use scoring::{Forest, MODEL_FEATURE_COUNT};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let forest = Forest::from_text(&text);
    let _ = forest.proba(&[0.25; MODEL_FEATURE_COUNT]);
});
