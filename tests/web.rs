//! Browser-only checks, run with `wasm-pack test --headless --chrome`
#![cfg(target_arch = "wasm32")]

use tab_activity_tracker::extract_hostname;
use tab_activity_tracker::host::{Clock, SystemClock};
use tab_activity_tracker::tracker::format_timestamp;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_extract_hostname_export() {
    assert_eq!(extract_hostname("https://www.Example.com/path"), "Example.com");
    assert_eq!(extract_hostname("Unknown"), "invalid");
}

#[wasm_bindgen_test]
fn test_clock_reads_browser_time() {
    let formatted = format_timestamp(&SystemClock.now());
    assert!(formatted.ends_with('Z'));
    assert!(!formatted.starts_with("1970"));
}
