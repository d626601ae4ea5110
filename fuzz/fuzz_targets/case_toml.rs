#![no_main]

use std::path::PathBuf;

use caseflow_case_runner::{LoadDefaults, parse_case};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // TOML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = parse_case(
            content,
            "fuzz-case".to_owned(),
            PathBuf::from("/tmp/fuzz-case"),
            &LoadDefaults::default(),
        );
    }
});
