#![no_main]

use caseflow_case_runner::CaseRunnerError;
use caseflow_case_runner::substitute;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut lookup = |_: &str| Ok::<String, CaseRunnerError>("value".to_owned());
        let _ = substitute(input, &mut lookup);
    }
});
