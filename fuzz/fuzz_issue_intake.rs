//! Fuzz target for issue-body intake.
//!
//! Run with: cargo +nightly fuzz run fuzz_issue_intake
//!
//! Issue bodies are free text from anyone; extraction may fail but must not
//! panic, nor may rendering the extracted values as shell assignments.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wisdom_core::intake::IssueVars;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(vars) = IssueVars::from_issue_body(body) {
        let _ = vars.to_shell_env();
    }
});
