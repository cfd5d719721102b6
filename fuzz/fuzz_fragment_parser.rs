//! Fuzz target for fragment parsing and index rendering.
//!
//! Run with: cargo +nightly fuzz run fuzz_fragment_parser
//!
//! Whatever a contributor drops into the fragments directory, parsing must
//! not panic, every recovered entry must render, and the rendered manifest
//! must parse back to the same entries.

#![no_main]

use libfuzzer_sys::fuzz_target;
use wisdom_core::manifest::fragment::parse_fragment;
use wisdom_core::manifest::{DEFAULT_INDEX_TITLE, render_index, render_manifest, sort_canonical};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(Some(mut parsed)) = parse_fragment(text) else {
        return;
    };

    sort_canonical(&mut parsed.entries);
    let _ = render_index(DEFAULT_INDEX_TITLE, &parsed.entries);

    let manifest = render_manifest(&parsed.entries).expect("entries serialize");
    let back = parse_fragment(&manifest)
        .expect("manifest is JSON")
        .expect("manifest is an array");
    assert_eq!(back.entries, parsed.entries);
});
