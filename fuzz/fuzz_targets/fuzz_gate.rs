//! Fuzz target for the version gate.
//!
//! Feeds arbitrary header bytes and constraints through the gate and checks
//! that it never panics and that every decision is consistent with the
//! constraint it was given.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_gate -- -max_total_time=60
//! ```

#![no_main]

use api_version_gate::version::parse_version;
use api_version_gate::{VersionConstraint, VersionGate};
use arbitrary::Arbitrary;
use axum::http::{HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    header_required: bool,
    min_version: f32,
    max_version: f32,
    header: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let gate = VersionGate::default();
    let constraint = VersionConstraint::from_sentinels(
        input.header_required,
        input.min_version,
        input.max_version,
    );

    // Raw bytes as they arrive on the wire
    if let Ok(value) = HeaderValue::from_bytes(&input.header) {
        let mut headers = HeaderMap::new();
        headers.insert("version", value);
        let decision = gate.evaluate_headers(&constraint, &headers);

        if let Some(payload) = decision.rejection() {
            assert_eq!(payload, &gate.rejection(&constraint));
        }
    }

    if let Ok(text) = std::str::from_utf8(&input.header) {
        let decision = gate.evaluate(&constraint, Some(text));

        match parse_version(text) {
            Some(version) if !text.is_empty() => {
                assert_eq!(decision.is_accept(), constraint.contains(version));
            }
            None if !text.is_empty() => assert!(decision.is_reject()),
            _ => {}
        }
    }

    assert_eq!(
        gate.evaluate(&constraint, None).is_accept(),
        !input.header_required
    );
});
