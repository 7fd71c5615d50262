//! Shared helpers for the relaydir integration tests and benches.
//!
//! Golden documents live in `tests/golden/` and are stored the way
//! archives publish them: an `@type` line followed by the document body.

#![warn(clippy::pedantic)]

use std::path::Path;
use std::sync::Once;

use relaydir_decoder::ObjectStore;
use relaydir_types::Fingerprint;
use relaydir_wire::DocumentTag;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// `RUST_LOG` overrides the default `warn,relaydir_decoder=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,relaydir_decoder=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
            .init();
    });
}

/// Read `tests/golden/<name>` as text.
///
/// # Panics
///
/// If the fixture is missing.
#[must_use]
pub fn golden(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/golden")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()))
}

/// Split the leading `@type` line off an archived document.
///
/// # Panics
///
/// If the first line is not a well-formed tag.
#[must_use]
pub fn split_tag(text: &str) -> (DocumentTag, &str) {
    let (first, body) = text.split_once('\n').unwrap_or((text, ""));
    let tag = first
        .parse()
        .unwrap_or_else(|e| panic!("bad tag line {first:?}: {e}"));
    (tag, body)
}

/// Fingerprints in a store, sorted.
#[must_use]
pub fn sorted_fingerprints(store: &ObjectStore) -> Vec<Fingerprint> {
    let mut fingerprints: Vec<_> = store.fingerprints().cloned().collect();
    fingerprints.sort();
    fingerprints
}

/// One canonical string per record, in fingerprint order.
///
/// # Panics
///
/// If any record fails to decode.
#[must_use]
pub fn canonical_lines(store: &ObjectStore) -> String {
    sorted_fingerprints(store)
        .iter()
        .filter_map(|fingerprint| store.try_get(fingerprint))
        .map(|decoded| match decoded {
            Ok(record) => record.to_string(),
            Err(e) => panic!("record failed to decode: {e}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
