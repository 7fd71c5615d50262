#![no_main]

use libfuzzer_sys::fuzz_target;
use relaydir_types::RelayDescriptor;

// Fuzz target: server descriptor decoding on arbitrary text.
//
// Catches bugs in:
// - PEM object collection after keyword lines
// - Platform splitting
// - Exit rule splitting at the last colon
// - `or-address` parsing
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let _ = RelayDescriptor::extract_fingerprint(&text);
    if let Ok(desc) = RelayDescriptor::decode(&text) {
        let _ = desc.to_string();
        let _ = desc.raw_exit_policy();
    }
});
