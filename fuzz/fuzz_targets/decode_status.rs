#![no_main]

use libfuzzer_sys::fuzz_target;
use relaydir_types::RelayStatusEntry;

// Fuzz target: status entry decoding on arbitrary text.
//
// Catches bugs in:
// - Base64 identity and digest handling
// - Bracketed IPv6 `a` lines
// - `w` line key=value splitting
// The cheap fingerprint scan must agree with a full decode.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(entry) = RelayStatusEntry::decode(&text) {
        let _ = entry.to_string();
        assert_eq!(
            RelayStatusEntry::extract_fingerprint(&text).ok(),
            Some(entry.fingerprint)
        );
    }
});
