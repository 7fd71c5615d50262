#![no_main]

use libfuzzer_sys::fuzz_target;
use relaydir_wire::DocumentTag;

// Fuzz target: DocumentTag::from_str on arbitrary text.
//
// Any tag that parses must render back to a line that parses to the
// same tag.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tag) = text.parse::<DocumentTag>() {
        let again: DocumentTag = tag.to_string().parse().expect("rendered tag must parse");
        assert_eq!(tag, again);
    }
});
