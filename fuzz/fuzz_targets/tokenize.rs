#![no_main]

use libfuzzer_sys::fuzz_target;
use relaydir_wire::{Layout, RecordTokenizer, Token};

const LAYOUTS: [Layout; 2] = [
    Layout {
        start: "r ",
        terminal: Some("directory-signature"),
        record_end: None,
    },
    Layout {
        start: "router ",
        terminal: None,
        record_end: Some("-----END SIGNATURE-----"),
    },
];

// Fuzz target: record boundaries must not depend on how input is split.
//
// Splits the whole input at once, then feeds it one byte at a time and
// compares. Catches bugs in:
// - Resuming a boundary search across feeds
// - Line anchoring at buffer edges
// - Terminal-versus-start ordering
// - Skipping bytes between closed records
fuzz_target!(|data: &[u8]| {
    for layout in LAYOUTS {
        compare(layout, data);
    }
});

fn compare(layout: Layout, data: &[u8]) {
    let bulk = RecordTokenizer::split_complete(layout, data);

    let mut tokenizer = RecordTokenizer::new(layout);
    let mut chunks = Vec::new();
    let mut rest = data.iter();
    let dripped = loop {
        match tokenizer.next_token(rest.len() == 0) {
            Ok(Token::Chunk(chunk) | Token::Final(chunk)) => chunks.push(chunk),
            Ok(Token::Done) => break Ok(chunks),
            Ok(Token::NeedMore) => {
                if let Some(byte) = rest.next() {
                    tokenizer.feed(std::slice::from_ref(byte));
                }
            }
            Err(err) => break Err(err),
        }
    };

    match (bulk, dripped) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("bulk {a:?} disagrees with byte-wise {b:?}"),
    }
}
