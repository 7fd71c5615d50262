#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relaydir_decoder::registry::FORMATS;
use relaydir_decoder::{DocumentParser, ParseConfig};

#[derive(Arbitrary, Debug)]
struct Input {
    format: u8,
    strict: Option<bool>,
    eager: bool,
    read_size: u8,
    body: Vec<u8>,
}

// Fuzz target: the full single-pass parser over every registered format.
//
// Every stored handle must resolve or report a field error, never panic.
fuzz_target!(|input: Input| {
    let format = FORMATS[usize::from(input.format) % FORMATS.len()];
    let mut config = ParseConfig {
        strict: input.strict,
        read_buffer_size: usize::from(input.read_size).max(1),
        ..ParseConfig::default()
    };
    if input.eager {
        config = config.eager();
    }

    if let Ok(document) = DocumentParser::with_config(format, config).parse(&input.body[..]) {
        for record in document.store.iter(None) {
            let _ = record;
        }
    }
});
