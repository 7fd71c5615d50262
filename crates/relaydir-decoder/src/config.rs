use relaydir_wire::tokenizer::DEFAULT_READ_SIZE;

/// Default bound on chunks queued between the async producer and the
/// decoding consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for a document parse.
///
/// ```text
/// ┌──────────────────┬───────────────────────────────────────────────┐
/// │ Field            │ Purpose                                       │
/// ├──────────────────┼───────────────────────────────────────────────┤
/// │ strict           │ Require the terminal marker (None: format's)  │
/// │ lazy             │ Defer record decoding until first access      │
/// │ read_buffer_size │ Bytes requested from the source per read      │
/// │ queue_capacity   │ Chunks buffered in the async pipeline         │
/// └──────────────────┴───────────────────────────────────────────────┘
/// ```
///
/// A lazy parse still extracts every fingerprint while reading, so the
/// store's keys are complete; only the record bodies wait. A body that
/// fails to decode then surfaces on access instead of failing the parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseConfig {
    /// `Some(true)` rejects a document whose last record is not closed by
    /// the terminal or record end marker, `Some(false)` accepts end of
    /// input in its place. `None` uses the format's own default.
    pub strict: Option<bool>,

    /// Keep chunks undecoded until a record is read.
    pub lazy: bool,

    pub read_buffer_size: usize,

    pub queue_capacity: usize,
}

impl Default for ParseConfig {
    /// Default configuration: format default strictness, lazy decoding,
    /// 64 KiB reads, 256 queued chunks.
    fn default() -> Self {
        Self {
            strict: None,
            lazy: true,
            read_buffer_size: DEFAULT_READ_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ParseConfig {
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    #[must_use]
    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }
}
