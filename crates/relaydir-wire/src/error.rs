use crate::tokenizer::Chunk;

/// Errors produced below the record level: the document tag, record
/// boundaries, and the byte source feeding the tokenizer.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The leading `@type <name> <major>.<minor>` line did not parse.
    #[error("malformed document tag: {line:?}")]
    MalformedHeader { line: String },

    /// No record boundary could be established.
    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    /// I/O error while pulling more bytes from the source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Boundary-search failures, kept apart from I/O failures so that a
/// caller can tolerate an unterminated tail while still rejecting a
/// document with no records at all.
///
/// ```text
///   BoundaryError
///   ├── MissingStartMarker  ← no "\n<start>" where a record must begin
///   └── Unterminated        ← input ended inside a record, tail attached
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// End of input was reached without a record start where one was
    /// needed: before the first record, or after the last closed record
    /// of a layout with a record end marker.
    #[error("cannot find beginning of record: {marker:?}")]
    MissingStartMarker { marker: &'static str },

    /// End of input was reached inside a record, with neither a next
    /// record start nor the terminal marker in sight. For layouts with a
    /// record end line, `terminal` names that line instead.
    ///
    /// `partial` holds the trailing record text so a non-strict caller
    /// can treat end-of-input as an implicit terminal.
    #[error("cannot find end of record: neither {start:?} nor {terminal:?} follows")]
    Unterminated {
        start: &'static str,
        terminal: &'static str,
        partial: Chunk,
    },
}
