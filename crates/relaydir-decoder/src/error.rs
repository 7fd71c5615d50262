use relaydir_types::FieldError;
use relaydir_wire::{BoundaryError, WireError};

/// Errors that abort a document parse.
///
/// A parse is all-or-nothing: the first error ends it and no partial
/// store is returned. A store lookup miss is not an error; it is `None`.
///
/// Error hierarchy:
///
/// ```text
///   ParseError
///   ├── MalformedHeader        ← `@type` line did not parse
///   ├── UnknownDocumentType    ← no format registered for the tag
///   ├── MissingStartMarker     ← no record at all
///   ├── UnterminatedRecord     ← strict parse, terminal marker missing
///   ├── FieldDecode(FieldError)← from relaydir-types record decoding
///   ├── Io(std::io::Error)     ← from the byte source
///   └── PipelineClosed         ← async producer task died
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed document tag: {line:?}")]
    MalformedHeader { line: String },

    #[error("no decoder registered for document type {type_name:?}")]
    UnknownDocumentType { type_name: String },

    /// Input ended before the first record start.
    #[error("cannot find beginning of record: {marker:?}")]
    MissingStartMarker { marker: &'static str },

    /// Input ended inside a record and the parse was strict.
    ///
    /// `partial_len` is the size of the trailing text that a non-strict
    /// parse would have accepted as the final record.
    #[error("cannot find end of record: {terminal:?} missing after {partial_len} trailing bytes")]
    UnterminatedRecord {
        terminal: &'static str,
        partial_len: usize,
    },

    /// A record chunk failed to decode.
    #[error(transparent)]
    FieldDecode(#[from] FieldError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The chunk producer task panicked or was cancelled before the
    /// document ended.
    #[error("record pipeline closed before the document ended")]
    PipelineClosed,
}

impl From<BoundaryError> for ParseError {
    fn from(err: BoundaryError) -> Self {
        match err {
            BoundaryError::MissingStartMarker { marker } => Self::MissingStartMarker { marker },
            BoundaryError::Unterminated {
                terminal, partial, ..
            } => Self::UnterminatedRecord {
                terminal,
                partial_len: partial.len(),
            },
        }
    }
}

impl From<WireError> for ParseError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::MalformedHeader { line } => Self::MalformedHeader { line },
            WireError::Boundary(boundary) => boundary.into(),
            WireError::Io(io) => Self::Io(io),
        }
    }
}
