use std::io::Read;

use bytes::Bytes;
use relaydir_types::ConsensusMeta;
use relaydir_wire::{BoundaryError, Chunk, ChunkReader, DocumentTag, WireError};
use tracing::{debug, warn};

use crate::config::ParseConfig;
use crate::error::ParseError;
use crate::lazy::LazyRecord;
use crate::registry::{DocumentFormat, decoder_for};
use crate::store::ObjectStore;

/// A fully parsed document.
#[derive(Debug)]
pub struct Document {
    pub format: &'static DocumentFormat,
    pub store: ObjectStore,
    /// Decoded preamble, for formats that define one.
    pub meta: Option<ConsensusMeta>,
}

/// Parses documents of one format in a single forward pass.
///
/// Tokenizing and decoding are interleaved: each chunk is turned into a
/// [`LazyRecord`] as soon as the tokenizer releases it, so the source is
/// never held twice in memory.
///
/// ```text
///   Read ──▶ ChunkReader ──▶ Chunk ──▶ LazyRecord ──▶ ObjectStore
///                 │
///                 └──▶ preamble ──▶ ConsensusMeta (if the format has one)
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DocumentParser {
    format: &'static DocumentFormat,
    config: ParseConfig,
}

impl DocumentParser {
    #[must_use]
    pub fn new(format: &'static DocumentFormat) -> Self {
        Self::with_config(format, ParseConfig::default())
    }

    #[must_use]
    pub fn with_config(format: &'static DocumentFormat, config: ParseConfig) -> Self {
        Self { format, config }
    }

    /// Select the format registered for `tag`.
    ///
    /// A version other than the registered one is accepted with a
    /// warning; the record grammar has stayed compatible across them.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnknownDocumentType`] if no format is registered.
    pub fn for_tag(tag: &DocumentTag, config: ParseConfig) -> Result<Self, ParseError> {
        let format = decoder_for(&tag.type_name).ok_or_else(|| ParseError::UnknownDocumentType {
            type_name: tag.type_name.clone(),
        })?;
        if (tag.major, tag.minor) != format.version {
            warn!(
                tag = %tag,
                expected_major = format.version.0,
                expected_minor = format.version.1,
                "unexpected document version"
            );
        }
        Ok(Self::with_config(format, config))
    }

    #[must_use]
    pub fn format(&self) -> &'static DocumentFormat {
        self.format
    }

    #[must_use]
    pub fn config(&self) -> ParseConfig {
        self.config
    }

    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.format.is_strict(self.config.strict)
    }

    /// Parse a whole document from `source`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingStartMarker`] if the document has no record.
    /// - [`ParseError::UnterminatedRecord`] if a strict parse runs out of
    ///   input inside a record.
    /// - [`ParseError::FieldDecode`] if a record (or, in eager mode, its
    ///   body) fails to decode, or a strict parse cannot read the preamble.
    /// - [`ParseError::Io`] if `source` fails.
    pub fn parse<R: Read>(&self, source: R) -> Result<Document, ParseError> {
        let mut reader =
            ChunkReader::with_read_size(source, self.format.layout, self.config.read_buffer_size);
        let mut store = ObjectStore::new();
        let mut chunks = 0usize;

        loop {
            let chunk = match reader.next_chunk() {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(WireError::Boundary(err)) => {
                    let tail = self.tolerate(err)?;
                    store.insert(self.handle(&tail)?);
                    chunks += 1;
                    break;
                }
                Err(err) => return Err(err.into()),
            };
            store.insert(self.handle(&chunk)?);
            chunks += 1;
        }

        let meta = self.read_meta(reader.take_preamble())?;
        debug!(
            format = self.format.type_name,
            chunks,
            records = store.len(),
            "document parsed"
        );

        Ok(Document {
            format: self.format,
            store,
            meta,
        })
    }

    /// Accept an unterminated tail as the last record when not strict.
    pub(crate) fn tolerate(&self, err: BoundaryError) -> Result<Chunk, ParseError> {
        match err {
            BoundaryError::Unterminated {
                terminal, partial, ..
            } if !self.is_strict() => {
                warn!(
                    terminal,
                    bytes = partial.len(),
                    "end marker missing, treating end of input as end of record"
                );
                Ok(partial)
            }
            other => Err(other.into()),
        }
    }

    /// Build the store handle for one chunk.
    pub(crate) fn handle(&self, chunk: &Chunk) -> Result<LazyRecord, ParseError> {
        let handle = if self.config.lazy {
            LazyRecord::deferred(chunk.clone(), self.format.fingerprint, self.format.decode)?
        } else {
            LazyRecord::decode_now(chunk, self.format.decode)?
        };
        Ok(handle)
    }

    /// Decode the preamble. Failure is fatal only for strict parses.
    pub(crate) fn read_meta(&self, preamble: Option<Bytes>) -> Result<Option<ConsensusMeta>, ParseError> {
        let Some(decode_meta) = self.format.meta else {
            return Ok(None);
        };

        let text = preamble
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        match decode_meta(&text) {
            Ok(meta) => Ok(Some(meta)),
            Err(err) if self.is_strict() => Err(err.into()),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable document preamble");
                Ok(None)
            }
        }
    }
}

/// Parse a document of a known format into a store.
///
/// # Errors
///
/// See [`DocumentParser::parse`].
pub fn parse<R: Read>(
    source: R,
    format: &'static DocumentFormat,
    strict: bool,
) -> Result<ObjectStore, ParseError> {
    let config = ParseConfig::default().strict(strict);
    DocumentParser::with_config(format, config)
        .parse(source)
        .map(|document| document.store)
}

/// Parse a document whose format is named by its `@type` tag. `source`
/// is positioned after the tag line.
///
/// # Errors
///
/// [`ParseError::UnknownDocumentType`] for unregistered tags, otherwise
/// see [`DocumentParser::parse`].
pub fn parse_tagged<R: Read>(
    source: R,
    tag: &DocumentTag,
    strict: bool,
) -> Result<ObjectStore, ParseError> {
    let config = ParseConfig::default().strict(strict);
    DocumentParser::for_tag(tag, config)?
        .parse(source)
        .map(|document| document.store)
}
