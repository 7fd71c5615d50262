use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::{BoundaryError, WireError};

/// Default number of bytes pulled from the source per read.
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// One raw record, split off the tokenizer buffer without copying.
///
/// A chunk starts exactly at its record's start marker and ends with the
/// newline preceding the next record or the terminal marker, or with the
/// layout's record end line. The text is
/// not validated; [`text`](Self::text) decodes it lossily on demand.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Chunk(Bytes);

impl Chunk {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The chunk as text. Invalid UTF-8 (seen in old contact lines) is
    /// replaced rather than rejected.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Self(Bytes::from(text))
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Chunk").field(&self.text()).finish()
    }
}

/// The markers that delimit records in one document family.
///
/// ```text
/// ┌──────────────────────────┬──────────┬───────────────────────┬───────────────────────────┐
/// │ Document                 │ start    │ terminal              │ record_end                │
/// ├──────────────────────────┼──────────┼───────────────────────┼───────────────────────────┤
/// │ network-status-consensus │ "r "     │ "directory-signature" │ none                      │
/// │ bridge-network-status    │ "r "     │ "directory-signature" │ none                      │
/// │ server-descriptor        │ "router "│ none                  │ "-----END SIGNATURE-----" │
/// └──────────────────────────┴──────────┴───────────────────────┴───────────────────────────┘
/// ```
///
/// Every marker only counts at the start of a line.
///
/// - `terminal` ends the document and is not part of any record. With
///   `terminal: None` the end of input ends the document.
/// - `record_end` is a whole line that closes each record and is kept in
///   the chunk. When set, a record ends only there, and bytes between
///   records are skipped. Input that ends inside a record is unterminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub start: &'static str,
    pub terminal: Option<&'static str>,
    pub record_end: Option<&'static str>,
}

/// Outcome of one [`RecordTokenizer::next_token`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A complete record; more may follow.
    Chunk(Chunk),
    /// The last record of the document. The next call yields `Done`.
    /// Layouts with a `record_end` only ever emit `Chunk`.
    Final(Chunk),
    /// No boundary is visible yet; feed more input and call again.
    NeedMore,
    /// The document is exhausted.
    Done,
}

/// Internal state machine:
///
/// ```text
///   SeekFirst → Records → Done
///                 ↑  ↓
///                Between
/// ```
///
/// `SeekFirst` keeps any preamble before the first record start.
/// `Between` is only entered by layouts with a `record_end`, and drops
/// whatever separates one closed record from the next start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenizerState {
    SeekFirst,
    Records,
    Between,
    Done,
}

/// Push-based record splitter.
///
/// The caller feeds bytes as they arrive and asks for tokens, passing
/// `at_eof = true` once the source is drained. Emitted chunks are split
/// off the front of the internal buffer, so a document is never held
/// twice in memory.
///
/// # Usage pattern
///
/// ```text
///   let mut tokenizer = RecordTokenizer::new(layout);
///   loop {
///       match tokenizer.next_token(at_eof)? {
///           Token::Chunk(c) => { /* decode c */ }
///           Token::Final(c) => { /* decode c, then stop */ }
///           Token::NeedMore => { /* read, feed, or set at_eof */ }
///           Token::Done => break,
///       }
///   }
/// ```
///
/// A single tokenizer walks one stream forward; it is not meant to be
/// shared between threads.
pub struct RecordTokenizer {
    layout: Layout,
    anchored_start: Vec<u8>,
    anchored_terminal: Option<Vec<u8>>,
    /// `"\n<record_end>\n"`; the closing line is part of the record.
    anchored_record_end: Option<Vec<u8>>,
    buf: BytesMut,
    /// Offset up to which `buf` was already searched without a match.
    scanned: usize,
    state: TokenizerState,
    preamble: Option<Bytes>,
}

impl RecordTokenizer {
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        let anchor = |marker: &str| {
            let mut needle = Vec::with_capacity(marker.len() + 1);
            needle.push(b'\n');
            needle.extend_from_slice(marker.as_bytes());
            needle
        };

        Self {
            layout,
            anchored_start: anchor(layout.start),
            anchored_terminal: layout.terminal.map(anchor),
            anchored_record_end: layout.record_end.map(|marker| {
                let mut needle = anchor(marker);
                needle.push(b'\n');
                needle
            }),
            buf: BytesMut::with_capacity(DEFAULT_READ_SIZE),
            scanned: 0,
            state: TokenizerState::SeekFirst,
            preamble: None,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Append input. Bytes fed after the document finished are dropped.
    pub fn feed(&mut self, data: &[u8]) {
        if self.state != TokenizerState::Done {
            self.buf.extend_from_slice(data);
        }
    }

    /// Number of bytes buffered but not yet emitted.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == TokenizerState::Done
    }

    /// The bytes skipped before the first record, available once the
    /// first record start has been located. Taken at most once.
    pub fn take_preamble(&mut self) -> Option<Bytes> {
        self.preamble.take()
    }

    /// Produce the next token.
    ///
    /// # Errors
    ///
    /// - [`BoundaryError::MissingStartMarker`] if input ended before the
    ///   first record start, or if a layout with a `record_end` has
    ///   non-blank bytes after its last record.
    /// - [`BoundaryError::Unterminated`] if input ended inside a record of
    ///   a layout that has a terminal or record end marker.
    ///
    /// Either error finishes the tokenizer.
    pub fn next_token(&mut self, at_eof: bool) -> Result<Token, BoundaryError> {
        if self.state == TokenizerState::Done {
            return Ok(Token::Done);
        }
        if at_eof && self.buf.is_empty() {
            self.finish();
            return Ok(Token::Done);
        }
        if matches!(self.state, TokenizerState::SeekFirst | TokenizerState::Between) {
            if let Some(token) = self.seek_record(at_eof)? {
                return Ok(token);
            }
        }
        if self.anchored_record_end.is_some() {
            return self.next_record_end(at_eof);
        }
        self.next_boundary(at_eof)
    }

    /// Split a complete in-memory document into its chunks.
    ///
    /// # Errors
    ///
    /// Same as [`next_token`](Self::next_token) with `at_eof = true`.
    pub fn split_complete(layout: Layout, input: &[u8]) -> Result<Vec<Chunk>, BoundaryError> {
        let mut tokenizer = Self::new(layout);
        tokenizer.feed(input);

        let mut chunks = Vec::new();
        loop {
            match tokenizer.next_token(true)? {
                Token::Chunk(chunk) | Token::Final(chunk) => chunks.push(chunk),
                Token::NeedMore | Token::Done => return Ok(chunks),
            }
        }
    }

    /// Locate the next record start and drop what precedes it.
    ///
    /// Returns `Some(token)` when the caller must return immediately,
    /// `None` once the buffer starts at a record.
    fn seek_record(&mut self, at_eof: bool) -> Result<Option<Token>, BoundaryError> {
        let first = self.state == TokenizerState::SeekFirst;
        let start = if self.buf.starts_with(self.layout.start.as_bytes()) {
            Some(0)
        } else {
            find(&self.buf, &self.anchored_start, 0).map(|i| i + 1)
        };
        let terminal = match self.layout.terminal {
            Some(t) if self.buf.starts_with(t.as_bytes()) => Some(0),
            _ => self.find_terminal(0, self.buf.len()),
        };

        match (start, terminal) {
            (Some(start), None) => {
                self.enter_record(start, first);
                Ok(None)
            }
            (Some(start), Some(terminal)) if start < terminal => {
                self.enter_record(start, first);
                Ok(None)
            }
            (_, Some(terminal)) => {
                if first {
                    // The terminal precedes every record: an empty document.
                    debug!("terminal marker before any record");
                    self.preamble = Some(self.buf.split_to(terminal).freeze());
                } else {
                    debug!("terminal marker after last record");
                }
                self.finish();
                Ok(Some(Token::Done))
            }
            (None, None) if at_eof => {
                let blank = self.buf.iter().all(u8::is_ascii_whitespace);
                self.finish();
                if !first && blank {
                    return Ok(Some(Token::Done));
                }
                Err(BoundaryError::MissingStartMarker {
                    marker: self.layout.start,
                })
            }
            (None, None) => {
                trace!(buffered = self.buf.len(), "no record start yet, need more");
                Ok(Some(Token::NeedMore))
            }
        }
    }

    fn enter_record(&mut self, start: usize, first: bool) {
        let skipped = self.buf.split_to(start).freeze();
        if first {
            if start > 0 {
                trace!(bytes = start, "skipping preamble");
            }
            self.preamble = Some(skipped);
        } else if start > 0 {
            debug!(bytes = start, "skipping bytes between records");
        }
        self.scanned = 0;
        self.state = TokenizerState::Records;
    }

    /// With the buffer positioned at a record start, find where it ends.
    fn next_boundary(&mut self, at_eof: bool) -> Result<Token, BoundaryError> {
        let from = self.scanned;
        let next_start = find(&self.buf, &self.anchored_start, from);

        // A terminal only counts if it precedes the next start, so record
        // markers inside the trailing signature block are never split on.
        let horizon = next_start.unwrap_or(self.buf.len());
        if let Some(end) = self.find_terminal(from, horizon) {
            let chunk = self.emit(end);
            self.finish();
            debug!(len = chunk.len(), "final record before terminal marker");
            return Ok(Token::Final(chunk));
        }

        if let Some(end) = next_start {
            return Ok(Token::Chunk(self.emit(end + 1)));
        }

        if at_eof {
            let partial = Chunk(self.buf.split().freeze());
            self.finish();
            return match self.layout.terminal {
                None => Ok(Token::Final(partial)),
                Some(terminal) => Err(BoundaryError::Unterminated {
                    start: self.layout.start,
                    terminal,
                    partial,
                }),
            };
        }

        // Resume just short of the unsearched tail so a marker split
        // across two reads is still found.
        let longest = self
            .anchored_terminal
            .as_ref()
            .map_or(0, Vec::len)
            .max(self.anchored_start.len());
        self.scanned = self.buf.len().saturating_sub(longest - 1);
        trace!(buffered = self.buf.len(), "record incomplete, need more");
        Ok(Token::NeedMore)
    }

    /// With the buffer positioned at a record start, find its closing
    /// line. Start markers inside the record are not boundaries.
    fn next_record_end(&mut self, at_eof: bool) -> Result<Token, BoundaryError> {
        if let Some(end) = self.find_record_end(at_eof) {
            let chunk = self.emit(end);
            self.state = TokenizerState::Between;
            return Ok(Token::Chunk(chunk));
        }

        let needle_len = self.anchored_record_end.as_ref().map_or(1, Vec::len);
        if at_eof {
            let partial = Chunk(self.buf.split().freeze());
            self.finish();
            return Err(BoundaryError::Unterminated {
                start: self.layout.start,
                terminal: self.layout.record_end.unwrap_or_default(),
                partial,
            });
        }

        self.scanned = self.buf.len().saturating_sub(needle_len - 1);
        trace!(buffered = self.buf.len(), "record end not seen yet, need more");
        Ok(Token::NeedMore)
    }

    /// Length of the record at the front of `buf`, closing line included.
    /// At end of input the closing line may lack its newline.
    fn find_record_end(&self, at_eof: bool) -> Option<usize> {
        let needle = self.anchored_record_end.as_deref()?;
        if let Some(i) = find(&self.buf, needle, self.scanned) {
            return Some(i + needle.len());
        }
        let unterminated_line = &needle[..needle.len() - 1];
        (at_eof && self.buf.ends_with(unterminated_line)).then_some(self.buf.len())
    }

    /// Position of the line-anchored terminal marker within
    /// `buf[from..until]`.
    fn find_terminal(&self, from: usize, until: usize) -> Option<usize> {
        let needle = self.anchored_terminal.as_deref()?;
        find(&self.buf[..until], needle, from).map(|i| i + 1)
    }

    fn emit(&mut self, len: usize) -> Chunk {
        self.scanned = 0;
        let chunk = Chunk(self.buf.split_to(len).freeze());
        trace!(len = chunk.len(), "record chunk");
        chunk
    }

    fn finish(&mut self) {
        self.state = TokenizerState::Done;
        self.buf = BytesMut::new();
    }
}

/// First index of `needle` in `haystack[from..]`, as an absolute index.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| i + from)
}

/// Pull-based chunk iterator over any [`Read`] source.
///
/// Wraps a [`RecordTokenizer`] and refills it from `reader` whenever it
/// asks for more input. Both `Chunk` and `Final` tokens surface as plain
/// chunks; the iterator ends after the last one.
pub struct ChunkReader<R> {
    reader: R,
    tokenizer: RecordTokenizer,
    read_buf: Vec<u8>,
    at_eof: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(reader: R, layout: Layout) -> Self {
        Self::with_read_size(reader, layout, DEFAULT_READ_SIZE)
    }

    pub fn with_read_size(reader: R, layout: Layout, read_size: usize) -> Self {
        Self {
            reader,
            tokenizer: RecordTokenizer::new(layout),
            read_buf: vec![0; read_size.max(1)],
            at_eof: false,
        }
    }

    /// See [`RecordTokenizer::take_preamble`].
    pub fn take_preamble(&mut self) -> Option<Bytes> {
        self.tokenizer.take_preamble()
    }

    /// Read until the next chunk is complete.
    ///
    /// Returns `Ok(None)` once the document is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Boundary`] for boundary failures and
    /// [`WireError::Io`] if the reader fails.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, WireError> {
        loop {
            match self.tokenizer.next_token(self.at_eof)? {
                Token::Chunk(chunk) | Token::Final(chunk) => return Ok(Some(chunk)),
                Token::Done => return Ok(None),
                Token::NeedMore => self.fill()?,
            }
        }
    }

    fn fill(&mut self) -> Result<(), WireError> {
        let n = loop {
            match self.reader.read(&mut self.read_buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            self.at_eof = true;
        } else {
            self.tokenizer.feed(&self.read_buf[..n]);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Chunk, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: Layout = Layout {
        start: "r ",
        terminal: Some("directory-signature"),
        record_end: None,
    };

    const DESCRIPTOR: Layout = Layout {
        start: "router ",
        terminal: None,
        record_end: Some("-----END SIGNATURE-----"),
    };

    const BRIDGES: Layout = Layout {
        start: "r ",
        terminal: None,
        record_end: None,
    };

    const SEELE: &str = "r seele AAoQ1DAR6kkoo19hBAX5K0QztNw bdrzhG0Kk/8DUsnSdmzj7DjFQjY 2014-12-08 12:27:05 73.15.150.172 9001 0\n\
s Fast Running Stable Valid\n\
v Tor 0.2.5.10\n\
w Bandwidth=18\n\
p reject 1-65535\n";

    const SIGNATURE: &str = "directory-signature 5420FD8EA46BD4290F1D07A1883C9D85ECC486C4 CCB7170F6B270B44301712DD7BC04BF9515AF374";

    fn texts(chunks: &[Chunk]) -> Vec<String> {
        chunks.iter().map(|c| c.text().into_owned()).collect()
    }

    /// Feed `input` in pieces of `step` bytes, collecting every chunk.
    fn drip(layout: Layout, input: &[u8], step: usize) -> Result<Vec<Chunk>, BoundaryError> {
        let mut tokenizer = RecordTokenizer::new(layout);
        let mut pieces = input.chunks(step);
        let mut at_eof = false;
        let mut chunks = Vec::new();

        loop {
            match tokenizer.next_token(at_eof)? {
                Token::Chunk(c) | Token::Final(c) => chunks.push(c),
                Token::NeedMore => match pieces.next() {
                    Some(piece) => tokenizer.feed(piece),
                    None => at_eof = true,
                },
                Token::Done => return Ok(chunks),
            }
        }
    }

    #[test]
    fn single_entry_before_signature() {
        let input = format!("{SEELE}{SIGNATURE}");
        let mut tokenizer = RecordTokenizer::new(STATUS);
        tokenizer.feed(input.as_bytes());

        let token = tokenizer.next_token(true).unwrap();
        assert_eq!(token, Token::Final(Chunk::from(SEELE)));
        assert_eq!(tokenizer.next_token(true).unwrap(), Token::Done);
    }

    #[test]
    fn entry_followed_by_another_entry() {
        let input = format!("{SEELE}r foo\n{SIGNATURE}");
        let chunks = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![SEELE.to_string(), "r foo\n".to_string()]);
    }

    #[test]
    fn padding_longer_than_first_entry_is_skipped() {
        let input = "paddingpaddingpaddingpaddingpaddingpaddingpadding\n\
r foo\n\
number 1\n\
r bar\n\
number 2\n\
directory-signature 5420FD8EA46BD4290F1D07A1883C9D85ECC486C4\n";

        let chunks = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec!["r foo\nnumber 1\n", "r bar\nnumber 2\n"]);
    }

    #[test]
    fn preamble_is_retained() {
        let input = format!("network-status-version 3\nvote-status consensus\n{SEELE}{SIGNATURE}");
        let mut tokenizer = RecordTokenizer::new(STATUS);
        tokenizer.feed(input.as_bytes());

        assert!(matches!(tokenizer.next_token(true).unwrap(), Token::Final(_)));
        let preamble = tokenizer.take_preamble().unwrap();
        assert_eq!(&preamble[..], b"network-status-version 3\nvote-status consensus\n");
        assert!(tokenizer.take_preamble().is_none());
    }

    #[test]
    fn marker_inside_a_line_is_not_a_boundary() {
        let record = "router alpha 10.0.0.1 9001 0 0\ncontact router operator\nplatform Tor r 1\n\
router-signature\n-----BEGIN SIGNATURE-----\nAAAA\n-----END SIGNATURE-----\n";
        let chunks = RecordTokenizer::split_complete(DESCRIPTOR, record.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![record]);

        let status = format!("r a b c\nm 1 sha256=r x\n{SIGNATURE}");
        let chunks = RecordTokenizer::split_complete(STATUS, status.as_bytes()).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn byte_by_byte_feeding_matches_bulk() {
        let input = format!("preamble line\n{SEELE}{SEELE}r last\n{SIGNATURE}\n");
        let bulk = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();

        for step in [1, 2, 3, 7, 64] {
            let dripped = drip(STATUS, input.as_bytes(), step).unwrap();
            assert_eq!(dripped, bulk, "step {step}");
        }
        assert_eq!(bulk.len(), 3);
    }

    #[test]
    fn suspends_until_boundary_arrives() {
        let mut tokenizer = RecordTokenizer::new(STATUS);
        tokenizer.feed(b"r foo\nnumber 1\n");
        assert_eq!(tokenizer.next_token(false).unwrap(), Token::NeedMore);

        tokenizer.feed(b"r bar\n");
        assert_eq!(
            tokenizer.next_token(false).unwrap(),
            Token::Chunk(Chunk::from("r foo\nnumber 1\n"))
        );
        assert_eq!(tokenizer.next_token(false).unwrap(), Token::NeedMore);
    }

    #[test]
    fn missing_start_marker_at_eof() {
        let mut tokenizer = RecordTokenizer::new(STATUS);
        tokenizer.feed(b"nothing to see here\n");
        assert_eq!(tokenizer.next_token(false).unwrap(), Token::NeedMore);

        let err = tokenizer.next_token(true).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingStartMarker { marker: "r " }));
        assert!(tokenizer.is_done());
    }

    #[test]
    fn unterminated_record_carries_partial() {
        let err = RecordTokenizer::split_complete(STATUS, SEELE.as_bytes()).unwrap_err();
        match err {
            BoundaryError::Unterminated { partial, terminal, .. } => {
                assert_eq!(partial, Chunk::from(SEELE));
                assert_eq!(terminal, "directory-signature");
            }
            other => panic!("expected Unterminated, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_clean_termination() {
        let chunks = RecordTokenizer::split_complete(STATUS, b"").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn terminal_only_is_an_empty_document() {
        let chunks = RecordTokenizer::split_complete(STATUS, SIGNATURE.as_bytes()).unwrap();
        assert!(chunks.is_empty());

        let input = format!("known-flags Fast\n{SIGNATURE}\nr not-a-record\n");
        let chunks = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn start_marker_after_terminal_is_ignored() {
        let input = format!("{SEELE}{SIGNATURE}\n-----BEGIN SIGNATURE-----\nr fake\n-----END SIGNATURE-----\n");
        let chunks = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![SEELE]);

        let dripped = drip(STATUS, input.as_bytes(), 4).unwrap();
        assert_eq!(dripped, chunks);
    }

    #[test]
    fn bare_start_marker_is_a_chunk() {
        let input = format!("r \n{SIGNATURE}");
        let chunks = RecordTokenizer::split_complete(STATUS, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec!["r \n"]);
    }

    fn descriptor(nickname: &str) -> String {
        format!(
            "router {nickname} 10.0.0.1 9001 0 0\n\
reject *:*\n\
router-signature\n\
-----BEGIN SIGNATURE-----\n\
c2lnbmF0dXJl\n\
-----END SIGNATURE-----\n"
        )
    }

    #[test]
    fn descriptor_records_close_at_their_signature() {
        let (first, second) = (descriptor("leenuts"), descriptor("foo"));
        let input = format!("@type server-descriptor 1.0\n{first}{second}");

        let chunks = RecordTokenizer::split_complete(DESCRIPTOR, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![first, second]);

        for step in [1, 5, 23, 4096] {
            let dripped = drip(DESCRIPTOR, input.as_bytes(), step).unwrap();
            assert_eq!(dripped, chunks, "step {step}");
        }
    }

    #[test]
    fn descriptor_without_closing_line_is_unterminated() {
        let whole = descriptor("leenuts");
        let cut = &whole[..whole.find("router-signature").unwrap()];
        let input = format!("{}{cut}", descriptor("foo"));

        let err = RecordTokenizer::split_complete(DESCRIPTOR, input.as_bytes()).unwrap_err();
        match err {
            BoundaryError::Unterminated { partial, terminal, .. } => {
                assert_eq!(partial, Chunk::from(cut));
                assert_eq!(terminal, "-----END SIGNATURE-----");
            }
            other => panic!("expected Unterminated, got {other:?}"),
        }
    }

    #[test]
    fn closing_line_may_lack_its_newline_at_eof() {
        let whole = descriptor("leenuts");
        let trimmed = whole.trim_end();
        let chunks = RecordTokenizer::split_complete(DESCRIPTOR, trimmed.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![trimmed]);
    }

    #[test]
    fn trailing_bytes_after_last_descriptor() {
        let record = descriptor("leenuts");

        let blank = format!("{record}\n  \n");
        let chunks = RecordTokenizer::split_complete(DESCRIPTOR, blank.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![record.as_str()]);

        let garbage = format!("{record}trailing garbage line\n");
        let err = RecordTokenizer::split_complete(DESCRIPTOR, garbage.as_bytes()).unwrap_err();
        assert!(matches!(err, BoundaryError::MissingStartMarker { marker: "router " }));
    }

    #[test]
    fn bytes_between_descriptors_are_dropped() {
        let (first, second) = (descriptor("leenuts"), descriptor("foo"));
        let input = format!("{first}opt junk\n{second}");

        let mut tokenizer = RecordTokenizer::new(DESCRIPTOR);
        tokenizer.feed(input.as_bytes());
        assert_eq!(tokenizer.next_token(true).unwrap(), Token::Chunk(Chunk::from(first)));
        assert_eq!(tokenizer.next_token(true).unwrap(), Token::Chunk(Chunk::from(second)));
        assert_eq!(tokenizer.next_token(true).unwrap(), Token::Done);
        assert_eq!(&tokenizer.take_preamble().unwrap()[..], b"");
    }

    #[test]
    fn layout_without_terminal_ends_at_eof() {
        let first = "r leenuts x y\ns Running\n";
        let second = "r foo x y\ns Valid\n";
        let input = format!("published 2014-12-08\n{first}{second}");

        let chunks = RecordTokenizer::split_complete(BRIDGES, input.as_bytes()).unwrap();
        assert_eq!(texts(&chunks), vec![first, second]);
    }

    #[test]
    fn chunk_reader_over_small_reads() {
        let input = format!("header\n{SEELE}r foo\n{SIGNATURE}\n");
        let reader = ChunkReader::with_read_size(input.as_bytes(), STATUS, 5);
        let chunks: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(texts(&chunks), vec![SEELE.to_string(), "r foo\n".to_string()]);
    }

    #[test]
    fn chunk_reader_surfaces_boundary_errors() {
        let mut reader = ChunkReader::new(SEELE.as_bytes(), STATUS);
        let err = reader.next_chunk().unwrap_err();
        assert!(matches!(
            err,
            WireError::Boundary(BoundaryError::Unterminated { .. })
        ));
        assert!(reader.next().is_none());
    }
}
