use std::sync::OnceLock;

use relaydir_types::{FieldError, Fingerprint, Record};
use relaydir_wire::Chunk;

/// Full decode of one chunk into a record.
pub type DecodeFn = fn(&str) -> Result<Record, FieldError>;

/// Identity-only scan of one chunk.
pub type FingerprintFn = fn(&str) -> Result<Fingerprint, FieldError>;

/// A record that may not have been decoded yet.
///
/// The fingerprint is extracted when the handle is built, scanning only
/// up to the identity line, and is always available. The body is
/// decoded by [`resolve`](Self::resolve).
///
/// ```text
///   Unresolved { chunk } ──resolve()──▶ Record
///        │                                 │
///        └──── memo (optional) ◀───────────┘  first success is kept
///
///   Resolved { record } ──resolve()──▶ clone of record
/// ```
///
/// Decoding is a pure function of the chunk, so resolving twice yields
/// identical records whether or not the memo is enabled. A handle never
/// returns to the unresolved state.
#[derive(Debug)]
pub struct LazyRecord {
    fingerprint: Fingerprint,
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Unresolved {
        chunk: Chunk,
        decode: DecodeFn,
        memo: Option<OnceLock<Record>>,
    },
    Resolved {
        record: Record,
    },
}

impl LazyRecord {
    /// Wrap an already decoded record.
    #[must_use]
    pub fn resolved(record: Record) -> Self {
        Self {
            fingerprint: record.fingerprint().clone(),
            state: HandleState::Resolved { record },
        }
    }

    /// Defer decoding of `chunk`, memoizing the first successful decode.
    ///
    /// # Errors
    ///
    /// Returns the [`FieldError`] from `extract` if the identity cannot be
    /// read.
    pub fn deferred(chunk: Chunk, extract: FingerprintFn, decode: DecodeFn) -> Result<Self, FieldError> {
        Self::build(chunk, extract, decode, Some(OnceLock::new()))
    }

    /// Defer decoding of `chunk`; every [`resolve`](Self::resolve)
    /// decodes again.
    ///
    /// # Errors
    ///
    /// Same as [`deferred`](Self::deferred).
    pub fn deferred_uncached(
        chunk: Chunk,
        extract: FingerprintFn,
        decode: DecodeFn,
    ) -> Result<Self, FieldError> {
        Self::build(chunk, extract, decode, None)
    }

    fn build(
        chunk: Chunk,
        extract: FingerprintFn,
        decode: DecodeFn,
        memo: Option<OnceLock<Record>>,
    ) -> Result<Self, FieldError> {
        let fingerprint = extract(&chunk.text())?;
        Ok(Self {
            fingerprint,
            state: HandleState::Unresolved { chunk, decode, memo },
        })
    }

    /// Decode `chunk` immediately.
    ///
    /// # Errors
    ///
    /// Returns the decode error.
    pub fn decode_now(chunk: &Chunk, decode: DecodeFn) -> Result<Self, FieldError> {
        decode(&chunk.text()).map(Self::resolved)
    }

    /// The normalized identity, available without decoding.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Whether a decoded record is held, either directly or in the memo.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match &self.state {
            HandleState::Resolved { .. } => true,
            HandleState::Unresolved { memo, .. } => memo.as_ref().is_some_and(|m| m.get().is_some()),
        }
    }

    /// The raw chunk, for handles that were built from one.
    #[must_use]
    pub fn chunk(&self) -> Option<&Chunk> {
        match &self.state {
            HandleState::Unresolved { chunk, .. } => Some(chunk),
            HandleState::Resolved { .. } => None,
        }
    }

    /// Decode the record, or return the decoded copy.
    ///
    /// # Errors
    ///
    /// Returns the [`FieldError`] of a failed decode. Failures are not
    /// memoized; a later call decodes again and fails the same way.
    pub fn resolve(&self) -> Result<Record, FieldError> {
        match &self.state {
            HandleState::Resolved { record } => Ok(record.clone()),
            HandleState::Unresolved { chunk, decode, memo } => {
                if let Some(record) = memo.as_ref().and_then(OnceLock::get) {
                    return Ok(record.clone());
                }
                let record = decode(&chunk.text())?;
                Ok(match memo {
                    Some(memo) => memo.get_or_init(|| record).clone(),
                    None => record,
                })
            }
        }
    }
}
