//! Document-level metadata read from a consensus preamble.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::error::FieldError;
use crate::fields::{self, TIMESTAMP_FORMAT};

/// Lines after which the preamble turns into the authority section.
const AUTHORITY_SECTION: [&str; 2] = ["dir-source", "fingerprint"];

/// The header of a network status consensus.
///
/// `entries` keeps every `key value` line of the header verbatim (first
/// occurrence wins); the validity window and shared random values are
/// decoded from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusMeta {
    pub entries: BTreeMap<String, String>,
    pub valid_after: NaiveDateTime,
    pub fresh_until: NaiveDateTime,
    pub valid_until: NaiveDateTime,
    pub shared_rand_previous: Option<SharedRandValue>,
    pub shared_rand_current: Option<SharedRandValue>,
}

/// A `shared-rand-*-value` line: reveal count and the decoded value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedRandValue {
    pub reveals: u32,
    pub value: Vec<u8>,
}

impl SharedRandValue {
    fn parse(keyword: &str, value: &str) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidMeta {
            keyword: keyword.to_string(),
            value: value.to_string(),
        };
        let (reveals, encoded) = value.split_once(' ').ok_or_else(invalid)?;
        Ok(Self {
            reveals: reveals.parse().map_err(|_| invalid())?,
            value: fields::decode_base64(encoded.trim()).map_err(|_| invalid())?,
        })
    }
}

impl ConsensusMeta {
    /// Parse the bytes preceding the first status entry.
    ///
    /// Reading stops at the authority section. Annotation lines starting
    /// with `@` are skipped.
    ///
    /// # Errors
    ///
    /// - [`FieldError::MissingLine`] if a validity timestamp is absent.
    /// - [`FieldError::InvalidMeta`] if a timestamp or shared random value
    ///   does not parse.
    pub fn from_preamble(text: &str) -> Result<Self, FieldError> {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('@') {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            if AUTHORITY_SECTION.contains(&key) {
                break;
            }
            entries
                .entry(key.to_string())
                .or_insert_with(|| value.trim().to_string());
        }

        let timestamp = |keyword: &'static str| -> Result<NaiveDateTime, FieldError> {
            let value = entries
                .get(keyword)
                .ok_or(FieldError::MissingLine { keyword })?;
            NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
                FieldError::InvalidMeta {
                    keyword: keyword.to_string(),
                    value: value.clone(),
                }
            })
        };
        let shared_rand = |keyword: &str| {
            entries
                .get(keyword)
                .map(|value| SharedRandValue::parse(keyword, value))
                .transpose()
        };

        Ok(Self {
            valid_after: timestamp("valid-after")?,
            fresh_until: timestamp("fresh-until")?,
            valid_until: timestamp("valid-until")?,
            shared_rand_previous: shared_rand("shared-rand-previous-value")?,
            shared_rand_current: shared_rand("shared-rand-current-value")?,
            entries,
        })
    }

    /// A raw header value by keyword.
    #[must_use]
    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.entries.get(keyword).map(String::as_str)
    }
}
