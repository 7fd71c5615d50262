//! Line-level helpers shared by the status and descriptor decoders.
//!
//! Every directory record is a sequence of `keyword arg arg ...` lines.
//! The helpers here split those lines and turn individual arguments into
//! typed values, reporting failures as [`FieldError`]s tagged with the
//! keyword they came from.

use std::borrow::Cow;
use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::NaiveDateTime;

use crate::error::FieldError;

/// Layout of every timestamp inside a record, always split across two
/// whitespace-separated tokens.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout used when a record renders its timestamps.
pub const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Standard alphabet, padding optional. Identities in status entries are
/// published without padding, older archives sometimes carry it.
const IDENTITY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One record line split into its keyword and the remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Line<'a> {
    pub keyword: &'a str,
    pub rest: &'a str,
}

impl<'a> Line<'a> {
    /// Split a raw line. A leading `opt` marker is dropped so that
    /// `opt fingerprint ...` and `fingerprint ...` read the same.
    ///
    /// Returns `None` for blank lines.
    #[must_use]
    pub fn split(raw: &'a str) -> Option<Self> {
        let raw = raw.trim_end_matches('\r');
        let (keyword, rest) = split_keyword(raw)?;
        if keyword == "opt" {
            let (keyword, rest) = split_keyword(rest)?;
            return Some(Self { keyword, rest });
        }
        Some(Self { keyword, rest })
    }

    /// Whitespace-separated arguments after the keyword.
    pub fn args(&self) -> std::str::SplitWhitespace<'a> {
        self.rest.split_whitespace()
    }

    /// Positional argument `index`, or a [`FieldError::MissingToken`]
    /// naming `field`.
    ///
    /// # Errors
    ///
    /// Fails when the line has fewer than `index + 1` arguments.
    pub fn arg(&self, index: usize, field: &'static str) -> Result<&'a str, FieldError> {
        self.args().nth(index).ok_or_else(|| FieldError::MissingToken {
            keyword: self.keyword.to_string(),
            field,
        })
    }
}

fn split_keyword(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.trim_start();
    if raw.is_empty() {
        return None;
    }
    Some(match raw.split_once([' ', '\t']) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (raw, ""),
    })
}

/// Iterate the non-blank lines of a record.
pub fn lines(text: &str) -> impl Iterator<Item = Line<'_>> {
    text.lines().filter_map(Line::split)
}

/// Decode a base64 identity or digest, padded or not.
///
/// # Errors
///
/// Returns [`FieldError::InvalidIdentity`] if `encoded` is not base64.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, FieldError> {
    IDENTITY_ENGINE
        .decode(encoded)
        .map_err(|e| FieldError::InvalidIdentity {
            value: encoded.to_string(),
            reason: e.to_string(),
        })
}

/// # Errors
///
/// Returns [`FieldError::InvalidPort`] unless `value` is a decimal `u16`.
pub fn parse_port(keyword: &'static str, value: &str) -> Result<u16, FieldError> {
    value.parse().map_err(|_| FieldError::InvalidPort {
        keyword,
        value: value.to_string(),
    })
}

/// # Errors
///
/// Returns [`FieldError::InvalidAddress`] unless `value` is dotted IPv4.
pub fn parse_ipv4(keyword: &'static str, value: &str) -> Result<Ipv4Addr, FieldError> {
    value.parse().map_err(|_| FieldError::InvalidAddress {
        keyword,
        value: value.to_string(),
    })
}

/// Parse a timestamp whose date and time arrive as separate tokens.
///
/// # Errors
///
/// Returns [`FieldError::InvalidTimestamp`] with both tokens joined.
pub fn parse_timestamp(
    keyword: &'static str,
    date: &str,
    time: &str,
) -> Result<NaiveDateTime, FieldError> {
    let joined = format!("{date} {time}");
    NaiveDateTime::parse_from_str(&joined, TIMESTAMP_FORMAT).map_err(|_| {
        FieldError::InvalidTimestamp {
            keyword,
            value: joined,
        }
    })
}

/// Split `[ipv6]:port`.
///
/// The address is taken from between the brackets, never by splitting on
/// colons, since the address itself is full of them.
///
/// # Errors
///
/// [`FieldError::InvalidAddress`] if the brackets or the address are
/// malformed, [`FieldError::InvalidPort`] if the port is.
pub fn parse_bracketed(keyword: &'static str, value: &str) -> Result<(Ipv6Addr, u16), FieldError> {
    let invalid = || FieldError::InvalidAddress {
        keyword,
        value: value.to_string(),
    };

    let inner = value.strip_prefix('[').ok_or_else(invalid)?;
    let (address, port) = inner.split_once(']').ok_or_else(invalid)?;
    let port = port.strip_prefix(':').ok_or_else(invalid)?;

    let address = address.parse().map_err(|_| invalid())?;
    Ok((address, parse_port(keyword, port)?))
}

/// Parse an informational counter, falling back to zero.
#[must_use]
pub fn forgiving_u64(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Accepts the spellings `1`, `t`, `true` in any case.
#[must_use]
pub fn forgiving_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "t" | "true")
    )
}

/// Free text with commas removed, for comma-separated renderings.
#[must_use]
pub fn strip_commas(text: &str) -> Cow<'_, str> {
    if text.contains(',') {
        Cow::Owned(text.replace(',', ""))
    } else {
        Cow::Borrowed(text)
    }
}
