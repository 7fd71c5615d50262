use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// Prefix of the first line of every archived directory document.
pub const TAG_PREFIX: &str = "@type ";

/// The `@type <name> <major>.<minor>` tag leading a directory document.
///
/// Reading the tag off a file is left to the caller; the core only uses
/// the parsed tag to pick a record layout and field decoder.
///
/// ```text
/// @type network-status-consensus-3 1.0
///       └──────── type_name ──────┘ │ └ minor
///                                   └ major
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentTag {
    pub type_name: String,
    pub major: u32,
    pub minor: u32,
}

impl DocumentTag {
    pub fn new(type_name: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            type_name: type_name.into(),
            major,
            minor,
        }
    }
}

impl FromStr for DocumentTag {
    type Err = WireError;

    /// Parse a tag line. A trailing newline is accepted; anything else
    /// outside the exact `@type <name> <major>.<minor>` shape is not.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MalformedHeader`] carrying the offending line.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || WireError::MalformedHeader {
            line: line.to_string(),
        };

        let rest = line
            .trim_end_matches(['\r', '\n'])
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(malformed)?;

        let mut parts = rest.split(' ');
        let (Some(type_name), Some(version), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if type_name.is_empty() {
            return Err(malformed());
        }

        let (major, minor) = version.split_once('.').ok_or_else(malformed)?;
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(major) || !all_digits(minor) {
            return Err(malformed());
        }

        Ok(Self {
            type_name: type_name.to_string(),
            major: major.parse().map_err(|_| malformed())?,
            minor: minor.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for DocumentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TAG_PREFIX}{} {}.{}", self.type_name, self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_consensus_tag() {
        let tag: DocumentTag = "@type network-status-consensus-3 1.0\n".parse().unwrap();
        assert_eq!(tag, DocumentTag::new("network-status-consensus-3", 1, 0));
    }

    #[test]
    fn display_matches_input() {
        let line = "@type bridge-network-status 1.2";
        let tag: DocumentTag = line.parse().unwrap();
        assert_eq!(tag.to_string(), line);
    }

    #[test]
    fn rejects_missing_prefix() {
        let result = "type server-descriptor 1.0".parse::<DocumentTag>();
        assert!(matches!(result, Err(WireError::MalformedHeader { .. })));
    }

    #[test]
    fn rejects_bad_version() {
        for line in [
            "@type server-descriptor 1",
            "@type server-descriptor 1.x",
            "@type server-descriptor .0",
            "@type server-descriptor 1.0 extra",
            "@type  1.0",
        ] {
            assert!(line.parse::<DocumentTag>().is_err(), "{line:?} should not parse");
        }
    }
}
