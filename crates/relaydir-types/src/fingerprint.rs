use std::fmt;

use crate::error::FieldError;
use crate::fields::decode_base64;

/// A relay identity in canonical form: trimmed, uppercase hexadecimal.
///
/// Every constructor normalizes, so two fingerprints compare equal
/// exactly when their canonical forms are byte-equal. The type does not
/// implement `Borrow<str>`: a map keyed by `Fingerprint` can only be
/// probed with another normalized `Fingerprint`.
///
/// ```text
///   " cCef02aa...1912\n"  ──new()──▶  "CCEF02AA...1912"
///   "zO8CqkVMCrD+Gsa..."  ──from_base64()──▶  "CCEF02AA...1912"
/// ```
///
/// The value is not checked to be 40 hex digits. Family lines may name
/// relays by nickname, and those entries still need a stable key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Normalize a textual fingerprint.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// Hex-encode raw identity bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode_upper(bytes))
    }

    /// Decode the base64 identity carried by status entries.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidIdentity`] if `encoded` is not base64.
    pub fn from_base64(encoded: &str) -> Result<Self, FieldError> {
        decode_base64(encoded.trim()).map(|bytes| Self::from_bytes(&bytes))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Fingerprint {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let a = Fingerprint::new("  ccef02aa454c0ab0fe1ac68304f6d8c4220c1912\n");
        let b = Fingerprint::new("CCEF02AA454C0AB0FE1AC68304F6D8C4220C1912");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "CCEF02AA454C0AB0FE1AC68304F6D8C4220C1912");
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let once = Fingerprint::new(" abc ");
        let twice = Fingerprint::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn decodes_base64_identity() {
        let fpr = Fingerprint::from_base64("zO8CqkVMCrD+GsaDBPbYxCIMGRI").unwrap();
        assert_eq!(fpr.to_string(), "CCEF02AA454C0AB0FE1AC68304F6D8C4220C1912");
    }

    #[test]
    fn bad_base64_is_an_identity_error() {
        assert!(matches!(
            Fingerprint::from_base64("%%%"),
            Err(FieldError::InvalidIdentity { .. })
        ));
    }
}
