/// Errors raised while decoding the fields of a single record.
///
/// A `FieldError` is always fatal for the record it came from. Numeric
/// fields that are merely informational (uptime, bandwidth, hibernation)
/// never produce one; they fall back to zero or `false` instead.
///
/// # Error hierarchy
///
/// ```text
/// ┌──────────────────────────────────────────────────────────┐
/// │ FieldError (this crate)                                  │
/// │   ├── MissingLine / MissingToken  ← structure incomplete │
/// │   ├── InvalidIdentity             ← base64 identity bad  │
/// │   ├── InvalidAddress / InvalidPort                       │
/// │   ├── InvalidTimestamp                                   │
/// │   └── InvalidMeta                 ← document preamble    │
/// └──────────────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
  /// A line every record of this kind must carry is absent.
  #[error("missing {keyword:?} line")]
  MissingLine { keyword: &'static str },

  /// A positional argument of a known line is absent.
  #[error("{keyword:?} line has no {field}")]
  MissingToken {
    keyword: String,
    field: &'static str,
  },

  /// The transport-encoded identity or digest did not decode.
  #[error("cannot decode identity {value:?}: {reason}")]
  InvalidIdentity { value: String, reason: String },

  #[error("invalid address {value:?} in {keyword:?} line")]
  InvalidAddress { keyword: &'static str, value: String },

  #[error("invalid port {value:?} in {keyword:?} line")]
  InvalidPort { keyword: &'static str, value: String },

  #[error("invalid timestamp {value:?} in {keyword:?} line")]
  InvalidTimestamp { keyword: &'static str, value: String },

  /// A document preamble line could not be interpreted.
  #[error("malformed {keyword:?} preamble line: {value:?}")]
  InvalidMeta { keyword: String, value: String },
}
