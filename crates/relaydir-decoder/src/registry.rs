//! Per-format capabilities, selected by document type name.

use relaydir_types::{ConsensusMeta, FieldError, RelayDescriptor, RelayStatusEntry, Record};
use relaydir_wire::Layout;

use crate::lazy::{DecodeFn, FingerprintFn};

/// Decodes the preamble skipped before the first record.
pub type MetaFn = fn(&str) -> Result<ConsensusMeta, FieldError>;

/// Everything needed to parse one document family.
///
/// ```text
/// ┌────────────────────────────┬──────────┬─────────────────────────────────┬────────┬────────┐
/// │ type_name                  │ start    │ ends at                         │ meta   │ strict │
/// ├────────────────────────────┼──────────┼─────────────────────────────────┼────────┼────────┤
/// │ server-descriptor          │ "router "│ each record: END SIGNATURE line │ no     │ yes    │
/// │ network-status-consensus-3 │ "r "     │ document: directory-signature   │ yes    │ yes    │
/// │ bridge-network-status      │ "r "     │ document: directory-signature   │ no     │ no     │
/// └────────────────────────────┴──────────┴─────────────────────────────────┴────────┴────────┘
/// ```
#[derive(Debug)]
pub struct DocumentFormat {
    pub type_name: &'static str,
    /// The `major.minor` version this format was written against.
    pub version: (u32, u32),
    pub layout: Layout,
    pub fingerprint: FingerprintFn,
    pub decode: DecodeFn,
    pub meta: Option<MetaFn>,
    /// Whether a missing terminal or record end marker fails the parse
    /// when the caller does not say.
    pub strict_by_default: bool,
}

impl DocumentFormat {
    /// Resolve the effective strictness for a parse.
    #[must_use]
    pub fn is_strict(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.strict_by_default)
    }
}

const STATUS_LAYOUT: Layout = Layout {
    start: "r ",
    terminal: Some("directory-signature"),
    record_end: None,
};

fn decode_descriptor(text: &str) -> Result<Record, FieldError> {
    RelayDescriptor::decode(text).map(Record::Descriptor)
}

fn decode_status(text: &str) -> Result<Record, FieldError> {
    RelayStatusEntry::decode(text).map(Record::Status)
}

pub static SERVER_DESCRIPTOR: DocumentFormat = DocumentFormat {
    type_name: "server-descriptor",
    version: (1, 0),
    layout: Layout {
        start: "router ",
        terminal: None,
        record_end: Some("-----END SIGNATURE-----"),
    },
    fingerprint: RelayDescriptor::extract_fingerprint,
    decode: decode_descriptor,
    meta: None,
    strict_by_default: true,
};

pub static CONSENSUS: DocumentFormat = DocumentFormat {
    type_name: "network-status-consensus-3",
    version: (1, 0),
    layout: STATUS_LAYOUT,
    fingerprint: RelayStatusEntry::extract_fingerprint,
    decode: decode_status,
    meta: Some(ConsensusMeta::from_preamble),
    strict_by_default: true,
};

pub static BRIDGE_STATUS: DocumentFormat = DocumentFormat {
    type_name: "bridge-network-status",
    version: (1, 2),
    layout: STATUS_LAYOUT,
    fingerprint: RelayStatusEntry::extract_fingerprint,
    decode: decode_status,
    meta: None,
    strict_by_default: false,
};

/// Every registered format.
pub static FORMATS: [&DocumentFormat; 3] = [&SERVER_DESCRIPTOR, &CONSENSUS, &BRIDGE_STATUS];

/// Look up the format registered for a document type name.
#[must_use]
pub fn decoder_for(type_name: &str) -> Option<&'static DocumentFormat> {
    FORMATS
        .iter()
        .copied()
        .find(|format| format.type_name == type_name)
}
