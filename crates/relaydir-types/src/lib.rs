#![warn(clippy::pedantic)]

pub mod error;
pub mod fields;
pub mod fingerprint;
pub mod flags;
pub mod address;
pub mod status;
pub mod descriptor;
pub mod record;
pub mod filter;
pub mod meta;

pub use address::RelayAddress;
pub use descriptor::{ExitRule, PolicyAction, RelayDescriptor};
pub use error::FieldError;
pub use filter::ObjectFilter;
pub use fingerprint::Fingerprint;
pub use flags::{RelayFlag, RelayFlags};
pub use meta::{ConsensusMeta, SharedRandValue};
pub use record::Record;
pub use status::{PortSummary, RelayStatusEntry};
