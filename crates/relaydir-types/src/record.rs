use std::fmt;
use std::net::IpAddr;

use crate::descriptor::RelayDescriptor;
use crate::fingerprint::Fingerprint;
use crate::status::RelayStatusEntry;

/// A decoded record from either document family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
  Descriptor(RelayDescriptor),
  Status(RelayStatusEntry),
}

impl Record {
  #[must_use]
  pub fn fingerprint(&self) -> &Fingerprint {
    match self {
      Self::Descriptor(desc) => &desc.fingerprint,
      Self::Status(status) => &status.fingerprint,
    }
  }

  #[must_use]
  pub fn nickname(&self) -> &str {
    match self {
      Self::Descriptor(desc) => &desc.nickname,
      Self::Status(status) => &status.nickname,
    }
  }

  /// Every address the record advertises, primary address first.
  #[must_use]
  pub fn addresses(&self) -> Vec<IpAddr> {
    match self {
      Self::Descriptor(desc) => std::iter::once(IpAddr::V4(desc.address))
        .chain(desc.or_addresses.iter().map(std::net::SocketAddr::ip))
        .collect(),
      Self::Status(status) => status.address.ips().collect(),
    }
  }

  #[must_use]
  pub fn as_descriptor(&self) -> Option<&RelayDescriptor> {
    match self {
      Self::Descriptor(desc) => Some(desc),
      Self::Status(_) => None,
    }
  }

  #[must_use]
  pub fn as_status(&self) -> Option<&RelayStatusEntry> {
    match self {
      Self::Status(status) => Some(status),
      Self::Descriptor(_) => None,
    }
  }
}

impl From<RelayDescriptor> for Record {
  fn from(desc: RelayDescriptor) -> Self {
    Self::Descriptor(desc)
  }
}

impl From<RelayStatusEntry> for Record {
  fn from(status: RelayStatusEntry) -> Self {
    Self::Status(status)
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Descriptor(desc) => fmt::Display::fmt(desc, f),
      Self::Status(status) => fmt::Display::fmt(status, f),
    }
  }
}
