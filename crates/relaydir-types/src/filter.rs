use std::collections::HashSet;
use std::net::IpAddr;

use crate::fingerprint::Fingerprint;
use crate::record::Record;

/// A set-valued predicate over records.
///
/// Three independent categories; a record matches when it hits any of
/// them. There is no AND across categories.
///
/// ```text
///   matches(r) = r.fingerprint ∈ fingerprints
///              ∨ any(r.addresses) ∈ addresses
///              ∨ r.nickname ∈ nicknames
/// ```
///
/// An empty filter matches every record. Addresses are stored in their
/// textual form, so `::1` and `0:0:0:0:0:0:0:1` are the same entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectFilter {
  fingerprints: HashSet<Fingerprint>,
  addresses: HashSet<String>,
  nicknames: HashSet<String>,
}

impl ObjectFilter {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_fingerprint(&mut self, fingerprint: impl AsRef<str>) {
    self.fingerprints.insert(Fingerprint::new(fingerprint));
  }

  pub fn add_address(&mut self, address: IpAddr) {
    self.addresses.insert(address.to_string());
  }

  pub fn add_nickname(&mut self, nickname: impl Into<String>) {
    self.nicknames.insert(nickname.into());
  }

  #[must_use]
  pub fn has_fingerprint(&self, fingerprint: impl AsRef<str>) -> bool {
    self.fingerprints.contains(&Fingerprint::new(fingerprint))
  }

  #[must_use]
  pub fn has_address(&self, address: IpAddr) -> bool {
    self.addresses.contains(&address.to_string())
  }

  #[must_use]
  pub fn has_nickname(&self, nickname: &str) -> bool {
    self.nicknames.contains(nickname)
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.fingerprints.is_empty() && self.addresses.is_empty() && self.nicknames.is_empty()
  }

  #[must_use]
  pub fn matches(&self, record: &Record) -> bool {
    if self.is_empty() {
      return true;
    }
    self.fingerprints.contains(record.fingerprint())
      || self.has_nickname(record.nickname())
      || record.addresses().into_iter().any(|ip| self.has_address(ip))
  }
}
