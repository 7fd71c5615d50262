use std::fmt;

// ── Macro for the closed flag vocabulary ──────────────────────────────
//
// Each flag has a variant, the token that spells it on an `s` line, and
// a bit in `RelayFlags`. The macro keeps the three in one place.

macro_rules! flag_vocabulary {
  (
    $(#[$meta:meta])*
    pub enum $name:ident {
      $( $(#[$vmeta:meta])* $variant:ident = $token:literal ),+ $(,)?
    }
  ) => {
    $(#[$meta])*
    pub enum $name {
      $( $(#[$vmeta])* $variant ),+
    }

    impl $name {
      /// Every flag, in rendering order.
      pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

      /// The token that spells this flag in a status entry.
      #[must_use]
      pub fn as_str(self) -> &'static str {
        match self {
          $( Self::$variant => $token ),+
        }
      }

      /// Look up a token. Tokens outside the vocabulary are `None`.
      #[must_use]
      pub fn from_token(token: &str) -> Option<Self> {
        match token {
          $( $token => Some(Self::$variant), )+
          _ => None,
        }
      }
    }
  };
}

// ── RelayFlag ─────────────────────────────────────────────────────────

flag_vocabulary! {
  /// A status flag assigned to a relay by the directory authorities.
  ///
  /// ```text
  /// ┌─────┬───────────┐
  /// │ Bit │ Token     │
  /// ├─────┼───────────┤
  /// │ 0   │ Authority │
  /// │ 1   │ BadExit   │
  /// │ 2   │ Exit      │
  /// │ 3   │ Fast      │
  /// │ 4   │ Guard     │
  /// │ 5   │ HSDir     │
  /// │ 6   │ Named     │
  /// │ 7   │ Stable    │
  /// │ 8   │ Running   │
  /// │ 9   │ Unnamed   │
  /// │ 10  │ Valid     │
  /// │ 11  │ V2Dir     │
  /// └─────┴───────────┘
  /// ```
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub enum RelayFlag {
    Authority = "Authority",
    BadExit = "BadExit",
    Exit = "Exit",
    Fast = "Fast",
    Guard = "Guard",
    HSDir = "HSDir",
    Named = "Named",
    Stable = "Stable",
    Running = "Running",
    Unnamed = "Unnamed",
    Valid = "Valid",
    V2Dir = "V2Dir",
  }
}

impl RelayFlag {
  fn bit(self) -> u16 {
    1 << (self as u16)
  }
}

impl fmt::Display for RelayFlag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ── RelayFlags ────────────────────────────────────────────────────────

/// The set of flags on one status entry.
///
/// Order and duplicates on the source line are irrelevant. The set
/// always renders in vocabulary order, joined by `|`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RelayFlags(u16);

impl RelayFlags {
  #[must_use]
  pub const fn empty() -> Self {
    Self(0)
  }

  /// Build a set from `s` line tokens, ignoring unknown ones.
  pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
    tokens
      .into_iter()
      .filter_map(RelayFlag::from_token)
      .collect()
  }

  pub fn insert(&mut self, flag: RelayFlag) {
    self.0 |= flag.bit();
  }

  #[must_use]
  pub fn contains(self, flag: RelayFlag) -> bool {
    self.0 & flag.bit() != 0
  }

  #[must_use]
  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  #[must_use]
  pub fn len(self) -> usize {
    self.0.count_ones() as usize
  }

  /// Flags present, in vocabulary order.
  pub fn iter(self) -> impl Iterator<Item = RelayFlag> {
    RelayFlag::ALL
      .iter()
      .copied()
      .filter(move |flag| self.contains(*flag))
  }
}

impl FromIterator<RelayFlag> for RelayFlags {
  fn from_iter<I: IntoIterator<Item = RelayFlag>>(iter: I) -> Self {
    let mut flags = Self::empty();
    for flag in iter {
      flags.insert(flag);
    }
    flags
  }
}

impl fmt::Debug for RelayFlags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

impl fmt::Display for RelayFlags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, flag) in self.iter().enumerate() {
      if i > 0 {
        f.write_str("|")?;
      }
      f.write_str(flag.as_str())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_tokens_are_ignored() {
    let flags = RelayFlags::from_tokens(["Fast", "NoEdConsensus", "Running", "StaleDesc"]);
    assert_eq!(flags.len(), 2);
    assert!(flags.contains(RelayFlag::Fast));
    assert!(flags.contains(RelayFlag::Running));
    assert!(!flags.contains(RelayFlag::Guard));
  }

  #[test]
  fn order_and_duplicates_do_not_matter() {
    let a = RelayFlags::from_tokens(["Valid", "Fast", "Valid", "Stable"]);
    let b = RelayFlags::from_tokens(["Stable", "Fast", "Valid"]);
    assert_eq!(a, b);
  }

  #[test]
  fn renders_in_vocabulary_order() {
    let flags = RelayFlags::from_tokens(["Valid", "Stable", "Running", "Fast"]);
    assert_eq!(flags.to_string(), "Fast|Stable|Running|Valid");
    assert_eq!(RelayFlags::empty().to_string(), "");
  }

  #[test]
  fn every_token_round_trips() {
    for flag in RelayFlag::ALL {
      assert_eq!(RelayFlag::from_token(flag.as_str()), Some(*flag));
    }
    assert_eq!(RelayFlag::ALL.len(), 12);
  }
}
