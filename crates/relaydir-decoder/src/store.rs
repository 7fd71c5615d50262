use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::Arc;

use relaydir_types::{FieldError, Fingerprint, ObjectFilter, Record};
use tracing::warn;

use crate::lazy::LazyRecord;

/// Records of one document, keyed by normalized fingerprint.
///
/// Each key holds at most one handle. [`set`](Self::set) and
/// [`insert`](Self::insert) replace an existing entry (last write wins);
/// [`merge`](Self::merge) never does (first store wins).
///
/// Handles are shared through `Arc`, so the stores returned by
/// [`intersect`](Self::intersect) and [`subtract`](Self::subtract) reuse
/// `self`'s handles and any record they already decoded.
///
/// # Set algebra
///
/// ```text
///   f ∈ a.intersect(b)  ⇔  f ∈ a ∧ f ∈ b     values from a
///   f ∈ a.subtract(b)   ⇔  f ∈ a ∧ f ∉ b     values from a
///   f ∈ a.merge(b)      ⇔  f ∈ a ∨ f ∈ b     a's value where both
/// ```
///
/// The store is not synchronized. Callers that populate one store from
/// several tasks must serialize the mutation themselves.
#[derive(Clone, Debug, Default)]
pub struct ObjectStore {
    records: HashMap<Fingerprint, Arc<LazyRecord>>,
}

impl ObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
        }
    }

    /// Install a decoded record under `fingerprint`, replacing any
    /// existing entry.
    pub fn set(&mut self, fingerprint: impl AsRef<str>, record: Record) {
        self.records
            .insert(Fingerprint::new(fingerprint), Arc::new(LazyRecord::resolved(record)));
    }

    /// Install a handle under its own fingerprint, returning the handle it
    /// replaced.
    pub fn insert(&mut self, handle: LazyRecord) -> Option<Arc<LazyRecord>> {
        let key = Fingerprint::new(handle.fingerprint());
        self.records.insert(key, Arc::new(handle))
    }

    /// Look up and decode a record.
    ///
    /// A miss is `None`. A record whose deferred decode fails is logged
    /// and also reported as `None`, so the two cannot be told apart here.
    /// Callers that must distinguish a lookup miss from a broken record
    /// use [`try_get`](Self::try_get) instead.
    #[must_use]
    pub fn get(&self, fingerprint: impl AsRef<str>) -> Option<Record> {
        let fingerprint = fingerprint.as_ref();
        match self.try_get(fingerprint)? {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(fingerprint, error = %err, "stored record failed to decode");
                None
            }
        }
    }

    /// Look up and decode a record, keeping decode failures.
    ///
    /// `None` is a lookup miss and `Some(Err(_))` a stored record whose
    /// deferred decode failed.
    #[must_use]
    pub fn try_get(&self, fingerprint: impl AsRef<str>) -> Option<Result<Record, FieldError>> {
        self.handle(fingerprint).map(|handle| handle.resolve())
    }

    /// The handle stored under `fingerprint`, without decoding it.
    #[must_use]
    pub fn handle(&self, fingerprint: impl AsRef<str>) -> Option<&Arc<LazyRecord>> {
        self.records.get(&Fingerprint::new(fingerprint))
    }

    #[must_use]
    pub fn contains(&self, fingerprint: impl AsRef<str>) -> bool {
        self.records.contains_key(&Fingerprint::new(fingerprint))
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored keys, in no particular order.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.records.keys()
    }

    /// Decode and yield records, optionally narrowed by `filter`.
    ///
    /// With no filter, or an empty one, every record is yielded. Order is
    /// unspecified. Records that fail to decode are yielded as errors
    /// since they cannot be matched.
    #[must_use]
    pub fn iter<'a>(&'a self, filter: Option<&'a ObjectFilter>) -> Iter<'a> {
        Iter {
            handles: self.records.values(),
            filter: filter.filter(|f| !f.is_empty()),
        }
    }

    /// Add every entry of `other` whose key is absent here.
    pub fn merge(&mut self, other: &ObjectStore) {
        for (fingerprint, handle) in &other.records {
            self.records
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::clone(handle));
        }
    }

    /// Entries of `self` whose key is also in `other`.
    #[must_use]
    pub fn intersect(&self, other: &ObjectStore) -> ObjectStore {
        self.retain_by(|fingerprint| other.records.contains_key(fingerprint))
    }

    /// Entries of `self` whose key is not in `other`.
    #[must_use]
    pub fn subtract(&self, other: &ObjectStore) -> ObjectStore {
        self.retain_by(|fingerprint| !other.records.contains_key(fingerprint))
    }

    fn retain_by(&self, keep: impl Fn(&Fingerprint) -> bool) -> ObjectStore {
        let records = self
            .records
            .iter()
            .filter(|&(fingerprint, _)| keep(fingerprint))
            .map(|(fingerprint, handle)| (fingerprint.clone(), Arc::clone(handle)))
            .collect();
        ObjectStore { records }
    }

    /// Snapshot of every handle.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Arc<LazyRecord>> {
        self.records.values().cloned().collect()
    }
}

impl FromIterator<Record> for ObjectStore {
    /// Key each record by its own fingerprint; later duplicates win.
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.insert(LazyRecord::resolved(record));
        }
        store
    }
}

/// Iterator returned by [`ObjectStore::iter`].
pub struct Iter<'a> {
    handles: hash_map::Values<'a, Fingerprint, Arc<LazyRecord>>,
    filter: Option<&'a ObjectFilter>,
}

impl Iterator for Iter<'_> {
    type Item = Result<Record, FieldError>;

    fn next(&mut self) -> Option<Self::Item> {
        for handle in self.handles.by_ref() {
            match handle.resolve() {
                Ok(record) if self.filter.is_none_or(|f| f.matches(&record)) => {
                    return Some(Ok(record));
                }
                Ok(_) => {}
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}
