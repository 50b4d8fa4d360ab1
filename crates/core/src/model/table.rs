use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use super::{OffsetCategory, OffsetKey, OffsetKind};

/// Insertion-ordered offset table.
///
/// A new key appends; an existing key absorbs the newer declaration without
/// moving. Iteration order is therefore ancestor declarations first, then the
/// entry's own additions, independent of any hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    entries: IndexMap<OffsetKey, OffsetKind>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, declaration: OffsetKind) {
        let key = declaration.key();
        match self.entries.get_mut(&key) {
            Some(existing) => existing.absorb(declaration),
            None => {
                self.entries.insert(key, declaration);
            }
        }
    }

    pub fn get(&self, key: &OffsetKey) -> Option<&OffsetKind> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All offsets in table order.
    pub fn iter(&self) -> impl Iterator<Item = &OffsetKind> {
        self.entries.values()
    }

    /// Offsets of one category, in table order.
    pub fn in_category(&self, category: OffsetCategory) -> impl Iterator<Item = &OffsetKind> {
        self.entries.values().filter(move |kind| kind.category() == category)
    }
}

impl FromIterator<OffsetKind> for OffsetTable {
    fn from_iter<I: IntoIterator<Item = OffsetKind>>(iter: I) -> Self {
        let mut table = OffsetTable::new();
        for declaration in iter {
            table.apply(declaration);
        }
        table
    }
}

/// Serialized as a sequence, since keys are not strings.
impl Serialize for OffsetTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for kind in self.entries.values() {
            seq.serialize_element(kind)?;
        }
        seq.end()
    }
}
