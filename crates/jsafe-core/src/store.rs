//! Child stores for container values.
//!
//! Stores only record which ids a container owns. Releasing those ids is the
//! arena's job.

use indexmap::IndexMap;

use crate::alloc;
use crate::error::AllocError;
use crate::handle::ValueId;

/// Insertion-ordered map from unique keys to owned children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectStore {
    entries: IndexMap<Box<[u8]>, ValueId>,
}

impl ObjectStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &[u8]) -> Option<ValueId> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&[u8], ValueId)> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(k, v)| (&**k, *v))
    }

    /// Entry at insertion position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&[u8], ValueId)> {
        self.entries.get_index(index).map(|(k, v)| (&**k, *v))
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.entries.keys().map(|k| &**k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = ValueId> + '_ {
        self.entries.values().copied()
    }

    /// Inserts `child` under `key`.
    ///
    /// An existing key keeps its position and the displaced child is returned
    /// so the caller can release it. A new key is appended.
    pub(crate) fn insert(&mut self, key: &[u8], child: ValueId) -> Result<Option<ValueId>, AllocError> {
        if let Some(slot) = self.entries.get_mut(key) {
            return Ok(Some(std::mem::replace(slot, child)));
        }
        let mut owned = Vec::new();
        alloc::reserve(&mut owned, key.len(), "key bytes")?;
        owned.extend_from_slice(key);
        self.entries
            .try_reserve(1)
            .map_err(|_| AllocError::Exhausted { what: "object entries", requested: 1 })?;
        self.entries.insert(owned.into_boxed_slice(), child);
        Ok(None)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub(crate) fn remove(&mut self, key: &[u8]) -> Option<ValueId> {
        self.entries.shift_remove(key)
    }

    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        self.entries.try_reserve(additional).map_err(|_| AllocError::Exhausted {
            what: "object entries",
            requested: additional,
        })
    }

    pub(crate) fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ValueId> + '_ {
        self.entries.drain(..).map(|(_, v)| v)
    }
}

/// Ordered sequence of owned children. Append-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayStore {
    items: Vec<ValueId>,
}

impl ArrayStore {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ValueId> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ValueId> + ExactSizeIterator + '_ {
        self.items.iter().copied()
    }

    pub(crate) fn push(&mut self, child: ValueId) -> Result<(), AllocError> {
        alloc::reserve(&mut self.items, 1, "array items")?;
        self.items.push(child);
        Ok(())
    }

    pub(crate) fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        alloc::reserve(&mut self.items, additional, "array items")
    }

    pub(crate) fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ValueId> + '_ {
        self.items.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ValueId {
        ValueId::from_raw(n)
    }

    #[test]
    fn replace_keeps_position() {
        let mut obj = ObjectStore::default();
        assert_eq!(obj.insert(b"a", id(1)), Ok(None));
        assert_eq!(obj.insert(b"b", id(2)), Ok(None));
        assert_eq!(obj.insert(b"a", id(3)), Ok(Some(id(1))));

        let entries: Vec<_> = obj.iter().collect();
        assert_eq!(entries, vec![(&b"a"[..], id(3)), (&b"b"[..], id(2))]);
    }

    #[test]
    fn remove_preserves_order_of_rest() {
        let mut obj = ObjectStore::default();
        for (i, key) in [b"x", b"y", b"z"].iter().enumerate() {
            obj.insert(*key, id(i as u64 + 1)).unwrap();
        }
        assert_eq!(obj.remove(b"y"), Some(id(2)));
        assert_eq!(obj.remove(b"y"), None);
        let keys: Vec<_> = obj.keys().collect();
        assert_eq!(keys, vec![&b"x"[..], &b"z"[..]]);
    }

    #[test]
    fn reserve_is_not_observable() {
        let mut arr = ArrayStore::default();
        arr.reserve(64).unwrap();
        assert!(arr.capacity() >= 64);
        assert!(arr.is_empty());
        arr.push(id(9)).unwrap();
        assert_eq!(arr.get(0), Some(id(9)));
        assert_eq!(arr.get(1), None);
    }
}
