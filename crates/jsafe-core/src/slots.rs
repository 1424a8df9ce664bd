//! Generational slot table backing the arena.

use crate::alloc;
use crate::error::AllocError;
use crate::handle::RawId;

// `slot + 1` must fit the low word of a packed id.
const MAX_SLOTS: usize = u32::MAX as usize;

struct Entry<T> {
    generation: u32,
    item: Option<T>,
}

pub(crate) struct Slots<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Slots<T> {
    /// `capacity` is a hint; a reservation that cannot be met starts empty.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut entries = Vec::new();
        if let Err(err) = alloc::reserve(&mut entries, capacity.min(MAX_SLOTS), "slots") {
            tracing::warn!(error = %err, "ignoring initial slot reservation");
        }
        Self {
            entries,
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn insert(&mut self, item: T) -> Result<RawId, AllocError> {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.item = Some(item);
            self.live += 1;
            return Ok(RawId {
                slot,
                generation: entry.generation,
            });
        }
        let slot = self.entries.len();
        if slot >= MAX_SLOTS {
            return Err(AllocError::SlotsExhausted(slot));
        }
        alloc::reserve(&mut self.entries, 1, "slots")?;
        // The free list can then hold every slot, so `remove` never allocates.
        let spare = self.entries.len() + 1 - self.free.len();
        alloc::reserve(&mut self.free, spare, "free slots")?;
        self.entries.push(Entry {
            generation: 0,
            item: Some(item),
        });
        self.live += 1;
        Ok(RawId {
            slot: slot as u32,
            generation: 0,
        })
    }

    pub(crate) fn get(&self, id: RawId) -> Option<&T> {
        self.entries
            .get(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.item.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: RawId) -> Option<&mut T> {
        self.entries
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.item.as_mut())
    }

    pub(crate) fn remove(&mut self, id: RawId) -> Option<T> {
        let entry = self
            .entries
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)?;
        let item = entry.item.take()?;
        self.live -= 1;
        Self::retire(entry, id.slot, &mut self.free);
        Some(item)
    }

    /// Drops every live item. Generations advance, so old ids stay stale.
    pub(crate) fn clear(&mut self) -> usize {
        let released = self.live;
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.item.take().is_some() {
                Self::retire(entry, slot as u32, &mut self.free);
            }
        }
        self.live = 0;
        released
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (RawId, &T)> + '_ {
        self.entries.iter().enumerate().filter_map(|(slot, entry)| {
            entry.item.as_ref().map(|item| {
                (
                    RawId {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    item,
                )
            })
        })
    }

    fn retire(entry: &mut Entry<T>, slot: u32, free: &mut Vec<u32>) {
        // A slot whose generation would wrap is never handed out again.
        if let Some(next) = entry.generation.checked_add(1) {
            entry.generation = next;
            free.push(slot);
        }
    }
}
