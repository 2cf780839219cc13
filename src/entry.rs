//! Pooled header entries for the encoder's dynamic table.
//!
//! Entries live in an arena and point at each other by [`EntryId`]. A live
//! entry sits in one hash bucket chain (`next`) and in the eviction ring
//! (`before`/`after`). The ring is anchored by the sentinel at [`HEAD`]:
//! `HEAD.after` is the oldest entry and `HEAD.before` the newest.
//!
//! Evicted slots go onto a free-list and are reinitialized in place, so their
//! string buffers are reused instead of reallocated.

/// Index of a slot in the entry arena.
pub(crate) type EntryId = usize;

/// Ring sentinel slot.
pub(crate) const HEAD: EntryId = 0;

/// One name/value pair resident in (or pooled by) the dynamic table.
#[derive(Debug, Default)]
pub(crate) struct HeaderEntry {
    pub(crate) name: String,
    pub(crate) value: String,
    /// Hash of `name` only.
    pub(crate) hash: u32,
    /// Insertion sequence number, decreasing with each insert (wrapping).
    pub(crate) table_index: u32,
    /// `name.len() + value.len() + 32`
    pub(crate) size: usize,
    /// Next entry in the same hash bucket.
    pub(crate) next: Option<EntryId>,
    before: EntryId,
    after: EntryId,
}

/// Arena of entries plus the free-list of pooled slots.
#[derive(Debug)]
pub(crate) struct Entries {
    slots: Vec<HeaderEntry>,
    free: Vec<EntryId>,
}

impl Entries {
    pub(crate) fn new() -> Self {
        let head = HeaderEntry {
            table_index: u32::MAX,
            before: HEAD,
            after: HEAD,
            ..HeaderEntry::default()
        };
        Self {
            slots: vec![head],
            free: Vec::new(),
        }
    }

    pub(crate) fn get(&self, id: EntryId) -> &HeaderEntry {
        &self.slots[id]
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> &mut HeaderEntry {
        &mut self.slots[id]
    }

    /// Oldest live entry, if any.
    pub(crate) fn oldest(&self) -> Option<EntryId> {
        Some(self.slots[HEAD].after).filter(|&id| id != HEAD)
    }

    /// Newest live entry, if any.
    pub(crate) fn newest(&self) -> Option<EntryId> {
        Some(self.slots[HEAD].before).filter(|&id| id != HEAD)
    }

    /// Sequence number of the newest entry, or the sentinel's when empty.
    pub(crate) fn newest_table_index(&self) -> u32 {
        let id = self.newest().unwrap_or(HEAD);
        self.slots[id].table_index
    }

    /// Take a pooled slot, or grow the arena.
    pub(crate) fn allocate(&mut self) -> EntryId {
        match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(HeaderEntry::default());
                self.slots.len() - 1
            }
        }
    }

    /// Return a removed slot to the pool.
    pub(crate) fn release(&mut self, id: EntryId) {
        debug_assert_ne!(id, HEAD);
        self.free.push(id);
    }

    pub(crate) fn initialize(
        &mut self,
        id: EntryId,
        hash: u32,
        name: &str,
        value: &str,
        size: usize,
        table_index: u32,
        next: Option<EntryId>,
    ) {
        let entry = &mut self.slots[id];
        entry.name.clear();
        entry.name.push_str(name);
        entry.value.clear();
        entry.value.push_str(value);
        entry.hash = hash;
        entry.size = size;
        entry.table_index = table_index;
        entry.next = next;
    }

    /// Splice `id` into the ring immediately before `sentinel`.
    pub(crate) fn add_before(&mut self, id: EntryId, sentinel: EntryId) {
        let before = self.slots[sentinel].before;
        self.slots[id].after = sentinel;
        self.slots[id].before = before;
        self.slots[before].after = id;
        self.slots[sentinel].before = id;
    }

    /// Splice `id` out of the ring and clear it for reuse.
    pub(crate) fn remove(&mut self, id: EntryId) {
        debug_assert_ne!(id, HEAD);
        let (before, after) = (self.slots[id].before, self.slots[id].after);
        self.slots[before].after = after;
        self.slots[after].before = before;

        let entry = &mut self.slots[id];
        entry.name.clear();
        entry.value.clear();
        entry.hash = 0;
        entry.size = 0;
        entry.table_index = 0;
        entry.next = None;
        entry.before = id;
        entry.after = id;
    }

    /// Number of slots held by the arena, sentinel excluded.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    #[cfg(test)]
    pub(crate) fn pooled(&self) -> usize {
        self.free.len()
    }

    /// Live entries from oldest to newest.
    pub(crate) fn iter_oldest_first(&self) -> impl Iterator<Item = &HeaderEntry> + '_ {
        let mut cursor = self.slots[HEAD].after;
        std::iter::from_fn(move || {
            if cursor == HEAD {
                return None;
            }
            let entry = &self.slots[cursor];
            cursor = entry.after;
            Some(entry)
        })
    }
}
