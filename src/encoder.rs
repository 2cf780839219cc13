//! HPACK dynamic table encoder (RFC 7541 Section 2.3 and 4).
//!
//! The encoder keeps its own copy of the dynamic table the peer's decoder
//! will build, and picks per header between an indexed reference, a literal
//! that grows the table, or a literal that leaves it alone. Every table
//! mutation happens only after the instruction describing it has been fully
//! written, so the two tables never disagree about what was sent.
//!
//! Entries are hashed by name into a fixed set of buckets for lookup and
//! threaded onto a ring in insertion order for eviction. Both structures live
//! in an arena of pooled slots (see [`crate::entry`]).

use tracing::{debug, error, trace};

use crate::config::{EncoderConfig, DEFAULT_HEADER_TABLE_SIZE};
use crate::entry::{Entries, EntryId, HEAD};
use crate::error::HpackError;
use crate::primitives::{
    encode_dynamic_table_size_update, encode_indexed_header_field, encode_literal_header_field,
    LiteralKind, LiteralName,
};
use crate::static_table::{self, STATIC_TABLE_LEN};

/// Per-entry overhead counted by RFC 7541 Section 4.1.
pub const ENTRY_OVERHEAD: usize = 32;

const BUCKET_COUNT: usize = 64;
const BUCKET_MASK: u32 = (BUCKET_COUNT - 1) as u32;

/// Size a header occupies in the dynamic table.
pub fn header_size(name: &str, value: &str) -> usize {
    name.len() + value.len() + ENTRY_OVERHEAD
}

/// How a header may use the dynamic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderEncodingHint {
    /// Reference or add to the dynamic table when possible.
    #[default]
    Index,
    /// Send as a literal without touching the dynamic table.
    IgnoreIndex,
    /// Sensitive: send as a never-indexed literal.
    NeverIndex,
}

/// Sender side of an HPACK dynamic table, one per connection.
///
/// Not thread-safe; header blocks must be encoded in the order they are sent.
///
/// Encoding calls return `Ok(Some(n))` after writing `n` bytes, `Ok(None)`
/// when `dst` was too small (nothing changed, retry with more room), and
/// `Err` when the table's internal state is inconsistent. After an `Err`
/// other than [`HpackError::PendingSizeUpdate`] the encoder is poisoned.
#[derive(Debug)]
pub struct DynamicTableEncoder {
    buckets: [Option<EntryId>; BUCKET_COUNT],
    entries: Entries,
    /// Number of live entries.
    len: usize,
    current_size: usize,
    max_size: usize,
    pending_size_update: bool,
    /// Table size the peer last heard about.
    announced_size: usize,
    /// Smallest maximum set since then.
    smallest_pending_size: usize,
    allow_dynamic_compression: bool,
    use_huffman: bool,
    poisoned: bool,
}

impl Default for DynamicTableEncoder {
    fn default() -> Self {
        Self::new(&EncoderConfig::default())
    }
}

impl DynamicTableEncoder {
    /// The starting maximum never exceeds the protocol default the peer
    /// decoder starts from, nor `max_header_table_size`. Anything larger
    /// has to come through [`update_max_table_size`] once the peer allows it.
    ///
    /// [`update_max_table_size`]: Self::update_max_table_size
    pub fn new(config: &EncoderConfig) -> Self {
        let initial_size = config
            .header_table_size
            .min(config.max_header_table_size)
            .min(DEFAULT_HEADER_TABLE_SIZE);
        if initial_size != config.header_table_size {
            debug!(
                configured = config.header_table_size,
                initial = initial_size,
                "clamped initial dynamic table size"
            );
        }
        Self {
            buckets: [None; BUCKET_COUNT],
            entries: Entries::new(),
            len: 0,
            current_size: 0,
            max_size: initial_size,
            pending_size_update: false,
            announced_size: initial_size,
            smallest_pending_size: initial_size,
            allow_dynamic_compression: config.allow_dynamic_compression,
            use_huffman: config.use_huffman,
            poisoned: false,
        }
    }

    /// Sum of the sizes of all live entries.
    pub fn current_size(&self) -> usize {
        self.current_size
    }

    pub fn max_table_size(&self) -> usize {
        self.max_size
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.entries.oldest().is_none()
    }

    pub fn has_pending_size_update(&self) -> bool {
        self.pending_size_update
    }

    pub fn allows_dynamic_indexing(&self) -> bool {
        self.allow_dynamic_compression && self.max_size > 0
    }

    pub fn uses_huffman(&self) -> bool {
        self.use_huffman
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Live `(name, value)` pairs, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter_oldest_first()
            .map(|e| (e.name.as_str(), e.value.as_str()))
    }

    /// Change the table maximum and evict down to it right away.
    ///
    /// The change must be announced with [`emit_pending_size_update`]
    /// before the next header.
    ///
    /// [`emit_pending_size_update`]: Self::emit_pending_size_update
    pub fn update_max_table_size(&mut self, new_size: usize) -> Result<(), HpackError> {
        self.check_poisoned()?;
        debug!(old = self.max_size, new = new_size, "updating max dynamic table size");

        self.smallest_pending_size = if self.pending_size_update {
            self.smallest_pending_size.min(new_size)
        } else {
            new_size
        };
        self.max_size = new_size;
        self.pending_size_update = true;
        self.ensure_capacity(0)
    }

    /// Write the owed table size update, if any.
    ///
    /// If the maximum dipped below both the previously announced and the
    /// final value, the dip is announced first so the peer evicts as we did.
    /// The flag clears only once everything fits in `dst`.
    pub fn emit_pending_size_update(&mut self, dst: &mut [u8]) -> Result<Option<usize>, HpackError> {
        self.check_poisoned()?;
        if !self.pending_size_update {
            return Ok(Some(0));
        }

        let mut written = 0;
        if self.smallest_pending_size < self.max_size.min(self.announced_size) {
            written = match encode_dynamic_table_size_update(self.smallest_pending_size, dst) {
                Some(n) => n,
                None => return Ok(None),
            };
        }
        let Some(n) = dst
            .get_mut(written..)
            .and_then(|rest| encode_dynamic_table_size_update(self.max_size, rest))
        else {
            return Ok(None);
        };
        written += n;

        trace!(
            smallest = self.smallest_pending_size,
            size = self.max_size,
            "emitted dynamic table size update"
        );
        self.pending_size_update = false;
        self.announced_size = self.max_size;
        self.smallest_pending_size = self.max_size;
        Ok(Some(written))
    }

    /// Encode one header field into `dst`.
    ///
    /// `static_index` is the static table index of `name`, if it has one.
    pub fn encode_header(
        &mut self,
        dst: &mut [u8],
        static_index: Option<usize>,
        hint: HeaderEncodingHint,
        name: &str,
        value: &str,
    ) -> Result<Option<usize>, HpackError> {
        self.check_poisoned()?;
        if self.pending_size_update {
            return Err(HpackError::PendingSizeUpdate);
        }
        debug_assert!(
            static_index.map_or(true, |i| static_table::get(i).is_some_and(|(n, _)| n == name)),
            "static index {static_index:?} does not name {name}"
        );

        // Sensitive values never enter or consult the dynamic table.
        if hint == HeaderEncodingHint::NeverIndex {
            let name_ref = static_index.map_or(LiteralName::New(name), LiteralName::Indexed);
            return Ok(self.literal(LiteralKind::NeverIndexed, name_ref, value, dst));
        }

        if !self.allow_dynamic_compression || self.max_size == 0 || hint == HeaderEncodingHint::IgnoreIndex {
            let name_ref = static_index.map_or(LiteralName::New(name), LiteralName::Indexed);
            return Ok(self.literal(LiteralKind::WithoutIndexing, name_ref, value, dst));
        }

        // Adding it would flush the whole table and still not fit.
        let size = header_size(name, value);
        if size > self.max_size {
            let name_ref = self.resolve_name(static_index, hash_name(name), name);
            return Ok(self.literal(LiteralKind::WithoutIndexing, name_ref, value, dst));
        }

        self.encode_dynamic_header(dst, static_index, name, value, size)
    }

    fn encode_dynamic_header(
        &mut self,
        dst: &mut [u8],
        static_index: Option<usize>,
        name: &str,
        value: &str,
        size: usize,
    ) -> Result<Option<usize>, HpackError> {
        let hash = hash_name(name);

        if let Some(id) = self.get_entry(hash, name, value) {
            let index = self.wire_index(id);
            trace!(name, index, "dynamic table hit");
            return Ok(encode_indexed_header_field(index, dst));
        }

        let name_ref = self.resolve_name(static_index, hash, name);
        let Some(written) = self.literal(LiteralKind::IncrementalIndexing, name_ref, value, dst) else {
            return Ok(None);
        };

        self.ensure_capacity(size)?;
        self.add_entry(hash, name, value, size)?;
        Ok(Some(written))
    }

    fn literal(&self, kind: LiteralKind, name: LiteralName<'_>, value: &str, dst: &mut [u8]) -> Option<usize> {
        encode_literal_header_field(kind, name, value, self.use_huffman, dst)
    }

    /// Static index if given, else a dynamic entry with the same name.
    fn resolve_name<'a>(&self, static_index: Option<usize>, hash: u32, name: &'a str) -> LiteralName<'a> {
        static_index
            .or_else(|| self.find_name(hash, name))
            .map_or(LiteralName::New(name), LiteralName::Indexed)
    }

    fn get_entry(&self, hash: u32, name: &str, value: &str) -> Option<EntryId> {
        if self.current_size == 0 {
            return None;
        }
        let mut cursor = self.buckets[bucket_index(hash)];
        while let Some(id) = cursor {
            let entry = self.entries.get(id);
            // Values differ more often than names within a bucket.
            if entry.hash == hash && entry.value == value && entry.name == name {
                return Some(id);
            }
            cursor = entry.next;
        }
        None
    }

    /// Wire index of the newest live entry named `name`.
    fn find_name(&self, hash: u32, name: &str) -> Option<usize> {
        if self.current_size == 0 {
            return None;
        }
        let mut cursor = self.buckets[bucket_index(hash)];
        while let Some(id) = cursor {
            let entry = self.entries.get(id);
            if entry.hash == hash && entry.name == name {
                return Some(self.wire_index(id));
            }
            cursor = entry.next;
        }
        None
    }

    /// Index 1 past the static table is the newest dynamic entry.
    fn wire_index(&self, id: EntryId) -> usize {
        let age = self
            .entries
            .get(id)
            .table_index
            .wrapping_sub(self.entries.newest_table_index());
        age as usize + 1 + STATIC_TABLE_LEN
    }

    /// Evict oldest entries until `additional` more bytes fit.
    fn ensure_capacity(&mut self, additional: usize) -> Result<(), HpackError> {
        if additional > self.max_size {
            return Err(self.fault(HpackError::EntryTooLarge {
                size: additional,
                max: self.max_size,
            }));
        }
        while self.current_size + additional > self.max_size {
            let Some(oldest) = self.entries.oldest() else {
                return Err(self.fault(HpackError::SizeAccountingMismatch {
                    current_size: self.current_size,
                }));
            };
            self.evict(oldest)?;
        }
        Ok(())
    }

    fn evict(&mut self, id: EntryId) -> Result<(), HpackError> {
        let bucket = bucket_index(self.entries.get(id).hash);

        let mut prev: Option<EntryId> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(current) = cursor {
            let next = self.entries.get(current).next;
            if current == id {
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => self.entries.get_mut(p).next = next,
                }
                let entry = self.entries.get(id);
                trace!(name = %entry.name, size = entry.size, "evicting dynamic table entry");
                self.current_size -= entry.size;
                self.len -= 1;
                self.entries.remove(id);
                self.entries.release(id);
                return Ok(());
            }
            prev = cursor;
            cursor = next;
        }

        Err(self.fault(HpackError::MissingBucketEntry { bucket }))
    }

    fn add_entry(&mut self, hash: u32, name: &str, value: &str, size: usize) -> Result<(), HpackError> {
        if self.current_size + size > self.max_size {
            return Err(self.fault(HpackError::EntryTooLarge {
                size,
                max: self.max_size - self.current_size,
            }));
        }

        let bucket = bucket_index(hash);
        let table_index = self.entries.newest_table_index().wrapping_sub(1);
        let id = self.entries.allocate();
        self.entries
            .initialize(id, hash, name, value, size, table_index, self.buckets[bucket]);
        self.buckets[bucket] = Some(id);
        self.entries.add_before(id, HEAD);
        self.current_size += size;
        self.len += 1;

        trace!(name, size, current_size = self.current_size, "inserted dynamic table entry");
        Ok(())
    }

    fn check_poisoned(&self) -> Result<(), HpackError> {
        if self.poisoned {
            return Err(HpackError::Poisoned);
        }
        Ok(())
    }

    fn fault(&mut self, err: HpackError) -> HpackError {
        error!(error = %err, "HPACK dynamic table invariant violated");
        self.poisoned = true;
        err
    }
}

/// FNV-1a over the name bytes. Never sent on the wire.
fn hash_name(name: &str) -> u32 {
    name.bytes()
        .fold(0x811c_9dc5u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

fn bucket_index(hash: u32) -> usize {
    (hash & BUCKET_MASK) as usize
}
