//! Error types for the dynamic table encoder.
//!
//! Running out of output space is not an error: encoding calls report it as
//! `Ok(None)` so the caller can flush or grow its buffer and retry. The
//! variants here are faults after which the compression context can no
//! longer be trusted to match the peer's mirror table.

use thiserror::Error;

/// Faults raised by [`DynamicTableEncoder`](crate::DynamicTableEncoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HpackError {
    /// A header larger than the whole table reached the insertion path.
    #[error("dynamic table entry of {size} bytes exceeds table maximum of {max} bytes")]
    EntryTooLarge { size: usize, max: usize },

    /// Eviction found the oldest entry missing from its own hash bucket.
    #[error("oldest dynamic table entry is missing from hash bucket {bucket}")]
    MissingBucketEntry { bucket: usize },

    /// Eviction was needed but the table holds no entries.
    #[error("dynamic table accounts {current_size} bytes but holds no entries")]
    SizeAccountingMismatch { current_size: usize },

    /// A header was encoded while a table size update was still owed.
    #[error("dynamic table size update must be emitted before encoding headers")]
    PendingSizeUpdate,

    /// The encoder hit an earlier fault and refuses further work.
    #[error("HPACK encoder is poisoned by an earlier fault")]
    Poisoned,
}
