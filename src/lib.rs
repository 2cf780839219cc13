//! h2-hpack-encoder: A sans-I/O HPACK dynamic table encoder
//!
//! This crate provides the sender side of HTTP/2 header compression (RFC 7541):
//! the stateful dynamic table that lets repeated header fields be sent as
//! one-byte references instead of literal strings.
//!
//! # Features
//!
//! - **Sans-I/O Design**: Writes into caller-supplied buffers, never blocks
//! - **Bounded Buffers**: A field that does not fit reports `Ok(None)` and leaves
//!   the table untouched, so the caller can flush and retry
//! - **Pooled Entries**: Evicted table entries are recycled, not reallocated
//! - **Indexing Policies**: Indexed, literal-without-indexing and never-indexed
//!   representations chosen per header
//! - **Table Size Updates**: Shrinks and regrowths are announced in the order the
//!   peer's decoder needs to mirror them
//!
//! # Quick Start
//!
//! ```rust
//! use h2_hpack_encoder::{H2Header, HpackEncoder};
//!
//! let mut encoder = HpackEncoder::new();
//!
//! let headers = vec![
//!     H2Header::new(":method", "GET"),
//!     H2Header::new("x-request-id", "abc-123"),
//! ];
//! let first = encoder.encode(&headers).unwrap();
//! let second = encoder.encode(&headers).unwrap();
//!
//! // The second block references the dynamic table entry added by the first
//! assert!(second.len() < first.len());
//! ```
//!
//! # Lower Level
//!
//! [`DynamicTableEncoder`] encodes one field at a time into a `&mut [u8]`,
//! taking the static table index and indexing policy from the caller:
//!
//! ```rust
//! use h2_hpack_encoder::{DynamicTableEncoder, HeaderEncodingHint};
//!
//! let mut table = DynamicTableEncoder::default();
//! let mut buf = [0u8; 64];
//!
//! let n = table
//!     .encode_header(&mut buf, None, HeaderEncodingHint::Index, "custom-key", "custom-value")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(buf[0], 0x40);
//! assert_eq!(table.current_size(), 54);
//!
//! let n = table
//!     .encode_header(&mut buf, None, HeaderEncodingHint::Index, "custom-key", "custom-value")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(&buf[..n], &[0xbe]);
//! ```
//!
//! # Architecture
//!
//! It does NOT provide:
//! - HPACK decoding (the peer's mirror table)
//! - HTTP/2 framing or transport (you provide the bytes to a frame writer)
//! - Header validation
//!
//! An encoder instance belongs to exactly one connection and must be driven
//! from one place at a time.

pub mod config;
pub mod encoder;
mod entry;
pub mod error;
pub mod hpack;
pub mod primitives;
pub mod static_table;

pub use config::{EncoderConfig, DEFAULT_HEADER_TABLE_SIZE};
pub use encoder::{header_size, DynamicTableEncoder, HeaderEncodingHint, ENTRY_OVERHEAD};
pub use error::HpackError;
pub use hpack::{settings_id, H2Header, HpackEncoder};
pub use static_table::STATIC_TABLE_LEN;
