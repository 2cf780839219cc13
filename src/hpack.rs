//! HPACK: Header Compression for HTTP/2 (RFC 7541)
//!
//! Block-level encoder on top of [`DynamicTableEncoder`]: resolves the
//! static table and the per-header indexing policy, grows the output buffer
//! as needed, and applies the peer's SETTINGS_HEADER_TABLE_SIZE.

use tracing::debug;

use crate::config::EncoderConfig;
use crate::encoder::{DynamicTableEncoder, HeaderEncodingHint};
use crate::error::HpackError;
use crate::primitives::encode_indexed_header_field;
use crate::static_table;

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2) relevant to HPACK
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
}

/// Scratch space tried first for each header; doubled until the field fits.
const INITIAL_FIELD_ROOM: usize = 64;

/// An HTTP/2 header to encode
#[derive(Debug, Clone, PartialEq)]
pub struct H2Header {
    pub name: String,
    pub value: String,
}

impl H2Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl HeaderEncodingHint {
    /// Default policy for a (lowercase) header name.
    ///
    /// Credentials are never indexed. Values that change on nearly every
    /// message would only churn the table, so they skip it.
    pub fn for_header(name: &str) -> Self {
        match name {
            "authorization" | "proxy-authorization" | "cookie" | "set-cookie" => Self::NeverIndex,
            ":path" | "content-length" | "date" | "etag" | "last-modified" | "if-modified-since"
            | "if-none-match" => Self::IgnoreIndex,
            _ => Self::Index,
        }
    }
}

/// HPACK encoder for HTTP/2 header blocks.
/// Owns the connection's dynamic table state.
#[derive(Debug)]
pub struct HpackEncoder {
    table: DynamicTableEncoder,
    max_header_table_size: usize,
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        Self::with_config(EncoderConfig::default())
    }

    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            table: DynamicTableEncoder::new(&config),
            max_header_table_size: config.max_header_table_size,
        }
    }

    /// The underlying dynamic table encoder.
    pub fn table(&self) -> &DynamicTableEncoder {
        &self.table
    }

    /// Encode headers into a new HPACK header block.
    pub fn encode(&mut self, headers: &[H2Header]) -> Result<Vec<u8>, HpackError> {
        let mut block = Vec::new();
        self.encode_into(headers, &mut block)?;
        Ok(block)
    }

    /// Append an HPACK header block for `headers` to `dst`.
    ///
    /// A pending table size update is written first.
    pub fn encode_into(&mut self, headers: &[H2Header], dst: &mut Vec<u8>) -> Result<(), HpackError> {
        if self.table.is_poisoned() {
            return Err(HpackError::Poisoned);
        }
        self.append(dst, |table, buf| table.emit_pending_size_update(buf))?;
        for header in headers {
            self.encode_field(header, dst)?;
        }
        Ok(())
    }

    fn encode_field(&mut self, header: &H2Header, dst: &mut Vec<u8>) -> Result<(), HpackError> {
        let name = header.name.as_str();
        let value = header.value.as_str();
        let hint = HeaderEncodingHint::for_header(name);

        if hint != HeaderEncodingHint::NeverIndex {
            if let Some(index) = static_table::find(name, value) {
                return self.append(dst, |_, buf| Ok(encode_indexed_header_field(index, buf)));
            }
        }

        let static_index = static_table::find_name(name);
        self.append(dst, |table, buf| table.encode_header(buf, static_index, hint, name, value))
    }

    /// Run `write` against spare room at the end of `dst`, growing the room
    /// until it fits. A write that runs out of room changes no table state,
    /// so retrying it is safe.
    fn append<F>(&mut self, dst: &mut Vec<u8>, mut write: F) -> Result<(), HpackError>
    where
        F: FnMut(&mut DynamicTableEncoder, &mut [u8]) -> Result<Option<usize>, HpackError>,
    {
        let start = dst.len();
        let mut room = INITIAL_FIELD_ROOM;
        loop {
            dst.resize(start + room, 0);
            match write(&mut self.table, &mut dst[start..]) {
                Ok(Some(n)) => {
                    dst.truncate(start + n);
                    return Ok(());
                }
                Ok(None) => room = room.saturating_mul(2),
                Err(err) => {
                    dst.truncate(start);
                    return Err(err);
                }
            }
        }
    }

    /// Apply SETTINGS parameters received from the peer.
    ///
    /// Only SETTINGS_HEADER_TABLE_SIZE matters here; it is capped at the
    /// configured `max_header_table_size`.
    pub fn apply_settings(&mut self, settings: &[(u16, u32)]) -> Result<(), HpackError> {
        for &(id, value) in settings {
            if id != settings_id::HEADER_TABLE_SIZE {
                continue;
            }
            let size = (value as usize).min(self.max_header_table_size);
            debug!(peer = value, applied = size, "peer SETTINGS_HEADER_TABLE_SIZE");
            if size != self.table.max_table_size() {
                self.table.update_max_table_size(size)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
