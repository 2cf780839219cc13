//! Encoder configuration.

use serde::{Deserialize, Serialize};

/// Default HPACK dynamic table size (RFC 7540 SETTINGS_HEADER_TABLE_SIZE initial value).
pub const DEFAULT_HEADER_TABLE_SIZE: usize = 4096;

/// Settings for a [`DynamicTableEncoder`](crate::DynamicTableEncoder).
///
/// Deserializable so a host can embed it in its own config file; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Initial dynamic table size in bytes.
    pub header_table_size: usize,
    /// Largest table size accepted from the peer's SETTINGS.
    pub max_header_table_size: usize,
    /// When false the dynamic table is never used.
    pub allow_dynamic_compression: bool,
    /// Huffman-code string literals when that makes them shorter.
    pub use_huffman: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            max_header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            allow_dynamic_compression: true,
            use_huffman: false,
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_table_size(mut self, size: usize) -> Self {
        self.header_table_size = size;
        self
    }

    pub fn with_max_header_table_size(mut self, size: usize) -> Self {
        self.max_header_table_size = size;
        self
    }

    pub fn with_dynamic_compression(mut self, allow: bool) -> Self {
        self.allow_dynamic_compression = allow;
        self
    }

    pub fn with_huffman(mut self, use_huffman: bool) -> Self {
        self.use_huffman = use_huffman;
        self
    }
}
