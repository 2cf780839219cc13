//! HPACK wire primitives (RFC 7541 Section 5 and 6).
//!
//! Every function here writes into a caller-supplied slice and returns the
//! number of bytes written, or `None` if the slice is too small. A `None`
//! result may leave a partially written prefix behind; callers treat it as
//! uncommitted.

/// How a literal header field interacts with the dynamic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `01xxxxxx`: the receiver adds the field to its dynamic table.
    IncrementalIndexing,
    /// `0000xxxx`: the receiver leaves its dynamic table alone.
    WithoutIndexing,
    /// `0001xxxx`: like `WithoutIndexing`, and intermediaries must not index it either.
    NeverIndexed,
}

impl LiteralKind {
    fn prefix(self) -> (u8, u8) {
        match self {
            LiteralKind::IncrementalIndexing => (6, 0x40),
            LiteralKind::WithoutIndexing => (4, 0x00),
            LiteralKind::NeverIndexed => (4, 0x10),
        }
    }
}

/// Name half of a literal header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralName<'a> {
    /// Name taken from a static or dynamic table index.
    Indexed(usize),
    /// Name sent as a string literal.
    New(&'a str),
}

/// Encode `value` as an HPACK integer with an N-bit prefix.
///
/// `first_byte` carries the instruction bits above the prefix.
///
/// ```text
/// if I < 2^N - 1, encode I on N bits
/// else
///     encode (2^N - 1) on N bits
///     I = I - (2^N - 1)
///     while I >= 128
///          encode (I % 128 + 128) on 8 bits
///          I = I / 128
///     encode I on 8 bits
/// ```
pub fn encode_integer(value: usize, prefix_bits: u8, first_byte: u8, dst: &mut [u8]) -> Option<usize> {
    debug_assert!((1..=8).contains(&prefix_bits));
    let max_prefix = (1usize << prefix_bits) - 1;

    let first = dst.first_mut()?;
    if value < max_prefix {
        *first = first_byte | value as u8;
        return Some(1);
    }
    *first = first_byte | max_prefix as u8;

    let mut remaining = value - max_prefix;
    let mut pos = 1;
    while remaining >= 128 {
        *dst.get_mut(pos)? = (remaining & 0x7f) as u8 | 0x80;
        remaining >>= 7;
        pos += 1;
    }
    *dst.get_mut(pos)? = remaining as u8;
    Some(pos + 1)
}

/// Encode a string literal, Huffman-coded when enabled and strictly shorter.
pub fn encode_string_literal(value: &[u8], use_huffman: bool, dst: &mut [u8]) -> Option<usize> {
    if use_huffman {
        let encoded_len = huffman_encoded_len(value);
        if encoded_len < value.len() {
            // H bit set
            let n = encode_integer(encoded_len, 7, 0x80, dst)?;
            let written = huffman_encode_into(value, dst.get_mut(n..)?)?;
            return Some(n + written);
        }
    }

    let n = encode_integer(value.len(), 7, 0x00, dst)?;
    let end = n.checked_add(value.len())?;
    dst.get_mut(n..end)?.copy_from_slice(value);
    Some(end)
}

/// Indexed header field: `1xxxxxxx`.
pub fn encode_indexed_header_field(index: usize, dst: &mut [u8]) -> Option<usize> {
    encode_integer(index, 7, 0x80, dst)
}

/// Literal header field of the given kind.
pub fn encode_literal_header_field(
    kind: LiteralKind,
    name: LiteralName<'_>,
    value: &str,
    use_huffman: bool,
    dst: &mut [u8],
) -> Option<usize> {
    let (prefix_bits, pattern) = kind.prefix();
    let mut n = match name {
        LiteralName::Indexed(index) => encode_integer(index, prefix_bits, pattern, dst)?,
        LiteralName::New(name) => {
            *dst.first_mut()? = pattern;
            1 + encode_string_literal(name.as_bytes(), use_huffman, dst.get_mut(1..)?)?
        }
    };
    n += encode_string_literal(value.as_bytes(), use_huffman, dst.get_mut(n..)?)?;
    Some(n)
}

/// Dynamic table size update: `001xxxxx`.
pub fn encode_dynamic_table_size_update(size: usize, dst: &mut [u8]) -> Option<usize> {
    encode_integer(size, 5, 0x20, dst)
}

/// Length in bytes of the Huffman encoding of `src`, padding included.
pub fn huffman_encoded_len(src: &[u8]) -> usize {
    let bits: usize = src
        .iter()
        .map(|&b| HUFFMAN_CODES[b as usize].1 as usize)
        .sum();
    (bits + 7) / 8
}

/// Huffman-encode `src` into `dst`, padding the last byte with the EOS prefix.
pub fn huffman_encode_into(src: &[u8], dst: &mut [u8]) -> Option<usize> {
    let mut accumulator: u64 = 0;
    let mut bits: u32 = 0;
    let mut pos = 0;

    for &byte in src {
        let (code, code_bits) = HUFFMAN_CODES[byte as usize];
        accumulator = (accumulator << code_bits) | u64::from(code);
        bits += u32::from(code_bits);

        while bits >= 8 {
            bits -= 8;
            *dst.get_mut(pos)? = (accumulator >> bits) as u8;
            pos += 1;
            accumulator &= (1u64 << bits) - 1;
        }
    }

    if bits > 0 {
        let padding = 8 - bits;
        accumulator = (accumulator << padding) | ((1u64 << padding) - 1);
        *dst.get_mut(pos)? = accumulator as u8;
        pos += 1;
    }

    Some(pos)
}

/// RFC 7541 Appendix B codes as `(code, bit length)`, indexed by octet.
static HUFFMAN_CODES: [(u32, u8); 256] = [
    // 0-31
    (0x1ff8, 13), (0x7fffd8, 23), (0xfffffe2, 28), (0xfffffe3, 28),
    (0xfffffe4, 28), (0xfffffe5, 28), (0xfffffe6, 28), (0xfffffe7, 28),
    (0xfffffe8, 28), (0xffffea, 24), (0x3ffffffc, 30), (0xfffffe9, 28),
    (0xfffffea, 28), (0x3ffffffd, 30), (0xfffffeb, 28), (0xfffffec, 28),
    (0xfffffed, 28), (0xfffffee, 28), (0xfffffef, 28), (0xffffff0, 28),
    (0xffffff1, 28), (0xffffff2, 28), (0x3ffffffe, 30), (0xffffff3, 28),
    (0xffffff4, 28), (0xffffff5, 28), (0xffffff6, 28), (0xffffff7, 28),
    (0xffffff8, 28), (0xffffff9, 28), (0xffffffa, 28), (0xffffffb, 28),
    // 32-63
    (0x14, 6), (0x3f8, 10), (0x3f9, 10), (0xffa, 12),
    (0x1ff9, 13), (0x15, 6), (0xf8, 8), (0x7fa, 11),
    (0x3fa, 10), (0x3fb, 10), (0xf9, 8), (0x7fb, 11),
    (0xfa, 8), (0x16, 6), (0x17, 6), (0x18, 6),
    (0x0, 5), (0x1, 5), (0x2, 5), (0x19, 6),
    (0x1a, 6), (0x1b, 6), (0x1c, 6), (0x1d, 6),
    (0x1e, 6), (0x1f, 6), (0x5c, 7), (0xfb, 8),
    (0x7ffc, 15), (0x20, 6), (0xffb, 12), (0x3fc, 10),
    // 64-95
    (0x1ffa, 13), (0x21, 6), (0x5d, 7), (0x5e, 7),
    (0x5f, 7), (0x60, 7), (0x61, 7), (0x62, 7),
    (0x63, 7), (0x64, 7), (0x65, 7), (0x66, 7),
    (0x67, 7), (0x68, 7), (0x69, 7), (0x6a, 7),
    (0x6b, 7), (0x6c, 7), (0x6d, 7), (0x6e, 7),
    (0x6f, 7), (0x70, 7), (0x71, 7), (0x72, 7),
    (0xfc, 8), (0x73, 7), (0xfd, 8), (0x1ffb, 13),
    (0x7fff0, 19), (0x1ffc, 13), (0x3ffc, 14), (0x22, 6),
    // 96-127
    (0x7ffd, 15), (0x3, 5), (0x23, 6), (0x4, 5),
    (0x24, 6), (0x5, 5), (0x25, 6), (0x26, 6),
    (0x27, 6), (0x6, 5), (0x74, 7), (0x75, 7),
    (0x28, 6), (0x29, 6), (0x2a, 6), (0x7, 5),
    (0x2b, 6), (0x76, 7), (0x2c, 6), (0x8, 5),
    (0x9, 5), (0x2d, 6), (0x77, 7), (0x78, 7),
    (0x79, 7), (0x7a, 7), (0x7b, 7), (0x7ffe, 15),
    (0x7fc, 11), (0x3ffd, 14), (0x1ffd, 13), (0xffffffc, 28),
    // 128-159
    (0xfffe6, 20), (0x3fffd2, 22), (0xfffe7, 20), (0xfffe8, 20),
    (0x3fffd3, 22), (0x3fffd4, 22), (0x3fffd5, 22), (0x7fffd9, 23),
    (0x3fffd6, 22), (0x7fffda, 23), (0x7fffdb, 23), (0x7fffdc, 23),
    (0x7fffdd, 23), (0x7fffde, 23), (0xffffeb, 24), (0x7fffdf, 23),
    (0xffffec, 24), (0xffffed, 24), (0x3fffd7, 22), (0x7fffe0, 23),
    (0xffffee, 24), (0x7fffe1, 23), (0x7fffe2, 23), (0x7fffe3, 23),
    (0x7fffe4, 23), (0x1fffdc, 21), (0x3fffd8, 22), (0x7fffe5, 23),
    (0x3fffd9, 22), (0x7fffe6, 23), (0x7fffe7, 23), (0xffffef, 24),
    // 160-191
    (0x3fffda, 22), (0x1fffdd, 21), (0xfffe9, 20), (0x3fffdb, 22),
    (0x3fffdc, 22), (0x7fffe8, 23), (0x7fffe9, 23), (0x1fffde, 21),
    (0x7fffea, 23), (0x3fffdd, 22), (0x3fffde, 22), (0xfffff0, 24),
    (0x1fffdf, 21), (0x3fffdf, 22), (0x7fffeb, 23), (0x7fffec, 23),
    (0x1fffe0, 21), (0x1fffe1, 21), (0x3fffe0, 22), (0x1fffe2, 21),
    (0x7fffed, 23), (0x3fffe1, 22), (0x7fffee, 23), (0x7fffef, 23),
    (0xfffea, 20), (0x3fffe2, 22), (0x3fffe3, 22), (0x3fffe4, 22),
    (0x7ffff0, 23), (0x3fffe5, 22), (0x3fffe6, 22), (0x7ffff1, 23),
    // 192-223
    (0x3ffffe0, 26), (0x3ffffe1, 26), (0xfffeb, 20), (0x7fff1, 19),
    (0x3fffe7, 22), (0x7ffff2, 23), (0x3fffe8, 22), (0x1ffffec, 25),
    (0x3ffffe2, 26), (0x3ffffe3, 26), (0x3ffffe4, 26), (0x7ffffde, 27),
    (0x7ffffdf, 27), (0x3ffffe5, 26), (0xfffff1, 24), (0x1ffffed, 25),
    (0x7fff2, 19), (0x1fffe3, 21), (0x3ffffe6, 26), (0x7ffffe0, 27),
    (0x7ffffe1, 27), (0x3ffffe7, 26), (0x7ffffe2, 27), (0xfffff2, 24),
    (0x1fffe4, 21), (0x1fffe5, 21), (0x3ffffe8, 26), (0x3ffffe9, 26),
    (0xffffffd, 28), (0x7ffffe3, 27), (0x7ffffe4, 27), (0x7ffffe5, 27),
    // 224-255
    (0xfffec, 20), (0xfffff3, 24), (0xfffed, 20), (0x1fffe6, 21),
    (0x3fffe9, 22), (0x1fffe7, 21), (0x1fffe8, 21), (0x7ffff3, 23),
    (0x3fffea, 22), (0x3fffeb, 22), (0x1ffffee, 25), (0x1ffffef, 25),
    (0xfffff4, 24), (0xfffff5, 24), (0x3ffffea, 26), (0x7ffff4, 23),
    (0x3ffffeb, 26), (0x7ffffe6, 27), (0x3ffffec, 26), (0x3ffffed, 26),
    (0x7ffffe7, 27), (0x7ffffe8, 27), (0x7ffffe9, 27), (0x7ffffea, 27),
    (0x7ffffeb, 27), (0xffffffe, 28), (0x7ffffec, 27), (0x7ffffed, 27),
    (0x7ffffee, 27), (0x7ffffef, 27), (0x7fffff0, 27), (0x3ffffee, 26),
];
