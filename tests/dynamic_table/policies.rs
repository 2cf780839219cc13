//! Tests for per-header indexing policy selection

use h2_hpack_encoder::{header_size, DynamicTableEncoder, EncoderConfig, HeaderEncodingHint};

use super::{encode, encoder, pair, Mirror};

#[test]
fn test_never_index_repeated() {
    let mut enc = DynamicTableEncoder::default();
    let mut mirror = Mirror::new();

    for _ in 0..2 {
        let block = encode(&mut enc, None, HeaderEncodingHint::NeverIndex, "x-api-key", "hunter2");
        assert_eq!(block[0] & 0xf0, 0x10);
        assert_eq!(enc.current_size(), 0);
        assert_eq!(mirror.decode(&block), vec![pair("x-api-key", "hunter2")]);
    }
}

#[test]
fn test_never_index_with_static_name() {
    let mut enc = DynamicTableEncoder::default();
    let block = encode(&mut enc, Some(23), HeaderEncodingHint::NeverIndex, "authorization", "Basic Zm9v");
    assert_eq!(&block[..2], &[0x1f, 0x08]);
    assert!(enc.is_empty());
    assert_eq!(Mirror::new().decode(&block), vec![pair("authorization", "Basic Zm9v")]);
}

#[test]
fn test_never_index_does_not_reference_existing_entry() {
    let mut enc = DynamicTableEncoder::default();
    encode(&mut enc, None, HeaderEncodingHint::Index, "x-token", "abc");
    let block = encode(&mut enc, None, HeaderEncodingHint::NeverIndex, "x-token", "abc");
    assert_ne!(block[0] & 0x80, 0x80);
    assert_eq!(enc.len(), 1);
}

#[test]
fn test_ignore_index_leaves_table_alone() {
    let mut enc = DynamicTableEncoder::default();
    let mut mirror = Mirror::new();

    let mut block = encode(&mut enc, Some(28), HeaderEncodingHint::IgnoreIndex, "content-length", "1024");
    // 4-bit prefix saturates for index 28
    assert_eq!(&block[..2], &[0x0f, 0x0d]);
    block.extend(encode(&mut enc, None, HeaderEncodingHint::IgnoreIndex, "x-once", "1"));
    assert!(enc.is_empty());
    assert_eq!(
        mirror.decode(&block),
        vec![pair("content-length", "1024"), pair("x-once", "1")]
    );
}

#[test]
fn test_zero_table_every_policy_is_literal() {
    let mut enc = encoder(0);
    for hint in [
        HeaderEncodingHint::Index,
        HeaderEncodingHint::IgnoreIndex,
        HeaderEncodingHint::NeverIndex,
    ] {
        for _ in 0..2 {
            let block = encode(&mut enc, None, hint, "custom-key", "custom-value");
            assert_eq!(block[0] & 0x80, 0);
            assert_ne!(block[0] & 0xc0, 0x40);
            assert_eq!(enc.current_size(), 0);
        }
    }
}

#[test]
fn test_zero_table_index_policy_is_without_indexing() {
    let mut enc = encoder(0);
    let block = encode(&mut enc, None, HeaderEncodingHint::Index, "custom-key", "custom-value");
    assert_eq!(block[0], 0x00);
}

#[test]
fn test_disabled_compression_ignores_table() {
    let config = EncoderConfig::new().with_dynamic_compression(false);
    let mut enc = DynamicTableEncoder::new(&config);
    assert!(!enc.allows_dynamic_indexing());

    for _ in 0..3 {
        let block = encode(&mut enc, Some(31), HeaderEncodingHint::Index, "content-type", "text/html");
        assert_eq!(block[0], 0x0f);
    }
    assert!(enc.is_empty());
}

#[test]
fn test_boundary_size_is_inclusive() {
    let max = 128;
    let mut enc = encoder(max);
    let value = "v".repeat(max - 32 - "x-fit".len());
    assert_eq!(header_size("x-fit", &value), max);

    let block = encode(&mut enc, None, HeaderEncodingHint::Index, "x-fit", &value);
    assert_eq!(block[0], 0x40);
    assert_eq!(enc.current_size(), max);

    let over = "v".repeat(value.len() + 1);
    let block = encode(&mut enc, None, HeaderEncodingHint::Index, "x-new", &over);
    assert_eq!(block[0], 0x00);
    assert_eq!(enc.current_size(), max);
    assert_eq!(enc.len(), 1);
}

#[test]
fn test_oversized_keeps_existing_entries() {
    let mut enc = encoder(128);
    let mut mirror = Mirror::new();
    let mut block = Vec::new();

    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-small", "1"));
    let big = "b".repeat(200);
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-small", &big));
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-small", "1"));

    assert_eq!(*block.last().unwrap(), 0xbe);
    assert_eq!(enc.len(), 1);
    assert_eq!(
        mirror.decode(&block),
        vec![pair("x-small", "1"), pair("x-small", &big), pair("x-small", "1")]
    );
}

#[test]
fn test_buffer_too_small_then_retry() {
    let mut enc = DynamicTableEncoder::default();
    let mut small = [0u8; 8];
    let result = enc
        .encode_header(&mut small, None, HeaderEncodingHint::Index, "custom-key", "custom-value")
        .unwrap();
    assert_eq!(result, None);
    assert!(enc.is_empty());

    let block = encode(&mut enc, None, HeaderEncodingHint::Index, "custom-key", "custom-value");
    assert_eq!(enc.len(), 1);
    assert_eq!(Mirror::new().decode(&block), vec![pair("custom-key", "custom-value")]);
}
