//! Tests for dynamic table lookup and index numbering

use h2_hpack_encoder::{HeaderEncodingHint, DynamicTableEncoder, STATIC_TABLE_LEN};

use super::{encode, pair, size_update, Mirror};

#[test]
fn test_custom_header_scenario() {
    let mut enc = DynamicTableEncoder::default();
    let mut mirror = Mirror::new();

    // Header #1: literal with incremental indexing
    let first = encode(&mut enc, None, HeaderEncodingHint::Index, "custom-key", "custom-value");
    assert_eq!(first[0], 0x40);
    assert_eq!(enc.current_size(), "custom-key".len() + "custom-value".len() + 32);
    assert_eq!(mirror.decode(&first), vec![pair("custom-key", "custom-value")]);

    // Header #2: indexed reference to 1 + 61
    let second = encode(&mut enc, None, HeaderEncodingHint::Index, "custom-key", "custom-value");
    assert_eq!(second, vec![0x80 | (1 + STATIC_TABLE_LEN) as u8]);
    assert_eq!(mirror.decode(&second), vec![pair("custom-key", "custom-value")]);

    // Shrink to zero: table flushed, size update owed
    enc.update_max_table_size(0).unwrap();
    assert_eq!(enc.current_size(), 0);
    assert!(enc.has_pending_size_update());
    let mut block = size_update(&mut enc);
    assert_eq!(block, vec![0x20]);
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "custom-key", "custom-value"));
    assert_eq!(mirror.decode(&block), vec![pair("custom-key", "custom-value")]);
}

#[test]
fn test_repeat_is_indexed_until_evicted() {
    let mut enc = super::encoder(200);
    encode(&mut enc, None, HeaderEncodingHint::Index, "x-a", "1");
    assert_eq!(encode(&mut enc, None, HeaderEncodingHint::Index, "x-a", "1"), vec![0xbe]);

    // Fill past capacity so x-a is evicted
    for name in ["x-b", "x-c", "x-d", "x-e", "x-f"] {
        encode(&mut enc, None, HeaderEncodingHint::Index, name, "1");
    }
    assert!(enc.entries().all(|(name, _)| name != "x-a"));
    assert_eq!(encode(&mut enc, None, HeaderEncodingHint::Index, "x-a", "1")[0], 0x40);
}

#[test]
fn test_same_name_different_values() {
    let mut enc = DynamicTableEncoder::default();
    let mut mirror = Mirror::new();

    let mut block = Vec::new();
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-variant", "a"));
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-variant", "b"));
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-variant", "a"));
    block.extend(encode(&mut enc, None, HeaderEncodingHint::Index, "x-variant", "b"));

    // Second literal borrows the name of the first; last two are 0xbf (a) and 0xbe (b)
    assert_eq!(block[block.len() - 2..], [0xbf, 0xbe]);
    assert_eq!(enc.len(), 2);
    assert_eq!(
        mirror.decode(&block),
        vec![
            pair("x-variant", "a"),
            pair("x-variant", "b"),
            pair("x-variant", "a"),
            pair("x-variant", "b"),
        ]
    );
}

#[test]
fn test_duplicate_insert_after_name_only_match() {
    let mut enc = DynamicTableEncoder::default();
    encode(&mut enc, Some(31), HeaderEncodingHint::Index, "content-type", "text/html");
    encode(&mut enc, Some(31), HeaderEncodingHint::Index, "content-type", "application/json");
    assert_eq!(enc.len(), 2);
    assert_eq!(
        encode(&mut enc, Some(31), HeaderEncodingHint::Index, "content-type", "text/html"),
        vec![0xbf]
    );
}

#[test]
fn test_mirror_stays_in_sync_across_blocks() {
    let mut enc = super::encoder(256);
    let mut mirror = Mirror::new();

    let requests: Vec<Vec<(&str, &str)>> = vec![
        vec![(":authority", "www.example.com"), ("user-agent", "test/1.0"), ("x-session", "s1")],
        vec![(":authority", "www.example.com"), ("user-agent", "test/1.0"), ("x-session", "s2")],
        vec![(":authority", "api.example.com"), ("accept", "*/*"), ("x-session", "s3")],
        vec![(":authority", "www.example.com"), ("user-agent", "test/2.0"), ("x-session", "s1")],
    ];

    for request in requests {
        let mut block = Vec::new();
        for (name, value) in &request {
            let static_index = h2_hpack_encoder::static_table::find_name(name);
            block.extend(encode(&mut enc, static_index, HeaderEncodingHint::Index, name, value));
        }
        let expected: Vec<_> = request.iter().map(|(n, v)| pair(n, v)).collect();
        assert_eq!(mirror.decode(&block), expected);
        assert!(enc.current_size() <= 256);
    }
}
