//! The schema-less archive printer (§4.5.1), exercised against archives
//! built through the full pipeline rather than hand-crafted bytes.

use docarc::doc::from_json::from_json;
use docarc::format::error::Error as FormatError;
use docarc::prelude::*;

fn build(json: serde_json::Value) -> Vec<u8> {
    let dict = StringDictionary::new();
    let docs = from_json(&json).unwrap();
    let doc = &docs[0];
    preregister(doc, &dict, 1).unwrap();
    let col = to_columndoc(doc, &dict).unwrap();
    let registry = CodecRegistry::with_defaults();
    write_archive(&col, &dict, &registry, &WriteOptions::default()).unwrap().bytes
}

#[test]
fn empty_object_has_no_properties_and_zero_flags() {
    let bytes = build(serde_json::json!({}));
    let registry = CodecRegistry::with_defaults();
    let tree = print_archive(&bytes, &registry).unwrap();
    assert!(tree.root.properties.is_empty());
}

#[test]
fn huffman_codec_round_trips_the_string_table() {
    let dict = StringDictionary::new();
    let docs = from_json(&serde_json::json!({"name": "ann", "city": "nyc", "greeting": "hello world"})).unwrap();
    preregister(&docs[0], &dict, 1).unwrap();
    let col = to_columndoc(&docs[0], &dict).unwrap();
    let registry = CodecRegistry::with_defaults();
    let written = write_archive(
        &col,
        &dict,
        &registry,
        &WriteOptions { codec_flag_bit: HUFFMAN_FLAG_BIT },
    )
    .unwrap();

    let tree = print_archive(&written.bytes, &registry).unwrap();
    let greeting = tree.root.properties.iter().find(|p| p.key == "greeting").unwrap();
    match &greeting.value {
        DebugValue::Scalar { value: docarc::format::printer::DebugScalar::StringId { value, .. } } => {
            assert_eq!(value.as_deref(), Some("hello world"));
        }
        other => panic!("expected string scalar, got {other:?}"),
    }
}

#[test]
fn bad_magic_is_rejected() {
    let registry = CodecRegistry::with_defaults();
    let err = print_archive(b"NOTANARCHIVEBYTES.......", &registry).unwrap_err();
    assert!(matches!(err, FormatError::NoArchiveFile));
}

#[test]
fn truncated_archive_reports_corrupted_rather_than_panicking() {
    let bytes = build(serde_json::json!({"name": "ann"}));
    let registry = CodecRegistry::with_defaults();
    // Chop off everything past the archive header and string table header.
    let truncated = &bytes[..24];
    assert!(print_archive(truncated, &registry).is_err());
}

#[test]
fn nested_object_array_columns_preserve_array_positions() {
    let bytes = build(serde_json::json!({
        "items": [{"sku": "a1", "qty": 2}, {"sku": "b2", "qty": 5}, {"sku": "c3", "qty": 7}],
    }));
    let registry = CodecRegistry::with_defaults();
    let tree = print_archive(&bytes, &registry).unwrap();
    let items = tree.root.properties.iter().find(|p| p.key == "items").unwrap();
    match &items.value {
        DebugValue::ObjectArray { columns } => {
            let qty = columns.iter().find(|c| c.nested_key == "qty").unwrap();
            let positions: Vec<u32> = qty.entries.iter().map(|e| e.array_position).collect();
            assert_eq!(positions, vec![0, 1, 2]);
        }
        other => panic!("expected object array, got {other:?}"),
    }
}
