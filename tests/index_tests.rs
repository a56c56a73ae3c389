//! The optional string-id -> file-offset index (C7, §4.6): baking onto a
//! committed archive, reading the patched header field, and reloading the
//! index bytes directly.

use docarc::doc::from_json::from_json;
use docarc::format::wire::Cursor;
use docarc::prelude::*;

#[test]
fn baking_patches_a_nonzero_index_offset() {
    let dict = StringDictionary::new();
    let docs = from_json(&serde_json::json!({"name": "ann", "city": "nyc", "country": "us"})).unwrap();
    preregister(&docs[0], &dict, 1).unwrap();
    let col = to_columndoc(&docs[0], &dict).unwrap();
    let registry = CodecRegistry::with_defaults();
    let mut written = write_archive(&col, &dict, &registry, &WriteOptions::default()).unwrap();

    bake_string_id_index(&mut written.bytes, written.index_offset_field_pos).unwrap();

    let mut c = Cursor::new(&written.bytes);
    c.pos = written.index_offset_field_pos;
    let index_offset = c.read_u64().unwrap() as usize;
    assert!(index_offset > 0);
    assert!(index_offset < written.bytes.len());

    let tree = print_archive(&written.bytes, &registry).unwrap();
    assert!(tree.has_string_id_index);
}

#[test]
fn every_interned_string_is_findable_after_baking() {
    let dict = StringDictionary::new();
    let docs = from_json(&serde_json::json!({
        "items": [{"sku": "a1"}, {"sku": "b2"}, {"sku": "c3"}],
    }))
    .unwrap();
    preregister(&docs[0], &dict, 1).unwrap();
    let col = to_columndoc(&docs[0], &dict).unwrap();
    let registry = CodecRegistry::with_defaults();
    let mut written = write_archive(&col, &dict, &registry, &WriteOptions::default()).unwrap();

    bake_string_id_index(&mut written.bytes, written.index_offset_field_pos).unwrap();

    let mut c = Cursor::new(&written.bytes);
    c.pos = written.index_offset_field_pos;
    let index_offset = c.read_u64().unwrap() as usize;
    let table = deserialize_index(&written.bytes[index_offset..]).unwrap();

    for (id, _s) in dict.get_contents() {
        assert!(table.get(id).is_some());
    }
}

#[test]
fn robin_hood_table_survives_growth_and_removal() {
    let mut table = RobinHoodTable::with_capacity(4);
    for i in 0..50u64 {
        table.insert_or_update(i, i * 3);
    }
    assert_eq!(table.len(), 50);
    for i in 0..50u64 {
        assert_eq!(table.get(i), Some(i * 3));
    }

    for i in (0..50u64).step_by(2) {
        assert!(table.remove_if_contained(i));
    }
    assert_eq!(table.len(), 25);
    for i in 0..50u64 {
        if i % 2 == 0 {
            assert!(table.get(i).is_none());
        } else {
            assert_eq!(table.get(i), Some(i * 3));
        }
    }
}
