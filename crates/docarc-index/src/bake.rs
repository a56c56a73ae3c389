//! Bakes a string-id -> file-offset index onto an already-written archive
//! (§4.6, C7): scans the committed bytes for every string-id occurrence,
//! builds a robin-hood table over the results, appends its serialized form
//! to the archive, and patches the offset back into the `ArchiveHeader`.

use docarc_core::marker::Marker;
use docarc_format::wire::{patch_u64, push_f32, push_u32, push_u64, push_u8, Cursor};

use crate::error::Result;
use crate::hashtable::RobinHoodTable;
use crate::scan::collect_string_offsets;

/// Grow factor recorded in the on-disk header for a reader that wants to
/// rehash in place; this implementation always doubles (see
/// `RobinHoodTable::insert_or_update`), so the field is a constant.
const GROW_FACTOR: f32 = 2.0;
const KEY_SIZE: u8 = 8;
const VALUE_SIZE: u8 = 8;

/// Scans `archive` for string-id occurrences, builds the index, appends it,
/// and patches `ArchiveHeader.string_id_to_offset_index_offset` (whose byte
/// position the caller gets back from `docarc_format::writer::write_archive`
/// as `WrittenArchive::index_offset_field_pos`).
pub fn bake_string_id_index(archive: &mut Vec<u8>, index_offset_field_pos: usize) -> Result<()> {
    let pairs = collect_string_offsets(archive)?;
    let mut table = RobinHoodTable::with_capacity((pairs.len() * 2).max(8));
    for (id, offset) in &pairs {
        table.insert_or_update(*id, *offset);
    }
    tracing::debug!(
        n_entries = pairs.len(),
        capacity = table.capacity(),
        avg_displacement = table.average_displacement(),
        "baked string-id index"
    );

    let index_offset = archive.len() as u64;
    archive.extend_from_slice(&serialize_index(&table));
    patch_u64(archive, index_offset_field_pos, index_offset);
    Ok(())
}

fn serialize_index(table: &RobinHoodTable) -> Vec<u8> {
    let mut buf = Vec::new();
    push_u8(&mut buf, Marker::VectorHeader.as_byte());
    push_u32(&mut buf, table.capacity() as u32);
    push_u32(&mut buf, table.len() as u32);
    push_u8(&mut buf, KEY_SIZE);
    push_u8(&mut buf, VALUE_SIZE);
    push_f32(&mut buf, GROW_FACTOR);
    for (in_use, displacement, key, value) in table.raw_buckets() {
        push_u8(&mut buf, in_use as u8);
        push_u32(&mut buf, displacement);
        push_u32(&mut buf, 0); // num_probes: diagnostic only, not needed to reload the table
        push_u64(&mut buf, key);
        push_u64(&mut buf, value);
    }
    buf
}

/// Reloads a baked index from its serialized bytes (e.g. read back from the
/// tail of an archive at `index_offset`), for a reader that wants direct
/// `string_id -> file_offset` lookups instead of walking the whole file.
pub fn deserialize_index(bytes: &[u8]) -> Result<RobinHoodTable> {
    let mut c = Cursor::new(bytes);
    c.expect_marker(Marker::VectorHeader).map_err(crate::error::Error::Format)?;
    let capacity = c.read_u32().map_err(crate::error::Error::Format)? as usize;
    let num_elems = c.read_u32().map_err(crate::error::Error::Format)? as usize;
    let _key_size = c.read_u8().map_err(crate::error::Error::Format)?;
    let _value_size = c.read_u8().map_err(crate::error::Error::Format)?;
    let _grow_factor = c.read_f32().map_err(crate::error::Error::Format)?;

    let mut buckets = Vec::with_capacity(capacity);
    for _ in 0..capacity {
        let in_use = c.read_u8().map_err(crate::error::Error::Format)? != 0;
        let displacement = c.read_u32().map_err(crate::error::Error::Format)?;
        let _num_probes = c.read_u32().map_err(crate::error::Error::Format)?;
        let key = c.read_u64().map_err(crate::error::Error::Format)?;
        let value = c.read_u64().map_err(crate::error::Error::Format)?;
        buckets.push((in_use, displacement, key, value));
    }

    let mut table = RobinHoodTable::with_capacity(capacity.max(1));
    table.restore_raw(buckets, num_elems);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docarc_columnar::transform::{preregister, to_columndoc};
    use docarc_dict::StringDictionary;
    use docarc_doc::from_json::from_json;
    use docarc_format::codec::CodecRegistry;
    use docarc_format::writer::{write_archive, WriteOptions};

    #[test]
    fn bake_then_lookup_finds_every_key() {
        let dict = StringDictionary::new();
        let docs = from_json(&serde_json::json!({"name": "ann", "city": "nyc", "age": 30})).unwrap();
        preregister(&docs[0], &dict, 1).unwrap();
        let col = to_columndoc(&docs[0], &dict).unwrap();
        let registry = CodecRegistry::with_defaults();
        let mut written = write_archive(&col, &dict, &registry, &WriteOptions::default()).unwrap();

        bake_string_id_index(&mut written.bytes, written.index_offset_field_pos).unwrap();

        let index_offset = {
            let mut c = Cursor::new(&written.bytes);
            c.pos = written.index_offset_field_pos;
            c.read_u64().unwrap() as usize
        };
        assert!(index_offset > 0);
        let table = deserialize_index(&written.bytes[index_offset..]).unwrap();

        for (id, _) in dict.get_contents() {
            assert!(table.get(id).is_some(), "string id {id} missing from baked index");
        }
    }

    #[test]
    fn serialize_deserialize_round_trips() {
        let mut table = RobinHoodTable::with_capacity(4);
        for i in 0..30u64 {
            table.insert_or_update(i, i * 7);
        }
        let bytes = serialize_index(&table);
        let restored = deserialize_index(&bytes).unwrap();
        assert_eq!(restored.len(), table.len());
        for i in 0..30u64 {
            assert_eq!(restored.get(i), Some(i * 7));
        }
    }
}
