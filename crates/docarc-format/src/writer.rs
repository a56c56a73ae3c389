//! The marker-tagged binary record serializer (§4.5, C6).

use byteorder::ByteOrder;
use docarc_columnar::columndoc::{ColumnDoc, ColumnEntry, ObjectArrayColumn, ObjectArrayGroup, ScalarColumn, ArrayColumn, WireScalar};
use docarc_core::marker::Marker;
use docarc_core::oid::ObjectIdGenerator;
use docarc_core::value::ValueType;
use docarc_core::{ARCHIVE_MAGIC, FORMAT_VERSION};
use docarc_dict::Dictionary;

use crate::codec::{CodecRegistry, StringCodec};
use crate::error::Result;
use crate::wire::{patch_u64, push_f32, push_u32, push_u64, push_u8};

/// Which string codec to use and whether to bake the optional string-id
/// index, configured by the caller (the CLI's `build` subcommand, §6.2).
pub struct WriteOptions {
    pub codec_flag_bit: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { codec_flag_bit: crate::codec::PLAIN_FLAG_BIT }
    }
}

/// A freshly written archive, plus the byte position of the
/// `string_id_to_offset_index_offset` field in `bytes`, so a caller that
/// bakes the optional string-id index (C7) after the fact knows exactly
/// where to patch in its offset once it has one.
pub struct WrittenArchive {
    pub bytes: Vec<u8>,
    pub index_offset_field_pos: usize,
}

/// Serializes one `ColumnDoc` (the root object of a record) into a
/// complete archive byte stream: `[ArchiveHeader][StringTable]
/// [RecordHeader][RootObject]`. The string-id index (C7), if requested,
/// is appended by the caller via `docarc_index` after this returns, which
/// then patches `string_id_to_offset_index_offset` in place (see
/// `docarc-cli`'s `build` command).
pub fn write_archive(root: &ColumnDoc, dict: &dyn Dictionary, registry: &CodecRegistry, opts: &WriteOptions) -> Result<WrittenArchive> {
    tracing::debug!(codec_flag_bit = opts.codec_flag_bit, n_strings = dict.num_distinct(), "serializing archive");
    let oid_gen = ObjectIdGenerator::new();
    let object_bytes = serialize_object(root, &oid_gen)?;

    let mut buf = Vec::new();
    // ArchiveHeader, with the two offsets patched once we know them.
    buf.extend_from_slice(&ARCHIVE_MAGIC);
    push_u32(&mut buf, FORMAT_VERSION);
    let root_offset_pos = buf.len();
    push_u64(&mut buf, 0);
    let index_offset_field_pos = buf.len();
    push_u64(&mut buf, 0);

    write_string_table(&mut buf, dict, registry, opts)?;

    push_u8(&mut buf, Marker::RecordHeader.as_byte());
    push_u32(&mut buf, 0); // flags, unused beyond the codec-table flags already in StringTable
    push_u64(&mut buf, object_bytes.len() as u64);

    let root_offset = buf.len() as u64;
    buf.extend_from_slice(&object_bytes);

    patch_u64(&mut buf, root_offset_pos, root_offset);
    Ok(WrittenArchive { bytes: buf, index_offset_field_pos })
}

fn write_string_table(buf: &mut Vec<u8>, dict: &dyn Dictionary, registry: &CodecRegistry, opts: &WriteOptions) -> Result<()> {
    let codec = registry.get(opts.codec_flag_bit)?;
    let contents = dict.get_contents(); // (id, string), stable per dictionary implementation
    let strs: Vec<&str> = contents.iter().map(|(_, s)| s.as_str()).collect();
    let state = codec.build(&strs);
    let extra = state.write_extra();

    push_u8(buf, Marker::StrtabHeader.as_byte());
    push_u32(buf, codec.flag_bit());
    push_u32(buf, contents.len() as u32);
    let first_entry_offset_pos = buf.len();
    push_u64(buf, 0);
    push_u64(buf, extra.len() as u64);
    buf.extend_from_slice(&extra);

    let first_entry_offset = buf.len() as u64;
    patch_u64(buf, first_entry_offset_pos, first_entry_offset);

    for (id, s) in &contents {
        let encoded = state.encode(s);
        push_u8(buf, Marker::StrtabEntry.as_byte());
        let next_offset_pos = buf.len();
        push_u64(buf, 0);
        push_u64(buf, *id);
        push_u32(buf, s.len() as u32);
        buf.extend_from_slice(&encoded);
        let next_offset = buf.len() as u64;
        patch_u64(buf, next_offset_pos, next_offset);
    }
    Ok(())
}

/// A property block's bytes plus the byte-positions (within those bytes)
/// of any `u64` fields that are currently relative to the *block's own
/// start* and must become relative to the enclosing object header once
/// the block's position within that object is known (§4.5's "offsets are
/// relative to the enclosing object header").
struct Block {
    bytes: Vec<u8>,
    local_patches: Vec<usize>,
}

fn serialize_object(doc: &ColumnDoc, oid_gen: &ObjectIdGenerator) -> Result<Vec<u8>> {
    let oid = oid_gen.next()?;

    let mut flag_blocks: Vec<(usize, Block)> = Vec::new();
    for (i, t) in ValueType::ALL.into_iter().enumerate() {
        if scalar_present(doc, t) {
            let block = build_scalar_property_block(doc, t, oid_gen)?;
            flag_blocks.push((2 * i, block));
        }
        if array_present(doc, t) {
            let block = build_array_property_block(doc, t, oid_gen)?;
            flag_blocks.push((2 * i + 1, block));
        }
    }
    flag_blocks.sort_by_key(|(bit, _)| *bit);

    let n_set = flag_blocks.len();
    let header_len = 1 + 8 + 4 + (n_set as u64) * 8 + 8; // marker + oid + flags + offsets + next_or_nil

    let mut flags: u32 = 0;
    for (bit, _) in &flag_blocks {
        flags |= 1 << bit;
    }

    let mut offsets_table: Vec<u64> = Vec::with_capacity(n_set);
    let mut tail: Vec<u8> = Vec::new();
    let mut running = header_len;
    for (_, mut block) in flag_blocks {
        let base = running;
        for &p in &block.local_patches {
            patch_u64(&mut block.bytes, p, base);
        }
        offsets_table.push(base);
        running += block.bytes.len() as u64;
        tail.extend_from_slice(&block.bytes);
    }

    let mut buf = Vec::with_capacity(header_len as usize + tail.len() + 1);
    push_u8(&mut buf, Marker::ObjectBegin.as_byte());
    push_u64(&mut buf, oid);
    push_u32(&mut buf, flags);
    for off in &offsets_table {
        push_u64(&mut buf, *off);
    }
    push_u64(&mut buf, 0); // next_object_or_nil: this implementation does not chain sibling revisions.
    buf.extend_from_slice(&tail);
    push_u8(&mut buf, Marker::ObjectEnd.as_byte());
    Ok(buf)
}

fn scalar_present(doc: &ColumnDoc, t: ValueType) -> bool {
    match t {
        ValueType::Null => !doc.null_keys.is_empty(),
        ValueType::Object => !doc.objects.is_empty(),
        _ => doc.scalars.contains_key(&t),
    }
}

fn array_present(doc: &ColumnDoc, t: ValueType) -> bool {
    match t {
        ValueType::Object => !doc.object_arrays.is_empty(),
        _ => doc.arrays.contains_key(&t),
    }
}

fn empty_scalar_column() -> ScalarColumn {
    ScalarColumn::default()
}

fn empty_array_column() -> ArrayColumn {
    ArrayColumn::default()
}

fn build_scalar_property_block(doc: &ColumnDoc, t: ValueType, oid_gen: &ObjectIdGenerator) -> Result<Block> {
    match t {
        ValueType::Null => Ok(build_null_scalar_block(&doc.null_keys)),
        ValueType::Object => build_object_scalar_block(&doc.objects, oid_gen),
        _ => {
            let default = empty_scalar_column();
            let col = doc.scalars.get(&t).unwrap_or(&default);
            Ok(build_fixed_scalar_block(t, col))
        }
    }
}

fn build_array_property_block(doc: &ColumnDoc, t: ValueType, oid_gen: &ObjectIdGenerator) -> Result<Block> {
    match t {
        ValueType::Object => build_object_array_block(&doc.object_arrays, oid_gen),
        ValueType::Null => {
            let default = empty_array_column();
            let col = doc.arrays.get(&ValueType::Null).unwrap_or(&default);
            Ok(build_null_array_block(col))
        }
        _ => {
            let default = empty_array_column();
            let col = doc.arrays.get(&t).unwrap_or(&default);
            Ok(build_fixed_array_block(t, col))
        }
    }
}

fn write_wire_scalar(buf: &mut Vec<u8>, v: &WireScalar) {
    match v {
        WireScalar::Bool(b) => push_u8(buf, *b),
        WireScalar::I8(v) => push_u8(buf, *v as u8),
        WireScalar::I16(v) => {
            let mut tmp = [0u8; 2];
            byteorder::LittleEndian::write_i16(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        WireScalar::I32(v) => {
            let mut tmp = [0u8; 4];
            byteorder::LittleEndian::write_i32(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        WireScalar::I64(v) => {
            let mut tmp = [0u8; 8];
            byteorder::LittleEndian::write_i64(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        WireScalar::U8(v) => push_u8(buf, *v),
        WireScalar::U16(v) => {
            let mut tmp = [0u8; 2];
            byteorder::LittleEndian::write_u16(&mut tmp, *v);
            buf.extend_from_slice(&tmp);
        }
        WireScalar::U32(v) => push_u32(buf, *v),
        WireScalar::U64(v) => push_u64(buf, *v),
        WireScalar::F32(v) => push_f32(buf, *v),
        WireScalar::StringId(id) => push_u64(buf, *id),
    }
}

/// `PROP_NULL` has no scalar payload: just `(marker, count)[key_id]×N`.
fn build_null_scalar_block(null_keys: &[u64]) -> Block {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::PropNull.as_byte());
    push_u32(&mut bytes, null_keys.len() as u32);
    for k in null_keys {
        push_u64(&mut bytes, *k);
    }
    Block { bytes, local_patches: Vec::new() }
}

/// Fixed-length primitive block: `(marker, count)[key_id]×N[value:t]×N`.
fn build_fixed_scalar_block(t: ValueType, col: &ScalarColumn) -> Block {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::for_scalar(t).as_byte());
    push_u32(&mut bytes, col.keys.len() as u32);
    for k in &col.keys {
        push_u64(&mut bytes, *k);
    }
    for v in &col.vals {
        write_wire_scalar(&mut bytes, v);
    }
    Block { bytes, local_patches: Vec::new() }
}

/// Variable-length object-valued block (length-1 nested objects):
/// `(marker, count)[key_id]×N[value_offset]×N[Object]×N`.
fn build_object_scalar_block(objects: &[(u64, ColumnDoc)], oid_gen: &ObjectIdGenerator) -> Result<Block> {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::PropObject.as_byte());
    push_u32(&mut bytes, objects.len() as u32);
    for (k, _) in objects {
        push_u64(&mut bytes, *k);
    }
    let offsets_start = bytes.len();
    for _ in objects {
        push_u64(&mut bytes, 0);
    }
    let mut local_patches = Vec::with_capacity(objects.len());
    let fixed_len = bytes.len() as u64;
    let mut running = fixed_len;
    let mut nested_blobs = Vec::new();
    for (_, obj) in objects {
        let blob = serialize_object(obj, oid_gen)?;
        nested_blobs.push((running, blob.len() as u64));
        running += blob.len() as u64;
        bytes.extend_from_slice(&blob);
    }
    for (i, (local_offset, _)) in nested_blobs.into_iter().enumerate() {
        let pos = offsets_start + i * 8;
        patch_u64(&mut bytes, pos, local_offset);
        local_patches.push(pos);
    }
    Ok(Block { bytes, local_patches })
}

/// Array property block: `(marker, count)[key_id]×N[len:u32]×N[values...]`.
/// `Null` arrays stop after the `len` column (each length is itself the
/// value carried, per §4.5).
fn build_null_array_block(col: &ArrayColumn) -> Block {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::PropNullArray.as_byte());
    push_u32(&mut bytes, col.keys.len() as u32);
    for k in &col.keys {
        push_u64(&mut bytes, *k);
    }
    for v in &col.vals {
        push_u32(&mut bytes, v.len() as u32);
    }
    Block { bytes, local_patches: Vec::new() }
}

fn build_fixed_array_block(t: ValueType, col: &ArrayColumn) -> Block {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::for_array(t).as_byte());
    push_u32(&mut bytes, col.keys.len() as u32);
    for k in &col.keys {
        push_u64(&mut bytes, *k);
    }
    for v in &col.vals {
        push_u32(&mut bytes, v.len() as u32);
    }
    for v in &col.vals {
        for scalar in v {
            write_wire_scalar(&mut bytes, scalar);
        }
    }
    Block { bytes, local_patches: Vec::new() }
}

/// Object-array property block (§4.5's deepest layout): one group per
/// outer key, each holding `(nested_key, nested_type)` columns. Only the
/// outer `group_offset` column is bubbled to be relative to the enclosing
/// object (matching the text's explicit statement for that field);
/// `column_offset` and `entry_value_offset`, left unspecified in the
/// source text, are implemented relative to their own immediate
/// container — see DESIGN.md.
fn build_object_array_block(groups: &[ObjectArrayGroup], oid_gen: &ObjectIdGenerator) -> Result<Block> {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::PropObjectArray.as_byte());
    push_u32(&mut bytes, groups.len() as u32);
    for g in groups {
        push_u64(&mut bytes, g.outer_key);
    }
    let offsets_start = bytes.len();
    for _ in groups {
        push_u64(&mut bytes, 0);
    }
    let fixed_len = bytes.len() as u64;
    let mut running = fixed_len;
    let mut local_patches = Vec::with_capacity(groups.len());
    for (i, g) in groups.iter().enumerate() {
        let group_bytes = build_group_bytes(g, oid_gen)?;
        let pos = offsets_start + i * 8;
        patch_u64(&mut bytes, pos, running);
        local_patches.push(pos);
        running += group_bytes.len() as u64;
        bytes.extend_from_slice(&group_bytes);
    }
    Ok(Block { bytes, local_patches })
}

fn build_group_bytes(group: &ObjectArrayGroup, oid_gen: &ObjectIdGenerator) -> Result<Vec<u8>> {
    // One fresh object-id per source array element (§4.5, §8 scenario 3),
    // not per element that happens to contribute a column entry: an
    // element that is an empty object never appears in any column's
    // `positions` but still needs its own id on the wire.
    let num_objects = group.num_elements;

    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::ColumnGroup.as_byte());
    push_u32(&mut bytes, group.columns.len() as u32);
    push_u32(&mut bytes, num_objects as u32);
    for _ in 0..num_objects {
        push_u64(&mut bytes, oid_gen.next()?);
    }
    let offsets_start = bytes.len();
    for _ in &group.columns {
        push_u64(&mut bytes, 0);
    }
    let fixed_len = bytes.len() as u64;
    let mut running = fixed_len;
    for (i, col) in group.columns.iter().enumerate() {
        let col_bytes = build_column_bytes(col, oid_gen)?;
        let pos = offsets_start + i * 8;
        patch_u64(&mut bytes, pos, running);
        running += col_bytes.len() as u64;
        bytes.extend_from_slice(&col_bytes);
    }
    Ok(bytes)
}

fn build_column_bytes(col: &ObjectArrayColumn, oid_gen: &ObjectIdGenerator) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    push_u8(&mut bytes, Marker::Column.as_byte());
    push_u64(&mut bytes, col.nested_key);
    push_u8(&mut bytes, col.nested_type.ordinal());
    push_u32(&mut bytes, col.entries.len() as u32);
    let offsets_start = bytes.len();
    for _ in &col.entries {
        push_u64(&mut bytes, 0);
    }
    for p in &col.positions {
        push_u32(&mut bytes, *p);
    }
    let fixed_len = bytes.len() as u64;
    let mut running = fixed_len;
    for (i, entry) in col.entries.iter().enumerate() {
        let entry_bytes = build_entry_bytes(entry, oid_gen)?;
        let pos = offsets_start + i * 8;
        patch_u64(&mut bytes, pos, running);
        running += entry_bytes.len() as u64;
        bytes.extend_from_slice(&entry_bytes);
    }
    Ok(bytes)
}

/// `[len:u32][inner value or nested object]×len`. `Nulls` carries only its
/// count, matching the top-level null-array convention.
fn build_entry_bytes(entry: &ColumnEntry, oid_gen: &ObjectIdGenerator) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match entry {
        ColumnEntry::Nulls(n) => {
            push_u32(&mut bytes, *n as u32);
        }
        ColumnEntry::Scalars(vals) => {
            push_u32(&mut bytes, vals.len() as u32);
            for v in vals {
                write_wire_scalar(&mut bytes, v);
            }
        }
        ColumnEntry::Objects(docs) => {
            push_u32(&mut bytes, docs.len() as u32);
            for d in docs {
                let blob = serialize_object(d, oid_gen)?;
                bytes.extend_from_slice(&blob);
            }
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docarc_dict::StringDictionary;

    #[test]
    fn archive_header_has_magic_and_version() {
        let dict = StringDictionary::new();
        let doc = ColumnDoc::default();
        let registry = CodecRegistry::with_defaults();
        let written = write_archive(&doc, &dict, &registry, &WriteOptions::default()).unwrap();
        assert_eq!(&written.bytes[0..8], &ARCHIVE_MAGIC);
        assert_eq!(byteorder::LittleEndian::read_u32(&written.bytes[8..12]), FORMAT_VERSION);
    }

    #[test]
    fn empty_object_serializes_with_no_set_flags() {
        let oid_gen = ObjectIdGenerator::deterministic(1);
        let doc = ColumnDoc::default();
        let bytes = serialize_object(&doc, &oid_gen).unwrap();
        // marker + oid + flags(all-zero) + next_or_nil + end marker, no offsets.
        assert_eq!(bytes.len(), 1 + 8 + 4 + 8 + 1);
        assert_eq!(bytes[0], Marker::ObjectBegin.as_byte());
        assert_eq!(*bytes.last().unwrap(), Marker::ObjectEnd.as_byte());
    }

    #[test]
    fn group_emits_one_oid_per_source_element_not_per_contributing_entry() {
        // One column only has a position for element 0 (a second element
        // that contributed no column entries still needs its own oid).
        let oid_gen = ObjectIdGenerator::deterministic(1);
        let group = ObjectArrayGroup {
            outer_key: 1,
            num_elements: 2,
            columns: vec![ObjectArrayColumn {
                nested_key: 2,
                nested_type: ValueType::U8,
                positions: vec![0],
                entries: vec![ColumnEntry::Scalars(vec![WireScalar::U8(1)])],
            }],
        };
        let bytes = build_group_bytes(&group, &oid_gen).unwrap();
        let num_objects = byteorder::LittleEndian::read_u32(&bytes[5..9]);
        assert_eq!(num_objects, 2);
    }
}
