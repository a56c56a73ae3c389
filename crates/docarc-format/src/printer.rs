//! The schema-less archive printer/walker (§4.5.1, ADDED): reconstructs a
//! debug tree from raw archive bytes using only the in-band markers, the
//! same way a hex-dump tool would — no document model, no dictionary
//! other than the one embedded in the archive itself.
//!
//! The writer lays out every block's tail contiguously (keys, then
//! lengths, then values, with no padding between blocks), so the printer
//! never needs to follow the offset tables the writer embedded for random
//! seeking: walking the bytes in the order they were written reaches the
//! same structure. Offset fields are still read (to keep the cursor
//! aligned) but their values are otherwise unused here.

use std::collections::HashMap;

use docarc_core::marker::Marker;
use docarc_core::value::ValueType;
use docarc_core::{ARCHIVE_MAGIC, FORMAT_VERSION};
use serde::Serialize;

use crate::codec::CodecRegistry;
use crate::error::{Error, Result};
use crate::wire::Cursor;

/// The root of a printed archive.
#[derive(Debug, Clone, Serialize)]
pub struct DebugTree {
    pub format_version: u32,
    pub root: DebugObject,
    /// Whether the archive carries a baked string-id index (C7); the
    /// printer does not read that index, it only reports its presence.
    pub has_string_id_index: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugObject {
    pub object_id: u64,
    pub properties: Vec<DebugProperty>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugProperty {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    pub value: DebugValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum DebugValue {
    Null,
    NullArray { count: u32 },
    Scalar { value: DebugScalar },
    ScalarArray { values: Vec<DebugScalar> },
    Object { object: Box<DebugObject> },
    /// One outer key's object-array payload, still in its pivoted,
    /// columnar shape (the printer does not un-pivot back to a JSON
    /// array of objects — see DESIGN.md).
    ObjectArray { columns: Vec<DebugColumn> },
    /// A column-entry occurrence whose nested type is itself `object`:
    /// `len` whole objects back to back, with no columnar pivot of their
    /// own (§4.5's entry payload for nested object columns).
    NestedObjects { objects: Vec<DebugObject> },
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugColumn {
    pub nested_key: String,
    pub nested_type: &'static str,
    pub entries: Vec<DebugColumnEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugColumnEntry {
    /// Index, within the original array, of the outer element this entry
    /// came from.
    pub array_position: u32,
    pub value: DebugValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DebugScalar {
    Bool(u8),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    StringId { id: u64, value: Option<String> },
}

fn type_name(t: ValueType) -> &'static str {
    match t {
        ValueType::Null => "null",
        ValueType::Bool => "bool",
        ValueType::I8 => "i8",
        ValueType::I16 => "i16",
        ValueType::I32 => "i32",
        ValueType::I64 => "i64",
        ValueType::U8 => "u8",
        ValueType::U16 => "u16",
        ValueType::U32 => "u32",
        ValueType::U64 => "u64",
        ValueType::F32 => "f32",
        ValueType::String => "string",
        ValueType::Object => "object",
    }
}

fn key_name(strings: &HashMap<u64, String>, id: u64) -> String {
    strings.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
}

fn unknown_flag_bit(bit: usize) -> Error {
    Error::Corrupted { detail: format!("object header sets unknown flag bit {bit}") }
}

fn unknown_nested_type(ord: u8) -> Error {
    Error::Corrupted { detail: format!("column carries unknown nested type ordinal {ord}") }
}

/// Walks `bytes` top to bottom and returns its debug tree. Stops at the
/// first marker it does not recognize with `CORRUPTED`, per §4.5.1 — this
/// is a best-effort walker, not a repair tool.
pub fn print_archive(bytes: &[u8], registry: &CodecRegistry) -> Result<DebugTree> {
    tracing::debug!(n_bytes = bytes.len(), "walking archive");
    let mut c = Cursor::new(bytes);
    let magic = c.read_bytes(8)?;
    if magic != ARCHIVE_MAGIC {
        return Err(Error::NoArchiveFile);
    }
    let format_version = c.read_u32()?;
    if format_version != FORMAT_VERSION {
        return Err(Error::FormatVersion { found: format_version, expected: FORMAT_VERSION });
    }
    let root_offset = c.read_u64()?;
    let index_offset = c.read_u64()?;

    let strings = read_string_table(&mut c, registry)?;

    c.expect_marker(Marker::RecordHeader)?;
    let _record_flags = c.read_u32()?;
    let _record_size = c.read_u64()?;
    if c.pos != root_offset as usize {
        return Err(Error::Corrupted {
            detail: format!("root object offset {root_offset} does not follow the record header (found at {})", c.pos),
        });
    }

    let root = parse_object(&mut c, &strings)?;
    Ok(DebugTree { format_version, root, has_string_id_index: index_offset != 0 })
}

fn read_string_table(c: &mut Cursor, registry: &CodecRegistry) -> Result<HashMap<u64, String>> {
    c.expect_marker(Marker::StrtabHeader)?;
    let flags = c.read_u32()?;
    let num_entries = c.read_u32()?;
    let _first_entry_offset = c.read_u64()?;
    let extra_size = c.read_u64()?;
    let extra = c.read_bytes(extra_size as usize)?;
    let codec = registry.get(flags)?;
    let state = codec.read_extra(extra)?;

    let mut out = HashMap::with_capacity(num_entries as usize);
    for _ in 0..num_entries {
        c.expect_marker(Marker::StrtabEntry)?;
        let next_entry_offset = c.read_u64()?;
        let string_id = c.read_u64()?;
        let string_len = c.read_u32()?;
        let encoded_len = (next_entry_offset as usize).saturating_sub(c.pos);
        let encoded = c.read_bytes(encoded_len)?;
        let decoded = state.decode(encoded, string_len as usize)?;
        out.insert(string_id, decoded);
        c.pos = next_entry_offset as usize;
    }
    Ok(out)
}

fn parse_object(c: &mut Cursor, strings: &HashMap<u64, String>) -> Result<DebugObject> {
    c.expect_marker(Marker::ObjectBegin)?;
    let object_id = c.read_u64()?;
    let flags = c.read_u32()?;

    let mut bits: Vec<usize> = (0..32).filter(|b| flags & (1 << b) != 0).collect();
    bits.sort_unstable();
    for _ in &bits {
        c.read_u64()?; // offsets table, unused by a sequential walk
    }
    let _next_or_nil = c.read_u64()?;

    let mut properties = Vec::new();
    for bit in bits {
        let t = ValueType::from_ordinal((bit / 2) as u8).ok_or_else(|| unknown_flag_bit(bit))?;
        let is_array = bit % 2 == 1;
        properties.extend(parse_property_block(c, t, is_array, strings)?);
    }
    c.expect_marker(Marker::ObjectEnd)?;
    Ok(DebugObject { object_id, properties })
}

fn parse_property_block(c: &mut Cursor, t: ValueType, is_array: bool, strings: &HashMap<u64, String>) -> Result<Vec<DebugProperty>> {
    if !is_array {
        return parse_scalar_property_block(c, t, strings);
    }
    parse_array_property_block(c, t, strings)
}

fn parse_scalar_property_block(c: &mut Cursor, t: ValueType, strings: &HashMap<u64, String>) -> Result<Vec<DebugProperty>> {
    match t {
        ValueType::Null => {
            c.expect_marker(Marker::PropNull)?;
            let n = c.read_u32()?;
            let mut props = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let k = c.read_u64()?;
                props.push(DebugProperty { key: key_name(strings, k), value_type: "null", value: DebugValue::Null });
            }
            Ok(props)
        }
        ValueType::Object => {
            c.expect_marker(Marker::PropObject)?;
            let n = c.read_u32()?;
            let keys: Vec<u64> = (0..n).map(|_| c.read_u64()).collect::<Result<_>>()?;
            for _ in 0..n {
                c.read_u64()?; // value offsets, unused
            }
            let mut props = Vec::with_capacity(n as usize);
            for k in keys {
                let obj = parse_object(c, strings)?;
                props.push(DebugProperty { key: key_name(strings, k), value_type: "object", value: DebugValue::Object { object: Box::new(obj) } });
            }
            Ok(props)
        }
        _ => {
            c.expect_marker(Marker::for_scalar(t))?;
            let n = c.read_u32()?;
            let keys: Vec<u64> = (0..n).map(|_| c.read_u64()).collect::<Result<_>>()?;
            let mut props = Vec::with_capacity(n as usize);
            for k in keys {
                let value = read_scalar(c, t, strings)?;
                props.push(DebugProperty { key: key_name(strings, k), value_type: type_name(t), value: DebugValue::Scalar { value } });
            }
            Ok(props)
        }
    }
}

fn parse_array_property_block(c: &mut Cursor, t: ValueType, strings: &HashMap<u64, String>) -> Result<Vec<DebugProperty>> {
    match t {
        ValueType::Object => {
            c.expect_marker(Marker::PropObjectArray)?;
            let n = c.read_u32()?;
            let keys: Vec<u64> = (0..n).map(|_| c.read_u64()).collect::<Result<_>>()?;
            for _ in 0..n {
                c.read_u64()?; // group offsets, unused
            }
            let mut props = Vec::with_capacity(n as usize);
            for k in keys {
                let columns = parse_group(c, strings)?;
                props.push(DebugProperty { key: key_name(strings, k), value_type: "object_array", value: DebugValue::ObjectArray { columns } });
            }
            Ok(props)
        }
        ValueType::Null => {
            c.expect_marker(Marker::PropNullArray)?;
            let n = c.read_u32()?;
            let keys: Vec<u64> = (0..n).map(|_| c.read_u64()).collect::<Result<_>>()?;
            let lens: Vec<u32> = (0..n).map(|_| c.read_u32()).collect::<Result<_>>()?;
            Ok(keys
                .into_iter()
                .zip(lens)
                .map(|(k, count)| DebugProperty { key: key_name(strings, k), value_type: "null_array", value: DebugValue::NullArray { count } })
                .collect())
        }
        _ => {
            c.expect_marker(Marker::for_array(t))?;
            let n = c.read_u32()?;
            let keys: Vec<u64> = (0..n).map(|_| c.read_u64()).collect::<Result<_>>()?;
            let lens: Vec<u32> = (0..n).map(|_| c.read_u32()).collect::<Result<_>>()?;
            let mut props = Vec::with_capacity(n as usize);
            for (k, len) in keys.into_iter().zip(lens) {
                let mut values = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    values.push(read_scalar(c, t, strings)?);
                }
                props.push(DebugProperty { key: key_name(strings, k), value_type: type_name(t), value: DebugValue::ScalarArray { values } });
            }
            Ok(props)
        }
    }
}

fn parse_group(c: &mut Cursor, strings: &HashMap<u64, String>) -> Result<Vec<DebugColumn>> {
    c.expect_marker(Marker::ColumnGroup)?;
    let num_columns = c.read_u32()?;
    let num_objects = c.read_u32()?;
    for _ in 0..num_objects {
        c.read_u64()?; // per-object oids, unused
    }
    for _ in 0..num_columns {
        c.read_u64()?; // column offsets, unused
    }
    let mut columns = Vec::with_capacity(num_columns as usize);
    for _ in 0..num_columns {
        columns.push(parse_column(c, strings)?);
    }
    Ok(columns)
}

fn parse_column(c: &mut Cursor, strings: &HashMap<u64, String>) -> Result<DebugColumn> {
    c.expect_marker(Marker::Column)?;
    let nested_key = c.read_u64()?;
    let nested_type_ord = c.read_u8()?;
    let nested_type = ValueType::from_ordinal(nested_type_ord).ok_or_else(|| unknown_nested_type(nested_type_ord))?;
    let n = c.read_u32()?;
    for _ in 0..n {
        c.read_u64()?; // entry offsets, unused
    }
    let positions: Vec<u32> = (0..n).map(|_| c.read_u32()).collect::<Result<_>>()?;

    let mut entries = Vec::with_capacity(n as usize);
    for array_position in positions {
        let value = parse_column_entry(c, nested_type, strings)?;
        entries.push(DebugColumnEntry { array_position, value });
    }
    Ok(DebugColumn { nested_key: key_name(strings, nested_key), nested_type: type_name(nested_type), entries })
}

fn parse_column_entry(c: &mut Cursor, nested_type: ValueType, strings: &HashMap<u64, String>) -> Result<DebugValue> {
    let len = c.read_u32()?;
    match nested_type {
        ValueType::Null => Ok(DebugValue::NullArray { count: len }),
        ValueType::Object => {
            let mut objects = Vec::with_capacity(len as usize);
            for _ in 0..len {
                objects.push(parse_object(c, strings)?);
            }
            Ok(DebugValue::NestedObjects { objects })
        }
        _ => {
            let mut values = Vec::with_capacity(len as usize);
            for _ in 0..len {
                values.push(read_scalar(c, nested_type, strings)?);
            }
            Ok(DebugValue::ScalarArray { values })
        }
    }
}

fn read_scalar(c: &mut Cursor, t: ValueType, strings: &HashMap<u64, String>) -> Result<DebugScalar> {
    Ok(match t {
        ValueType::Bool => DebugScalar::Bool(c.read_u8()?),
        ValueType::I8 => DebugScalar::I8(c.read_i8()?),
        ValueType::I16 => DebugScalar::I16(c.read_i16()?),
        ValueType::I32 => DebugScalar::I32(c.read_i32()?),
        ValueType::I64 => DebugScalar::I64(c.read_i64()?),
        ValueType::U8 => DebugScalar::U8(c.read_u8()?),
        ValueType::U16 => DebugScalar::U16(c.read_u16()?),
        ValueType::U32 => DebugScalar::U32(c.read_u32()?),
        ValueType::U64 => DebugScalar::U64(c.read_u64()?),
        ValueType::F32 => DebugScalar::F32(c.read_f32()?),
        ValueType::String => {
            let id = c.read_u64()?;
            DebugScalar::StringId { id, value: strings.get(&id).cloned() }
        }
        ValueType::Null | ValueType::Object => {
            return Err(Error::Corrupted { detail: format!("{} is not a scalar wire type", type_name(t)) });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::writer::{write_archive, WriteOptions};
    use docarc_columnar::transform::{preregister, to_columndoc};
    use docarc_dict::StringDictionary;
    use docarc_doc::from_json::from_json;

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
    fn prints_flat_object() {
        let bytes = build(serde_json::json!({"name": "ann", "age": 30}));
        let registry = CodecRegistry::with_defaults();
        let tree = print_archive(&bytes, &registry).unwrap();
        assert_eq!(tree.format_version, FORMAT_VERSION);
        assert!(!tree.has_string_id_index);
        let keys: Vec<&str> = tree.root.properties.iter().map(|p| p.key.as_str()).collect();
        assert!(keys.contains(&"name"));
        assert!(keys.contains(&"age"));
    }

    #[test]
    fn prints_nested_object_and_array() {
        let bytes = build(serde_json::json!({
            "tags": ["a", "b", "c"],
            "address": {"city": "nyc"},
        }));
        let registry = CodecRegistry::with_defaults();
        let tree = print_archive(&bytes, &registry).unwrap();
        let tags = tree.root.properties.iter().find(|p| p.key == "tags").unwrap();
        match &tags.value {
            DebugValue::ScalarArray { values } => assert_eq!(values.len(), 3),
            other => panic!("expected scalar array, got {other:?}"),
        }
        let address = tree.root.properties.iter().find(|p| p.key == "address").unwrap();
        match &address.value {
            DebugValue::Object { object } => assert_eq!(object.properties.len(), 1),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let registry = CodecRegistry::with_defaults();
        let err = print_archive(b"NOTANARCHIVE............", &registry).unwrap_err();
        assert!(matches!(err, Error::NoArchiveFile));
    }

    #[test]
    fn prints_object_array_as_columns() {
        let bytes = build(serde_json::json!({
            "items": [{"sku": "a1", "qty": 2}, {"sku": "b2", "qty": 5}],
        }));
        let registry = CodecRegistry::with_defaults();
        let tree = print_archive(&bytes, &registry).unwrap();
        let items = tree.root.properties.iter().find(|p| p.key == "items").unwrap();
        match &items.value {
            DebugValue::ObjectArray { columns } => {
                assert_eq!(columns.len(), 2);
                let keys: Vec<&str> = columns.iter().map(|c| c.nested_key.as_str()).collect();
                assert!(keys.contains(&"sku"));
                assert!(keys.contains(&"qty"));
            }
            other => panic!("expected object array, got {other:?}"),
        }
    }
}
