//! Scans a committed archive's bytes and collects every `(string_id,
//! file_offset)` occurrence it can find — one per key-id field and one per
//! string-scalar value field — so `bake` can build the lookup index over
//! them (§4.6). This walks the same marker grammar `docarc_format::printer`
//! does, but records byte offsets instead of building a debug tree.

use docarc_core::marker::Marker;
use docarc_core::value::ValueType;
use docarc_core::{ARCHIVE_MAGIC, FORMAT_VERSION};
use docarc_format::error::Error as FormatError;
use docarc_format::wire::Cursor;

use crate::error::{Error, Result};

fn fmt_err(e: FormatError) -> Error {
    Error::Format(e)
}

/// Every `(string_id, file_offset)` pair found while walking `bytes`.
/// `file_offset` always points at the start of the `u64` id field itself
/// (the key-id column entry, or the string-scalar's id), matching what a
/// reader building a direct seek table would want to record.
pub fn collect_string_offsets(bytes: &[u8]) -> Result<Vec<(u64, u64)>> {
    let mut c = Cursor::new(bytes);
    let magic = c.read_bytes(8).map_err(fmt_err)?;
    if magic != ARCHIVE_MAGIC {
        return Err(Error::Format(FormatError::NoArchiveFile));
    }
    let version = c.read_u32().map_err(fmt_err)?;
    if version != FORMAT_VERSION {
        return Err(Error::Format(FormatError::FormatVersion { found: version, expected: FORMAT_VERSION }));
    }
    let root_offset = c.read_u64().map_err(fmt_err)?;
    let _index_offset = c.read_u64().map_err(fmt_err)?;

    skip_string_table(&mut c)?;

    c.expect_marker(Marker::RecordHeader).map_err(fmt_err)?;
    let _flags = c.read_u32().map_err(fmt_err)?;
    let _record_size = c.read_u64().map_err(fmt_err)?;
    if c.pos != root_offset as usize {
        return Err(Error::Corrupted { detail: format!("root offset {root_offset} does not follow the record header") });
    }

    let mut out = Vec::new();
    scan_object(&mut c, &mut out)?;
    Ok(out)
}

fn skip_string_table(c: &mut Cursor) -> Result<()> {
    c.expect_marker(Marker::StrtabHeader).map_err(fmt_err)?;
    let _flags = c.read_u32().map_err(fmt_err)?;
    let num_entries = c.read_u32().map_err(fmt_err)?;
    let _first_entry_offset = c.read_u64().map_err(fmt_err)?;
    let extra_size = c.read_u64().map_err(fmt_err)?;
    c.read_bytes(extra_size as usize).map_err(fmt_err)?;
    for _ in 0..num_entries {
        c.expect_marker(Marker::StrtabEntry).map_err(fmt_err)?;
        let next_entry_offset = c.read_u64().map_err(fmt_err)?;
        c.pos = next_entry_offset as usize;
    }
    Ok(())
}

fn scan_object(c: &mut Cursor, out: &mut Vec<(u64, u64)>) -> Result<()> {
    c.expect_marker(Marker::ObjectBegin).map_err(fmt_err)?;
    let _object_id = c.read_u64().map_err(fmt_err)?;
    let flags = c.read_u32().map_err(fmt_err)?;

    let mut bits: Vec<usize> = (0..32).filter(|b| flags & (1 << b) != 0).collect();
    bits.sort_unstable();
    for _ in &bits {
        c.read_u64().map_err(fmt_err)?;
    }
    let _next_or_nil = c.read_u64().map_err(fmt_err)?;

    for bit in bits {
        let t = ValueType::from_ordinal((bit / 2) as u8).ok_or_else(|| Error::Corrupted { detail: format!("unknown flag bit {bit}") })?;
        let is_array = bit % 2 == 1;
        scan_property_block(c, t, is_array, out)?;
    }
    c.expect_marker(Marker::ObjectEnd).map_err(fmt_err)?;
    Ok(())
}

fn scan_property_block(c: &mut Cursor, t: ValueType, is_array: bool, out: &mut Vec<(u64, u64)>) -> Result<()> {
    if !is_array {
        return scan_scalar_property_block(c, t, out);
    }
    scan_array_property_block(c, t, out)
}

fn read_key_offsets(c: &mut Cursor, n: u32) -> Result<Vec<(u64, u64)>> {
    let mut keys = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let off = c.pos as u64;
        let k = c.read_u64().map_err(fmt_err)?;
        keys.push((k, off));
    }
    Ok(keys)
}

fn scan_scalar_property_block(c: &mut Cursor, t: ValueType, out: &mut Vec<(u64, u64)>) -> Result<()> {
    match t {
        ValueType::Null => {
            c.expect_marker(Marker::PropNull).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            out.extend(read_key_offsets(c, n)?);
        }
        ValueType::Object => {
            c.expect_marker(Marker::PropObject).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            let keys = read_key_offsets(c, n)?;
            for _ in 0..n {
                c.read_u64().map_err(fmt_err)?; // value offsets, unused
            }
            out.extend(keys.iter().copied());
            for _ in keys {
                scan_object(c, out)?;
            }
        }
        _ => {
            c.expect_marker(Marker::for_scalar(t)).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            let keys = read_key_offsets(c, n)?;
            out.extend(keys.iter().copied());
            for _ in keys {
                scan_scalar_value(c, t, out)?;
            }
        }
    }
    Ok(())
}

fn scan_array_property_block(c: &mut Cursor, t: ValueType, out: &mut Vec<(u64, u64)>) -> Result<()> {
    match t {
        ValueType::Object => {
            c.expect_marker(Marker::PropObjectArray).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            let keys = read_key_offsets(c, n)?;
            for _ in 0..n {
                c.read_u64().map_err(fmt_err)?; // group offsets, unused
            }
            out.extend(keys.iter().copied());
            for _ in keys {
                scan_group(c, out)?;
            }
        }
        ValueType::Null => {
            c.expect_marker(Marker::PropNullArray).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            let keys = read_key_offsets(c, n)?;
            out.extend(keys.iter().copied());
            for _ in 0..n {
                c.read_u32().map_err(fmt_err)?; // lens
            }
        }
        _ => {
            c.expect_marker(Marker::for_array(t)).map_err(fmt_err)?;
            let n = c.read_u32().map_err(fmt_err)?;
            let keys = read_key_offsets(c, n)?;
            let lens: Vec<u32> = (0..n).map(|_| c.read_u32()).collect::<std::result::Result<_, _>>().map_err(fmt_err)?;
            out.extend(keys.iter().copied());
            for (_, len) in keys.into_iter().zip(lens) {
                for _ in 0..len {
                    scan_scalar_value(c, t, out)?;
                }
            }
        }
    }
    Ok(())
}

fn scan_group(c: &mut Cursor, out: &mut Vec<(u64, u64)>) -> Result<()> {
    c.expect_marker(Marker::ColumnGroup).map_err(fmt_err)?;
    let num_columns = c.read_u32().map_err(fmt_err)?;
    let num_objects = c.read_u32().map_err(fmt_err)?;
    for _ in 0..num_objects {
        c.read_u64().map_err(fmt_err)?;
    }
    for _ in 0..num_columns {
        c.read_u64().map_err(fmt_err)?;
    }
    for _ in 0..num_columns {
        scan_column(c, out)?;
    }
    Ok(())
}

fn scan_column(c: &mut Cursor, out: &mut Vec<(u64, u64)>) -> Result<()> {
    c.expect_marker(Marker::Column).map_err(fmt_err)?;
    let key_off = c.pos as u64;
    let nested_key = c.read_u64().map_err(fmt_err)?;
    out.push((nested_key, key_off));
    let nested_type_ord = c.read_u8().map_err(fmt_err)?;
    let nested_type = ValueType::from_ordinal(nested_type_ord).ok_or_else(|| Error::Corrupted { detail: format!("unknown nested type ordinal {nested_type_ord}") })?;
    let n = c.read_u32().map_err(fmt_err)?;
    for _ in 0..n {
        c.read_u64().map_err(fmt_err)?; // entry offsets, unused
    }
    let positions: Vec<u32> = (0..n).map(|_| c.read_u32()).collect::<std::result::Result<_, _>>().map_err(fmt_err)?;
    for _ in positions {
        scan_column_entry(c, nested_type, out)?;
    }
    Ok(())
}

fn scan_column_entry(c: &mut Cursor, nested_type: ValueType, out: &mut Vec<(u64, u64)>) -> Result<()> {
    let len = c.read_u32().map_err(fmt_err)?;
    match nested_type {
        ValueType::Null => {}
        ValueType::Object => {
            for _ in 0..len {
                scan_object(c, out)?;
            }
        }
        _ => {
            for _ in 0..len {
                scan_scalar_value(c, nested_type, out)?;
            }
        }
    }
    Ok(())
}

fn scan_scalar_value(c: &mut Cursor, t: ValueType, out: &mut Vec<(u64, u64)>) -> Result<()> {
    match t {
        ValueType::Bool | ValueType::I8 | ValueType::U8 => {
            c.read_u8().map_err(fmt_err)?;
        }
        ValueType::I16 | ValueType::U16 => {
            c.read_u16().map_err(fmt_err)?;
        }
        ValueType::I32 | ValueType::U32 | ValueType::F32 => {
            c.read_u32().map_err(fmt_err)?;
        }
        ValueType::I64 | ValueType::U64 => {
            c.read_u64().map_err(fmt_err)?;
        }
        ValueType::String => {
            let off = c.pos as u64;
            let id = c.read_u64().map_err(fmt_err)?;
            out.push((id, off));
        }
        ValueType::Null | ValueType::Object => {
            return Err(Error::Corrupted { detail: "unreachable: object/null value read as scalar".into() });
        }
    }
    Ok(())
}
