//! The pivoted, columnar shape a [`crate::transform::to_columndoc`] builds
//! from a `docarc_doc::DocObject` (§4.3, C4).
//!
//! A `ColumnDoc` groups an object's entries by shape rather than by
//! insertion order: one `(keys, vals)` pair per scalar type, one
//! `(keys, vals)` pair per array type, a list of nested single objects,
//! and a list of object-array groups (one per outer key that held an
//! array of objects).

use docarc_core::value::{Sentinel, ValueType};
use docarc_doc::doc::Scalar;
use std::collections::BTreeMap;

/// A scalar at the wire boundary: identical to `docarc_doc::doc::Scalar`
/// except `String` has already been resolved to its dictionary id (§4.3:
/// "each string value is interned ... ids are known"). Id `0` is the null
/// sentinel, matching `docarc_dict::NULL_STRING_ID`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireScalar {
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
    StringId(u64),
}

impl WireScalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            WireScalar::Bool(_) => ValueType::Bool,
            WireScalar::I8(_) => ValueType::I8,
            WireScalar::I16(_) => ValueType::I16,
            WireScalar::I32(_) => ValueType::I32,
            WireScalar::I64(_) => ValueType::I64,
            WireScalar::U8(_) => ValueType::U8,
            WireScalar::U16(_) => ValueType::U16,
            WireScalar::U32(_) => ValueType::U32,
            WireScalar::U64(_) => ValueType::U64,
            WireScalar::F32(_) => ValueType::F32,
            WireScalar::StringId(_) => ValueType::String,
        }
    }

    /// Resolves a document-level scalar into its wire form, interning any
    /// string payload via `dict` (already preregistered — see `transform`).
    pub fn from_doc_scalar(s: &Scalar, dict: &dyn docarc_dict::Dictionary) -> WireScalar {
        match s {
            Scalar::Bool(v) => WireScalar::Bool(*v),
            Scalar::I8(v) => WireScalar::I8(*v),
            Scalar::I16(v) => WireScalar::I16(*v),
            Scalar::I32(v) => WireScalar::I32(*v),
            Scalar::I64(v) => WireScalar::I64(*v),
            Scalar::U8(v) => WireScalar::U8(*v),
            Scalar::U16(v) => WireScalar::U16(*v),
            Scalar::U32(v) => WireScalar::U32(*v),
            Scalar::U64(v) => WireScalar::U64(*v),
            Scalar::F32(v) => WireScalar::F32(*v),
            Scalar::String(None) => WireScalar::StringId(Sentinel::STRING_ID),
            Scalar::String(Some(s)) => {
                let id = dict.locate_fast(&[s.as_str()])[0];
                WireScalar::StringId(id)
            }
        }
    }
}

/// A length-1 entry of primitive type `t`: parallel `keys`/`vals`, one
/// slot per entry of that type seen at this object's level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarColumn {
    pub keys: Vec<u64>,
    pub vals: Vec<WireScalar>,
}

/// A length>1 array entry of primitive type `t`: `keys` names each
/// property, `vals` holds one freshly allocated inner sequence per
/// property (so `vals[i]` is the whole array that property held).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayColumn {
    pub keys: Vec<u64>,
    pub vals: Vec<Vec<WireScalar>>,
}

/// What a single nested-entry occurrence inside an object-array column
/// contributes: either a flattened scalar sequence (`len` == its
/// length), or, when the nested entry's type is `object`, the recursive
/// `ColumnDoc`s for each nested object in that occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnEntry {
    Scalars(Vec<WireScalar>),
    Objects(Vec<ColumnDoc>),
    /// A nested null array: `len` IS the value, no payload follows (§4.5).
    Nulls(usize),
}

impl ColumnEntry {
    pub fn len(&self) -> usize {
        match self {
            ColumnEntry::Scalars(v) => v.len(),
            ColumnEntry::Objects(v) => v.len(),
            ColumnEntry::Nulls(n) => *n,
        }
    }
}

/// One `(nested_key, nested_type)` column inside an object-array group:
/// `positions[i]` is the index, within the original object array, of the
/// outer-array element that contributed `entries[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectArrayColumn {
    pub nested_key: u64,
    pub nested_type: ValueType,
    pub positions: Vec<u32>,
    pub entries: Vec<ColumnEntry>,
}

/// All columns collected for one outer key that held an array of objects.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectArrayGroup {
    pub outer_key: u64,
    /// Number of elements in the source array, independent of which
    /// elements actually contributed a column entry (an element that is
    /// an empty object `{}` contributes none, but still needs its own
    /// fresh object-id on the wire — §4.5, §8 scenario 3).
    pub num_elements: usize,
    pub columns: Vec<ObjectArrayColumn>,
}

/// The pivoted shape of one `DocObject`, recursively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnDoc {
    /// Keys whose entry was empty (JSON `null` or `[]`).
    pub null_keys: Vec<u64>,
    /// One `ScalarColumn` per scalar type present at this level.
    pub scalars: BTreeMap<ValueType, ScalarColumn>,
    /// One `ArrayColumn` per non-object array type present at this level.
    pub arrays: BTreeMap<ValueType, ArrayColumn>,
    /// Length-1 object entries: `(key_id, nested ColumnDoc)`.
    pub objects: Vec<(u64, ColumnDoc)>,
    /// Length>1 object-array entries, one group per outer key.
    pub object_arrays: Vec<ObjectArrayGroup>,
}

impl ColumnDoc {
    pub fn scalar_column(&mut self, ty: ValueType) -> &mut ScalarColumn {
        self.scalars.entry(ty).or_default()
    }

    pub fn array_column(&mut self, ty: ValueType) -> &mut ArrayColumn {
        self.arrays.entry(ty).or_default()
    }

    pub fn object_array_group(&mut self, outer_key: u64, num_elements: usize) -> &mut ObjectArrayGroup {
        if let Some(pos) = self.object_arrays.iter().position(|g| g.outer_key == outer_key) {
            return &mut self.object_arrays[pos];
        }
        self.object_arrays.push(ObjectArrayGroup { outer_key, num_elements, columns: Vec::new() });
        self.object_arrays.last_mut().expect("just pushed")
    }
}

impl ObjectArrayGroup {
    pub fn column(&mut self, nested_key: u64, nested_type: ValueType) -> &mut ObjectArrayColumn {
        if let Some(pos) = self
            .columns
            .iter()
            .position(|c| c.nested_key == nested_key && c.nested_type == nested_type)
        {
            return &mut self.columns[pos];
        }
        self.columns.push(ObjectArrayColumn {
            nested_key,
            nested_type,
            positions: Vec::new(),
            entries: Vec::new(),
        });
        self.columns.last_mut().expect("just pushed")
    }
}
