//! The document model (§3, §4.2): a tree whose interior nodes are objects,
//! each holding an ordered list of `(key, type, values)` entries.

use docarc_core::value::{Sentinel, ValueType};

/// A single scalar value, already narrowed to its inferred wire type.
/// `Bool` and `F32` carry their own null sentinel in-band (`0x7F` / `NaN`)
/// since Rust's `bool` can't represent a third state; `String` uses
/// `Option<String>` since no id exists yet at this layer (interning
/// happens in the columnar transform, §4.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
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
    String(Option<String>),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::I8(_) => ValueType::I8,
            Scalar::I16(_) => ValueType::I16,
            Scalar::I32(_) => ValueType::I32,
            Scalar::I64(_) => ValueType::I64,
            Scalar::U8(_) => ValueType::U8,
            Scalar::U16(_) => ValueType::U16,
            Scalar::U32(_) => ValueType::U32,
            Scalar::U64(_) => ValueType::U64,
            Scalar::F32(_) => ValueType::F32,
            Scalar::String(_) => ValueType::String,
        }
    }

    /// True if this slot encodes a JSON `null` that occurred inside an
    /// array (as opposed to a whole-property null, which never reaches
    /// `Scalar` — see `EntryValues::Empty`).
    pub fn is_null(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b == Sentinel::BOOL,
            Scalar::I8(v) => *v == Sentinel::I8,
            Scalar::I16(v) => *v == Sentinel::I16,
            Scalar::I32(v) => *v == Sentinel::I32,
            Scalar::I64(v) => *v == Sentinel::I64,
            Scalar::U8(v) => *v == Sentinel::U8,
            Scalar::U16(v) => *v == Sentinel::U16,
            Scalar::U32(v) => *v == Sentinel::U32,
            Scalar::U64(v) => *v == Sentinel::U64,
            Scalar::F32(v) => Sentinel::f32_is_null(*v),
            Scalar::String(s) => s.is_none(),
        }
    }
}

/// The shape of an entry's values, discriminated by the *length* of the
/// original JSON value's value-sequence, per §3: zero values (`Empty`),
/// exactly one (`Scalar`/`Object`), or more than one (the array variants).
/// A length-1 JSON array of scalars/objects collapses into the same shape
/// as a bare scalar/object — see DESIGN.md for why that is the literal
/// reading of §3's "a scalar is length 1" rule rather than an Array tag.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValues {
    /// `|values| == 0`: either a JSON `null`, or an empty JSON array `[]`.
    Empty,
    Scalar(Scalar),
    ScalarArray(Vec<Scalar>),
    /// An array of length > 1 whose elements are all JSON `null`; the
    /// payload is just the count, matching the wire format's null-array
    /// block where "len IS the value" (§4.5).
    NullArray(usize),
    Object(Box<DocObject>),
    /// An array of length > 1 whose elements are (possibly-null) objects.
    /// A `null` element is represented as an empty `DocObject` so that
    /// array positions stay aligned with the source array (see DESIGN.md).
    ObjectArray(Vec<DocObject>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub ty: ValueType,
    pub values: EntryValues,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocObject {
    pub entries: Vec<Entry>,
}

impl DocObject {
    pub fn empty() -> Self {
        DocObject { entries: Vec::new() }
    }
}
