//! The value-type lattice `T` and its numeric null sentinels.
//!
//! `ValueType` is the full set from the specification's data model (§3):
//! `null, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, string, object`.
//! Every scalar and array in a document carries exactly one of these.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueType {
    Null = 0,
    Bool = 1,
    I8 = 2,
    I16 = 3,
    I32 = 4,
    I64 = 5,
    U8 = 6,
    U16 = 7,
    U32 = 8,
    U64 = 9,
    F32 = 10,
    String = 11,
    Object = 12,
}

impl ValueType {
    /// All scalar/array-element types in a fixed canonical order, used
    /// wherever the format needs a stable iteration order over `T`
    /// (flag-bit layout, property-offset headers, column-group sorting).
    pub const ALL: [ValueType; 13] = [
        ValueType::Null,
        ValueType::Bool,
        ValueType::I8,
        ValueType::I16,
        ValueType::I32,
        ValueType::I64,
        ValueType::U8,
        ValueType::U16,
        ValueType::U32,
        ValueType::U64,
        ValueType::F32,
        ValueType::String,
        ValueType::Object,
    ];

    /// Fixed wire size in bytes for types with a fixed-width encoding.
    /// `String` is the 8-byte interned id; `Object` and `Null` have no
    /// scalar payload (`Null` carries only a count, `Object` recurses).
    pub fn wire_size(self) -> Option<usize> {
        match self {
            ValueType::Null => None,
            ValueType::Bool => Some(1),
            ValueType::I8 | ValueType::U8 => Some(1),
            ValueType::I16 | ValueType::U16 => Some(2),
            ValueType::I32 | ValueType::U32 | ValueType::F32 => Some(4),
            ValueType::I64 | ValueType::U64 => Some(8),
            ValueType::String => Some(8),
            ValueType::Object => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::I8
                | ValueType::I16
                | ValueType::I32
                | ValueType::I64
                | ValueType::U8
                | ValueType::U16
                | ValueType::U32
                | ValueType::U64
                | ValueType::F32
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(self, ValueType::I8 | ValueType::I16 | ValueType::I32 | ValueType::I64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64)
    }

    /// Ordinal used when sorting object-array columns by `(nested-key, nested-type ordinal)`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ord: u8) -> Option<ValueType> {
        ValueType::ALL.into_iter().find(|t| t.ordinal() == ord)
    }
}

/// Narrowest unsigned type that can hold `n`.
pub fn narrowest_unsigned(n: u64) -> ValueType {
    if n <= u8::MAX as u64 {
        ValueType::U8
    } else if n <= u16::MAX as u64 {
        ValueType::U16
    } else if n <= u32::MAX as u64 {
        ValueType::U32
    } else {
        ValueType::U64
    }
}

/// Narrowest signed type that can hold `n` (`n` may be negative).
pub fn narrowest_signed(n: i64) -> ValueType {
    if n >= i8::MIN as i64 && n <= i8::MAX as i64 {
        ValueType::I8
    } else if n >= i16::MIN as i64 && n <= i16::MAX as i64 {
        ValueType::I16
    } else if n >= i32::MIN as i64 && n <= i32::MAX as i64 {
        ValueType::I32
    } else {
        ValueType::I64
    }
}

/// Widen `a` and `b` to the narrowest common type under the join lattice
/// described in §4.2: signed widens only to larger signed, unsigned widens
/// only to larger unsigned, and any signed/unsigned mix or any appearance
/// of `F32` widens the whole array to `F32`. `Null` is absorbing-identity:
/// it never changes the running join (callers must skip null elements
/// when seeding/walking, per §4.2's "first non-null element" rule).
pub fn widen(a: ValueType, b: ValueType) -> ValueType {
    use ValueType::*;
    if a == b {
        return a;
    }
    match (a, b) {
        (F32, _) | (_, F32) => F32,
        (Null, other) | (other, Null) => other,
        (x, y) if x.is_signed() && y.is_signed() => {
            if x.ordinal() >= y.ordinal() {
                x
            } else {
                y
            }
        }
        (x, y) if x.is_unsigned() && y.is_unsigned() => {
            if x.ordinal() >= y.ordinal() {
                x
            } else {
                y
            }
        }
        // Mixed signed/unsigned numerics: once a negative value has forced
        // a signed type, any unsigned sibling must also go through signed.
        // Escalate to the signed type wide enough to hold the unsigned one.
        (x, y) if x.is_signed() && y.is_unsigned() => widen_mixed(x, y),
        (x, y) if x.is_unsigned() && y.is_signed() => widen_mixed(y, x),
        _ => F32,
    }
}

fn widen_mixed(signed: ValueType, unsigned: ValueType) -> ValueType {
    use ValueType::*;
    // Narrowest signed type that can represent every value the unsigned
    // type can hold, then widened again against the existing signed type.
    let unsigned_ceiling = match unsigned {
        U8 => I16,
        U16 => I32,
        U32 => I64,
        U64 => F32, // no signed integer type holds all of u64; fall back to float.
        _ => F32,
    };
    if unsigned_ceiling == F32 || signed == F32 {
        F32
    } else if signed.ordinal() >= unsigned_ceiling.ordinal() {
        signed
    } else {
        unsigned_ceiling
    }
}

/// The reserved sentinel bit pattern for a numeric/bool/string null, per §3
/// and the "Numeric null sentinels" design note (§9): the maximum of the
/// range for unsigned types, `INT*_MAX` for signed types, `NaN` for float,
/// id `0` for string, and `0x7F` for bool (deliberately the same bit
/// pattern as the `i8` sentinel — preserved per the open-question decision
/// recorded in DESIGN.md).
pub struct Sentinel;

impl Sentinel {
    pub const BOOL: u8 = 0x7F;
    pub const I8: i8 = i8::MAX;
    pub const I16: i16 = i16::MAX;
    pub const I32: i32 = i32::MAX;
    pub const I64: i64 = i64::MAX;
    pub const U8: u8 = u8::MAX;
    pub const U16: u16 = u16::MAX;
    pub const U32: u32 = u32::MAX;
    pub const U64: u64 = u64::MAX;
    pub const STRING_ID: u64 = 0;

    pub fn f32_is_null(v: f32) -> bool {
        v.is_nan()
    }

    pub const F32_NULL: f32 = f32::NAN;
}

/// Total order used when sorting numeric values for the read-optimized
/// sort pass (§4.4). Floats sort with `NaN` (the sentinel) last, matching
/// `f32::total_cmp`'s treatment, which is what "ascending, nulls sort with
/// the rest of the column" requires without panicking on `PartialOrd`.
pub fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowest_unsigned_boundaries() {
        assert_eq!(narrowest_unsigned(0), ValueType::U8);
        assert_eq!(narrowest_unsigned(255), ValueType::U8);
        assert_eq!(narrowest_unsigned(256), ValueType::U16);
        assert_eq!(narrowest_unsigned(u32::MAX as u64 - 1), ValueType::U32);
        assert_eq!(narrowest_unsigned(u32::MAX as u64), ValueType::U32);
        assert_eq!(narrowest_unsigned(u32::MAX as u64 + 1), ValueType::U64);
    }

    #[test]
    fn narrowest_signed_boundaries() {
        assert_eq!(narrowest_signed(-2), ValueType::I8);
        assert_eq!(narrowest_signed(1), ValueType::I8);
        assert_eq!(narrowest_signed(i8::MIN as i64 - 1), ValueType::I16);
    }

    #[test]
    fn widen_numeric_once_float_seen_stays_float() {
        assert_eq!(widen(ValueType::U8, ValueType::F32), ValueType::F32);
        assert_eq!(widen(ValueType::F32, ValueType::I8), ValueType::F32);
    }

    #[test]
    fn widen_signed_widens_to_larger_signed() {
        assert_eq!(widen(ValueType::I8, ValueType::I16), ValueType::I16);
        assert_eq!(widen(ValueType::I16, ValueType::I8), ValueType::I16);
    }

    #[test]
    fn widen_null_is_identity() {
        assert_eq!(widen(ValueType::Null, ValueType::U16), ValueType::U16);
        assert_eq!(widen(ValueType::U16, ValueType::Null), ValueType::U16);
    }

    #[test]
    fn bool_sentinel_matches_i8_sentinel() {
        assert_eq!(Sentinel::BOOL, Sentinel::I8 as u8);
    }
}
