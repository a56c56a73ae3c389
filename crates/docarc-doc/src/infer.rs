//! Type inference (§4.2, C3): narrowest scalar type selection, the array
//! join lattice, and the sentinel-collision widening from §9.

use docarc_core::value::{narrowest_signed, narrowest_unsigned, widen, Sentinel, ValueType};

use crate::doc::Scalar;

/// An unrounded numeric reading of a JSON number, carried until the
/// array's final joined type is known so widening/casting happens once.
#[derive(Debug, Clone, Copy)]
pub enum RawNumeric {
    U(u64),
    I(i64),
    F(f32),
}

/// Infers the narrowest type for a single JSON number, per the table in §4.2.
pub fn infer_number(n: &serde_json::Number) -> (ValueType, RawNumeric) {
    if let Some(u) = n.as_u64() {
        (narrowest_unsigned(u), RawNumeric::U(u))
    } else if let Some(i) = n.as_i64() {
        (narrowest_signed(i), RawNumeric::I(i))
    } else {
        let f = n.as_f64().unwrap_or(0.0) as f32;
        (ValueType::F32, RawNumeric::F(f))
    }
}

fn raw_as_i128(raw: RawNumeric) -> i128 {
    match raw {
        RawNumeric::U(v) => v as i128,
        RawNumeric::I(v) => v as i128,
        RawNumeric::F(v) => v as i128,
    }
}

fn sentinel_as_i128(ty: ValueType) -> Option<i128> {
    match ty {
        ValueType::U8 => Some(Sentinel::U8 as i128),
        ValueType::U16 => Some(Sentinel::U16 as i128),
        ValueType::U32 => Some(Sentinel::U32 as i128),
        ValueType::U64 => Some(Sentinel::U64 as i128),
        ValueType::I8 => Some(Sentinel::I8 as i128),
        ValueType::I16 => Some(Sentinel::I16 as i128),
        ValueType::I32 => Some(Sentinel::I32 as i128),
        ValueType::I64 => Some(Sentinel::I64 as i128),
        _ => None,
    }
}

fn widen_one_step(ty: ValueType) -> ValueType {
    match ty {
        ValueType::U8 => ValueType::U16,
        ValueType::U16 => ValueType::U32,
        ValueType::U32 => ValueType::U64,
        ValueType::U64 => ValueType::F32,
        ValueType::I8 => ValueType::I16,
        ValueType::I16 => ValueType::I32,
        ValueType::I32 => ValueType::I64,
        ValueType::I64 => ValueType::F32,
        other => other,
    }
}

/// Narrowest signed type able to hold `v`, falling back to `F32` when `v`
/// doesn't fit any signed integer type (e.g. a `u64` reading past
/// `i64::MAX` forced into the signed branch by a negative sibling).
fn narrowest_signed_for_value(v: i128) -> ValueType {
    if v < i64::MIN as i128 || v > i64::MAX as i128 {
        ValueType::F32
    } else {
        narrowest_signed(v as i64)
    }
}

/// Joins the element types of a numeric array (nulls excluded from the
/// join, per §4.2: "the scan finds the first non-null element to seed the
/// type, then walks again to widen"), then — only if the array actually
/// contains a null element that will need encoding as a sentinel — widens
/// further until no real value's bit pattern collides with the chosen
/// type's sentinel (§9's "Numeric null sentinels" note).
///
/// `elements` pairs each raw reading with whether the source element was
/// `null` (`None` for null, `Some(reading)` otherwise).
///
/// A plain type-only fold (`reduce(widen)` over each element's own
/// inferred type) over-widens once the array mixes signed and unsigned
/// element types: `widen`'s signed/unsigned case has no access to the
/// actual values, so it must assume the unsigned side could be as large
/// as its type's maximum and escalate to a wider signed type than the
/// real values need (e.g. `[1, -2, 3]` would join to `i16` instead of
/// `i8`). Once any element is negative — forcing the whole array
/// signed — this re-narrows every real value under that signedness via
/// `narrowest_signed_for_value` before folding, so the join reflects what
/// the values actually need rather than the unsigned type's ceiling.
pub fn join_numeric_array(elements: &[Option<(ValueType, RawNumeric)>]) -> ValueType {
    let present: Vec<(ValueType, RawNumeric)> = elements.iter().flatten().copied().collect();

    let mut ty = if present.iter().any(|(t, _)| *t == ValueType::F32) {
        ValueType::F32
    } else if present.iter().any(|(t, _)| t.is_signed()) {
        present
            .iter()
            .map(|(_, raw)| narrowest_signed_for_value(raw_as_i128(*raw)))
            .reduce(widen)
            .unwrap_or(ValueType::I8)
    } else {
        present
            .iter()
            .map(|(t, _)| *t)
            .reduce(widen)
            .unwrap_or(ValueType::U8)
    };

    let has_null = elements.iter().any(|e| e.is_none());
    if !has_null {
        return ty;
    }

    loop {
        let Some(sentinel) = sentinel_as_i128(ty) else {
            break; // F32's sentinel is NaN; finite real values can't collide.
        };
        let collides = elements
            .iter()
            .flatten()
            .any(|(_, raw)| raw_as_i128(*raw) == sentinel);
        if !collides {
            break;
        }
        ty = widen_one_step(ty);
    }
    ty
}

/// Casts a raw numeric reading (or `None` for a null slot) into the
/// array's final joined type, producing the sentinel bit pattern for null
/// slots.
pub fn cast_numeric(ty: ValueType, raw: Option<RawNumeric>) -> Scalar {
    match (ty, raw) {
        (ValueType::U8, Some(r)) => Scalar::U8(raw_u64(r) as u8),
        (ValueType::U8, None) => Scalar::U8(Sentinel::U8),
        (ValueType::U16, Some(r)) => Scalar::U16(raw_u64(r) as u16),
        (ValueType::U16, None) => Scalar::U16(Sentinel::U16),
        (ValueType::U32, Some(r)) => Scalar::U32(raw_u64(r) as u32),
        (ValueType::U32, None) => Scalar::U32(Sentinel::U32),
        (ValueType::U64, Some(r)) => Scalar::U64(raw_u64(r)),
        (ValueType::U64, None) => Scalar::U64(Sentinel::U64),
        (ValueType::I8, Some(r)) => Scalar::I8(raw_i64(r) as i8),
        (ValueType::I8, None) => Scalar::I8(Sentinel::I8),
        (ValueType::I16, Some(r)) => Scalar::I16(raw_i64(r) as i16),
        (ValueType::I16, None) => Scalar::I16(Sentinel::I16),
        (ValueType::I32, Some(r)) => Scalar::I32(raw_i64(r) as i32),
        (ValueType::I32, None) => Scalar::I32(Sentinel::I32),
        (ValueType::I64, Some(r)) => Scalar::I64(raw_i64(r)),
        (ValueType::I64, None) => Scalar::I64(Sentinel::I64),
        (ValueType::F32, Some(r)) => Scalar::F32(raw_f32(r)),
        (ValueType::F32, None) => Scalar::F32(Sentinel::F32_NULL),
        (other, _) => unreachable!("cast_numeric called with non-numeric type {other:?}"),
    }
}

fn raw_u64(raw: RawNumeric) -> u64 {
    match raw {
        RawNumeric::U(v) => v,
        RawNumeric::I(v) => v as u64,
        RawNumeric::F(v) => v as u64,
    }
}

fn raw_i64(raw: RawNumeric) -> i64 {
    match raw {
        RawNumeric::U(v) => v as i64,
        RawNumeric::I(v) => v,
        RawNumeric::F(v) => v as i64,
    }
}

fn raw_f32(raw: RawNumeric) -> f32 {
    match raw {
        RawNumeric::U(v) => v as f32,
        RawNumeric::I(v) => v as f32,
        RawNumeric::F(v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_signed_seeds_then_widens() {
        // [1, -2, 3]: first non-null is 1 (U8), then -2 forces signed widening.
        let one = infer_number(&serde_json::Number::from(1));
        let neg_two = infer_number(&serde_json::Number::from(-2));
        let three = infer_number(&serde_json::Number::from(3));
        let elements = vec![Some(one), Some(neg_two), Some(three)];
        let ty = join_numeric_array(&elements);
        assert_eq!(ty, ValueType::I8);
    }

    #[test]
    fn u32_boundary_without_nulls_stays_narrow() {
        let v = infer_number(&serde_json::Number::from(u32::MAX as u64));
        let ty = join_numeric_array(&[Some(v)]);
        assert_eq!(ty, ValueType::U32);
    }

    #[test]
    fn u32_boundary_with_null_sibling_widens_to_avoid_sentinel_collision() {
        let v = infer_number(&serde_json::Number::from(u32::MAX as u64));
        let ty = join_numeric_array(&[Some(v), None]);
        assert_eq!(ty, ValueType::U64);
    }

    #[test]
    fn crossing_u32_max_plus_one_widens_to_u64() {
        let below = infer_number(&serde_json::Number::from(u32::MAX as u64));
        let above = infer_number(&serde_json::Number::from(u32::MAX as u64 + 1));
        let ty = join_numeric_array(&[Some(below), Some(above)]);
        assert_eq!(ty, ValueType::U64);
    }
}
