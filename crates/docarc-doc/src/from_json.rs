//! Builds a [`DocObject`] forest from a `serde_json::Value`, performing
//! type inference and the array-shape validator in the same walk (§4.2.1).

use docarc_core::value::ValueType;
use serde_json::Value;

use crate::doc::{DocObject, Entry, EntryValues, Scalar};
use crate::error::{Error, Result};
use crate::infer::{cast_numeric, infer_number, join_numeric_array};

/// Parses top-level JSON into one `DocObject` per record (§4.2: "Top-level
/// JSON may be an object or an array of objects").
pub fn from_json(value: &Value) -> Result<Vec<DocObject>> {
    match value {
        Value::Object(map) => Ok(vec![build_object(map, "")?]),
        Value::Array(elements) => elements
            .iter()
            .enumerate()
            .map(|(i, e)| match e {
                Value::Object(map) => build_object(map, &format!("/{i}")),
                other => Err(Error::JsonType { found: kind_name(other) }),
            })
            .collect(),
        other => Err(Error::JsonType { found: kind_name(other) }),
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn build_object(map: &serde_json::Map<String, Value>, pointer: &str) -> Result<DocObject> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        entries.push(build_entry(key, value, &format!("{pointer}/{key}"))?);
    }
    Ok(DocObject { entries })
}

fn build_entry(key: &str, value: &Value, pointer: &str) -> Result<Entry> {
    let (ty, values) = match value {
        Value::Null => (ValueType::Null, EntryValues::Empty),
        Value::Bool(b) => (ValueType::Bool, EntryValues::Scalar(Scalar::Bool(*b as u8))),
        Value::Number(n) => {
            let (ty, raw) = infer_number(n);
            (ty, EntryValues::Scalar(cast_numeric(ty, Some(raw))))
        }
        Value::String(s) => (ValueType::String, EntryValues::Scalar(Scalar::String(Some(s.clone())))),
        Value::Object(map) => {
            let obj = build_object(map, pointer)?;
            (ValueType::Object, EntryValues::Object(Box::new(obj)))
        }
        Value::Array(elements) => return build_array_entry(key, elements, pointer),
    };
    Ok(Entry { key: key.to_string(), ty, values })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Bool,
    Numeric,
    String,
    Object,
}

fn classify(v: &Value) -> Option<Category> {
    match v {
        Value::Null => None,
        Value::Bool(_) => Some(Category::Bool),
        Value::Number(_) => Some(Category::Numeric),
        Value::String(_) => Some(Category::String),
        Value::Object(_) => Some(Category::Object),
        Value::Array(_) => unreachable!("arrays of arrays are rejected before classification"),
    }
}

fn build_array_entry(key: &str, elements: &[Value], pointer: &str) -> Result<Entry> {
    if elements.iter().any(|e| e.is_array()) {
        return Err(Error::ArrayOfArrays { pointer: pointer.to_string() });
    }

    if elements.is_empty() {
        return Ok(Entry { key: key.to_string(), ty: ValueType::Null, values: EntryValues::Empty });
    }

    let categories: Vec<Option<Category>> = elements.iter().map(classify).collect();
    let mut distinct: Vec<Category> = categories.iter().flatten().copied().collect();
    distinct.dedup_by_key(|c| *c);
    distinct.sort_by_key(|c| *c as u8);
    distinct.dedup();
    if distinct.len() > 1 {
        return Err(Error::ArrayOfMixedTypes {
            pointer: pointer.to_string(),
            detail: format!("array mixes {} incompatible value categories", distinct.len()),
        });
    }

    let values = match distinct.first() {
        None => {
            // every element is JSON null.
            if elements.len() == 1 {
                EntryValues::Empty
            } else {
                EntryValues::NullArray(elements.len())
            }
        }
        Some(Category::Object) => build_object_array(elements, pointer)?,
        Some(Category::Bool) => build_bool_array(elements),
        Some(Category::String) => build_string_array(elements),
        Some(Category::Numeric) => build_numeric_array(elements),
    };

    let ty = match distinct.first() {
        None => ValueType::Null,
        Some(Category::Object) => ValueType::Object,
        Some(Category::Bool) => ValueType::Bool,
        Some(Category::String) => ValueType::String,
        Some(Category::Numeric) => match &values {
            EntryValues::Scalar(s) => s.value_type(),
            EntryValues::ScalarArray(v) => v.first().map(Scalar::value_type).unwrap_or(ValueType::U8),
            _ => unreachable!(),
        },
    };

    Ok(Entry { key: key.to_string(), ty, values })
}

fn build_object_array(elements: &[Value], pointer: &str) -> Result<EntryValues> {
    if elements.len() == 1 {
        let obj = build_object(elements[0].as_object().expect("classified as Object"), pointer)?;
        return Ok(EntryValues::Object(Box::new(obj)));
    }
    let mut docs = Vec::with_capacity(elements.len());
    for e in elements {
        if e.is_null() {
            docs.push(DocObject::empty());
        } else {
            docs.push(build_object(e.as_object().expect("classified as Object"), pointer)?);
        }
    }
    Ok(EntryValues::ObjectArray(docs))
}

fn build_bool_array(elements: &[Value]) -> EntryValues {
    if elements.len() == 1 {
        let b = elements[0].as_bool().expect("classified as Bool");
        return EntryValues::Scalar(Scalar::Bool(b as u8));
    }
    let vals = elements
        .iter()
        .map(|e| match e {
            Value::Bool(b) => Scalar::Bool(*b as u8),
            Value::Null => Scalar::Bool(docarc_core::value::Sentinel::BOOL),
            _ => unreachable!("classified as Bool"),
        })
        .collect();
    EntryValues::ScalarArray(vals)
}

fn build_string_array(elements: &[Value]) -> EntryValues {
    if elements.len() == 1 {
        let s = elements[0].as_str().expect("classified as String");
        return EntryValues::Scalar(Scalar::String(Some(s.to_string())));
    }
    let vals = elements
        .iter()
        .map(|e| match e {
            Value::String(s) => Scalar::String(Some(s.clone())),
            Value::Null => Scalar::String(None),
            _ => unreachable!("classified as String"),
        })
        .collect();
    EntryValues::ScalarArray(vals)
}

fn build_numeric_array(elements: &[Value]) -> EntryValues {
    if elements.len() == 1 {
        let n = elements[0].as_number().expect("classified as Numeric");
        let (ty, raw) = infer_number(n);
        return EntryValues::Scalar(cast_numeric(ty, Some(raw)));
    }
    let readings: Vec<Option<_>> = elements
        .iter()
        .map(|e| match e {
            Value::Number(n) => Some(infer_number(n)),
            Value::Null => None,
            _ => unreachable!("classified as Numeric"),
        })
        .collect();
    let ty = join_numeric_array(&readings);
    let vals = readings.into_iter().map(|r| cast_numeric(ty, r.map(|(_, raw)| raw))).collect();
    EntryValues::ScalarArray(vals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_object_two_entries() {
        let docs = from_json(&json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(docs.len(), 1);
        let obj = &docs[0];
        assert_eq!(obj.entries.len(), 2);
        assert_eq!(obj.entries[0].ty, ValueType::U8);
        assert_eq!(obj.entries[1].ty, ValueType::String);
    }

    #[test]
    fn numeric_array_forces_signed_i8() {
        let docs = from_json(&json!({"xs": [1, -2, 3]})).unwrap();
        let entry = &docs[0].entries[0];
        assert_eq!(entry.ty, ValueType::I8);
        match &entry.values {
            EntryValues::ScalarArray(v) => {
                assert_eq!(v, &vec![Scalar::I8(1), Scalar::I8(-2), Scalar::I8(3)]);
            }
            other => panic!("expected scalar array, got {other:?}"),
        }
    }

    #[test]
    fn array_of_arrays_fails() {
        let err = from_json(&json!({"a": [[1, 2]]})).unwrap_err();
        assert!(matches!(err, Error::ArrayOfArrays { .. }));
    }

    #[test]
    fn array_of_mixed_types_fails() {
        let err = from_json(&json!({"a": [1, "x"]})).unwrap_err();
        assert!(matches!(err, Error::ArrayOfMixedTypes { .. }));
    }

    #[test]
    fn top_level_array_of_objects_becomes_sibling_records() {
        let docs = from_json(&json!([{"a": 1}, {"a": 2}])).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn top_level_scalar_fails_jsontype() {
        let err = from_json(&json!(42)).unwrap_err();
        assert!(matches!(err, Error::JsonType { .. }));
    }

    #[test]
    fn empty_object_has_no_entries() {
        let docs = from_json(&json!({})).unwrap();
        assert!(docs[0].entries.is_empty());
    }

    #[test]
    fn all_null_array_becomes_null_array_with_count() {
        let docs = from_json(&json!({"a": [null, null, null]})).unwrap();
        assert_eq!(docs[0].entries[0].values, EntryValues::NullArray(3));
    }

    #[test]
    fn empty_string_is_distinguishable_from_null() {
        let docs = from_json(&json!({"a": ""})).unwrap();
        match &docs[0].entries[0].values {
            EntryValues::Scalar(Scalar::String(Some(s))) => assert_eq!(s, ""),
            other => panic!("expected empty string scalar, got {other:?}"),
        }
    }
}
