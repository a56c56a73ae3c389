//! §4.2's array-shape validator, exercised through `from_json` directly
//! (the same walk `docarc validate` runs without building an archive).

use docarc::doc::error::Error;
use docarc::prelude::*;

#[test]
fn array_of_arrays_fails() {
    let err = from_json(&serde_json::json!({"a": [[1, 2], [3, 4]]})).unwrap_err();
    assert!(matches!(err, Error::ArrayOfArrays { .. }));
}

#[test]
fn array_of_mixed_non_numeric_types_fails() {
    let err = from_json(&serde_json::json!({"a": [1, "x"]})).unwrap_err();
    assert!(matches!(err, Error::ArrayOfMixedTypes { .. }));
}

#[test]
fn array_mixing_objects_and_strings_fails() {
    let err = from_json(&serde_json::json!({"a": [{"k": 1}, "x"]})).unwrap_err();
    assert!(matches!(err, Error::ArrayOfMixedTypes { .. }));
}

#[test]
fn top_level_scalar_fails_jsontype() {
    let err = from_json(&serde_json::json!("just a string")).unwrap_err();
    assert!(matches!(err, Error::JsonType { .. }));
}

#[test]
fn null_mixed_with_numerics_is_allowed() {
    let docs = from_json(&serde_json::json!({"a": [1, null, 3]})).unwrap();
    assert_eq!(docs.len(), 1);
}

#[test]
fn bool_true_and_false_are_the_same_type() {
    let docs = from_json(&serde_json::json!({"a": [true, false, true]})).unwrap();
    let entry = &docs[0].entries[0];
    assert_eq!(entry.ty, ValueType::Bool);
}
