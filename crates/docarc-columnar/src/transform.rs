//! The columnar transform (§4.3, C4): pivots a `DocObject` into a
//! `ColumnDoc`, interning every key and string scalar along the way.

use docarc_dict::Dictionary;
use docarc_doc::doc::{DocObject, Entry, EntryValues, Scalar};

use crate::columndoc::{ColumnDoc, ColumnEntry, WireScalar};
use crate::error::Result;

/// Walks `doc` once, collecting every string that the transform will need
/// an id for (§4.3.1): every key at every depth, and every string-typed
/// scalar value (bare, inside an array, or nested through object/object
/// arrays). Duplicates are left in; the dictionary collapses them.
pub fn collect_strings<'a>(doc: &'a DocObject, out: &mut Vec<&'a str>) {
    for entry in &doc.entries {
        out.push(entry.key.as_str());
        collect_value_strings(&entry.values, out);
    }
}

fn collect_value_strings<'a>(values: &'a EntryValues, out: &mut Vec<&'a str>) {
    match values {
        EntryValues::Empty | EntryValues::NullArray(_) => {}
        EntryValues::Scalar(Scalar::String(Some(s))) => out.push(s.as_str()),
        EntryValues::Scalar(_) => {}
        EntryValues::ScalarArray(vals) => {
            for v in vals {
                if let Scalar::String(Some(s)) = v {
                    out.push(s.as_str());
                }
            }
        }
        EntryValues::Object(obj) => collect_strings(obj, out),
        EntryValues::ObjectArray(objs) => {
            for o in objs {
                collect_strings(o, out);
            }
        }
    }
}

/// Preregisters every string `doc` will need (§4.3.1), so the later
/// `locate_fast` calls the transform makes are safe. `nthreads` is passed
/// straight through to `Dictionary::insert` as its parallelism hint.
pub fn preregister(doc: &DocObject, dict: &dyn Dictionary, nthreads: usize) -> Result<()> {
    let mut strings = Vec::new();
    collect_strings(doc, &mut strings);
    dict.insert(&strings, nthreads)?;
    Ok(())
}

fn intern_one(dict: &dyn Dictionary, s: &str) -> u64 {
    dict.locate_fast(&[s])[0]
}

/// Runs the columnar transform (C4) over an already-preregistered `doc`.
pub fn to_columndoc(doc: &DocObject, dict: &dyn Dictionary) -> Result<ColumnDoc> {
    tracing::debug!(n_entries = doc.entries.len(), "pivoting document into columnar form");
    let mut out = ColumnDoc::default();
    for entry in &doc.entries {
        transform_entry(entry, &mut out, dict)?;
    }
    Ok(out)
}

fn transform_entry(entry: &Entry, out: &mut ColumnDoc, dict: &dyn Dictionary) -> Result<()> {
    let kid = intern_one(dict, &entry.key);
    match &entry.values {
        EntryValues::Empty => out.null_keys.push(kid),

        EntryValues::Scalar(s) => {
            let wire = WireScalar::from_doc_scalar(s, dict);
            let col = out.scalar_column(wire.value_type());
            col.keys.push(kid);
            col.vals.push(wire);
        }

        EntryValues::Object(obj) => {
            let nested = to_columndoc(obj, dict)?;
            out.objects.push((kid, nested));
        }

        EntryValues::NullArray(_) => {
            // §4.5: null arrays carry only a count; that count already
            // lives on the doc entry (`values.len()` via `NullArray`), so
            // the pivot only needs to remember which key it belongs to —
            // same shape as any other array type, zero-length vals.
            let col = out.array_column(docarc_core::value::ValueType::Null);
            col.keys.push(kid);
            col.vals.push(Vec::new());
        }

        EntryValues::ScalarArray(vals) => {
            let ty = entry.ty;
            let wire: Vec<WireScalar> = vals.iter().map(|s| WireScalar::from_doc_scalar(s, dict)).collect();
            let col = out.array_column(ty);
            col.keys.push(kid);
            col.vals.push(wire);
        }

        EntryValues::ObjectArray(elements) => {
            let group = out.object_array_group(kid, elements.len());
            for (i, element) in elements.iter().enumerate() {
                for nested_entry in &element.entries {
                    let nkid = intern_one(dict, &nested_entry.key);
                    let column = group.column(nkid, nested_entry.ty);
                    let contributed = lower_entry_values(&nested_entry.values, dict)?;
                    column.positions.push(i as u32);
                    column.entries.push(contributed);
                }
            }
        }
    }
    Ok(())
}

/// Lowers one nested entry's values into the column-entry payload stored
/// per occurrence inside an object-array column (§4.3's innermost case:
/// "push `nvalues` as a new inner sequence into `values`... when
/// `ntype == object`, recurse into each nested-object").
fn lower_entry_values(values: &EntryValues, dict: &dyn Dictionary) -> Result<ColumnEntry> {
    Ok(match values {
        EntryValues::Empty => ColumnEntry::Scalars(Vec::new()),
        EntryValues::NullArray(n) => ColumnEntry::Nulls(*n),
        EntryValues::Scalar(s) => ColumnEntry::Scalars(vec![WireScalar::from_doc_scalar(s, dict)]),
        EntryValues::ScalarArray(vals) => {
            ColumnEntry::Scalars(vals.iter().map(|s| WireScalar::from_doc_scalar(s, dict)).collect())
        }
        EntryValues::Object(obj) => ColumnEntry::Objects(vec![to_columndoc(obj, dict)?]),
        EntryValues::ObjectArray(objs) => {
            let mut docs = Vec::with_capacity(objs.len());
            for o in objs {
                docs.push(to_columndoc(o, dict)?);
            }
            ColumnEntry::Objects(docs)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docarc_dict::StringDictionary;

    fn doc_from(json: serde_json::Value) -> DocObject {
        docarc_doc::from_json::from_json(&json).unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn scalar_entries_group_by_type() {
        let doc = doc_from(serde_json::json!({"a": 1, "b": 2, "c": "x"}));
        let dict = StringDictionary::new();
        preregister(&doc, &dict, 1).unwrap();
        let col = to_columndoc(&doc, &dict).unwrap();
        let u8col = col.scalars.get(&docarc_core::value::ValueType::U8).unwrap();
        assert_eq!(u8col.keys.len(), 2);
        let strcol = col.scalars.get(&docarc_core::value::ValueType::String).unwrap();
        assert_eq!(strcol.keys.len(), 1);
    }

    #[test]
    fn empty_entry_becomes_null_key() {
        let doc = doc_from(serde_json::json!({"a": null}));
        let dict = StringDictionary::new();
        preregister(&doc, &dict, 1).unwrap();
        let col = to_columndoc(&doc, &dict).unwrap();
        assert_eq!(col.null_keys.len(), 1);
    }

    #[test]
    fn object_array_groups_columns_by_nested_key_and_type() {
        let doc = doc_from(serde_json::json!({
            "items": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]
        }));
        let dict = StringDictionary::new();
        preregister(&doc, &dict, 1).unwrap();
        let col = to_columndoc(&doc, &dict).unwrap();
        assert_eq!(col.object_arrays.len(), 1);
        let group = &col.object_arrays[0];
        assert_eq!(group.columns.len(), 2);
        for c in &group.columns {
            assert_eq!(c.positions, vec![0, 1]);
            assert_eq!(c.entries.len(), 2);
        }
    }

    #[test]
    fn object_array_group_counts_elements_that_contribute_no_column() {
        // The trailing `{}` contributes no column entries at all, but it's
        // still a source array element and must be reflected in the
        // group's element count (§8 scenario 3, §4.5's per-element oids).
        let doc = doc_from(serde_json::json!({"items": [{"k": 1}, {}]}));
        let dict = StringDictionary::new();
        preregister(&doc, &dict, 1).unwrap();
        let col = to_columndoc(&doc, &dict).unwrap();
        let group = &col.object_arrays[0];
        assert_eq!(group.num_elements, 2);
        assert_eq!(group.columns.len(), 1);
        assert_eq!(group.columns[0].positions, vec![0]);
    }

    #[test]
    fn nested_single_object_recurses() {
        let doc = doc_from(serde_json::json!({"meta": {"k": 1}}));
        let dict = StringDictionary::new();
        preregister(&doc, &dict, 1).unwrap();
        let col = to_columndoc(&doc, &dict).unwrap();
        assert_eq!(col.objects.len(), 1);
        assert!(col.objects[0].1.scalars.contains_key(&docarc_core::value::ValueType::U8));
    }
}
