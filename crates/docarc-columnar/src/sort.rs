//! The read-optimized sort pass (§4.4, C5), run only when the caller asks
//! for it. Mutates a `ColumnDoc` tree in place.

use std::cmp::Ordering;

use docarc_core::value::cmp_f32;
use docarc_dict::Dictionary;

use crate::columndoc::{ArrayColumn, ColumnDoc, ColumnEntry, ObjectArrayColumn, ObjectArrayGroup, ScalarColumn, WireScalar};

/// Sorts every level of `doc` in place, per §4.4.
pub fn sort_columndoc(doc: &mut ColumnDoc, dict: &dyn Dictionary) {
    tracing::debug!(
        n_scalar_types = doc.scalars.len(),
        n_array_types = doc.arrays.len(),
        n_object_array_groups = doc.object_arrays.len(),
        "running read-optimized sort pass"
    );
    for col in doc.scalars.values_mut() {
        sort_scalar_column(col, dict);
    }
    for col in doc.arrays.values_mut() {
        sort_array_column(col, dict);
    }
    sort_object_array_groups(&mut doc.object_arrays, dict);
    for (_, nested) in doc.objects.iter_mut() {
        sort_columndoc(nested, dict);
    }
    for group in doc.object_arrays.iter_mut() {
        for col in group.columns.iter_mut() {
            for entry in col.entries.iter_mut() {
                if let ColumnEntry::Objects(docs) = entry {
                    for d in docs.iter_mut() {
                        sort_columndoc(d, dict);
                    }
                }
            }
        }
    }
}

/// §4.4: sorts `(keys, vals)` by the *decoded key string*, per the
/// resolved ambiguity recorded in `SPEC_FULL.md` (matches scenario 6,
/// not the by-value reading the paragraph's prose literally suggests).
fn sort_scalar_column(col: &mut ScalarColumn, dict: &dyn Dictionary) {
    let decoded = dict.extract(&col.keys);
    let mut order: Vec<usize> = (0..col.keys.len()).collect();
    order.sort_by(|&a, &b| decoded[a].cmp(&decoded[b]));
    apply_permutation(&mut col.keys, &order);
    apply_permutation(&mut col.vals, &order);
}

/// §4.4: sorts `(array_keys, array_vals)` by an elementwise-≤ predicate
/// over `array_vals`, which is explicitly NOT a total order; reproduced
/// faithfully with a stable insertion sort over the permutation.
fn sort_array_column(col: &mut ArrayColumn, dict: &dyn Dictionary) {
    let n = col.keys.len();
    let le = |i: usize, j: usize| elementwise_le(&col.vals[i], &col.vals[j], dict);
    let order = argsort_stable_le(n, le);
    apply_permutation(&mut col.keys, &order);
    apply_permutation(&mut col.vals, &order);
}

fn sort_object_array_groups(groups: &mut [ObjectArrayGroup], dict: &dyn Dictionary) {
    let outer_keys: Vec<u64> = groups.iter().map(|g| g.outer_key).collect();
    let decoded = dict.extract(&outer_keys);
    groups.sort_by(|a, b| {
        let ai = outer_keys.iter().position(|k| *k == a.outer_key).unwrap();
        let bi = outer_keys.iter().position(|k| *k == b.outer_key).unwrap();
        decoded[ai].cmp(&decoded[bi])
    });

    for group in groups.iter_mut() {
        sort_object_array_group(group, dict);
    }
}

fn sort_object_array_group(group: &mut ObjectArrayGroup, dict: &dyn Dictionary) {
    let keys: Vec<u64> = group.columns.iter().map(|c| c.nested_key).collect();
    let decoded = dict.extract(&keys);
    let mut order: Vec<usize> = (0..group.columns.len()).collect();
    order.sort_by(|&a, &b| {
        decoded[a]
            .cmp(&decoded[b])
            .then_with(|| group.columns[a].nested_type.ordinal().cmp(&group.columns[b].nested_type.ordinal()))
    });
    apply_permutation(&mut group.columns, &order);

    for col in group.columns.iter_mut() {
        sort_object_array_column(col, dict);
    }
}

/// Within a column, `(array_positions, values)` sort jointly by the
/// values' elementwise-≤ predicate. `Objects`/`Nulls` entries have no
/// defined elementwise order (the spec only gives one for scalar
/// sequences); they compare equal in both directions, which keeps the
/// insertion sort's stability and leaves their relative order untouched.
fn sort_object_array_column(col: &mut ObjectArrayColumn, dict: &dyn Dictionary) {
    let n = col.positions.len();
    let le = |i: usize, j: usize| column_entry_le(&col.entries[i], &col.entries[j], dict);
    let order = argsort_stable_le(n, le);
    apply_permutation(&mut col.positions, &order);
    apply_permutation(&mut col.entries, &order);
}

fn column_entry_le(a: &ColumnEntry, b: &ColumnEntry, dict: &dyn Dictionary) -> bool {
    match (a, b) {
        (ColumnEntry::Scalars(x), ColumnEntry::Scalars(y)) => elementwise_le(x, y, dict),
        _ => true,
    }
}

fn elementwise_le(a: &[WireScalar], b: &[WireScalar], dict: &dyn Dictionary) -> bool {
    for i in 0..a.len().min(b.len()) {
        if cmp_wire(&a[i], &b[i], dict) == Ordering::Greater {
            return false;
        }
    }
    true
}

fn cmp_wire(a: &WireScalar, b: &WireScalar, dict: &dyn Dictionary) -> Ordering {
    use WireScalar::*;
    match (a, b) {
        (Bool(x), Bool(y)) => x.cmp(y),
        (I8(x), I8(y)) => x.cmp(y),
        (I16(x), I16(y)) => x.cmp(y),
        (I32(x), I32(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (U8(x), U8(y)) => x.cmp(y),
        (U16(x), U16(y)) => x.cmp(y),
        (U32(x), U32(y)) => x.cmp(y),
        (U64(x), U64(y)) => x.cmp(y),
        (F32(x), F32(y)) => cmp_f32(*x, *y),
        (StringId(x), StringId(y)) => decode_string_id(*x, dict).cmp(&decode_string_id(*y, dict)),
        _ => Ordering::Equal,
    }
}

fn decode_string_id(id: u64, dict: &dyn Dictionary) -> String {
    if id == docarc_dict::NULL_STRING_ID {
        String::new()
    } else {
        dict.extract(&[id]).into_iter().next().unwrap_or_default()
    }
}

/// Stable indirect sort over `0..n` using a `le(i, j)` predicate that need
/// not define a total order (§4.4's array-value predicate is explicitly
/// not one). Reproduces the original's insertion-sort-over-a-permutation
/// approach rather than requiring the `Ord`-shaped comparator Rust's
/// library sorts need.
fn argsort_stable_le(n: usize, le: impl Fn(usize, usize) -> bool) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    for i in 1..n {
        let mut j = i;
        while j > 0 && !le(perm[j - 1], perm[j]) {
            perm.swap(j - 1, j);
            j -= 1;
        }
    }
    perm
}

fn apply_permutation<T: Clone>(v: &mut Vec<T>, order: &[usize]) {
    let src = v.clone();
    for (dst, &i) in v.iter_mut().zip(order) {
        *dst = src[i].clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docarc_core::value::ValueType;
    use docarc_dict::StringDictionary;

    #[test]
    fn scalar_column_sorts_by_decoded_key() {
        let dict = StringDictionary::new();
        let ids = dict.insert(&["z", "a"], 1).unwrap();
        let mut col = ScalarColumn { keys: vec![ids[0], ids[1]], vals: vec![WireScalar::U8(1), WireScalar::U8(2)] };
        sort_scalar_column(&mut col, &dict);
        assert_eq!(dict.extract(&col.keys), vec!["a", "z"]);
        assert_eq!(col.vals, vec![WireScalar::U8(2), WireScalar::U8(1)]);
    }

    #[test]
    fn array_column_sorts_by_elementwise_values() {
        let dict = StringDictionary::new();
        let ids = dict.insert(&["x", "y"], 1).unwrap();
        let mut col = ArrayColumn {
            keys: vec![ids[0], ids[1]],
            vals: vec![vec![WireScalar::U8(5), WireScalar::U8(5)], vec![WireScalar::U8(1), WireScalar::U8(9)]],
        };
        sort_array_column(&mut col, &dict);
        assert_eq!(col.vals[0], vec![WireScalar::U8(1), WireScalar::U8(9)]);
    }

    #[test]
    fn object_array_groups_sort_by_outer_key_then_column_identity() {
        let dict = StringDictionary::new();
        let ids = dict.insert(&["zeta", "alpha", "name", "id"], 1).unwrap();
        let mut groups = vec![
            ObjectArrayGroup {
                outer_key: ids[0],
                num_elements: 1,
                columns: vec![ObjectArrayColumn {
                    nested_key: ids[2],
                    nested_type: ValueType::String,
                    positions: vec![0],
                    entries: vec![ColumnEntry::Scalars(vec![WireScalar::StringId(0)])],
                }],
            },
            ObjectArrayGroup {
                outer_key: ids[1],
                num_elements: 1,
                columns: vec![ObjectArrayColumn {
                    nested_key: ids[3],
                    nested_type: ValueType::U8,
                    positions: vec![0],
                    entries: vec![ColumnEntry::Scalars(vec![WireScalar::U8(1)])],
                }],
            },
        ];
        sort_object_array_groups(&mut groups, &dict);
        assert_eq!(dict.extract(&[groups[0].outer_key]), vec!["alpha"]);
    }
}
