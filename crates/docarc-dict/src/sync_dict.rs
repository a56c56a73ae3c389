//! The sync string dictionary (§4.1): a single spinlock-guarded slot table
//! plus an exact hash index, fronted by a probabilistic pre-filter.

use std::collections::HashMap;

use crate::error::Result;
use crate::filter::ProbabilisticFilter;
use crate::spinlock::Spinlock;
use crate::{Dictionary, LocateResult, NULL_STRING_ID};

struct Inner {
    /// `contents[slot]` is `Some(string)` for in-use slots, `None` for free
    /// ones. Kept as a `Vec` (not a `HashMap<u32, String>`) so growth is a
    /// simple zero-initialized extension, matching the "sorted grow" note.
    contents: Vec<Option<String>>,
    freelist: Vec<u32>,
    /// Exact string -> slot index, consulted only when the probabilistic
    /// filter reports "maybe seen".
    index: HashMap<String, u32>,
    num_distinct: usize,
}

impl Inner {
    fn new() -> Self {
        Inner {
            contents: Vec::new(),
            freelist: Vec::new(),
            index: HashMap::new(),
            num_distinct: 0,
        }
    }

    /// Grows `contents` by `n` zero-initialized (`None`) slots and extends
    /// the freelist with the new indices in ascending order, so repeated
    /// inserts during one batch reuse low slot numbers first ("sorted
    /// grow", §4.1).
    fn grow_by(&mut self, n: usize) {
        let start = self.contents.len();
        self.contents.resize(start + n, None);
        self.freelist.extend((start as u32)..(start + n) as u32);
    }

    fn allocate_slot(&mut self) -> u32 {
        if self.freelist.is_empty() {
            self.grow_by(1);
        }
        self.freelist.pop().expect("freelist replenished above")
    }

    fn publish(&mut self, value: &str) -> u32 {
        let slot = self.allocate_slot();
        self.contents[slot as usize] = Some(value.to_string());
        self.index.insert(value.to_string(), slot);
        self.num_distinct += 1;
        slot
    }
}

fn slot_to_id(slot: u32) -> u64 {
    slot as u64 + 1
}

fn id_to_slot(id: u64) -> Option<u32> {
    if id == NULL_STRING_ID {
        None
    } else {
        Some((id - 1) as u32)
    }
}

pub struct StringDictionary {
    inner: Spinlock<Inner>,
}

impl StringDictionary {
    pub fn new() -> Self {
        StringDictionary { inner: Spinlock::new(Inner::new()) }
    }
}

impl Default for StringDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary for StringDictionary {
    fn insert(&self, strings: &[&str], _nthreads: usize) -> Result<Vec<u64>> {
        let mut guard = self.inner.lock();
        guard.contents.reserve(strings.len());
        let mut filter = ProbabilisticFilter::new(strings.len());
        let mut ids = Vec::with_capacity(strings.len());

        for s in strings {
            let bytes = s.as_bytes();
            let id = if !filter.might_contain(bytes) {
                // Definitely new: skip the exact hash lookup entirely.
                let slot = guard.publish(s);
                filter.observe(bytes);
                slot_to_id(slot)
            } else if let Some(&slot) = guard.index.get(*s) {
                slot_to_id(slot)
            } else {
                // False positive from the filter: still not in the index.
                let slot = guard.publish(s);
                filter.observe(bytes);
                slot_to_id(slot)
            };
            ids.push(id);
        }
        Ok(ids)
    }

    fn remove(&self, ids: &[u64]) -> Result<()> {
        let mut guard = self.inner.lock();
        for &id in ids {
            let Some(slot) = id_to_slot(id) else {
                return Err(crate::Error::UnknownId(id));
            };
            match guard.contents.get_mut(slot as usize) {
                Some(entry @ Some(_)) => {
                    if let Some(s) = entry.take() {
                        guard.index.remove(&s);
                    }
                    guard.freelist.push(slot);
                    guard.num_distinct -= 1;
                }
                _ => return Err(crate::Error::UnknownId(id)),
            }
        }
        Ok(())
    }

    fn locate_safe(&self, keys: &[&str]) -> LocateResult {
        let guard = self.inner.lock();
        let mut ids = Vec::with_capacity(keys.len());
        let mut found = Vec::with_capacity(keys.len());
        let mut num_missing = 0;
        for k in keys {
            match guard.index.get(*k) {
                Some(&slot) => {
                    ids.push(slot_to_id(slot));
                    found.push(true);
                }
                None => {
                    ids.push(NULL_STRING_ID);
                    found.push(false);
                    num_missing += 1;
                }
            }
        }
        LocateResult { ids, found, num_missing }
    }

    fn locate_fast(&self, keys: &[&str]) -> Vec<u64> {
        let guard = self.inner.lock();
        keys.iter()
            .map(|k| guard.index.get(*k).map(|&slot| slot_to_id(slot)).unwrap_or(NULL_STRING_ID))
            .collect()
    }

    fn extract(&self, ids: &[u64]) -> Vec<String> {
        let guard = self.inner.lock();
        ids.iter()
            .map(|&id| {
                id_to_slot(id)
                    .and_then(|slot| guard.contents.get(slot as usize))
                    .and_then(|s| s.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn num_distinct(&self) -> usize {
        self.inner.lock().num_distinct
    }

    fn get_contents(&self) -> Vec<(u64, String)> {
        let guard = self.inner.lock();
        guard
            .contents
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|s| (slot_to_id(slot as u32), s.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_and_counts_distinct() {
        let dict = StringDictionary::new();
        let ids1 = dict.insert(&["a", "b", "a", "c"], 1).unwrap();
        assert_eq!(dict.num_distinct(), 3);
        let ids2 = dict.insert(&["a", "b", "a", "c"], 1).unwrap();
        assert_eq!(ids1, ids2);
        assert_eq!(dict.num_distinct(), 3);
    }

    #[test]
    fn extract_round_trips_insert() {
        let dict = StringDictionary::new();
        let strings = ["hello", "world", "", "hello"];
        let ids = dict.insert(&strings, 1).unwrap();
        let back = dict.extract(&ids);
        assert_eq!(back, strings.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn empty_string_is_not_the_null_sentinel() {
        let dict = StringDictionary::new();
        let ids = dict.insert(&[""], 1).unwrap();
        assert_ne!(ids[0], NULL_STRING_ID);
    }

    #[test]
    fn locate_safe_reports_missing_keys() {
        let dict = StringDictionary::new();
        dict.insert(&["a"], 1).unwrap();
        let result = dict.locate_safe(&["a", "missing"]);
        assert_eq!(result.found, vec![true, false]);
        assert_eq!(result.num_missing, 1);
    }

    #[test]
    fn remove_recycles_slot_and_decrements_count() {
        let dict = StringDictionary::new();
        let ids = dict.insert(&["a", "b"], 1).unwrap();
        dict.remove(&[ids[0]]).unwrap();
        assert_eq!(dict.num_distinct(), 1);
        let ids2 = dict.insert(&["c"], 1).unwrap();
        // the freed slot is recycled, so "c" gets the same numeric id "a" had
        assert_eq!(ids2[0], ids[0]);
    }

    #[test]
    fn locate_fast_after_bulk_insert() {
        let dict = StringDictionary::new();
        let strings: Vec<String> = (0..500).map(|i| format!("s{i}")).collect();
        let refs: Vec<&str> = strings.iter().map(|s| s.as_str()).collect();
        let ids = dict.insert(&refs, 1).unwrap();
        assert_eq!(dict.locate_fast(&refs), ids);
    }
}
