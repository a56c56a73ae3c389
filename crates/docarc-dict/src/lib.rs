#![forbid(unsafe_code)]
//! docarc-dict: thread-safe string-to-id dictionary (§4.1).
//!
//! Two variants share one external contract (`insert`, `remove`,
//! `locate_safe`, `locate_fast`, `extract`, `num_distinct`, `get_contents`):
//!
//! - [`sync::StringDictionary`] guards a single slot table behind a
//!   spinlock, with a probabilistic pre-filter to skip the exact hash
//!   lookup on batches with many duplicates.
//! - [`asyncdict::ShardedDictionary`] shards strings across `P` independent
//!   sync dictionaries by `hash(key) mod P` and fans work out across
//!   scoped threads, stitching results back into input order.

pub mod error;
pub mod filter;
pub mod spinlock;
pub mod sync_dict;
pub mod sharded_dict;

pub use error::{Error, Result};
pub use sharded_dict::ShardedDictionary;
pub use sync_dict::StringDictionary;

/// Id 0 is reserved for "null/absent string" (§3, §4.1).
pub const NULL_STRING_ID: u64 = 0;

/// The result shape of `locate_safe`: ids (0 where not found), a found
/// mask, and the count of missing keys.
#[derive(Debug, Clone)]
pub struct LocateResult {
    pub ids: Vec<u64>,
    pub found: Vec<bool>,
    pub num_missing: usize,
}

/// Common interface both dictionary variants implement, matching the
/// table in §4.1 op-for-op.
pub trait Dictionary: Send + Sync {
    /// Interns `strings`, collapsing duplicates; idempotent across calls.
    /// `nthreads` is a hint the sharded variant interprets as parallelism.
    fn insert(&self, strings: &[&str], nthreads: usize) -> Result<Vec<u64>>;

    /// Frees the slots for `ids`. Caller must ensure every id is known.
    fn remove(&self, ids: &[u64]) -> Result<()>;

    fn locate_safe(&self, keys: &[&str]) -> LocateResult;

    /// Like `locate_safe` but undefined (never panics, but may return a
    /// stale/garbage id) for unknown keys, matching the original's
    /// "unknown key is undefined" contract.
    fn locate_fast(&self, keys: &[&str]) -> Vec<u64>;

    /// Returns the strings for `ids`. Undefined for unknown ids.
    fn extract(&self, ids: &[u64]) -> Vec<String>;

    fn num_distinct(&self) -> usize;

    fn get_contents(&self) -> Vec<(u64, String)>;
}
