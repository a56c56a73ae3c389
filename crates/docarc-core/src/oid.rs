//! Process-local generator for the 64-bit object ids stamped on every
//! emitted object (§4.5 "Object-id generation").
//!
//! Two different emissions within one archive must never collide. The
//! original source combines a per-thread seed with a monotonic counter;
//! here the "per-thread seed" becomes an explicit construction-time seed
//! (so the generator can be shared across threads via `Arc` without any
//! thread-local magic) packed into the high 32 bits, with a monotonic
//! `AtomicU64` counter in the low 32 bits. This keeps ids from two
//! generators seeded differently from ever colliding, while a single
//! generator's own ids are trivially distinct by counter alone.

use crate::error::{Error, Location};
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates fresh 64-bit object ids. Thread-safe: every call to `next`
/// returns a unique id, with no suspension and no shared mutable state
/// beyond the atomic counter (§5).
pub struct ObjectIdGenerator {
    seed: u64,
    counter: AtomicU64,
}

impl ObjectIdGenerator {
    /// A generator seeded from the current time and process id, suitable
    /// for real builds where determinism across runs is not required.
    pub fn new() -> Self {
        let seed = std::process::id() as u64;
        Self::with_seed(seed)
    }

    /// A generator with an explicit seed, for deterministic tests (per the
    /// "allow injection for deterministic testing" design note in §9).
    pub fn deterministic(seed: u64) -> Self {
        Self::with_seed(seed)
    }

    fn with_seed(seed: u64) -> Self {
        ObjectIdGenerator {
            seed: seed << 32,
            counter: AtomicU64::new(0),
        }
    }

    /// Returns a fresh object id, or `RESOURCE`/`THREAD_OOO_OBJ_IDS` if the
    /// 32-bit counter space under this seed is exhausted.
    pub fn next(&self) -> Result<u64, Error> {
        let c = self.counter.fetch_add(1, Ordering::Relaxed);
        if c > u32::MAX as u64 {
            return Err(Error::resource(
                "THREAD_OOO_OBJ_IDS: object-id generator exhausted its counter space",
            ));
        }
        Ok(self.seed | c)
    }

    /// Infallible variant for call sites that treat exhaustion as a bug
    /// (the counter would need ~4 billion objects from one generator).
    pub fn next_unchecked(&self) -> u64 {
        self.next().unwrap_or_else(|_| {
            panic!(
                "{}",
                Error::internal(Location { file: file!(), line: line!() }, "object id space exhausted")
            )
        })
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let gen = ObjectIdGenerator::deterministic(7);
        let a = gen.next().unwrap();
        let b = gen.next().unwrap();
        let c = gen.next().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn different_seeds_never_collide() {
        let g1 = ObjectIdGenerator::deterministic(1);
        let g2 = ObjectIdGenerator::deterministic(2);
        for _ in 0..16 {
            assert_ne!(g1.next().unwrap(), g2.next().unwrap());
        }
    }
}
