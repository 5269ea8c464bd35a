//! Fixed-capacity, direct-mapped table keyed by a 64-bit signature.
//!
//! The backbone shared by the material cache and similar evaluation caches:
//! one entry per bucket, no chaining, no resize. A probe that finds a
//! different signature in the bucket resets it to a default-constructed
//! entry carrying the probed signature and reports a miss; the caller then
//! recomputes every field. Colliding signatures simply evict each other,
//! costing a redundant recomputation and nothing else, so each entry must be
//! self-contained and reconstructible from its position alone.

/// Entry types stored in a [`SignatureTable`] expose the signature slot the
/// table maintains.
pub trait SignatureEntry: Default {
    fn signature(&self) -> u64;
    fn set_signature(&mut self, sig: u64);
}

/// Direct-mapped signature table with a power-of-two number of buckets.
pub struct SignatureTable<E> {
    entries: Vec<E>,
    mask: usize,
}

impl<E: SignatureEntry> SignatureTable<E> {
    /// Create a table with `capacity` buckets. `capacity` must be a power
    /// of two.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two(), "capacity must be a power of two");
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, E::default);
        SignatureTable {
            entries,
            mask: capacity - 1,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Return the bucket for `sig` and whether it already held that
    /// signature. On a miss the bucket comes back freshly reset with `sig`
    /// installed, and the caller is responsible for filling in every field.
    pub fn probe(&mut self, sig: u64) -> (&mut E, bool) {
        let idx = (sig as usize) & self.mask;
        let entry = &mut self.entries[idx];
        if entry.signature() == sig {
            (entry, true)
        } else {
            *entry = E::default();
            entry.set_signature(sig);
            (entry, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestEntry {
        sig: u64,
        payload: u32,
    }

    impl SignatureEntry for TestEntry {
        fn signature(&self) -> u64 {
            self.sig
        }
        fn set_signature(&mut self, sig: u64) {
            self.sig = sig;
        }
    }

    #[test]
    fn probe_hit_preserves_payload() {
        let mut table = SignatureTable::<TestEntry>::new(16);
        let (entry, hit) = table.probe(42);
        assert!(!hit);
        entry.payload = 7;

        let (entry, hit) = table.probe(42);
        assert!(hit);
        assert_eq!(entry.payload, 7);
    }

    #[test]
    fn colliding_signatures_evict_each_other() {
        let mut table = SignatureTable::<TestEntry>::new(16);
        // Same low bits, different signatures: both map to bucket 5.
        let s1 = 5u64;
        let s2 = 5u64 | (1 << 40);

        let (entry, hit) = table.probe(s1);
        assert!(!hit);
        entry.payload = 11;

        let (entry, hit) = table.probe(s2);
        assert!(!hit);
        entry.payload = 22;

        // Third probe: s1 was evicted, so it comes back reset.
        let (entry, hit) = table.probe(s1);
        assert!(!hit);
        assert_eq!(entry.signature(), s1);
        assert_eq!(entry.payload, 0);
    }

    #[test]
    fn distinct_buckets_do_not_interfere() {
        let mut table = SignatureTable::<TestEntry>::new(16);
        table.probe(1).0.payload = 1;
        table.probe(2).0.payload = 2;

        assert!(table.probe(1).1);
        assert_eq!(table.probe(1).0.payload, 1);
        assert!(table.probe(2).1);
        assert_eq!(table.probe(2).0.payload, 2);
    }
}
