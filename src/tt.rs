//! Shared transposition table for caching search results.
//!
//! A fixed allocation of 32-byte clusters, three records each, shared
//! without locks by all search workers. Records are bit-packed into
//! per-field relaxed atomics: concurrent probes and stores are expected to
//! race, and a torn or colliding record is always detectable as a miss (or,
//! with bounded probability, a "fake hit" on a matching 16-bit key
//! fragment), costing search quality but never soundness. Replacement
//! is driven by a generation counter advanced once per search, so stale
//! entries age out without ever being individually freed.
//!
//! Record layout (10 bytes):
//! - key fragment            16 bit
//! - depth (offset biased)    8 bit
//! - generation | pv | bound  8 bit (5 + 1 + 2)
//! - move                    16 bit
//! - value                   16 bit
//! - static eval             16 bit

use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::types::{Bound, Depth, Move, Value, DEPTH_OFFSET};

/// Records per cluster; three 10-byte records and padding fill one 32-byte
/// cache line half.
const CLUSTER_SIZE: usize = 3;

/// Low bits of the generation byte reserved for the pv flag and bound.
const GENERATION_BITS: u8 = 3;
/// Generation increment per search.
const GENERATION_DELTA: u8 = 1 << GENERATION_BITS;
/// Cycle length for the aging arithmetic; adding it keeps the byte
/// subtraction below from underflowing anywhere within one full cycle.
const GENERATION_CYCLE: u16 = 255 + GENERATION_DELTA as u16;
/// Mask extracting the generation bits.
const GENERATION_MASK: u16 = (0xFF << GENERATION_BITS) & 0xFF;

#[derive(Default)]
#[repr(C)]
struct TtRecord {
    key16: AtomicU16,
    depth8: AtomicU8,
    gen_bound8: AtomicU8,
    move16: AtomicU16,
    value16: AtomicU16,
    eval16: AtomicU16,
}

impl TtRecord {
    #[inline]
    fn key16(&self) -> u16 {
        self.key16.load(Ordering::Relaxed)
    }

    /// A record is occupied iff its biased depth byte is nonzero; real
    /// depths always bias to at least 1.
    #[inline]
    fn occupied(&self) -> bool {
        self.depth8.load(Ordering::Relaxed) != 0
    }

    #[inline]
    fn depth_raw(&self) -> u8 {
        self.depth8.load(Ordering::Relaxed)
    }

    #[inline]
    fn gen_bound(&self) -> u8 {
        self.gen_bound8.load(Ordering::Relaxed)
    }

    /// Age of this record relative to `generation`, monotonic across
    /// generation wraparound within one full cycle.
    #[inline]
    fn relative_age(&self, generation: u8) -> u8 {
        ((GENERATION_CYCLE + u16::from(generation) - u16::from(self.gen_bound()))
            & GENERATION_MASK) as u8
    }

    fn clear(&self) {
        self.key16.store(0, Ordering::Relaxed);
        self.depth8.store(0, Ordering::Relaxed);
        self.gen_bound8.store(0, Ordering::Relaxed);
        self.move16.store(0, Ordering::Relaxed);
        self.value16.store(0, Ordering::Relaxed);
        self.eval16.store(0, Ordering::Relaxed);
    }
}

#[derive(Default)]
#[repr(C, align(32))]
struct Cluster {
    records: [TtRecord; CLUSTER_SIZE],
    _padding: [u8; 2],
}

/// Handle to one record, as returned by [`TranspositionTable::probe`].
/// Carries the table's current generation so a save tags the record fresh.
pub struct TtSlot<'a> {
    record: &'a TtRecord,
    generation: u8,
}

impl TtSlot<'_> {
    #[must_use]
    pub fn depth(&self) -> Depth {
        Depth::from(self.record.depth_raw()) + DEPTH_OFFSET
    }

    #[must_use]
    pub fn value(&self) -> Value {
        Value::from(self.record.value16.load(Ordering::Relaxed) as i16)
    }

    #[must_use]
    pub fn eval(&self) -> Value {
        Value::from(self.record.eval16.load(Ordering::Relaxed) as i16)
    }

    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        let m = Move(self.record.move16.load(Ordering::Relaxed));
        if m.is_none() {
            None
        } else {
            Some(m)
        }
    }

    #[must_use]
    pub fn is_pv(&self) -> bool {
        self.record.gen_bound() & 0x4 != 0
    }

    #[must_use]
    pub fn bound(&self) -> Bound {
        Bound::from_u8(self.record.gen_bound() & 0x3)
    }

    /// Write the record, subject to the replacement policy: the move is
    /// kept when storing the same position without one, and a record is
    /// only overwritten when the new data is an exact bound, belongs to a
    /// different position, or is not much shallower than the incumbent.
    /// An exact deep PV record is therefore never downgraded by a weaker
    /// result for the same position.
    pub fn save(
        &self,
        key: u64,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: Depth,
        best_move: Option<Move>,
        eval: Value,
    ) {
        debug_assert!(depth > DEPTH_OFFSET);
        debug_assert!(depth < 256 + DEPTH_OFFSET);
        let key16 = key as u16;
        let rec = self.record;

        // Preserve an existing move for the same position.
        if best_move.is_some() || key16 != rec.key16() {
            rec.move16
                .store(best_move.unwrap_or(Move::NONE).0, Ordering::Relaxed);
        }

        // Overwrite less valuable records.
        if bound == Bound::Exact
            || key16 != rec.key16()
            || depth - DEPTH_OFFSET + 2 * Depth::from(is_pv) > Depth::from(rec.depth_raw()) - 4
        {
            rec.key16.store(key16, Ordering::Relaxed);
            rec.depth8.store((depth - DEPTH_OFFSET) as u8, Ordering::Relaxed);
            rec.gen_bound8.store(
                self.generation | (u8::from(is_pv) << 2) | bound.to_u8(),
                Ordering::Relaxed,
            );
            rec.value16
                .store(clip(value) as u16, Ordering::Relaxed);
            rec.eval16.store(clip(eval) as u16, Ordering::Relaxed);
        }
    }
}

/// Clamp a value into the 16-bit field.
#[inline]
fn clip(v: Value) -> i16 {
    v.clamp(Value::from(i16::MIN), Value::from(i16::MAX)) as i16
}

/// Multiply-high cluster selection: maps a 64-bit key uniformly onto
/// `0..count` without a modulo, for arbitrary (not just power-of-two)
/// table sizes.
#[inline]
fn mul_hi64(a: u64, b: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) >> 64) as u64
}

/// Lock-free shared transposition table.
///
/// All probes and stores take `&self` and may race; `resize` and `clear`
/// require exclusive access and must not run while any search worker is
/// active.
pub struct TranspositionTable {
    table: Vec<Cluster>,
    generation8: AtomicU8,
}

impl TranspositionTable {
    /// Create a table using at most `mb` mebibytes. `mb` must be positive.
    #[must_use]
    pub fn new(mb: usize) -> Self {
        let mut tt = TranspositionTable {
            table: Vec::new(),
            generation8: AtomicU8::new(0),
        };
        tt.resize(mb);
        tt
    }

    /// Reallocate for `mb` mebibytes, discarding all content. The new
    /// capacity is the largest cluster count fitting the budget.
    pub fn resize(&mut self, mb: usize) {
        assert!(mb > 0, "hash size must be positive");
        let count = mb * 1024 * 1024 / std::mem::size_of::<Cluster>();
        self.table = std::iter::repeat_with(Cluster::default).take(count).collect();
        #[cfg(feature = "logging")]
        log::info!("transposition table resized: {mb} MiB, {count} clusters");
    }

    /// Reset every record without reallocating.
    pub fn clear(&mut self) {
        for cluster in &self.table {
            for record in &cluster.records {
                record.clear();
            }
        }
        self.generation8.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.table.len()
    }

    #[inline]
    fn generation(&self) -> u8 {
        self.generation8.load(Ordering::Relaxed)
    }

    /// Advance the generation for a new search. The step leaves room for
    /// the pv/bound bits in the same byte, and the cycle arithmetic in
    /// `relative_age` stays monotonic across the wraparound.
    pub fn new_search(&self) {
        let g = self.generation().wrapping_add(GENERATION_DELTA);
        self.generation8.store(g, Ordering::Relaxed);
    }

    /// Look up `key`. On a hit, returns its record (generation refreshed)
    /// and `true`. On a miss, returns the cluster's best replacement
    /// candidate and `false`; the caller may populate it via
    /// [`TtSlot::save`]. Entries never survive by contract: a concurrent
    /// store may claim the slot at any time.
    #[must_use]
    pub fn probe(&self, key: u64) -> (TtSlot<'_>, bool) {
        let idx = mul_hi64(key, self.table.len() as u64) as usize;
        let cluster = &self.table[idx];
        let key16 = key as u16;
        let generation = self.generation();

        for record in &cluster.records {
            if record.key16() == key16 || !record.occupied() {
                // Refresh the generation, keeping the pv and bound bits.
                record.gen_bound8.store(
                    generation | (record.gen_bound() & (GENERATION_DELTA - 1)),
                    Ordering::Relaxed,
                );
                let found = record.occupied();
                return (TtSlot { record, generation }, found);
            }
        }

        // No match: pick the replacement candidate. Older generations go
        // first, then shallow depth, with exact bounds slightly protected;
        // the strict comparison keeps the lowest index on ties.
        let mut replace = &cluster.records[0];
        let mut worst = worth(replace, generation);
        for record in &cluster.records[1..] {
            let w = worth(record, generation);
            if w < worst {
                replace = record;
                worst = w;
            }
        }
        (
            TtSlot {
                record: replace,
                generation,
            },
            false,
        )
    }

    /// Probe-and-save in one step.
    pub fn store(
        &self,
        key: u64,
        value: Value,
        is_pv: bool,
        bound: Bound,
        depth: Depth,
        best_move: Option<Move>,
        eval: Value,
    ) {
        let (slot, _) = self.probe(key);
        slot.save(key, value, is_pv, bound, depth, best_move, eval);
    }

    /// Approximate occupancy in per mille, sampling a prefix of clusters
    /// and counting records tagged with the current generation.
    #[must_use]
    pub fn hashfull(&self) -> u32 {
        let sample = self.table.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let generation = self.generation();
        let mut count = 0u32;
        for cluster in self.table.iter().take(sample) {
            for record in &cluster.records {
                if record.occupied()
                    && u16::from(record.gen_bound()) & GENERATION_MASK
                        == u16::from(generation)
                {
                    count += 1;
                }
            }
        }
        count * 1000 / (sample as u32 * CLUSTER_SIZE as u32)
    }
}

/// Replacement score: higher is more worth keeping.
#[inline]
fn worth(record: &TtRecord, generation: u8) -> i32 {
    let exact_bonus = i32::from(record.gen_bound() & 0x3 == Bound::Exact.to_u8());
    i32::from(record.depth_raw()) - 2 * i32::from(record.relative_age(generation)) + exact_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// With a power-of-two cluster count, `mul_hi64` keys by the top bits:
    /// build a key landing in `cluster` with the given low fragment.
    fn key_for(cluster: u64, bits: u32, fragment: u16) -> u64 {
        (cluster << (64 - bits)) | u64::from(fragment)
    }

    #[test]
    fn record_and_cluster_layout() {
        assert_eq!(std::mem::size_of::<TtRecord>(), 10);
        assert_eq!(std::mem::size_of::<Cluster>(), 32);
    }

    #[test]
    fn store_probe_roundtrip() {
        let tt = TranspositionTable::new(1);
        let key = 0x1234_5678_9ABC_DEF0;

        tt.store(key, 100, true, Bound::Exact, 10, Some(Move(0x1F2E)), 50);

        let (slot, found) = tt.probe(key);
        assert!(found);
        assert_eq!(slot.value(), 100);
        assert_eq!(slot.eval(), 50);
        assert_eq!(slot.depth(), 10);
        assert_eq!(slot.bound(), Bound::Exact);
        assert!(slot.is_pv());
        assert_eq!(slot.best_move(), Some(Move(0x1F2E)));
    }

    #[test]
    fn negative_depth_roundtrip() {
        let tt = TranspositionTable::new(1);
        let key = 42u64;

        tt.store(key, -7, false, Bound::Upper, -3, None, -1);

        let (slot, found) = tt.probe(key);
        assert!(found);
        assert_eq!(slot.depth(), -3);
        assert_eq!(slot.value(), -7);
        assert_eq!(slot.bound(), Bound::Upper);
        assert!(!slot.is_pv());
        assert_eq!(slot.best_move(), None);
    }

    #[test]
    fn miss_reports_not_found() {
        let tt = TranspositionTable::new(1);
        tt.store(1, 10, false, Bound::Lower, 5, None, 0);
        let (_, found) = tt.probe(key_for(17, 15, 99));
        assert!(!found);
    }

    #[test]
    fn same_key_keeps_move_when_none_supplied() {
        let tt = TranspositionTable::new(1);
        let key = 7u64;

        tt.store(key, 30, false, Bound::Exact, 8, Some(Move(0x0B0B)), 25);
        tt.store(key, 35, false, Bound::Exact, 9, None, 25);

        let (slot, found) = tt.probe(key);
        assert!(found);
        assert_eq!(slot.depth(), 9);
        assert_eq!(slot.best_move(), Some(Move(0x0B0B)));
    }

    #[test]
    fn shallow_non_exact_does_not_downgrade_deep_entry() {
        let tt = TranspositionTable::new(1);
        let key = 11u64;

        tt.store(key, 500, true, Bound::Exact, 20, Some(Move(0x0101)), 480);
        // A much shallower upper bound for the same position must not
        // clobber the deep exact PV record.
        tt.store(key, -50, false, Bound::Upper, 2, None, -50);

        let (slot, found) = tt.probe(key);
        assert!(found);
        assert_eq!(slot.depth(), 20);
        assert_eq!(slot.value(), 500);
        assert_eq!(slot.bound(), Bound::Exact);
        assert!(slot.is_pv());
    }

    #[test]
    fn replacement_prefers_older_generation() {
        let tt = TranspositionTable::new(1);
        assert!(tt.cluster_count().is_power_of_two());
        let bits = (tt.cluster_count() as u64).trailing_zeros();

        // Fill one cluster: one deep entry from the current generation...
        tt.store(key_for(3, bits, 1), 10, false, Bound::Exact, 20, None, 0);
        // ...then age it by two searches and fill the remaining slots.
        tt.new_search();
        tt.new_search();
        tt.store(key_for(3, bits, 2), 10, false, Bound::Lower, 5, None, 0);
        tt.store(key_for(3, bits, 3), 10, false, Bound::Lower, 5, None, 0);

        // A fourth key must evict the old-generation entry despite its
        // greater depth.
        tt.store(key_for(3, bits, 4), 1, false, Bound::Lower, 1, None, 0);

        assert!(!tt.probe(key_for(3, bits, 1)).1, "old entry evicted");
        assert!(tt.probe(key_for(3, bits, 2)).1);
        assert!(tt.probe(key_for(3, bits, 3)).1);
        assert!(tt.probe(key_for(3, bits, 4)).1);
    }

    #[test]
    fn generation_wraparound_keeps_aging_monotonic() {
        let tt = TranspositionTable::new(1);
        let bits = (tt.cluster_count() as u64).trailing_zeros();

        tt.store(key_for(5, bits, 1), 10, false, Bound::Exact, 18, None, 0);

        // Drive the generation through more than one full cycle.
        for _ in 0..33 {
            tt.new_search();
        }

        tt.store(key_for(5, bits, 2), 10, false, Bound::Lower, 5, None, 0);
        tt.store(key_for(5, bits, 3), 10, false, Bound::Lower, 5, None, 0);
        tt.store(key_for(5, bits, 4), 1, false, Bound::Lower, 1, None, 0);

        // The wrapped-around entry must still look older than the fresh
        // ones and be the one replaced, despite its greater depth.
        assert!(!tt.probe(key_for(5, bits, 1)).1, "wrapped entry evicted");
        assert!(tt.probe(key_for(5, bits, 2)).1);
        assert!(tt.probe(key_for(5, bits, 3)).1);
    }

    #[test]
    fn hashfull_empty_and_full() {
        let mut tt = TranspositionTable::new(1);
        assert_eq!(tt.hashfull(), 0);

        let bits = (tt.cluster_count() as u64).trailing_zeros();
        for cluster in 0..tt.cluster_count() as u64 {
            for frag in 1..=3u16 {
                tt.store(
                    key_for(cluster, bits, frag),
                    0,
                    false,
                    Bound::Lower,
                    1,
                    None,
                    0,
                );
            }
        }
        assert_eq!(tt.hashfull(), 1000);

        // A new search ages every record out of the current generation.
        tt.new_search();
        assert_eq!(tt.hashfull(), 0);

        tt.clear();
        assert_eq!(tt.hashfull(), 0);
        assert!(!tt.probe(key_for(0, bits, 1)).1);
    }

    #[test]
    fn resize_discards_contents() {
        let mut tt = TranspositionTable::new(1);
        tt.store(99, 7, false, Bound::Exact, 12, None, 7);
        assert!(tt.probe(99).1);

        tt.resize(2);
        assert!(!tt.probe(99).1);
        assert_eq!(tt.cluster_count(), 2 * 1024 * 1024 / 32);
    }

    #[test]
    fn concurrent_stores_and_probes_stay_coherent() {
        use std::sync::Arc;

        let tt = Arc::new(TranspositionTable::new(4));
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let tt = Arc::clone(&tt);
            handles.push(std::thread::spawn(move || {
                for i in 0..20_000u64 {
                    let key = i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                    tt.store(key, (i % 1000) as i32, false, Bound::Lower, 6, None, 0);
                    let (slot, found) = tt.probe(key);
                    if found {
                        // Whatever is read must decode to sane fields.
                        let _ = slot.value();
                        assert!(slot.depth() > DEPTH_OFFSET);
                    }
                }
            }));
        }
        for h in handles {
            h.join().expect("worker panicked");
        }
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_fields(
            key in any::<u64>(),
            value in -30_000i32..30_000,
            eval in -30_000i32..30_000,
            depth in -6i32..240,
            mv in any::<u16>(),
            is_pv in any::<bool>(),
            bound_bits in 0u8..3,
        ) {
            let tt = TranspositionTable::new(1);
            let bound = Bound::from_u8(bound_bits);
            let best_move = if mv == 0 { None } else { Some(Move(mv)) };

            tt.store(key, value, is_pv, bound, depth, best_move, eval);

            let (slot, found) = tt.probe(key);
            prop_assert!(found);
            prop_assert_eq!(slot.value(), value);
            prop_assert_eq!(slot.eval(), eval);
            prop_assert_eq!(slot.depth(), depth);
            prop_assert_eq!(slot.bound(), bound);
            prop_assert_eq!(slot.is_pv(), is_pv);
            prop_assert_eq!(slot.best_move(), best_move);
        }
    }
}
