//! Shared transposition table.
//!
//! A fixed, power-of-two number of slots indexed by `hash & (capacity - 1)`.
//! Collisions are not chained: each slot holds one entry carrying the full
//! 64-bit key so equality can be verified on probe. Every slot has its own
//! spin lock, so contention between threads tracks the hash collision rate
//! rather than table traffic.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::Move;

/// Score bound kind stored with an entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bound {
    /// The score is exact for the stored depth.
    Exact,
    /// The score is a lower bound (the search failed high).
    Lower,
    /// The score is an upper bound (the search failed low).
    Upper,
}

/// Test-and-set lock with a relaxed-load backoff loop. Critical sections
/// here are a handful of loads or stores, far cheaper than parking.
pub(crate) struct SpinLock(AtomicBool);

impl SpinLock {
    const fn new() -> Self {
        SpinLock(AtomicBool::new(false))
    }

    #[inline]
    fn lock(&self) {
        while self.0.swap(true, Ordering::Acquire) {
            while self.0.load(Ordering::Relaxed) {
                std::hint::spin_loop();
            }
        }
    }

    #[inline]
    fn unlock(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone, Copy)]
struct EntryData {
    key: u64,
    score: i32,
    depth: u16,
    best_move: Move,
    bound: Bound,
    valid: bool,
}

impl EntryData {
    const fn empty() -> Self {
        EntryData {
            key: 0,
            score: 0,
            depth: 0,
            best_move: Move::null(),
            bound: Bound::Exact,
            valid: false,
        }
    }
}

/// One table slot: the lock lives inside the entry so a future
/// multi-worker search pays per-slot, not per-table.
struct Entry {
    lock: SpinLock,
    data: UnsafeCell<EntryData>,
}

// Access to `data` is always bracketed by `lock`.
unsafe impl Sync for Entry {}

impl Entry {
    fn new() -> Self {
        Entry {
            lock: SpinLock::new(),
            data: UnsafeCell::new(EntryData::empty()),
        }
    }
}

/// View over a found entry, holding its slot lock. Drop it before doing
/// long work; other probes of the same slot spin until then.
pub struct LockedEntry<'a> {
    entry: &'a Entry,
}

impl LockedEntry<'_> {
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.data().depth
    }

    #[must_use]
    pub fn score(&self) -> i32 {
        self.data().score
    }

    #[must_use]
    pub fn bound(&self) -> Bound {
        self.data().bound
    }

    /// The best move recorded for this position, if one was stored.
    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        let mv = self.data().best_move;
        mv.is_valid().then_some(mv)
    }

    fn data(&self) -> &EntryData {
        // Safety: the slot lock is held for the lifetime of this view.
        unsafe { &*self.entry.data.get() }
    }
}

impl Drop for LockedEntry<'_> {
    fn drop(&mut self) {
        self.entry.lock.unlock();
    }
}

pub struct TranspositionTable {
    entries: Box<[Entry]>,
    mask: usize,
}

impl TranspositionTable {
    /// Create a table with `capacity` slots. Capacity must be a nonzero
    /// power of two so indexing reduces to a mask.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "table capacity must be a power of two"
        );
        let entries: Box<[Entry]> = (0..capacity).map(|_| Entry::new()).collect();
        TranspositionTable {
            entries,
            mask: capacity - 1,
        }
    }

    /// Create a table using roughly `size_mb` megabytes.
    #[must_use]
    pub fn with_hash_size_mb(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Entry>();
        let capacity = ((size_mb * 1024 * 1024) / entry_size)
            .next_power_of_two()
            .checked_shr(1)
            .filter(|&c| c >= 1024)
            .unwrap_or(1024);
        Self::new(capacity)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn slot(&self, key: u64) -> &Entry {
        &self.entries[key as usize & self.mask]
    }

    /// Look up `key`. Returns a locked view only when the slot is valid and
    /// the stored key matches.
    #[must_use]
    pub fn load(&self, key: u64) -> Option<LockedEntry<'_>> {
        let entry = self.slot(key);
        entry.lock.lock();
        // Safety: lock held.
        let data = unsafe { &*entry.data.get() };
        if data.valid && data.key == key {
            Some(LockedEntry { entry })
        } else {
            entry.lock.unlock();
            None
        }
    }

    /// Store an entry. The slot is overwritten only when empty or when the
    /// incoming depth strictly exceeds the resident depth, so deep work is
    /// never displaced by shallow work.
    pub fn store(&self, key: u64, depth: u16, bound: Bound, best_move: Option<Move>, score: i32) {
        let entry = self.slot(key);
        entry.lock.lock();
        // Safety: lock held.
        let data = unsafe { &mut *entry.data.get() };
        if !data.valid || depth > data.depth {
            *data = EntryData {
                key,
                score,
                depth,
                best_move: best_move.unwrap_or(Move::null()),
                bound,
                valid: true,
            };
        }
        entry.lock.unlock();
    }

    /// Invalidate every slot.
    pub fn clear(&self) {
        for entry in &*self.entries {
            entry.lock.lock();
            // Safety: lock held.
            unsafe {
                *entry.data.get() = EntryData::empty();
            }
            entry.lock.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn some_move() -> Move {
        Move::quiet(Square::new(1, 4), Square::new(3, 4))
    }

    #[test]
    fn store_then_load() {
        let table = TranspositionTable::new(1024);
        table.store(42, 6, Bound::Exact, Some(some_move()), 120);
        let entry = table.load(42).expect("entry should be present");
        assert_eq!(entry.depth(), 6);
        assert_eq!(entry.score(), 120);
        assert_eq!(entry.bound(), Bound::Exact);
        assert_eq!(entry.best_move(), Some(some_move()));
    }

    #[test]
    fn load_verifies_full_key() {
        let table = TranspositionTable::new(1024);
        table.store(42, 6, Bound::Exact, None, 120);
        // Same slot, different key.
        assert!(table.load(42 + 1024).is_none());
        assert!(table.load(7).is_none());
    }

    #[test]
    fn deeper_entries_are_kept() {
        let table = TranspositionTable::new(1024);
        table.store(42, 8, Bound::Exact, None, 50);
        table.store(42, 3, Bound::Lower, Some(some_move()), 999);
        let entry = table.load(42).unwrap();
        assert_eq!(entry.depth(), 8);
        assert_eq!(entry.score(), 50);

        table.store(42, 9, Bound::Upper, None, -10);
        drop(entry);
        let entry = table.load(42).unwrap();
        assert_eq!(entry.depth(), 9);
        assert_eq!(entry.score(), -10);
    }

    #[test]
    fn equal_depth_does_not_replace() {
        let table = TranspositionTable::new(1024);
        table.store(42, 5, Bound::Exact, None, 1);
        table.store(42, 5, Bound::Exact, None, 2);
        assert_eq!(table.load(42).unwrap().score(), 1);
    }

    #[test]
    fn clear_invalidates() {
        let table = TranspositionTable::new(1024);
        table.store(42, 5, Bound::Exact, None, 1);
        table.clear();
        assert!(table.load(42).is_none());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two() {
        let _ = TranspositionTable::new(1000);
    }

    #[test]
    fn concurrent_stores_never_tear() {
        use std::sync::Arc;

        let table = Arc::new(TranspositionTable::new(64));
        let mut handles = Vec::new();
        for thread in 0..4u64 {
            let table = Arc::clone(&table);
            handles.push(std::thread::spawn(move || {
                for i in 0..10_000u64 {
                    // All threads fight over the same few slots. Each key
                    // writes a score derived from it, so any torn entry is
                    // detectable.
                    let key = (thread * 7 + i) % 16;
                    table.store(key, (i % 32) as u16, Bound::Exact, None, key as i32 * 3);
                    if let Some(entry) = table.load(key) {
                        assert_eq!(entry.score(), key as i32 * 3);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
