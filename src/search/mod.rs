//! Search: fixed-depth alpha-beta and the iterative deepening driver.

mod fixed;
mod heuristics;
mod iterative;
mod stream;

pub use iterative::{IterationCallback, IterativeSearcher, SearchLimits, SearchResult};

pub(crate) use fixed::FixedDepthSearcher;
pub(crate) use heuristics::Heuristics;
pub(crate) use stream::RootMoveList;

use std::sync::atomic::{AtomicU64, Ordering};

/// Score conventions. Scores are always from the side to move's view;
/// negamax negates both the score and the window at each recursion.
pub mod score {
    /// Largest representable score; windows start at `(-MAX, MAX)`.
    pub const MAX: i32 = i32::MAX;

    /// Scores at or beyond this magnitude encode a forced mate.
    pub const MATE_THRESHOLD: i32 = MAX - 1024;

    /// Score of the side to move being mated `ply` plies from the root.
    #[inline]
    #[must_use]
    pub const fn mate_in(ply: u16) -> i32 {
        -MAX + ply as i32
    }

    #[inline]
    #[must_use]
    pub const fn is_mate(score: i32) -> bool {
        score.abs() >= MATE_THRESHOLD
    }

    /// Full moves until mate, signed by who delivers it, for reporting.
    #[inline]
    #[must_use]
    pub const fn moves_to_mate(score: i32) -> Option<i32> {
        if score >= MATE_THRESHOLD {
            Some((MAX - score + 1) / 2)
        } else if score <= -MATE_THRESHOLD {
            Some(-(MAX + score + 1) / 2)
        } else {
            None
        }
    }
}

/// Counters shared between the search thread, the stop controller and the
/// reporting callbacks. All accesses are relaxed; the values are
/// statistics, not synchronisation.
pub struct SearchStats {
    nodes: AtomicU64,
    table_hits: AtomicU64,
}

impl SearchStats {
    #[must_use]
    pub fn new() -> Self {
        SearchStats {
            nodes: AtomicU64::new(0),
            table_hits: AtomicU64::new(0),
        }
    }

    pub fn reset(&self) {
        self.nodes.store(0, Ordering::Relaxed);
        self.table_hits.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_node(&self) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_table_hit(&self) {
        self.table_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn table_hits(&self) -> u64 {
        self.table_hits.load(Ordering::Relaxed)
    }
}

impl Default for SearchStats {
    fn default() -> Self {
        SearchStats::new()
    }
}
