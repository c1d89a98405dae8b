//! Quiet-move ordering heuristics: history and killer tables.

use crate::board::{Color, Move, Piece, Square};

/// Butterfly-style history indexed by (side, piece kind, destination).
/// Quiet beta-cutoffs credit `depth²`; scores are normalised against the
/// side's running total so deep searches don't drown the scale.
pub(crate) struct HistoryTable {
    table: [[[u64; 64]; 6]; 2],
    total: [u64; 2],
}

impl HistoryTable {
    pub(crate) fn new() -> Self {
        HistoryTable {
            table: [[[0; 64]; 6]; 2],
            // Start totals at one so scoring never divides by zero.
            total: [1; 2],
        }
    }

    pub(crate) fn add(&mut self, color: Color, piece: Piece, to: Square, depth: u16) {
        let credit = u64::from(depth) * u64::from(depth);
        self.table[color.index()][piece.index()][to.index()] += credit;
        self.total[color.index()] += credit;
    }

    /// History score scaled into `0..=scale`.
    pub(crate) fn score(&self, color: Color, piece: Piece, to: Square, scale: u32) -> i32 {
        let raw = self.table[color.index()][piece.index()][to.index()];
        (raw * u64::from(scale) / self.total[color.index()]) as i32
    }
}

/// Two killer slots per search ply. The table is anchored at ply zero, so
/// successive iterative deepenings see the killers collected for the same
/// distance from the root.
pub(crate) struct KillerTable {
    plies: Vec<[Move; 2]>,
}

pub(crate) const MAX_KILLERS: usize = 2;

impl KillerTable {
    pub(crate) fn new() -> Self {
        KillerTable { plies: Vec::new() }
    }

    /// Grow to cover `plies` plies. Called when the driver moves to a new
    /// depth; existing entries keep their ply index.
    pub(crate) fn resize(&mut self, plies: usize) {
        if plies > self.plies.len() {
            self.plies.resize(plies, [Move::null(); MAX_KILLERS]);
        }
    }

    /// Record a quiet cutoff move, keeping the two most recent distinct
    /// killers.
    pub(crate) fn add(&mut self, ply: u16, mv: Move) {
        let Some(slot) = self.plies.get_mut(ply as usize) else {
            return;
        };
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    pub(crate) fn get(&self, ply: u16) -> [Move; MAX_KILLERS] {
        self.plies
            .get(ply as usize)
            .copied()
            .unwrap_or([Move::null(); MAX_KILLERS])
    }
}

/// The heuristic state a search thread carries across iterations.
pub(crate) struct Heuristics {
    pub(crate) history: HistoryTable,
    pub(crate) killers: KillerTable,
}

impl Heuristics {
    pub(crate) fn new() -> Self {
        Heuristics {
            history: HistoryTable::new(),
            killers: KillerTable::new(),
        }
    }
}
