//! Fixed-depth negamax search with quiescence.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::{update, Board, Move, Piece};
use crate::eval;
use crate::see;
use crate::tt::{Bound, TranspositionTable};

use super::heuristics::Heuristics;
use super::score;
use super::stream::{MoveStream, RootMoveList};
use super::SearchStats;

/// Safety margin added to the queen's value for quiescence delta pruning.
const DELTA_MARGIN: i32 = 200;

/// A completed search: the principal variation and its score. An empty
/// line marks a discarded (halted) search.
#[derive(Clone, Debug)]
pub(crate) struct SearchLine {
    pub moves: Vec<Move>,
    pub score: i32,
}

impl SearchLine {
    pub(crate) fn invalid() -> Self {
        SearchLine {
            moves: Vec::new(),
            score: 0,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.moves.is_empty()
    }
}

/// One iteration of the deepening driver: searches a private board copy
/// to a fixed depth against the shared transposition table.
pub(crate) struct FixedDepthSearcher<'a> {
    board: Board,
    depth: u16,
    table: &'a TranspositionTable,
    heuristics: &'a mut Heuristics,
    stats: &'a SearchStats,
    halt: &'a AtomicBool,
}

impl<'a> FixedDepthSearcher<'a> {
    pub(crate) fn new(
        board: &Board,
        depth: u16,
        table: &'a TranspositionTable,
        heuristics: &'a mut Heuristics,
        stats: &'a SearchStats,
        halt: &'a AtomicBool,
    ) -> Self {
        heuristics.killers.resize(depth as usize + 1);
        FixedDepthSearcher {
            board: board.clone(),
            depth,
            table,
            heuristics,
            stats,
            halt,
        }
    }

    #[inline]
    fn halted(&self) -> bool {
        self.halt.load(Ordering::Acquire)
    }

    /// Search the root moves in list order, recording each move's score
    /// back into the list for the next depth's ordering.
    pub(crate) fn search(&mut self, root_moves: &mut RootMoveList) -> SearchLine {
        if root_moves.is_empty() {
            // Mate or stalemate at the root; nothing to search.
            let score = if self.board.is_in_check(self.board.turn()) {
                score::mate_in(0)
            } else {
                0
            };
            return SearchLine {
                moves: Vec::new(),
                score,
            };
        }

        self.stats.count_node();
        let mut alpha = -score::MAX;
        let mut best_move = Move::null();

        let moves: Vec<Move> = root_moves.moves().collect();
        for mv in moves {
            if self.halted() {
                return SearchLine::invalid();
            }
            let info = self.board.make_move::<{ update::ALL }>(mv);
            let move_score = -self.search_node(self.depth - 1, 1, -score::MAX, -alpha);
            self.board.unmake_move::<{ update::ALL }>(mv, info);

            root_moves.record_score(mv, move_score);
            if move_score > alpha {
                alpha = move_score;
                best_move = mv;
            }
        }

        if self.halted() {
            return SearchLine::invalid();
        }

        self.table
            .store(self.board.hash(), self.depth, Bound::Exact, Some(best_move), alpha);

        SearchLine {
            moves: self.extract_line(best_move),
            score: alpha,
        }
    }

    /// Interior negamax node.
    fn search_node(&mut self, depth: u16, ply: u16, mut alpha: i32, mut beta: i32) -> i32 {
        if self.halted() {
            return 0;
        }
        self.stats.count_node();

        // The earliest detectable repetition scores as a draw.
        if self.board.is_repetition() {
            return 0;
        }

        // Transposition probe. The locked view is read and released
        // before anything else happens; holding it across the recursion
        // would stall every thread hashing to the same slot.
        let mut hash_move = None;
        {
            if let Some(entry) = self.table.load(self.board.hash()) {
                hash_move = entry.best_move();
                if entry.depth() >= depth {
                    self.stats.count_table_hit();
                    let stored = entry.score();
                    match entry.bound() {
                        Bound::Exact => return stored,
                        Bound::Lower => alpha = alpha.max(stored),
                        Bound::Upper => beta = beta.min(stored),
                    }
                    if alpha >= beta {
                        return stored;
                    }
                }
            }
        }

        if depth == 0 {
            return self.quiescence(alpha, beta);
        }

        let original_alpha = alpha;
        let mut stream = MoveStream::new(hash_move, ply);
        let mut best_score = -score::MAX;
        let mut best_move = Move::null();
        let mut any_moves = false;

        while let Some(mv) = stream.next(&mut self.board, &*self.heuristics) {
            any_moves = true;

            let info = self.board.make_move::<{ update::ALL }>(mv);
            let move_score = -self.search_node(depth - 1, ply + 1, -beta, -alpha);
            self.board.unmake_move::<{ update::ALL }>(mv, info);

            if self.halted() {
                return 0;
            }

            if move_score > best_score {
                best_score = move_score;
                best_move = mv;
            }
            if move_score >= beta {
                if mv.is_quiet() {
                    self.credit_quiet_cutoff(mv, ply, depth);
                }
                break;
            }
            alpha = alpha.max(move_score);
        }

        if !any_moves {
            return if self.board.is_in_check(self.board.turn()) {
                score::mate_in(ply)
            } else {
                0
            };
        }

        let bound = if best_score <= original_alpha {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.table
            .store(self.board.hash(), depth, bound, Some(best_move), best_score);

        best_score
    }

    /// A quiet move that refuted this node: remember it as a killer for
    /// the ply and credit its destination in the history table.
    fn credit_quiet_cutoff(&mut self, mv: Move, ply: u16, depth: u16) {
        self.heuristics.killers.add(ply, mv);
        if let Some((color, piece)) = self.board.piece_at(mv.from()) {
            self.heuristics.history.add(color, piece, mv.to(), depth);
        }
    }

    /// Captures-only extension of the search. Terminates naturally:
    /// capture sequences run out of pieces.
    fn quiescence(&mut self, mut alpha: i32, beta: i32) -> i32 {
        if self.halted() {
            return 0;
        }
        self.stats.count_node();

        let stand_pat = eval::evaluate_with_window(&self.board, alpha, beta);
        if stand_pat >= beta {
            return beta;
        }
        // Delta pruning: even winning a queen plus margin cannot reach
        // alpha from here.
        if stand_pat + Piece::Queen.value() + DELTA_MARGIN < alpha {
            return alpha;
        }
        alpha = alpha.max(stand_pat);

        let moves = self.board.generate_tactical_moves();
        let mut scored = crate::board::ScoredMoveList::new();
        for &mv in &moves {
            let score = see::evaluate(&mut self.board, mv);
            scored.push(mv, score);
        }

        let mut cursor = 0;
        while let Some(entry) = scored.pick_best(cursor) {
            cursor += 1;
            let mv = entry.mv;

            let info = self.board.make_move::<{ update::ALL }>(mv);
            let move_score = -self.quiescence(-beta, -alpha);
            self.board.unmake_move::<{ update::ALL }>(mv, info);

            if move_score >= beta {
                return beta;
            }
            alpha = alpha.max(move_score);
        }

        alpha
    }

    /// Reconstruct the principal variation by replaying best moves out of
    /// the table, then rewinding the board.
    fn extract_line(&mut self, first: Move) -> Vec<Move> {
        let mut line = Vec::new();
        let mut unwind = Vec::new();
        let mut mv = first;
        let mut remaining = self.depth;

        loop {
            if !mv.is_valid() || !self.board.is_legal_move(mv) {
                break;
            }
            line.push(mv);
            unwind.push((mv, self.board.make_move::<{ update::ALL }>(mv)));

            remaining -= 1;
            // The tail of a line can shuffle back and forth forever;
            // depth running out is the loop bound.
            if remaining == 0 {
                break;
            }

            let next = self.table.load(self.board.hash()).and_then(|entry| {
                (entry.bound() == Bound::Exact && entry.depth() >= remaining)
                    .then(|| entry.best_move())
                    .flatten()
            });
            match next {
                Some(next_move) => mv = next_move,
                None => break,
            }
        }

        for (mv, info) in unwind.into_iter().rev() {
            self.board.unmake_move::<{ update::ALL }>(mv, info);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn run_search(fen: &str, depth: u16) -> SearchLine {
        let board = Board::from_fen(fen);
        let table = TranspositionTable::new(1 << 16);
        let mut heuristics = Heuristics::new();
        let stats = SearchStats::new();
        let halt = AtomicBool::new(false);
        let mut board_for_root = board.clone();
        let mut root = RootMoveList::new(&mut board_for_root, &heuristics);
        let mut searcher =
            FixedDepthSearcher::new(&board, depth, &table, &mut heuristics, &stats, &halt);
        searcher.search(&mut root)
    }

    #[test]
    fn finds_back_rank_mate_in_one() {
        let line = run_search("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", 2);
        assert!(line.is_valid());
        assert!(line.score >= score::MATE_THRESHOLD);
        let best = line.moves[0];
        assert_eq!(best.to_string(), "a1a8");
    }

    #[test]
    fn stalemate_scores_zero() {
        // Black to move has no legal moves and is not in check.
        let line = run_search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 1);
        assert!(!line.is_valid());
        assert_eq!(line.score, 0);
    }

    #[test]
    fn checkmate_at_root_scores_mated_now() {
        // Black is already back-rank mated.
        let line = run_search("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 1);
        assert!(!line.is_valid());
        assert!(line.score <= -score::MATE_THRESHOLD);
    }

    #[test]
    fn prefers_winning_free_material() {
        // A queen hangs on d5; depth two is enough to take it safely.
        let line = run_search("6k1/8/8/3q4/8/8/8/3R2K1 w - - 0 1", 3);
        assert!(line.is_valid());
        assert_eq!(line.moves[0].to_string(), "d1d5");
        assert!(line.score > Piece::Queen.value() / 2);
    }

    #[test]
    fn halted_search_returns_invalid_line() {
        let board = Board::new();
        let table = TranspositionTable::new(1 << 10);
        let mut heuristics = Heuristics::new();
        let stats = SearchStats::new();
        let halt = AtomicBool::new(true);
        let mut board_for_root = board.clone();
        let mut root = RootMoveList::new(&mut board_for_root, &heuristics);
        let mut searcher =
            FixedDepthSearcher::new(&board, 4, &table, &mut heuristics, &stats, &halt);
        let line = searcher.search(&mut root);
        assert!(!line.is_valid());
    }

    #[test]
    fn deeper_search_reuses_the_table() {
        let board = Board::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
        );
        let table = TranspositionTable::new(1 << 16);
        let mut heuristics = Heuristics::new();
        let stats = SearchStats::new();
        let halt = AtomicBool::new(false);
        let mut board_for_root = board.clone();
        let mut root = RootMoveList::new(&mut board_for_root, &heuristics);

        for depth in 1..=4 {
            let mut searcher = FixedDepthSearcher::new(
                &board, depth, &table, &mut heuristics, &stats, &halt,
            );
            let line = searcher.search(&mut root);
            assert!(line.is_valid());
            root.sort();
        }
        assert!(stats.table_hits() > 0);
        // The PV must replay legally from the root position.
        let mut replay = board.clone();
        let mut searcher =
            FixedDepthSearcher::new(&board, 4, &table, &mut heuristics, &stats, &halt);
        let line = searcher.search(&mut root);
        for mv in line.moves {
            assert!(replay.is_legal_move(mv));
            replay.make_move::<{ update::ALL }>(mv);
        }
    }
}
