//! Move generation.
//!
//! Pseudo-legal moves are written into a caller-supplied flat buffer, then
//! filtered for legality with a bitboards-only make and a king-attack
//! probe. A tactical-only filter serves quiescence; a quiet-only filter
//! serves the staged move stream.

use super::attacks;
use super::{
    rank_mask, update, Bitboard, Board, Color, Move, MoveList, Piece, Square, PROMOTION_PIECES,
};

/// Which subset of pseudo-legal moves to emit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenFilter {
    /// Every move.
    All,
    /// Captures, promotions and en passant only.
    Tactical,
    /// Everything that is neither a capture nor a promotion, castles
    /// included.
    Quiet,
}

impl GenFilter {
    #[inline]
    fn wants_tactical(self) -> bool {
        !matches!(self, GenFilter::Quiet)
    }

    #[inline]
    fn wants_quiet(self) -> bool {
        !matches!(self, GenFilter::Tactical)
    }
}

impl Board {
    /// Write the side to move's pseudo-legal moves into `out`.
    pub(crate) fn generate_pseudo_legal(&self, filter: GenFilter, out: &mut MoveList) {
        let us = self.turn;
        self.pawn_moves(us, filter, out);
        self.leaper_moves(us, Piece::Knight, filter, out);
        self.slider_moves(us, Piece::Bishop, filter, out);
        self.slider_moves(us, Piece::Rook, filter, out);
        self.slider_moves(us, Piece::Queen, filter, out);
        self.leaper_moves(us, Piece::King, filter, out);
        if filter.wants_quiet() {
            self.castle_moves(us, out);
        }
    }

    fn pawn_moves(&self, us: Color, filter: GenFilter, out: &mut MoveList) {
        let white = us.is_white();
        let pawns = self.bitboard(us, Piece::Pawn);
        let enemy = self.occupied_by(us.opponent());
        let empty = !self.all_occupied();
        let promotion_rank = if white { 7 } else { 0 };
        let push_offset: isize = if white { 8 } else { -8 };

        // Pushes come from whole-set shifts; captures from the per-square
        // attack table.
        let single = pawns.shift_forward(white) & empty;
        for to in single {
            let from = Square::from_index((to.index() as isize - push_offset) as usize);
            if to.rank() == promotion_rank {
                if filter.wants_tactical() {
                    for promoted in PROMOTION_PIECES {
                        out.push(Move::promotion(from, to, promoted, false));
                    }
                }
            } else if filter.wants_quiet() {
                out.push(Move::quiet(from, to));
            }
        }

        if filter.wants_quiet() {
            let double_origin_rank = if white { rank_mask(2) } else { rank_mask(5) };
            let double = (single & Bitboard(double_origin_rank)).shift_forward(white) & empty;
            for to in double {
                let from = Square::from_index((to.index() as isize - 2 * push_offset) as usize);
                out.push(Move::double_pawn_push(from, to));
            }
        }

        if filter.wants_tactical() {
            for from in pawns {
                let targets = attacks::pawn_attacks(us, from) & enemy;
                for to in targets {
                    if to.rank() == promotion_rank {
                        for promoted in PROMOTION_PIECES {
                            out.push(Move::promotion(from, to, promoted, true));
                        }
                    } else {
                        out.push(Move::capture(from, to));
                    }
                }
            }

            if let Some(target) = self.en_passant {
                // The pawns able to capture en passant are exactly those a
                // pawn of the other color on the target square would attack.
                let candidates = attacks::pawn_attacks(us.opponent(), target) & pawns;
                for from in candidates {
                    out.push(Move::en_passant(from, target));
                }
            }
        }
    }

    fn leaper_moves(&self, us: Color, piece: Piece, filter: GenFilter, out: &mut MoveList) {
        let enemy = self.occupied_by(us.opponent());
        let empty = !self.all_occupied();
        for from in self.bitboard(us, piece) {
            let reach = match piece {
                Piece::Knight => attacks::knight_attacks(from),
                _ => attacks::king_attacks(from),
            };
            self.push_reach(reach, from, enemy, empty, filter, out);
        }
    }

    fn slider_moves(&self, us: Color, piece: Piece, filter: GenFilter, out: &mut MoveList) {
        let occupied = self.all_occupied();
        let enemy = self.occupied_by(us.opponent());
        let empty = !occupied;
        for from in self.bitboard(us, piece) {
            let reach = match piece {
                Piece::Bishop => attacks::bishop_attacks(from, occupied),
                Piece::Rook => attacks::rook_attacks(from, occupied),
                _ => attacks::queen_attacks(from, occupied),
            };
            self.push_reach(reach, from, enemy, empty, filter, out);
        }
    }

    #[inline]
    fn push_reach(
        &self,
        reach: Bitboard,
        from: Square,
        enemy: Bitboard,
        empty: Bitboard,
        filter: GenFilter,
        out: &mut MoveList,
    ) {
        if filter.wants_tactical() {
            for to in reach & enemy {
                out.push(Move::capture(from, to));
            }
        }
        if filter.wants_quiet() {
            for to in reach & empty {
                out.push(Move::quiet(from, to));
            }
        }
    }

    fn castle_moves(&self, us: Color, out: &mut MoveList) {
        use super::CastlingRights;

        let rank = if us.is_white() { 0 } else { 7 };
        let king_from = Square::new(rank, 4);
        let empty = !self.all_occupied();

        if self.castling.has(CastlingRights::king_side(us))
            && empty.contains(Square::new(rank, 5))
            && empty.contains(Square::new(rank, 6))
        {
            out.push(Move::castle_kingside(king_from, Square::new(rank, 6)));
        }
        if self.castling.has(CastlingRights::queen_side(us))
            && empty.contains(Square::new(rank, 1))
            && empty.contains(Square::new(rank, 2))
            && empty.contains(Square::new(rank, 3))
        {
            out.push(Move::castle_queenside(king_from, Square::new(rank, 2)));
        }
    }

    /// All legal moves for the side to move.
    #[must_use]
    pub fn generate_moves(&mut self) -> MoveList {
        self.generate_filtered(GenFilter::All)
    }

    /// Legal captures, promotions and en passant only.
    #[must_use]
    pub fn generate_tactical_moves(&mut self) -> MoveList {
        self.generate_filtered(GenFilter::Tactical)
    }

    /// Generate pseudo-legal moves under `filter`, then keep those that do
    /// not leave the mover's king attacked.
    #[must_use]
    pub fn generate_filtered(&mut self, filter: GenFilter) -> MoveList {
        let mut pseudo = MoveList::new();
        self.generate_pseudo_legal(filter, &mut pseudo);

        let mut legal = MoveList::new();
        for &mv in &pseudo {
            if self.move_is_safe(mv) {
                legal.push(mv);
            }
        }
        legal
    }

    /// Legality test for a single pseudo-legal move: castle path safety,
    /// then a bitboards-only make and a king-attack probe.
    fn move_is_safe(&mut self, mv: Move) -> bool {
        let us = self.turn;
        let them = us.opponent();

        if mv.is_castle() && !self.castle_path_safe(mv, them) {
            return false;
        }

        let info = self.make_move::<{ update::BOARD_ONLY }>(mv);
        let safe = !self.is_square_attacked(self.king(us), them);
        self.unmake_move::<{ update::BOARD_ONLY }>(mv, info);
        safe
    }

    /// The king may not castle out of, through, or into check; all three
    /// squares are tested before the move is made.
    fn castle_path_safe(&self, mv: Move, them: Color) -> bool {
        let mid = Square::new(mv.from().rank(), (mv.from().file() + mv.to().file()) / 2);
        !self.is_square_attacked(mv.from(), them)
            && !self.is_square_attacked(mid, them)
            && !self.is_square_attacked(mv.to(), them)
    }

    /// Is `mv` legal in the current position? Used to vet hash and killer
    /// moves, which may be stale or collide.
    #[must_use]
    pub fn is_legal_move(&mut self, mv: Move) -> bool {
        if !mv.is_valid() {
            return false;
        }
        let mut pseudo = MoveList::new();
        self.generate_pseudo_legal(GenFilter::All, &mut pseudo);
        pseudo.contains(mv) && self.move_is_safe(mv)
    }

    /// Is `sq` attacked by any piece of `by`? Probes each piece kind's
    /// attack set from the square outward.
    #[must_use]
    pub(crate) fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let occupied = self.all_occupied();

        if !(attacks::pawn_attacks(by.opponent(), sq) & self.bitboard(by, Piece::Pawn)).is_empty()
        {
            return true;
        }
        if !(attacks::knight_attacks(sq) & self.bitboard(by, Piece::Knight)).is_empty() {
            return true;
        }
        if !(attacks::king_attacks(sq) & self.bitboard(by, Piece::King)).is_empty() {
            return true;
        }

        let diagonal = self.bitboard(by, Piece::Bishop) | self.bitboard(by, Piece::Queen);
        if !(attacks::bishop_attacks(sq, occupied) & diagonal).is_empty() {
            return true;
        }
        let orthogonal = self.bitboard(by, Piece::Rook) | self.bitboard(by, Piece::Queen);
        !(attacks::rook_attacks(sq, occupied) & orthogonal).is_empty()
    }

    /// Is `color`'s king attacked?
    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king(color), color.opponent())
    }

    /// Count leaf positions reachable in exactly `depth` plies.
    #[must_use]
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for &mv in &moves {
            let info = self.make_move::<{ update::ALL }>(mv);
            nodes += self.perft(depth - 1);
            self.unmake_move::<{ update::ALL }>(mv, info);
        }
        nodes
    }
}
