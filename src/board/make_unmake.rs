//! Making and unmaking moves.
//!
//! `make_move` and `unmake_move` are the only position mutators during
//! search. Both are parameterised by a const bitmask selecting which
//! invariants to maintain, so the conditional bodies specialise away at
//! monomorphisation. The caller must unmake with the same flag set it made
//! with; only the three sets named in [`update`] are supported.

use super::{Board, CastlingRights, Color, Move, Piece, Square};
use crate::zobrist;

/// Flag sets for [`Board::make_move`] / [`Board::unmake_move`].
pub mod update {
    /// Piece array, bitboards, material and king caches only. Enough to
    /// ask "is my king attacked after this move".
    pub const BOARD_ONLY: u8 = 0;
    /// Maintain the Zobrist hash as well.
    pub const HASH: u8 = 1 << 0;
    /// Maintain castling rights, en passant, clocks and repetition history.
    pub const GAMEPLAY: u8 = 1 << 1;
    /// Flip the side to move.
    pub const TURN: u8 = 1 << 2;

    /// Everything except the turn field; the hash still flips its
    /// side-to-move key.
    pub const NO_TURN: u8 = HASH | GAMEPLAY;
    /// Everything.
    pub const ALL: u8 = HASH | GAMEPLAY | TURN;
}

/// State saved by `make_move`, consumed by `unmake_move`.
#[derive(Clone, Copy, Debug)]
pub struct MakeInfo {
    pub(crate) hash: u64,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) captured: Option<Piece>,
}

impl MakeInfo {
    /// The piece the move captured, if any.
    #[inline]
    #[must_use]
    pub fn captured(&self) -> Option<Piece> {
        self.captured
    }
}

/// State saved by `make_null_move`.
#[derive(Clone, Copy, Debug)]
pub struct NullMoveInfo {
    hash: u64,
    en_passant: Option<Square>,
}

/// The castling right tied to a corner square, if the square is a corner.
#[inline]
fn corner_right(sq: Square) -> Option<CastlingRights> {
    match sq.index() {
        0 => Some(CastlingRights::WHITE_QUEENSIDE),
        7 => Some(CastlingRights::WHITE_KINGSIDE),
        56 => Some(CastlingRights::BLACK_QUEENSIDE),
        63 => Some(CastlingRights::BLACK_KINGSIDE),
        _ => None,
    }
}

/// The square a pawn captured en passant actually stood on.
#[inline]
fn en_passant_victim_square(mv: Move) -> Square {
    Square::new(mv.from().rank(), mv.to().file())
}

/// Rook from/to files for a castle, keyed on the king's destination file.
#[inline]
fn castle_rook_files(mv: Move) -> (usize, usize) {
    if mv.to().file() == 6 {
        (7, 5)
    } else {
        (0, 3)
    }
}

impl Board {
    /// Make a move, maintaining the invariants selected by `UPDATE`, and
    /// return the record `unmake_move` needs to restore the position.
    pub fn make_move<const UPDATE: u8>(&mut self, mv: Move) -> MakeInfo {
        let keys = zobrist::keys();
        let mover = self.turn;
        let mut info = MakeInfo {
            hash: self.hash,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            captured: None,
        };

        if UPDATE & update::GAMEPLAY != 0 {
            self.history.push(self.hash);
        }

        let mut hash = self.hash;

        // Remove the captured piece first so the destination is free. For
        // en passant the victim is beside the destination, not on it.
        if mv.is_capture() {
            let victim_sq = if mv.is_en_passant() {
                en_passant_victim_square(mv)
            } else {
                mv.to()
            };
            let (victim_color, victim) = self
                .piece_at(victim_sq)
                .expect("capture move with empty target");
            self.remove_piece(victim_sq, victim_color, victim);
            hash ^= keys.piece[victim_color.index()][victim.index()][victim_sq.index()];
            info.captured = Some(victim);
        }

        let (_, piece) = self.piece_at(mv.from()).expect("no piece on from-square");

        if mv.is_castle() {
            // King first, then the rook from its corner to the adjacent
            // square.
            self.remove_piece(mv.from(), mover, Piece::King);
            self.set_piece(mv.to(), mover, Piece::King);
            hash ^= keys.piece[mover.index()][Piece::King.index()][mv.from().index()];
            hash ^= keys.piece[mover.index()][Piece::King.index()][mv.to().index()];

            let (rook_from_file, rook_to_file) = castle_rook_files(mv);
            let rook_from = Square::new(mv.to().rank(), rook_from_file);
            let rook_to = Square::new(mv.to().rank(), rook_to_file);
            self.remove_piece(rook_from, mover, Piece::Rook);
            self.set_piece(rook_to, mover, Piece::Rook);
            hash ^= keys.piece[mover.index()][Piece::Rook.index()][rook_from.index()];
            hash ^= keys.piece[mover.index()][Piece::Rook.index()][rook_to.index()];
        } else if let Some(promoted) = mv.promotion_piece() {
            self.remove_piece(mv.from(), mover, Piece::Pawn);
            self.set_piece(mv.to(), mover, promoted);
            hash ^= keys.piece[mover.index()][Piece::Pawn.index()][mv.from().index()];
            hash ^= keys.piece[mover.index()][promoted.index()][mv.to().index()];
        } else {
            self.remove_piece(mv.from(), mover, piece);
            self.set_piece(mv.to(), mover, piece);
            hash ^= keys.piece[mover.index()][piece.index()][mv.from().index()];
            hash ^= keys.piece[mover.index()][piece.index()][mv.to().index()];
        }

        if UPDATE & update::GAMEPLAY != 0 {
            // En passant target: cleared, then set again behind a double
            // push.
            hash ^= keys.en_passant_file[zobrist::en_passant_index(self.en_passant)];
            self.en_passant = if mv.is_double_pawn_push() {
                let between = Square::new(
                    (mv.from().rank() + mv.to().rank()) / 2,
                    mv.from().file(),
                );
                Some(between)
            } else {
                None
            };
            hash ^= keys.en_passant_file[zobrist::en_passant_index(self.en_passant)];

            // Castling rights. Rights are revoked purely by square: a right
            // can only be present while its rook is still home, so a corner
            // square seeing traffic always means the matching right dies.
            let old_rights = self.castling;
            if piece == Piece::King {
                self.castling.revoke(CastlingRights::both(mover));
            } else if piece == Piece::Rook {
                if let Some(right) = corner_right(mv.from()) {
                    self.castling.revoke(right);
                }
            }
            if info.captured == Some(Piece::Rook) {
                if let Some(right) = corner_right(mv.to()) {
                    self.castling.revoke(right);
                }
            }
            if old_rights != self.castling {
                hash ^= keys.castling[old_rights.bits() as usize];
                hash ^= keys.castling[self.castling.bits() as usize];
            }

            // A revoked castling right is technically irreversible too, but
            // deliberately does not reset this counter; the only cost is
            // extra repetition-stack scanning.
            if mv.is_capture() || mv.is_castle() || mv.is_promotion() || piece == Piece::Pawn {
                self.halfmove_clock = 0;
            } else {
                self.halfmove_clock += 1;
            }
            if mover == Color::Black {
                self.fullmove_number += 1;
            }
        }

        if UPDATE & update::HASH != 0 {
            hash ^= keys.black_to_move;
            self.hash = hash;
        }
        if UPDATE & update::TURN != 0 {
            self.turn = mover.opponent();
        }

        info
    }

    /// Undo a move made with the same `UPDATE` flags, restoring every
    /// selected invariant bit-for-bit.
    pub fn unmake_move<const UPDATE: u8>(&mut self, mv: Move, info: MakeInfo) {
        if UPDATE & update::TURN != 0 {
            self.turn = self.turn.opponent();
        }
        let mover = self.turn;

        if UPDATE & update::GAMEPLAY != 0 {
            self.history.pop();
            self.castling = info.castling;
            self.en_passant = info.en_passant;
            self.halfmove_clock = info.halfmove_clock;
            if mover == Color::Black {
                self.fullmove_number -= 1;
            }
        }
        if UPDATE & update::HASH != 0 {
            self.hash = info.hash;
        }

        if mv.is_castle() {
            self.remove_piece(mv.to(), mover, Piece::King);
            self.set_piece(mv.from(), mover, Piece::King);
            let (rook_from_file, rook_to_file) = castle_rook_files(mv);
            let rook_from = Square::new(mv.to().rank(), rook_from_file);
            let rook_to = Square::new(mv.to().rank(), rook_to_file);
            self.remove_piece(rook_to, mover, Piece::Rook);
            self.set_piece(rook_from, mover, Piece::Rook);
        } else {
            let (_, piece_on_to) = self
                .piece_at(mv.to())
                .expect("unmake with empty to-square");
            self.remove_piece(mv.to(), mover, piece_on_to);
            let original = if mv.is_promotion() {
                Piece::Pawn
            } else {
                piece_on_to
            };
            self.set_piece(mv.from(), mover, original);
        }

        if let Some(captured) = info.captured {
            let victim_sq = if mv.is_en_passant() {
                en_passant_victim_square(mv)
            } else {
                mv.to()
            };
            self.set_piece(victim_sq, mover.opponent(), captured);
        }
    }

    /// Flip only the side to move and clear the en passant target.
    pub fn make_null_move(&mut self) -> NullMoveInfo {
        let keys = zobrist::keys();
        let info = NullMoveInfo {
            hash: self.hash,
            en_passant: self.en_passant,
        };
        self.hash ^= keys.black_to_move;
        self.hash ^= keys.en_passant_file[zobrist::en_passant_index(self.en_passant)];
        self.en_passant = None;
        self.turn = self.turn.opponent();
        info
    }

    pub fn unmake_null_move(&mut self, info: NullMoveInfo) {
        self.turn = self.turn.opponent();
        self.en_passant = info.en_passant;
        self.hash = info.hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    fn restores_exactly(fen: &str) {
        let mut board = Board::from_fen(fen);
        let before = board.clone();
        let moves = board.generate_moves();
        assert!(!moves.is_empty(), "no legal moves in {fen}");
        for &mv in &moves {
            let info = board.make_move::<{ update::ALL }>(mv);
            assert_eq!(board.hash, board.calculate_hash(), "hash drift after {mv}");
            board.unmake_move::<{ update::ALL }>(mv, info);
            assert_eq!(board, before, "unmake failed to restore after {mv}");
        }
    }

    #[test]
    fn make_unmake_restores_start_position() {
        restores_exactly(START_FEN);
    }

    #[test]
    fn make_unmake_restores_tactical_positions() {
        // Kiwipete: castles both ways, promotions nearby, en passant traffic.
        restores_exactly("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        // En passant pin position.
        restores_exactly("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        // Promotion race.
        restores_exactly("8/P6k/8/8/8/8/p6K/8 w - - 0 1");
    }

    #[test]
    fn board_only_flags_restore_board() {
        let mut board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        );
        let before = board.clone();
        let moves = board.generate_moves();
        for &mv in &moves {
            let info = board.make_move::<{ update::BOARD_ONLY }>(mv);
            // Hash, clocks and turn must be untouched by a board-only make.
            assert_eq!(board.hash, before.hash);
            assert_eq!(board.turn, before.turn);
            assert_eq!(board.halfmove_clock, before.halfmove_clock);
            board.unmake_move::<{ update::BOARD_ONLY }>(mv, info);
            assert_eq!(board, before);
        }
    }

    #[test]
    fn no_turn_flags_flip_hash_but_not_turn() {
        let mut board = Board::new();
        let before = board.clone();
        let mv = board.parse_move("e2e4").unwrap();
        let info = board.make_move::<{ update::NO_TURN }>(mv);
        assert_eq!(board.turn, Color::White);
        // The hash speaks for the position after the move, black to move.
        let mut reference = board.clone();
        reference.turn = Color::Black;
        assert_eq!(board.hash, reference.calculate_hash());
        board.unmake_move::<{ update::NO_TURN }>(mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn en_passant_capture_removes_victim_beside_destination() {
        let mut board = Board::from_fen(
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        );
        let mv = board.parse_move("e5d6").unwrap();
        let info = board.make_move::<{ update::ALL }>(mv);
        assert_eq!(board.piece_at(Square::new(4, 3)), None);
        assert_eq!(
            board.piece_at(Square::new(5, 3)),
            Some((Color::White, Piece::Pawn))
        );
        assert_eq!(info.captured(), Some(Piece::Pawn));
        board.unmake_move::<{ update::ALL }>(mv, info);
        assert_eq!(
            board.piece_at(Square::new(4, 3)),
            Some((Color::Black, Piece::Pawn))
        );
    }

    #[test]
    fn castle_moves_rook_too() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mv = board.parse_move("e1g1").unwrap();
        let info = board.make_move::<{ update::ALL }>(mv);
        assert_eq!(
            board.piece_at(Square::new(0, 6)),
            Some((Color::White, Piece::King))
        );
        assert_eq!(
            board.piece_at(Square::new(0, 5)),
            Some((Color::White, Piece::Rook))
        );
        assert!(!board.castling_rights().has(CastlingRights::WHITE_KINGSIDE));
        assert!(!board.castling_rights().has(CastlingRights::WHITE_QUEENSIDE));
        board.unmake_move::<{ update::ALL }>(mv, info);
        assert!(board.castling_rights().has(CastlingRights::WHITE_KINGSIDE));
    }

    #[test]
    fn capturing_corner_rook_revokes_right() {
        let mut board = Board::from_fen("r3k3/8/8/8/8/8/8/R3K2B w Q q - 0 1");
        let mv = board.parse_move("h1a8").unwrap();
        let info = board.make_move::<{ update::ALL }>(mv);
        assert!(!board.castling_rights().has(CastlingRights::BLACK_QUEENSIDE));
        board.unmake_move::<{ update::ALL }>(mv, info);
        assert!(board.castling_rights().has(CastlingRights::BLACK_QUEENSIDE));
    }

    #[test]
    fn null_move_round_trip() {
        let mut board = Board::from_fen(
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        );
        let before = board.clone();
        let info = board.make_null_move();
        assert_eq!(board.turn(), Color::Black);
        assert_eq!(board.en_passant_target(), None);
        assert_eq!(board.hash, board.calculate_hash());
        board.unmake_null_move(info);
        assert_eq!(board, before);
    }

    #[test]
    fn halfmove_clock_resets_on_irreversible_moves() {
        let mut board = Board::from_fen("4k3/8/8/8/8/8/4P3/4K2R w K - 7 20");
        let quiet = board.parse_move("h1h2").unwrap();
        let info = board.make_move::<{ update::ALL }>(quiet);
        assert_eq!(board.halfmove_clock(), 8);
        board.unmake_move::<{ update::ALL }>(quiet, info);

        let pawn = board.parse_move("e2e4").unwrap();
        let info = board.make_move::<{ update::ALL }>(pawn);
        assert_eq!(board.halfmove_clock(), 0);
        board.unmake_move::<{ update::ALL }>(pawn, info);
        assert_eq!(board.halfmove_clock(), 7);
    }
}
