//! Board state invariants: make/unmake restoration, Zobrist consistency,
//! FEN round trips and move encoding properties.

use ferrum::board::{update, Board, Color, Move, Piece, Square};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TEST_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
];

#[test]
fn make_unmake_restores_every_field() {
    for fen in TEST_FENS {
        let mut board = Board::from_fen(fen);
        let before = board.clone();
        let before_fen = board.to_fen();
        let moves = board.generate_moves();
        for &mv in &moves {
            let info = board.make_move::<{ update::ALL }>(mv);
            board.unmake_move::<{ update::ALL }>(mv, info);
            assert_eq!(board, before, "state drift after {mv} in {fen}");
            assert_eq!(board.to_fen(), before_fen, "FEN drift after {mv} in {fen}");
        }
    }
}

#[test]
fn incremental_hash_tracks_recomputation_through_random_games() {
    let mut rng = StdRng::seed_from_u64(20_240_817);
    for game in 0..20 {
        let mut board = Board::new();
        let initial = board.clone();
        let mut played = Vec::new();

        for _ in 0..60 {
            let moves = board.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            let info = board.make_move::<{ update::ALL }>(mv);
            played.push((mv, info));
            assert_eq!(
                board.hash(),
                board.calculate_hash(),
                "incremental hash diverged in game {game} after {mv}"
            );
        }

        for (mv, info) in played.into_iter().rev() {
            board.unmake_move::<{ update::ALL }>(mv, info);
        }
        assert_eq!(board, initial, "game {game} failed to rewind");
    }
}

#[test]
fn piece_array_and_bitboards_agree_everywhere() {
    for fen in TEST_FENS {
        let board = Board::from_fen(fen);
        for index in 0..64 {
            let sq = Square::from_index(index);
            match board.piece_at(sq) {
                Some((color, piece)) => {
                    // The square's bit must be set in exactly one bitboard.
                    for c in [Color::White, Color::Black] {
                        for p in [
                            Piece::Pawn,
                            Piece::Knight,
                            Piece::Bishop,
                            Piece::Rook,
                            Piece::Queen,
                            Piece::King,
                        ] {
                            assert_eq!(
                                board.bitboard(c, p).contains(sq),
                                c == color && p == piece,
                                "bitboard mismatch at {sq} in {fen}"
                            );
                        }
                    }
                }
                None => {
                    for c in [Color::White, Color::Black] {
                        for p in [
                            Piece::Pawn,
                            Piece::Knight,
                            Piece::Bishop,
                            Piece::Rook,
                            Piece::Queen,
                            Piece::King,
                        ] {
                            assert!(
                                !board.bitboard(c, p).contains(sq),
                                "ghost piece at {sq} in {fen}"
                            );
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn fifty_move_counter_and_repetition() {
    let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 98 60");
    assert!(!board.is_fifty_move_draw());
    let mv = board.parse_move("a1a2").unwrap();
    board.make_move::<{ update::ALL }>(mv);
    assert!(!board.is_fifty_move_draw());
    let mv = board.parse_move("e8d8").unwrap();
    board.make_move::<{ update::ALL }>(mv);
    assert!(board.is_fifty_move_draw());
}

proptest! {
    #[test]
    fn move_encoding_round_trips(from in 0usize..64, to in 0usize..64, promo in 0usize..4, capture: bool) {
        let from_sq = Square::from_index(from);
        let to_sq = Square::from_index(to);
        let piece = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen][promo];
        let mv = Move::promotion(from_sq, to_sq, piece, capture);
        prop_assert_eq!(mv.from(), from_sq);
        prop_assert_eq!(mv.to(), to_sq);
        prop_assert_eq!(mv.promotion_piece(), Some(piece));
        prop_assert_eq!(mv.is_capture(), capture);
        prop_assert!(mv.is_promotion());

        let quiet = Move::quiet(from_sq, to_sq);
        prop_assert_eq!(quiet.from(), from_sq);
        prop_assert_eq!(quiet.to(), to_sq);
        prop_assert!(!quiet.is_capture());
        prop_assert_eq!(quiet.promotion_piece(), None);
    }

    #[test]
    fn square_notation_round_trips(index in 0usize..64) {
        let sq = Square::from_index(index);
        let parsed: Square = sq.to_string().parse().unwrap();
        prop_assert_eq!(parsed, sq);
    }
}

#[cfg(feature = "serde")]
#[test]
fn moves_serialize_round_trip() {
    let mut board = Board::new();
    let mv = board.parse_move("e2e4").unwrap();
    let json = serde_json::to_string(&mv).unwrap();
    let back: Move = serde_json::from_str(&json).unwrap();
    assert_eq!(back, mv);
}
