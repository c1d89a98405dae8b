//! Static evaluation.
//!
//! Centipawn score from the side to move's point of view: material,
//! bishop pair, tapered piece-square tables, opening king safety and a
//! tempo bonus. The searcher depends only on [`evaluate`] (and its
//! windowed variant, which may stop after the cheap terms when they
//! already land far outside the window).

pub(crate) mod pst;

use crate::board::attacks;
use crate::board::{file_mask, Bitboard, Board, Color, Piece, Square};

/// Side-to-move bonus.
const TEMPO_BONUS: i32 = 10;

/// Bonus for owning both bishops.
const BISHOP_PAIR_BONUS: i32 = 30;

/// If the fast terms already clear the window by this much, the slow
/// terms cannot bring the score back inside it.
const LAZY_MARGIN: i32 = 400;

/// King-zone pressure weight per attacked square, by attacker kind.
const ZONE_ATTACK_WEIGHTS: [i32; 6] = [0, 2, 2, 3, 5, 0];

/// Evaluate the position for the side to move.
#[must_use]
pub fn evaluate(board: &Board) -> i32 {
    evaluate_with_window(board, i32::MIN / 2, i32::MAX / 2)
}

/// Evaluate with a lazy shortcut: when material plus piece-square values
/// land outside `(alpha, beta)` by [`LAZY_MARGIN`], the remaining terms
/// are skipped.
#[must_use]
pub(crate) fn evaluate_with_window(board: &Board, alpha: i32, beta: i32) -> i32 {
    let us = board.turn();
    let them = us.opponent();
    let phase = pst::game_phase(board);

    let mut score = board.material(us) - board.material(them);
    score += piece_square_score(board, us, phase) - piece_square_score(board, them, phase);
    score += TEMPO_BONUS;

    if score - LAZY_MARGIN >= beta || score + LAZY_MARGIN <= alpha {
        return score;
    }

    score += bishop_pair(board, us) - bishop_pair(board, them);

    // King safety only matters while enough attackers remain; taper it
    // out with the phase.
    let safety = king_safety(board, us) - king_safety(board, them);
    score += safety * phase / pst::PHASE_TOTAL;

    score
}

fn piece_square_score(board: &Board, color: Color, phase: i32) -> i32 {
    let white = color == Color::White;
    let mut score = 0;
    for piece in crate::board::ALL_PIECES {
        for sq in board.bitboard(color, piece) {
            score += pst::interpolate(piece, sq, white, phase);
        }
    }
    score
}

fn bishop_pair(board: &Board, color: Color) -> i32 {
    if board.bitboard(color, Piece::Bishop).count() >= 2 {
        BISHOP_PAIR_BONUS
    } else {
        0
    }
}

/// Shield pawns in front of a castled king plus enemy pressure on the
/// king's zone. Positive is good for `color`.
fn king_safety(board: &Board, color: Color) -> i32 {
    pawn_shield(board, color) - king_zone_pressure(board, color)
}

/// Pawn cover on the three files around a king that has castled (or sits
/// on its back two ranks near a wing). Missing shield pawns are worse on
/// files the enemy has opened.
fn pawn_shield(board: &Board, color: Color) -> i32 {
    let king = board.king(color);
    let white = color == Color::White;
    let on_home_ranks = if white { king.rank() <= 1 } else { king.rank() >= 6 };
    if !on_home_ranks {
        return 0;
    }
    let files: &[usize] = if king.file() >= 5 {
        &[5, 6, 7]
    } else if king.file() <= 2 {
        &[0, 1, 2]
    } else {
        return 0;
    };

    let (near_rank, far_rank) = if white { (1, 2) } else { (6, 5) };
    let pawns = board.bitboard(color, Piece::Pawn);
    let them = color.opponent();
    let enemy_pawns = board.bitboard(them, Piece::Pawn);
    let enemy_rooks = board.bitboard(them, Piece::Rook) | board.bitboard(them, Piece::Queen);

    let mut score = 0;
    for &file in files {
        if pawns.contains(Square::new(near_rank, file)) {
            score += 10;
        } else if pawns.contains(Square::new(far_rank, file)) {
            score += 8;
        } else {
            score -= 8;
            let file_squares = Bitboard(file_mask(file));
            if (enemy_pawns & file_squares).is_empty() {
                score -= 8;
                if !(enemy_rooks & file_squares).is_empty() {
                    score -= 8;
                }
            }
        }
    }
    score
}

/// Weighted count of enemy attacks into the squares adjacent to the king.
/// Sliders go through the x-ray lookups so a doubled battery presses with
/// every piece in it.
fn king_zone_pressure(board: &Board, color: Color) -> i32 {
    let king = board.king(color);
    let zone = attacks::king_attacks(king) | Bitboard::from_square(king);
    let them = color.opponent();
    let occupied = board.all_occupied();

    let enemy_diagonal =
        board.bitboard(them, Piece::Bishop) | board.bitboard(them, Piece::Queen);
    let enemy_orthogonal =
        board.bitboard(them, Piece::Rook) | board.bitboard(them, Piece::Queen);

    let mut pressure = 0i32;
    for sq in board.bitboard(them, Piece::Knight) {
        pressure += ZONE_ATTACK_WEIGHTS[Piece::Knight.index()]
            * (attacks::knight_attacks(sq) & zone).count() as i32;
    }
    for sq in board.bitboard(them, Piece::Bishop) {
        pressure += ZONE_ATTACK_WEIGHTS[Piece::Bishop.index()]
            * (attacks::bishop_xray_attacks(sq, occupied, enemy_diagonal) & zone).count() as i32;
    }
    for sq in board.bitboard(them, Piece::Rook) {
        pressure += ZONE_ATTACK_WEIGHTS[Piece::Rook.index()]
            * (attacks::rook_xray_attacks(sq, occupied, enemy_orthogonal) & zone).count() as i32;
    }
    for sq in board.bitboard(them, Piece::Queen) {
        let reach = attacks::bishop_xray_attacks(sq, occupied, enemy_diagonal)
            | attacks::rook_xray_attacks(sq, occupied, enemy_orthogonal);
        pressure += ZONE_ATTACK_WEIGHTS[Piece::Queen.index()] * (reach & zone).count() as i32;
    }
    pressure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_is_near_balanced() {
        let board = Board::new();
        let score = evaluate(&board);
        // Only the tempo bonus separates the sides.
        assert_eq!(score, TEMPO_BONUS);
    }

    #[test]
    fn evaluation_is_symmetric() {
        // Mirrored position: the score must be identical for both sides.
        let white_view =
            Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/4P3/2N2N2/PPPP1PPP/R1BQKB1R w KQkq - 4 4");
        let black_view =
            Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/4P3/2N2N2/PPPP1PPP/R1BQKB1R b KQkq - 4 4");
        assert_eq!(evaluate(&white_view), evaluate(&black_view));
    }

    #[test]
    fn material_advantage_dominates() {
        // White is up a queen.
        let board = Board::from_fen("3k4/8/8/8/8/8/8/3QK3 w - - 0 1");
        assert!(evaluate(&board) > Piece::Queen.value() / 2);
        let board = Board::from_fen("3k4/8/8/8/8/8/8/3QK3 b - - 0 1");
        assert!(evaluate(&board) < -Piece::Queen.value() / 2);
    }

    #[test]
    fn bishop_pair_is_rewarded() {
        let pair = Board::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1");
        let single = Board::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert!(evaluate(&pair) > evaluate(&single) + Piece::Bishop.value() / 2);
    }

    #[test]
    fn shield_pawns_help_the_castled_king() {
        let sheltered =
            Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1");
        let exposed = Board::from_fen("6k1/5ppp/8/8/8/5PPP/8/6K1 w - - 0 1");
        assert!(pawn_shield(&sheltered, Color::White) > pawn_shield(&exposed, Color::White));
    }

    #[test]
    fn lazy_window_shortcut_matches_sign() {
        // A huge material edge: the lazy cut must still report a score on
        // the right side of the window.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/QQQQK3 w - - 0 1");
        let lazy = evaluate_with_window(&board, -50, 50);
        let full = evaluate(&board);
        assert!(lazy > 50);
        assert!(full > 50);
    }

    #[test]
    fn king_zone_pressure_counts_batteries() {
        // Doubled rooks on the g-file both hit the king zone thanks to
        // the co-typed x-ray.
        let doubled = Board::from_fen("6k1/8/8/8/8/6R1/6R1/4K3 b - - 0 1");
        let single = Board::from_fen("6k1/8/8/8/8/6R1/8/4K3 b - - 0 1");
        assert!(
            king_zone_pressure(&doubled, Color::Black)
                > king_zone_pressure(&single, Color::Black)
        );
    }
}
