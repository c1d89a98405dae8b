//! Static exchange evaluation.
//!
//! Estimates the net material change of a capture assuming both sides keep
//! recapturing on the destination square with their least valuable
//! attacker until one side stands down. Implemented as the iterative swap
//! algorithm over a small score stack, with x-ray attackers re-included as
//! pieces in front of them are consumed.

use crate::board::attacks;
use crate::board::{update, Bitboard, Board, Color, Move, Piece, Square, ALL_PIECES};

/// Longest capture chain the score stack can hold: at most 32 pieces can
/// converge on one square.
const MAX_EXCHANGE_DEPTH: usize = 32;

/// Material values for exchange purposes. The king is effectively
/// infinite so no sequence ever profits by exposing it; it still acts as
/// a last-resort capturer when nothing else attacks the square.
#[inline]
const fn exchange_value(piece: Piece) -> i32 {
    match piece {
        Piece::King => 200_000,
        _ => piece.value(),
    }
}

/// Every piece of either color attacking `square` under `occupied`.
#[inline]
fn all_attackers(
    board: &Board,
    square: Square,
    diagonal_sliders: Bitboard,
    orthogonal_sliders: Bitboard,
    occupied: Bitboard,
) -> Bitboard {
    (attacks::pawn_attacks(Color::White, square) & board.bitboard(Color::Black, Piece::Pawn))
        | (attacks::pawn_attacks(Color::Black, square) & board.bitboard(Color::White, Piece::Pawn))
        | (attacks::knight_attacks(square)
            & (board.bitboard(Color::White, Piece::Knight)
                | board.bitboard(Color::Black, Piece::Knight)))
        | (attacks::king_attacks(square)
            & (board.bitboard(Color::White, Piece::King)
                | board.bitboard(Color::Black, Piece::King)))
        | (attacks::bishop_attacks(square, occupied) & diagonal_sliders)
        | (attacks::rook_attacks(square, occupied) & orthogonal_sliders)
}

/// The least valuable attacker of `side` among `attackers`: its bit and
/// its exchange value.
#[inline]
fn least_valuable_attacker(
    board: &Board,
    side: Color,
    attackers: Bitboard,
) -> Option<(Bitboard, i32)> {
    for piece in ALL_PIECES {
        let candidates = attackers & board.bitboard(side, piece);
        if let Some(sq) = candidates.first() {
            return Some((Bitboard::from_square(sq), exchange_value(piece)));
        }
    }
    None
}

/// Net material delta of playing the capture `mv`, positive when the
/// exchange favors the mover.
pub fn evaluate(board: &mut Board, mv: Move) -> i32 {
    // Only the piece placement matters for the swap, so a bitboards-only
    // make suffices and is cheap to undo.
    let info = board.make_move::<{ update::BOARD_ONLY }>(mv);

    let mut score = info.captured().map_or(0, exchange_value);
    score += swap_score(board, mv.to());

    board.unmake_move::<{ update::BOARD_ONLY }>(mv, info);
    score
}

/// Value of the capture sequence that starts with the opponent of the
/// piece now standing on `square`. Zero or negative: continuing an
/// exchange can only cost the piece's owner.
fn swap_score(board: &Board, square: Square) -> i32 {
    let Some((owner, target)) = board.piece_at(square) else {
        return 0;
    };

    let mut scores = [0i32; MAX_EXCHANGE_DEPTH];
    let mut depth = 1usize;
    let mut side = owner.opponent();

    let mut diagonal_sliders = board.bitboard(Color::White, Piece::Bishop)
        | board.bitboard(Color::Black, Piece::Bishop)
        | board.bitboard(Color::White, Piece::Queen)
        | board.bitboard(Color::Black, Piece::Queen);
    let mut orthogonal_sliders = board.bitboard(Color::White, Piece::Rook)
        | board.bitboard(Color::Black, Piece::Rook)
        | board.bitboard(Color::White, Piece::Queen)
        | board.bitboard(Color::Black, Piece::Queen);

    // Pieces that sliders can be hiding behind.
    let diagonal_xray = board.bitboard(Color::White, Piece::Pawn)
        | board.bitboard(Color::Black, Piece::Pawn)
        | diagonal_sliders;
    let orthogonal_xray = orthogonal_sliders;

    let mut occupied = board.all_occupied();
    let mut attackers =
        all_attackers(board, square, diagonal_sliders, orthogonal_sliders, occupied);
    let mut capture_value = exchange_value(target);

    while depth < MAX_EXCHANGE_DEPTH {
        let Some((attacker, attacker_value)) =
            least_valuable_attacker(board, side, attackers & occupied)
        else {
            break;
        };

        scores[depth] = capture_value - scores[depth - 1];

        // Neither continuing nor having continued can profit anyone; the
        // rest of the sequence cannot change the outcome.
        if (-scores[depth - 1]).max(scores[depth]) < 0 {
            break;
        }

        // Consume the attacker and surface anything x-raying through it.
        occupied ^= attacker;
        attackers ^= attacker;
        diagonal_sliders &= !attacker;
        orthogonal_sliders &= !attacker;
        if !(attacker & diagonal_xray).is_empty() {
            attackers |= attacks::bishop_attacks(square, occupied) & diagonal_sliders;
        } else if !(attacker & orthogonal_xray).is_empty() {
            attackers |= attacks::rook_attacks(square, occupied) & orthogonal_sliders;
        }

        capture_value = attacker_value;
        depth += 1;
        side = side.opponent();
    }

    // Negamax-fold the stack from the leaf up: at each level the side to
    // move picks between stopping and capturing.
    while depth > 1 {
        depth -= 1;
        scores[depth - 1] = -(-scores[depth - 1]).max(scores[depth]);
    }
    scores[0]
}
