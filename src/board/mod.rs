//! Board representation and move generation.
//!
//! Bitboard-based position with incremental make/unmake, precomputed
//! attack tables and legality-filtered move generation.

pub(crate) mod attacks;
mod error;
mod fen;
mod make_unmake;
mod movegen;
mod state;
mod types;

pub use error::{FenError, MoveParseError, SquareError};
pub use make_unmake::{update, MakeInfo, NullMoveInfo};
pub use movegen::GenFilter;
pub use state::{Board, START_FEN};
pub use types::{
    Bitboard, BitboardIter, CastlingRights, Color, Move, MoveList, Piece, ScoredMove,
    ScoredMoveList, Square,
};

pub(crate) use types::{
    file_mask, file_to_index, rank_mask, rank_to_index, ALL_PIECES, PROMOTION_PIECES,
};
