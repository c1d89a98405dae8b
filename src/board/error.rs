//! Error types for board boundary operations.

use std::fmt;

/// FEN parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN needs at least four space-separated fields.
    TooFewFields { found: usize },
    /// Invalid piece character in the placement field.
    InvalidPiece { piece: char },
    /// Invalid castling character.
    InvalidCastling { castling: char },
    /// Side to move must be 'w' or 'b'.
    InvalidSideToMove { found: String },
    /// Invalid en passant square.
    InvalidEnPassant { found: String },
    /// Placement field does not describe exactly eight ranks.
    BadRankCount { found: usize },
    /// A rank describes more than eight files.
    TooManyFiles { rank: usize },
    /// A side is missing its king, or has more than one.
    BadKingCount,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "FEN needs at least 4 fields, found {found}")
            }
            FenError::InvalidPiece { piece } => {
                write!(f, "invalid piece character '{piece}' in FEN")
            }
            FenError::InvalidCastling { castling } => {
                write!(f, "invalid castling character '{castling}' in FEN")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::BadRankCount { found } => {
                write!(f, "FEN placement has {found} ranks, expected 8")
            }
            FenError::TooManyFiles { rank } => {
                write!(f, "too many files on rank {rank} in FEN")
            }
            FenError::BadKingCount => {
                write!(f, "each side needs exactly one king")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Move string parsing and legality failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// Move strings are 4 or 5 characters.
    InvalidLength { len: usize },
    /// A square inside the move string did not parse.
    InvalidSquare { notation: String },
    /// The promotion character names no promotable piece.
    InvalidPromotion { promotion: char },
    /// The move is not legal in the current position.
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "move must be 4-5 characters, found {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square in move '{notation}'")
            }
            MoveParseError::InvalidPromotion { promotion } => {
                write!(f, "invalid promotion piece '{promotion}'")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "illegal move '{notation}'")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Square notation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Not a file letter followed by a rank digit.
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}
