//! Zobrist hashing constants.
//!
//! A fixed set of random 64-bit keys, one per board feature. Position
//! hashes are the XOR of all applicable keys, so incremental update on a
//! move is XOR-out / XOR-in.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::Square;

/// Seed for the key PRNG. Fixed so hashes are stable across runs and the
/// tables are identical on every thread that touches them.
const ZOBRIST_SEED: u64 = 0x00C0_FFEE_D00D_2A2A;

pub(crate) struct ZobristKeys {
    /// One key per (color, piece kind, square).
    pub piece: [[[u64; 64]; 6]; 2],
    /// One key per castling-rights bitmask value.
    pub castling: [u64; 16],
    /// One key per en passant file, index 0 reserved for "no target" and
    /// fixed at zero so hashing an absent target contributes nothing.
    pub en_passant_file: [u64; 9],
    pub black_to_move: u64,
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    let mut piece = [[[0u64; 64]; 6]; 2];
    for color in &mut piece {
        for kind in color.iter_mut() {
            for key in kind.iter_mut() {
                *key = rng.gen();
            }
        }
    }

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = rng.gen();
    }

    let mut en_passant_file = [0u64; 9];
    for key in en_passant_file.iter_mut().skip(1) {
        *key = rng.gen();
    }

    ZobristKeys {
        piece,
        castling,
        en_passant_file,
        black_to_move: rng.gen(),
    }
});

#[inline]
pub(crate) fn keys() -> &'static ZobristKeys {
    &KEYS
}

/// Index into `en_passant_file` for a target square, 0 when absent.
#[inline]
pub(crate) fn en_passant_index(target: Option<Square>) -> usize {
    target.map_or(0, |sq| sq.file() + 1)
}
