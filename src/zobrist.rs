//! Zobrist hashing for chess positions.
//!
//! Provides incrementally-updatable 64-bit position hashes for the
//! transposition table, plus auxiliary pawn-only and per-color material
//! keys used to index smaller specialized caches.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{CastlingRights, Color, Piece, Square};

pub(crate) struct ZobristKeys {
    // piece_keys[piece_type][color][square_index]
    pub(crate) piece_keys: [[[u64; 64]; 2]; 6],
    pub(crate) black_to_move_key: u64,
    // castling_keys[color][side]: side 0=kingside, 1=queenside
    pub(crate) castling_keys: [[u64; 2]; 2],
    // en_passant_keys[file]
    pub(crate) en_passant_keys: [u64; 8],
    // material_keys[color][piece][count], used for the draw-by-material key
    pub(crate) material_keys: [[[u64; 11]; 6]; 2],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(1_234_567_890_u64);
        let mut piece_keys = [[[0u64; 64]; 2]; 6];
        let mut castling_keys = [[0u64; 2]; 2];
        let mut en_passant_keys = [0u64; 8];
        let mut material_keys = [[[0u64; 11]; 6]; 2];

        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let black_to_move_key = rng.gen();
        for color in &mut castling_keys {
            for key in color.iter_mut() {
                *key = rng.gen();
            }
        }
        for key in &mut en_passant_keys {
            *key = rng.gen();
        }
        for color in &mut material_keys {
            for piece in color.iter_mut() {
                // count == 0 stays zero so toggling a piece in/out of a
                // square is a plain two-XOR swap between adjacent counts,
                // the same incremental shape as `piece_key`.
                for (count, key) in piece.iter_mut().enumerate().skip(1) {
                    let _ = count;
                    *key = rng.gen();
                }
            }
        }

        ZobristKeys {
            piece_keys,
            black_to_move_key,
            castling_keys,
            en_passant_keys,
            material_keys,
        }
    }
}

static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(ZobristKeys::new);

#[inline]
#[must_use]
pub fn piece_key(color: Color, piece: Piece, sq: Square) -> u64 {
    ZOBRIST.piece_keys[piece.index()][color.index()][sq.index()]
}

#[inline]
#[must_use]
pub fn side_to_move_key() -> u64 {
    ZOBRIST.black_to_move_key
}

#[inline]
#[must_use]
pub fn castling_key(color: Color, kingside: bool) -> u64 {
    ZOBRIST.castling_keys[color.index()][usize::from(!kingside)]
}

#[inline]
#[must_use]
pub fn castling_rights_key(color: Color, rights: CastlingRights) -> u64 {
    let mut key = 0;
    if rights.kingside(color) {
        key ^= castling_key(color, true);
    }
    if rights.queenside(color) {
        key ^= castling_key(color, false);
    }
    key
}

#[inline]
#[must_use]
pub fn en_passant_key(file: usize) -> u64 {
    ZOBRIST.en_passant_keys[file]
}

#[inline]
#[must_use]
pub fn material_key(color: Color, piece: Piece, count: usize) -> u64 {
    ZOBRIST.material_keys[color.index()][piece.index()][count.min(10)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_squares_get_distinct_keys() {
        let a = piece_key(Color::White, Piece::Pawn, Square::new(1, 0));
        let b = piece_key(Color::White, Piece::Pawn, Square::new(1, 1));
        assert_ne!(a, b);
    }

    #[test]
    fn keys_are_deterministic_across_calls() {
        let a = piece_key(Color::Black, Piece::Knight, Square::new(5, 5));
        let b = piece_key(Color::Black, Piece::Knight, Square::new(5, 5));
        assert_eq!(a, b);
    }
}
