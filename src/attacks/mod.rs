//! Attack tables: leaper pieces via direct lookup, sliders via magic
//! bitboard multiplication.

mod magic;
mod tables;

use crate::types::{Bitboard, Color, Piece, Square};

pub use magic::{bishop_attacks, rook_attacks};

/// Attacks for any piece type on `sq` given the board occupancy `occ`.
/// For leapers `occ` is ignored.
#[must_use]
pub fn attacks_of(piece: Piece, color: Color, sq: Square, occ: Bitboard) -> Bitboard {
    match piece {
        Piece::Pawn => tables::pawn_attacks(color, sq),
        Piece::Knight => tables::knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occ),
        Piece::Rook => rook_attacks(sq, occ),
        Piece::Queen => bishop_attacks(sq, occ) | rook_attacks(sq, occ),
        Piece::King => tables::king_attacks(sq),
    }
}

#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    tables::pawn_attacks(color, sq)
}

#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    tables::knight_attacks(sq)
}

#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    tables::king_attacks(sq)
}

#[must_use]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    bishop_attacks(sq, occ) | rook_attacks(sq, occ)
}

/// Ray of squares strictly between `a` and `b`, empty unless the two
/// squares share a rank, file, or diagonal.
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    tables::between(a, b)
}

/// Ray passing through both `a` and `b` extended to the edge of the board
/// in both directions, empty unless aligned.
#[must_use]
pub fn line_through(a: Square, b: Square) -> Bitboard {
    tables::line_through(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knight_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square::new(0, 0)).popcount(), 2);
    }

    #[test]
    fn king_corner_has_three_targets() {
        assert_eq!(king_attacks(Square::new(0, 0)).popcount(), 3);
    }

    #[test]
    fn rook_on_empty_board_sees_14_squares() {
        let attacks = rook_attacks(Square::new(3, 3), Bitboard::EMPTY);
        assert_eq!(attacks.popcount(), 14);
    }

    #[test]
    fn bishop_on_empty_board_sees_13_squares_from_center() {
        let attacks = bishop_attacks(Square::new(3, 3), Bitboard::EMPTY);
        assert_eq!(attacks.popcount(), 13);
    }

    #[test]
    fn rook_attack_stops_at_blocker() {
        let occ = Bitboard::from_square(Square::new(3, 5));
        let attacks = rook_attacks(Square::new(3, 3), occ);
        assert!(attacks.contains(Square::new(3, 5)));
        assert!(!attacks.contains(Square::new(3, 6)));
    }
}
