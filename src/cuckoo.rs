//! Cuckoo hash table for O(1) "upcoming repetition" detection.
//!
//! Every reversible move (a leaper or slider move that some future move
//! could exactly undo) maps to a fixed Zobrist key delta: the XOR of the
//! piece key on the source and destination squares plus the side-to-move
//! key. This table lets `Board::upcoming_repetition` test, in O(1), whether
//! some single reversible move from the current position could recreate an
//! earlier position already on the search stack, without walking history.

use std::sync::LazyLock;

use crate::attacks;
use crate::types::{Bitboard, Color, Piece, Square};
use crate::zobrist;

const TABLE_SIZE: usize = 8192;

#[derive(Clone, Copy)]
struct Slot {
    key: u64,
    from: Square,
    to: Square,
}

const EMPTY_SLOT: Slot = Slot {
    key: 0,
    from: Square::new(0, 0),
    to: Square::new(0, 0),
};

pub struct CuckooTable {
    keys: [Slot; TABLE_SIZE],
    len: usize,
}

fn h1(key: u64) -> usize {
    (key & (TABLE_SIZE as u64 - 1)) as usize
}

fn h2(key: u64) -> usize {
    ((key >> 32) & (TABLE_SIZE as u64 - 1)) as usize
}

fn reversible_targets(piece: Piece, sq: Square) -> Bitboard {
    match piece {
        Piece::Knight => attacks::knight_attacks(sq),
        Piece::Bishop => attacks::bishop_attacks(sq, Bitboard::EMPTY),
        Piece::Rook => attacks::rook_attacks(sq, Bitboard::EMPTY),
        Piece::Queen => attacks::queen_attacks(sq, Bitboard::EMPTY),
        Piece::King => attacks::king_attacks(sq),
        Piece::Pawn => Bitboard::EMPTY,
    }
}

fn build() -> CuckooTable {
    let mut keys = [EMPTY_SLOT; TABLE_SIZE];
    let mut len = 0usize;

    for &piece in &[Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King] {
        for &color in &[Color::White, Color::Black] {
            for from_idx in 0..64 {
                let from = Square::from_index(from_idx);
                let targets = reversible_targets(piece, from);
                for to in targets.iter() {
                    if to.as_index() <= from_idx {
                        continue; // each undirected pair inserted once
                    }
                    let key = zobrist::piece_key(color, piece, from)
                        ^ zobrist::piece_key(color, piece, to)
                        ^ zobrist::side_to_move_key();
                    let mut slot = Slot { key, from, to };
                    let mut i = h1(slot.key);
                    loop {
                        std::mem::swap(&mut slot, &mut keys[i]);
                        if slot.key == 0 {
                            len += 1;
                            break;
                        }
                        i = if i == h1(slot.key) { h2(slot.key) } else { h1(slot.key) };
                    }
                }
            }
        }
    }
    debug_assert_eq!(len, 3668, "cuckoo table should hold exactly 3668 reversible-move keys");
    CuckooTable { keys, len }
}

static CUCKOO: LazyLock<CuckooTable> = LazyLock::new(build);

/// Number of distinct reversible-move keys stored. Informational only; used
/// in tests to pin the table to the documented cardinality.
#[must_use]
pub fn table_len() -> usize {
    CUCKOO.len
}

/// If `key` is the Zobrist delta of some reversible move, return the
/// squares of that move so the caller can verify the path is actually
/// clear and the piece is actually present (the table only proves a
/// *candidate* move exists, not that it's legal from the current board).
#[must_use]
pub fn probe(key: u64) -> Option<(Square, Square)> {
    for &idx in &[h1(key), h2(key)] {
        let slot = CUCKOO.keys[idx];
        if slot.key == key {
            return Some((slot.from, slot.to));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_the_exact_documented_size() {
        // Exactly 3668 distinct reversible-move keys for leapers/sliders on
        // an empty board: 1834 per color (168 knight + 280 bishop + 448
        // rook + 728 queen + 210 king), doubled for both colors.
        assert_eq!(table_len(), 3668);
    }

    #[test]
    fn probing_a_known_key_returns_its_squares() {
        let from = Square::new(0, 1); // b1
        let to = Square::new(2, 2); // c3 (knight reachable)
        let key = zobrist::piece_key(Color::White, Piece::Knight, from)
            ^ zobrist::piece_key(Color::White, Piece::Knight, to)
            ^ zobrist::side_to_move_key();
        let found = probe(key);
        assert!(found == Some((from, to)) || found == Some((to, from)));
    }

    #[test]
    fn probing_a_random_key_usually_misses() {
        assert_eq!(probe(0xDEAD_BEEF_0000_0001), None);
    }
}
