//! Precomputed leaper-piece attack tables and alignment rays.

use std::sync::LazyLock;

use crate::types::{Bitboard, Color, Square};

struct LeaperTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
}

fn compute_knight(sq: Square) -> Bitboard {
    let r = sq.rank() as i32;
    let f = sq.file() as i32;
    const DELTAS: [(i32, i32); 8] = [
        (1, 2), (2, 1), (2, -1), (1, -2),
        (-1, -2), (-2, -1), (-2, 1), (-1, 2),
    ];
    let mut bb = Bitboard::EMPTY;
    for (dr, df) in DELTAS {
        let (nr, nf) = (r + dr, f + df);
        if (0..8).contains(&nr) && (0..8).contains(&nf) {
            bb = bb.with(Square::new(nr as usize, nf as usize));
        }
    }
    bb
}

fn compute_king(sq: Square) -> Bitboard {
    let r = sq.rank() as i32;
    let f = sq.file() as i32;
    let mut bb = Bitboard::EMPTY;
    for dr in -1..=1 {
        for df in -1..=1 {
            if dr == 0 && df == 0 {
                continue;
            }
            let (nr, nf) = (r + dr, f + df);
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                bb = bb.with(Square::new(nr as usize, nf as usize));
            }
        }
    }
    bb
}

fn compute_pawn(color: Color, sq: Square) -> Bitboard {
    let r = sq.rank() as i32;
    let f = sq.file() as i32;
    let dr = if color.is_white() { 1 } else { -1 };
    let mut bb = Bitboard::EMPTY;
    for df in [-1, 1] {
        let (nr, nf) = (r + dr, f + df);
        if (0..8).contains(&nr) && (0..8).contains(&nf) {
            bb = bb.with(Square::new(nr as usize, nf as usize));
        }
    }
    bb
}

static LEAPERS: LazyLock<LeaperTables> = LazyLock::new(|| {
    let mut knight = [Bitboard::EMPTY; 64];
    let mut king = [Bitboard::EMPTY; 64];
    let mut pawn = [[Bitboard::EMPTY; 64]; 2];
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        knight[idx] = compute_knight(sq);
        king[idx] = compute_king(sq);
        pawn[Color::White.index()][idx] = compute_pawn(Color::White, sq);
        pawn[Color::Black.index()][idx] = compute_pawn(Color::Black, sq);
    }
    LeaperTables { knight, king, pawn }
});

#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    LEAPERS.knight[sq.as_index()]
}

#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    LEAPERS.king[sq.as_index()]
}

#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    LEAPERS.pawn[color.index()][sq.as_index()]
}

struct RayTables {
    between: [[Bitboard; 64]; 64],
    line: [[Bitboard; 64]; 64],
}

fn ray_direction(a: Square, b: Square) -> Option<(i32, i32)> {
    let (ar, af) = (a.rank() as i32, a.file() as i32);
    let (br, bf) = (b.rank() as i32, b.file() as i32);
    let (dr, df) = (br - ar, bf - af);
    if dr == 0 && df == 0 {
        return None;
    }
    if dr == 0 {
        Some((0, df.signum()))
    } else if df == 0 {
        Some((dr.signum(), 0))
    } else if dr.abs() == df.abs() {
        Some((dr.signum(), df.signum()))
    } else {
        None
    }
}

static RAYS: LazyLock<RayTables> = LazyLock::new(|| {
    let mut between = [[Bitboard::EMPTY; 64]; 64];
    let mut line = [[Bitboard::EMPTY; 64]; 64];
    for ai in 0..64 {
        let a = Square::from_index(ai);
        for bi in 0..64 {
            let b = Square::from_index(bi);
            if ai == bi {
                continue;
            }
            if let Some((dr, df)) = ray_direction(a, b) {
                // between
                let mut bb = Bitboard::EMPTY;
                let (mut r, mut f) = (a.rank() as i32 + dr, a.file() as i32 + df);
                while (r, f) != (b.rank() as i32, b.file() as i32) {
                    bb = bb.with(Square::new(r as usize, f as usize));
                    r += dr;
                    f += df;
                }
                between[ai][bi] = bb;

                // full line through both squares, edge to edge
                let mut full = Bitboard::from_square(a).with(b);
                let (mut r, mut f) = (a.rank() as i32 - dr, a.file() as i32 - df);
                while (0..8).contains(&r) && (0..8).contains(&f) {
                    full = full.with(Square::new(r as usize, f as usize));
                    r -= dr;
                    f -= df;
                }
                let (mut r, mut f) = (b.rank() as i32 + dr, b.file() as i32 + df);
                while (0..8).contains(&r) && (0..8).contains(&f) {
                    full = full.with(Square::new(r as usize, f as usize));
                    r += dr;
                    f += df;
                }
                line[ai][bi] = full;
            }
        }
    }
    RayTables { between, line }
});

#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    RAYS.between[a.as_index()][b.as_index()]
}

#[must_use]
pub fn line_through(a: Square, b: Square) -> Bitboard {
    RAYS.line[a.as_index()][b.as_index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_is_empty_for_adjacent_squares() {
        assert!(between(Square::new(0, 0), Square::new(0, 1)).is_empty());
    }

    #[test]
    fn between_spans_middle_squares() {
        let bb = between(Square::new(0, 0), Square::new(0, 3));
        assert_eq!(bb.popcount(), 2);
        assert!(bb.contains(Square::new(0, 1)));
        assert!(bb.contains(Square::new(0, 2)));
    }

    #[test]
    fn line_through_unaligned_squares_is_empty() {
        assert!(line_through(Square::new(0, 0), Square::new(1, 3)).is_empty());
    }

    #[test]
    fn line_through_diagonal_spans_whole_board() {
        let bb = line_through(Square::new(0, 0), Square::new(2, 2));
        assert_eq!(bb.popcount(), 8);
    }
}
