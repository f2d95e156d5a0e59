//! Sliding-piece attacks via magic bitboard multiplication.
//!
//! Magic numbers are not hand transcribed: they are found once, at first
//! use, by a deterministic seeded search (the classic "rook/bishop magic"
//! technique), then reused from a `LazyLock` table for the life of the
//! process. A `pext` feature can later swap the index function for
//! `core::arch::x86_64::_pext_u64` behind the same `bishop_attacks`/
//! `rook_attacks` signatures.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Bitboard, Square};

const ROOK_DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DELTAS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Magic search and table construction are seeded independently of the
/// Zobrist key generator so changing one does not perturb the other.
const MAGIC_SEED: u64 = 0xC0FF_EE15_5EED_0001;

fn sliding_attacks(sq: Square, occ: Bitboard, deltas: &[(i32, i32); 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let mut r = sq.rank() as i32 + dr;
        let mut f = sq.file() as i32 + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = Square::new(r as usize, f as usize);
            attacks = attacks.with(target);
            if occ.contains(target) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Relevant occupancy mask: the full ray, minus the board edge squares the
/// ray terminates at (edge occupancy never changes whether the ray is
/// blocked, since the ray already stops there unconditionally).
fn relevant_mask(sq: Square, deltas: &[(i32, i32); 4]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let mut r = sq.rank() as i32 + dr;
        let mut f = sq.file() as i32 + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let nr = r + dr;
            let nf = f + df;
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                mask = mask.with(Square::new(r as usize, f as usize));
            }
            r = nr;
            f = nf;
        }
    }
    mask
}

/// Enumerate every occupancy subset of `mask` (the classic "carry-rippler"
/// trick) and hand each to `visit`.
fn for_each_subset(mask: Bitboard, mut visit: impl FnMut(Bitboard)) {
    let mut subset: u64 = 0;
    loop {
        visit(Bitboard(subset));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }
}

struct MagicEntry {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

struct MagicTable {
    entries: [MagicEntry; 64],
    attacks: Vec<Bitboard>,
}

fn find_magic(sq: Square, deltas: &[(i32, i32); 4], mask: Bitboard, rng: &mut StdRng) -> (u64, Vec<Bitboard>) {
    let bits = mask.popcount();
    let size = 1usize << bits;
    let shift = 64 - bits;

    let mut occupancies = Vec::with_capacity(size);
    let mut references = Vec::with_capacity(size);
    for_each_subset(mask, |occ| {
        occupancies.push(occ);
        references.push(sliding_attacks(sq, occ, deltas));
    });

    loop {
        // sparse random candidates collide less often once ANDed together.
        let magic: u64 = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if ((mask.0.wrapping_mul(magic)) >> 56).count_ones() < 6 {
            continue;
        }
        let mut table = vec![None; size];
        let mut ok = true;
        for (occ, &attack) in occupancies.iter().zip(references.iter()) {
            let index = ((occ.0.wrapping_mul(magic)) >> shift) as usize;
            match table[index] {
                None => table[index] = Some(attack),
                Some(existing) if existing == attack => {}
                Some(_) => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            let attacks: Vec<Bitboard> = table.into_iter().map(|o| o.unwrap_or(Bitboard::EMPTY)).collect();
            return (magic, attacks);
        }
    }
}

fn build_table(deltas: &[(i32, i32); 4], rng: &mut StdRng) -> MagicTable {
    let mut entries: Vec<MagicEntry> = Vec::with_capacity(64);
    let mut attacks = Vec::new();
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        let mask = relevant_mask(sq, deltas);
        let (magic, table) = find_magic(sq, deltas, mask, rng);
        let offset = attacks.len();
        let shift = 64 - mask.popcount();
        entries.push(MagicEntry {
            mask,
            magic,
            shift,
            offset,
        });
        attacks.extend(table);
    }
    MagicTable {
        entries: entries.try_into().unwrap_or_else(|_| unreachable!()),
        attacks,
    }
}

static ROOK_TABLE: LazyLock<MagicTable> = LazyLock::new(|| {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
    build_table(&ROOK_DELTAS, &mut rng)
});

static BISHOP_TABLE: LazyLock<MagicTable> = LazyLock::new(|| {
    let mut rng = StdRng::seed_from_u64(MAGIC_SEED ^ 0x5151_5151_5151_5151);
    build_table(&BISHOP_DELTAS, &mut rng)
});

fn lookup(table: &MagicTable, sq: Square, occ: Bitboard) -> Bitboard {
    let entry = &table.entries[sq.as_index()];
    let masked = occ & entry.mask;
    let index = ((masked.0.wrapping_mul(entry.magic)) >> entry.shift) as usize;
    table.attacks[entry.offset + index]
}

#[must_use]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    #[cfg(all(feature = "pext", target_arch = "x86_64"))]
    {
        pext::rook_attacks(sq, occ)
    }
    #[cfg(not(all(feature = "pext", target_arch = "x86_64")))]
    {
        lookup(&ROOK_TABLE, sq, occ)
    }
}

#[must_use]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    #[cfg(all(feature = "pext", target_arch = "x86_64"))]
    {
        pext::bishop_attacks(sq, occ)
    }
    #[cfg(not(all(feature = "pext", target_arch = "x86_64")))]
    {
        lookup(&BISHOP_TABLE, sq, occ)
    }
}

/// BMI2 `pext`-indexed slider attacks: same table shape as the magic path,
/// but the occupancy-to-index step is a hardware bit-extract instead of a
/// multiply, which is faster on CPUs that have it and never collides.
#[cfg(all(feature = "pext", target_arch = "x86_64"))]
mod pext {
    use std::arch::x86_64::_pext_u64;
    use std::sync::LazyLock;

    use crate::types::{Bitboard, Square};

    use super::{for_each_subset, relevant_mask, sliding_attacks, BISHOP_DELTAS, ROOK_DELTAS};

    struct PextEntry {
        mask: Bitboard,
        offset: usize,
    }

    struct PextTable {
        entries: [PextEntry; 64],
        attacks: Vec<Bitboard>,
    }

    fn build_table(deltas: &[(i32, i32); 4]) -> PextTable {
        let mut entries = Vec::with_capacity(64);
        let mut attacks = Vec::new();
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            let mask = relevant_mask(sq, deltas);
            let size = 1usize << mask.popcount();
            let offset = attacks.len();
            let mut table = vec![Bitboard::EMPTY; size];
            for_each_subset(mask, |occ| {
                // SAFETY: this module only compiles for target_arch = "x86_64",
                // and rook_attacks/bishop_attacks below only call into it when
                // the `pext` feature is explicitly enabled at build time.
                let index = unsafe { _pext_u64(occ.0, mask.0) } as usize;
                table[index] = sliding_attacks(sq, occ, deltas);
            });
            attacks.extend(table);
            entries.push(PextEntry { mask, offset });
        }
        PextTable {
            entries: entries.try_into().unwrap_or_else(|_| unreachable!()),
            attacks,
        }
    }

    static ROOK_PEXT: LazyLock<PextTable> = LazyLock::new(|| build_table(&ROOK_DELTAS));
    static BISHOP_PEXT: LazyLock<PextTable> = LazyLock::new(|| build_table(&BISHOP_DELTAS));

    fn lookup(table: &PextTable, sq: Square, occ: Bitboard) -> Bitboard {
        let entry = &table.entries[sq.as_index()];
        // SAFETY: see build_table.
        let index = unsafe { _pext_u64(occ.0 & entry.mask.0, entry.mask.0) } as usize;
        table.attacks[entry.offset + index]
    }

    #[must_use]
    pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
        lookup(&ROOK_PEXT, sq, occ)
    }

    #[must_use]
    pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
        lookup(&BISHOP_PEXT, sq, occ)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn pext_lookup_matches_classical_ray_casting() {
            let occ = Bitboard::from_square(Square::new(3, 1)) | Bitboard::from_square(Square::new(5, 3));
            for idx in 0..64 {
                let sq = Square::from_index(idx);
                assert_eq!(rook_attacks(sq, occ), sliding_attacks(sq, occ, &ROOK_DELTAS), "rook mismatch at {sq}");
                assert_eq!(bishop_attacks(sq, occ), sliding_attacks(sq, occ, &BISHOP_DELTAS), "bishop mismatch at {sq}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_lookup_matches_classical_ray_casting() {
        let occ = Bitboard::from_square(Square::new(3, 1)) | Bitboard::from_square(Square::new(5, 3));
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            assert_eq!(
                rook_attacks(sq, occ),
                sliding_attacks(sq, occ, &ROOK_DELTAS),
                "rook mismatch at {sq}"
            );
            assert_eq!(
                bishop_attacks(sq, occ),
                sliding_attacks(sq, occ, &BISHOP_DELTAS),
                "bishop mismatch at {sq}"
            );
        }
    }

    #[test]
    fn rook_attacks_empty_board_corner() {
        assert_eq!(rook_attacks(Square::new(0, 0), Bitboard::EMPTY).popcount(), 14);
    }
}
