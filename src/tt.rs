//! Shared transposition table: 4-way clusters of packed 16-byte entries,
//! probed and stored behind a lock-free per-cluster scan so every search
//! thread in the Lazy-SMP pool can share one table.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::types::Move;

/// Node type recorded at a TT entry: whether its score is exact, or only a
/// lower/upper bound because of alpha-beta cutoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

impl Bound {
    fn to_bits(self) -> u8 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            1 => Bound::Lower,
            2 => Bound::Upper,
            _ => Bound::Exact,
        }
    }
}

/// Mate scores are stored relative to the root so an entry found at a
/// different ply still reports the correct mate distance.
const MATE: i32 = 31_000;
const MAX_PLY: i32 = 128;

fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE - MAX_PLY {
        score + ply
    } else if score <= -(MATE - MAX_PLY) {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE - MAX_PLY {
        score - ply
    } else if score <= -(MATE - MAX_PLY) {
        score + ply
    } else {
        score
    }
}

/// A decoded entry, returned by `probe`.
#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub best_move: Option<Move>,
    pub score: i32,
    pub eval: i32,
    pub depth: u8,
    pub bound: Bound,
    pub was_pv: bool,
}

/// Packed 16-byte slot: `key32` (u32), `mv` (u32), `score`/`eval` (i16
/// each), `depth` (u8), `age_pv_bound` (u8: 5-bit age, 1-bit pv, 2-bit
/// bound). Stored as plain atomics rather than behind a lock so concurrent
/// probes/stores from Lazy-SMP workers never block each other; a torn read
/// across the two words is caught by the `key32` mismatch it would cause.
struct Slot {
    key_and_move: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    const fn empty() -> Self {
        Slot {
            key_and_move: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn load(&self) -> (u32, u32, i16, i16, u8, u8) {
        let km = self.key_and_move.load(Ordering::Relaxed);
        let data = self.data.load(Ordering::Relaxed);
        let key32 = (km >> 32) as u32;
        let mv = km as u32;
        let score = (data >> 48) as i16;
        let eval = (data >> 32) as i16;
        let depth = (data >> 8) as u8;
        let age_pv_bound = data as u8;
        (key32, mv, score, eval, depth, age_pv_bound)
    }

    fn store(&self, key32: u32, mv: u32, score: i16, eval: i16, depth: u8, age_pv_bound: u8) {
        let km = (u64::from(key32) << 32) | u64::from(mv);
        let data = (u64::from(score as u16) << 48)
            | (u64::from(eval as u16) << 32)
            | (u64::from(depth) << 8)
            | u64::from(age_pv_bound);
        self.key_and_move.store(km, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }
}

const CLUSTER_SIZE: usize = 4;

struct Cluster {
    slots: [Slot; CLUSTER_SIZE],
}

/// Shared, fixed-size hash table of position evaluations, indexed by the
/// high bits of the Zobrist key and probed by its low 32 bits.
pub struct TranspositionTable {
    clusters: Vec<Cluster>,
    age: AtomicU8,
}

impl TranspositionTable {
    /// Allocate a table sized to approximately `size_mb` megabytes.
    #[must_use]
    pub fn new(size_mb: usize) -> Self {
        let cluster_bytes = CLUSTER_SIZE * 16;
        let mut num_clusters = (size_mb * 1024 * 1024) / cluster_bytes;
        num_clusters = num_clusters.next_power_of_two();
        if num_clusters == 0 {
            num_clusters = 1;
        }
        let clusters = (0..num_clusters)
            .map(|_| Cluster {
                slots: [Slot::empty(), Slot::empty(), Slot::empty(), Slot::empty()],
            })
            .collect();
        TranspositionTable {
            clusters,
            age: AtomicU8::new(0),
        }
    }

    /// High 64 bits of `key * cluster_count`: a multiply-high index draws
    /// on the whole key rather than its low bits, so it lands in a
    /// different range than `key32` (the high 32 bits stored per entry)
    /// instead of overlapping it whenever table size is a small power of
    /// two.
    fn cluster_index(&self, hash: u64) -> usize {
        (((hash as u128) * (self.clusters.len() as u128)) >> 64) as usize
    }

    #[must_use]
    pub fn probe(&self, hash: u64, ply: i32) -> Option<TtEntry> {
        let key32 = (hash >> 32) as u32;
        let cluster = &self.clusters[self.cluster_index(hash)];
        for slot in &cluster.slots {
            let (slot_key, mv, score, eval, stored_depth, age_pv_bound) = slot.load();
            if slot_key == key32 && stored_depth > 0 {
                let mv = Move::from_u32(mv);
                return Some(TtEntry {
                    best_move: if mv.is_null() { None } else { Some(mv) },
                    score: score_from_tt(i32::from(score), ply),
                    eval: i32::from(eval),
                    // Stored depth is real depth + 1 (see `store`) so a
                    // quiescence entry, whose real depth is 0, still reads
                    // back as `depth > 0` and isn't mistaken for an empty
                    // slot.
                    depth: stored_depth - 1,
                    bound: Bound::from_bits(age_pv_bound),
                    was_pv: (age_pv_bound >> 2) & 1 == 1,
                });
            }
        }
        None
    }

    /// Issue a cache-line prefetch for the cluster `hash` maps to, called a
    /// few plies ahead of the probe that will actually use it.
    #[inline]
    pub fn prefetch(&self, hash: u64) {
        #[cfg(target_arch = "x86_64")]
        {
            let idx = self.cluster_index(hash);
            let ptr = std::ptr::addr_of!(self.clusters[idx]).cast::<i8>();
            unsafe {
                std::arch::x86_64::_mm_prefetch(ptr, std::arch::x86_64::_MM_HINT_T0);
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = hash;
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &self,
        hash: u64,
        depth: u8,
        ply: i32,
        score: i32,
        eval: i32,
        bound: Bound,
        best_move: Option<Move>,
        was_pv: bool,
    ) {
        let key32 = (hash >> 32) as u32;
        let current_age = self.age.load(Ordering::Relaxed);
        let cluster = &self.clusters[self.cluster_index(hash)];

        let mut replace_idx = 0;
        let mut replace_score = i32::MAX;
        for (i, slot) in cluster.slots.iter().enumerate() {
            let (slot_key, _, _, _, slot_depth, age_pv_bound) = slot.load();
            if slot_key == key32 || slot_depth == 0 {
                replace_idx = i;
                break;
            }
            let slot_age = age_pv_bound >> 3;
            let age_distance = current_age.wrapping_sub(slot_age) as i32;
            let candidate_score = i32::from(slot_depth) - age_distance * 4;
            if candidate_score < replace_score {
                replace_score = candidate_score;
                replace_idx = i;
            }
        }

        let slot = &cluster.slots[replace_idx];
        let (existing_key, existing_mv, ..) = slot.load();
        let mv_bits = best_move.map_or(
            if existing_key == key32 { existing_mv } else { 0 },
            Move::as_u32,
        );

        let score = score_to_tt(score, ply).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let eval = eval.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let age_pv_bound = (current_age << 3) | (u8::from(was_pv) << 2) | bound.to_bits();
        let stored_depth = depth.saturating_add(1);

        slot.store(key32, mv_bits, score, eval, stored_depth, age_pv_bound);
    }

    /// Bump the generation counter between searches so fresh, shallower
    /// entries are still preferred over stale, deeper ones from an old
    /// search.
    pub fn new_search(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for cluster in &self.clusters {
            for slot in &cluster.slots {
                slot.store(0, 0, 0, 0, 0, 0);
            }
        }
        self.age.store(0, Ordering::Relaxed);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len() * CLUSTER_SIZE
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Approximate per-mille occupancy over a sample of clusters, reported
    /// by the UCI `info ... hashfull` field.
    #[must_use]
    pub fn hashfull(&self) -> u32 {
        let sample = self.clusters.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let mut used = 0u32;
        for cluster in self.clusters.iter().take(sample) {
            for slot in &cluster.slots {
                let (_, _, _, _, depth, _) = slot.load();
                if depth > 0 {
                    used += 1;
                }
            }
        }
        used * 1000 / (sample as u32 * CLUSTER_SIZE as u32)
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    #[test]
    fn store_then_probe_roundtrips() {
        let tt = TranspositionTable::new(1);
        let mv = Move::quiet(Square::new(1, 4), Square::new(3, 4), crate::types::Piece::Pawn);
        tt.store(0xABCD_1234_0000_0001, 10, 2, 150, 120, Bound::Exact, Some(mv), true);
        let entry = tt.probe(0xABCD_1234_0000_0001, 2).expect("entry should be present");
        assert_eq!(entry.depth, 10);
        assert_eq!(entry.score, 150);
        assert_eq!(entry.eval, 120);
        assert_eq!(entry.bound, Bound::Exact);
        assert!(entry.was_pv);
        assert_eq!(entry.best_move, Some(mv));
    }

    #[test]
    fn probe_miss_on_key_collision_at_different_hash() {
        let tt = TranspositionTable::new(1);
        tt.store(0x1111_0000_0000_0000, 5, 0, 10, 10, Bound::Lower, None, false);
        assert!(tt.probe(0x2222_0000_0000_0000, 0).is_none());
    }

    #[test]
    fn mate_score_is_relativized_to_probing_ply() {
        let tt = TranspositionTable::new(1);
        let mate_score = MATE - 3;
        tt.store(0x55, 20, 5, mate_score, mate_score, Bound::Exact, None, false);
        // Stored relative to root at ply 5; probing at a shallower ply (3)
        // should shift the reported mate distance by the ply difference.
        let entry = tt.probe(0x55, 3).unwrap();
        assert_eq!(entry.score, mate_score + 2);
        let same_ply = tt.probe(0x55, 5).unwrap();
        assert_eq!(same_ply.score, mate_score);
    }

    #[test]
    fn deeper_entry_replaces_shallower_one_in_same_cluster() {
        let tt = TranspositionTable::new(1);
        let shallow = Move::quiet(Square::new(1, 0), Square::new(2, 0), crate::types::Piece::Pawn);
        let deep = Move::quiet(Square::new(1, 1), Square::new(3, 1), crate::types::Piece::Pawn);
        tt.store(0x10, 2, 0, 0, 0, Bound::Exact, Some(shallow), false);
        tt.store(0x10, 8, 0, 0, 0, Bound::Exact, Some(deep), false);
        let entry = tt.probe(0x10, 0).unwrap();
        assert_eq!(entry.depth, 8);
        assert_eq!(entry.best_move, Some(deep));
    }

    #[test]
    fn zero_depth_entry_is_still_retrievable() {
        let tt = TranspositionTable::new(1);
        tt.store(0x77, 0, 0, 30, 25, Bound::Upper, None, false);
        let entry = tt.probe(0x77, 0).expect("depth-0 entry must not read back as empty");
        assert_eq!(entry.depth, 0);
        assert_eq!(entry.score, 30);
    }
}
