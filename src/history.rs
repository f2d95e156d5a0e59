//! Move-ordering heuristics shared across a search: killer moves, main and
//! capture history, one-ply continuation history, counter moves, and a
//! correction history used to adjust static eval by how wrong it tended to
//! be in similar pawn structures.

use crate::search::params::SearchParams;
use crate::types::{Color, Move, Piece, Square};

/// Depth-scaled history bonus/malus, clamped the way `original_source`'s
/// `Tunable.h` constants imply (`HistoryBonusMargin`/`Bias`/`Max`).
#[must_use]
pub fn history_bonus(params: &SearchParams, depth: i32) -> i32 {
    (params.history_bonus_margin * depth + params.history_bonus_bias)
        .clamp(-params.history_bonus_max, params.history_bonus_max)
}

const HIST_REDUCTION_DIVISOR: i32 = 5000;

/// Gravity update: `bonus` pulls `*entry` toward its sign while the
/// `entry * |bonus| / divisor` term keeps the whole table bounded without
/// ever needing a hard clamp.
#[inline]
fn apply_gravity(entry: &mut i32, bonus: i32) {
    let decay = *entry * bonus.abs() / HIST_REDUCTION_DIVISOR;
    *entry += bonus - decay;
}

const SQUARES: usize = 64;
const PIECES: usize = 6;
const CORRECTION_SIZE: usize = 16384;
const CORRECTION_GRAIN: i32 = 256;
const CORRECTION_MAX: i32 = 1024;

/// Killer moves for one search stack, two slots per ply.
#[derive(Clone)]
pub struct Killers {
    slots: Vec<[Option<Move>; 2]>,
}

impl Killers {
    #[must_use]
    pub fn new(max_ply: usize) -> Self {
        Killers {
            slots: vec![[None, None]; max_ply + 1],
        }
    }

    #[must_use]
    pub fn get(&self, ply: usize) -> [Option<Move>; 2] {
        self.slots.get(ply).copied().unwrap_or([None, None])
    }

    pub fn record(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else {
            return;
        };
        if slot[0] == Some(mv) {
            return;
        }
        slot[1] = slot[0];
        slot[0] = Some(mv);
    }

    pub fn clear_ply(&mut self, ply: usize) {
        if let Some(slot) = self.slots.get_mut(ply) {
            *slot = [None, None];
        }
    }
}

/// Quiet-move history, indexed by side to move, origin, and destination.
#[derive(Clone)]
pub struct MainHistory {
    table: Box<[[[i32; SQUARES]; SQUARES]; 2]>,
}

impl MainHistory {
    #[must_use]
    pub fn new() -> Self {
        MainHistory {
            table: Box::new([[[0; SQUARES]; SQUARES]; 2]),
        }
    }

    #[must_use]
    pub fn get(&self, color: Color, from: Square, to: Square) -> i32 {
        self.table[color.index()][from.as_index()][to.as_index()]
    }

    pub fn update(&mut self, color: Color, from: Square, to: Square, bonus: i32) {
        apply_gravity(
            &mut self.table[color.index()][from.as_index()][to.as_index()],
            bonus,
        );
    }

    pub fn clear(&mut self) {
        *self = MainHistory::new();
    }

    /// Halve every entry rather than wiping it, so move-ordering signal
    /// from the previous search still informs the next one.
    pub fn age(&mut self) {
        for color in self.table.iter_mut() {
            for from in color.iter_mut() {
                for v in from.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }
}

impl Default for MainHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture history, indexed by attacking piece, destination square, and
/// captured piece — `to` alone carries most of the useful signal since the
/// origin rarely changes which capture is good.
#[derive(Clone)]
pub struct CaptureHistory {
    table: Box<[[[i32; PIECES]; SQUARES]; PIECES]>,
}

impl CaptureHistory {
    #[must_use]
    pub fn new() -> Self {
        CaptureHistory {
            table: Box::new([[[0; PIECES]; SQUARES]; PIECES]),
        }
    }

    #[must_use]
    pub fn get(&self, piece: Piece, to: Square, captured: Piece) -> i32 {
        self.table[piece.index()][to.as_index()][captured.index()]
    }

    pub fn update(&mut self, piece: Piece, to: Square, captured: Piece, bonus: i32) {
        apply_gravity(
            &mut self.table[piece.index()][to.as_index()][captured.index()],
            bonus,
        );
    }

    pub fn clear(&mut self) {
        *self = CaptureHistory::new();
    }

    pub fn age(&mut self) {
        for piece in self.table.iter_mut() {
            for to in piece.iter_mut() {
                for v in to.iter_mut() {
                    *v /= 2;
                }
            }
        }
    }
}

impl Default for CaptureHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// One-ply continuation history: how good a (piece, to) move was given the
/// immediately preceding move's (piece, to). Indexed `[prev_piece][prev_to]
/// [piece][to]`; sized as a flat `Vec` since `PIECES*SQUARES` squared
/// (36864 `i32`s) is too large to put on the stack as a plain array.
#[derive(Clone)]
pub struct ContinuationHistory {
    table: Vec<i32>,
}

impl ContinuationHistory {
    #[must_use]
    pub fn new() -> Self {
        ContinuationHistory {
            table: vec![0; PIECES * SQUARES * PIECES * SQUARES],
        }
    }

    fn index(prev_piece: Piece, prev_to: Square, piece: Piece, to: Square) -> usize {
        ((prev_piece.index() * SQUARES + prev_to.as_index()) * PIECES + piece.index()) * SQUARES
            + to.as_index()
    }

    #[must_use]
    pub fn get(&self, prev_piece: Piece, prev_to: Square, piece: Piece, to: Square) -> i32 {
        self.table[Self::index(prev_piece, prev_to, piece, to)]
    }

    pub fn update(
        &mut self,
        prev_piece: Piece,
        prev_to: Square,
        piece: Piece,
        to: Square,
        bonus: i32,
    ) {
        let idx = Self::index(prev_piece, prev_to, piece, to);
        apply_gravity(&mut self.table[idx], bonus);
    }

    pub fn clear(&mut self) {
        self.table.fill(0);
    }

    pub fn age(&mut self) {
        for v in self.table.iter_mut() {
            *v /= 2;
        }
    }
}

impl Default for ContinuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter-move table: the quiet reply that refuted the opponent's last
/// move most recently, indexed by that move's (piece, to).
#[derive(Clone)]
pub struct CounterMoves {
    table: Box<[[Option<Move>; SQUARES]; PIECES]>,
}

impl CounterMoves {
    #[must_use]
    pub fn new() -> Self {
        CounterMoves {
            table: Box::new([[None; SQUARES]; PIECES]),
        }
    }

    #[must_use]
    pub fn get(&self, prev_piece: Piece, prev_to: Square) -> Option<Move> {
        self.table[prev_piece.index()][prev_to.as_index()]
    }

    pub fn set(&mut self, prev_piece: Piece, prev_to: Square, reply: Move) {
        self.table[prev_piece.index()][prev_to.as_index()] = Some(reply);
    }

    pub fn clear(&mut self) {
        *self = CounterMoves::new();
    }
}

impl Default for CounterMoves {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-side correction term applied to static eval, indexed by a hashed
/// pawn structure. Search feeds it `(eval at the time, eval after the
/// subtree resolved)` pairs so the same pawn skeleton's static eval bias
/// shrinks over the course of a search.
#[derive(Clone)]
pub struct CorrectionHistory {
    table: Box<[[i32; CORRECTION_SIZE]; 2]>,
}

impl CorrectionHistory {
    #[must_use]
    pub fn new() -> Self {
        CorrectionHistory {
            table: Box::new([[0; CORRECTION_SIZE]; 2]),
        }
    }

    fn index(pawn_hash: u64) -> usize {
        (pawn_hash as usize) & (CORRECTION_SIZE - 1)
    }

    /// Correction in centipawns to add to static eval for this pawn hash.
    #[must_use]
    pub fn correction(&self, color: Color, pawn_hash: u64) -> i32 {
        self.table[color.index()][Self::index(pawn_hash)] / CORRECTION_GRAIN
    }

    /// `error` is `(search result - static eval)` at this node, weighted by
    /// `depth`; the stored value is kept in units of `1/CORRECTION_GRAIN`
    /// centipawns for subpixel gravity-update precision.
    pub fn update(&mut self, color: Color, pawn_hash: u64, error: i32, depth: i32) {
        let idx = Self::index(pawn_hash);
        let entry = &mut self.table[color.index()][idx];
        let bonus = (error * depth).clamp(-CORRECTION_MAX, CORRECTION_MAX);
        let scaled_bonus = bonus * CORRECTION_GRAIN / 8;
        let weight = depth.min(16) + 1;
        *entry += (scaled_bonus - *entry * weight.abs() / 32) / weight;
        *entry = (*entry).clamp(
            -CORRECTION_MAX * CORRECTION_GRAIN,
            CORRECTION_MAX * CORRECTION_GRAIN,
        );
    }

    pub fn clear(&mut self) {
        *self = CorrectionHistory::new();
    }

    pub fn age(&mut self) {
        for color in self.table.iter_mut() {
            for v in color.iter_mut() {
                *v /= 2;
            }
        }
    }
}

impl Default for CorrectionHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-color correction keyed by material configuration rather than pawn
/// structure — catches static-eval bias that tracks piece counts (e.g. a
/// bishop pair the NNUE under/overvalues) rather than pawn skeletons.
/// Same shape and update law as `CorrectionHistory`, keyed by
/// `zobrist::material_key` instead of `pawn_hash`.
#[derive(Clone)]
pub struct MaterialCorrectionHistory {
    table: Box<[[i32; CORRECTION_SIZE]; 2]>,
}

impl MaterialCorrectionHistory {
    #[must_use]
    pub fn new() -> Self {
        MaterialCorrectionHistory {
            table: Box::new([[0; CORRECTION_SIZE]; 2]),
        }
    }

    fn index(material_key: u64) -> usize {
        (material_key as usize) & (CORRECTION_SIZE - 1)
    }

    #[must_use]
    pub fn correction(&self, color: Color, material_key: u64) -> i32 {
        self.table[color.index()][Self::index(material_key)] / CORRECTION_GRAIN
    }

    pub fn update(&mut self, color: Color, material_key: u64, error: i32, depth: i32) {
        let idx = Self::index(material_key);
        let entry = &mut self.table[color.index()][idx];
        let bonus = (error * depth).clamp(-CORRECTION_MAX, CORRECTION_MAX);
        let scaled_bonus = bonus * CORRECTION_GRAIN / 8;
        let weight = depth.min(16) + 1;
        *entry += (scaled_bonus - *entry * weight.abs() / 32) / weight;
        *entry = (*entry).clamp(
            -CORRECTION_MAX * CORRECTION_GRAIN,
            CORRECTION_MAX * CORRECTION_GRAIN,
        );
    }

    pub fn clear(&mut self) {
        *self = MaterialCorrectionHistory::new();
    }

    pub fn age(&mut self) {
        for color in self.table.iter_mut() {
            for v in color.iter_mut() {
                *v /= 2;
            }
        }
    }
}

impl Default for MaterialCorrectionHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Every ordering/correction table a search thread consults, bundled so
/// the search module takes one argument instead of five.
#[derive(Clone)]
pub struct HistoryTables {
    pub killers: Killers,
    pub main: MainHistory,
    pub captures: CaptureHistory,
    pub continuation: ContinuationHistory,
    pub counters: CounterMoves,
    pub correction: CorrectionHistory,
    pub material_correction: MaterialCorrectionHistory,
}

impl HistoryTables {
    #[must_use]
    pub fn new(max_ply: usize) -> Self {
        HistoryTables {
            killers: Killers::new(max_ply),
            main: MainHistory::new(),
            captures: CaptureHistory::new(),
            continuation: ContinuationHistory::new(),
            counters: CounterMoves::new(),
            correction: CorrectionHistory::new(),
            material_correction: MaterialCorrectionHistory::new(),
        }
    }

    pub fn clear(&mut self) {
        self.main.clear();
        self.captures.clear();
        self.continuation.clear();
        self.counters.clear();
        self.correction.clear();
        self.material_correction.clear();
    }

    /// Halve every score-bearing table between searches (§4.7: "aged, not
    /// cleared"). Killers are per-ply suggestions and are reset fresh by
    /// `Worker::new_search` instead.
    pub fn age(&mut self) {
        self.main.age();
        self.captures.age();
        self.continuation.age();
        self.correction.age();
        self.material_correction.age();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn killers_keep_two_most_recent_distinct_moves() {
        let mut k = Killers::new(4);
        let a = Move::quiet(Square::new(1, 0), Square::new(2, 0), Piece::Pawn);
        let b = Move::quiet(Square::new(1, 1), Square::new(2, 1), Piece::Pawn);
        k.record(2, a);
        k.record(2, b);
        assert_eq!(k.get(2), [Some(b), Some(a)]);
        k.record(2, b);
        assert_eq!(k.get(2), [Some(b), Some(a)]);
    }

    #[test]
    fn main_history_gravity_keeps_table_bounded() {
        let mut h = MainHistory::new();
        let from = Square::new(1, 4);
        let to = Square::new(3, 4);
        let params = SearchParams::default();
        for _ in 0..200 {
            h.update(Color::White, from, to, history_bonus(&params, 10));
        }
        assert!(h.get(Color::White, from, to).abs() <= HIST_REDUCTION_DIVISOR);
    }

    #[test]
    fn negative_bonus_pulls_score_down() {
        let mut h = MainHistory::new();
        let from = Square::new(1, 4);
        let to = Square::new(3, 4);
        h.update(Color::White, from, to, 500);
        let after_positive = h.get(Color::White, from, to);
        h.update(Color::White, from, to, -500);
        assert!(h.get(Color::White, from, to) < after_positive);
    }

    #[test]
    fn continuation_history_is_addressed_independently_per_pair() {
        let mut ch = ContinuationHistory::new();
        ch.update(Piece::Knight, Square::new(2, 2), Piece::Bishop, Square::new(4, 4), 300);
        assert_eq!(
            ch.get(Piece::Knight, Square::new(2, 2), Piece::Bishop, Square::new(4, 4)),
            300
        );
        assert_eq!(
            ch.get(Piece::Knight, Square::new(2, 2), Piece::Rook, Square::new(4, 4)),
            0
        );
    }

    #[test]
    fn correction_history_shrinks_error_over_repeated_updates() {
        let mut corr = CorrectionHistory::new();
        let pawn_hash = 0xDEAD_BEEF;
        for _ in 0..50 {
            corr.update(Color::White, pawn_hash, 80, 8);
        }
        let value = corr.correction(Color::White, pawn_hash);
        assert!(value != 0);
    }
}
