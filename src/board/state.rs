//! The `Board`: bitboard position representation, with a `Status` stack
//! recording everything `unmake_move` needs to undo a move in O(1).

use crate::attacks;
use crate::types::{Bitboard, CastlingRights, Color, Piece, Square};
use crate::zobrist;

/// Everything that can't be recovered from the move itself and must be
/// snapshotted before `make_move` mutates the board.
#[derive(Clone, Copy, Debug)]
pub struct Status {
    pub captured: Option<Piece>,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub hash: u64,
    pub pawn_hash: u64,
    pub material_key: u64,
    pub checkers: Bitboard,
    /// Cached static evaluation for the ply, filled in by search and read
    /// back by correction history and futility pruning.
    pub eval: Option<i32>,
}

/// A chess position. Owns piece bitboards, game-state flags, and the
/// make/unmake undo stack.
#[derive(Clone, Debug)]
pub struct Board {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) occupied_by: [Bitboard; 2],
    pub(crate) all_occupied: Bitboard,
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
    pub(crate) pawn_hash: u64,
    pub(crate) material_key: u64,
    pub(crate) checkers: Bitboard,
    pub(crate) history: Vec<u64>,
    pub(crate) status_stack: Vec<Status>,
    pub(crate) ply_from_null: u32,
}

impl Board {
    #[must_use]
    pub fn empty() -> Self {
        Board {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupied_by: [Bitboard::EMPTY; 2],
            all_occupied: Bitboard::EMPTY,
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            pawn_hash: 0,
            material_key: 0,
            checkers: Bitboard::EMPTY,
            history: Vec::with_capacity(128),
            status_stack: Vec::with_capacity(128),
            ply_from_null: 0,
        }
    }

    #[must_use]
    pub fn starting_position() -> Self {
        super::fen::from_fen(super::fen::STARTPOS_FEN).expect("startpos FEN is well-formed")
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn pawn_hash(&self) -> u64 {
        self.pawn_hash
    }

    #[inline]
    #[must_use]
    pub fn material_key(&self) -> u64 {
        self.material_key
    }

    #[inline]
    #[must_use]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        !self.checkers.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn pieces_of(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_by(&self, color: Color) -> Bitboard {
        self.occupied_by[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn all_occupied(&self) -> Bitboard {
        self.all_occupied
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(color, Piece::King)
            .lsb()
            .expect("every legal position has exactly one king per side")
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        for &color in &[Color::White, Color::Black] {
            for &piece in &Piece::ALL {
                if self.pieces_of(color, piece).contains(sq) {
                    return Some((color, piece));
                }
            }
        }
        None
    }

    pub(crate) fn put_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        self.pieces[color.index()][piece.index()] = self.pieces[color.index()][piece.index()].with(sq);
        self.occupied_by[color.index()] = self.occupied_by[color.index()].with(sq);
        self.all_occupied = self.all_occupied.with(sq);
        self.hash ^= zobrist::piece_key(color, piece, sq);
        if piece == Piece::Pawn {
            self.pawn_hash ^= zobrist::piece_key(color, piece, sq);
        }
        let new_count = self.pieces[color.index()][piece.index()].popcount() as usize;
        self.material_key ^= zobrist::material_key(color, piece, new_count - 1);
        self.material_key ^= zobrist::material_key(color, piece, new_count);
    }

    pub(crate) fn remove_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        self.pieces[color.index()][piece.index()] = self.pieces[color.index()][piece.index()].without(sq);
        self.occupied_by[color.index()] = self.occupied_by[color.index()].without(sq);
        self.all_occupied = self.all_occupied.without(sq);
        self.hash ^= zobrist::piece_key(color, piece, sq);
        if piece == Piece::Pawn {
            self.pawn_hash ^= zobrist::piece_key(color, piece, sq);
        }
        let new_count = self.pieces[color.index()][piece.index()].popcount() as usize;
        self.material_key ^= zobrist::material_key(color, piece, new_count + 1);
        self.material_key ^= zobrist::material_key(color, piece, new_count);
    }

    /// Recompute every Zobrist key from scratch. Used by FEN parsing and by
    /// the Zobrist-consistency property test, which checks this equals the
    /// incrementally maintained `hash`/`pawn_hash`/`material_key`.
    #[must_use]
    pub fn hash_from_scratch(&self) -> (u64, u64, u64) {
        let mut hash = 0u64;
        let mut pawn_hash = 0u64;
        let mut material_key = 0u64;
        for &color in &[Color::White, Color::Black] {
            for &piece in &Piece::ALL {
                let count = self.pieces_of(color, piece).popcount() as usize;
                material_key ^= zobrist::material_key(color, piece, count);
                for sq in self.pieces_of(color, piece).iter() {
                    hash ^= zobrist::piece_key(color, piece, sq);
                    if piece == Piece::Pawn {
                        pawn_hash ^= zobrist::piece_key(color, piece, sq);
                    }
                }
            }
        }
        hash ^= zobrist::castling_rights_key(Color::White, self.castling);
        hash ^= zobrist::castling_rights_key(Color::Black, self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= zobrist::en_passant_key(ep.file());
        }
        if self.side_to_move == Color::Black {
            hash ^= zobrist::side_to_move_key();
        }
        (hash, pawn_hash, material_key)
    }

    pub(crate) fn compute_checkers(&self) -> Bitboard {
        let king = self.king_square(self.side_to_move);
        self.attackers_to(king, self.side_to_move.opponent())
    }

    /// All squares of `by_color` pieces that attack `sq`.
    #[must_use]
    pub fn attackers_to(&self, sq: Square, by_color: Color) -> Bitboard {
        let occ = self.all_occupied;
        let mut attackers = Bitboard::EMPTY;
        attackers |= attacks::pawn_attacks(by_color.opponent(), sq) & self.pieces_of(by_color, Piece::Pawn);
        attackers |= attacks::knight_attacks(sq) & self.pieces_of(by_color, Piece::Knight);
        attackers |= attacks::king_attacks(sq) & self.pieces_of(by_color, Piece::King);
        let bishop_like = self.pieces_of(by_color, Piece::Bishop) | self.pieces_of(by_color, Piece::Queen);
        attackers |= attacks::bishop_attacks(sq, occ) & bishop_like;
        let rook_like = self.pieces_of(by_color, Piece::Rook) | self.pieces_of(by_color, Piece::Queen);
        attackers |= attacks::rook_attacks(sq, occ) & rook_like;
        attackers
    }

    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by_color: Color) -> bool {
        !self.attackers_to(sq, by_color).is_empty()
    }

    /// Bitboard of `color`'s pieces that are pinned to their own king, each
    /// paired implicitly with the ray they're pinned along (callers mask
    /// move targets with `attacks::line_through(king, pinned_square)`).
    #[must_use]
    pub fn pinned(&self, color: Color) -> Bitboard {
        let king = self.king_square(color);
        let mut pinned = Bitboard::EMPTY;
        let occ = self.all_occupied;
        let their = color.opponent();

        let bishop_like = self.pieces_of(their, Piece::Bishop) | self.pieces_of(their, Piece::Queen);
        let rook_like = self.pieces_of(their, Piece::Rook) | self.pieces_of(their, Piece::Queen);

        let candidate_sliders = (attacks::bishop_attacks(king, Bitboard::EMPTY) & bishop_like)
            | (attacks::rook_attacks(king, Bitboard::EMPTY) & rook_like);

        for slider in candidate_sliders.iter() {
            let between = attacks::between(king, slider);
            let blockers = between & occ;
            if blockers.popcount() == 1 && (blockers & self.occupied_by(color)).popcount() == 1 {
                pinned |= blockers;
            }
        }
        pinned
    }

    /// Repetition / fifty-move / insufficient-material draw detection over
    /// the full game history (not just the search stack).
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_repetition_draw() || self.is_insufficient_material()
    }

    #[must_use]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    #[must_use]
    pub fn is_repetition_draw(&self) -> bool {
        let len = self.history.len();
        if len < 5 {
            return false;
        }
        let limit = len.saturating_sub(self.halfmove_clock as usize);
        // Positions with the same side to move recur every 2 plies.
        let mut idx = len.wrapping_sub(3);
        while idx != usize::MAX && idx >= limit {
            if self.history[idx] == self.hash {
                return true;
            }
            if idx < 2 {
                break;
            }
            idx -= 2;
        }
        false
    }

    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        let total_non_king = Piece::ALL
            .iter()
            .filter(|&&p| p != Piece::King)
            .map(|&p| {
                (self.pieces_of(Color::White, p) | self.pieces_of(Color::Black, p)).popcount()
            })
            .sum::<u32>();
        if total_non_king == 0 {
            return true;
        }
        if total_non_king == 1 {
            let minor = self.pieces_of(Color::White, Piece::Knight)
                | self.pieces_of(Color::Black, Piece::Knight)
                | self.pieces_of(Color::White, Piece::Bishop)
                | self.pieces_of(Color::Black, Piece::Bishop);
            return minor.popcount() == 1;
        }
        false
    }

    /// O(1) test for whether some single reversible move could recreate a
    /// position already seen on the search stack, using the cuckoo table.
    /// `stack_keys` is the set of keys reachable by unmaking up to
    /// `halfmove_clock` plies (the search's local history window).
    #[must_use]
    pub fn has_upcoming_repetition(&self, stack_keys: &[u64]) -> bool {
        let mut key = self.hash ^ zobrist::side_to_move_key();
        for &other in stack_keys.iter().rev() {
            key ^= other;
            if let Some((from, to)) = crate::cuckoo::probe(key) {
                if attacks::between(from, to).is_empty() || (attacks::between(from, to) & self.all_occupied).is_empty() {
                    return true;
                }
            }
            key ^= other;
        }
        false
    }

    /// Hashes of positions reachable backward from (but excluding) the
    /// current one, as far as the fifty-move counter allows a reversible
    /// move to reach. Feeds `has_upcoming_repetition`.
    #[must_use]
    pub fn repetition_keys(&self) -> &[u64] {
        let len = self.history.len();
        if len == 0 {
            return &[];
        }
        let limit = len.saturating_sub(self.halfmove_clock as usize).saturating_sub(1);
        &self.history[limit..len - 1]
    }

    pub(crate) fn push_history(&mut self) {
        self.history.push(self.hash);
    }

    pub(crate) fn pop_history(&mut self) {
        self.history.pop();
    }
}
