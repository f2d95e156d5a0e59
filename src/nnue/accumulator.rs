//! Incremental accumulator maintenance: full refreshes, per-move
//! add/remove updates, and Finny-table caching across king-bucket
//! crossings.

use crate::board::Board;
use crate::types::{Bitboard, Color, Move, Piece, Square};

use super::network::{feature_index, king_bucket, KING_BUCKETS};
use super::simd;
use super::network::{NnueNetwork, HIDDEN};

/// One perspective's hidden-layer activations for each side.
#[derive(Clone)]
pub struct Accumulator {
    pub white: [i16; HIDDEN],
    pub black: [i16; HIDDEN],
}

impl Accumulator {
    #[must_use]
    pub fn new(net: &NnueNetwork) -> Self {
        Accumulator {
            white: net.feature_bias,
            black: net.feature_bias,
        }
    }

    fn perspective_mut(&mut self, perspective: Color) -> &mut [i16; HIDDEN] {
        match perspective {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Recompute `perspective`'s half of the accumulator from scratch
    /// against the current board. O(pieces on board); used on startup and
    /// whenever a king move crosses a bucket boundary without a cached
    /// Finny entry to diff against.
    pub fn refresh(&mut self, board: &Board, net: &NnueNetwork, perspective: Color) {
        let king_sq = board.king_square(perspective);
        let half = self.perspective_mut(perspective);
        *half = net.feature_bias;
        for &color in &[Color::White, Color::Black] {
            for &piece in &Piece::ALL {
                for sq in board.pieces_of(color, piece).iter() {
                    let (bucket, feat) = feature_index(perspective, king_sq, color, piece, sq);
                    simd::add_weights(half, &net.feature_weights[bucket][feat]);
                }
            }
        }
    }

    /// Add a single piece's contribution to `perspective`'s half, e.g. when
    /// a piece appears on the board (a move's destination, a promotion, an
    /// un-capture during `unmake_move`).
    pub fn add_piece(
        &mut self,
        net: &NnueNetwork,
        perspective: Color,
        king_sq: Square,
        piece_color: Color,
        piece: Piece,
        sq: Square,
    ) {
        let (bucket, feat) = feature_index(perspective, king_sq, piece_color, piece, sq);
        let half = self.perspective_mut(perspective);
        simd::add_weights(half, &net.feature_weights[bucket][feat]);
    }

    /// Remove a single piece's contribution, e.g. a move's origin square or
    /// a captured piece.
    pub fn remove_piece(
        &mut self,
        net: &NnueNetwork,
        perspective: Color,
        king_sq: Square,
        piece_color: Color,
        piece: Piece,
        sq: Square,
    ) {
        let (bucket, feat) = feature_index(perspective, king_sq, piece_color, piece, sq);
        let half = self.perspective_mut(perspective);
        simd::sub_weights(half, &net.feature_weights[bucket][feat]);
    }

    /// Apply a batch of feature changes for one perspective in one pass,
    /// used by `make_move`/`unmake_move` to turn a single board change into
    /// the corresponding accumulator deltas.
    pub fn apply_dirty(
        &mut self,
        net: &NnueNetwork,
        perspective: Color,
        king_sq: Square,
        dirty: &[DirtyPiece],
    ) {
        for d in dirty {
            if let Some(sq) = d.removed_from {
                self.remove_piece(net, perspective, king_sq, d.color, d.piece, sq);
            }
            if let Some(sq) = d.added_to {
                self.add_piece(net, perspective, king_sq, d.color, d.piece, sq);
            }
        }
    }
}

/// One piece's worth of feature-set change for a single make/unmake step:
/// a square it left (if any) and a square it now occupies (if any). A
/// quiet move is a remove+add pair for the moving piece; a capture adds a
/// second `DirtyPiece` with only `removed_from` set for the captured piece.
#[derive(Clone, Copy, Debug)]
pub struct DirtyPiece {
    pub color: Color,
    pub piece: Piece,
    pub removed_from: Option<Square>,
    pub added_to: Option<Square>,
}

impl DirtyPiece {
    #[must_use]
    pub fn moved(color: Color, piece: Piece, from: Square, to: Square) -> Self {
        DirtyPiece {
            color,
            piece,
            removed_from: Some(from),
            added_to: Some(to),
        }
    }

    #[must_use]
    pub fn removed(color: Color, piece: Piece, from: Square) -> Self {
        DirtyPiece {
            color,
            piece,
            removed_from: Some(from),
            added_to: None,
        }
    }

    #[must_use]
    pub fn added(color: Color, piece: Piece, to: Square) -> Self {
        DirtyPiece {
            color,
            piece,
            removed_from: None,
            added_to: Some(to),
        }
    }
}

/// Turn one applied move into the feature-set changes it causes, for the
/// mover `us`. Mirrors the piece bookkeeping in `Board::make_move` exactly,
/// without needing the board itself: everything here is already carried in
/// the move's own encoding.
#[must_use]
pub fn dirty_pieces_for_move(us: Color, mv: Move) -> ([DirtyPiece; 3], usize) {
    let them = us.opponent();
    let from = mv.from();
    let to = mv.to();
    let piece = mv.piece();
    let mut out = [DirtyPiece::moved(us, piece, from, to); 3];
    let mut n = 0;

    if mv.is_en_passant() {
        let captured_sq = Square::new(from.rank(), to.file());
        out[n] = DirtyPiece::removed(them, Piece::Pawn, captured_sq);
        n += 1;
    } else if let Some(captured) = mv.captured() {
        out[n] = DirtyPiece::removed(them, captured, to);
        n += 1;
    }

    if let Some(promo) = mv.promotion_piece() {
        out[n] = DirtyPiece::removed(us, piece, from);
        n += 1;
        out[n] = DirtyPiece::added(us, promo, to);
        n += 1;
    } else {
        out[n] = DirtyPiece::moved(us, piece, from, to);
        n += 1;
    }

    if mv.is_castle_kingside() || mv.is_castle_queenside() {
        let rank = if us == Color::White { 0 } else { 7 };
        let (rook_from, rook_to) = if mv.is_castle_kingside() {
            (Square::new(rank, 7), Square::new(rank, 5))
        } else {
            (Square::new(rank, 0), Square::new(rank, 3))
        };
        out[n] = DirtyPiece::moved(us, Piece::Rook, rook_from, rook_to);
        n += 1;
    }

    (out, n)
}

/// A cached full accumulator half plus the piece placement it was computed
/// from, keyed by (perspective color, king bucket). When a king move
/// crosses a bucket boundary every feature index changes, so instead of a
/// from-scratch refresh we diff the current board against the cache's
/// snapshot and only touch the squares that differ.
#[derive(Clone)]
struct CacheEntry {
    acc: [i16; HIDDEN],
    piece_bitboards: [[Bitboard; 6]; 2],
    populated: bool,
}

impl CacheEntry {
    fn empty() -> Self {
        CacheEntry {
            acc: [0; HIDDEN],
            piece_bitboards: [[Bitboard::EMPTY; 6]; 2],
            populated: false,
        }
    }
}

pub struct FinnyTable {
    entries: [[CacheEntry; KING_BUCKETS]; 2],
}

impl Default for FinnyTable {
    fn default() -> Self {
        FinnyTable {
            entries: std::array::from_fn(|_| std::array::from_fn(|_| CacheEntry::empty())),
        }
    }
}

impl FinnyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh `perspective`'s half of `acc` against `board`, reusing a
    /// cached snapshot for this (perspective, king bucket) slot when one
    /// exists rather than recomputing every feature from scratch.
    pub fn refresh(
        &mut self,
        acc: &mut Accumulator,
        board: &Board,
        net: &NnueNetwork,
        perspective: Color,
    ) {
        let king_sq = board.king_square(perspective);
        let bucket = king_bucket(king_sq);
        let entry = &mut self.entries[perspective.index()][bucket];

        if !entry.populated {
            acc.refresh(board, net, perspective);
            entry.acc = *match perspective {
                Color::White => &acc.white,
                Color::Black => &acc.black,
            };
            entry.piece_bitboards = current_bitboards(board);
            entry.populated = true;
            return;
        }

        let half = match perspective {
            Color::White => &mut acc.white,
            Color::Black => &mut acc.black,
        };
        *half = entry.acc;

        for &color in &[Color::White, Color::Black] {
            for &piece in &Piece::ALL {
                let old = entry.piece_bitboards[color.index()][piece.index()];
                let new = board.pieces_of(color, piece);
                for sq in (old & !new).iter() {
                    let (b, feat) = feature_index(perspective, king_sq, color, piece, sq);
                    simd::sub_weights(half, &net.feature_weights[b][feat]);
                }
                for sq in (new & !old).iter() {
                    let (b, feat) = feature_index(perspective, king_sq, color, piece, sq);
                    simd::add_weights(half, &net.feature_weights[b][feat]);
                }
            }
        }

        entry.acc = *half;
        entry.piece_bitboards = current_bitboards(board);
    }
}

fn current_bitboards(board: &Board) -> [[Bitboard; 6]; 2] {
    let mut out = [[Bitboard::EMPTY; 6]; 2];
    for &color in &[Color::White, Color::Black] {
        for &piece in &Piece::ALL {
            out[color.index()][piece.index()] = board.pieces_of(color, piece);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen;

    #[test]
    fn refresh_then_incremental_matches_from_scratch_refresh() {
        let board = fen::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        let net = NnueNetwork::from_embedded();

        let mut incremental = Accumulator::new(&net);
        incremental.refresh(&Board::starting_position(), &net, Color::White);

        let king_sq = board.king_square(Color::White);
        let dirty = [DirtyPiece::moved(Color::White, Piece::Pawn, Square::new(1, 4), Square::new(3, 4))];
        incremental.apply_dirty(&net, Color::White, king_sq, &dirty);

        let mut from_scratch = Accumulator::new(&net);
        from_scratch.refresh(&board, &net, Color::White);

        assert_eq!(incremental.white, from_scratch.white);
    }

    #[test]
    fn finny_table_refresh_matches_from_scratch() {
        let board = Board::starting_position();
        let net = NnueNetwork::from_embedded();
        let mut table = FinnyTable::new();
        let mut acc = Accumulator::new(&net);
        table.refresh(&mut acc, &board, &net, Color::White);

        let mut direct = Accumulator::new(&net);
        direct.refresh(&board, &net, Color::White);

        assert_eq!(acc.white, direct.white);
    }
}
