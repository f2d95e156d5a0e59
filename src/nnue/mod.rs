//! NNUE (Efficiently Updatable Neural Network) evaluation.
//!
//! Architecture: `(768 x KING_BUCKETS -> HIDDEN) x 2` perspectives, summed
//! and routed through one of `OUTPUT_BUCKETS` output heads selected by
//! remaining piece count, with `SCReLU` activation and SIMD-accelerated
//! inference (AVX2/NEON, scalar fallback).

mod accumulator;
mod network;
mod simd;

pub use accumulator::{dirty_pieces_for_move, Accumulator, DirtyPiece, FinnyTable};
pub use network::{
    feature_index, king_bucket, king_context_changed, output_bucket, NnueNetwork, HIDDEN, KING_BUCKETS, OUTPUT_BUCKETS,
};

/// Feature-weight quantization factor.
pub const QA: i32 = 255;
/// Output-weight quantization factor.
pub const QB: i32 = 64;
/// Evaluation scale factor (centipawns per unit of network output).
pub const SCALE: i32 = 400;

use crate::board::Board;
use crate::types::Color;

/// Evaluate `board` from the side-to-move's perspective, refreshing or
/// incrementally updating `acc` as needed.
#[must_use]
pub fn evaluate(board: &Board, net: &NnueNetwork, acc: &Accumulator) -> i32 {
    let white_to_move = board.side_to_move() == Color::White;
    let bucket = output_bucket(board);
    net.evaluate(acc, white_to_move, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn startpos_eval_is_finite_and_small() {
        let board = Board::starting_position();
        let net = NnueNetwork::from_embedded();
        let mut acc = Accumulator::new(&net);
        acc.refresh(&board, &net, Color::White);
        acc.refresh(&board, &net, Color::Black);
        let score = evaluate(&board, &net, &acc);
        assert!(score.abs() < 10_000, "startpos eval out of range: {score}");
    }
}
