//! Quiescence search: extends the main search along capture sequences
//! until the position is "quiet", so alpha-beta never evaluates a static
//! position with a hanging piece on the board.

use crate::board::{self, Board};
use crate::move_picker::MovePicker;
use crate::tt::Bound;

use super::Worker;

/// Depth tag for quiescence TT entries. The table stores real depth + 1
/// internally (see `TranspositionTable::store`) specifically so this can
/// be the true "shallowest possible" depth without colliding with the
/// empty-slot sentinel.
const QSEARCH_TT_DEPTH: u8 = 0;

pub fn quiesce(board: &mut Board, worker: &mut Worker, ply: i32, mut alpha: i32, beta: i32) -> i32 {
    worker.nodes += 1;
    worker.seldepth = worker.seldepth.max(ply as u32);

    if board.is_draw() {
        return 0;
    }

    let hash = board.hash();
    let in_check = board.in_check();
    let original_alpha = alpha;

    let tt_entry = worker.tt.probe(hash, ply);
    if let Some(entry) = tt_entry {
        let cutoff = match entry.bound {
            Bound::Exact => true,
            Bound::Lower => entry.score >= beta,
            Bound::Upper => entry.score <= alpha,
        };
        if cutoff {
            return entry.score;
        }
    }

    let raw_eval = worker.static_eval(board);
    let stand_pat = if in_check {
        raw_eval
    } else {
        let color = board.side_to_move();
        let corr = worker.history.correction.correction(color, board.pawn_hash())
            + worker.history.material_correction.correction(color, board.material_key());
        raw_eval + corr
    };

    if !in_check {
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);
    }

    let best_static = stand_pat;
    let mut best_score = if in_check { -super::params::MATE + ply } else { best_static };
    let mut best_move = None;

    let tt_move = tt_entry.and_then(|e| e.best_move);
    let mut picker = MovePicker::new(board, &worker.history, ply as usize, tt_move, worker.prev_move());
    if !in_check {
        picker.skip_quiets(true);
    }

    let mut searched_any = false;
    while let Some(mv) = picker.next() {
        if in_check && mv.is_quiet() {
            // In check, quiescence must consider every legal reply, not
            // just captures, since there may be no capture that escapes.
        } else if !in_check {
            // Delta pruning: even winning the captured piece outright
            // plus a safety margin can't reach alpha, so don't bother.
            if let Some(captured) = mv.captured() {
                let optimistic = stand_pat + captured.see_value() + worker.params.delta_pruning_margin;
                if optimistic < alpha - worker.params.delta_pruning_bias {
                    continue;
                }
            }
            if mv.is_capture() && !board::see_ge(board, mv, 0) {
                continue;
            }
        }

        searched_any = true;
        board.make_move(mv);
        worker.push_move(board, mv);
        let score = -quiesce(board, worker, ply + 1, -beta, -alpha);
        worker.pop_ply();
        board.unmake_move(mv);

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
    }

    if in_check && !searched_any {
        return -super::params::MATE + ply;
    }

    let bound = if best_score >= beta {
        Bound::Lower
    } else if best_score <= original_alpha {
        Bound::Upper
    } else {
        Bound::Exact
    };
    worker.tt.store(
        hash,
        QSEARCH_TT_DEPTH,
        ply,
        best_score,
        raw_eval,
        bound,
        best_move,
        false,
    );

    best_score
}
