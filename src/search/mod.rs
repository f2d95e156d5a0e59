//! Alpha-beta search: iterative deepening with aspiration windows driving
//! a principal-variation search over a staged move picker, a shared
//! transposition table, and the full pruning/reduction/extension suite
//! (null-move, razoring, futility, late-move pruning/reduction, SEE
//! pruning, ProbCut, singular extensions).

pub mod params;
pub mod pruning;
pub mod quiescence;
pub mod smp;
mod time;

pub use time::{SearchClock, TimeControl};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::board::{self, Board};
use crate::history::HistoryTables;
use crate::move_picker::{MovePicker, PreviousMove};
use crate::nnue::{self, Accumulator, FinnyTable, NnueNetwork};
use crate::tt::{Bound, TranspositionTable};
use crate::types::{Color, Move, Piece};

use params::{is_mate_score, SearchParams, MATE, MATE_IN_MAX};

const MAX_SEARCH_PLY: usize = params::MAX_PLY as usize;
const STACK_LEN: usize = MAX_SEARCH_PLY + 8;

/// Best move (and, when asked for, a ponder move) a search produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    pub score: i32,
}

/// Snapshot of one completed iterative-deepening iteration, handed to a
/// caller-supplied callback so the UCI layer can print `info` lines as
/// they become available.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

pub type ReportFn<'a> = dyn FnMut(&SearchReport) + 'a;

/// Everything one search thread owns privately: its own history tables,
/// its own NNUE accumulator/cache, and its own node counter. Only the
/// transposition table and NNUE weights are shared across Lazy-SMP workers.
pub struct Worker {
    pub tt: Arc<TranspositionTable>,
    net: Arc<NnueNetwork>,
    acc: Accumulator,
    acc_stack: Vec<Accumulator>,
    finny: FinnyTable,
    pub history: HistoryTables,
    played: Vec<Option<PreviousMove>>,
    eval_history: [i32; STACK_LEN],
    pub nodes: u64,
    pub seldepth: u32,
    stop: Arc<AtomicBool>,
    clock: Arc<SearchClock>,
    node_check_mask: u64,
    pub is_main: bool,
    pub params: SearchParams,
}

impl Worker {
    #[must_use]
    pub fn new(
        tt: Arc<TranspositionTable>,
        net: Arc<NnueNetwork>,
        stop: Arc<AtomicBool>,
        clock: Arc<SearchClock>,
        is_main: bool,
    ) -> Self {
        Worker::with_params(tt, net, stop, clock, is_main, SearchParams::default())
    }

    #[must_use]
    pub fn with_params(
        tt: Arc<TranspositionTable>,
        net: Arc<NnueNetwork>,
        stop: Arc<AtomicBool>,
        clock: Arc<SearchClock>,
        is_main: bool,
        params: SearchParams,
    ) -> Self {
        Worker {
            acc: Accumulator::new(&net),
            acc_stack: Vec::with_capacity(MAX_SEARCH_PLY),
            finny: FinnyTable::new(),
            tt,
            net,
            history: HistoryTables::new(MAX_SEARCH_PLY),
            played: Vec::with_capacity(MAX_SEARCH_PLY),
            eval_history: [0; STACK_LEN],
            nodes: 0,
            seldepth: 0,
            stop,
            clock,
            node_check_mask: 0x3FF,
            is_main,
            params,
        }
    }

    /// Reset per-search scratch state and seed the accumulator from `board`,
    /// the position the upcoming search is rooted at. Every later node
    /// reaches its own accumulator by pushing/popping off this root via
    /// `push_move`/`pop_ply`, never by refreshing from scratch again.
    pub fn new_search(&mut self, board: &Board) {
        self.nodes = 0;
        self.seldepth = 0;
        self.played.clear();
        self.acc_stack.clear();
        self.history.killers = crate::history::Killers::new(MAX_SEARCH_PLY);
        self.finny = FinnyTable::new();
        self.acc.refresh(board, &self.net, Color::White);
        self.acc.refresh(board, &self.net, Color::Black);
    }

    fn static_eval(&mut self, board: &Board) -> i32 {
        nnue::evaluate(board, &self.net, &self.acc)
    }

    /// Apply `mv`'s NNUE feature-set changes to the live accumulator after
    /// it has already been made on `board`, saving the pre-move accumulator
    /// so `pop_ply` can restore it exactly.
    fn push_move(&mut self, board: &Board, mv: Move) {
        self.played.push(Some(PreviousMove {
            piece: mv.piece(),
            to: mv.to(),
        }));
        self.acc_stack.push(self.acc.clone());

        let us = board.side_to_move().opponent();
        let (dirty, count) = nnue::dirty_pieces_for_move(us, mv);
        for &perspective in &[Color::White, Color::Black] {
            let new_king_sq = board.king_square(perspective);
            let own_king_moved = mv.piece() == Piece::King && us == perspective;
            if own_king_moved && nnue::king_context_changed(mv.from(), mv.to()) {
                self.finny.refresh(&mut self.acc, board, &self.net, perspective);
            } else {
                self.acc.apply_dirty(&self.net, perspective, new_king_sq, &dirty[..count]);
            }
        }
    }

    fn push_null(&mut self) {
        self.played.push(None);
        self.acc_stack.push(self.acc.clone());
    }

    fn pop_ply(&mut self) {
        self.played.pop();
        if let Some(prev) = self.acc_stack.pop() {
            self.acc = prev;
        }
    }

    fn prev_move(&self) -> Option<PreviousMove> {
        self.played.last().copied().flatten()
    }

    fn should_stop(&self) -> bool {
        if self.nodes & self.node_check_mask != 0 {
            return false;
        }
        self.stop.load(Ordering::Relaxed) || self.clock.should_stop_hard()
    }

    fn has_non_pawn_material(board: &Board, color: Color) -> bool {
        [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
            .iter()
            .any(|&p| !board.pieces_of(color, p).is_empty())
    }
}

/// Root driver: iterative deepening with aspiration windows. Runs until
/// `max_depth` is reached, the clock says to stop, or the stop flag is set.
#[allow(clippy::too_many_lines)]
pub fn iterative_deepening(
    board: &mut Board,
    worker: &mut Worker,
    max_depth: u32,
    start: Instant,
    mut report: Option<&mut ReportFn<'_>>,
) -> SearchResult {
    worker.new_search(board);
    worker.tt.new_search();

    let root_moves = board::generate_legal_moves(board);
    if root_moves.is_empty() {
        return SearchResult::default();
    }
    if root_moves.len() == 1 {
        return SearchResult {
            best_move: Some(root_moves[0]),
            ponder_move: None,
            score: 0,
        };
    }

    let mut best = SearchResult::default();
    let mut prev_score = 0i32;

    for depth in 1..=max_depth {
        if depth > 1 && (worker.stop.load(Ordering::Relaxed) || worker.clock.should_stop_deepening()) {
            break;
        }

        let mut window = if depth >= 4 { 20 } else { params::INFINITE };
        let mut alpha;
        let mut beta;
        let mut score;
        loop {
            alpha = if depth >= 4 { (prev_score - window).max(-params::INFINITE) } else { -params::INFINITE };
            beta = if depth >= 4 { (prev_score + window).min(params::INFINITE) } else { params::INFINITE };

            score = negamax(board, worker, 0, depth as i32, alpha, beta, true, false, None, true);

            if worker.stop.load(Ordering::Relaxed) || worker.clock.should_stop_hard() {
                break;
            }
            if score <= alpha {
                window = window.saturating_mul(2).min(params::INFINITE);
            } else if score >= beta {
                window = window.saturating_mul(2).min(params::INFINITE);
            } else {
                break;
            }
            if window >= params::INFINITE {
                alpha = -params::INFINITE;
                beta = params::INFINITE;
            }
        }

        if worker.stop.load(Ordering::Relaxed) || (depth > 1 && worker.clock.should_stop_hard()) {
            break;
        }

        prev_score = score;
        let pv = extract_pv(&worker.tt, board, depth as usize);
        if let Some(&mv) = pv.first() {
            best = SearchResult {
                best_move: Some(mv),
                ponder_move: pv.get(1).copied(),
                score,
            };
        }

        if worker.is_main {
            if let Some(cb) = report.as_deref_mut() {
                let elapsed = start.elapsed();
                let time_ms = elapsed.as_millis().max(1) as u64;
                let nps = (worker.nodes * 1000) / time_ms;
                cb(&SearchReport {
                    depth,
                    seldepth: worker.seldepth,
                    score,
                    nodes: worker.nodes,
                    time_ms,
                    nps,
                    hashfull: worker.tt.hashfull(),
                    pv,
                });
            }
        }

        if is_mate_score(score) && score.abs() >= MATE - depth as i32 {
            break;
        }
    }

    best
}

/// Walk the TT's recorded best moves from the current position, applying
/// each to a scratch board, to build a principal variation for reporting.
fn extract_pv(tt: &TranspositionTable, board: &Board, max_len: usize) -> Vec<Move> {
    let mut scratch = board.clone();
    let mut pv = Vec::with_capacity(max_len);
    let mut seen = Vec::with_capacity(max_len);
    for ply in 0..max_len {
        let Some(entry) = tt.probe(scratch.hash(), ply as i32) else { break };
        let Some(mv) = entry.best_move else { break };
        let legal = board::generate_legal_moves(&scratch);
        if !legal.contains(mv) {
            break;
        }
        if seen.contains(&scratch.hash()) {
            break;
        }
        seen.push(scratch.hash());
        scratch.make_move(mv);
        pv.push(mv);
    }
    pv
}

#[allow(clippy::too_many_arguments, clippy::too_many_lines)]
fn negamax(
    board: &mut Board,
    worker: &mut Worker,
    ply: i32,
    depth: i32,
    mut alpha: i32,
    beta: i32,
    is_pv: bool,
    cut_node: bool,
    excluded: Option<Move>,
    allow_null: bool,
) -> i32 {
    let mut depth = depth;
    if depth <= 0 {
        return quiescence::quiesce(board, worker, ply, alpha, beta);
    }

    worker.nodes += 1;
    worker.seldepth = worker.seldepth.max(ply as u32);
    if ply > 0 && worker.should_stop() {
        return 0;
    }

    let is_root = ply == 0;
    let mut beta = beta;
    if !is_root {
        if board.is_draw() {
            return 0;
        }
        if alpha < 0 && excluded.is_none() && board.has_upcoming_repetition(board.repetition_keys()) {
            alpha = 0;
            if alpha >= beta {
                return alpha;
            }
        }
        alpha = alpha.max(-MATE + ply);
        beta = beta.min(MATE - ply - 1);
        if alpha >= beta {
            return alpha;
        }
    }

    let hash = board.hash();
    let in_check = board.in_check();
    let original_alpha = alpha;

    let tt_entry = worker.tt.probe(hash, ply);
    let tt_move = tt_entry.and_then(|e| e.best_move);
    if !is_pv && excluded.is_none() {
        if let Some(entry) = tt_entry {
            if i32::from(entry.depth) >= depth {
                let cutoff = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => entry.score >= beta,
                    Bound::Upper => entry.score <= alpha,
                };
                if cutoff {
                    return entry.score;
                }
            }
        }
    }

    // No TT move to trust at this depth: the move ordering this node would
    // get from a hash move is missing, so shave a ply off rather than pay
    // full price searching it blind.
    if !in_check && depth >= 4 && tt_move.is_none() && (is_pv || cut_node) {
        depth -= 1;
    }

    let raw_eval = if in_check { -MATE + ply } else { worker.static_eval(board) };
    let static_eval = if in_check {
        raw_eval
    } else {
        let color = board.side_to_move();
        let corr = worker.history.correction.correction(color, board.pawn_hash())
            + worker.history.material_correction.correction(color, board.material_key());
        (raw_eval + corr).clamp(-MATE_IN_MAX + 1, MATE_IN_MAX - 1)
    };
    let stack_idx = (ply as usize).min(STACK_LEN - 1);
    worker.eval_history[stack_idx] = static_eval;
    let improving = !in_check
        && ply >= 2
        && static_eval > worker.eval_history[stack_idx.saturating_sub(2)];

    if !is_pv
        && !in_check
        && depth < worker.params.razoring_depth
        && static_eval + worker.params.razoring_margin * depth <= alpha
    {
        let score = quiescence::quiesce(board, worker, ply, alpha, alpha + 1);
        if score <= alpha {
            return score;
        }
    }

    if !is_pv
        && !in_check
        && depth <= worker.params.snmp_depth
        && static_eval.abs() < MATE_IN_MAX
        && static_eval - pruning::snmp_margin(&worker.params, depth, improving) >= beta
    {
        return static_eval;
    }

    if allow_null
        && !is_pv
        && !in_check
        && depth >= worker.params.nmp_depth
        && static_eval >= beta
        && Worker::has_non_pawn_material(board, board.side_to_move())
    {
        let r = pruning::nmp_reduction(&worker.params, depth, static_eval, beta);
        let null_status = board.make_null_move();
        worker.push_null();
        let score = -negamax(
            board,
            worker,
            ply + 1,
            depth - 1 - r,
            -beta,
            -beta + 1,
            false,
            !cut_node,
            None,
            true,
        );
        worker.pop_ply();
        board.unmake_null_move(null_status);
        if worker.stop.load(Ordering::Relaxed) {
            return 0;
        }
        if score >= beta {
            // A reduced-depth null-move fail-high can be a zugzwang mirage:
            // confirm it with a real (non-null) search at the same reduced
            // depth before trusting the cutoff.
            if depth - 1 - r <= 0 || is_mate_score(score) {
                return if is_mate_score(score) { beta } else { score };
            }
            let verify = negamax(
                board,
                worker,
                ply,
                depth - 1 - r,
                beta - 1,
                beta,
                false,
                false,
                None,
                false,
            );
            if worker.stop.load(Ordering::Relaxed) {
                return 0;
            }
            if verify >= beta {
                return verify;
            }
        }
    }

    if !is_pv && !in_check && depth >= worker.params.probcut_depth && !is_mate_score(beta) {
        let probcut_beta = beta + worker.params.probcut_margin;
        let mut picker = MovePicker::new(board, &worker.history, ply as usize, tt_move, worker.prev_move());
        picker.skip_quiets(true);
        while let Some(mv) = picker.next() {
            if !mv.is_capture() || !board::see_ge(board, mv, probcut_beta - static_eval) {
                continue;
            }
            board.make_move(mv);
            worker.push_move(board, mv);
            let mut score = -quiescence::quiesce(board, worker, ply + 1, -probcut_beta, -probcut_beta + 1);
            if score >= probcut_beta {
                score = -negamax(
                    board,
                    worker,
                    ply + 1,
                    depth - worker.params.probcut_reduction,
                    -probcut_beta,
                    -probcut_beta + 1,
                    false,
                    !cut_node,
                    None,
                    true,
                );
            }
            worker.pop_ply();
            board.unmake_move(mv);
            if score >= probcut_beta {
                return score;
            }
        }
    }

    let mut picker = MovePicker::new(board, &worker.history, ply as usize, tt_move, worker.prev_move());
    let mut move_count = 0i32;
    let mut quiet_count = 0i32;
    let mut best_score = -MATE;
    let mut best_move = None;
    let mut quiets_tried: Vec<Move> = Vec::new();

    while let Some(mv) = picker.next() {
        let is_quiet = mv.is_quiet();

        if !is_root && best_score > -MATE_IN_MAX && is_quiet && !in_check {
            if depth <= 8 && quiet_count as usize >= pruning::lmp_threshold(depth, improving) {
                continue;
            }
            if depth <= 3 && static_eval + pruning::futility_margin(&worker.params, depth, improving) <= alpha {
                continue;
            }
            let hist_score = worker.history.main.get(board.side_to_move(), mv.from(), mv.to());
            if depth <= 3 && hist_score < pruning::history_pruning_limit(&worker.params, depth, improving) {
                continue;
            }
        }

        if !is_root
            && !in_check
            && depth <= worker.params.see_pruning_depth
            && best_score > -MATE_IN_MAX
            && !board::see_ge(board, mv, pruning::see_margin(&worker.params, depth, mv.is_capture()))
        {
            continue;
        }

        if Some(mv) == excluded {
            continue;
        }

        let mut extension = 0;
        if !is_root
            && depth >= worker.params.se_depth
            && Some(mv) == tt_move
            && tt_entry.is_some_and(|e| e.bound != Bound::Upper && i32::from(e.depth) >= depth - 3)
        {
            let tt_score = tt_entry.unwrap().score;
            if !is_mate_score(tt_score) {
                let singular_beta = tt_score - depth * 2;
                let singular_depth = (depth - 1) / 2;
                // Re-search this same node with `mv` excluded from the move
                // picker: no move is made, so the side to move doesn't flip
                // and the result isn't negated.
                let score = negamax(
                    board,
                    worker,
                    ply,
                    singular_depth,
                    singular_beta - 1,
                    singular_beta,
                    false,
                    cut_node,
                    Some(mv),
                    true,
                );
                if score < singular_beta {
                    extension = 1;
                } else {
                    // Multi-cut: the rest of the node already fails high at
                    // `singular_beta`, so `mv` isn't singular and this whole
                    // node is likely to fail high regardless of which move
                    // is played here.
                    extension = -1;
                }
            }
        }

        move_count += 1;
        if is_quiet {
            quiet_count += 1;
            quiets_tried.push(mv);
        }

        board.make_move(mv);
        worker.push_move(board, mv);
        let gives_check = board.in_check();
        let next_depth = depth - 1 + extension;

        let score = if move_count == 1 {
            -negamax(board, worker, ply + 1, next_depth, -beta, -alpha, is_pv, false, None, true)
        } else {
            let mut reduction = 0;
            if is_quiet && !gives_check {
                reduction = pruning::late_move_reduction(depth, move_count, is_pv, improving);
            }
            let reduced_depth = (next_depth - reduction).max(1);
            let mut s = -negamax(
                board,
                worker,
                ply + 1,
                reduced_depth,
                -alpha - 1,
                -alpha,
                false,
                true,
                None,
                true,
            );
            if s > alpha && (reduction > 0 || is_pv) {
                s = -negamax(board, worker, ply + 1, next_depth, -beta, -alpha, is_pv, false, None, true);
            }
            s
        };
        worker.pop_ply();
        board.unmake_move(mv);

        if worker.stop.load(Ordering::Relaxed) {
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    if is_quiet {
                        worker.history.killers.record(ply as usize, mv);
                        let bonus = crate::history::history_bonus(&worker.params, depth);
                        worker.history.main.update(board.side_to_move(), mv.from(), mv.to(), bonus);
                        if let Some(prev) = worker.prev_move() {
                            worker.history.continuation.update(prev.piece, prev.to, mv.piece(), mv.to(), bonus);
                        }
                        if let Some(prev) = worker.prev_move() {
                            worker.history.counters.set(prev.piece, prev.to, mv);
                        }
                        let malus = -bonus;
                        for &quiet in &quiets_tried {
                            if quiet == mv {
                                continue;
                            }
                            worker.history.main.update(board.side_to_move(), quiet.from(), quiet.to(), malus);
                        }
                    } else {
                        let bonus = crate::history::history_bonus(&worker.params, depth);
                        let victim = mv.captured().unwrap_or(Piece::Pawn);
                        worker.history.captures.update(mv.piece(), mv.to(), victim, bonus);
                    }
                    break;
                }
            }
        }
    }

    if move_count == 0 {
        if excluded.is_some() {
            // The excluded move was the only legal one: nothing refutes it,
            // so it reads as singular.
            return -MATE + ply;
        }
        return if in_check { -MATE + ply } else { 0 };
    }

    if excluded.is_some() {
        return best_score;
    }

    let bound = if best_score <= original_alpha {
        Bound::Upper
    } else if best_score >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };

    // Feed the gap between this node's raw static eval and what the search
    // actually found back into the correction tables, but only when the
    // result isn't itself a one-sided bound pointing the wrong way.
    if !in_check
        && !is_mate_score(best_score)
        && (bound == Bound::Exact
            || (bound == Bound::Lower && best_score > raw_eval)
            || (bound == Bound::Upper && best_score < raw_eval))
    {
        let color = board.side_to_move();
        let error = best_score - raw_eval;
        worker.history.correction.update(color, board.pawn_hash(), error, depth);
        worker.history.material_correction.update(color, board.material_key(), error, depth);
    }

    worker.tt.store(
        hash,
        depth.clamp(0, 255) as u8,
        ply,
        best_score,
        raw_eval,
        bound,
        best_move,
        is_pv,
    );

    best_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn test_worker() -> (Worker, Arc<SearchClock>) {
        let tt = Arc::new(TranspositionTable::new(1));
        let net = Arc::new(NnueNetwork::from_embedded());
        let stop = Arc::new(AtomicBool::new(false));
        let clock = Arc::new(SearchClock::new(TimeControl::Infinite));
        (Worker::new(tt, net, stop, clock.clone(), true), clock)
    }

    #[test]
    fn finds_a_legal_move_from_the_start_position() {
        let mut board = Board::starting_position();
        let (mut worker, _clock) = test_worker();
        let result = iterative_deepening(&mut board, &mut worker, 3, Instant::now(), None);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn finds_mate_in_one() {
        // White to move, Qh5-f7 delivers mate against a bare black king
        // boxed in by its own pawns and rook.
        let mut board = crate::board::from_fen(
            "6rk/5ppp/8/8/8/8/8/3QK3 w - - 0 1",
        )
        .unwrap();
        let (mut worker, _clock) = test_worker();
        let result = iterative_deepening(&mut board, &mut worker, 4, Instant::now(), None);
        assert!(is_mate_score(result.score) || result.score > 500);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn stalemate_position_scores_as_a_draw() {
        let mut board = crate::board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(board::is_stalemate(&board));
        let (mut worker, _clock) = test_worker();
        let score = negamax(
            &mut board,
            &mut worker,
            0,
            2,
            -params::INFINITE,
            params::INFINITE,
            true,
            false,
            None,
            true,
        );
        assert_eq!(score, 0);
    }
}
