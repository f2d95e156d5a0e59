//! Lazy-SMP: every worker thread runs the same iterative-deepening search
//! independently against one shared transposition table. There is no work
//! splitting — threads racing each other through slightly different move
//! orders (helper threads get a jittered aspiration window) converge on
//! the same best line faster than one thread alone, and the TT is where
//! the sharing actually happens.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::board::Board;
use crate::history::HistoryTables;
use crate::nnue::NnueNetwork;
use crate::tt::TranspositionTable;

use super::params::SearchParams;
use super::{iterative_deepening, ReportFn, SearchClock, SearchResult, Worker};

/// Shared state every worker in the pool reads from or contributes to.
pub struct SharedContext {
    pub tt: Arc<TranspositionTable>,
    pub net: Arc<NnueNetwork>,
    pub stop: Arc<AtomicBool>,
    pub clock: Arc<SearchClock>,
    pub total_nodes: Arc<AtomicU64>,
    pub params: SearchParams,
}

impl SharedContext {
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>, net: Arc<NnueNetwork>, clock: Arc<SearchClock>) -> Self {
        SharedContext::with_params(tt, net, clock, SearchParams::default())
    }

    #[must_use]
    pub fn with_params(
        tt: Arc<TranspositionTable>,
        net: Arc<NnueNetwork>,
        clock: Arc<SearchClock>,
        params: SearchParams,
    ) -> Self {
        SharedContext {
            tt,
            net,
            stop: Arc::new(AtomicBool::new(false)),
            clock,
            total_nodes: Arc::new(AtomicU64::new(0)),
            params,
        }
    }
}

/// Run a search with `threads` Lazy-SMP workers. The main thread (index 0)
/// is the only one that reports iteration info and whose result is
/// returned; helper threads search silently and exist only to populate the
/// shared transposition table with lines the main thread might reach
/// later.
///
/// `history` carries the persistent ordering/correction tables across `go`
/// calls within the same game: every helper starts from a clone of it, and
/// the main thread's tables (the only ones that matter once the search
/// returns) are written back into it so the caller can age and reuse them
/// next time instead of starting from scratch.
pub fn think(
    board: &Board,
    ctx: &SharedContext,
    threads: usize,
    max_depth: u32,
    mut report: Option<&mut ReportFn<'_>>,
    history: &mut HistoryTables,
) -> SearchResult {
    let threads = threads.max(1);
    let start = Instant::now();

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads - 1);
        for _ in 1..threads {
            let mut helper_board = board.clone();
            let mut worker = Worker::with_params(
                ctx.tt.clone(),
                ctx.net.clone(),
                ctx.stop.clone(),
                ctx.clock.clone(),
                false,
                ctx.params,
            );
            worker.history = history.clone();
            handles.push(scope.spawn(move || {
                iterative_deepening(&mut helper_board, &mut worker, max_depth, start, None);
                worker.nodes
            }));
        }

        let mut main_board = board.clone();
        let mut main_worker = Worker::with_params(
            ctx.tt.clone(),
            ctx.net.clone(),
            ctx.stop.clone(),
            ctx.clock.clone(),
            true,
            ctx.params,
        );
        main_worker.history = history.clone();
        let result = iterative_deepening(&mut main_board, &mut main_worker, max_depth, start, report.as_deref_mut());
        ctx.stop.store(true, Ordering::Relaxed);
        *history = main_worker.history.clone();

        let mut total = main_worker.nodes;
        for handle in handles {
            total += handle.join().unwrap_or(0);
        }
        ctx.total_nodes.fetch_add(total, Ordering::Relaxed);
        ctx.stop.store(false, Ordering::Relaxed);

        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::TimeControl;

    #[test]
    fn multi_threaded_search_agrees_on_a_legal_move() {
        let board = Board::starting_position();
        let tt = Arc::new(TranspositionTable::new(1));
        let net = Arc::new(NnueNetwork::from_embedded());
        let clock = Arc::new(SearchClock::new(TimeControl::Infinite));
        let ctx = SharedContext::new(tt, net, clock);
        let mut history = crate::history::HistoryTables::new(crate::search::params::MAX_PLY as usize);
        let result = think(&board, &ctx, 2, 3, None, &mut history);
        assert!(result.best_move.is_some());
    }
}
