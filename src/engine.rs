//! The non-global context a UCI session drives: one transposition table,
//! one set of tunable search parameters, and the handful of `UciOptions`
//! that control how a search is launched. Constructed once in `main` and
//! threaded through `uci` by reference — there is no process-wide
//! singleton holding search state, only the read-only precomputed tables
//! (attacks, Zobrist keys, cuckoo table) are ever global.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::Board;
use crate::history::HistoryTables;
use crate::nnue::NnueNetwork;
use crate::search::params::SearchParams;
use crate::search::smp::{self, SharedContext};
use crate::search::{SearchClock, SearchResult, TimeControl};
use crate::tt::TranspositionTable;
use crate::types::Move;

const DEFAULT_HASH_MB: usize = 16;

/// Resource failures `Engine::new`/`set_option` can hit: a bad eval-file
/// path or an unparsable NNUE weight blob. Never raised by ordinary search
/// or protocol handling, which report through `UciError` instead.
#[derive(Debug)]
pub enum EngineError {
    WeightLoad(io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::WeightLoad(e) => write!(f, "failed to load NNUE weights: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Book/tablebase probing hooks. No real backend ships with this crate;
/// the traits exist so `Engine` has somewhere to plug one in without
/// reaching past its own boundary.
pub trait TbProbe: Send + Sync {
    fn probe_root(&self, board: &Board) -> Option<Move>;
}

pub trait BookProbe: Send + Sync {
    fn probe(&self, board: &Board) -> Option<Move>;
}

/// Engine-level options a UCI `setoption` can change, distinct from the
/// search-tuning `SearchParams` (which `setoption` also reaches, via
/// `uci::options`).
pub struct UciOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub move_overhead_ms: u64,
    pub ponder: bool,
    pub chess960: bool,
}

impl UciOptions {
    #[must_use]
    pub fn new() -> Self {
        UciOptions {
            hash_mb: DEFAULT_HASH_MB,
            threads: 1,
            move_overhead_ms: 100,
            ponder: false,
            chess960: false,
        }
    }
}

impl Default for UciOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns everything a running search needs and outlives any one search
/// call: the shared transposition table, the NNUE weights, the tunable
/// parameters, and the handle to whatever search is currently in flight.
pub struct Engine {
    pub tt: Arc<TranspositionTable>,
    pub net: Arc<NnueNetwork>,
    pub options: UciOptions,
    pub params: SearchParams,
    pub tablebase: Option<Box<dyn TbProbe>>,
    pub book: Option<Box<dyn BookProbe>>,
    stop: Arc<AtomicBool>,
    best_move: Arc<Mutex<Option<Move>>>,
    search_thread: Option<JoinHandle<()>>,
    /// Ordering/correction tables that outlive any one `go`: aged (halved),
    /// never rebuilt from scratch, so a game's learning carries from move
    /// to move. Reset only by `new_game`.
    history: Arc<Mutex<HistoryTables>>,
}

impl Engine {
    /// Build an engine using the embedded default NNUE network.
    pub fn new() -> Result<Self, EngineError> {
        debug_assert_eq!(
            crate::cuckoo::table_len(),
            3668,
            "cuckoo table must hold exactly 3668 reversible-move keys"
        );
        let options = UciOptions::new();
        Ok(Engine {
            tt: Arc::new(TranspositionTable::new(options.hash_mb)),
            net: Arc::new(NnueNetwork::from_embedded()),
            options,
            params: SearchParams::default(),
            tablebase: None,
            book: None,
            stop: Arc::new(AtomicBool::new(false)),
            best_move: Arc::new(Mutex::new(None)),
            search_thread: None,
            history: Arc::new(Mutex::new(HistoryTables::new(crate::search::params::MAX_PLY as usize))),
        })
    }

    /// Build an engine loading NNUE weights from `reader` instead of the
    /// embedded network (the `EvalFile` UCI option path).
    pub fn with_net_reader<R: io::Read>(reader: &mut R) -> Result<Self, EngineError> {
        let mut engine = Self::new()?;
        let net = NnueNetwork::from_reader(reader).map_err(EngineError::WeightLoad)?;
        engine.net = Arc::new(net);
        Ok(engine)
    }

    /// `ucinewgame`: clear all search memory so the next search starts
    /// from a clean slate.
    pub fn new_game(&mut self) {
        self.tt.clear();
        *self.history.lock() = HistoryTables::new(crate::search::params::MAX_PLY as usize);
    }

    /// Reallocate the transposition table to `mb` megabytes (the `Hash`
    /// option). Drops all existing entries.
    pub fn resize_hash(&mut self, mb: usize) {
        self.options.hash_mb = mb.max(1);
        self.tt = Arc::new(TranspositionTable::new(self.options.hash_mb));
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.search_thread.is_some()
    }

    /// `stop`: request the in-flight search to return as soon as possible
    /// and wait for it to actually stop.
    pub fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
        self.stop.store(false, Ordering::Relaxed);
    }

    #[must_use]
    pub fn last_best_move(&self) -> Option<Move> {
        *self.best_move.lock()
    }

    /// Launch a background search over `board`. `on_report` fires once per
    /// completed iteration and `on_complete` fires exactly once, after the
    /// search has picked its final move — both run on the spawned search
    /// thread, so both must be `Send + 'static`.
    pub fn go<F, C>(&mut self, board: &Board, time_control: TimeControl, max_depth: u32, mut on_report: F, on_complete: C)
    where
        F: FnMut(&crate::search::SearchReport) + Send + 'static,
        C: FnOnce(Option<Move>) + Send + 'static,
    {
        if self.is_searching() {
            self.stop_and_join();
        }

        *self.best_move.lock() = None;
        let ctx = SharedContext::with_params(
            self.tt.clone(),
            self.net.clone(),
            Arc::new(SearchClock::new(time_control)),
            self.params,
        );
        self.stop = ctx.stop.clone();
        let board = board.clone();
        let threads = self.options.threads;
        let best_move_sink = self.best_move.clone();

        let mut history = self.history.lock();
        history.age();
        let mut history_snapshot = history.clone();
        drop(history);
        let history_sink = self.history.clone();

        let handle = std::thread::spawn(move || {
            let mut report_fn = move |report: &crate::search::SearchReport| on_report(report);
            let result: SearchResult =
                smp::think(&board, &ctx, threads, max_depth, Some(&mut report_fn), &mut history_snapshot);
            *history_sink.lock() = history_snapshot;
            *best_move_sink.lock() = result.best_move;
            on_complete(result.best_move);
        });
        self.search_thread = Some(handle);
    }

    /// Synchronous helper used by tests and `go depth N` style callers
    /// that don't need the background-thread/ponder machinery.
    #[must_use]
    pub fn search_blocking(&self, board: &Board, max_depth: u32) -> SearchResult {
        let clock = Arc::new(SearchClock::new(TimeControl::Infinite));
        let ctx = SharedContext::with_params(self.tt.clone(), self.net.clone(), clock, self.params);
        let mut history = self.history.lock();
        history.age();
        let mut history_snapshot = history.clone();
        drop(history);
        let result = smp::think(board, &ctx, self.options.threads, max_depth, None, &mut history_snapshot);
        *self.history.lock() = history_snapshot;
        result
    }

    /// Apply one `setoption`. Tries the engine-level options first, then
    /// falls back to the tunable search parameters.
    pub fn apply_setoption(&mut self, name: &str, value: Option<&str>) {
        let normalized = name.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hash" => {
                if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                    self.resize_hash(mb);
                }
            }
            "threads" => {
                if let Some(t) = value.and_then(|v| v.parse::<usize>().ok()) {
                    self.options.threads = t.clamp(1, 256);
                }
            }
            "move overhead" => {
                if let Some(v) = value.and_then(|v| v.parse::<u64>().ok()) {
                    self.options.move_overhead_ms = v;
                }
            }
            "ponder" => {
                if let Some(v) = value {
                    self.options.ponder = matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1");
                }
            }
            "uci_chess960" => {
                if let Some(v) = value {
                    self.options.chess960 = matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1");
                }
            }
            "clear hash" => {
                self.tt.clear();
            }
            _ => {
                if let Some(v) = value {
                    self.params.apply_setoption(name, v);
                }
            }
        }
    }

    #[must_use]
    pub fn uptime(&self, since: Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    #[test]
    fn runs_a_blocking_search_from_the_start_position() {
        let engine = Engine::new().unwrap();
        let board = Board::starting_position();
        let result = engine.search_blocking(&board, 3);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn setoption_resizes_hash() {
        let mut engine = Engine::new().unwrap();
        engine.apply_setoption("Hash", Some("4"));
        assert_eq!(engine.options.hash_mb, 4);
    }

    #[test]
    fn setoption_reaches_search_params() {
        let mut engine = Engine::new().unwrap();
        engine.apply_setoption("SNMPMargin", Some("55"));
        assert_eq!(engine.params.snmp_margin, 55);
    }

    #[test]
    fn clear_hash_wipes_the_transposition_table() {
        let mut engine = Engine::new().unwrap();
        let board = Board::starting_position();
        let _ = engine.search_blocking(&board, 4);
        assert!(!engine.tt.is_empty());
        engine.apply_setoption("Clear Hash", None);
        assert!(engine.tt.is_empty());
    }
}
