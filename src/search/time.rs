//! Time management: turns a UCI `go` command's clock parameters into soft
//! and hard search-time budgets.

use std::time::{Duration, Instant};

use super::params::MOVE_OVERHEAD_MS;

const PANIC_THRESHOLD_MS: u64 = 5000;
const MIN_MOVES_TO_GO: u64 = 10;
const CRITICAL_TIME_MARGIN_MS: u64 = 50;
const PANIC_TIME_FRACTION: f64 = 0.05;
const PANIC_MIN_FRACTION: u64 = 5;
const PANIC_HARD_FRACTION: u64 = 3;
const LONG_TIME_CONTROL_MS: u64 = 300_000;
const MEDIUM_TIME_CONTROL_MS: u64 = 60_000;
const LONG_MOVES_ESTIMATE: u64 = 40;
const MEDIUM_MOVES_ESTIMATE: u64 = 30;
const SHORT_MOVES_ESTIMATE: u64 = 25;
const SOFT_TIME_PERCENT: u64 = 70;
const HARD_TIME_PERCENT: u64 = 90;

/// The clock information a UCI `go` command can supply.
#[derive(Debug, Clone, Copy, Default)]
pub enum TimeControl {
    #[default]
    Infinite,
    MoveTime {
        time_ms: u64,
    },
    Incremental {
        time_left_ms: u64,
        inc_ms: u64,
        movestogo: Option<u64>,
    },
}

impl TimeControl {
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        matches!(self, TimeControl::Infinite)
    }

    /// `(soft_ms, hard_ms)`: the search should try to stop by `soft_ms` but
    /// must never exceed `hard_ms`.
    #[must_use]
    pub fn compute_limits(&self) -> (u64, u64) {
        match self {
            TimeControl::Infinite => (u64::MAX, u64::MAX),
            TimeControl::MoveTime { time_ms } => {
                let capped = (*time_ms).max(1);
                (capped, capped)
            }
            TimeControl::Incremental {
                time_left_ms,
                inc_ms,
                movestogo,
            } => compute_incremental_limits(*time_left_ms, *inc_ms, *movestogo),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_incremental_limits(time_left_ms: u64, inc_ms: u64, movestogo: Option<u64>) -> (u64, u64) {
    let safe_ms = time_left_ms.saturating_sub(MOVE_OVERHEAD_MS);

    if time_left_ms <= MOVE_OVERHEAD_MS.saturating_add(CRITICAL_TIME_MARGIN_MS) {
        let fallback = (time_left_ms / 2).max(1);
        return (fallback, fallback);
    }

    if safe_ms < PANIC_THRESHOLD_MS {
        let panic_factor = safe_ms as f64 / PANIC_THRESHOLD_MS as f64;
        let target = (safe_ms as f64 * PANIC_TIME_FRACTION * panic_factor) as u64 + inc_ms;
        let target = target.min(safe_ms / PANIC_MIN_FRACTION).max(1);
        let hard = (safe_ms / PANIC_HARD_FRACTION).max(target).max(1);
        return (target, hard);
    }

    let moves_to_go = movestogo
        .unwrap_or(if safe_ms > LONG_TIME_CONTROL_MS {
            LONG_MOVES_ESTIMATE
        } else if safe_ms > MEDIUM_TIME_CONTROL_MS {
            MEDIUM_MOVES_ESTIMATE
        } else {
            SHORT_MOVES_ESTIMATE
        })
        .max(MIN_MOVES_TO_GO);

    let base_time = safe_ms / moves_to_go + inc_ms;
    let soft_cap = safe_ms * SOFT_TIME_PERCENT / 100;
    let hard_cap = safe_ms * HARD_TIME_PERCENT / 100;

    let soft_ms = base_time.min(soft_cap).max(1);
    let hard_ms = hard_cap.max(soft_ms).max(1);
    (soft_ms, hard_ms)
}

/// Live clock for one search: knows when it started and how long it may
/// run, and is checked periodically (not every node) by the search loop.
pub struct SearchClock {
    start: Instant,
    soft_ms: u64,
    hard_ms: u64,
}

impl SearchClock {
    #[must_use]
    pub fn new(time_control: TimeControl) -> Self {
        let (soft_ms, hard_ms) = time_control.compute_limits();
        SearchClock {
            start: Instant::now(),
            soft_ms,
            hard_ms,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// True once iterative deepening should not start another full
    /// iteration (it's past the soft budget).
    #[must_use]
    pub fn should_stop_deepening(&self) -> bool {
        self.soft_ms != u64::MAX && self.elapsed_ms() >= self.soft_ms
    }

    /// True once the in-progress search must abort immediately.
    #[must_use]
    pub fn should_stop_hard(&self) -> bool {
        self.hard_ms != u64::MAX && self.elapsed_ms() >= self.hard_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_control_has_no_limit() {
        let (soft, hard) = TimeControl::Infinite.compute_limits();
        assert_eq!(soft, u64::MAX);
        assert_eq!(hard, u64::MAX);
    }

    #[test]
    fn movetime_uses_exact_value() {
        let (soft, hard) = TimeControl::MoveTime { time_ms: 5000 }.compute_limits();
        assert_eq!((soft, hard), (5000, 5000));
    }

    #[test]
    fn incremental_soft_never_exceeds_hard() {
        let tc = TimeControl::Incremental {
            time_left_ms: 300_000,
            inc_ms: 3000,
            movestogo: None,
        };
        let (soft, hard) = tc.compute_limits();
        assert!(soft > 0 && hard >= soft && hard < 300_000);
    }

    #[test]
    fn critical_low_time_still_returns_a_positive_budget() {
        let tc = TimeControl::Incremental {
            time_left_ms: 80,
            inc_ms: 0,
            movestogo: None,
        };
        let (soft, hard) = tc.compute_limits();
        assert!(soft >= 1 && hard >= 1);
    }

    #[test]
    fn panic_mode_is_conservative() {
        let tc = TimeControl::Incremental {
            time_left_ms: 3000,
            inc_ms: 0,
            movestogo: None,
        };
        let (soft, _hard) = tc.compute_limits();
        assert!(soft > 0 && soft < 3000);
    }
}
