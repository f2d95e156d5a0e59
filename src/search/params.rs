//! Search tuning constants, transcribed from `original_source/Tunable.h`.
//! Centralized here rather than inlined at each call site so a future
//! tuning pass only touches one file.

pub const MATE: i32 = 31_000;
pub const MAX_PLY: i32 = 128;
pub const MATE_IN_MAX: i32 = MATE - MAX_PLY;
pub const TBWIN: i32 = 30_000;
pub const TBWIN_IN_MAX: i32 = TBWIN - MAX_PLY;
pub const INFINITE: i32 = MATE + 1;

pub const MOVE_OVERHEAD_MS: u64 = 100;

/// Every pruning/reduction margin below is, per the original engine's
/// `Tunable.h`, a named constant that doubles as an SPSA tuning variable:
/// each field has a compiled-in default but can be changed by a `setoption`
/// at runtime (see `uci::options::UciOptions::apply_setoption`). Plain
/// `i32`/`u32` fields rather than atomics — options are only ever touched
/// from the single UCI input thread between searches, never while a search
/// is running, so a `Copy` snapshot handed to each worker at search start
/// is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    pub razoring_depth: i32,
    pub razoring_margin: i32,
    pub snmp_depth: i32,
    pub snmp_margin: i32,
    pub nmp_depth: i32,
    pub nmp_reduction: i32,
    pub nmp_margin: i32,
    pub nmp_max: i32,
    pub nmp_divisor: i32,
    pub probcut_depth: i32,
    pub probcut_margin: i32,
    pub probcut_reduction: i32,
    pub fp_margin: i32,
    pub fp_depth: i32,
    pub fp_history_limit: i32,
    pub fp_history_limit_improving: i32,
    pub history_pruning_depth: i32,
    pub history_pruning_limit: i32,
    pub history_pruning_limit_improving: i32,
    pub see_pruning_depth: i32,
    pub see_quiet_margin: i32,
    pub see_noisy_margin: i32,
    pub se_depth: i32,
    pub hist_reduction_divisor: i32,
    pub history_bonus_margin: i32,
    pub history_bonus_bias: i32,
    pub history_bonus_max: i32,
    pub delta_pruning_margin: i32,
    pub delta_pruning_bias: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            razoring_depth: 3,
            razoring_margin: 200,
            snmp_depth: 6,
            snmp_margin: 70,
            nmp_depth: 3,
            nmp_reduction: 3,
            nmp_margin: 32,
            nmp_max: 384,
            nmp_divisor: 128,
            probcut_depth: 5,
            probcut_margin: 100,
            probcut_reduction: 4,
            fp_margin: 95,
            fp_depth: 8,
            fp_history_limit: 12_000,
            fp_history_limit_improving: 6_000,
            history_pruning_depth: 3,
            history_pruning_limit: -1_000,
            history_pruning_limit_improving: 1_500,
            see_pruning_depth: 9,
            see_quiet_margin: -64,
            see_noisy_margin: -19,
            se_depth: 8,
            hist_reduction_divisor: 5_000,
            history_bonus_margin: 364,
            history_bonus_bias: -66,
            history_bonus_max: 1_882,
            delta_pruning_margin: 1_000,
            delta_pruning_bias: 300,
        }
    }
}

impl SearchParams {
    /// Apply one `setoption name <NAME> value <VALUE>` pair. Returns `true`
    /// if `name` (case-insensitively) named one of these tunables.
    pub fn apply_setoption(&mut self, name: &str, value: &str) -> bool {
        let Ok(v) = value.parse::<i32>() else { return false };
        match name.to_ascii_lowercase().as_str() {
            "razoringdepth" => self.razoring_depth = v,
            "razoringmargin" => self.razoring_margin = v,
            "snmpdepth" => self.snmp_depth = v,
            "snmpmargin" => self.snmp_margin = v,
            "nmpdepth" => self.nmp_depth = v,
            "nmpreduction" => self.nmp_reduction = v,
            "nmpmargin" => self.nmp_margin = v,
            "nmpmax" => self.nmp_max = v,
            "nmpdivisor" => self.nmp_divisor = v,
            "probcutdepth" => self.probcut_depth = v,
            "probcutmargin" => self.probcut_margin = v,
            "probcutreduction" => self.probcut_reduction = v,
            "fpmargin" => self.fp_margin = v,
            "fpdepth" => self.fp_depth = v,
            "fphistorylimit" => self.fp_history_limit = v,
            "fphistorylimitimproving" => self.fp_history_limit_improving = v,
            "historypruningdepth" => self.history_pruning_depth = v,
            "historypruninglimit" => self.history_pruning_limit = v,
            "historypruninglimitimproving" => self.history_pruning_limit_improving = v,
            "seepruningdepth" => self.see_pruning_depth = v,
            "seequietmargin" => self.see_quiet_margin = v,
            "seenoisymargin" => self.see_noisy_margin = v,
            "sedepth" => self.se_depth = v,
            "histreductiondivisor" => self.hist_reduction_divisor = v,
            "historybonusmargin" => self.history_bonus_margin = v,
            "historybonusbias" => self.history_bonus_bias = v,
            "historybonusmax" => self.history_bonus_max = v,
            "deltapruningmargin" => self.delta_pruning_margin = v,
            "deltapruningbias" => self.delta_pruning_bias = v,
            _ => return false,
        }
        true
    }

    /// Names exposed as UCI spin options, matching `uci::options`' print
    /// list order.
    pub const TUNABLE_NAMES: &'static [&'static str] = &[
        "RazoringDepth",
        "RazoringMargin",
        "SNMPDepth",
        "SNMPMargin",
        "NMPDepth",
        "NMPReduction",
        "NMPMargin",
        "NMPMax",
        "NMPDivisor",
        "ProbCutDepth",
        "ProbCutMargin",
        "ProbcutReduction",
        "FPMargin",
        "FPDepth",
        "FPHistoryLimit",
        "FPHistoryLimitImproving",
        "HistoryPruningDepth",
        "HistoryPruningLimit",
        "HistoryPruningLimitImproving",
        "SEEPruningDepth",
        "SEEQuietMargin",
        "SEENoisyMargin",
        "SEDepth",
        "HistReductionDivisor",
        "HistoryBonusMargin",
        "HistoryBonusBias",
        "HistoryBonusMax",
        "DeltaPruningMargin",
        "DeltaPruningBias",
    ];
}

/// Mate score adjusted for the number of plies from the root, the
/// convention used for both the search's alpha-beta window and the value
/// handed to the transposition table (which separately re-relativizes it
/// per probing ply, see `crate::tt`).
#[must_use]
pub fn mate_in(ply: i32) -> i32 {
    MATE - ply
}

#[must_use]
pub fn mated_in(ply: i32) -> i32 {
    -MATE + ply
}

#[must_use]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_IN_MAX
}
