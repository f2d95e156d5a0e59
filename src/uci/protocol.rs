//! Parsing UCI command lines into structured commands, independent of how
//! the main loop in `uci::mod` dispatches them.

use crate::search::TimeControl;

/// One parsed line of input. `SetOption`/`Position` carry their raw token
/// slices rather than pre-parsed data — `options::parse_setoption` and
/// `super::try_parse_position_command` do that work, since both need
/// slightly different handling (multi-word names, move-list replay against
/// a live board).
#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(GoOptions),
    SetOption(Vec<String>),
    Stop,
    PonderHit,
    Quit,
    Unknown,
}

/// Every field a `go` command can carry. Time-control fields are collapsed
/// into a `TimeControl` by `resolve_time_control`, not stored raw here.
#[derive(Debug, Clone, Default)]
pub struct GoOptions {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: u64,
    pub binc_ms: u64,
    pub movestogo: Option<u64>,
    pub nodes: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

#[must_use]
pub fn parse_command(line: &str) -> UciCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return UciCommand::Unknown;
    }

    match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(parts.iter().map(|s| (*s).to_string()).collect()),
        "setoption" => UciCommand::SetOption(parts.iter().map(|s| (*s).to_string()).collect()),
        "go" => UciCommand::Go(parse_go(&parts)),
        "stop" => UciCommand::Stop,
        "ponderhit" => UciCommand::PonderHit,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown,
    }
}

fn parse_go(parts: &[&str]) -> GoOptions {
    let mut go = GoOptions::default();
    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                go.depth = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "movetime" => {
                go.movetime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "wtime" => {
                go.wtime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "btime" => {
                go.btime_ms = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "winc" => {
                go.winc_ms = parts.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0);
                i += 2;
            }
            "binc" => {
                go.binc_ms = parts.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(0);
                i += 2;
            }
            "movestogo" => {
                go.movestogo = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "nodes" => {
                go.nodes = parts.get(i + 1).and_then(|s| s.parse().ok());
                i += 2;
            }
            "infinite" => {
                go.infinite = true;
                i += 1;
            }
            "ponder" => {
                go.ponder = true;
                i += 1;
            }
            "mate" => {
                i += 2;
            }
            _ => i += 1,
        }
    }
    go
}

/// Turn the parsed clock fields into a `TimeControl`, picking the clock for
/// `white_to_move` when neither `movetime` nor `infinite` was given.
#[must_use]
pub fn resolve_time_control(go: &GoOptions, white_to_move: bool) -> TimeControl {
    if go.infinite {
        return TimeControl::Infinite;
    }
    if let Some(ms) = go.movetime_ms {
        return TimeControl::MoveTime { time_ms: ms };
    }
    let time_left_ms = if white_to_move { go.wtime_ms } else { go.btime_ms };
    let inc_ms = if white_to_move { go.winc_ms } else { go.binc_ms };
    match time_left_ms {
        Some(time_left_ms) => TimeControl::Incremental {
            time_left_ms,
            inc_ms,
            movestogo: go.movestogo,
        },
        None => TimeControl::Infinite,
    }
}

#[must_use]
pub fn resolve_max_depth(go: &GoOptions) -> u32 {
    go.depth.unwrap_or(crate::search::params::MAX_PLY as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_depth_and_wtime_together() {
        let parts: Vec<&str> = "go depth 10 wtime 5000 winc 100".split_whitespace().collect();
        let go = parse_go(&parts);
        assert_eq!(go.depth, Some(10));
        assert_eq!(go.wtime_ms, Some(5000));
        assert_eq!(go.winc_ms, 100);
    }

    #[test]
    fn infinite_overrides_clock_fields() {
        let go = GoOptions {
            infinite: true,
            wtime_ms: Some(5000),
            ..GoOptions::default()
        };
        assert!(matches!(resolve_time_control(&go, true), TimeControl::Infinite));
    }

    #[test]
    fn picks_the_side_to_moves_clock() {
        let go = GoOptions {
            wtime_ms: Some(1000),
            btime_ms: Some(9000),
            ..GoOptions::default()
        };
        match resolve_time_control(&go, false) {
            TimeControl::Incremental { time_left_ms, .. } => assert_eq!(time_left_ms, 9000),
            _ => panic!("expected incremental time control"),
        }
    }
}
