//! Universal Chess Interface: parses commands from stdin and drives an
//! `Engine` accordingly, printing UCI-format responses to stdout.

pub mod options;
pub mod protocol;
pub mod report;

use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use crate::board::{Board, FenError, MoveParseError};
use crate::engine::Engine;

/// Errors in parsing a `position` command against a live board.
#[derive(Debug, Clone)]
pub enum UciError {
    InvalidFen(FenError),
    InvalidMove { move_str: String, error: MoveParseError },
    MissingParts,
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::InvalidFen(e) => write!(f, "invalid FEN: {e}"),
            UciError::InvalidMove { move_str, error } => write!(f, "invalid move '{move_str}': {error}"),
            UciError::MissingParts => write!(f, "missing required parts in position command"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::InvalidFen(e)
    }
}

/// Apply a `position [startpos|fen <fen>] [moves ...]` command to `board`.
pub fn try_parse_position_command(board: &mut Board, parts: &[&str]) -> Result<(), UciError> {
    let mut i = 1;
    if i >= parts.len() {
        return Err(UciError::MissingParts);
    }

    if parts[i] == "startpos" {
        *board = Board::starting_position();
        i += 1;
    } else if parts[i] == "fen" {
        if i + 6 >= parts.len() {
            return Err(UciError::MissingParts);
        }
        let fen = parts[i + 1..i + 7].join(" ");
        *board = crate::board::from_fen(&fen)?;
        i += 7;
    } else {
        return Err(UciError::MissingParts);
    }

    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            let mv = board.parse_move(parts[i]).map_err(|error| UciError::InvalidMove {
                move_str: parts[i].to_string(),
                error,
            })?;
            board.make_move(mv);
            i += 1;
        }
    }

    Ok(())
}

fn parse_position_command(board: &mut Board, parts: &[&str]) {
    if let Err(e) = try_parse_position_command(board, parts) {
        eprintln!("info string {e}");
    }
}

/// Run the UCI loop over stdin/stdout until `quit` or end of input.
#[allow(clippy::too_many_lines)]
pub fn run_uci_loop() {
    let mut engine = match Engine::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("fatal: {e}");
            std::process::exit(1);
        }
    };
    let mut board = Board::starting_position();

    let (info_tx, info_rx) = mpsc::channel::<String>();
    let printer = thread::spawn(move || {
        let stdout = io::stdout();
        while let Ok(line) = info_rx.recv() {
            let mut lock = stdout.lock();
            let _ = writeln!(lock, "{line}");
            let _ = lock.flush();
        }
    });

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match protocol::parse_command(&line) {
            protocol::UciCommand::Uci => options::print_options(&engine),
            protocol::UciCommand::IsReady => report::print_ready(),
            protocol::UciCommand::UciNewGame => {
                engine.stop_and_join();
                engine.new_game();
                board = Board::starting_position();
            }
            protocol::UciCommand::Position(_) => parse_position_command(&mut board, &parts),
            protocol::UciCommand::SetOption(_) => {
                if let Some((name, value)) = options::parse_setoption(&parts) {
                    engine.apply_setoption(&name, value.as_deref());
                }
            }
            protocol::UciCommand::Go(go) => {
                let time_control = protocol::resolve_time_control(&go, board.side_to_move() == crate::types::Color::White);
                let max_depth = protocol::resolve_max_depth(&go);
                let report_tx = info_tx.clone();
                let complete_tx = info_tx.clone();
                engine.go(
                    &board,
                    time_control,
                    max_depth,
                    move |rep| {
                        let _ = report_tx.send(report::format_info_line(rep));
                    },
                    move |best_move| {
                        let _ = complete_tx.send(report::format_bestmove(best_move, None));
                    },
                );
            }
            protocol::UciCommand::Stop => {
                engine.stop_and_join();
            }
            protocol::UciCommand::PonderHit => {}
            protocol::UciCommand::Quit => break,
            protocol::UciCommand::Unknown => {}
        }

        let _ = io::stdout().flush();
    }

    engine.stop_and_join();
    drop(info_tx);
    let _ = printer.join();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_startpos_resets_the_board() {
        let mut board = crate::board::from_fen("8/8/8/8/8/8/8/k6K w - - 0 1").unwrap();
        let parts: Vec<&str> = "position startpos".split_whitespace().collect();
        try_parse_position_command(&mut board, &parts).unwrap();
        assert_eq!(board.hash(), Board::starting_position().hash());
    }

    #[test]
    fn position_replays_a_move_list() {
        let mut board = Board::starting_position();
        let parts: Vec<&str> = "position startpos moves e2e4 e7e5".split_whitespace().collect();
        try_parse_position_command(&mut board, &parts).unwrap();
        assert_ne!(board.hash(), Board::starting_position().hash());
    }

    #[test]
    fn rejects_an_illegal_move_in_the_move_list() {
        let mut board = Board::starting_position();
        let parts: Vec<&str> = "position startpos moves e2e5".split_whitespace().collect();
        assert!(try_parse_position_command(&mut board, &parts).is_err());
    }
}
