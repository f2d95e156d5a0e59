//! Formatting for the `info` and `bestmove` lines the UCI loop prints
//! after each completed iterative-deepening iteration.

use crate::search::params::{is_mate_score, MATE};
use crate::search::SearchReport;
use crate::types::Move;

fn score_to_uci(score: i32) -> String {
    if is_mate_score(score) {
        let plies_to_mate = MATE - score.abs();
        let moves_to_mate = (plies_to_mate + 1) / 2;
        let signed = if score > 0 { moves_to_mate } else { -moves_to_mate };
        format!("mate {signed}")
    } else {
        format!("cp {score}")
    }
}

#[must_use]
pub fn format_info_line(report: &SearchReport) -> String {
    let mut line = format!(
        "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {}",
        report.depth,
        report.seldepth,
        score_to_uci(report.score),
        report.nodes,
        report.nps,
        report.hashfull,
        report.time_ms,
    );
    if !report.pv.is_empty() {
        line.push_str(" pv");
        for mv in &report.pv {
            line.push(' ');
            line.push_str(&mv.to_string());
        }
    }
    line
}

pub fn print_ready() {
    println!("readyok");
}

#[must_use]
pub fn format_bestmove(best_move: Option<Move>, ponder_move: Option<Move>) -> String {
    match best_move {
        Some(mv) => match ponder_move {
            Some(ponder) => format!("bestmove {mv} ponder {ponder}"),
            None => format!("bestmove {mv}"),
        },
        None => "bestmove 0000".to_string(),
    }
}

pub fn print_bestmove(best_move: Option<Move>, ponder_move: Option<Move>) {
    println!("{}", format_bestmove(best_move, ponder_move));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centipawn_scores_format_as_cp() {
        let report = SearchReport {
            depth: 5,
            seldepth: 8,
            score: 37,
            nodes: 1000,
            time_ms: 10,
            nps: 100_000,
            hashfull: 12,
            pv: Vec::new(),
        };
        assert!(format_info_line(&report).contains("score cp 37"));
    }

    #[test]
    fn mate_scores_format_as_mate_in_moves() {
        let report = SearchReport {
            depth: 5,
            seldepth: 5,
            score: MATE - 3,
            nodes: 10,
            time_ms: 1,
            nps: 10,
            hashfull: 0,
            pv: Vec::new(),
        };
        assert!(format_info_line(&report).contains("score mate 2"));
    }
}
