//! Parses Extended Position Description lines (`bm`/`am`/`id`/`c0` opcodes)
//! and checks that a shallow search agrees with the labelled best/avoid move.

use std::sync::Arc;

use vireo::board::{self, Board};
use vireo::nnue::NnueNetwork;
use vireo::search::smp::{think, SharedContext};
use vireo::search::{SearchClock, TimeControl};
use vireo::tt::TranspositionTable;

struct EpdRecord {
    board: Board,
    id: Option<String>,
    best_moves: Vec<String>,
    avoid_moves: Vec<String>,
}

fn parse_epd_line(line: &str) -> EpdRecord {
    let mut fen_parts = Vec::new();
    let mut tokens = line.split_whitespace().peekable();
    while fen_parts.len() < 4 {
        fen_parts.push(tokens.next().expect("truncated EPD FEN"));
    }
    let fen = format!("{} 0 1", fen_parts.join(" "));
    let board = board::from_fen(&fen).expect("invalid EPD position");

    let rest: String = tokens.collect::<Vec<_>>().join(" ");
    let mut id = None;
    let mut best_moves = Vec::new();
    let mut avoid_moves = Vec::new();

    for opcode in rest.split(';') {
        let opcode = opcode.trim();
        if let Some(rest) = opcode.strip_prefix("bm ") {
            best_moves.extend(rest.split_whitespace().map(str::to_string));
        } else if let Some(rest) = opcode.strip_prefix("am ") {
            avoid_moves.extend(rest.split_whitespace().map(str::to_string));
        } else if let Some(rest) = opcode.strip_prefix("id ") {
            id = Some(rest.trim_matches('"').to_string());
        }
    }

    EpdRecord { board, id, best_moves, avoid_moves }
}

fn san_to_uci(board: &Board, san: &str) -> Option<String> {
    let moves = board::generate_legal_moves(board);
    for mv in moves {
        let uci = mv.to_string();
        if uci == san {
            return Some(uci);
        }
    }
    None
}

#[test]
fn parses_bm_and_id_opcodes() {
    let record = parse_epd_line(
        "6k1/5ppp/8/8/8/8/8/4Q2K w - - bm e1e8; id \"mate-mock\";",
    );
    assert_eq!(record.id.as_deref(), Some("mate-mock"));
    assert_eq!(record.best_moves, vec!["e1e8".to_string()]);
    assert!(record.avoid_moves.is_empty());
}

#[test]
fn search_agrees_with_a_bm_position() {
    let record = parse_epd_line("6k1/5ppp/8/8/8/8/8/4Q2K w - - bm e1e8; id \"backrank\";");
    assert!(!record.best_moves.is_empty(), "EPD record should carry a best move");

    let tt = Arc::new(TranspositionTable::new(1));
    let net = Arc::new(NnueNetwork::from_embedded());
    let clock = Arc::new(SearchClock::new(TimeControl::Infinite));
    let ctx = SharedContext::new(tt, net, clock);
    let result = think(&record.board, &ctx, 1, 2, None);

    let played = result.best_move.expect("search should find a move").to_string();
    assert!(
        record.best_moves.iter().any(|bm| san_to_uci(&record.board, bm).as_deref() == Some(played.as_str())),
        "search played {played}, expected one of {:?}",
        record.best_moves
    );
}
