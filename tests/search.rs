use std::sync::Arc;

use vireo::board::{self, Board};
use vireo::nnue::NnueNetwork;
use vireo::search::smp::{SharedContext, think};
use vireo::search::TimeControl;
use vireo::tt::TranspositionTable;

fn search_to_depth(fen: &str, depth: u32) -> vireo::search::SearchResult {
    let board = board::from_fen(fen).unwrap();
    let tt = Arc::new(TranspositionTable::new(1));
    let net = Arc::new(NnueNetwork::from_embedded());
    let clock = Arc::new(vireo::search::SearchClock::new(TimeControl::Infinite));
    let ctx = SharedContext::new(tt, net, clock);
    think(&board, &ctx, 1, depth, None)
}

#[test]
fn finds_mate_in_one_back_rank() {
    let result = search_to_depth("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1", 2);
    let mv = result.best_move.expect("should find a move");
    assert_eq!(mv.to_string(), "e1e8", "should play Qe8#");
}

#[test]
fn no_move_in_checkmate() {
    let board = board::from_fen("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1").unwrap();
    assert!(board::is_checkmate(&board));
    let result = search_to_depth("rnb1kbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1", 4);
    assert!(result.best_move.is_none());
}

#[test]
fn single_legal_move_is_forced() {
    let result = search_to_depth("8/8/8/8/8/8/8/K6rk w - - 0 1", 4);
    let mv = result.best_move.expect("should find a move");
    assert_eq!(mv.to_string(), "a1a2");
}

#[test]
fn identifies_stalemate() {
    let board = board::from_fen("k7/8/1QK5/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(board::is_stalemate(&board));
    assert!(!board::is_checkmate(&board));
}

#[test]
fn fifty_move_rule_is_a_draw() {
    let board = board::from_fen("8/8/8/8/8/8/8/K1k5 w - - 100 1").unwrap();
    assert!(board.is_draw());
}

#[test]
fn handles_draw_by_repetition() {
    let mut board = Board::starting_position();
    for m in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = board.parse_move(m).unwrap();
        board.make_move(mv);
    }
    assert!(board.is_draw());
}

#[test]
fn iterative_deepening_stays_on_a_legal_move_as_depth_grows() {
    let board = Board::starting_position();
    let legal = board::generate_legal_moves(&board);

    for depth in [2, 4] {
        let result = search_to_depth(&board::to_fen(&board), depth);
        let mv = result.best_move.expect("should find a move");
        assert!(legal.iter().any(|m| *m == mv), "depth {depth} move should be legal");
    }
}
