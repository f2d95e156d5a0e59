use vireo::board::{self, Board};
use vireo::types::Color;

/// Recursively makes and unmakes every legal move to `depth`, checking the
/// hash and FEN are restored exactly after each unmake. A cheaper,
/// targeted cousin of the perft tests: those only check move counts, this
/// checks that `unmake_move` is a true inverse of `make_move`.
fn check_make_unmake(board: &mut Board, depth: u32) {
    if depth == 0 {
        return;
    }
    let before_hash = board.hash();
    let before_fen = board::to_fen(board);

    for mv in board::generate_legal_moves(board) {
        board.make_move(mv);
        check_make_unmake(board, depth - 1);
        board.unmake_move(mv);

        assert_eq!(board.hash(), before_hash, "hash not restored after unmake of {mv}");
        assert_eq!(board::to_fen(board), before_fen, "FEN not restored after unmake of {mv}");
    }
}

#[test]
fn startpos_make_unmake_round_trips_to_depth_3() {
    let mut board = Board::starting_position();
    check_make_unmake(&mut board, 3);
}

#[test]
fn kiwipete_make_unmake_round_trips_to_depth_2() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut board = board::from_fen(fen).unwrap();
    check_make_unmake(&mut board, 2);
}

#[test]
fn en_passant_capture_round_trips() {
    let mut board = Board::starting_position();
    let moves = ["e2e4", "a7a6", "e4e5", "d7d5"];
    for m in moves {
        let mv = board.parse_move(m).unwrap();
        board.make_move(mv);
    }
    let before_hash = board.hash();
    let ep = board.parse_move("e5d6").unwrap();
    board.make_move(ep);
    board.unmake_move(ep);
    assert_eq!(board.hash(), before_hash);
}

#[test]
fn castling_round_trips() {
    let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    let mut board = board::from_fen(fen).unwrap();
    let before_hash = board.hash();
    let castle = board.parse_move("e1g1").unwrap();
    board.make_move(castle);
    assert!(!board.castling_rights().kingside(Color::White));
    assert!(!board.castling_rights().queenside(Color::White));
    board.unmake_move(castle);
    assert_eq!(board.hash(), before_hash);
}

#[test]
fn promotion_round_trips() {
    let fen = "8/P7/8/8/8/8/8/k6K w - - 0 1";
    let mut board = board::from_fen(fen).unwrap();
    let before_hash = board.hash();
    let promo = board.parse_move("a7a8q").unwrap();
    board.make_move(promo);
    board.unmake_move(promo);
    assert_eq!(board.hash(), before_hash);
}
