use vireo::board::{self, Board};

fn perft_from_fen(fen: &str, depth: u32) -> u64 {
    let mut board = board::from_fen(fen).unwrap();
    board::perft(&mut board, depth)
}

#[test]
fn startpos_perft_depths_1_to_4() {
    let mut board = Board::starting_position();
    assert_eq!(board::perft(&mut board, 1), 20);
    assert_eq!(board::perft(&mut board, 2), 400);
    assert_eq!(board::perft(&mut board, 3), 8_902);
    assert_eq!(board::perft(&mut board, 4), 197_281);
}

#[test]
fn kiwipete_perft_depth_3() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    assert_eq!(perft_from_fen(fen, 3), 97_862);
}

#[test]
fn position_3_perft_depth_4() {
    let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    assert_eq!(perft_from_fen(fen, 4), 43_238);
}

#[test]
fn position_5_perft_depth_3() {
    let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    assert_eq!(perft_from_fen(fen, 3), 62_379);
}
