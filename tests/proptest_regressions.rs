//! Property-based fuzzing over random legal move sequences: make/unmake
//! symmetry, FEN round-trips, and a couple of cheap invariants that must
//! hold no matter which random line got picked.

use proptest::prelude::*;
use rand::prelude::*;

use vireo::board::{self, Board};

fn random_legal_line(seed: u64, num_moves: usize) -> (Board, Vec<vireo::types::Move>) {
    let mut board = Board::starting_position();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut played = Vec::new();

    for _ in 0..num_moves {
        let moves = board::generate_legal_moves(&board);
        if moves.is_empty() {
            break;
        }
        let idx = rng.gen_range(0..moves.len());
        let mv = moves.as_slice()[idx];
        board.make_move(mv);
        played.push(mv);
    }

    (board, played)
}

proptest! {
    #[test]
    fn make_unmake_restores_state_after_a_random_line(seed in any::<u64>(), num_moves in 1usize..20) {
        let mut board = Board::starting_position();
        let initial_hash = board.hash();
        let initial_fen = board::to_fen(&board);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut played = Vec::new();
        for _ in 0..num_moves {
            let moves = board::generate_legal_moves(&board);
            if moves.is_empty() {
                break;
            }
            let idx = rng.gen_range(0..moves.len());
            let mv = moves.as_slice()[idx];
            board.make_move(mv);
            played.push(mv);
        }

        while let Some(mv) = played.pop() {
            board.unmake_move(mv);
        }

        prop_assert_eq!(board.hash(), initial_hash);
        prop_assert_eq!(board::to_fen(&board), initial_fen);
    }

    #[test]
    fn fen_round_trip_preserves_position(seed in any::<u64>(), num_moves in 0usize..20) {
        let (board, _) = random_legal_line(seed, num_moves);
        let fen = board::to_fen(&board);
        let restored = board::from_fen(&fen).expect("round-tripped FEN should reparse");

        prop_assert_eq!(board.hash(), restored.hash());
        prop_assert_eq!(board.side_to_move(), restored.side_to_move());
        prop_assert_eq!(board.castling_rights(), restored.castling_rights());
        prop_assert_eq!(board.en_passant_square(), restored.en_passant_square());
    }

    #[test]
    fn legal_moves_never_leave_the_mover_in_check(seed in any::<u64>()) {
        let mut board = Board::starting_position();
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..10 {
            let moves = board::generate_legal_moves(&board);
            if moves.is_empty() {
                break;
            }
            let mover = board.side_to_move();
            for mv in moves.iter() {
                board.make_move(*mv);
                prop_assert!(!board.is_square_attacked(board.king_square(mover), mover.opponent()));
                board.unmake_move(*mv);
            }

            let idx = rng.gen_range(0..moves.len());
            board.make_move(moves.as_slice()[idx]);
        }
    }

    #[test]
    fn see_never_exceeds_the_captured_pieces_value(seed in any::<u64>(), num_moves in 0usize..15) {
        let (board, _) = random_legal_line(seed, num_moves);

        for mv in board::generate_legal_moves(&board).iter() {
            if let Some(captured) = mv.captured() {
                prop_assert!(board::see(&board, *mv) <= captured.see_value());
            }
        }
    }
}
