//! Make/unmake move application with full Zobrist incremental updates.

use super::state::{Board, Status};
use crate::types::{CastlingRights, Color, Move, Piece, Square};
use crate::zobrist;

impl Board {
    /// Apply `mv` to the board. The move must be pseudo-legal (the caller
    /// is responsible for having generated it from this exact position).
    /// Pushes a `Status` snapshot that `unmake_move` consumes.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();

        let status = Status {
            captured: mv.captured(),
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
            pawn_hash: self.pawn_hash,
            material_key: self.material_key,
            checkers: self.checkers,
            eval: None,
        };

        if let Some(ep) = self.en_passant {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.en_passant = None;

        self.halfmove_clock += 1;
        if piece == Piece::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        }

        if mv.is_en_passant() {
            let captured_sq = Square::new(from.rank(), to.file());
            self.remove_piece(them, Piece::Pawn, captured_sq);
        } else if let Some(captured) = mv.captured() {
            self.remove_piece(them, captured, to);
        }

        self.remove_piece(us, piece, from);
        let placed_piece = mv.promotion_piece().unwrap_or(piece);
        self.put_piece(us, placed_piece, to);

        if mv.is_castle_kingside() {
            let (rook_from, rook_to) = castle_rook_squares(us, true);
            self.remove_piece(us, Piece::Rook, rook_from);
            self.put_piece(us, Piece::Rook, rook_to);
        } else if mv.is_castle_queenside() {
            let (rook_from, rook_to) = castle_rook_squares(us, false);
            self.remove_piece(us, Piece::Rook, rook_from);
            self.put_piece(us, Piece::Rook, rook_to);
        }

        let old_castling_keys = zobrist::castling_rights_key(Color::White, self.castling)
            ^ zobrist::castling_rights_key(Color::Black, self.castling);
        let touched = CastlingRights::permission_mask_for(from.as_index())
            | CastlingRights::permission_mask_for(to.as_index());
        self.castling = self.castling.masked_by(touched);
        let new_castling_keys = zobrist::castling_rights_key(Color::White, self.castling)
            ^ zobrist::castling_rights_key(Color::Black, self.castling);
        self.hash ^= old_castling_keys ^ new_castling_keys;

        if mv.is_double_pawn_push() {
            let ep_sq = Square::new((from.rank() + to.rank()) / 2, from.file());
            self.en_passant = Some(ep_sq);
            self.hash ^= zobrist::en_passant_key(ep_sq.file());
        }

        self.hash ^= zobrist::side_to_move_key();
        self.side_to_move = them;
        if them == Color::White {
            self.fullmove_number += 1;
        }

        self.checkers = self.compute_checkers();
        self.ply_from_null += 1;
        self.push_history();
        self.status_stack.push(status);
    }

    /// Undo the most recently made move.
    pub fn unmake_move(&mut self, mv: Move) {
        self.pop_history();
        let status = self.status_stack.pop().expect("unmake without make");

        let them = self.side_to_move;
        let us = them.opponent();
        if them == Color::White {
            self.fullmove_number -= 1;
        }
        self.side_to_move = us;

        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();

        if mv.is_castle_kingside() {
            let (rook_from, rook_to) = castle_rook_squares(us, true);
            self.remove_piece(us, Piece::Rook, rook_to);
            self.put_piece(us, Piece::Rook, rook_from);
        } else if mv.is_castle_queenside() {
            let (rook_from, rook_to) = castle_rook_squares(us, false);
            self.remove_piece(us, Piece::Rook, rook_to);
            self.put_piece(us, Piece::Rook, rook_from);
        }

        let placed_piece = mv.promotion_piece().unwrap_or(piece);
        self.remove_piece(us, placed_piece, to);
        self.put_piece(us, piece, from);

        if mv.is_en_passant() {
            let captured_sq = Square::new(from.rank(), to.file());
            self.put_piece(them, Piece::Pawn, captured_sq);
        } else if let Some(captured) = status.captured {
            self.put_piece(them, captured, to);
        }

        self.castling = status.castling;
        self.en_passant = status.en_passant;
        self.halfmove_clock = status.halfmove_clock;
        self.hash = status.hash;
        self.pawn_hash = status.pawn_hash;
        self.material_key = status.material_key;
        self.checkers = status.checkers;
        self.ply_from_null -= 1;
    }

    /// Apply a null move (pass the turn), used by null-move pruning.
    pub fn make_null_move(&mut self) -> Status {
        let status = Status {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
            pawn_hash: self.pawn_hash,
            material_key: self.material_key,
            checkers: self.checkers,
            eval: None,
        };
        if let Some(ep) = self.en_passant {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.en_passant = None;
        self.hash ^= zobrist::side_to_move_key();
        self.side_to_move = self.side_to_move.opponent();
        self.checkers = self.compute_checkers();
        self.ply_from_null = 0;
        self.push_history();
        status
    }

    pub fn unmake_null_move(&mut self, status: Status) {
        self.pop_history();
        self.side_to_move = self.side_to_move.opponent();
        self.castling = status.castling;
        self.en_passant = status.en_passant;
        self.halfmove_clock = status.halfmove_clock;
        self.hash = status.hash;
        self.pawn_hash = status.pawn_hash;
        self.material_key = status.material_key;
        self.checkers = status.checkers;
    }
}

fn castle_rook_squares(color: Color, kingside: bool) -> (Square, Square) {
    let rank = if color.is_white() { 0 } else { 7 };
    if kingside {
        (Square::new(rank, 7), Square::new(rank, 5))
    } else {
        (Square::new(rank, 0), Square::new(rank, 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen;
    use crate::board::movegen;

    #[test]
    fn make_unmake_restores_exact_state() {
        let mut board = Board::starting_position();
        let before_hash = board.hash();
        let moves = movegen::generate_legal_moves(&board);
        for mv in moves.iter().copied() {
            let snapshot = board.clone();
            board.make_move(mv);
            board.unmake_move(mv);
            assert_eq!(board.hash(), before_hash);
            assert_eq!(board.all_occupied(), snapshot.all_occupied());
            assert_eq!(board.side_to_move(), snapshot.side_to_move());
            assert_eq!(board.castling_rights(), snapshot.castling_rights());
        }
    }

    #[test]
    fn incremental_hash_matches_from_scratch_recomputation() {
        let mut board = Board::starting_position();
        let (h, ph, mk) = board.hash_from_scratch();
        assert_eq!(h, board.hash());
        assert_eq!(ph, board.pawn_hash());
        assert_eq!(mk, board.material_key());

        let moves = movegen::generate_legal_moves(&board);
        let mv = moves.iter().copied().find(|m| m.is_capture()).unwrap_or(moves.as_slice()[0]);
        board.make_move(mv);
        let (h2, ph2, mk2) = board.hash_from_scratch();
        assert_eq!(h2, board.hash());
        assert_eq!(ph2, board.pawn_hash());
        assert_eq!(mk2, board.material_key());
    }

    #[test]
    fn en_passant_capture_roundtrips() {
        let mut board = fen::from_fen(
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        )
        .unwrap();
        let moves = movegen::generate_legal_moves(&board);
        let ep_move = moves.iter().copied().find(|m| m.is_en_passant());
        assert!(ep_move.is_some());
        let mv = ep_move.unwrap();
        let snapshot = board.clone();
        board.make_move(mv);
        assert!(!board.pieces_of(Color::Black, Piece::Pawn).contains(Square::new(4, 5)));
        board.unmake_move(mv);
        assert_eq!(board.hash(), snapshot.hash());
    }
}
