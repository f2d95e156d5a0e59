//! FEN and EPD parsing/serialization.

use std::fmt::Write as _;

use crate::types::{CastlingRights, Color, Piece, Square};

use super::error::FenError;
use super::state::Board;

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a `Board`.
pub fn from_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::TooFewParts { found: parts.len() });
    }

    let mut board = Board::empty();
    parse_placement(&mut board, parts[0])?;

    board.side_to_move = match parts[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => {
            return Err(FenError::InvalidSideToMove {
                found: other.to_string(),
            })
        }
    };

    board.castling = parse_castling(parts[2])?;

    board.en_passant = match parts[3] {
        "-" => None,
        s => Some(s.parse().map_err(|_| FenError::InvalidEnPassant {
            found: s.to_string(),
        })?),
    };

    board.halfmove_clock = match parts.get(4) {
        Some(s) => s.parse().map_err(|_| FenError::InvalidHalfmoveClock {
            found: s.to_string(),
        })?,
        None => 0,
    };
    board.fullmove_number = match parts.get(5) {
        Some(s) => s.parse().map_err(|_| FenError::InvalidFullmoveNumber {
            found: s.to_string(),
        })?,
        None => 1,
    };

    let (hash, pawn_hash, material_key) = board.hash_from_scratch();
    board.hash = hash;
    board.pawn_hash = pawn_hash;
    board.material_key = material_key;
    board.checkers = board.compute_checkers();
    board.push_history();
    Ok(board)
}

fn parse_placement(board: &mut Board, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidRank { rank: ranks.len() });
    }
    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_from_top;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
                if file > 8 {
                    return Err(FenError::TooManyFiles {
                        rank,
                        files: file,
                    });
                }
                continue;
            }
            if file >= 8 {
                return Err(FenError::TooManyFiles { rank, files: file + 1 });
            }
            let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
            let color = if c.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            board.put_piece(color, piece, Square::new(rank, file));
            file += 1;
        }
    }
    Ok(())
}

fn parse_castling(s: &str) -> Result<CastlingRights, FenError> {
    if s == "-" {
        return Ok(CastlingRights::NONE);
    }
    let mut rights = CastlingRights::NONE;
    for c in s.chars() {
        rights = match c {
            'K' => rights.set_kingside(Color::White, true),
            'Q' => rights.set_queenside(Color::White, true),
            'k' => rights.set_kingside(Color::Black, true),
            'q' => rights.set_queenside(Color::Black, true),
            other => return Err(FenError::InvalidCastling { char: other }),
        };
    }
    Ok(rights)
}

/// Serialize the board back to FEN, round-tripping everything `from_fen`
/// reads (this is exercised directly by the FEN round-trip test below).
#[must_use]
pub fn to_fen(board: &Board) -> String {
    let mut s = String::new();
    for rank_from_top in 0..8 {
        let rank = 7 - rank_from_top;
        let mut empty_run = 0u32;
        for file in 0..8 {
            match board.piece_at(Square::new(rank, file)) {
                Some((color, piece)) => {
                    if empty_run > 0 {
                        write!(s, "{empty_run}").unwrap();
                        empty_run = 0;
                    }
                    s.push(piece.to_fen_char(color));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            write!(s, "{empty_run}").unwrap();
        }
        if rank_from_top != 7 {
            s.push('/');
        }
    }
    s.push(' ');
    s.push(if board.side_to_move() == Color::White { 'w' } else { 'b' });
    s.push(' ');
    write!(s, "{}", board.castling_rights()).unwrap();
    s.push(' ');
    match board.en_passant_square() {
        Some(sq) => write!(s, "{sq}").unwrap(),
        None => s.push('-'),
    }
    write!(s, " {} {}", board.halfmove_clock(), board.fullmove_number()).unwrap();
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_roundtrips() {
        let board = from_fen(STARTPOS_FEN).unwrap();
        assert_eq!(to_fen(&board), STARTPOS_FEN);
    }

    #[test]
    fn kiwipete_roundtrips() {
        let kiwipete = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let board = from_fen(kiwipete).unwrap();
        assert_eq!(to_fen(&board), kiwipete);
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(from_fen("not a fen").is_err());
        assert!(from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
    }
}
