//! Position representation: bitboard board state, make/unmake, legal move
//! generation, FEN parsing, and static exchange evaluation.

mod error;
mod fen;
mod make_unmake;
mod movegen;
mod see;
mod state;

pub use error::{FenError, MoveParseError};
pub use fen::{from_fen, to_fen, STARTPOS_FEN};
pub use movegen::{
    generate_legal_captures, generate_legal_moves, generate_pseudo_moves, is_checkmate,
    is_stalemate, perft,
};
pub use see::{see, see_ge};
pub use state::{Board, Status};

use crate::types::{Move, Square};

impl Board {
    /// Parse a long-algebraic move string (`e2e4`, `e7e8q`) against this
    /// position's legal moves.
    pub fn parse_move(&self, notation: &str) -> Result<Move, MoveParseError> {
        if notation.len() < 4 || notation.len() > 5 {
            return Err(MoveParseError::InvalidLength {
                len: notation.len(),
            });
        }
        let from: Square = notation[0..2]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            })?;
        let to: Square = notation[2..4]
            .parse()
            .map_err(|_| MoveParseError::InvalidSquare {
                notation: notation.to_string(),
            })?;
        let promo = if notation.len() == 5 {
            let c = notation.as_bytes()[4] as char;
            Some(
                crate::types::Piece::from_char(c)
                    .ok_or(MoveParseError::InvalidPromotion { char: c })?,
            )
        } else {
            None
        };

        generate_legal_moves(self)
            .iter()
            .copied()
            .find(|mv| {
                mv.from() == from
                    && mv.to() == to
                    && mv.promotion_piece() == promo
            })
            .ok_or_else(|| MoveParseError::IllegalMove {
                notation: notation.to_string(),
            })
    }
}
