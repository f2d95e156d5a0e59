//! Core value types: squares, bitboards, pieces, colors, and moves.

mod bitboard;
mod castling;
mod moves;
mod piece;
mod square;

pub use bitboard::{Bitboard, BitboardIter};
pub use castling::CastlingRights;
pub use moves::{Move, MoveFlag, MoveList, MoveListIntoIter, ScoredMove, ScoredMoveList};
pub use piece::{Color, Piece, PROMOTION_PIECES};
pub use square::{Square, SquareError};
