//! Board representation and rules: bitboards, attack tables, Zobrist
//! hashing, make/unmake, move generation, SEE, evaluation and notation.

pub mod attack_tables;
mod error;
pub mod eval;
mod fen;
mod make_unmake;
mod movegen;
mod san;
mod see;
mod state;
pub mod types;
mod zobrist;

#[cfg(test)]
mod tests;

pub use error::{FenError, MoveParseError, SanError, SquareError};
pub use fen::START_FEN;
pub use movegen::{generate, generate_legal, perft, perft_divide, GenType};
pub use state::{Position, UndoInfo};
pub use types::{
    Bitboard, CastlingRights, Color, ColorPiece, Move, MoveList, MoveType, Piece, Square,
};
