//! Zobrist hashing keys.
//!
//! Keys come from a fixed-seed `StdRng` so the same position always hashes
//! to the same value, run to run. The tables are immutable after first use.

use once_cell::sync::Lazy;
use rand::prelude::*;

use super::types::{CastlingRights, Color, Piece, Square};

const ZOBRIST_SEED: u64 = 0x412F_DA8F;

pub(crate) struct ZobristKeys {
    /// piece_keys[color][piece][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    pub black_to_move: u64,
    /// Indexed by `CastlingRights::key_index`
    pub castling: [u64; 4],
    pub en_passant_file: [u64; 8],
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    let mut keys = ZobristKeys {
        pieces: [[[0; 64]; 6]; 2],
        black_to_move: 0,
        castling: [0; 4],
        en_passant_file: [0; 8],
    };
    for color in &mut keys.pieces {
        for piece in color.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }
    }
    keys.black_to_move = rng.gen();
    for key in &mut keys.castling {
        *key = rng.gen();
    }
    for key in &mut keys.en_passant_file {
        *key = rng.gen();
    }
    keys
});

#[inline]
pub(crate) fn piece_key(color: Color, piece: Piece, sq: Square) -> u64 {
    ZOBRIST.pieces[color.index()][piece.index()][sq.index()]
}

#[inline]
pub(crate) fn side_key() -> u64 {
    ZOBRIST.black_to_move
}

#[inline]
pub(crate) fn castle_key(color: Color, kingside: bool) -> u64 {
    ZOBRIST.castling[CastlingRights::key_index(color, kingside)]
}

#[inline]
pub(crate) fn en_passant_key(file: usize) -> u64 {
    ZOBRIST.en_passant_file[file]
}

/// XOR of the keys for every right present in `rights`.
#[inline]
pub(crate) fn castle_rights_key(rights: CastlingRights) -> u64 {
    let mut key = 0;
    for color in [Color::White, Color::Black] {
        for kingside in [true, false] {
            if rights.has(color, kingside) {
                key ^= castle_key(color, kingside);
            }
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_deterministic() {
        let a = piece_key(Color::White, Piece::Pawn, Square::A1);
        let b = piece_key(Color::White, Piece::Pawn, Square::A1);
        assert_eq!(a, b);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_keys_are_distinct() {
        let a = piece_key(Color::White, Piece::Pawn, Square::A1);
        let b = piece_key(Color::Black, Piece::Pawn, Square::A1);
        let c = piece_key(Color::White, Piece::Knight, Square::A1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(side_key(), 0);
    }

    #[test]
    fn test_castle_rights_key_composes() {
        let all = castle_rights_key(CastlingRights::ALL);
        let mut expected = 0;
        for color in [Color::White, Color::Black] {
            for kingside in [true, false] {
                expected ^= castle_key(color, kingside);
            }
        }
        assert_eq!(all, expected);
        assert_eq!(castle_rights_key(CastlingRights::NONE), 0);
    }
}
