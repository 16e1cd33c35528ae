//! Color and piece types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Side to move / piece ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for table lookups (White = 0, Black = 1)
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The opposing color
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: usize) -> Self {
        if idx == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Forward direction sign for this color (+1 for White, -1 for Black)
    #[inline]
    #[must_use]
    pub const fn forward_sign(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

/// Piece type without color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// All piece types, in generation order.
pub const ALL_PIECES: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

/// Promotion targets in the order they are generated (queen first).
pub const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Knight, Piece::Rook, Piece::Bishop];

impl Piece {
    /// Index for table lookups (Pawn = 0 .. King = 5)
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    #[must_use]
    pub const fn from_index(idx: usize) -> Self {
        match idx {
            0 => Piece::Pawn,
            1 => Piece::Knight,
            2 => Piece::Bishop,
            3 => Piece::Rook,
            4 => Piece::Queen,
            _ => Piece::King,
        }
    }

    /// Piece letter as used in FEN (uppercase)
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            Piece::Pawn => 'P',
            Piece::Knight => 'N',
            Piece::Bishop => 'B',
            Piece::Rook => 'R',
            Piece::Queen => 'Q',
            Piece::King => 'K',
        }
    }

    /// Parse a FEN piece letter (either case)
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'P' | 'p' => Some(Piece::Pawn),
            'N' | 'n' => Some(Piece::Knight),
            'B' | 'b' => Some(Piece::Bishop),
            'R' | 'r' => Some(Piece::Rook),
            'Q' | 'q' => Some(Piece::Queen),
            'K' | 'k' => Some(Piece::King),
            _ => None,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A colored piece packed into 4 bits: `((type + 1) << 1) | color`.
///
/// The zero value means "no piece", which makes a `[ColorPiece; 64]` board
/// lookup cheap to clear and lets the packed value index continuation-history
/// tables directly (values range 0..14, tables are sized [16]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorPiece(u8);

/// Number of distinct `ColorPiece` index values (for table sizing).
pub const COLOR_PIECE_LIMIT: usize = 16;

impl ColorPiece {
    pub const NONE: ColorPiece = ColorPiece(0);

    #[inline]
    #[must_use]
    pub const fn new(color: Color, piece: Piece) -> Self {
        ColorPiece((((piece as u8) + 1) << 1) | (color as u8))
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// Piece type; must not be called on `NONE`.
    #[inline]
    #[must_use]
    pub const fn piece(self) -> Piece {
        debug_assert!(self.0 != 0);
        Piece::from_index(((self.0 >> 1) - 1) as usize)
    }

    #[inline]
    #[must_use]
    pub const fn color(self) -> Color {
        Color::from_index((self.0 & 1) as usize)
    }

    /// Packed index in 0..16 for continuation-history tables
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Piece type, or `None` for an empty square.
    #[inline]
    #[must_use]
    pub const fn piece_type(self) -> Option<Piece> {
        if self.is_none() {
            None
        } else {
            Some(self.piece())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_other() {
        assert_eq!(Color::White.other(), Color::Black);
        assert_eq!(Color::Black.other(), Color::White);
    }

    #[test]
    fn test_piece_index_round_trip() {
        for idx in 0..6 {
            assert_eq!(Piece::from_index(idx).index(), idx);
        }
    }

    #[test]
    fn test_piece_char_round_trip() {
        for piece in ALL_PIECES {
            assert_eq!(Piece::from_char(piece.to_char()), Some(piece));
        }
        assert_eq!(Piece::from_char('x'), None);
    }

    #[test]
    fn test_color_piece_packing() {
        for color in [Color::White, Color::Black] {
            for piece in ALL_PIECES {
                let cp = ColorPiece::new(color, piece);
                assert!(cp.is_some());
                assert_eq!(cp.piece(), piece);
                assert_eq!(cp.color(), color);
                assert!(cp.index() < COLOR_PIECE_LIMIT);
            }
        }
        assert!(ColorPiece::NONE.is_none());
        assert_eq!(ColorPiece::NONE.piece_type(), None);
    }
}
