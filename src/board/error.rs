//! Error types for board construction and move parsing.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation '{notation}'")
            }
        }
    }
}

impl Error for SquareError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    MissingField { field: &'static str },
    InvalidPiece { c: char },
    InvalidRankLength { rank: usize },
    TooManyRanks,
    InvalidSideToMove { token: String },
    InvalidCastling { c: char },
    InvalidEnPassant { token: String },
    InvalidCounter { token: String },
    MissingKing,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::MissingField { field } => write!(f, "missing FEN field: {field}"),
            FenError::InvalidPiece { c } => write!(f, "invalid piece character '{c}'"),
            FenError::InvalidRankLength { rank } => {
                write!(f, "rank {} does not describe 8 files", rank + 1)
            }
            FenError::TooManyRanks => write!(f, "more than 8 ranks in piece placement"),
            FenError::InvalidSideToMove { token } => {
                write!(f, "invalid side to move '{token}'")
            }
            FenError::InvalidCastling { c } => write!(f, "invalid castling character '{c}'"),
            FenError::InvalidEnPassant { token } => {
                write!(f, "invalid en passant square '{token}'")
            }
            FenError::InvalidCounter { token } => write!(f, "invalid move counter '{token}'"),
            FenError::MissingKing => write!(f, "each side must have exactly one king"),
        }
    }
}

impl Error for FenError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    InvalidLength { notation: String },
    InvalidSquare { notation: String },
    InvalidPromotion { notation: String },
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { notation } => {
                write!(f, "move '{notation}' has invalid length")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "move '{notation}' has an invalid square")
            }
            MoveParseError::InvalidPromotion { notation } => {
                write!(f, "move '{notation}' has an invalid promotion piece")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "move '{notation}' is not legal in this position")
            }
        }
    }
}

impl Error for MoveParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanError {
    Malformed { notation: String },
    NoMatch { notation: String },
    Ambiguous { notation: String },
}

impl fmt::Display for SanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanError::Malformed { notation } => write!(f, "malformed SAN '{notation}'"),
            SanError::NoMatch { notation } => {
                write!(f, "no legal move matches SAN '{notation}'")
            }
            SanError::Ambiguous { notation } => {
                write!(f, "SAN '{notation}' matches more than one legal move")
            }
        }
    }
}

impl Error for SanError {}
