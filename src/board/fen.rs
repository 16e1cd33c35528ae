//! FEN parsing and formatting.

use std::fmt;

use super::error::FenError;
use super::state::Position;
use super::types::{Color, ColorPiece, Piece, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// The standard starting position.
    #[must_use]
    pub fn startpos() -> Self {
        Position::from_fen(START_FEN).expect("start FEN is valid")
    }

    /// Parse a standard 6-field FEN. The clock fields are optional and
    /// default to `0 1`.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField {
            field: "piece placement",
        })?;
        let side = fields.next().ok_or(FenError::MissingField {
            field: "side to move",
        })?;
        let castling = fields.next().unwrap_or("-");
        let en_passant = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut pos = Position::empty();

        let mut rank = 7usize;
        let mut file = 0usize;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(FenError::InvalidRankLength { rank });
                    }
                    if rank == 0 {
                        return Err(FenError::TooManyRanks);
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => {
                    file += c as usize - '0' as usize;
                    if file > 8 {
                        return Err(FenError::InvalidRankLength { rank });
                    }
                }
                _ => {
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { c })?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::InvalidRankLength { rank });
                    }
                    let sq = Square::new(rank, file);
                    pos.pieces[color.index()][piece.index()] |= sq;
                    file += 1;
                }
            }
        }
        if rank != 0 || file != 8 {
            return Err(FenError::InvalidRankLength { rank });
        }

        if pos.pieces(Color::White, Piece::King).popcount() != 1
            || pos.pieces(Color::Black, Piece::King).popcount() != 1
        {
            return Err(FenError::MissingKing);
        }

        pos.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            _ => {
                return Err(FenError::InvalidSideToMove {
                    token: side.to_string(),
                })
            }
        };

        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => pos.castling.set(Color::White, true),
                    'Q' => pos.castling.set(Color::White, false),
                    'k' => pos.castling.set(Color::Black, true),
                    'q' => pos.castling.set(Color::Black, false),
                    _ => return Err(FenError::InvalidCastling { c }),
                }
            }
        }

        if en_passant != "-" {
            let sq: Square = en_passant.parse().map_err(|_| FenError::InvalidEnPassant {
                token: en_passant.to_string(),
            })?;
            pos.en_passant = Some(sq);
        }

        pos.halfmove_clock = halfmove.parse().map_err(|_| FenError::InvalidCounter {
            token: halfmove.to_string(),
        })?;
        pos.fullmove_number = fullmove.parse().map_err(|_| FenError::InvalidCounter {
            token: fullmove.to_string(),
        })?;
        if pos.fullmove_number == 0 {
            pos.fullmove_number = 1;
        }

        pos.rebuild_cache();
        Ok(pos)
    }

    /// Standard 6-field FEN for this position. The en-passant square is
    /// emitted whenever a double push just occurred, whether or not an
    /// enemy pawn can actually capture.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let cp = self.piece_at(Square::new(rank, file));
                if cp.is_none() {
                    empty += 1;
                } else {
                    if empty > 0 {
                        fen.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    fen.push(piece_char(cp));
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move() == Color::White {
            'w'
        } else {
            'b'
        });
        fen.push(' ');
        fen.push_str(&self.castling().to_string());
        fen.push(' ');
        match self.en_passant() {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(
            " {} {}",
            self.halfmove_clock(),
            self.fullmove_number()
        ));
        fen
    }
}

fn piece_char(cp: ColorPiece) -> char {
    let c = cp.piece().to_char();
    if cp.color() == Color::White {
        c
    } else {
        c.to_ascii_lowercase()
    }
}

impl fmt::Display for Position {
    /// ASCII board with FEN and hash, as printed by the `d` command.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            writeln!(f, "   +---+---+---+---+---+---+---+---+")?;
            write!(f, " {} |", rank + 1)?;
            for file in 0..8 {
                let cp = self.piece_at(Square::new(rank, file));
                let c = if cp.is_none() { ' ' } else { piece_char(cp) };
                write!(f, " {c} |")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   +---+---+---+---+---+---+---+---+")?;
        writeln!(f, "     a   b   c   d   e   f   g   h")?;
        writeln!(f)?;
        writeln!(f, "Fen: {}", self.to_fen())?;
        write!(f, "Key: {:016X}", self.hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos() {
        let pos = Position::startpos();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.occupied_all().popcount(), 32);
        assert_eq!(pos.king_square(Color::White), Square::E1);
        assert_eq!(pos.king_square(Color::Black), Square::E8);
        assert!(!pos.in_check());
    }

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
        ];
        for fen in fens {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_fen_hash_consistency() {
        let pos =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(pos.hash(), pos.compute_hash());
    }

    #[test]
    fn test_fen_errors() {
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
        assert!(Position::from_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq zz 0 1").is_err());
    }

    #[test]
    fn test_different_positions_different_hashes() {
        let a = Position::startpos();
        let b = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_ne!(a.hash(), b.hash());
    }
}
