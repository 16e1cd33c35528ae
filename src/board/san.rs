//! Standard algebraic notation.

use super::error::SanError;
use super::state::{Position, UndoInfo};
use super::types::{Move, Piece, Square};

impl Position {
    /// Format a legal move in SAN with minimal disambiguation: file first,
    /// then rank, then both.
    #[must_use]
    pub fn to_san(&self, mv: Move) -> String {
        if mv.is_castle() {
            let base = if mv.to().file() == 6 { "O-O" } else { "O-O-O" };
            return format!("{}{}", base, self.san_suffix(mv));
        }

        let piece = self.piece_at(mv.from()).piece();
        let is_capture = self.is_capture(mv);
        let mut san = String::new();

        if piece == Piece::Pawn {
            if is_capture {
                san.push((b'a' + mv.from().file() as u8) as char);
            }
        } else {
            san.push(piece.to_char());
            san.push_str(&self.san_disambiguation(mv, piece));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&mv.to().to_string());
        if mv.is_promotion() {
            san.push('=');
            san.push(mv.promotion().to_char());
        }
        san.push_str(&self.san_suffix(mv));
        san
    }

    /// The squares other pieces of the same type could reach `mv.to()` from,
    /// rendered as the minimal disambiguator.
    fn san_disambiguation(&self, mv: Move, piece: Piece) -> String {
        let mut rivals: Vec<Square> = Vec::new();
        for &other in self.legal_moves().iter() {
            if other.to() == mv.to()
                && other.from() != mv.from()
                && !other.is_castle()
                && self.piece_at(other.from()).piece_type() == Some(piece)
            {
                rivals.push(other.from());
            }
        }
        if rivals.is_empty() {
            return String::new();
        }
        let same_file = rivals.iter().any(|sq| sq.file() == mv.from().file());
        let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from().rank());
        if !same_file {
            ((b'a' + mv.from().file() as u8) as char).to_string()
        } else if !same_rank {
            ((b'1' + mv.from().rank() as u8) as char).to_string()
        } else {
            mv.from().to_string()
        }
    }

    fn san_suffix(&self, mv: Move) -> &'static str {
        if !self.gives_check(mv) {
            return "";
        }
        let mut probe = self.clone();
        let mut undo = UndoInfo::new();
        probe.make_move(mv, &mut undo, true);
        if probe.has_legal_moves() {
            "+"
        } else {
            "#"
        }
    }

    /// Parse SAN against this position. Accepts `+`/`#` suffixes and both
    /// `O-O` and `0-0` castling forms.
    pub fn parse_san(&self, san: &str) -> Result<Move, SanError> {
        let body = san.trim_end_matches(['+', '#']);
        if body.is_empty() {
            return Err(SanError::Malformed {
                notation: san.to_string(),
            });
        }

        let legal = self.legal_moves();

        if body == "O-O" || body == "0-0" {
            return legal
                .iter()
                .copied()
                .find(|mv| mv.is_castle() && mv.to().file() == 6)
                .ok_or(SanError::NoMatch {
                    notation: san.to_string(),
                });
        }
        if body == "O-O-O" || body == "0-0-0" {
            return legal
                .iter()
                .copied()
                .find(|mv| mv.is_castle() && mv.to().file() == 2)
                .ok_or(SanError::NoMatch {
                    notation: san.to_string(),
                });
        }

        let mut chars: Vec<char> = body.chars().collect();

        let promotion = if chars.len() >= 2 && chars[chars.len() - 2] == '=' {
            let p = Piece::from_char(chars[chars.len() - 1]).ok_or(SanError::Malformed {
                notation: san.to_string(),
            })?;
            chars.truncate(chars.len() - 2);
            Some(p)
        } else {
            None
        };

        if chars.len() < 2 {
            return Err(SanError::Malformed {
                notation: san.to_string(),
            });
        }
        let to: Square = chars[chars.len() - 2..]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| SanError::Malformed {
                notation: san.to_string(),
            })?;
        chars.truncate(chars.len() - 2);

        let piece = match chars.first() {
            Some(&c) if c.is_ascii_uppercase() => {
                let p = Piece::from_char(c).ok_or(SanError::Malformed {
                    notation: san.to_string(),
                })?;
                chars.remove(0);
                p
            }
            _ => Piece::Pawn,
        };

        let mut from_file: Option<usize> = None;
        let mut from_rank: Option<usize> = None;
        for c in chars {
            match c {
                'a'..='h' => from_file = Some(c as usize - 'a' as usize),
                '1'..='8' => from_rank = Some(c as usize - '1' as usize),
                'x' => {}
                _ => {
                    return Err(SanError::Malformed {
                        notation: san.to_string(),
                    })
                }
            }
        }

        let mut matched: Option<Move> = None;
        for &mv in legal.iter() {
            if mv.is_castle()
                || mv.to() != to
                || self.piece_at(mv.from()).piece_type() != Some(piece)
            {
                continue;
            }
            if let Some(file) = from_file {
                if mv.from().file() != file {
                    continue;
                }
            }
            if let Some(rank) = from_rank {
                if mv.from().rank() != rank {
                    continue;
                }
            }
            match promotion {
                Some(p) => {
                    if !mv.is_promotion() || mv.promotion() != p {
                        continue;
                    }
                }
                None => {
                    if mv.is_promotion() {
                        continue;
                    }
                }
            }
            if matched.is_some() {
                return Err(SanError::Ambiguous {
                    notation: san.to_string(),
                });
            }
            matched = Some(mv);
        }
        matched.ok_or(SanError::NoMatch {
            notation: san.to_string(),
        })
    }
}
