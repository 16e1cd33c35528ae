//! Applying and reverting moves.
//!
//! `make_move` mutates the position in place and fills an `UndoInfo` that
//! `unmake_move` uses to restore it byte for byte, cached state and hash
//! included. The hash is reverted by re-applying the same XOR transforms
//! rather than being stored.

use super::state::{Position, UndoInfo};
use super::types::{Bitboard, Color, Move, Piece, Square};
use super::zobrist;

impl Position {
    /// Drop one castling right, keeping the hash in sync.
    #[inline]
    fn clear_castle_right(&mut self, color: Color, kingside: bool) {
        if self.castling.has(color, kingside) {
            self.castling.clear(color, kingside);
            self.hash ^= zobrist::castle_key(color, kingside);
        }
    }

    /// Drop castling rights implied by a rook leaving (or being captured on)
    /// a back-rank corner square.
    #[inline]
    fn clear_rook_rights(&mut self, color: Color, sq: Square) {
        let back_rank = if color == Color::White { 0 } else { 7 };
        if sq.rank() == back_rank {
            if sq.file() == 0 {
                self.clear_castle_right(color, false);
            } else if sq.file() == 7 {
                self.clear_castle_right(color, true);
            }
        }
    }

    /// Apply `mv`, computing `gives_check` on the fly. Prefer the explicit
    /// variant inside the search, where the flag is already known.
    pub fn make_move_auto(&mut self, mv: Move, undo: &mut UndoInfo) {
        let gives_check = self.gives_check(mv);
        self.make_move(mv, undo, gives_check);
    }

    /// Apply a legal move. `gives_check` must be the result of
    /// `self.gives_check(mv)`; passing it in avoids recomputing what the
    /// search already knows.
    pub fn make_move(&mut self, mv: Move, undo: &mut UndoInfo, gives_check: bool) {
        debug_assert!(mv.is_valid());
        let from = mv.from();
        let to = mv.to();
        let us = self.side_to_move;
        let them = us.other();
        let moving = self.piece_at(from).piece();
        let is_castle = mv.is_castle();
        let is_en_passant = self.is_en_passant(mv);
        let captured = if is_castle {
            None
        } else if is_en_passant {
            Some(Piece::Pawn)
        } else {
            self.piece_at(to).piece_type()
        };

        undo.en_passant = self.en_passant;
        undo.captured = captured;
        undo.halfmove_clock = self.halfmove_clock;
        undo.castling = self.castling;
        undo.checkers = self.checkers;
        undo.blockers_for_king = self.blockers_for_king;
        undo.pinners = self.pinners;
        undo.check_squares = self.check_squares;

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }

        if is_castle {
            self.move_piece(us, Piece::King, from, to);
            self.king_sq[us.index()] = to;
            let rank = to.rank();
            let (rook_from, rook_to) = if to.file() == 6 {
                (Square::new(rank, 7), Square::new(rank, 5))
            } else {
                (Square::new(rank, 0), Square::new(rank, 3))
            };
            self.move_piece(us, Piece::Rook, rook_from, rook_to);
        } else {
            if is_en_passant {
                self.remove_piece(them, Piece::Pawn, to.behind(us));
            } else if let Some(cap) = captured {
                self.remove_piece(them, cap, to);
            }

            if mv.is_promotion() {
                self.remove_piece(us, Piece::Pawn, from);
                self.add_piece(us, mv.promotion(), to);
            } else {
                self.move_piece(us, moving, from, to);
                if moving == Piece::King {
                    self.king_sq[us.index()] = to;
                }
            }

            if moving == Piece::Pawn && from.rank().abs_diff(to.rank()) == 2 {
                let ep = to.behind(us);
                self.en_passant = Some(ep);
                self.hash ^= zobrist::en_passant_key(ep.file());
            }
        }

        if moving == Piece::King {
            self.clear_castle_right(us, true);
            self.clear_castle_right(us, false);
        } else if moving == Piece::Rook {
            self.clear_rook_rights(us, from);
        }
        if captured == Some(Piece::Rook) {
            self.clear_rook_rights(them, to);
        }

        self.checkers = if gives_check {
            self.attackers_to(self.king_square(them), us, self.all_occ)
        } else {
            Bitboard::EMPTY
        };
        self.update_check_info(us);

        if moving == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = them;
        self.hash ^= zobrist::side_key();
    }

    /// Revert the most recent `make_move(mv, ..)`.
    pub fn unmake_move(&mut self, mv: Move, undo: &UndoInfo) {
        self.side_to_move = self.side_to_move.other();
        self.hash ^= zobrist::side_key();
        let us = self.side_to_move;
        let them = us.other();
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        self.hash ^=
            zobrist::castle_rights_key(self.castling) ^ zobrist::castle_rights_key(undo.castling);
        self.castling = undo.castling;

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        if let Some(ep) = undo.en_passant {
            self.en_passant = Some(ep);
            self.hash ^= zobrist::en_passant_key(ep.file());
        }

        let from = mv.from();
        let to = mv.to();
        if mv.is_castle() {
            let rank = to.rank();
            let (rook_from, rook_to) = if to.file() == 6 {
                (Square::new(rank, 7), Square::new(rank, 5))
            } else {
                (Square::new(rank, 0), Square::new(rank, 3))
            };
            self.move_piece(us, Piece::Rook, rook_to, rook_from);
            self.move_piece(us, Piece::King, to, from);
            self.king_sq[us.index()] = from;
        } else {
            if mv.is_promotion() {
                self.remove_piece(us, mv.promotion(), to);
                self.add_piece(us, Piece::Pawn, from);
            } else {
                let piece = self.piece_at(to).piece();
                self.move_piece(us, piece, to, from);
                if piece == Piece::King {
                    self.king_sq[us.index()] = from;
                }
            }
            if let Some(cap) = undo.captured {
                // A pawn arriving on the prior en-passant square captured en passant
                let was_en_passant = cap == Piece::Pawn
                    && undo.en_passant == Some(to)
                    && self.piece_at(from).piece() == Piece::Pawn;
                let cap_sq = if was_en_passant { to.behind(us) } else { to };
                self.add_piece(them, cap, cap_sq);
            }
        }

        self.halfmove_clock = undo.halfmove_clock;
        self.checkers = undo.checkers;
        self.blockers_for_king = undo.blockers_for_king;
        self.pinners = undo.pinners;
        self.check_squares = undo.check_squares;
    }

    /// Pass the turn. Only permitted when not in check.
    pub fn make_null_move(&mut self, undo: &mut UndoInfo) {
        debug_assert!(!self.in_check());
        undo.en_passant = self.en_passant;
        undo.captured = None;
        undo.halfmove_clock = self.halfmove_clock;
        undo.castling = self.castling;
        undo.checkers = self.checkers;
        undo.blockers_for_king = self.blockers_for_king;
        undo.pinners = self.pinners;
        undo.check_squares = self.check_squares;

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.checkers = Bitboard::EMPTY;
        self.update_check_info(self.side_to_move);
        self.halfmove_clock += 1;
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();
        self.hash ^= zobrist::side_key();
    }

    pub fn unmake_null_move(&mut self, undo: &UndoInfo) {
        self.side_to_move = self.side_to_move.other();
        self.hash ^= zobrist::side_key();
        if self.side_to_move == Color::Black {
            self.fullmove_number -= 1;
        }
        if let Some(ep) = undo.en_passant {
            self.en_passant = Some(ep);
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.halfmove_clock = undo.halfmove_clock;
        self.checkers = undo.checkers;
        self.blockers_for_king = undo.blockers_for_king;
        self.pinners = undo.pinners;
        self.check_squares = undo.check_squares;
    }
}
