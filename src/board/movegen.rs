//! Pseudo-legal move generation and the legality filter.
//!
//! Generation is split by captures/quiets so the staged move selector can
//! emit tactical moves without paying for quiets. Castles are emitted
//! without attack checks; `is_legal` verifies the king's path.

use super::attack_tables::{
    aligned, between, bishop_attacks, king_attacks, pawn_attacks, piece_attacks, rook_attacks,
};
use super::state::{Position, UndoInfo};
use super::types::{
    Bitboard, Color, Move, MoveList, Piece, Square, PROMOTION_PIECES,
};

/// Which move classes to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenType {
    Captures,
    Quiets,
    All,
}

impl GenType {
    #[inline]
    #[must_use]
    pub const fn captures(self) -> bool {
        matches!(self, GenType::Captures | GenType::All)
    }

    #[inline]
    #[must_use]
    pub const fn quiets(self) -> bool {
        matches!(self, GenType::Quiets | GenType::All)
    }
}

fn generate_pawn_moves(pos: &Position, gen: GenType, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = us.other();
    let pawns = pos.pieces(us, Piece::Pawn);
    let empty = !pos.occupied_all();
    let promo_rank = Bitboard::rank_mask(if us == Color::White { 7 } else { 0 });
    let double_push_rank = Bitboard::rank_mask(if us == Color::White { 2 } else { 5 });

    if gen.quiets() {
        let single = pawns.shift_forward(us) & empty;
        let double = (single & double_push_rank).shift_forward(us) & empty;
        let promotions = single & promo_rank;
        for to in (single & !promo_rank).iter() {
            list.push(Move::new(to.behind(us), to));
        }
        for to in double.iter() {
            list.push(Move::new(to.behind(us).behind(us), to));
        }
        for to in promotions.iter() {
            for promo in PROMOTION_PIECES {
                list.push(Move::new_promotion(to.behind(us), to, promo));
            }
        }
    }

    if gen.captures() {
        let mut targets = pos.occupied(them);
        if let Some(ep) = pos.en_passant() {
            targets |= ep;
        }
        for from in pawns.iter() {
            let attacks = pawn_attacks(us, from) & targets;
            if (Bitboard::from_square(from).shift_forward(us) & promo_rank).is_not_empty() {
                for to in attacks.iter() {
                    for promo in PROMOTION_PIECES {
                        list.push(Move::new_promotion(from, to, promo));
                    }
                }
            } else {
                for to in attacks.iter() {
                    list.push(Move::new(from, to));
                }
            }
        }
    }
}

fn generate_piece_moves(pos: &Position, piece: Piece, gen: GenType, list: &mut MoveList) {
    let us = pos.side_to_move();
    let occupancy = pos.occupied_all();
    let mut targets = Bitboard::EMPTY;
    if gen.captures() {
        targets |= pos.occupied(us.other());
    }
    if gen.quiets() {
        targets |= !occupancy;
    }
    for from in pos.pieces(us, piece).iter() {
        for to in (piece_attacks(piece, from, occupancy) & targets).iter() {
            list.push(Move::new(from, to));
        }
    }
}

fn generate_king_moves(pos: &Position, gen: GenType, list: &mut MoveList) {
    let us = pos.side_to_move();
    let from = pos.king_square(us);
    let mut targets = Bitboard::EMPTY;
    if gen.captures() {
        targets |= pos.occupied(us.other());
    }
    if gen.quiets() {
        targets |= !pos.occupied_all();
    }
    for to in (king_attacks(from) & targets).iter() {
        list.push(Move::new(from, to));
    }

    if gen.quiets() {
        // Castles check only that the squares between king and rook are
        // empty; the legality filter verifies the path is not attacked.
        let rank = if us == Color::White { 0 } else { 7 };
        let occupancy = pos.occupied_all();
        if pos.castling().has(us, true)
            && !occupancy.contains(Square::new(rank, 5))
            && !occupancy.contains(Square::new(rank, 6))
        {
            list.push(Move::new_castle(from, Square::new(rank, 6)));
        }
        if pos.castling().has(us, false)
            && !occupancy.contains(Square::new(rank, 1))
            && !occupancy.contains(Square::new(rank, 2))
            && !occupancy.contains(Square::new(rank, 3))
        {
            list.push(Move::new_castle(from, Square::new(rank, 2)));
        }
    }
}

/// Generate pseudo-legal moves into `list`.
pub fn generate(pos: &Position, gen: GenType, list: &mut MoveList) {
    generate_pawn_moves(pos, gen, list);
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        generate_piece_moves(pos, piece, gen, list);
    }
    generate_king_moves(pos, gen, list);
}

/// Generate fully legal moves into `list`.
pub fn generate_legal(pos: &Position, gen: GenType, list: &mut MoveList) {
    generate(pos, gen, list);
    list.retain(|mv| pos.is_legal(mv));
}

impl Position {
    /// All legal moves in this position.
    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        generate_legal(self, GenType::All, &mut list);
        list
    }

    /// Whether the side to move has any legal move (mate/stalemate test).
    #[must_use]
    pub fn has_legal_moves(&self) -> bool {
        let mut list = MoveList::new();
        generate(self, GenType::All, &mut list);
        list.iter().any(|&mv| self.is_legal(mv))
    }

    /// Verify a pseudo-legal move does not leave our king attacked, and that
    /// castling does not pass through check.
    #[must_use]
    pub fn is_legal(&self, mv: Move) -> bool {
        let us = self.side_to_move;
        let them = us.other();
        let king = self.king_square(us);
        let from = mv.from();
        let to = mv.to();

        if self.is_en_passant(mv) {
            // Remove both pawns, place ours on the target, and look for a
            // slider x-raying our king along the cleared rank or diagonal.
            let captured_sq = to.behind(us);
            let occupancy = (self.occupied_all() ^ from ^ captured_sq) | to;
            let rook_queens = self.pieces(them, Piece::Rook) | self.pieces(them, Piece::Queen);
            let bishop_queens = self.pieces(them, Piece::Bishop) | self.pieces(them, Piece::Queen);
            return (rook_attacks(king, occupancy) & rook_queens).is_empty()
                && (bishop_attacks(king, occupancy) & bishop_queens).is_empty();
        }

        let moving = self.piece_at(from).piece();

        if self.in_check() {
            if mv.is_castle() {
                return false;
            }
            if moving != Piece::King {
                if self.checkers.more_than_one() {
                    return false;
                }
                let checker = self.checkers.lsb();
                if !((between(checker, king) | self.checkers).contains(to)) {
                    return false;
                }
            } else if self
                .attackers_to(to, them, self.occupied_all() ^ from)
                .is_not_empty()
            {
                return false;
            }
        }

        if mv.is_castle() {
            let rank = from.rank();
            let path = if to.file() == 2 { [2, 3] } else { [5, 6] };
            return path.iter().all(|&file| {
                self.attackers_to(Square::new(rank, file), them, self.occupied_all())
                    .is_empty()
            });
        }

        if moving == Piece::King {
            return self
                .attackers_to(to, them, self.occupied_all() ^ from)
                .is_empty();
        }

        !self.blockers_for_king(us).contains(from) || aligned(from, to, king)
    }

    /// Cheap structural validation of an arbitrary 16-bit move (typically a
    /// TT probe result that may come from a colliding entry). True iff the
    /// move could have been produced by the generator in this position.
    #[must_use]
    pub fn is_pseudo_legal(&self, mv: Move) -> bool {
        if !mv.is_valid() {
            return false;
        }
        let us = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        let cp = self.piece_at(from);
        if cp.is_none() || cp.color() != us {
            return false;
        }
        let piece = cp.piece();

        if mv.is_castle() {
            if piece != Piece::King {
                return false;
            }
            let rank = if us == Color::White { 0 } else { 7 };
            if from != Square::new(rank, 4) || to.rank() != rank {
                return false;
            }
            let kingside = match to.file() {
                6 => true,
                2 => false,
                _ => return false,
            };
            if !self.castling().has(us, kingside) {
                return false;
            }
            let empty_files: &[usize] = if kingside { &[5, 6] } else { &[1, 2, 3] };
            return empty_files
                .iter()
                .all(|&file| !self.occupied_all().contains(Square::new(rank, file)));
        }

        if piece == Piece::Pawn {
            let promo_rank = if us == Color::White { 7 } else { 0 };
            if (to.rank() == promo_rank) != mv.is_promotion() {
                return false;
            }
            if pawn_attacks(us, from).contains(to) {
                return self.occupied(us.other()).contains(to) || self.en_passant == Some(to);
            }
            if self.occupied_all().contains(to) {
                return false;
            }
            let start_rank = if us == Color::White { 1 } else { 6 };
            if from.rank() == start_rank && from.ahead(us).ahead(us) == to {
                return !self.occupied_all().contains(from.ahead(us));
            }
            return from.ahead(us) == to;
        }

        if mv.is_promotion() {
            return false;
        }
        if self.occupied(us).contains(to) {
            return false;
        }
        piece_attacks(piece, from, self.occupied_all()).contains(to)
    }

    /// Whether `mv` gives check, computed from the cached check squares plus
    /// simulated occupancy for promotions, en passant and castling.
    #[must_use]
    pub fn gives_check(&self, mv: Move) -> bool {
        debug_assert!(mv.is_valid());
        let us = self.side_to_move;
        let them = us.other();
        let from = mv.from();
        let to = mv.to();
        let moving = self.piece_at(from).piece();
        let enemy_king = self.king_square(them);

        // Direct check
        if self.check_squares(them, moving).contains(to) {
            return true;
        }

        // Discovered check: the mover shields the enemy king and leaves the line
        if self.blockers_for_king(them).contains(from) && !aligned(from, to, enemy_king) {
            return true;
        }

        if mv.is_promotion() {
            let occupancy = self.occupied_all() ^ from;
            return piece_attacks(mv.promotion(), to, occupancy).contains(enemy_king);
        }

        if self.is_en_passant(mv) {
            let captured_sq = to.behind(us);
            let occupancy = (self.occupied_all() ^ from ^ captured_sq) | to;
            let rook_queens = self.pieces(us, Piece::Rook) | self.pieces(us, Piece::Queen);
            let bishop_queens = self.pieces(us, Piece::Bishop) | self.pieces(us, Piece::Queen);
            return (rook_attacks(enemy_king, occupancy) & rook_queens).is_not_empty()
                || (bishop_attacks(enemy_king, occupancy) & bishop_queens).is_not_empty();
        }

        if mv.is_castle() {
            let rank = from.rank();
            let (rook_from, rook_to) = if to.file() == 6 {
                (Square::new(rank, 7), Square::new(rank, 5))
            } else {
                (Square::new(rank, 0), Square::new(rank, 3))
            };
            let occupancy = (self.occupied_all() ^ rook_from ^ from) | to | rook_to;
            return rook_attacks(rook_to, occupancy).contains(enemy_king);
        }

        false
    }
}

impl Position {
    /// Parse a long-algebraic move string against this position, fixing up
    /// the move type (castle / promotion / en passant) and verifying
    /// legality. `e1g1` with the king on e1 becomes a castle.
    pub fn parse_uci_move(&self, s: &str) -> Result<Move, super::error::MoveParseError> {
        let parsed: Move = s.parse()?;
        let legal = self.legal_moves();
        for &mv in legal.iter() {
            if mv.from() == parsed.from()
                && mv.to() == parsed.to()
                && (!mv.is_promotion()
                    || (parsed.is_promotion() && mv.promotion() == parsed.promotion()))
                && (mv.is_promotion() == parsed.is_promotion())
            {
                return Ok(mv);
            }
        }
        Err(super::error::MoveParseError::IllegalMove {
            notation: s.to_string(),
        })
    }
}

/// Count leaf nodes of the legal move tree to `depth`.
#[must_use]
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = pos.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut undo = UndoInfo::new();
    let mut nodes = 0;
    for &mv in moves.iter() {
        pos.make_move_auto(mv, &mut undo);
        nodes += perft(pos, depth - 1);
        pos.unmake_move(mv, &undo);
    }
    nodes
}

/// Perft with per-root-move subtotals, for the `perft` command.
pub fn perft_divide(pos: &mut Position, depth: u32, mut report: impl FnMut(Move, u64)) -> u64 {
    let moves = pos.legal_moves();
    let mut undo = UndoInfo::new();
    let mut total = 0;
    for &mv in moves.iter() {
        pos.make_move_auto(mv, &mut undo);
        let nodes = if depth <= 1 { 1 } else { perft(pos, depth - 1) };
        pos.unmake_move(mv, &undo);
        report(mv, nodes);
        total += nodes;
    }
    total
}
