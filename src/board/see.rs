//! Static exchange evaluation.

use super::attack_tables::{bishop_attacks, rook_attacks};
use super::eval::{piece_value_mg, Value};
use super::state::Position;
use super::types::{Bitboard, Move, MoveType, Piece};

impl Position {
    /// True iff the capture sequence started by `mv` nets the side to move
    /// at least `threshold` centipawns. Classical swap algorithm: each side
    /// recaptures with its least valuable attacker, x-rays are uncovered by
    /// refreshing the attacker set after every removal, and pinned pieces
    /// may not participate while their pinner is still on the board.
    ///
    /// Castles and promotions are not exchanges; they resolve as a zero
    /// gain against the threshold.
    #[must_use]
    pub fn see_ge(&self, mv: Move, threshold: Value) -> bool {
        if mv.move_type() != MoveType::Normal {
            return 0 >= threshold;
        }
        let from = mv.from();
        let to = mv.to();
        let captured = self.piece_at(to).piece_type();

        let mut swap = captured.map_or(0, piece_value_mg) - threshold;
        if swap < 0 {
            return false;
        }

        let moving = self.piece_at(from);
        debug_assert!(moving.is_some());

        // If they win the moving piece for free and we are still ahead, stop.
        swap = piece_value_mg(moving.piece()) - swap;
        if swap <= 0 {
            return true;
        }

        let mut stm = moving.color();
        let mut occupancy = self.occupied_all() ^ from ^ to;
        let mut attackers = self.attackers_to_all(to, occupancy);
        let mut result = true;

        let bishops_queens = self.pieces_of_type(Piece::Bishop) | self.pieces_of_type(Piece::Queen);
        let rooks_queens = self.pieces_of_type(Piece::Rook) | self.pieces_of_type(Piece::Queen);

        loop {
            stm = stm.other();
            attackers &= occupancy;

            let mut stm_attackers = attackers & self.occupied(stm);
            if stm_attackers.is_empty() {
                break;
            }
            // Pinned pieces cannot legally join while the pinner remains.
            if (self.pinners(stm.other()) & occupancy).is_not_empty() {
                stm_attackers &= !self.blockers_for_king(stm);
                if stm_attackers.is_empty() {
                    break;
                }
            }

            result = !result;

            let mut capture_with = |piece: Piece| -> Option<Bitboard> {
                let bb = stm_attackers & self.pieces(stm, piece);
                if bb.is_empty() {
                    None
                } else {
                    Some(Bitboard::from_square(bb.lsb()))
                }
            };

            if let Some(bb) = capture_with(Piece::Pawn) {
                swap = piece_value_mg(Piece::Pawn) - swap;
                if swap < Value::from(result) {
                    break;
                }
                occupancy ^= bb;
                attackers |= bishop_attacks(to, occupancy) & bishops_queens;
            } else if let Some(bb) = capture_with(Piece::Knight) {
                swap = piece_value_mg(Piece::Knight) - swap;
                if swap < Value::from(result) {
                    break;
                }
                occupancy ^= bb;
            } else if let Some(bb) = capture_with(Piece::Bishop) {
                swap = piece_value_mg(Piece::Bishop) - swap;
                if swap < Value::from(result) {
                    break;
                }
                occupancy ^= bb;
                attackers |= bishop_attacks(to, occupancy) & bishops_queens;
            } else if let Some(bb) = capture_with(Piece::Rook) {
                swap = piece_value_mg(Piece::Rook) - swap;
                if swap < Value::from(result) {
                    break;
                }
                occupancy ^= bb;
                attackers |= rook_attacks(to, occupancy) & rooks_queens;
            } else if let Some(bb) = capture_with(Piece::Queen) {
                swap = piece_value_mg(Piece::Queen) - swap;
                if swap < Value::from(result) {
                    break;
                }
                occupancy ^= bb;
                attackers |= (bishop_attacks(to, occupancy) & bishops_queens)
                    | (rook_attacks(to, occupancy) & rooks_queens);
            } else {
                // King capture: if the opponent still has attackers the king
                // cannot actually take, so the result flips back.
                if (attackers & !self.occupied(stm)).is_not_empty() {
                    result = !result;
                }
                return result;
            }
        }
        result
    }
}
