//! Per-thread move ordering tables: butterfly history, counter moves and
//! two-ply counter-move history. Each worker owns its own copy, so there is
//! no cross-thread contention on these.

use crate::board::types::{Color, ColorPiece, Move, Square, COLOR_PIECE_LIMIT};

use super::constants::MAX_HISTORY;

/// Key addressing a counter-move-history slice: the piece that just landed
/// on its destination square.
#[derive(Clone, Copy, Debug)]
pub struct CmhKey {
    pub piece: usize,
    pub to: usize,
}

/// The two previous plies' CMH keys, resolved once per node.
pub type CmhContext = [Option<CmhKey>; 2];

pub struct SearchTables {
    /// history[color][from * 64 + to]
    history: Vec<i16>,
    /// counter_moves[from * 64 + to]
    counter_moves: Vec<Move>,
    /// cmh[key.piece][key.to][piece * 64 + to]
    cmh: Vec<i16>,
}

const SQUARES: usize = 64;
const PIECE_TO: usize = COLOR_PIECE_LIMIT * SQUARES;

/// Saturating counter update that decays toward zero as it approaches the
/// bound, so recent results outweigh stale ones.
#[inline]
fn gravity(entry: &mut i16, bonus: i32) {
    let current = i32::from(*entry);
    *entry = (current + bonus - current * bonus.abs() / MAX_HISTORY) as i16;
}

impl SearchTables {
    #[must_use]
    pub fn new() -> Self {
        SearchTables {
            history: vec![0; 2 * SQUARES * SQUARES],
            counter_moves: vec![Move::NONE; SQUARES * SQUARES],
            cmh: vec![0; COLOR_PIECE_LIMIT * SQUARES * PIECE_TO],
        }
    }

    pub fn clear(&mut self) {
        self.history.fill(0);
        self.counter_moves.fill(Move::NONE);
        self.cmh.fill(0);
    }

    #[inline]
    fn history_index(color: Color, mv: Move) -> usize {
        color.index() * SQUARES * SQUARES + mv.from().index() * SQUARES + mv.to().index()
    }

    #[inline]
    fn cmh_index(key: CmhKey, piece: ColorPiece, to: Square) -> usize {
        (key.piece * SQUARES + key.to) * PIECE_TO + piece.index() * SQUARES + to.index()
    }

    #[inline]
    #[must_use]
    pub fn history(&self, color: Color, mv: Move) -> i32 {
        i32::from(self.history[Self::history_index(color, mv)])
    }

    #[inline]
    #[must_use]
    pub fn counter_move(&self, previous: Move) -> Move {
        self.counter_moves[previous.from().index() * SQUARES + previous.to().index()]
    }

    #[inline]
    pub fn set_counter_move(&mut self, previous: Move, counter: Move) {
        self.counter_moves[previous.from().index() * SQUARES + previous.to().index()] = counter;
    }

    /// One CMH entry, or `None` when that ply has no move behind it.
    #[inline]
    #[must_use]
    pub fn cmh_entry(&self, key: Option<CmhKey>, piece: ColorPiece, to: Square) -> Option<i32> {
        key.map(|key| i32::from(self.cmh[Self::cmh_index(key, piece, to)]))
    }

    /// Combined quiet-move score: butterfly history plus both counter-move
    /// history entries.
    #[must_use]
    pub fn history_score(
        &self,
        color: Color,
        cmh: &CmhContext,
        piece: ColorPiece,
        mv: Move,
    ) -> i32 {
        let mut score = self.history(color, mv);
        for key in cmh.iter().flatten() {
            score += i32::from(self.cmh[Self::cmh_index(*key, piece, mv.to())]);
        }
        score
    }

    /// Apply a (possibly negative) bonus to every history table touching
    /// this move.
    pub fn update_history(
        &mut self,
        color: Color,
        cmh: &CmhContext,
        piece: ColorPiece,
        mv: Move,
        bonus: i32,
    ) {
        gravity(&mut self.history[Self::history_index(color, mv)], bonus);
        for key in cmh.iter().flatten() {
            gravity(&mut self.cmh[Self::cmh_index(*key, piece, mv.to())], bonus);
        }
    }
}

impl Default for SearchTables {
    fn default() -> Self {
        SearchTables::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::Piece;

    fn mv(from: usize, to: usize) -> Move {
        Move::new(Square::from_index(from), Square::from_index(to))
    }

    #[test]
    fn test_history_update_and_score() {
        let mut tables = SearchTables::new();
        let m = mv(12, 28);
        assert_eq!(tables.history(Color::White, m), 0);
        tables.update_history(Color::White, &[None, None], ColorPiece::NONE, m, 100);
        assert!(tables.history(Color::White, m) > 0);
        assert_eq!(tables.history(Color::Black, m), 0);
    }

    #[test]
    fn test_history_saturates() {
        let mut tables = SearchTables::new();
        let m = mv(0, 8);
        for _ in 0..1000 {
            tables.update_history(Color::White, &[None, None], ColorPiece::NONE, m, 2000);
        }
        assert!(tables.history(Color::White, m) < MAX_HISTORY);
        for _ in 0..1000 {
            tables.update_history(Color::White, &[None, None], ColorPiece::NONE, m, -2000);
        }
        assert!(tables.history(Color::White, m) > -MAX_HISTORY);
    }

    #[test]
    fn test_counter_moves() {
        let mut tables = SearchTables::new();
        let previous = mv(12, 28);
        let counter = mv(52, 36);
        assert!(tables.counter_move(previous).is_none());
        tables.set_counter_move(previous, counter);
        assert_eq!(tables.counter_move(previous), counter);
    }

    #[test]
    fn test_cmh_entries() {
        let mut tables = SearchTables::new();
        let key = CmhKey { piece: 4, to: 28 };
        let piece = ColorPiece::new(Color::White, Piece::Knight);
        let m = mv(1, 18);
        assert_eq!(tables.cmh_entry(Some(key), piece, m.to()), Some(0));
        assert_eq!(tables.cmh_entry(None, piece, m.to()), None);
        tables.update_history(Color::White, &[Some(key), None], piece, m, 500);
        assert!(tables.cmh_entry(Some(key), piece, m.to()).unwrap() > 0);
    }
}
