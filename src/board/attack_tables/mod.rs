//! Precomputed attack tables.
//!
//! Leapers (knight, king, pawn) are simple per-square lookups. Sliders use
//! magic bitboards: `index = ((occupancy & mask) * magic) >> (64 - bits)`
//! into a flat per-square table holding the attacks for every blocker
//! subset. Line, between and ray tables back the pin/check logic.

mod magics;

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Direction, Piece, Square, ALL_DIRECTIONS};
use magics::{BISHOP_INDEX_BITS, BISHOP_MAGICS, ROOK_INDEX_BITS, ROOK_MAGICS};

const ROOK_TABLE_SIZE: usize = 102_400;
const BISHOP_TABLE_SIZE: usize = 5_248;

struct AttackTables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    rays: [[Bitboard; 64]; 8],
    lines: Vec<Bitboard>,
    between: Vec<Bitboard>,
    rook_masks: [Bitboard; 64],
    bishop_masks: [Bitboard; 64],
    rook_offsets: [usize; 64],
    bishop_offsets: [usize; 64],
    rook_table: Vec<Bitboard>,
    bishop_table: Vec<Bitboard>,
}

static TABLES: Lazy<AttackTables> = Lazy::new(AttackTables::build);

const ROOK_DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DELTAS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn square_at(rank: i32, file: i32) -> Option<Square> {
    if (0..8).contains(&rank) && (0..8).contains(&file) {
        Some(Square::new(rank as usize, file as usize))
    } else {
        None
    }
}

/// Walk rays from `sq` in each delta direction, stopping at (and including)
/// the first blocker.
fn slider_attacks_slow(sq: Square, occupancy: Bitboard, deltas: &[(i32, i32)]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let mut rank = sq.rank() as i32 + dr;
        let mut file = sq.file() as i32 + df;
        while let Some(target) = square_at(rank, file) {
            attacks |= target;
            if occupancy.contains(target) {
                break;
            }
            rank += dr;
            file += df;
        }
    }
    attacks
}

/// Relevant occupancy mask: the rays excluding the final edge square in each
/// direction, since a blocker on the edge cannot shorten the attack.
fn relevant_mask(sq: Square, deltas: &[(i32, i32)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(dr, df) in deltas {
        let mut rank = sq.rank() as i32 + dr;
        let mut file = sq.file() as i32 + df;
        while let Some(target) = square_at(rank, file) {
            if square_at(rank + dr, file + df).is_none() {
                break;
            }
            mask |= target;
            rank += dr;
            file += df;
        }
    }
    mask
}

impl AttackTables {
    fn build() -> Self {
        let mut tables = AttackTables {
            knight: [Bitboard::EMPTY; 64],
            king: [Bitboard::EMPTY; 64],
            pawn: [[Bitboard::EMPTY; 64]; 2],
            rays: [[Bitboard::EMPTY; 64]; 8],
            lines: vec![Bitboard::EMPTY; 64 * 64],
            between: vec![Bitboard::EMPTY; 64 * 64],
            rook_masks: [Bitboard::EMPTY; 64],
            bishop_masks: [Bitboard::EMPTY; 64],
            rook_offsets: [0; 64],
            bishop_offsets: [0; 64],
            rook_table: vec![Bitboard::EMPTY; ROOK_TABLE_SIZE],
            bishop_table: vec![Bitboard::EMPTY; BISHOP_TABLE_SIZE],
        };
        tables.init_leapers();
        tables.init_rays_and_lines();
        tables.init_magic_tables();
        tables
    }

    fn init_leapers(&mut self) {
        const KNIGHT_DELTAS: [(i32, i32); 8] = [
            (2, 1),
            (1, 2),
            (-1, 2),
            (-2, 1),
            (-2, -1),
            (-1, -2),
            (1, -2),
            (2, -1),
        ];
        const KING_DELTAS: [(i32, i32); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            let rank = sq.rank() as i32;
            let file = sq.file() as i32;
            for (dr, df) in KNIGHT_DELTAS {
                if let Some(target) = square_at(rank + dr, file + df) {
                    self.knight[idx] |= target;
                }
            }
            for (dr, df) in KING_DELTAS {
                if let Some(target) = square_at(rank + dr, file + df) {
                    self.king[idx] |= target;
                }
            }
            let bb = Bitboard::from_square(sq);
            self.pawn[Color::White.index()][idx] = bb.pawn_attacks(Color::White);
            self.pawn[Color::Black.index()][idx] = bb.pawn_attacks(Color::Black);
        }
    }

    fn init_rays_and_lines(&mut self) {
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            for dir in ALL_DIRECTIONS {
                let (dr, df) = dir.deltas();
                let mut rank = sq.rank() as i32 + dr;
                let mut file = sq.file() as i32 + df;
                let mut ray = Bitboard::EMPTY;
                while let Some(target) = square_at(rank, file) {
                    ray |= target;
                    rank += dr;
                    file += df;
                }
                self.rays[dir.index()][idx] = ray;
            }
        }

        for a in 0..64 {
            for dir in ALL_DIRECTIONS {
                let forward = self.rays[dir.index()][a];
                for b in forward.iter() {
                    let opposite = match dir {
                        Direction::North => Direction::South,
                        Direction::South => Direction::North,
                        Direction::East => Direction::West,
                        Direction::West => Direction::East,
                        Direction::NorthEast => Direction::SouthWest,
                        Direction::NorthWest => Direction::SouthEast,
                        Direction::SouthEast => Direction::NorthWest,
                        Direction::SouthWest => Direction::NorthEast,
                    };
                    let line = forward
                        | self.rays[opposite.index()][a]
                        | Bitboard::from_square(Square::from_index(a));
                    self.lines[a * 64 + b.index()] = line;
                    let between = self.rays[dir.index()][a]
                        & self.rays[opposite.index()][b.index()];
                    self.between[a * 64 + b.index()] = between;
                }
            }
        }
    }

    fn init_magic_tables(&mut self) {
        let mut rook_offset = 0;
        let mut bishop_offset = 0;
        for idx in 0..64 {
            let sq = Square::from_index(idx);

            let rook_mask = relevant_mask(sq, &ROOK_DELTAS);
            debug_assert_eq!(rook_mask.popcount(), ROOK_INDEX_BITS[idx]);
            self.rook_masks[idx] = rook_mask;
            self.rook_offsets[idx] = rook_offset;
            let mut subset = Bitboard::EMPTY;
            loop {
                let table_idx = (subset.0.wrapping_mul(ROOK_MAGICS[idx])
                    >> (64 - ROOK_INDEX_BITS[idx])) as usize;
                self.rook_table[rook_offset + table_idx] =
                    slider_attacks_slow(sq, subset, &ROOK_DELTAS);
                subset = Bitboard(subset.0.wrapping_sub(rook_mask.0) & rook_mask.0);
                if subset.is_empty() {
                    break;
                }
            }
            rook_offset += 1 << ROOK_INDEX_BITS[idx];

            let bishop_mask = relevant_mask(sq, &BISHOP_DELTAS);
            debug_assert_eq!(bishop_mask.popcount(), BISHOP_INDEX_BITS[idx]);
            self.bishop_masks[idx] = bishop_mask;
            self.bishop_offsets[idx] = bishop_offset;
            let mut subset = Bitboard::EMPTY;
            loop {
                let table_idx = (subset.0.wrapping_mul(BISHOP_MAGICS[idx])
                    >> (64 - BISHOP_INDEX_BITS[idx])) as usize;
                self.bishop_table[bishop_offset + table_idx] =
                    slider_attacks_slow(sq, subset, &BISHOP_DELTAS);
                subset = Bitboard(subset.0.wrapping_sub(bishop_mask.0) & bishop_mask.0);
                if subset.is_empty() {
                    break;
                }
            }
            bishop_offset += 1 << BISHOP_INDEX_BITS[idx];
        }
        debug_assert_eq!(rook_offset, ROOK_TABLE_SIZE);
        debug_assert_eq!(bishop_offset, BISHOP_TABLE_SIZE);
    }
}

/// Force table construction; called once at startup so the first search does
/// not pay the initialization cost.
pub fn init() {
    Lazy::force(&TABLES);
}

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    TABLES.knight[sq.index()]
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq.index()]
}

/// Squares a pawn of `color` on `sq` attacks.
#[inline]
#[must_use]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.pawn[color.index()][sq.index()]
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let idx = sq.index();
    let t = &*TABLES;
    let masked = occupancy.0 & t.rook_masks[idx].0;
    let table_idx = (masked.wrapping_mul(ROOK_MAGICS[idx]) >> (64 - ROOK_INDEX_BITS[idx])) as usize;
    t.rook_table[t.rook_offsets[idx] + table_idx]
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    let idx = sq.index();
    let t = &*TABLES;
    let masked = occupancy.0 & t.bishop_masks[idx].0;
    let table_idx =
        (masked.wrapping_mul(BISHOP_MAGICS[idx]) >> (64 - BISHOP_INDEX_BITS[idx])) as usize;
    t.bishop_table[t.bishop_offsets[idx] + table_idx]
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupancy: Bitboard) -> Bitboard {
    rook_attacks(sq, occupancy) | bishop_attacks(sq, occupancy)
}

/// Attack set for any non-pawn piece.
#[inline]
#[must_use]
pub fn piece_attacks(piece: Piece, sq: Square, occupancy: Bitboard) -> Bitboard {
    match piece {
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occupancy),
        Piece::Rook => rook_attacks(sq, occupancy),
        Piece::Queen => queen_attacks(sq, occupancy),
        Piece::King => king_attacks(sq),
        Piece::Pawn => {
            debug_assert!(false, "pawn attacks need a color");
            Bitboard::EMPTY
        }
    }
}

/// The ray from `sq` in `dir` to the board edge, excluding `sq`.
#[inline]
#[must_use]
pub fn ray(dir: Direction, sq: Square) -> Bitboard {
    TABLES.rays[dir.index()][sq.index()]
}

/// The full rank/file/diagonal through both squares, or empty if they are
/// not collinear.
#[inline]
#[must_use]
pub fn line_through(a: Square, b: Square) -> Bitboard {
    TABLES.lines[a.index() * 64 + b.index()]
}

/// Squares strictly between two collinear squares, or empty otherwise.
#[inline]
#[must_use]
pub fn between(a: Square, b: Square) -> Bitboard {
    TABLES.between[a.index() * 64 + b.index()]
}

/// True iff `c` lies on the line through `a` and `b`.
#[inline]
#[must_use]
pub fn aligned(a: Square, b: Square, c: Square) -> bool {
    line_through(a, b).contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rook_attacks_empty_board() {
        let e4 = Square::new(3, 4);
        let attacks = rook_attacks(e4, Bitboard::EMPTY);
        let expected = (Bitboard::rank_mask(3) | Bitboard::file_mask(4)) ^ e4;
        assert_eq!(attacks, expected);
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        let e4 = Square::new(3, 4);
        let e6 = Square::new(5, 4);
        let c4 = Square::new(3, 2);
        let occ = Bitboard::from_square(e6) | c4;
        let attacks = rook_attacks(e4, occ);
        assert!(attacks.contains(e6));
        assert!(!attacks.contains(Square::new(6, 4)));
        assert!(attacks.contains(c4));
        assert!(!attacks.contains(Square::new(3, 1)));
    }

    #[test]
    fn test_bishop_attacks_with_blockers() {
        let e4 = Square::new(3, 4);
        let g6 = Square::new(5, 6);
        let attacks = bishop_attacks(e4, Bitboard::from_square(g6));
        assert!(attacks.contains(g6));
        assert!(!attacks.contains(Square::new(6, 7)));
        assert!(attacks.contains(Square::new(0, 1)));
        assert!(attacks.contains(Square::new(7, 0)));
    }

    #[test]
    fn test_magic_matches_slow_path() {
        let occs = [
            Bitboard::EMPTY,
            Bitboard(0xFF00_FF00_FF00_FF00),
            Bitboard(0x00FF_00FF_00FF_00FF),
            Bitboard(0x1234_5678_9abc_def0),
        ];
        for idx in 0..64 {
            let sq = Square::from_index(idx);
            for occ in occs {
                assert_eq!(
                    rook_attacks(sq, occ),
                    slider_attacks_slow(sq, occ, &ROOK_DELTAS)
                );
                assert_eq!(
                    bishop_attacks(sq, occ),
                    slider_attacks_slow(sq, occ, &BISHOP_DELTAS)
                );
            }
        }
    }

    #[test]
    fn test_knight_attacks() {
        assert_eq!(knight_attacks(Square::A1).popcount(), 2);
        assert_eq!(knight_attacks(Square::new(3, 4)).popcount(), 8);
    }

    #[test]
    fn test_pawn_attacks() {
        let e4 = Square::new(3, 4);
        assert_eq!(
            pawn_attacks(Color::White, e4),
            Bitboard::from_square(Square::new(4, 3)) | Square::new(4, 5)
        );
        assert_eq!(pawn_attacks(Color::Black, Square::new(3, 0)).popcount(), 1);
    }

    #[test]
    fn test_between_and_lines() {
        let a1 = Square::A1;
        let h8 = Square::H8;
        assert_eq!(between(a1, h8).popcount(), 6);
        assert!(aligned(a1, h8, Square::new(3, 3)));
        assert!(!aligned(a1, h8, Square::new(3, 4)));
        assert_eq!(between(a1, Square::new(0, 2)).popcount(), 1);
        assert!(between(a1, Square::new(1, 2)).is_empty());
        assert!(line_through(a1, Square::new(1, 2)).is_empty());
    }

    #[test]
    fn test_rays() {
        let ray_n = ray(Direction::North, Square::A1);
        assert_eq!(ray_n, Bitboard::FILE_A ^ Square::A1);
        assert!(ray(Direction::South, Square::A1).is_empty());
    }
}
