//! Position state and cached derived data.

use super::attack_tables::{
    bishop_attacks, between, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use super::eval::{piece_value_mg, Value};
use super::types::{Bitboard, CastlingRights, Color, ColorPiece, Piece, Square};
use super::zobrist;

/// Snapshot sufficient to reverse one ply. The hash is reverted by
/// re-applying the same XOR transforms, so it is not stored here.
#[derive(Clone, Debug)]
pub struct UndoInfo {
    pub(crate) en_passant: Option<Square>,
    pub(crate) captured: Option<Piece>,
    pub(crate) halfmove_clock: u32,
    pub(crate) castling: CastlingRights,
    pub(crate) checkers: Bitboard,
    pub(crate) blockers_for_king: [Bitboard; 2],
    pub(crate) pinners: [Bitboard; 2],
    pub(crate) check_squares: [[Bitboard; 6]; 2],
}

impl UndoInfo {
    #[must_use]
    pub const fn new() -> Self {
        UndoInfo {
            en_passant: None,
            captured: None,
            halfmove_clock: 0,
            castling: CastlingRights::NONE,
            checkers: Bitboard::EMPTY,
            blockers_for_king: [Bitboard::EMPTY; 2],
            pinners: [Bitboard::EMPTY; 2],
            check_squares: [[Bitboard::EMPTY; 6]; 2],
        }
    }

    #[must_use]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }
}

impl Default for UndoInfo {
    fn default() -> Self {
        UndoInfo::new()
    }
}

/// The authoritative mutable board state.
///
/// Beyond the piece bitboards the struct carries a derived cache kept up to
/// date incrementally by make/unmake: occupancy, piece-on-square lookup, king
/// squares, current checkers, blockers-for-king with their pinners, per-piece
/// check squares and midgame non-pawn material.
#[derive(Clone, Debug)]
pub struct Position {
    pub(crate) pieces: [[Bitboard; 6]; 2],
    pub(crate) color_occ: [Bitboard; 2],
    pub(crate) all_occ: Bitboard,
    pub(crate) piece_on: [ColorPiece; 64],
    pub(crate) king_sq: [Square; 2],
    pub(crate) checkers: Bitboard,
    /// check_squares[c][p]: squares from which a piece of type p attacks c's king
    pub(crate) check_squares: [[Bitboard; 6]; 2],
    /// blockers_for_king[c]: pieces of either color shielding c's king from a slider
    pub(crate) blockers_for_king: [Bitboard; 2],
    /// pinners[c]: c's sliders pinning an enemy piece to the enemy king
    pub(crate) pinners: [Bitboard; 2],
    pub(crate) non_pawn_material: [Value; 2],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) hash: u64,
}

impl Position {
    /// An empty board; callers place pieces and then `rebuild_cache`.
    #[must_use]
    pub(crate) fn empty() -> Self {
        Position {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            color_occ: [Bitboard::EMPTY; 2],
            all_occ: Bitboard::EMPTY,
            piece_on: [ColorPiece::NONE; 64],
            king_sq: [Square::A1; 2],
            checkers: Bitboard::EMPTY,
            check_squares: [[Bitboard::EMPTY; 6]; 2],
            blockers_for_king: [Bitboard::EMPTY; 2],
            pinners: [Bitboard::EMPTY; 2],
            non_pawn_material: [0; 2],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    #[must_use]
    pub fn pieces(&self, color: Color, piece: Piece) -> Bitboard {
        self.pieces[color.index()][piece.index()]
    }

    #[inline]
    #[must_use]
    pub fn pieces_of_type(&self, piece: Piece) -> Bitboard {
        self.pieces(Color::White, piece) | self.pieces(Color::Black, piece)
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self, color: Color) -> Bitboard {
        self.color_occ[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied_all(&self) -> Bitboard {
        self.all_occ
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> ColorPiece {
        self.piece_on[sq.index()]
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_sq[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of half-moves played since the start of the game.
    #[inline]
    #[must_use]
    pub fn total_half_moves(&self) -> u32 {
        2 * (self.fullmove_number - 1) + u32::from(self.side_to_move == Color::Black)
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.checkers.is_not_empty()
    }

    #[inline]
    #[must_use]
    pub fn blockers_for_king(&self, color: Color) -> Bitboard {
        self.blockers_for_king[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn pinners(&self, color: Color) -> Bitboard {
        self.pinners[color.index()]
    }

    /// Squares from which a `piece` would give check to `color`'s king.
    #[inline]
    #[must_use]
    pub fn check_squares(&self, color: Color, piece: Piece) -> Bitboard {
        self.check_squares[color.index()][piece.index()]
    }

    /// Midgame value of `color`'s knights, bishops, rooks and queens.
    #[inline]
    #[must_use]
    pub fn non_pawn_material(&self, color: Color) -> Value {
        self.non_pawn_material[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn non_pawn_material_total(&self) -> Value {
        self.non_pawn_material[0] + self.non_pawn_material[1]
    }

    /// Type of the piece moved by `mv` (the piece on the from-square).
    #[inline]
    #[must_use]
    pub fn moving_piece(&self, mv: super::types::Move) -> Option<Piece> {
        self.piece_at(mv.from()).piece_type()
    }

    /// True if `mv` captures, including en passant.
    #[inline]
    #[must_use]
    pub fn is_capture(&self, mv: super::types::Move) -> bool {
        self.piece_at(mv.to()).is_some() && !mv.is_castle() || self.is_en_passant(mv)
    }

    /// True if `mv` is an en-passant capture.
    #[inline]
    #[must_use]
    pub fn is_en_passant(&self, mv: super::types::Move) -> bool {
        self.en_passant == Some(mv.to())
            && self.piece_at(mv.from()).piece_type() == Some(Piece::Pawn)
            && !mv.is_promotion()
    }

    // =========================================================================
    // Attack queries
    // =========================================================================

    /// All pieces of `by` attacking `sq` given `occupancy`.
    #[must_use]
    pub fn attackers_to(&self, sq: Square, by: Color, occupancy: Bitboard) -> Bitboard {
        // Squares that pawns attack FROM are the pawn attacks of the other color
        (pawn_attacks(by.other(), sq) & self.pieces(by, Piece::Pawn))
            | (knight_attacks(sq) & self.pieces(by, Piece::Knight))
            | (king_attacks(sq) & self.pieces(by, Piece::King))
            | (bishop_attacks(sq, occupancy)
                & (self.pieces(by, Piece::Bishop) | self.pieces(by, Piece::Queen)))
            | (rook_attacks(sq, occupancy)
                & (self.pieces(by, Piece::Rook) | self.pieces(by, Piece::Queen)))
    }

    /// All pieces of either color attacking `sq` given `occupancy`.
    #[must_use]
    pub fn attackers_to_all(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        self.attackers_to(sq, Color::White, occupancy)
            | self.attackers_to(sq, Color::Black, occupancy)
    }

    /// Blockers between `sliders` and `sq`: for each sniper sharing a line
    /// with `sq`, if exactly one piece of either color sits on the segment,
    /// that piece blocks. Snipers whose blocker belongs to the piece on `sq`
    /// are collected into `pinners`.
    #[must_use]
    pub(crate) fn slider_blockers(
        &self,
        sliders: Bitboard,
        sq: Square,
        pinners: &mut Bitboard,
    ) -> Bitboard {
        let mut blockers = Bitboard::EMPTY;
        *pinners = Bitboard::EMPTY;

        let rooks_queens = self.pieces_of_type(Piece::Rook) | self.pieces_of_type(Piece::Queen);
        let bishops_queens = self.pieces_of_type(Piece::Bishop) | self.pieces_of_type(Piece::Queen);
        let snipers = ((rook_attacks(sq, Bitboard::EMPTY) & rooks_queens)
            | (bishop_attacks(sq, Bitboard::EMPTY) & bishops_queens))
            & sliders;
        let occupancy = self.all_occ ^ snipers;
        let own = self.piece_at(sq).color();

        for sniper in snipers.iter() {
            let segment = between(sniper, sq) & occupancy;
            if segment.is_not_empty() && !segment.more_than_one() {
                blockers |= segment;
                if (segment & self.occupied(own)).is_not_empty() {
                    *pinners |= sniper;
                }
            }
        }
        blockers
    }

    /// Recompute blockers/pinners for both kings and the check-square sets
    /// for `color`'s king.
    pub(crate) fn update_check_info(&mut self, color: Color) {
        let mut white_pinners = Bitboard::EMPTY;
        let mut black_pinners = Bitboard::EMPTY;
        self.blockers_for_king[Color::White.index()] = self.slider_blockers(
            self.occupied(Color::Black),
            self.king_square(Color::White),
            &mut black_pinners,
        );
        self.blockers_for_king[Color::Black.index()] = self.slider_blockers(
            self.occupied(Color::White),
            self.king_square(Color::Black),
            &mut white_pinners,
        );
        self.pinners[Color::White.index()] = white_pinners;
        self.pinners[Color::Black.index()] = black_pinners;

        let king = self.king_square(color);
        let c = color.index();
        // Pawn check squares use the defender-side pawn attacks: those are
        // exactly the squares an attacker-side pawn checks the king from.
        self.check_squares[c][Piece::Pawn.index()] = pawn_attacks(color, king);
        self.check_squares[c][Piece::Knight.index()] = knight_attacks(king);
        self.check_squares[c][Piece::Bishop.index()] = bishop_attacks(king, self.all_occ);
        self.check_squares[c][Piece::Rook.index()] = rook_attacks(king, self.all_occ);
        self.check_squares[c][Piece::Queen.index()] =
            self.check_squares[c][Piece::Bishop.index()] | self.check_squares[c][Piece::Rook.index()];
        self.check_squares[c][Piece::King.index()] = Bitboard::EMPTY;
    }

    // =========================================================================
    // Incremental piece updates (hash and material included)
    // =========================================================================

    #[inline]
    pub(crate) fn add_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] |= bb;
        self.color_occ[color.index()] |= bb;
        self.all_occ |= bb;
        self.piece_on[sq.index()] = ColorPiece::new(color, piece);
        if piece != Piece::Pawn && piece != Piece::King {
            self.non_pawn_material[color.index()] += piece_value_mg(piece);
        }
        self.hash ^= zobrist::piece_key(color, piece, sq);
    }

    #[inline]
    pub(crate) fn remove_piece(&mut self, color: Color, piece: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.pieces[color.index()][piece.index()] ^= bb;
        self.color_occ[color.index()] ^= bb;
        self.all_occ ^= bb;
        self.piece_on[sq.index()] = ColorPiece::NONE;
        if piece != Piece::Pawn && piece != Piece::King {
            self.non_pawn_material[color.index()] -= piece_value_mg(piece);
        }
        self.hash ^= zobrist::piece_key(color, piece, sq);
    }

    #[inline]
    pub(crate) fn move_piece(&mut self, color: Color, piece: Piece, from: Square, to: Square) {
        let mask = Bitboard::from_square(from) | to;
        self.pieces[color.index()][piece.index()] ^= mask;
        self.color_occ[color.index()] ^= mask;
        self.all_occ ^= mask;
        self.piece_on[from.index()] = ColorPiece::NONE;
        self.piece_on[to.index()] = ColorPiece::new(color, piece);
        self.hash ^= zobrist::piece_key(color, piece, from) ^ zobrist::piece_key(color, piece, to);
    }

    // =========================================================================
    // Full cache rebuild (FEN / builder entry point)
    // =========================================================================

    /// Rebuild every derived field from the piece bitboards. Used after
    /// setting up a position from scratch; make/unmake maintains the cache
    /// incrementally from then on.
    pub(crate) fn rebuild_cache(&mut self) {
        self.color_occ = [Bitboard::EMPTY; 2];
        self.piece_on = [ColorPiece::NONE; 64];
        self.non_pawn_material = [0; 2];
        for color in [Color::White, Color::Black] {
            for piece in super::types::ALL_PIECES {
                let bb = self.pieces[color.index()][piece.index()];
                self.color_occ[color.index()] |= bb;
                for sq in bb.iter() {
                    self.piece_on[sq.index()] = ColorPiece::new(color, piece);
                }
                if piece != Piece::Pawn && piece != Piece::King {
                    self.non_pawn_material[color.index()] +=
                        piece_value_mg(piece) * bb.popcount() as Value;
                }
            }
            self.king_sq[color.index()] = self.pieces(color, Piece::King).lsb();
        }
        self.all_occ = self.color_occ[0] | self.color_occ[1];

        self.checkers = self.attackers_to(
            self.king_square(self.side_to_move),
            self.side_to_move.other(),
            self.all_occ,
        );
        self.update_check_info(Color::White);
        self.update_check_info(Color::Black);
        self.hash = self.compute_hash();
    }

    /// Hash recomputed from scratch; make/unmake keeps `self.hash` equal to
    /// this at all times.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for color in [Color::White, Color::Black] {
            for piece in super::types::ALL_PIECES {
                for sq in self.pieces(color, piece).iter() {
                    hash ^= zobrist::piece_key(color, piece, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= zobrist::side_key();
        }
        hash ^= zobrist::castle_rights_key(self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= zobrist::en_passant_key(ep.file());
        }
        hash
    }

    // =========================================================================
    // Draw helpers
    // =========================================================================

    /// Neither side can force mate: bare kings, a lone minor, or only
    /// same-colored bishops.
    #[must_use]
    pub fn is_insufficient_material(&self) -> bool {
        if (self.pieces_of_type(Piece::Pawn)
            | self.pieces_of_type(Piece::Rook)
            | self.pieces_of_type(Piece::Queen))
        .is_not_empty()
        {
            return false;
        }
        let knights = self.pieces_of_type(Piece::Knight);
        let bishops = self.pieces_of_type(Piece::Bishop);
        let minors = knights.popcount() + bishops.popcount();
        if minors <= 1 {
            return true;
        }
        if knights.is_empty() {
            const LIGHT: Bitboard = Bitboard(0x55AA_55AA_55AA_55AA);
            return (bishops & LIGHT).is_empty() || (bishops & !LIGHT).is_empty();
        }
        false
    }

    #[must_use]
    pub fn is_draw_by_fifty(&self) -> bool {
        self.halfmove_clock >= 100
    }
}
