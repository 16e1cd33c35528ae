//! Classical tapered evaluation.
//!
//! Every term produces separate midgame and endgame values per side; the
//! final score interpolates on remaining material and is scaled toward zero
//! as the fifty-move counter grows, to prefer lines that make progress.

mod constants;

pub use constants::*;

use once_cell::sync::Lazy;

use super::attack_tables::{
    bishop_attacks, king_attacks, knight_attacks, line_through, piece_attacks, rook_attacks,
};
use super::state::Position;
use super::types::{Bitboard, Color, Piece, Square};

struct PawnMasks {
    passed: [[Bitboard; 64]; 2],
    supported: [[Bitboard; 64]; 2],
    outpost_zone: [Bitboard; 2],
}

static PAWN_MASKS: Lazy<PawnMasks> = Lazy::new(|| {
    let mut masks = PawnMasks {
        passed: [[Bitboard::EMPTY; 64]; 2],
        supported: [[Bitboard::EMPTY; 64]; 2],
        outpost_zone: [Bitboard::EMPTY; 2],
    };
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        for color in [Color::White, Color::Black] {
            let mut front = Bitboard::from_square(sq).shift_forward(color);
            for _ in 0..6 {
                front |= front.shift_forward(color);
            }
            masks.passed[color.index()][idx] = front
                | front.shift(super::types::Direction::East)
                | front.shift(super::types::Direction::West);
            let bb = Bitboard::from_square(sq);
            masks.supported[color.index()][idx] = bb.shift(super::types::Direction::East)
                | bb.shift(super::types::Direction::West)
                | bb.shift_backward(color).shift(super::types::Direction::East)
                | bb.shift_backward(color).shift(super::types::Direction::West);
        }
    }
    let files = !(Bitboard::FILE_A | Bitboard::FILE_H);
    masks.outpost_zone[Color::White.index()] =
        (Bitboard::rank_mask(3) | Bitboard::rank_mask(4) | Bitboard::rank_mask(5)) & files;
    masks.outpost_zone[Color::Black.index()] =
        (Bitboard::rank_mask(2) | Bitboard::rank_mask(3) | Bitboard::rank_mask(4)) & files;
    masks
});

#[inline]
fn is_passed_pawn(color: Color, sq: Square, enemy_pawns: Bitboard) -> bool {
    (PAWN_MASKS.passed[color.index()][sq.index()] & enemy_pawns).is_empty()
}

#[inline]
fn is_supported_pawn(color: Color, sq: Square, own_pawns: Bitboard) -> bool {
    (PAWN_MASKS.supported[color.index()][sq.index()] & own_pawns).is_not_empty()
}

/// Piece-square value; tables are written from White's view with rank 8
/// first, so White indexes mirrored and Black directly.
#[inline]
fn psq_value(color: Color, piece: Piece, sq: Square, stage: usize) -> Value {
    let idx = match color {
        Color::White => sq.index() ^ 56,
        Color::Black => sq.index(),
    };
    match piece {
        Piece::Pawn => PAWN_TABLE[idx],
        Piece::Knight => KNIGHT_TABLE[idx],
        Piece::Bishop => BISHOP_TABLE[idx],
        Piece::Rook => ROOK_TABLE[idx],
        Piece::Queen => QUEEN_TABLE[idx],
        Piece::King => {
            if stage == MIDGAME {
                KING_TABLE_MG[idx]
            } else {
                KING_TABLE_EG[idx]
            }
        }
    }
}

/// Per-color, per-stage term breakdown, kept for the `eval` command.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluationResult {
    pub material: [[Value; 2]; 2],
    pub pawns: [[Value; 2]; 2],
    pub knights: [[Value; 2]; 2],
    pub bishops: [[Value; 2]; 2],
    pub rooks: [[Value; 2]; 2],
    pub queens: [[Value; 2]; 2],
    pub king_safety: [[Value; 2]; 2],
    pub space: [[Value; 2]; 2],
    pub initiative: Value,
    pub stage: i32,
}

impl EvaluationResult {
    #[must_use]
    pub fn total(&self, color: Color, stage: usize) -> Value {
        let c = color.index();
        self.material[c][stage]
            + self.pawns[c][stage]
            + self.knights[c][stage]
            + self.bishops[c][stage]
            + self.rooks[c][stage]
            + self.queens[c][stage]
            + self.king_safety[c][stage]
            + self.space[c][stage]
    }

    fn stage_total(&self, stage: usize) -> Value {
        self.total(Color::White, stage) - self.total(Color::Black, stage)
    }

    /// Tapered score from `side_to_move`'s perspective, including the
    /// initiative adjustment and tempo bonus.
    #[must_use]
    pub fn result(&self, side_to_move: Color) -> Value {
        let mg = self.stage_total(MIDGAME);
        let mut eg = self.stage_total(ENDGAME);
        // Initiative pushes the endgame score away from zero for the side
        // that is ahead, never flipping its sign.
        let adjustment = self.initiative.max(-eg.abs());
        if eg > 0 {
            eg += adjustment;
        } else if eg < 0 {
            eg -= adjustment;
        }
        let stage = self.stage.clamp(0, GAME_STAGE_MAX);
        let tapered = (mg * (GAME_STAGE_MAX - stage) + eg * stage) / GAME_STAGE_MAX;
        (if side_to_move == Color::White {
            tapered
        } else {
            -tapered
        }) + TEMPO
    }
}

struct EvalData {
    king_zone: [Bitboard; 2],
    attacker_count: [i32; 2],
    attack_units: [i32; 2],
    /// attacked_by[c][p], plus aggregate sets alongside
    attacked_by: [[Bitboard; 6]; 2],
    attacked_all: [Bitboard; 2],
    attacked_twice: [Bitboard; 2],
    /// Checking squares actually reachable by c's pieces
    check_threats: [Bitboard; 2],
    mobility_area: [Bitboard; 2],
}

fn king_attack_zone(pos: &Position, color: Color) -> Bitboard {
    let king = pos.king_square(color);
    let file = king.file().clamp(1, 6);
    let rank = king.rank().clamp(1, 6);
    king_attacks(Square::new(rank, file)) | king
}

impl EvalData {
    fn new(pos: &Position) -> Self {
        let mut data = EvalData {
            king_zone: [Bitboard::EMPTY; 2],
            attacker_count: [0; 2],
            attack_units: [0; 2],
            attacked_by: [[Bitboard::EMPTY; 6]; 2],
            attacked_all: [Bitboard::EMPTY; 2],
            attacked_twice: [Bitboard::EMPTY; 2],
            check_threats: [Bitboard::EMPTY; 2],
            mobility_area: [Bitboard::EMPTY; 2],
        };
        for color in [Color::White, Color::Black] {
            let c = color.index();
            data.king_zone[c] = king_attack_zone(pos, color);
            data.attacked_by[c][Piece::King.index()] = king_attacks(pos.king_square(color));
            data.attacked_by[c][Piece::Pawn.index()] =
                pos.pieces(color, Piece::Pawn).pawn_attacks(color);
            data.attacked_twice[c] =
                data.attacked_by[c][Piece::King.index()] & data.attacked_by[c][Piece::Pawn.index()];
            data.attacked_all[c] =
                data.attacked_by[c][Piece::King.index()] | data.attacked_by[c][Piece::Pawn.index()];
        }
        for color in [Color::White, Color::Black] {
            let c = color.index();
            data.mobility_area[c] = !(pos.pieces(color, Piece::Pawn)
                | data.attacked_by[color.other().index()][Piece::Pawn.index()]
                | Bitboard::from_square(pos.king_square(color)));
        }
        data
    }
}

fn evaluate_material(pos: &Position, result: &mut EvaluationResult, color: Color) {
    let c = color.index();
    let pawn_count = pos.pieces(color, Piece::Pawn).popcount() as Value;
    result.material[c][MIDGAME] = pos.non_pawn_material(color) + pawn_count * PAWN_VALUE_MG;
    result.material[c][ENDGAME] = pos.non_pawn_material(color) + pawn_count * PAWN_VALUE_EG;
}

fn evaluate_pawns(
    pos: &Position,
    result: &mut EvaluationResult,
    data: &EvalData,
    color: Color,
) {
    let c = color.index();
    let them = color.other();
    let mut mg = 0;
    let mut eg = 0;

    let pawns = pos.pieces(color, Piece::Pawn);
    let enemy_pawns = pos.pieces(them, Piece::Pawn);

    for sq in pawns.iter() {
        mg += psq_value(color, Piece::Pawn, sq, MIDGAME);
        eg += psq_value(color, Piece::Pawn, sq, ENDGAME);

        if is_passed_pawn(color, sq, enemy_pawns) {
            let rank = sq.relative_rank(color);
            mg += PASSED_PAWN_WEIGHTS[rank][MIDGAME];
            eg += PASSED_PAWN_WEIGHTS[rank][ENDGAME];
            if is_supported_pawn(color, sq, pawns) {
                mg += SUPPORTED_PASSED_PAWN[MIDGAME];
                eg += SUPPORTED_PASSED_PAWN[ENDGAME];
            }
        }
    }

    // Threats from pawns standing on (or pushing to) squares we control and
    // the enemy does not.
    let safe_area = data.attacked_all[c] & !data.attacked_all[them.index()];
    let non_pawn_enemies = pos.occupied(them) & !enemy_pawns;

    let safe_pawn_attacks = (pawns & safe_area).pawn_attacks(color);
    let threatened = (non_pawn_enemies & safe_pawn_attacks).popcount() as Value;
    mg += threatened * THREAT_BY_SAFE_PAWN[MIDGAME];
    eg += threatened * THREAT_BY_SAFE_PAWN[ENDGAME];

    let pushed_safe_attacks =
        (pawns.shift_forward(color) & !pos.occupied_all() & safe_area).pawn_attacks(color);
    let threatened_by_push = (non_pawn_enemies & pushed_safe_attacks).popcount() as Value;
    mg += threatened_by_push * THREAT_BY_PAWN_PUSH[MIDGAME];
    eg += threatened_by_push * THREAT_BY_PAWN_PUSH[ENDGAME];

    for file in 0..8 {
        if (Bitboard::file_mask(file) & pawns).more_than_one() {
            mg -= DOUBLED_PAWN_PENALTY[MIDGAME];
            eg -= DOUBLED_PAWN_PENALTY[ENDGAME];
        }
    }

    result.pawns[c][MIDGAME] = mg;
    result.pawns[c][ENDGAME] = eg;
}

fn mobility_bonus(piece: Piece, reachable: usize, stage: usize) -> Value {
    match piece {
        Piece::Knight => KNIGHT_MOBILITY[reachable.min(8)][stage],
        Piece::Bishop => BISHOP_MOBILITY[reachable.min(13)][stage],
        Piece::Rook => ROOK_MOBILITY[reachable.min(14)][stage],
        Piece::Queen => QUEEN_MOBILITY[reachable.min(27)][stage],
        _ => 0,
    }
}

fn threat_bonus(attacker: Piece, victim: Piece, stage: usize) -> Value {
    let v = victim.index().min(4);
    if attacker == Piece::Rook {
        THREAT_BY_ROOK[v][stage]
    } else {
        THREAT_BY_MINOR[v][stage]
    }
}

#[allow(clippy::too_many_lines)]
fn evaluate_pieces(
    pos: &Position,
    result: &mut EvaluationResult,
    data: &mut EvalData,
    color: Color,
    piece: Piece,
) {
    let c = color.index();
    let them = color.other();
    let t = them.index();
    let mut mg = 0;
    let mut eg = 0;

    // Outpost candidates: squares our pawns defend in the enemy half that no
    // enemy pawn on an adjacent file can ever contest.
    let outposts = if piece == Piece::Knight || piece == Piece::Bishop {
        let enemy_pawns = pos.pieces(them, Piece::Pawn);
        let mut candidates = data.attacked_by[c][Piece::Pawn.index()]
            & PAWN_MASKS.outpost_zone[c];
        for sq in candidates {
            let contesters = PAWN_MASKS.passed[c][sq.index()]
                & !Bitboard::file_mask(sq.file())
                & enemy_pawns;
            if contesters.is_not_empty() {
                candidates &= !Bitboard::from_square(sq);
            }
        }
        candidates
    } else {
        Bitboard::EMPTY
    };

    let pieces = pos.pieces(color, piece);

    if piece == Piece::Bishop && pieces.more_than_one() {
        mg += BISHOP_PAIR_BONUS[MIDGAME];
        eg += BISHOP_PAIR_BONUS[ENDGAME];
    }

    let enemy_king = pos.king_square(them);
    let check_squares = match piece {
        Piece::Knight => knight_attacks(enemy_king),
        Piece::Bishop => bishop_attacks(enemy_king, pos.occupied_all()),
        Piece::Rook => rook_attacks(enemy_king, pos.occupied_all()),
        Piece::Queen => {
            bishop_attacks(enemy_king, pos.occupied_all())
                | rook_attacks(enemy_king, pos.occupied_all())
        }
        _ => Bitboard::EMPTY,
    };

    for sq in pieces.iter() {
        result.stage -= GAME_STAGE_WEIGHTS[piece.index()];
        mg += psq_value(color, piece, sq, MIDGAME);
        eg += psq_value(color, piece, sq, ENDGAME);

        let mut attacks = piece_attacks(piece, sq, pos.occupied_all());
        // A pinned piece only attacks along the pin line
        if pos.blockers_for_king(color).contains(sq) {
            attacks &= line_through(pos.king_square(color), sq);
        }

        data.attacked_twice[c] |= data.attacked_all[c] & attacks;
        data.attacked_by[c][piece.index()] |= attacks;
        data.attacked_all[c] |= attacks;

        let mobility = attacks & data.mobility_area[c];
        let reachable = mobility.popcount() as usize;
        mg += mobility_bonus(piece, reachable, MIDGAME);
        eg += mobility_bonus(piece, reachable, ENDGAME);

        if piece != Piece::Queen {
            let victims = mobility & pos.occupied(them) & !Bitboard::from_square(enemy_king);
            for victim_sq in victims.iter() {
                let victim = pos.piece_at(victim_sq).piece();
                mg += threat_bonus(piece, victim, MIDGAME);
                eg += threat_bonus(piece, victim, ENDGAME);
            }
        }

        if piece == Piece::Knight || piece == Piece::Bishop {
            let minor_idx = usize::from(piece == Piece::Bishop);
            if outposts.contains(sq) {
                mg += OUTPOST_BONUS[minor_idx];
                eg += OUTPOST_BONUS[minor_idx];
            } else if (outposts & attacks).is_not_empty() {
                mg += OUTPOST_BONUS[minor_idx] / 2;
                eg += OUTPOST_BONUS[minor_idx] / 2;
            }

            if sq.relative_rank(color) < 4
                && (pos.pieces(color, Piece::Pawn).shift_backward(color)).contains(sq)
            {
                mg += MINOR_BEHIND_PAWN_BONUS;
            }

            if piece == Piece::Bishop
                && (bishop_attacks(sq, pos.pieces_of_type(Piece::Pawn)) & Bitboard::CENTER)
                    .more_than_one()
            {
                mg += BISHOP_TARGETING_CENTER_BONUS;
            }
        }

        if piece == Piece::Rook {
            let on_file = Bitboard::file_mask(sq.file()) & pos.pieces_of_type(Piece::Pawn);
            let pawn_count = on_file.popcount();
            if pawn_count < 2 {
                let kind = usize::from(pawn_count != 0);
                mg += ROOK_ON_OPEN_FILE_BONUS[kind][MIDGAME];
                eg += ROOK_ON_OPEN_FILE_BONUS[kind][ENDGAME];
            }
        }

        if piece == Piece::Queen {
            let mut pinners = Bitboard::EMPTY;
            let xrayers = pos.pieces(them, Piece::Rook) | pos.pieces(them, Piece::Bishop);
            if pos.slider_blockers(xrayers, sq, &mut pinners).is_not_empty() {
                mg += QUEEN_XRAYED[MIDGAME];
                eg += QUEEN_XRAYED[ENDGAME];
            }
        }

        let king_attacks = attacks & (data.king_zone[t] | check_squares);
        if king_attacks.is_not_empty() {
            data.attacker_count[c] += 1;
            let zone_hits = (attacks & data.king_zone[t]).popcount() as i32;
            data.attack_units[c] += zone_hits * ATTACK_WEIGHTS[piece.index()];

            let checking = attacks & check_squares;
            data.check_threats[c] |= checking;
            data.attack_units[c] += checking.popcount() as i32 * CHECK_THREAT_WEIGHT;
        }
    }

    let slot = match piece {
        Piece::Knight => &mut result.knights,
        Piece::Bishop => &mut result.bishops,
        Piece::Rook => &mut result.rooks,
        _ => &mut result.queens,
    };
    slot[c][MIDGAME] = mg;
    slot[c][ENDGAME] = eg;
}

fn evaluate_king_safety(
    pos: &Position,
    result: &mut EvaluationResult,
    data: &mut EvalData,
    color: Color,
) {
    let c = color.index();
    let them = color.other();
    let t = them.index();
    let mut mg = 0;
    let mut eg = 0;

    let king = pos.king_square(color);

    // Checks the defender cannot answer: target square not defended, or only
    // defended by king/queen while the attacker doubles up on it.
    let mut safe_checks = data.check_threats[t] & !pos.occupied(them);
    safe_checks &= !data.attacked_all[c]
        | (data.attacked_twice[t]
            & !data.attacked_twice[c]
            & (data.attacked_by[c][Piece::King.index()]
                | data.attacked_by[c][Piece::Queen.index()]));
    if safe_checks.is_not_empty() {
        data.attacker_count[t] += 1;
        data.attack_units[t] += safe_checks.popcount() as i32 * SAFE_CHECK_WEIGHT;
    }

    let attackers = (data.attacker_count[t] as usize).min(MAX_ATTACKER_COUNT - 1);
    let scaled_units =
        (data.attack_units[t].max(0) * ATTACKER_COUNT_SCALING[attackers] / 100) as usize;
    let mut danger = KING_SAFETY_TABLE[scaled_units.min(KING_SAFETY_TABLE.len() - 1)];
    if pos.pieces(them, Piece::Queen).is_empty() {
        danger = (danger - 100).max(0);
    }
    mg -= danger;
    eg -= danger / 8;

    // Shield and storm on the three files around the king
    let pawn_mask = Bitboard::in_front_or_equal(color, king.rank());
    let center_file = king.file().clamp(1, 6);
    for file in center_file - 1..=center_file + 1 {
        let edge_dist = file.min(7 - file);
        let file_bb = Bitboard::file_mask(file);

        let own = pos.pieces(color, Piece::Pawn) & file_bb & pawn_mask;
        if own.is_not_empty() {
            let shield_pawn = own.frontmost(color);
            mg += KING_SHIELD_STRENGTH[edge_dist][shield_pawn.relative_rank(color)];
        } else {
            mg += KING_SHIELD_STRENGTH[edge_dist][0];
        }

        let enemy = pos.pieces(them, Piece::Pawn) & file_bb & pawn_mask;
        for storm_sq in enemy.iter() {
            let rank = storm_sq.relative_rank(color);
            let blocked = storm_sq.relative_rank(them) < 7
                && pos
                    .pieces(color, Piece::Pawn)
                    .contains(storm_sq.ahead(them));
            if blocked {
                mg += BLOCKED_STORM_STRENGTH[rank];
            } else {
                mg += PAWN_STORM_STRENGTH[edge_dist][rank];
            }
        }
    }

    mg += psq_value(color, Piece::King, king, MIDGAME);
    eg += psq_value(color, Piece::King, king, ENDGAME);

    result.king_safety[c][MIDGAME] = mg;
    result.king_safety[c][ENDGAME] = eg;
}

fn evaluate_space(pos: &Position, result: &mut EvaluationResult, data: &EvalData, color: Color) {
    let c = color.index();
    let them = color.other();
    let mut mg = 0;

    if pos.non_pawn_material_total() > SPACE_MATERIAL_THRESHOLD {
        let ranks = match color {
            Color::White => Bitboard::rank_mask(1) | Bitboard::rank_mask(2) | Bitboard::rank_mask(3),
            Color::Black => Bitboard::rank_mask(6) | Bitboard::rank_mask(5) | Bitboard::rank_mask(4),
        };
        let space_mask = Bitboard::CENTER_FILES & ranks;
        let safe = space_mask
            & !pos.pieces(color, Piece::Pawn)
            & !data.attacked_by[them.index()][Piece::Pawn.index()];
        let mut behind = pos.pieces(color, Piece::Pawn);
        behind |= behind.shift_backward(color);
        behind |= behind.shift_backward(color);
        behind |= behind.shift_backward(color);

        let count = safe.popcount() as i32
            + (behind & safe & !data.attacked_all[them.index()]).popcount() as i32;
        let weight = pos.occupied(color).popcount() as i32;
        mg = space_value(weight, count);
    }

    result.space[c][MIDGAME] = mg;
    result.space[c][ENDGAME] = 0;
}

/// Full term-by-term evaluation, used by `evaluate` and the `eval` command.
#[must_use]
pub fn evaluate_detailed(pos: &Position) -> EvaluationResult {
    let mut result = EvaluationResult {
        stage: GAME_STAGE_MAX,
        ..EvaluationResult::default()
    };
    let mut data = EvalData::new(pos);

    for color in [Color::White, Color::Black] {
        evaluate_material(pos, &mut result, color);
    }
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for color in [Color::White, Color::Black] {
            evaluate_pieces(pos, &mut result, &mut data, color, piece);
        }
    }
    for color in [Color::White, Color::Black] {
        evaluate_pawns(pos, &mut result, &data, color);
    }
    for color in [Color::White, Color::Black] {
        evaluate_king_safety(pos, &mut result, &mut data, color);
    }
    for color in [Color::White, Color::Black] {
        evaluate_space(pos, &mut result, &data, color);
    }

    let all_pawns = pos.pieces_of_type(Piece::Pawn);
    let both_wings = (all_pawns & Bitboard::QUEENSIDE).is_not_empty()
        && (all_pawns & Bitboard::KINGSIDE).is_not_empty();
    let bare_material = (pos.occupied_all() & !all_pawns).popcount() == 2;
    result.initiative = INITIATIVE_BONUSES[0] * all_pawns.popcount() as Value
        + INITIATIVE_BONUSES[1] * Value::from(both_wings)
        - INITIATIVE_BONUSES[2] * Value::from(bare_material)
        - INITIATIVE_BONUSES[3];

    result
}

/// Static evaluation in centipawns from the side to move's perspective.
#[must_use]
pub fn evaluate(pos: &Position) -> Value {
    let eval = evaluate_detailed(pos).result(pos.side_to_move());
    eval * (100 - pos.halfmove_clock().min(100) as Value) / 100
}

/// The `eval` command's breakdown table.
#[must_use]
pub fn format_evaluation(pos: &Position) -> String {
    let result = evaluate_detailed(pos);

    fn row(name: &str, term: &[[Value; 2]; 2]) -> String {
        format!(
            "{name:>15} | {:>6} {:>6} | {:>6} {:>6} | {:>6} {:>6}\n",
            term[0][MIDGAME],
            term[0][ENDGAME],
            term[1][MIDGAME],
            term[1][ENDGAME],
            term[0][MIDGAME] - term[1][MIDGAME],
            term[0][ENDGAME] - term[1][ENDGAME],
        )
    }

    let mut out = String::new();
    out.push_str("           Term |     White     |     Black     |     Total     \n");
    out.push_str("                |   MG     EG   |   MG     EG   |   MG     EG   \n");
    out.push_str(" ---------------+---------------+---------------+---------------\n");
    out.push_str(&row("Material", &result.material));
    out.push_str(&row("Pawns", &result.pawns));
    out.push_str(&row("Knights", &result.knights));
    out.push_str(&row("Bishops", &result.bishops));
    out.push_str(&row("Rooks", &result.rooks));
    out.push_str(&row("Queens", &result.queens));
    out.push_str(&row("King Safety", &result.king_safety));
    out.push_str(&row("Space", &result.space));
    out.push_str(" ---------------+---------------+---------------+---------------\n");
    let totals = [
        [
            result.total(Color::White, MIDGAME),
            result.total(Color::White, ENDGAME),
        ],
        [
            result.total(Color::Black, MIDGAME),
            result.total(Color::Black, ENDGAME),
        ],
    ];
    out.push_str(&row("Total", &totals));
    out.push('\n');
    out.push_str(&format!(
        "Game stage: {} / {}\n",
        result.stage.clamp(0, GAME_STAGE_MAX),
        GAME_STAGE_MAX
    ));
    out.push_str(&format!(
        "Total evaluation: {} (white side)",
        result.result(Color::White)
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_is_balanced() {
        let pos = Position::startpos();
        let result = evaluate_detailed(&pos);
        assert_eq!(result.stage_total(MIDGAME), 0);
        assert_eq!(result.stage_total(ENDGAME), 0);
        // Only the tempo bonus separates the sides
        assert_eq!(evaluate(&pos), TEMPO);
    }

    #[test]
    fn test_eval_is_symmetric() {
        // Mirrored position must give the same score to the mover
        let white_up =
            Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let black_up =
            Position::from_fen("4k3/4p3/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white_up), evaluate(&black_up));
    }

    #[test]
    fn test_material_advantage_shows() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(evaluate(&pos) > 0);
        let flipped = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 1").unwrap();
        assert!(evaluate(&flipped) < 0);
    }

    #[test]
    fn test_fifty_move_scaling() {
        let fresh = Position::from_fen("4k3/8/8/8/8/8/3QK3/8 w - - 0 1").unwrap();
        let stale = Position::from_fen("4k3/8/8/8/8/8/3QK3/8 w - - 90 60").unwrap();
        assert!(evaluate(&fresh) > evaluate(&stale));
        assert!(evaluate(&stale) > 0);
    }

    #[test]
    fn test_passed_pawn_bonus() {
        let passed = Position::from_fen("4k3/8/8/3P4/8/8/8/4K3 w - - 0 1").unwrap();
        let blocked = Position::from_fen("4k3/3p4/8/3P4/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(evaluate(&passed) > evaluate(&blocked) + 100);
    }

    #[test]
    fn test_stage_counts_down_with_material() {
        let full = evaluate_detailed(&Position::startpos());
        assert_eq!(full.stage, 0);
        let bare = evaluate_detailed(
            &Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap(),
        );
        assert_eq!(bare.stage, GAME_STAGE_MAX);
    }
}
