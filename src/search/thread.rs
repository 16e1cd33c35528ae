//! Worker state and the alpha-beta search itself.
//!
//! Workers search independently (Lazy SMP), coordinating only through the
//! shared transposition table and the stop flag. The search stack is an
//! owned array of frames indexed by ply with a fixed offset, so `ply - 2`
//! lookups stay in bounds without pointer arithmetic.

use std::sync::atomic::Ordering;

use rand::Rng;

use crate::board::eval::{
    evaluate, is_mate_score, mate_in, mated_in, piece_value_eg, Value, PAWN_VALUE_EG,
    PAWN_VALUE_MG, VALUE_DRAW, VALUE_MATE, VALUE_NONE,
};
use crate::board::types::{ColorPiece, Move, MoveType};
use crate::board::{Position, UndoInfo};
use crate::tt::{value_from_tt, value_to_tt, Bound};

use super::constants::*;
use super::selector::MoveSelector;
use super::tables::{CmhContext, CmhKey, SearchTables};
use super::{RootMove, ScoreBound, Search, SearchInfo};

/// Extra candidate lines considered when playing below full strength.
#[must_use]
pub(super) fn skill_multipv(skill_level: i32) -> usize {
    if skill_level >= 20 {
        1
    } else {
        4
    }
}

#[derive(Clone)]
pub(super) struct StackFrame {
    pub killers: [Move; 2],
    pub current_move: Move,
    /// The piece `current_move` landed on its destination (continuation
    /// history key); replaces the per-frame position clone of the pointer
    /// based layout.
    pub moved_piece: ColorPiece,
    pub static_eval: Value,
    pub move_count: i32,
    pub skip_move: Move,
    pub pv: Vec<Move>,
}

impl StackFrame {
    fn new() -> Self {
        StackFrame {
            killers: [Move::NONE; 2],
            current_move: Move::NONE,
            moved_piece: ColorPiece::NONE,
            static_eval: VALUE_NONE,
            move_count: 0,
            skip_move: Move::NONE,
            pv: Vec::new(),
        }
    }
}

pub(super) struct Worker {
    pub id: usize,
    pub position: Position,
    pub root_moves: Vec<RootMove>,
    pub stack: Vec<StackFrame>,
    /// Game history hashes followed by one slot per search ply.
    pub hashes: Vec<u64>,
    pub hist_base: usize,
    pub tables: SearchTables,
    pub nodes: u64,
    pub flushed_nodes: u64,
    pub depth: i32,
    pub sel_depth: usize,
    pub pv_index: usize,
    pub best_move_changes: f64,
}

impl Search {
    pub(super) fn make_worker(
        &self,
        id: usize,
        pos: &Position,
        root_moves: Vec<RootMove>,
    ) -> Worker {
        let mut hashes = self.position_history().to_vec();
        let hist_base = hashes.len();
        hashes.resize(hist_base + MAX_PLY + 2, 0);
        Worker {
            id,
            position: pos.clone(),
            root_moves,
            stack: vec![StackFrame::new(); MAX_PLY + STACK_OFFSET + 4],
            hashes,
            hist_base,
            tables: SearchTables::new(),
            nodes: 0,
            flushed_nodes: 0,
            // Helpers start at staggered depths to diversify the trees
            depth: 1 + (id % 2) as i32,
            sel_depth: 0,
            pv_index: 0,
            best_move_changes: 0.0,
        }
    }

    fn position_history(&self) -> &[u64] {
        &self.position_history
    }

    #[inline]
    fn is_stopped(&self) -> bool {
        self.stop_flag().load(Ordering::Relaxed)
    }

    #[inline]
    fn stop_flag(&self) -> &std::sync::atomic::AtomicBool {
        &self.stop
    }

    /// Periodic limit check; a tripped limit raises the shared stop flag.
    fn check_stop(&self, w: &mut Worker) -> bool {
        if self.is_stopped() {
            return true;
        }
        if w.nodes % 2048 == 0 && w.nodes > 0 {
            self.flush_nodes(w);
            if !self.limits.infinite {
                if self.time.is_search_complete() {
                    self.stop.store(true, Ordering::SeqCst);
                    return true;
                }
                if let Some(limit) = self.limits.nodes {
                    if w.nodes >= limit {
                        self.stop.store(true, Ordering::SeqCst);
                        return true;
                    }
                }
            }
        }
        false
    }

    fn flush_nodes(&self, w: &mut Worker) {
        let delta = w.nodes - w.flushed_nodes;
        if delta > 0 {
            self.shared_nodes
                .fetch_add(delta, Ordering::Relaxed);
            w.flushed_nodes = w.nodes;
        }
    }

    /// One prior occurrence of the current position within the fifty-move
    /// window counts as a draw inside the tree.
    fn is_repetition(&self, w: &Worker, ply: usize) -> bool {
        let idx = w.hist_base + ply;
        let hash = w.position.hash();
        let mut back = 2;
        while back <= w.position.halfmove_clock() as usize && back <= idx {
            if w.hashes[idx - back] == hash {
                return true;
            }
            back += 2;
        }
        false
    }

    fn cmh_context(w: &Worker, ss: usize, ply: usize) -> CmhContext {
        let mut ctx: CmhContext = [None, None];
        for (i, slot) in ctx.iter_mut().enumerate() {
            if ply > i {
                let frame = &w.stack[ss - 1 - i];
                if frame.current_move.is_valid() && frame.moved_piece.is_some() {
                    *slot = Some(CmhKey {
                        piece: frame.moved_piece.index(),
                        to: frame.current_move.to().index(),
                    });
                }
            }
        }
        ctx
    }

    fn update_pv(w: &mut Worker, ss: usize, mv: Move) {
        let child = std::mem::take(&mut w.stack[ss + 1].pv);
        let pv = &mut w.stack[ss].pv;
        pv.clear();
        pv.push(mv);
        pv.extend_from_slice(&child);
        w.stack[ss + 1].pv = child;
    }

    /// Killer and counter-move bookkeeping on a quiet cutoff.
    fn update_quiet_stats(w: &mut Worker, ss: usize, mv: Move) {
        if mv != w.stack[ss].killers[0] {
            w.stack[ss].killers[1] = w.stack[ss].killers[0];
            w.stack[ss].killers[0] = mv;
        }
        let previous = w.stack[ss - 1].current_move;
        if previous.is_valid() {
            w.tables.set_counter_move(previous, mv);
        }
    }

    // =========================================================================
    // Alpha-beta
    // =========================================================================

    #[allow(clippy::too_many_lines)]
    pub(super) fn alphabeta<const PV: bool>(
        &self,
        w: &mut Worker,
        ss: usize,
        mut depth: i32,
        mut alpha: Value,
        mut beta: Value,
        cut_node: bool,
    ) -> Value {
        let ply = ss - STACK_OFFSET;
        let is_root = PV && ply == 0;

        debug_assert!(PV || alpha == beta - 1);
        debug_assert!(alpha < beta);
        debug_assert!(!(PV && cut_node));

        if !is_root && self.is_repetition(w, ply) {
            return VALUE_DRAW;
        }

        if depth <= 0 {
            return self.quiescence::<PV>(w, ss, alpha, beta);
        }

        if ply >= MAX_PLY {
            return evaluate(&w.position);
        }

        if ply >= w.sel_depth {
            w.sel_depth = ply + 1;
        }

        let in_check = w.position.in_check();

        w.hashes[w.hist_base + ply] = w.position.hash();
        w.stack[ss + 1].skip_move = Move::NONE;
        w.stack[ss + 1].static_eval = VALUE_NONE;
        w.stack[ss + 2].killers = [Move::NONE; 2];

        if !is_root {
            if w.position.is_draw_by_fifty() || w.position.is_insufficient_material() {
                return VALUE_DRAW;
            }
            // Mate distance pruning
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply));
            if alpha >= beta {
                return alpha;
            }
        }

        let cmh = Self::cmh_context(w, ss, ply);
        let previous_move = w.stack[ss - 1].current_move;
        let skip_move = w.stack[ss].skip_move;
        let singular_node = skip_move.is_valid();

        // Transposition table probe; a singular scout perturbs the hash so
        // its entries cannot clash with the unrestricted node.
        let tt_hash = if singular_node {
            w.position.hash() ^ (u64::from(skip_move.raw()) << 32)
        } else {
            w.position.hash()
        };
        let tt_entry = self.tt.probe(tt_hash);
        let tt_hit = tt_entry.is_some();
        let (mut tt_move, tt_value, tt_depth, tt_bound) = match &tt_entry {
            Some(entry) => (
                entry.mv,
                value_from_tt(entry.value, ply),
                entry.depth,
                entry.bound,
            ),
            None => (Move::NONE, VALUE_NONE, 0, Bound::None),
        };
        let tt_value = if is_root {
            w.root_moves[w.pv_index].score
        } else {
            tt_value
        };
        if is_root {
            tt_move = w.root_moves[w.pv_index].pv[0];
        }

        if !PV && tt_hit && tt_depth >= depth {
            let cutoff = match tt_bound {
                Bound::Lower => tt_value >= beta,
                Bound::Upper => tt_value <= alpha,
                Bound::Exact => true,
                Bound::None => false,
            };
            if cutoff {
                if tt_move.is_valid() && !w.position.is_capture(tt_move) {
                    if let Some(piece) = quiet_stats_piece(&w.position, tt_move) {
                        let us = w.position.side_to_move();
                        match tt_bound {
                            Bound::Lower => {
                                Self::update_quiet_stats(w, ss, tt_move);
                                w.tables.update_history(
                                    us,
                                    &cmh,
                                    piece,
                                    tt_move,
                                    history_bonus(depth),
                                );
                            }
                            Bound::Upper => {
                                w.tables.update_history(
                                    us,
                                    &cmh,
                                    piece,
                                    tt_move,
                                    -history_bonus(depth),
                                );
                            }
                            _ => {}
                        }
                    }
                }
                return tt_value;
            }
        }

        // Static evaluation
        if in_check {
            w.stack[ss].static_eval = VALUE_NONE;
        } else if let Some(entry) = &tt_entry {
            w.stack[ss].static_eval = entry.static_eval;
        } else if !previous_move.is_valid() && w.stack[ss - 1].static_eval != VALUE_NONE {
            // Null move: sign-flipped parent eval is close enough
            w.stack[ss].static_eval = -w.stack[ss - 1].static_eval;
        } else {
            w.stack[ss].static_eval = evaluate(&w.position);
        }
        let static_eval = w.stack[ss].static_eval;
        let improving = !in_check && static_eval >= w.stack[ss - 2].static_eval;

        // ====================================================================
        // Whole-node pruning
        // ====================================================================
        if !PV && !in_check && previous_move.is_valid() && !is_mate_score(beta) {
            // Futility: hopelessly above beta
            if w.position.non_pawn_material_total() > 0
                && depth <= FUTILITY_DEPTH
                && static_eval - futility_margin(depth) >= beta
            {
                return static_eval;
            }

            // Razoring: hopelessly below beta, verify with quiescence
            if depth <= RAZOR_DEPTH
                && !singular_node
                && static_eval + RAZOR_MARGIN < beta
            {
                let value = self.quiescence::<false>(w, ss, alpha, beta);
                if value < beta {
                    return value;
                }
            }

            // Null move pruning
            if depth >= NULL_MOVE_DEPTH
                && !singular_node
                && static_eval >= beta
                && !is_mate_score(static_eval)
                && w.position.non_pawn_material(w.position.side_to_move()) > 0
            {
                let mut undo = UndoInfo::new();
                w.stack[ss].current_move = Move::NONE;
                w.stack[ss].moved_piece = ColorPiece::NONE;
                w.stack[ss].move_count = 1;
                w.position.make_null_move(&mut undo);
                let reduction = null_move_reduction(depth, static_eval, beta);
                let value = -self.alphabeta::<false>(
                    w,
                    ss + 1,
                    depth - reduction,
                    -beta,
                    -beta + 1,
                    true,
                );
                w.position.unmake_null_move(&undo);
                if self.check_stop(w) {
                    return VALUE_NONE;
                }
                if value >= beta {
                    return if is_mate_score(value) { beta } else { value };
                }
            }

            // ProbCut: a good capture clearing a raised beta at reduced depth
            // is trusted to clear beta at full depth
            if depth >= PROBCUT_DEPTH {
                let probcut_beta = probcut_beta(beta, improving);
                let mut selector = MoveSelector::new_quiescence();
                let mut undo = UndoInfo::new();
                loop {
                    let mv = selector.next(&w.position, &w.tables, &cmh);
                    if mv.is_none() {
                        break;
                    }
                    if mv == skip_move || !w.position.is_legal(mv) {
                        continue;
                    }
                    let gives_check = w.position.gives_check(mv);
                    w.stack[ss].current_move = mv;
                    w.stack[ss].moved_piece = moved_piece(&w.position, mv);
                    w.position.make_move(mv, &mut undo, gives_check);
                    w.nodes += 1;
                    let mut value = -self.quiescence::<false>(
                        w,
                        ss + 1,
                        -probcut_beta,
                        -probcut_beta + 1,
                    );
                    if value >= probcut_beta {
                        value = -self.alphabeta::<false>(
                            w,
                            ss + 1,
                            depth - PROBCUT_DEPTH + 1,
                            -probcut_beta,
                            -probcut_beta + 1,
                            !cut_node,
                        );
                    }
                    w.position.unmake_move(mv, &undo);
                    if self.check_stop(w) {
                        return VALUE_NONE;
                    }
                    if value >= probcut_beta {
                        return value;
                    }
                }
            }
        }

        // Internal iterative reductions: a missing TT move at depth is not
        // worth searching at full depth yet
        if !in_check && !tt_move.is_valid() {
            if PV && depth >= 6 {
                depth -= 2;
            }
            if cut_node && depth >= 9 {
                depth -= 1;
            }
        }

        let counter_move = if previous_move.is_valid() {
            w.tables.counter_move(previous_move)
        } else {
            Move::NONE
        };
        let killers = w.stack[ss].killers;
        let mut selector = MoveSelector::new(tt_move, killers, counter_move);

        let mut best_value = -VALUE_MATE;
        let mut best_move = Move::NONE;
        let mut move_index = 0;
        let mut quiets_tried: [Move; 64] = [Move::NONE; 64];
        let mut quiet_count = 0usize;
        let mut undo = UndoInfo::new();

        loop {
            let mv = selector.next(&w.position, &w.tables, &cmh);
            if mv.is_none() {
                break;
            }
            if is_root
                && !w.root_moves[w.pv_index..]
                    .iter()
                    .any(|rm| rm.pv[0] == mv)
            {
                continue;
            }
            if mv == skip_move {
                continue;
            }

            let gives_check = w.position.gives_check(mv);
            let is_capture = w.position.is_capture(mv);
            let is_promotion = mv.is_promotion();
            let is_capture_or_promotion = is_capture || is_promotion;
            let us = w.position.side_to_move();

            // Shallow SEE pruning
            if !is_root
                && w.position.non_pawn_material(us) > 0
                && best_value > mated_in(MAX_PLY)
            {
                if is_capture_or_promotion || gives_check {
                    if !w.position.see_ge(mv, -PAWN_VALUE_EG * depth) {
                        continue;
                    }
                } else if !w.position.see_ge(mv, -PAWN_VALUE_MG * depth) {
                    continue;
                }
            }

            // Counter-move history pruning of late quiets
            if !is_root
                && !is_capture_or_promotion
                && move_index >= 2
                && depth <= CMH_PRUNE_DEPTH
            {
                let piece = w.position.piece_at(mv.from());
                let bad0 = w
                    .tables
                    .cmh_entry(cmh[0], piece, mv.to())
                    .map_or(true, |v| v < 0);
                let bad1 = w
                    .tables
                    .cmh_entry(cmh[1], piece, mv.to())
                    .map_or(true, |v| v < 0);
                if bad0 && bad1 {
                    continue;
                }
            }

            if !is_root && !w.position.is_legal(mv) {
                continue;
            }

            move_index += 1;
            w.stack[ss].move_count = move_index;

            let mut extension = 0;

            // Singular extension: when all alternatives fail a reduced scout
            // below the TT score, the TT move is worth a full extra ply
            if !is_root
                && depth >= SINGULAR_EXTENSION_DEPTH
                && !singular_node
                && mv == tt_move
                && tt_hit
                && !is_mate_score(tt_value)
                && tt_bound == Bound::Lower
                && tt_depth >= depth - SINGULAR_DEPTH_TOLERANCE
            {
                let s_beta = singular_beta(tt_value, depth);
                w.stack[ss].skip_move = mv;
                let score = self.alphabeta::<false>(
                    w,
                    ss,
                    singular_depth(depth),
                    s_beta - 1,
                    s_beta,
                    cut_node,
                );
                w.stack[ss].skip_move = Move::NONE;
                if self.check_stop(w) {
                    return VALUE_NONE;
                }
                if score < s_beta {
                    extension = 1;
                } else if s_beta >= beta {
                    // Multi-cut: two moves already beat beta at reduced depth
                    return s_beta;
                }
            } else if mv.move_type() == MoveType::Castle {
                extension = 1;
            } else if gives_check
                && static_eval != VALUE_NONE
                && static_eval.abs() > PAWN_VALUE_MG
            {
                extension = 1;
            } else if !is_capture_or_promotion {
                // Continuation-history extension for consistently strong quiets
                let piece = w.position.piece_at(mv.from());
                let hot0 = w
                    .tables
                    .cmh_entry(cmh[0], piece, mv.to())
                    .is_some_and(|v| v >= MAX_HISTORY / 2);
                let hot1 = w
                    .tables
                    .cmh_entry(cmh[1], piece, mv.to())
                    .is_some_and(|v| v >= MAX_HISTORY / 2);
                if hot0 && hot1 {
                    extension = 1;
                }
            }

            let new_depth = depth - 1 + extension;

            let history_score = if is_capture_or_promotion {
                0
            } else {
                w.tables
                    .history_score(us, &cmh, w.position.piece_at(mv.from()), mv)
            };

            w.stack[ss].current_move = mv;
            w.stack[ss].moved_piece = moved_piece(&w.position, mv);
            w.position.make_move(mv, &mut undo, gives_check);
            w.nodes += 1;

            let mut value = -VALUE_MATE;
            let mut full_depth_search;

            // Late move reductions
            if depth >= LMR_DEPTH
                && move_index >= LMR_MOVE_INDEX + 2 * i32::from(is_root)
                && (!is_capture_or_promotion || cut_node)
                && extension == 0
            {
                let mut reduction = lmr_reduction(PV, improving, depth, move_index);
                if w.stack[ss - 1].move_count > 13 {
                    reduction -= 1;
                }
                if cut_node && mv != killers[0] {
                    reduction += 2;
                }
                reduction -= 2 * history_score / MAX_HISTORY;

                let lmr_depth = (new_depth - reduction).clamp(1, new_depth.max(1));
                value = -self.alphabeta::<false>(
                    w,
                    ss + 1,
                    lmr_depth,
                    -(alpha + 1),
                    -alpha,
                    true,
                );
                full_depth_search = value > alpha && lmr_depth != new_depth;
            } else {
                full_depth_search = !PV || move_index > 1;
            }

            if full_depth_search {
                value = -self.alphabeta::<false>(
                    w,
                    ss + 1,
                    new_depth,
                    -(alpha + 1),
                    -alpha,
                    !cut_node,
                );
            }
            if PV && (move_index == 1 || (value > alpha && (is_root || value < beta))) {
                w.stack[ss + 1].pv.clear();
                value = -self.alphabeta::<true>(w, ss + 1, new_depth, -beta, -alpha, false);
            }

            w.position.unmake_move(mv, &undo);

            if self.check_stop(w) {
                return VALUE_NONE;
            }

            if is_root {
                let child_pv = w.stack[ss + 1].pv.clone();
                let sel_depth = w.sel_depth;
                let rm = w
                    .root_moves
                    .iter_mut()
                    .find(|rm| rm.pv[0] == mv)
                    .expect("searched root move is in the list");
                if move_index == 1 || value > alpha {
                    rm.score = value;
                    rm.sel_depth = sel_depth;
                    rm.pv.truncate(1);
                    rm.pv.extend_from_slice(&child_pv);
                    if move_index > 1 {
                        w.best_move_changes += 1.0;
                    }
                } else {
                    rm.score = -VALUE_MATE;
                }
            }

            if value > best_value {
                best_value = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                    if PV {
                        Self::update_pv(w, ss, mv);
                    }
                    if value >= beta {
                        if !is_capture_or_promotion {
                            let bonus = history_bonus(depth);
                            Self::update_quiet_stats(w, ss, mv);
                            if let Some(piece) = quiet_stats_piece(&w.position, mv) {
                                w.tables.update_history(us, &cmh, piece, mv, bonus);
                            }
                            for &quiet in &quiets_tried[..quiet_count] {
                                if quiet != mv {
                                    if let Some(piece) =
                                        quiet_stats_piece(&w.position, quiet)
                                    {
                                        w.tables
                                            .update_history(us, &cmh, piece, quiet, -bonus);
                                    }
                                }
                            }
                        }
                        break;
                    }
                }
            }

            if !is_capture_or_promotion && quiet_count < quiets_tried.len() {
                quiets_tried[quiet_count] = mv;
                quiet_count += 1;
            }
        }

        if best_value == -VALUE_MATE {
            // No legal move was searched
            if singular_node {
                return alpha;
            }
            return if in_check {
                mated_in(ply)
            } else {
                VALUE_DRAW
            };
        }

        if !singular_node && !(is_root && w.pv_index != 0) && !self.is_stopped() {
            let bound = if best_value >= beta {
                Bound::Lower
            } else if PV && best_move.is_valid() {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(
                tt_hash,
                best_move,
                depth,
                bound,
                value_to_tt(best_value, ply),
                static_eval,
            );
        }

        best_value
    }

    // =========================================================================
    // Quiescence
    // =========================================================================

    pub(super) fn quiescence<const PV: bool>(
        &self,
        w: &mut Worker,
        ss: usize,
        mut alpha: Value,
        mut beta: Value,
    ) -> Value {
        let ply = ss - STACK_OFFSET;
        debug_assert!(alpha < beta);
        debug_assert!(!w.stack[ss].skip_move.is_valid());

        alpha = alpha.max(mated_in(ply));
        beta = beta.min(mate_in(ply));
        if alpha >= beta {
            return alpha;
        }

        let in_check = w.position.in_check();
        let depth = if in_check { -1 } else { 0 };

        w.hashes[w.hist_base + ply] = w.position.hash();

        if self.is_repetition(w, ply)
            || w.position.is_draw_by_fifty()
            || w.position.is_insufficient_material()
        {
            return VALUE_DRAW;
        }

        if ply >= MAX_PLY {
            return evaluate(&w.position);
        }

        let tt_entry = self.tt.probe(w.position.hash());
        let (tt_value, tt_depth, tt_bound) = match &tt_entry {
            Some(entry) => (value_from_tt(entry.value, ply), entry.depth, entry.bound),
            None => (VALUE_NONE, 0, Bound::None),
        };

        if !PV && tt_entry.is_some() && tt_depth >= depth && !is_mate_score(tt_value) {
            let cutoff = match tt_bound {
                Bound::Lower => tt_value >= beta,
                Bound::Upper => tt_value <= alpha,
                Bound::Exact => true,
                Bound::None => false,
            };
            if cutoff {
                return tt_value;
            }
        }

        let mut futility_base = -VALUE_MATE;
        if in_check {
            w.stack[ss].static_eval = mated_in(ply);
        } else {
            w.stack[ss].static_eval = match &tt_entry {
                Some(entry) => entry.static_eval,
                None => evaluate(&w.position),
            };
            // Stand pat
            if w.stack[ss].static_eval >= beta {
                return w.stack[ss].static_eval;
            }
            if alpha < w.stack[ss].static_eval {
                alpha = w.stack[ss].static_eval;
            }
            futility_base = w.stack[ss].static_eval + 80;
        }

        w.stack[ss + 1].skip_move = Move::NONE;
        w.stack[ss + 1].static_eval = VALUE_NONE;

        let cmh = Self::cmh_context(w, ss, ply);
        let mut selector = MoveSelector::new_quiescence();
        let mut best_value = w.stack[ss].static_eval;
        let mut best_move = Move::NONE;
        let mut move_index = 0;
        let mut undo = UndoInfo::new();

        loop {
            let mv = selector.next(&w.position, &w.tables, &cmh);
            if mv.is_none() {
                break;
            }
            if !w.position.is_legal(mv) {
                continue;
            }
            move_index += 1;
            let gives_check = w.position.gives_check(mv);

            // Futility: a capture that cannot raise alpha even winning the
            // victim outright is not worth searching
            if best_value > mated_in(MAX_PLY)
                && !gives_check
                && !in_check
                && futility_base > mated_in(MAX_PLY)
                && !mv.is_promotion()
            {
                if move_index > 2 {
                    continue;
                }
                let victim = w.position.piece_at(mv.to()).piece_type();
                let futility_value = futility_base + victim.map_or(0, piece_value_eg);
                if futility_value <= alpha {
                    best_value = best_value.max(futility_value);
                    continue;
                }
                if futility_base <= alpha && !w.position.see_ge(mv, 1) {
                    best_value = best_value.max(futility_base);
                    continue;
                }
            }

            w.stack[ss].current_move = mv;
            w.stack[ss].moved_piece = moved_piece(&w.position, mv);
            w.position.make_move(mv, &mut undo, gives_check);
            w.nodes += 1;
            w.stack[ss + 1].pv.clear();
            let value = -self.quiescence::<PV>(w, ss + 1, -beta, -alpha);
            w.position.unmake_move(mv, &undo);

            if self.check_stop(w) {
                return VALUE_NONE;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = mv;
                    alpha = value;
                    if PV {
                        Self::update_pv(w, ss, mv);
                    }
                    if value >= beta {
                        break;
                    }
                }
            }
        }

        if in_check && best_value == -VALUE_MATE {
            return mated_in(ply);
        }

        if !self.is_stopped() {
            let bound = if best_value >= beta {
                Bound::Lower
            } else if PV && best_move.is_valid() {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt.store(
                w.position.hash(),
                best_move,
                depth,
                bound,
                value_to_tt(best_value, ply),
                w.stack[ss].static_eval,
            );
        }

        best_value
    }

    // =========================================================================
    // Iterative deepening and aspiration windows
    // =========================================================================

    pub(super) fn iterative_deepening(&self, w: &mut Worker) {
        let max_depth = self
            .limits
            .depth
            .unwrap_or(MAX_PLY as i32)
            .clamp(1, MAX_PLY as i32);
        let multipv = self
            .settings
            .multipv
            .clamp(skill_multipv(self.settings.skill_level), 20)
            .min(w.root_moves.len());
        let is_primary = w.id == 0;

        let mut depth_since_change = 0u32;
        let mut eval_average = 0.0f64;

        while w.depth <= max_depth {
            if is_primary {
                self.time.start_new_depth();
            }
            w.best_move_changes /= 2.0;

            for pv_index in 0..multipv {
                w.pv_index = pv_index;
                w.sel_depth = 0;
                self.aspiration_window_search(w);
                if self.is_stopped() {
                    break;
                }
            }
            if self.is_stopped() {
                break;
            }

            for rm in &mut w.root_moves {
                rm.previous_score = rm.score;
            }
            w.root_moves.sort_by(|a, b| b.score.cmp(&a.score));

            // One legal reply under a clock: no point going deeper
            if w.root_moves.len() == 1 && self.limits.has_clock() {
                break;
            }

            if is_primary && self.limits.has_clock() && !self.limits.infinite {
                let depth_time = self.time.depth_elapsed_ms();
                if self.time.remaining_allocated_ms() < depth_time {
                    break;
                }

                let score = f64::from(w.root_moves[0].score);
                eval_average += (score - eval_average) * if w.depth < 8 { 1.0 } else { 0.1 };

                if w.best_move_changes < 0.5 {
                    depth_since_change += 1;
                } else {
                    depth_since_change = 0;
                }

                let extension = 1.0 + ((eval_average - score) / 70.0).max(0.0);
                let instability =
                    1.0 + (2.0 - 10.0 / f64::from(w.depth)).max(1.0) * w.best_move_changes;
                let reduction =
                    1.0 - f64::from(depth_since_change * depth_since_change).min(1050.0) / 1400.0;
                let mut multiplier = instability * reduction * extension;
                if self.time.max_time_ms().is_some_and(|max| max < 60_000) {
                    multiplier = multiplier.min(1.0);
                }
                self.time.set_multiplier(multiplier);
            }

            w.depth += 1;
        }

        // Partial iterations may have clobbered scores; the last completed
        // iteration's scores are authoritative
        self.flush_nodes(w);
        for rm in &mut w.root_moves {
            rm.score = rm.previous_score;
        }
        w.root_moves.sort_by(|a, b| b.score.cmp(&a.score));
    }

    fn aspiration_window_search(&self, w: &mut Worker) -> Value {
        let depth = w.depth;
        let previous = w.root_moves[w.pv_index].previous_score;
        let mut delta = 0;
        let mut alpha = -VALUE_MATE;
        let mut beta = VALUE_MATE;
        if depth >= ASPIRATION_WINDOW_DEPTH {
            delta = INITIAL_ASPIRATION_WINDOW;
            alpha = (previous - delta).max(-VALUE_MATE);
            beta = (previous + delta).min(VALUE_MATE);
        }

        let mut beta_cutoffs = 0;
        let mut value;
        loop {
            let adjusted_depth = (depth - beta_cutoffs).max(1);
            value = self.alphabeta::<true>(w, STACK_OFFSET, adjusted_depth, alpha, beta, false);

            w.root_moves[w.pv_index..].sort_by(|a, b| b.score.cmp(&a.score));

            if self.is_stopped() {
                break;
            }

            let bound = if value <= alpha {
                ScoreBound::Upper
            } else if value >= beta {
                ScoreBound::Lower
            } else {
                ScoreBound::Exact
            };
            if w.id == 0
                && w.pv_index < self.settings.multipv
                && (bound == ScoreBound::Exact || self.time.total_elapsed_ms() > 3000)
            {
                self.emit_info(w, depth, bound);
            }

            if value <= alpha && value != -VALUE_MATE {
                beta = (alpha + beta) / 2;
                alpha = (value - delta).max(-VALUE_MATE);
                beta_cutoffs = 0;
            } else if value >= beta && value != VALUE_MATE {
                beta = (value + delta).min(VALUE_MATE);
                beta_cutoffs += 1;
            } else {
                break;
            }
            delta += delta / 4 + 5;
        }

        value
    }

    fn emit_info(&self, w: &mut Worker, depth: i32, bound: ScoreBound) {
        self.flush_nodes(w);
        let rm = &w.root_moves[w.pv_index];
        let elapsed = self.time.total_elapsed_ms();
        let nodes = self.total_nodes();
        let score = rm.score;
        let mate_in = if is_mate_score(score) {
            let plies = crate::board::eval::plies_from_mate(score);
            Some(if score > 0 {
                plies / 2 + 1
            } else {
                -(plies / 2)
            })
        } else {
            None
        };

        let info = SearchInfo {
            depth,
            sel_depth: rm.sel_depth.max(w.sel_depth),
            multipv: w.pv_index + 1,
            score,
            mate_in,
            bound,
            nodes,
            nps: nodes * 1000 / (elapsed + 1),
            time_ms: elapsed,
            hashfull: self.tt.hashfull(),
            pv: rm.pv.clone(),
        };

        if self.settings.log_info {
            let mut line = format!(
                "info depth {} seldepth {} score ",
                info.depth, info.sel_depth
            );
            match info.mate_in {
                Some(mate) => line.push_str(&format!("mate {mate}")),
                None => line.push_str(&format!("cp {}", info.score)),
            }
            match info.bound {
                ScoreBound::Lower => line.push_str(" lowerbound"),
                ScoreBound::Upper => line.push_str(" upperbound"),
                ScoreBound::Exact => {}
            }
            line.push_str(&format!(
                " nodes {} nps {} time {} hashfull {} multipv {} pv",
                info.nodes, info.nps, info.time_ms, info.hashfull, info.multipv
            ));
            for mv in &info.pv {
                line.push_str(&format!(" {mv}"));
            }
            println!("{line}");
        }
        if let Some(callback) = &self.info_callback {
            callback(&info);
        }
    }

    /// Weighted-random pick among the top `multipv` lines when playing below
    /// full strength; weaker levels push weaker moves harder.
    pub(super) fn select_best_move_index(&self, w: &Worker, multipv: usize) -> usize {
        let skill = self.settings.skill_level;
        let multipv = multipv.min(w.root_moves.len());
        if skill >= 20 || multipv <= 1 {
            return 0;
        }
        let mut rng = rand::thread_rng();
        let best_score = w.root_moves[0].score;
        let delta = (best_score - w.root_moves[multipv - 1].score).min(PAWN_VALUE_EG);
        let weakness = 120 - 2 * skill;

        let mut max_score = -VALUE_MATE;
        let mut best_index = 0;
        for (index, rm) in w.root_moves[..multipv].iter().enumerate() {
            let push =
                (weakness * (best_score - rm.score) + delta * rng.gen_range(0..=weakness)) / 120;
            if rm.score + push >= max_score {
                max_score = rm.score + push;
                best_index = index;
            }
        }
        best_index
    }
}

/// The colored piece `mv` will leave on its destination square.
fn moved_piece(pos: &Position, mv: Move) -> ColorPiece {
    let us = pos.side_to_move();
    if mv.is_promotion() {
        ColorPiece::new(us, mv.promotion())
    } else {
        pos.piece_at(mv.from())
    }
}

/// Piece for history indexing; `None` if the from-square is empty (a stale
/// TT move from a colliding entry).
fn quiet_stats_piece(pos: &Position, mv: Move) -> Option<ColorPiece> {
    let piece = pos.piece_at(mv.from());
    if piece.is_some() && piece.color() == pos.side_to_move() {
        Some(piece)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchLimits;

    #[test]
    fn test_skill_multipv() {
        assert_eq!(skill_multipv(20), 1);
        assert_eq!(skill_multipv(10), 4);
    }

    #[test]
    fn test_repetition_detected_in_search() {
        // Position where the defender can force repetition by shuffling:
        // search should see 0 for a repeated position rather than loop
        let pos = Position::startpos();
        let mut search = Search::new(8);
        search.settings.log_info = false;
        let mut undo = UndoInfo::new();
        let mut history = Vec::new();
        let mut current = pos.clone();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            history.push(current.hash());
            let mv = current.parse_uci_move(uci).unwrap();
            current.make_move_auto(mv, &mut undo);
        }
        search.set_position_history(history);
        let best = search.search_best_move(&current, SearchLimits::depth(4));
        assert!(best.best.is_some());
    }

    #[test]
    fn test_worker_stack_survives_deep_search() {
        let pos =
            Position::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        let mut search = Search::new(8);
        search.settings.log_info = false;
        let best = search.search_best_move(&pos, SearchLimits::depth(7));
        assert!(best.best.is_some());
    }
}
