//! Search: iterative deepening PVS driver with a Lazy-SMP worker pool.
//!
//! The `Search` struct owns everything shared across workers: the
//! transposition table, settings, the time manager and the stop flag. Each
//! worker owns its position, stack, history tables and root-move list; the
//! only cross-thread mutable state is the TT and the stop flag.

mod constants;
mod selector;
mod tables;
mod thread;
mod time;

pub use constants::MAX_PLY;
pub use time::{allocate_time, TimeManager, MOVE_OVERHEAD_BUFFER_MS};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::board::eval::{Value, VALUE_MATE};
use crate::board::types::{Move, Piece, Square};
use crate::board::Position;
use crate::book::OpeningBook;
use crate::tt::TranspositionTable;

use thread::Worker;

/// Limits for one `go` command.
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    pub infinite: bool,
    pub depth: Option<i32>,
    pub movetime_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub white_time_ms: Option<u64>,
    pub black_time_ms: Option<u64>,
    pub white_inc_ms: Option<u64>,
    pub black_inc_ms: Option<u64>,
    pub moves_to_go: Option<u32>,
    /// Restrict the root to these moves (`go searchmoves`, book hits).
    pub searchmoves: Vec<Move>,
}

impl SearchLimits {
    #[must_use]
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..SearchLimits::default()
        }
    }

    #[must_use]
    pub fn movetime(ms: u64) -> Self {
        SearchLimits {
            movetime_ms: Some(ms),
            ..SearchLimits::default()
        }
    }

    #[must_use]
    pub fn has_clock(&self) -> bool {
        self.white_time_ms.is_some() || self.black_time_ms.is_some()
    }
}

/// Engine-wide configuration applied by `setoption`.
#[derive(Clone, Debug)]
pub struct SearchSettings {
    pub multipv: usize,
    pub skill_level: i32,
    pub threads: usize,
    /// Print `info` lines to stdout while searching.
    pub log_info: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            multipv: 1,
            skill_level: 20,
            threads: 1,
            log_info: true,
        }
    }
}

/// One root move with its principal variation and scores.
#[derive(Clone, Debug)]
pub struct RootMove {
    pub pv: Vec<Move>,
    pub score: Value,
    /// Score from the last fully completed iteration.
    pub previous_score: Value,
    pub sel_depth: usize,
}

impl RootMove {
    fn new(mv: Move) -> Self {
        RootMove {
            pv: vec![mv],
            score: -VALUE_MATE,
            previous_score: -VALUE_MATE,
            sel_depth: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BestMove {
    pub best: Option<Move>,
    pub ponder: Option<Move>,
}

/// Score bound attached to an `info` line during an aspiration re-search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBound {
    Exact,
    Lower,
    Upper,
}

/// Data behind one `info` line.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: i32,
    pub sel_depth: usize,
    pub multipv: usize,
    pub score: Value,
    pub mate_in: Option<i32>,
    pub bound: ScoreBound,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

pub type InfoCallback = Arc<dyn Fn(&SearchInfo) + Send + Sync>;

/// Stack size for search worker threads; deep PVS recursion with per-frame
/// move buffers needs room.
const SEARCH_STACK_SIZE: usize = 32 * 1024 * 1024;

pub struct Search {
    pub tt: Arc<TranspositionTable>,
    pub settings: SearchSettings,
    pub book: Option<OpeningBook>,
    time: TimeManager,
    stop: Arc<AtomicBool>,
    limits: SearchLimits,
    /// Hashes of the game positions before the root, for repetition checks.
    position_history: Vec<u64>,
    /// Node counts flushed from all workers, for info output.
    shared_nodes: AtomicU64,
    info_callback: Option<InfoCallback>,
}

impl Search {
    #[must_use]
    pub fn new(tt_mb: usize) -> Self {
        crate::board::attack_tables::init();
        Search {
            tt: Arc::new(TranspositionTable::new(tt_mb)),
            settings: SearchSettings::default(),
            book: None,
            time: TimeManager::new(),
            stop: Arc::new(AtomicBool::new(false)),
            limits: SearchLimits::default(),
            position_history: Vec::new(),
            shared_nodes: AtomicU64::new(0),
            info_callback: None,
        }
    }

    /// Shared stop flag; setting it makes every worker return promptly.
    #[must_use]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Replace the transposition table (the `Hash` option).
    pub fn resize_tt(&mut self, size_mb: usize) {
        self.tt = Arc::new(TranspositionTable::new(size_mb));
    }

    /// `ucinewgame`: clear the TT. Worker history tables are per-search.
    pub fn new_game(&mut self) {
        self.tt.clear();
    }

    /// Hashes of positions played before the current root.
    pub fn set_position_history(&mut self, history: Vec<u64>) {
        self.position_history = history;
    }

    pub fn set_info_callback(&mut self, callback: Option<InfoCallback>) {
        self.info_callback = callback;
    }

    #[must_use]
    pub fn total_nodes(&self) -> u64 {
        self.shared_nodes.load(Ordering::Relaxed)
    }

    fn generate_root_moves(&self, pos: &Position, only: &[Move]) -> Vec<RootMove> {
        pos.legal_moves()
            .iter()
            .copied()
            .filter(|mv| only.is_empty() || only.contains(mv))
            .map(RootMove::new)
            .collect()
    }

    /// Consult the opening book; a hit constrains the root move list.
    fn probe_book(&self, pos: &Position, limits: &mut SearchLimits) {
        let Some(book) = &self.book else { return };
        if limits.infinite
            || !limits.searchmoves.is_empty()
            || pos.total_half_moves() > book.cardinality()
        {
            return;
        }
        if let Some(entry) = book.pick(pos.hash()) {
            let mv = book_entry_move(pos, entry.from, entry.to);
            if pos.legal_moves().contains(mv) {
                log::info!("book move {mv}");
                limits.searchmoves = vec![mv];
            }
        }
    }

    /// Run a search to completion and return the chosen move.
    pub fn search_best_move(&mut self, pos: &Position, mut limits: SearchLimits) -> BestMove {
        self.stop.store(false, Ordering::SeqCst);
        self.shared_nodes.store(0, Ordering::Relaxed);

        self.probe_book(pos, &mut limits);

        let (optimal, max) = allocate_time(&limits, pos);
        self.time.start_search(optimal, max);
        self.limits = limits;

        let root_moves = self.generate_root_moves(pos, &self.limits.searchmoves);
        if root_moves.is_empty() {
            return BestMove::default();
        }

        let thread_count = self.settings.threads.max(1);
        let mut helpers: Vec<Worker> = (1..thread_count)
            .map(|id| self.make_worker(id, pos, root_moves.clone()))
            .collect();
        let mut main = self.make_worker(0, pos, root_moves);

        let this = &*self;
        std::thread::scope(|scope| {
            let handles: Vec<_> = helpers
                .drain(..)
                .map(|mut worker| {
                    std::thread::Builder::new()
                        .name(format!("search-{}", worker.id))
                        .stack_size(SEARCH_STACK_SIZE)
                        .spawn_scoped(scope, move || {
                            this.iterative_deepening(&mut worker);
                        })
                        .expect("failed to spawn search worker")
                })
                .collect();

            this.iterative_deepening(&mut main);
            // The primary decides when the search is over
            this.stop.store(true, Ordering::SeqCst);
            for handle in handles {
                let _ = handle.join();
            }
        });

        let multipv = self
            .settings
            .multipv
            .max(thread::skill_multipv(self.settings.skill_level))
            .min(main.root_moves.len());
        let pick = self.select_best_move_index(
            &main,
            multipv.min(thread::skill_multipv(self.settings.skill_level)),
        );
        let chosen = &main.root_moves[pick];
        BestMove {
            best: chosen.pv.first().copied(),
            ponder: chosen.pv.get(1).copied(),
        }
    }
}

/// Rebuild a book entry's bare from/to squares into a real move: king moves
/// two files from e becomes a castle, a pawn reaching the last rank promotes
/// to a queen.
fn book_entry_move(pos: &Position, from: Square, to: Square) -> Move {
    let piece = pos.piece_at(from).piece_type();
    if piece == Some(Piece::King) && from.file() == 4 && (to.file() == 2 || to.file() == 6) {
        return Move::new_castle(from, to);
    }
    if piece == Some(Piece::Pawn) && (to.rank() == 7 || to.rank() == 0) {
        return Move::new_promotion(from, to, Piece::Queen);
    }
    Move::new(from, to)
}

#[cfg(test)]
mod search_tests {
    use super::*;

    fn fixed_depth(fen: &str, depth: i32) -> (Search, BestMove) {
        let pos = Position::from_fen(fen).unwrap();
        let mut search = Search::new(16);
        search.settings.log_info = false;
        let best = search.search_best_move(&pos, SearchLimits::depth(depth));
        (search, best)
    }

    #[test]
    fn test_finds_mate_in_one() {
        // Scholar's mate delivery: Qxf7#
        let (_, best) = fixed_depth(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
            2,
        );
        assert_eq!(best.best.unwrap().to_string(), "h5f7");
    }

    #[test]
    fn test_finds_obvious_capture() {
        // Hanging queen must be taken
        let (_, best) = fixed_depth("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1", 4);
        assert_eq!(best.best.unwrap().to_string(), "e4d5");
    }

    #[test]
    fn test_single_legal_move() {
        // King in the corner with one escape square
        let (_, best) = fixed_depth("7k/5Q2/8/8/8/8/8/K7 b - - 0 1", 3);
        assert!(best.best.is_some());
    }

    #[test]
    fn test_no_moves_returns_none() {
        // Checkmated side to move
        let (_, best) = fixed_depth(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
            1,
        );
        assert!(best.best.is_none());
    }

    #[test]
    fn test_searchmoves_restricts_root() {
        let pos = Position::startpos();
        let mut search = Search::new(16);
        search.settings.log_info = false;
        let forced = pos.parse_uci_move("a2a3").unwrap();
        let mut limits = SearchLimits::depth(3);
        limits.searchmoves = vec![forced];
        let best = search.search_best_move(&pos, limits);
        assert_eq!(best.best, Some(forced));
    }

    #[test]
    fn test_multithreaded_search_agrees_on_forced_capture() {
        let pos = Position::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut search = Search::new(16);
        search.settings.log_info = false;
        search.settings.threads = 3;
        let best = search.search_best_move(&pos, SearchLimits::depth(5));
        assert_eq!(best.best.unwrap().to_string(), "e4d5");
    }
}
