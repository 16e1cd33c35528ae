//! Search behavior through the public API: limits, MultiPV, tactics.

use std::sync::{Arc, Mutex};

use squall::board::Position;
use squall::search::{Search, SearchInfo, SearchLimits};

fn quiet_search() -> Search {
    let mut search = Search::new(8);
    search.settings.log_info = false;
    search
}

#[test]
fn test_depth_limit_is_respected() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    let infos: Arc<Mutex<Vec<SearchInfo>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&infos);
    search.set_info_callback(Some(Arc::new(move |info: &SearchInfo| {
        sink.lock().unwrap().push(info.clone());
    })));
    search.search_best_move(&pos, SearchLimits::depth(4));
    let infos = infos.lock().unwrap();
    assert!(!infos.is_empty());
    assert!(infos.iter().all(|info| info.depth <= 4));
    assert!(infos.iter().any(|info| info.depth == 4));
}

#[test]
fn test_node_limit_stops_search() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    let mut limits = SearchLimits::default();
    limits.nodes = Some(5_000);
    limits.depth = Some(64);
    let best = search.search_best_move(&pos, limits);
    assert!(best.best.is_some());
    // Some overshoot is fine (the flag is polled); orders of magnitude are not
    assert!(search.total_nodes() < 200_000);
}

#[test]
fn test_movetime_stops_search() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    let start = std::time::Instant::now();
    let best = search.search_best_move(&pos, SearchLimits::movetime(100));
    assert!(best.best.is_some());
    assert!(start.elapsed().as_millis() < 2_000);
}

#[test]
fn test_multipv_reports_distinct_lines() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    search.settings.multipv = 3;
    let infos: Arc<Mutex<Vec<SearchInfo>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&infos);
    search.set_info_callback(Some(Arc::new(move |info: &SearchInfo| {
        sink.lock().unwrap().push(info.clone());
    })));
    search.search_best_move(&pos, SearchLimits::depth(5));
    let infos = infos.lock().unwrap();
    let deepest: Vec<_> = infos.iter().filter(|info| info.depth == 5).collect();
    let mut first_moves: Vec<String> = deepest
        .iter()
        .map(|info| info.pv[0].to_string())
        .collect();
    first_moves.sort();
    first_moves.dedup();
    assert!(first_moves.len() >= 3, "expected three distinct PV heads");
}

#[test]
fn test_finds_fork() {
    // Nc7+ forks king and rook
    let pos = Position::from_fen("r3k3/8/8/3N4/8/8/8/4K3 w - - 0 1").unwrap();
    let mut search = quiet_search();
    let best = search.search_best_move(&pos, SearchLimits::depth(6));
    assert_eq!(best.best.unwrap().to_string(), "d5c7");
}

#[test]
fn test_avoids_stalemate_when_winning() {
    // KQ vs K: must not throw away the win
    let pos = Position::from_fen("7k/8/5K2/8/8/8/1Q6/8 w - - 0 1").unwrap();
    let mut search = quiet_search();
    let best = search.search_best_move(&pos, SearchLimits::depth(8));
    let mv = best.best.unwrap();
    let mut probe = pos.clone();
    let mut undo = squall::board::UndoInfo::new();
    probe.make_move_auto(mv, &mut undo);
    assert!(
        probe.in_check() || probe.has_legal_moves(),
        "{mv} stalemates the defender"
    );
}

#[test]
fn test_skill_level_still_plays_legal_moves() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    search.settings.skill_level = 5;
    let best = search.search_best_move(&pos, SearchLimits::depth(4));
    let mv = best.best.unwrap();
    assert!(pos.legal_moves().contains(mv));
}

#[test]
fn test_ponder_move_comes_from_pv() {
    let pos = Position::startpos();
    let mut search = quiet_search();
    let best = search.search_best_move(&pos, SearchLimits::depth(5));
    if let (Some(first), Some(ponder)) = (best.best, best.ponder) {
        let mut probe = pos.clone();
        let mut undo = squall::board::UndoInfo::new();
        probe.make_move_auto(first, &mut undo);
        assert!(probe.legal_moves().contains(ponder));
    }
}
