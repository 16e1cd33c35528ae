//! The scholar's mate scenario: the engine must announce mate in one at any
//! depth and play the queen capture on f7.

use std::sync::{Arc, Mutex};

use squall::board::{Position, UndoInfo};
use squall::search::{Search, SearchInfo, SearchLimits};

fn scholars_mate_position() -> Position {
    let mut pos = Position::startpos();
    let mut undo = UndoInfo::new();
    for uci in ["e2e4", "e7e5", "d1h5", "b8c6", "f1c4", "g8f6"] {
        let mv = pos.parse_uci_move(uci).unwrap();
        pos.make_move_auto(mv, &mut undo);
    }
    pos
}

#[test]
fn test_mate_in_one_reported_at_every_depth() {
    let pos = scholars_mate_position();
    for depth in 1..=4 {
        let mut search = Search::new(8);
        search.settings.log_info = false;
        let infos: Arc<Mutex<Vec<SearchInfo>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&infos);
        search.set_info_callback(Some(Arc::new(move |info: &SearchInfo| {
            sink.lock().unwrap().push(info.clone());
        })));

        let best = search.search_best_move(&pos, SearchLimits::depth(depth));
        let best = best.best.expect("a best move exists");
        assert_eq!(
            best.to_string(),
            "h5f7",
            "depth {depth} must play the mate"
        );

        let infos = infos.lock().unwrap();
        let last = infos.last().expect("at least one info line");
        assert_eq!(last.mate_in, Some(1), "depth {depth} must report mate 1");
    }
}

#[test]
fn test_mated_position_has_no_best_move() {
    let mut pos = scholars_mate_position();
    let mut undo = UndoInfo::new();
    let mate = pos.parse_uci_move("h5f7").unwrap();
    pos.make_move_auto(mate, &mut undo);
    assert!(pos.in_check());
    assert!(pos.legal_moves().is_empty());

    let mut search = Search::new(8);
    search.settings.log_info = false;
    let best = search.search_best_move(&pos, SearchLimits::depth(3));
    assert!(best.best.is_none());
}
