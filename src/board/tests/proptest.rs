//! Randomized property tests: random legal walks must preserve every
//! invariant make/unmake promises.

use proptest::prelude::*;

use crate::board::{Position, UndoInfo};

fn random_walk(seed_moves: Vec<u8>) -> Position {
    let mut pos = Position::startpos();
    let mut undo = UndoInfo::new();
    for pick in seed_moves {
        let moves = pos.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves.as_slice()[pick as usize % moves.len()];
        pos.make_move_auto(mv, &mut undo);
    }
    pos
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_hash_matches_recomputed(picks in prop::collection::vec(any::<u8>(), 0..40)) {
        let pos = random_walk(picks);
        prop_assert_eq!(pos.hash(), pos.compute_hash());
    }

    #[test]
    fn prop_fen_round_trip(picks in prop::collection::vec(any::<u8>(), 0..40)) {
        let pos = random_walk(picks);
        let reparsed = Position::from_fen(&pos.to_fen()).unwrap();
        prop_assert_eq!(pos.to_fen(), reparsed.to_fen());
        prop_assert_eq!(pos.hash(), reparsed.hash());
    }

    #[test]
    fn prop_make_unmake_round_trip(
        picks in prop::collection::vec(any::<u8>(), 0..30),
        extra in any::<u8>(),
    ) {
        let pos = random_walk(picks);
        let moves = pos.legal_moves();
        if !moves.is_empty() {
            let mv = moves.as_slice()[extra as usize % moves.len()];
            let mut walked = pos.clone();
            let mut undo = UndoInfo::new();
            walked.make_move_auto(mv, &mut undo);
            walked.unmake_move(mv, &undo);
            prop_assert_eq!(pos.to_fen(), walked.to_fen());
            prop_assert_eq!(pos.hash(), walked.hash());
            prop_assert_eq!(pos.checkers(), walked.checkers());
        }
    }

    #[test]
    fn prop_gives_check_agrees_with_make(
        picks in prop::collection::vec(any::<u8>(), 0..30),
    ) {
        let pos = random_walk(picks);
        let mut undo = UndoInfo::new();
        let mut board = pos.clone();
        for &mv in pos.legal_moves().iter() {
            let predicted = board.gives_check(mv);
            board.make_move_auto(mv, &mut undo);
            // Recompute from scratch; the cached checkers came from the flag
            let us = board.side_to_move();
            let actually_checked = board
                .attackers_to(board.king_square(us), us.other(), board.occupied_all())
                .is_not_empty();
            prop_assert_eq!(predicted, actually_checked, "gives_check mismatch for {}", mv);
            board.unmake_move(mv, &undo);
        }
    }

    #[test]
    fn prop_pseudo_legal_accepts_generated_moves(
        picks in prop::collection::vec(any::<u8>(), 0..30),
    ) {
        let pos = random_walk(picks);
        for &mv in pos.legal_moves().iter() {
            prop_assert!(pos.is_pseudo_legal(mv), "generated move {} rejected", mv);
        }
    }
}
