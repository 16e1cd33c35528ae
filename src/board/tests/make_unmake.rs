//! Make/unmake round-trip tests: every field of the position, cached state
//! and hash included, must come back byte for byte.

use crate::board::{Color, Position, UndoInfo};

fn positions_equal(a: &Position, b: &Position) -> bool {
    a.to_fen() == b.to_fen()
        && a.hash() == b.hash()
        && a.checkers() == b.checkers()
        && a.occupied_all() == b.occupied_all()
        && a.non_pawn_material(Color::White) == b.non_pawn_material(Color::White)
        && a.non_pawn_material(Color::Black) == b.non_pawn_material(Color::Black)
        && a.blockers_for_king(Color::White) == b.blockers_for_king(Color::White)
        && a.blockers_for_king(Color::Black) == b.blockers_for_king(Color::Black)
        && a.pinners(Color::White) == b.pinners(Color::White)
        && a.pinners(Color::Black) == b.pinners(Color::Black)
}

fn check_round_trip(fen: &str) {
    let original = Position::from_fen(fen).unwrap();
    let mut board = original.clone();
    let mut undo = UndoInfo::new();
    for &mv in board.clone().legal_moves().iter() {
        board.make_move_auto(mv, &mut undo);
        assert_eq!(
            board.hash(),
            board.compute_hash(),
            "incremental hash diverged after {mv} in {fen}"
        );
        board.unmake_move(mv, &undo);
        assert!(
            positions_equal(&original, &board),
            "round trip failed for {mv} in {fen}"
        );
        assert_eq!(board.hash(), board.compute_hash());
    }
}

#[test]
fn test_round_trip_startpos() {
    check_round_trip("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn test_round_trip_kiwipete() {
    check_round_trip("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
}

#[test]
fn test_round_trip_en_passant() {
    check_round_trip("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3");
}

#[test]
fn test_round_trip_promotions() {
    check_round_trip("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1");
}

#[test]
fn test_round_trip_castling() {
    check_round_trip("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    check_round_trip("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");
}

#[test]
fn test_round_trip_in_check() {
    // White to move, in check from the knight on f3
    check_round_trip("rnbqkb1r/pppppppp/8/8/8/5n2/PPPPP1PP/RNBQKBNR w KQkq - 0 1");
}

#[test]
fn test_null_move_round_trip() {
    let original =
        Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let mut board = original.clone();
    let mut undo = UndoInfo::new();
    board.make_null_move(&mut undo);
    assert_ne!(board.hash(), original.hash());
    assert_eq!(board.side_to_move(), Color::Black);
    assert_eq!(board.hash(), board.compute_hash());
    board.unmake_null_move(&undo);
    assert!(positions_equal(&original, &board));
}

#[test]
fn test_null_move_clears_en_passant() {
    let mut board =
        Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
            .unwrap();
    let mut undo = UndoInfo::new();
    board.make_null_move(&mut undo);
    assert_eq!(board.en_passant(), None);
    board.unmake_null_move(&undo);
    assert_eq!(board.en_passant().map(|sq| sq.to_string()), Some("d6".into()));
}

#[test]
fn test_capture_restores_castling_rights() {
    // Rook takes rook on h8, removing black's kingside right; unmake restores it
    let original = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let mut board = original.clone();
    let mut undo = UndoInfo::new();
    let mv = board.parse_uci_move("h1h8").unwrap();
    board.make_move_auto(mv, &mut undo);
    assert!(!board.castling().has(Color::Black, true));
    assert!(!board.castling().has(Color::White, true));
    board.unmake_move(mv, &undo);
    assert!(positions_equal(&original, &board));
}

#[test]
fn test_legality_soundness() {
    // Every generated legal move must leave our king unattacked
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnb1kbnr/pppp1ppp/8/4p3/6P1/5P1q/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
    ];
    let mut undo = UndoInfo::new();
    for fen in fens {
        let mut board = Position::from_fen(fen).unwrap();
        let us = board.side_to_move();
        for &mv in board.clone().legal_moves().iter() {
            board.make_move_auto(mv, &mut undo);
            let king = board.king_square(us);
            assert!(
                board
                    .attackers_to(king, us.other(), board.occupied_all())
                    .is_empty(),
                "{mv} leaves the king attacked in {fen}"
            );
            board.unmake_move(mv, &undo);
        }
    }
}

#[test]
fn test_check_detection_bishop_takes_d7() {
    let mut board = Position::from_fen(
        "rnbqkbnr/pppppppp/8/1B6/4P3/8/PPPP1PPP/RNBQK1NR w KQkq - 0 1",
    )
    .unwrap();
    let mv = board.parse_uci_move("b5d7").unwrap();
    assert!(board.gives_check(mv));
    let mut undo = UndoInfo::new();
    board.make_move_auto(mv, &mut undo);
    assert!(board.in_check());
}

#[test]
fn test_gives_check_discovered() {
    // Moving the knight discovers the rook's check along the e-file
    let board = Position::from_fen("4k3/8/8/8/4N3/8/8/4R1K1 w - - 0 1").unwrap();
    let mv = board.parse_uci_move("e4c5").unwrap();
    assert!(board.gives_check(mv));
    let aligned_mv = board.parse_uci_move("e4d6").unwrap();
    // d6 still blocks nothing: knight leaves the file, also discovered check
    assert!(board.gives_check(aligned_mv));
}

#[test]
fn test_gives_check_castle() {
    // Castling kingside puts the rook on f1 checking the king on f8
    let board = Position::from_fen("5k2/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    let mv = board.parse_uci_move("e1g1").unwrap();
    assert!(mv.is_castle());
    assert!(board.gives_check(mv));
}
