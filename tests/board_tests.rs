//! End-to-end board scenarios through the public API.

use squall::board::{Position, Square};

#[test]
fn test_see_losing_bishop_takes_a6() {
    // After 1. e4 a6, Bxa6 loses the bishop to bxa6
    let mut pos = Position::startpos();
    let mut undo = squall::board::UndoInfo::new();
    for uci in ["e2e4", "a7a6"] {
        let mv = pos.parse_uci_move(uci).unwrap();
        pos.make_move_auto(mv, &mut undo);
    }
    let capture = pos.parse_uci_move("f1a6").unwrap();
    assert!(!pos.see_ge(capture, 0));
}

#[test]
fn test_check_detection_after_bxd7() {
    let mut pos = Position::from_fen(
        "rnbqkbnr/pppppppp/8/1B6/4P3/8/PPPP1PPP/RNBQK1NR w KQkq - 0 1",
    )
    .unwrap();
    let mv = pos.parse_uci_move("b5d7").unwrap();
    let mut undo = squall::board::UndoInfo::new();
    pos.make_move_auto(mv, &mut undo);
    assert!(pos.in_check());
}

#[test]
fn test_san_queen_capture_disambiguates_to_d5() {
    let pos = Position::from_fen("r2q3k/p2P3p/1p3p2/3QP1r1/8/B7/P5PP/2R3K1 w - - 0 1").unwrap();
    let mv = pos.parse_san("Qxa8").unwrap();
    assert_eq!(mv.from().to_string(), "d5");
    assert_eq!(mv.to().to_string(), "a8");
}

#[test]
fn test_san_formats_rook_to_c8() {
    let pos = Position::from_fen("r2q3k/p2P3p/1p3p2/3QP1r1/8/B7/P5PP/2R3K1 w - - 0 1").unwrap();
    let mv = squall::board::Move::new(Square::C1, Square::C8);
    assert_eq!(pos.to_san(mv), "Rc8");
}

#[test]
fn test_en_passant_square_always_expressed() {
    // EP square appears in FEN even when no enemy pawn can capture it
    let mut pos = Position::startpos();
    let mv = pos.parse_uci_move("e2e4").unwrap();
    let mut undo = squall::board::UndoInfo::new();
    pos.make_move_auto(mv, &mut undo);
    assert!(pos.to_fen().contains(" e3 "));
}

#[test]
fn test_castle_move_format() {
    let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let kingside = pos.parse_uci_move("e1g1").unwrap();
    assert!(kingside.is_castle());
    assert_eq!(kingside.to_string(), "e1g1");
    let queenside = pos.parse_uci_move("e1c1").unwrap();
    assert!(queenside.is_castle());
    assert_eq!(queenside.to_string(), "e1c1");
}
