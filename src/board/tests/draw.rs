//! Draw rule coverage: fifty-move counter and insufficient material.

use crate::board::Position;

#[test]
fn test_fifty_move_rule() {
    let fresh = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    assert!(!fresh.is_draw_by_fifty());
    let stale = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 100 80").unwrap();
    assert!(stale.is_draw_by_fifty());
    let over = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 120 90").unwrap();
    assert!(over.is_draw_by_fifty());
}

#[test]
fn test_insufficient_material_bare_kings() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert!(pos.is_insufficient_material());
}

#[test]
fn test_insufficient_material_lone_minor() {
    let knight = Position::from_fen("4k3/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
    assert!(knight.is_insufficient_material());
    let bishop = Position::from_fen("4k3/8/8/8/8/8/4B3/4K3 b - - 0 1").unwrap();
    assert!(bishop.is_insufficient_material());
}

#[test]
fn test_insufficient_material_same_color_bishops() {
    // c2, e2 and c8 are all light squares
    let same_side = Position::from_fen("4k3/8/8/8/8/8/2B1B3/4K3 w - - 0 1").unwrap();
    assert!(same_side.is_insufficient_material());
    let opposing = Position::from_fen("2b1k3/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert!(opposing.is_insufficient_material());
}

#[test]
fn test_sufficient_material() {
    let pawn = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
    assert!(!pawn.is_insufficient_material());
    let rook = Position::from_fen("4k3/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    assert!(!rook.is_insufficient_material());
    let two_knights = Position::from_fen("4k3/8/8/8/8/8/2N1N3/4K3 w - - 0 1").unwrap();
    assert!(!two_knights.is_insufficient_material());
    let opposite_bishops = Position::from_fen("3bk3/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert!(!opposite_bishops.is_insufficient_material());
}
