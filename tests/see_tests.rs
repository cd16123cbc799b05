//! Static exchange evaluation scenarios with Xiangqi piece values.

use hongpao::board::Position;
use hongpao::search::see::SeeExt;

#[test]
fn free_pawn_grab_is_non_losing() {
    // Red pawn on e5 takes the undefended e6 pawn.
    let pos = Position::from_fen("3k5/9/9/4p4/4P4/9/9/9/9/4K4 w - - 0 1").unwrap();
    let m = pos.parse_move("e5e6").unwrap();
    assert!(pos.see_ge(m, 0));
    // It nets a pawn, but not more than a pawn.
    assert!(pos.see_ge(m, 79));
    assert!(!pos.see_ge(m, 81));
}

#[test]
fn rook_takes_defended_pawn_loses_material() {
    // The e6 pawn is guarded by the g7 knight (leg f7 is free).
    let pos =
        Position::from_fen("3k5/9/6n2/4p4/4R4/9/9/9/9/4K4 w - - 0 1").unwrap();
    let m = pos.parse_move("e5e6").unwrap();
    assert!(!pos.see_ge(m, 0), "pawn for rook is a losing trade");
    // Still fine if all we demand is the deeply negative outcome.
    assert!(pos.see_ge(m, 80 - 1245));
}

#[test]
fn equal_rook_trade_breaks_even() {
    let pos =
        Position::from_fen("3k5/9/9/9/4r4/9/9/9/4R4/4K4 w - - 0 1").unwrap();
    let m = pos.parse_move("e1e5").unwrap();
    assert!(pos.see_ge(m, 0));
    assert!(pos.see_ge(m, 1245), "the capture itself banks a full rook");
}

#[test]
fn cannon_jump_capture_of_undefended_rook() {
    // Cannon on e0 jumps the e4 screen to take the e7 rook. The d1
    // advisor keeps the bare generals from facing on the d-file.
    let pos = Position::from_fen("3k5/9/4r4/9/9/4P4/9/9/3A5/3KC4 w - - 0 1").unwrap();
    let m = pos.parse_move("e0e7").unwrap();
    assert!(pos.see_ge(m, 0));
    assert!(pos.see_ge(m, 1245 - 653));
}

#[test]
fn quiet_move_satisfies_only_non_positive_thresholds() {
    let pos = Position::startpos();
    let m = pos.parse_move("b2e2").unwrap();
    // Nothing is captured and nothing recaptures on e2.
    assert!(pos.see_ge(m, 0));
    assert!(!pos.see_ge(m, 1));
}
