//! Move generation semantics: flying general, cannon screens, leg and eye
//! blocks, evasions, and the LEGAL = PSEUDO_LEGAL ∩ safe property.

use hongpao::board::{PieceType, Position};
use hongpao::moves::movegen::{generate, generate_legal, GenType, MoveList};
use hongpao::moves::types::Move;
use hongpao::square::Square;

fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    list.to_vec()
}

#[test]
fn flying_general_forces_the_king_aside() {
    // Kings face each other on the d-file with nothing between: the only
    // legal move steps the red king off the file.
    let pos = Position::from_fen("3k5/9/9/9/9/9/9/9/9/3K5 w - - 0 1").unwrap();
    let moves = legal_moves(&pos);
    assert_eq!(moves, vec![pos_move(&pos, "d0e0")]);
}

#[test]
fn flying_general_blocks_file_exposure() {
    // A red pawn on e5 shields the kings. Moving it sideways would leave
    // the generals facing, so its lateral moves must be filtered out.
    let pos = Position::from_fen("4k4/9/9/9/4P4/9/9/9/9/4K4 w - - 0 1").unwrap();
    let moves = legal_moves(&pos);
    let d5 = Move::from_coords("e5d5").unwrap();
    let f5 = Move::from_coords("e5f5").unwrap();
    assert!(!moves.contains(&d5), "e5d5 exposes the flying general");
    assert!(!moves.contains(&f5), "e5f5 exposes the flying general");
    assert!(moves.contains(&Move::from_coords("e5e6").unwrap()));
}

#[test]
fn cannon_requires_a_screen_to_check() {
    // Open file between cannon and king: no check.
    let open = Position::from_fen("4k4/9/9/9/9/9/9/9/9/3KC4 b - - 0 1").unwrap();
    assert!(!open.in_check());

    // Any piece in between turns the cannon into a checker.
    let screened = Position::from_fen("4k4/9/9/9/9/4P4/9/9/9/3KC4 b - - 0 1").unwrap();
    assert!(screened.in_check());
    assert_eq!(screened.checkers().lsb(), Square::parse("e0").unwrap());
}

#[test]
fn knight_leg_block_suppresses_moves() {
    // Knight on e4 with its own pawn on e5: the two forward jumps vanish.
    let pos = Position::from_fen("4k4/9/9/9/4P4/4N4/9/9/9/4K4 w - - 0 1").unwrap();
    let moves = legal_moves(&pos);
    let blocked = [Move::from_coords("e4d6").unwrap(), Move::from_coords("e4f6").unwrap()];
    for m in blocked {
        assert!(!moves.contains(&m), "{m} should be leg-blocked");
    }
    assert!(moves.contains(&Move::from_coords("e4g5").unwrap()));
    assert!(moves.contains(&Move::from_coords("e4c5").unwrap()));
}

#[test]
fn elephant_eye_block_and_river() {
    // Elephant on c0; a piece on d1 blocks the e2 diagonal.
    let pos = Position::from_fen("4k4/9/9/9/9/9/9/9/3P5/2B1K4 w - - 0 1").unwrap();
    let moves = legal_moves(&pos);
    assert!(!moves.contains(&Move::from_coords("c0e2").unwrap()));
    assert!(moves.contains(&Move::from_coords("c0a2").unwrap()));

    // An elephant on the river bank may not cross.
    let bank = Position::from_fen("4k4/9/9/9/9/2B6/9/9/9/4K4 w - - 0 1").unwrap();
    let moves = legal_moves(&bank);
    assert!(!moves.contains(&Move::from_coords("c4a6").unwrap()));
    assert!(!moves.contains(&Move::from_coords("c4e6").unwrap()));
    assert!(moves.contains(&Move::from_coords("c4a2").unwrap()));
    assert!(moves.contains(&Move::from_coords("c4e2").unwrap()));
}

#[test]
fn pawns_move_forward_then_gain_lateral_moves() {
    let pos = Position::from_fen("4k4/9/9/9/4P4/4P4/9/9/9/4K4 w - - 0 1").unwrap();
    let moves = legal_moves(&pos);
    // e4 is still on the red side: forward only (e5 occupied by own pawn).
    assert!(!moves.iter().any(|m| m.from_sq() == Square::parse("e4").unwrap()));
    // e5 has crossed: forward and sideways.
    for coords in ["e5e6", "e5d5", "e5f5"] {
        assert!(moves.contains(&Move::from_coords(coords).unwrap()), "missing {coords}");
    }
}

#[test]
fn captures_and_quiets_partition_pseudo_legal() {
    let pos = Position::from_fen(
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/4R4/P1P1P1P1P/1C5C1/9/1NBAKABNR w - - 0 1",
    )
    .unwrap();
    let mut captures = MoveList::new();
    let mut quiets = MoveList::new();
    let mut pseudo = MoveList::new();
    generate(&pos, GenType::Captures, &mut captures);
    generate(&pos, GenType::Quiets, &mut quiets);
    generate(&pos, GenType::PseudoLegal, &mut pseudo);

    assert_eq!(captures.len() + quiets.len(), pseudo.len());
    for m in captures.iter() {
        assert!(pos.is_capture(*m));
        assert!(pseudo.contains(m));
    }
    for m in quiets.iter() {
        assert!(!pos.is_capture(*m));
        assert!(pseudo.contains(m));
    }
}

#[test]
fn legal_equals_pseudo_legal_minus_self_check() {
    let fens = [
        hongpao::board::START_FEN,
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/4R4/P1P1P1P1P/1C5C1/9/1NBAKABNR b - - 0 1",
        "4k4/9/9/9/9/4P4/4N4/9/9/4K4 w - - 0 1",
    ];
    for fen in fens {
        let mut pos = Position::from_fen(fen).unwrap();
        let legal = legal_moves(&pos);

        let mut pseudo = MoveList::new();
        if pos.in_check() {
            generate(&pos, GenType::Evasions, &mut pseudo);
        } else {
            generate(&pos, GenType::PseudoLegal, &mut pseudo);
        }

        for &m in pseudo.iter() {
            // A pseudo-legal move that would capture the king only occurs
            // in positions that are already decided; none here.
            let us = pos.side_to_move();
            pos.do_move(m);
            let king_safe = pos.checkers_to_now(pos.side_to_move(), pos.king_sq(us)).is_empty();
            pos.undo_move(m);
            assert_eq!(
                legal.contains(&m),
                king_safe,
                "legality filter disagrees on {m} in {fen}"
            );
        }
        // And every legal move is pseudo-legal in the first place.
        for m in &legal {
            assert!(pseudo.contains(m));
        }
    }
}

#[test]
fn evasions_cover_block_capture_and_flight() {
    // Black rook checks the red king down the e-file; red can block with
    // its own rook or sidestep the king.
    let pos = Position::from_fen("3k5/9/9/9/4r4/9/9/9/R8/4K4 w - - 0 1").unwrap();
    assert!(pos.in_check());
    let moves = legal_moves(&pos);
    assert!(moves.contains(&Move::from_coords("e0d0").unwrap()), "king flight");
    assert!(moves.contains(&Move::from_coords("a1e1").unwrap()), "rook blocks");
    assert!(!moves.contains(&Move::from_coords("e0e1").unwrap()), "stays on the ray");
    for m in &moves {
        let mut p = pos.clone();
        let us = p.side_to_move();
        p.do_move(*m);
        assert!(
            p.checkers_to_now(p.side_to_move(), p.king_sq(us)).is_empty(),
            "evasion {m} leaves the king in check"
        );
    }
}

#[test]
fn cannon_check_evasion_by_moving_the_screen() {
    // Black cannon on e9's file checks through the red rook screen at e4:
    // moving the screen off the file is a listed evasion.
    let pos = Position::from_fen("3kc4/9/9/9/9/4R4/9/9/9/4K4 w - - 0 1").unwrap();
    assert!(pos.in_check());
    let moves = legal_moves(&pos);
    assert!(moves.contains(&Move::from_coords("e4d4").unwrap()), "screen steps off");
    assert!(moves.contains(&Move::from_coords("e4e9").unwrap()), "screen captures checker");
    assert!(moves.contains(&Move::from_coords("e0d0").unwrap()), "king flight");
}

#[test]
fn quiet_checks_all_give_check_and_are_quiet() {
    let fens = [
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1",
        // Cannon slides behind the e4 screen to check from e2.
        "4k4/9/9/9/9/4P4/9/3C5/9/3K5 w - - 0 1",
    ];
    let mut produced_any = false;
    for fen in fens {
        let pos = Position::from_fen(fen).unwrap();
        let mut list = MoveList::new();
        generate(&pos, GenType::QuietChecks, &mut list);
        for &m in list.iter() {
            assert!(!pos.is_capture(m), "{m} is not quiet in {fen}");
            if pos.legal(m) {
                produced_any = true;
                assert!(pos.gives_check(m), "{m} does not give check in {fen}");
            }
        }
    }
    assert!(produced_any, "expected at least one quiet check across fixtures");
}

#[test]
fn attack_symmetry_between_attacks_and_attackers_to() {
    let pos = Position::from_fen(
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/4R4/P1P1P1P1P/1C5C1/9/1NBAKABNR w - - 0 1",
    )
    .unwrap();
    let occ = pos.all_pieces();
    let t = hongpao::moves::magic::tables();

    for s in occ.iter() {
        let pc = pos.piece_on(s);
        let attacks = match pc.type_of() {
            PieceType::Pawn => t.pawn_attacks(pc.color_of(), s),
            pt => t.attacks(pt, s, occ),
        };
        for target_idx in 0..90u8 {
            let target = Square(target_idx);
            let attacked = attacks.contains(target);
            let listed = pos.attackers_to(target, occ).contains(s);
            assert_eq!(
                attacked, listed,
                "symmetry broken: {} on {s} vs {target}",
                pc.to_char()
            );
        }
    }
}

fn pos_move(pos: &Position, coords: &str) -> Move {
    pos.parse_move(coords).unwrap()
}
