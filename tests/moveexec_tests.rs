//! Make/undo round-trip and Zobrist consistency over random legal walks.

use hongpao::bitboard::Bitboard;
use hongpao::board::{Position, PIECE_TYPES};
use hongpao::moves::movegen::{generate_legal, MoveList};
use hongpao::square::Color;

/// Tiny deterministic generator so walks are reproducible.
struct SplitMix(u64);

impl SplitMix {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[derive(PartialEq, Debug)]
struct Snapshot {
    fen: String,
    key: u64,
    checkers: Bitboard,
    material: [i32; 2],
    pst: [i32; 2],
    rule60: i32,
    game_ply: i32,
    states: usize,
    king_sq: [u8; 2],
}

fn snapshot(pos: &Position) -> Snapshot {
    Snapshot {
        fen: pos.to_fen(),
        key: pos.key(),
        checkers: pos.checkers(),
        material: pos.st().material,
        pst: pos.st().pst,
        rule60: pos.st().rule60,
        game_ply: pos.game_ply,
        states: pos.state_count(),
        king_sq: [
            pos.king_sq(Color::White).0,
            pos.king_sq(Color::Black).0,
        ],
    }
}

#[test]
fn do_undo_restores_everything() {
    let mut pos = Position::startpos();
    let mut rng = SplitMix(42);

    for _ in 0..400 {
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        if list.is_empty() {
            break;
        }
        let m = list[rng.next() as usize % list.len()];

        let before = snapshot(&pos);
        pos.do_move(m);
        pos.undo_move(m);
        assert_eq!(snapshot(&pos), before, "round trip broke after {m}");

        // Walk on.
        pos.do_move(m);
        assert!(pos.validate().is_ok(), "invariants broke after {m}");
    }
}

#[test]
fn incremental_key_matches_full_recompute() {
    let mut pos = Position::startpos();
    let mut rng = SplitMix(7);

    for _ in 0..300 {
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        if list.is_empty() {
            break;
        }
        let m = list[rng.next() as usize % list.len()];
        pos.do_move(m);
        assert_eq!(
            pos.key(),
            pos.compute_key_full(),
            "incremental key diverged after {m}"
        );
    }
}

#[test]
fn null_move_round_trip() {
    let mut pos = Position::startpos();
    pos.do_move(pos.parse_move("b2e2").unwrap());

    let before = snapshot(&pos);
    let key_before = pos.key();
    pos.do_null_move();
    assert_ne!(pos.key(), key_before);
    assert_eq!(pos.st().plies_from_null, 0);
    assert_eq!(pos.side_to_move(), Color::White);
    pos.undo_null_move();
    assert_eq!(snapshot(&pos), before);
}

#[test]
fn bitboards_stay_coherent_along_walks() {
    let mut pos = Position::startpos();
    let mut rng = SplitMix(1234);

    for _ in 0..200 {
        let mut list = MoveList::new();
        generate_legal(&pos, &mut list);
        if list.is_empty() {
            break;
        }
        let m = list[rng.next() as usize % list.len()];
        pos.do_move(m);

        // Union of per-type boards equals the all-pieces board, and types
        // are pairwise disjoint (validate checks the rest).
        let mut union = Bitboard::EMPTY;
        for pt in PIECE_TYPES {
            union |= pos.pieces_of(pt);
        }
        assert_eq!(union, pos.all_pieces());
        assert!(pos.validate().is_ok());
    }
}

#[test]
fn capture_resets_rule60_and_restores_on_undo() {
    let mut pos = Position::from_fen(
        "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 37 1",
    )
    .unwrap();
    assert_eq!(pos.st().rule60, 37);

    // Quiet move bumps the counter.
    let quiet = pos.parse_move("b2e2").unwrap();
    pos.do_move(quiet);
    assert_eq!(pos.st().rule60, 38);

    // Cannon takes the e6 pawn over the e3 screen: counter resets.
    pos.do_move(pos.parse_move("h7e7").unwrap());
    let capture = pos.parse_move("e2e6").unwrap();
    pos.do_move(capture);
    assert_eq!(pos.st().rule60, 0);
    pos.undo_move(capture);
    assert_eq!(pos.st().rule60, 39);
}
