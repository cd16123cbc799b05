use hongpao::board::Position;
use hongpao::moves::movegen::{generate_legal, MoveList};
use hongpao::moves::perft::{perft, perft_count};

fn startpos() -> Position {
    Position::startpos()
}

fn run_depth(pos: &mut Position, depth: u32, expected: u64) {
    use std::time::Instant;
    let start = Instant::now();
    let nodes = perft_count(pos, depth);
    let secs = start.elapsed().as_secs_f64().max(1e-9);
    println!(
        "d{depth}: nodes={nodes} time={:.3}s nps={}",
        secs,
        (nodes as f64 / secs) as u64
    );
    assert_eq!(nodes, expected, "perft mismatch at depth {depth}");
}

#[test]
fn startpos_has_44_moves() {
    let pos = startpos();
    let mut list = MoveList::new();
    generate_legal(&pos, &mut list);
    assert_eq!(list.len(), 44);
}

#[test]
fn perft_startpos_d1() {
    run_depth(&mut startpos(), 1, 44);
}

#[test]
fn perft_startpos_d2() {
    run_depth(&mut startpos(), 2, 1_920);
}

#[test]
fn perft_startpos_d3() {
    run_depth(&mut startpos(), 3, 79_666);
}

// Deeper nodes are opt-in; run with `--ignored`.
#[test]
#[ignore]
fn perft_startpos_d4() {
    run_depth(&mut startpos(), 4, 3_290_240);
}

#[test]
#[ignore]
fn perft_startpos_d5() {
    run_depth(&mut startpos(), 5, 133_312_995);
}

#[test]
fn perft_divide_matches_plain_count() {
    let mut pos = startpos();
    let divided = perft(&mut pos, 2);
    let counted = perft_count(&mut pos, 2);
    assert_eq!(divided, counted);
}

#[test]
fn perft_leaves_the_position_untouched() {
    let mut pos = startpos();
    let fen_before = pos.to_fen();
    let key_before = pos.key();
    perft_count(&mut pos, 3);
    assert_eq!(pos.to_fen(), fen_before);
    assert_eq!(pos.key(), key_before);
    assert!(pos.validate().is_ok());
}
