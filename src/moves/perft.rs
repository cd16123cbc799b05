use crate::board::Position;
use crate::moves::movegen::{generate_legal, MoveList};
use tracing::{debug, instrument};

fn perft_inner(pos: &mut Position, depth: u32) -> u64 {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    if depth <= 1 {
        return list.len() as u64;
    }
    let mut nodes = 0;
    for &m in list.iter() {
        pos.do_move(m);
        nodes += perft_inner(pos, depth - 1);
        pos.undo_move(m);
    }
    nodes
}

/// Counts the legal-move tree to `depth`. The root call prints each root
/// move with its subtree count, then the total.
#[instrument(skip(pos))]
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);

    let mut total = 0;
    for &m in list.iter() {
        let nodes = if depth <= 1 {
            1
        } else {
            pos.do_move(m);
            let n = perft_inner(pos, depth - 1);
            pos.undo_move(m);
            n
        };
        println!("{}: {}", m, nodes);
        total += nodes;
    }
    println!("Total: {}", total);
    debug!(depth, total, "perft finished");
    total
}

/// Counting-only variant for tests and benchmarks; no output.
pub fn perft_count(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    perft_inner(pos, depth)
}
