use hongpao::board::{Position, START_FEN};
use hongpao::logger::init_logging;
use hongpao::moves::magic::tables;
use hongpao::moves::perft::perft;
use hongpao::search::eval::evaluate;
use hongpao::search::{SearchLimits, Searcher};
use hongpao::search::tt::TranspositionTable;
use std::io::{self, BufRead};
use std::time::Duration;

fn main() {
    init_logging("logs/hongpao.log", "hongpao=debug");
    // Build the attack tables up front so the first "go" is not slowed by
    // initialization.
    let _ = tables();

    let mut pos = Position::startpos();
    let mut searcher = Searcher::new(TranspositionTable::DEFAULT_MB);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l.trim().to_string(),
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts[0] {
            "ucci" => {
                println!("id name hongpao {}", env!("CARGO_PKG_VERSION"));
                println!("id author hongpao contributors");
                println!("ucciok");
            }
            "isready" => println!("readyok"),
            "setoption" => {}
            "position" => {
                if let Some(new_pos) = handle_position(&parts) {
                    pos = new_pos;
                }
            }
            "go" => handle_go(&parts, &mut pos, &mut searcher),
            "perft" => {
                let depth = parts.get(1).and_then(|d| d.parse().ok()).unwrap_or(1);
                perft(&mut pos, depth);
            }
            "d" | "display" => print!("{}", pos),
            "eval" => println!("eval {}", evaluate(&pos)),
            "fen" => println!("{}", pos.to_fen()),
            "quit" => break,
            other => eprintln!("unknown command: {}", other),
        }
    }
}

fn handle_position(parts: &[&str]) -> Option<Position> {
    let moves_idx = parts.iter().position(|&p| p == "moves");
    let mut pos = match parts.get(1) {
        Some(&"startpos") => Position::startpos(),
        Some(&"fen") => {
            let end = moves_idx.unwrap_or(parts.len());
            let fen = parts[2..end].join(" ");
            match Position::from_fen(&fen) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("bad fen: {}", e);
                    return None;
                }
            }
        }
        _ => Position::from_fen(START_FEN).ok()?,
    };

    if let Some(idx) = moves_idx {
        for move_str in &parts[idx + 1..] {
            match pos.parse_move(move_str) {
                Ok(m) => pos.do_move(m),
                Err(e) => {
                    eprintln!("bad move: {}", e);
                    return None;
                }
            }
        }
    }
    Some(pos)
}

fn handle_go(parts: &[&str], pos: &mut Position, searcher: &mut Searcher) {
    let mut limits = SearchLimits::depth(6);
    let mut i = 1;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if let Some(d) = parts.get(i + 1).and_then(|d| d.parse().ok()) {
                    limits.depth = d;
                }
                i += 2;
            }
            "movetime" => {
                if let Some(ms) = parts.get(i + 1).and_then(|d| d.parse().ok()) {
                    limits.movetime = Some(Duration::from_millis(ms));
                    limits.depth = limits.depth.max(64);
                }
                i += 2;
            }
            _ => i += 1,
        }
    }

    let report = searcher.search(pos, limits);
    println!("bestmove {}", report.best_move);
}
