use crate::board::{
    mated_in, piece_value, Piece, PieceType, Position, Value, MG, VALUE_DRAW, VALUE_INFINITE,
    VALUE_MATE,
};
use crate::moves::types::Move;
use crate::output::SearchInfo;
use crate::search::context::{SearchContext, MAX_PLY};
use crate::search::eval::evaluate;
use crate::search::picker::{captures_picker, MovePicker};
use crate::search::see::SeeExt;
use crate::search::tt::{TranspositionTable, FLAG_ALPHA, FLAG_BETA, FLAG_EXACT, MATE_SCORE, NO_HASH};
use crate::square::Color;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

// Tuning constants; empirical, from the reference engine family.
const ASPIRATION_BASE: Value = 40;
const ASPIRATION_PER_DEPTH: Value = 15;
const RFP_DEPTH_LIMIT: i32 = 5;
const RFP_FAIL_LOW_MARGIN: Value = 125;
const RFP_FAIL_HIGH_MARGIN: Value = 200;
const NULL_MOVE_REDUCTION: i32 = 3;
const LMR_MIN_MOVES: i32 = 3;
const LMR_MIN_DEPTH: i32 = 2;

fn pawn_mg() -> Value {
    piece_value(MG, Piece::make(Color::White, PieceType::Pawn))
}

fn futility_margin(depth: i32) -> Value {
    match depth {
        1 => piece_value(MG, Piece::make(Color::White, PieceType::Pawn)),
        2 => piece_value(MG, Piece::make(Color::White, PieceType::Knight)),
        _ => piece_value(MG, Piece::make(Color::White, PieceType::Cannon)),
    }
}

/// Depth/time bounds for one search call. The stop flag may be shared with
/// another thread; the search polls it and honors it between deepening
/// iterations and inside the tree.
#[derive(Clone)]
pub struct SearchLimits {
    pub depth: u8,
    pub movetime: Option<Duration>,
    pub stop: Arc<AtomicBool>,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> SearchLimits {
        SearchLimits {
            depth,
            movetime: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Outcome of a search: the best move and score of the last fully
/// completed iteration, plus its principal variation.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_move: Move,
    pub score: Value,
    pub depth: u8,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

pub struct Searcher {
    pub tt: TranspositionTable,
    ctx: SearchContext,
    limits: SearchLimits,
    start: Instant,
    stopped: bool,
}

impl Searcher {
    pub fn new(tt_megabytes: usize) -> Searcher {
        Searcher {
            tt: TranspositionTable::new(tt_megabytes),
            ctx: SearchContext::new(),
            limits: SearchLimits::depth(1),
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Iterative deepening. Each depth beyond 2 opens an aspiration window
    /// around the previous score and re-searches full-width when the
    /// result lands outside it.
    pub fn search(&mut self, pos: &mut Position, limits: SearchLimits) -> SearchReport {
        self.limits = limits;
        self.start = Instant::now();
        self.stopped = false;
        self.ctx.clear();
        self.tt.new_search();
        pos.game_ply = 0;
        pos.nodes = 0;

        let mut report = SearchReport {
            best_move: Move::NONE,
            score: VALUE_DRAW,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };
        let mut prev_score: Value = VALUE_DRAW;

        for depth in 1..=self.limits.depth.max(1) {
            let (mut alpha, mut beta) = (-VALUE_INFINITE, VALUE_INFINITE);
            if depth > 2 {
                let window = ASPIRATION_BASE + ASPIRATION_PER_DEPTH * depth as Value;
                alpha = (prev_score - window).max(-VALUE_INFINITE);
                beta = (prev_score + window).min(VALUE_INFINITE);
            }
            let mut score = self.negamax(pos, alpha, beta, depth as i32, true);
            if !self.stopped && depth > 2 && (score <= alpha || score >= beta) {
                score = self.negamax(pos, -VALUE_INFINITE, VALUE_INFINITE, depth as i32, true);
            }
            if self.stopped {
                // Partial iterations are discarded; the last completed
                // depth's PV stands.
                break;
            }
            prev_score = score;
            report = SearchReport {
                best_move: self.ctx.root_move(),
                score,
                depth,
                nodes: pos.nodes,
                pv: self.ctx.pv_line(),
            };

            let info = SearchInfo {
                depth,
                score,
                nodes: pos.nodes,
                elapsed: self.start.elapsed(),
                pv: report.pv.clone(),
            };
            println!("{}", info);
            debug!(depth, score, nodes = pos.nodes, "iteration complete");

            if self.should_stop() {
                break;
            }
        }
        report
    }

    fn should_stop(&self) -> bool {
        if self.limits.stop.load(Ordering::Relaxed) {
            return true;
        }
        if let Some(limit) = self.limits.movetime {
            return self.start.elapsed() >= limit;
        }
        false
    }

    #[inline]
    fn poll(&mut self, nodes: u64) {
        if nodes & 1023 == 0 && self.should_stop() {
            self.stopped = true;
        }
    }

    fn negamax(
        &mut self,
        pos: &mut Position,
        mut alpha: Value,
        mut beta: Value,
        mut depth: i32,
        allow_null: bool,
    ) -> Value {
        let ply = pos.game_ply;
        let root = ply == 0;
        let pv_node = alpha != beta - 1;

        self.ctx.reset_pv_length(ply as usize);
        self.poll(pos.nodes);
        if self.stopped {
            return VALUE_DRAW;
        }
        if pos.is_draw() {
            return VALUE_DRAW;
        }
        if ply as usize >= MAX_PLY - 2 {
            return evaluate(pos);
        }

        let mut tt_move = Move::NONE;
        if !root {
            let (tt_score, mv) =
                self.tt
                    .probe(pos.key(), depth.max(0) as u8, alpha, beta, ply);
            tt_move = mv;
            if tt_score != NO_HASH && !pv_node {
                return tt_score;
            }
        }

        // Inside the tree, steering into an already-seen position is
        // usually a concession; nudge the search away from it.
        if !root && pos.has_repeated() {
            return -piece_value(MG, Piece::make(Color::White, PieceType::Cannon));
        }

        if depth <= 0 {
            return self.quiescence(pos, alpha, beta);
        }

        // Mate-distance pruning.
        alpha = alpha.max(mated_in(ply));
        beta = beta.min(VALUE_MATE - ply);
        if alpha >= beta {
            return alpha;
        }

        let in_check = pos.in_check();
        if in_check {
            depth += 1;
        }

        let mut futility_pruning = false;
        if !pv_node && !in_check {
            let static_eval = evaluate(pos);

            // Reverse futility: a static eval far outside the window at
            // shallow depth is trusted as-is.
            if depth <= RFP_DEPTH_LIMIT && !root && beta > -1000 && alpha < 1000 {
                if static_eval + depth * RFP_FAIL_LOW_MARGIN <= alpha {
                    return static_eval;
                }
                if static_eval - depth * RFP_FAIL_HIGH_MARGIN >= beta {
                    return static_eval;
                }
            }

            if allow_null {
                // Null move: hand over the turn; if the reduced search
                // still clears beta, the position is too good.
                if !root && depth > 2 && static_eval >= beta {
                    pos.do_null_move();
                    let score =
                        -self.negamax(pos, -beta, -beta + 1, depth - NULL_MOVE_REDUCTION, false);
                    pos.undo_null_move();
                    if self.stopped {
                        return VALUE_DRAW;
                    }
                    if score >= beta {
                        return beta;
                    }
                }

                // Razoring: hopeless-looking shallow nodes drop straight
                // into quiescence.
                let mut razor = static_eval + pawn_mg();
                if razor < beta && depth == 1 {
                    let q = self.quiescence(pos, alpha, beta);
                    return q.max(razor);
                }
                razor += pawn_mg();
                if razor < beta && depth < 4 {
                    let q = self.quiescence(pos, alpha, beta);
                    if q < beta {
                        return q.max(razor);
                    }
                }
            }

            if depth < 4
                && alpha.abs() < MATE_SCORE
                && static_eval + futility_margin(depth) <= alpha
            {
                futility_pruning = true;
            }
        }

        let killer1 = self.ctx.killer(ply as usize, 0);
        let killer2 = self.ctx.killer(ply as usize, 1);
        let mut picker = MovePicker::new(false, tt_move, killer1, killer2);

        let mut hash_flag = FLAG_ALPHA;
        let mut best_move = Move::NONE;
        let mut legal_moves = 0;
        let mut moves_searched = 0;

        loop {
            let m = picker.next(pos, &self.ctx.history);
            if m == Move::NONE {
                break;
            }
            if !pos.legal(m) {
                continue;
            }
            legal_moves += 1;

            let is_capture = pos.is_capture(m);
            let gives_check = pos.gives_check(m);

            if futility_pruning && moves_searched > 0 && !is_capture && !gives_check {
                continue;
            }

            pos.do_move_gc(m, gives_check);
            let mut score;
            if depth < 5 || moves_searched == 0 {
                score = -self.negamax(pos, -beta, -alpha, depth - 1, true);
            } else {
                // Late move reduction for quiet non-killers once the first
                // few moves are behind us.
                if !pv_node
                    && moves_searched > LMR_MIN_MOVES
                    && depth > LMR_MIN_DEPTH
                    && !in_check
                    && !is_capture
                    && m != killer1
                    && m != killer2
                {
                    score = -self.negamax(pos, -alpha - 1, -alpha, depth - 2, true);
                } else {
                    score = alpha + 1;
                }
                // PVS re-searches: null window first, full window only if
                // the move really improves inside the bounds.
                if score > alpha {
                    score = -self.negamax(pos, -alpha - 1, -alpha, depth - 1, true);
                    if score > alpha && score < beta {
                        score = -self.negamax(pos, -beta, -alpha, depth - 1, true);
                    }
                }
            }
            pos.undo_move(m);
            if self.stopped {
                return VALUE_DRAW;
            }
            moves_searched += 1;

            if score > alpha {
                hash_flag = FLAG_EXACT;
                best_move = m;
                alpha = score;
                self.ctx.store_pv(m, ply as usize);

                if !is_capture {
                    self.ctx.history.add(pos.side_to_move(), m, depth);
                }
                if score >= beta {
                    self.tt
                        .save(pos.key(), beta, FLAG_BETA, ply, depth.max(0) as u8, best_move);
                    if !is_capture {
                        self.ctx.store_killer(ply as usize, m);
                    }
                    return beta;
                }
            }
        }

        // No legal move: checkmate, or stalemate, which Xiangqi also
        // scores as a loss for the side to move.
        if legal_moves == 0 {
            return mated_in(ply);
        }

        self.tt
            .save(pos.key(), alpha, hash_flag, ply, depth.max(0) as u8, best_move);
        alpha
    }

    fn quiescence(&mut self, pos: &mut Position, mut alpha: Value, beta: Value) -> Value {
        let ply = pos.game_ply;
        self.ctx.reset_pv_length(ply as usize);
        self.poll(pos.nodes);
        if self.stopped {
            return VALUE_DRAW;
        }

        let stand_pat = evaluate(pos);
        if ply as usize >= MAX_PLY - 2 {
            return stand_pat;
        }
        if stand_pat >= beta {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut picker = captures_picker();
        loop {
            let m = picker.next(pos, &self.ctx.history);
            if m == Move::NONE {
                break;
            }
            if !pos.legal(m) {
                continue;
            }
            // Skip captures that lose material outright.
            if !pos.see_ge(m, 0) {
                continue;
            }
            pos.do_move(m);
            let score = -self.quiescence(pos, -beta, -alpha);
            pos.undo_move(m);
            if self.stopped {
                return VALUE_DRAW;
            }

            if score > alpha {
                self.ctx.store_pv(m, ply as usize);
                alpha = score;
                if score >= beta {
                    return score;
                }
            }
        }
        alpha
    }
}
