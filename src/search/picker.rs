//! Staged move picker. Moves come out in the order hash move, winning-ish
//! captures by MVV-LVA, killers, then history-ordered quiets; each stage is
//! generated only if the previous ones failed to cut off.

use crate::board::{piece_value, PieceType, Position, Value, MG};
use crate::moves::movegen::{generate, GenType, MoveList, MAX_MOVES};
use crate::moves::types::Move;
use crate::search::context::HistoryTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Table,
    GenerateNoisy,
    Noisy,
    Killer1,
    Killer2,
    GenerateQuiet,
    Quiet,
    Done,
}

/// Small per-type offsets subtracted from the victim's value so that among
/// equal victims the cheaper aggressor moves first.
const LVA_OFFSET: [Value; 7] = [7, 3, 6, 2, 5, 4, 8];

pub struct MovePicker {
    skip_quiets: bool,
    stage: Stage,
    split: usize,
    noisy_size: usize,
    quiet_size: usize,
    table_move: Move,
    killer1: Move,
    killer2: Move,
    moves: [Move; MAX_MOVES],
    values: [Value; MAX_MOVES],
}

impl MovePicker {
    /// `skip_quiets` puts the picker into quiescence mode: captures only.
    /// Killers equal to the table move are dropped up front.
    pub fn new(skip_quiets: bool, table_move: Move, killer1: Move, killer2: Move) -> MovePicker {
        MovePicker {
            skip_quiets,
            stage: Stage::Table,
            split: 0,
            noisy_size: 0,
            quiet_size: 0,
            table_move,
            killer1: if killer1 == table_move { Move::NONE } else { killer1 },
            killer2: if killer2 == table_move { Move::NONE } else { killer2 },
            moves: [Move::NONE; MAX_MOVES],
            values: [0; MAX_MOVES],
        }
    }

    fn score_noisy(&mut self, pos: &Position) {
        for i in 0..self.noisy_size {
            let m = self.moves[i];
            let victim = pos.piece_on(m.to_sq());
            let aggressor = pos.moved_piece(m).type_of();
            self.values[i] =
                piece_value(MG, victim) - LVA_OFFSET[aggressor.index() - 1];
        }
    }

    fn score_quiet(&mut self, pos: &Position, history: &HistoryTable) {
        for i in self.split..self.split + self.quiet_size {
            self.values[i] = history.get(pos.side_to_move(), self.moves[i]);
        }
    }

    /// Selection-sort pop: swap the best remaining entry of
    /// `[start, start+len)` to the back and shrink the window.
    fn take_best(&mut self, start: usize, len: usize) -> Move {
        let mut best = start;
        for i in start + 1..start + len {
            if self.values[i] > self.values[best] {
                best = i;
            }
        }
        let m = self.moves[best];
        let last = start + len - 1;
        self.moves[best] = self.moves[last];
        self.values[best] = self.values[last];
        m
    }

    /// Yields the next candidate move, or `Move::NONE` when exhausted.
    /// Candidates are pseudo-legal; the caller still filters with `legal`.
    pub fn next(&mut self, pos: &Position, history: &HistoryTable) -> Move {
        loop {
            match self.stage {
                Stage::Table => {
                    self.stage = Stage::GenerateNoisy;
                    if self.table_move != Move::NONE && pos.pseudo_legal(self.table_move) {
                        return self.table_move;
                    }
                }

                Stage::GenerateNoisy => {
                    let mut list = MoveList::new();
                    generate(pos, GenType::Captures, &mut list);
                    self.noisy_size = list.len();
                    self.moves[..list.len()].copy_from_slice(&list);
                    self.score_noisy(pos);
                    self.split = self.noisy_size;
                    self.stage = Stage::Noisy;
                }

                Stage::Noisy => {
                    if self.noisy_size == 0 {
                        if self.skip_quiets {
                            self.stage = Stage::Done;
                        } else {
                            self.stage = Stage::Killer1;
                        }
                        continue;
                    }
                    self.noisy_size -= 1;
                    let m = self.take_best(0, self.noisy_size + 1);
                    if m == self.table_move {
                        continue;
                    }
                    // A killer that turns out to be a capture must not be
                    // replayed in the killer stages.
                    if m == self.killer1 {
                        self.killer1 = Move::NONE;
                    }
                    if m == self.killer2 {
                        self.killer2 = Move::NONE;
                    }
                    return m;
                }

                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    if self.killer1.is_ok() && pos.pseudo_legal(self.killer1) {
                        return self.killer1;
                    }
                }

                Stage::Killer2 => {
                    self.stage = Stage::GenerateQuiet;
                    if self.killer2.is_ok() && pos.pseudo_legal(self.killer2) {
                        return self.killer2;
                    }
                }

                Stage::GenerateQuiet => {
                    let mut list = MoveList::new();
                    generate(pos, GenType::Quiets, &mut list);
                    self.quiet_size = list.len();
                    self.moves[self.split..self.split + list.len()].copy_from_slice(&list);
                    self.score_quiet(pos, history);
                    self.stage = Stage::Quiet;
                }

                Stage::Quiet => {
                    if self.quiet_size == 0 {
                        self.stage = Stage::Done;
                        continue;
                    }
                    self.quiet_size -= 1;
                    let m = self.take_best(self.split, self.quiet_size + 1);
                    if m == self.table_move || m == self.killer1 || m == self.killer2 {
                        continue;
                    }
                    return m;
                }

                Stage::Done => return Move::NONE,
            }
        }
    }
}

/// Convenience for quiescence: captures only, no table move.
pub fn captures_picker() -> MovePicker {
    MovePicker::new(true, Move::NONE, Move::NONE, Move::NONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::movegen::generate_legal;
    use std::collections::HashSet;

    #[test]
    fn picker_yields_every_legal_move_exactly_once() {
        let pos = Position::startpos();
        let history = HistoryTable::new();
        let mut picker = MovePicker::new(false, Move::NONE, Move::NONE, Move::NONE);

        let mut seen = HashSet::new();
        loop {
            let m = picker.next(&pos, &history);
            if m == Move::NONE {
                break;
            }
            assert!(seen.insert(m), "duplicate move {m}");
        }
        let picked_legal: HashSet<Move> =
            seen.iter().copied().filter(|m| pos.legal(*m)).collect();

        let mut legal = MoveList::new();
        generate_legal(&pos, &mut legal);
        let legal: HashSet<Move> = legal.iter().copied().collect();
        assert_eq!(picked_legal, legal);
    }

    #[test]
    fn table_move_comes_first_then_captures() {
        let pos = Position::from_fen(
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/4R4/P1P1P1P1P/1C5C1/9/1NBAKABNR w - - 0 1",
        )
        .unwrap();
        let history = HistoryTable::new();
        let table_move = pos.parse_move("e4e6").unwrap();
        let mut picker = MovePicker::new(false, table_move, Move::NONE, Move::NONE);
        assert_eq!(picker.next(&pos, &history), table_move);

        // Everything after the hash move starts with captures.
        let second = picker.next(&pos, &history);
        assert!(pos.is_capture(second), "expected a capture, got {second}");
    }

    #[test]
    fn quiescence_mode_stops_after_captures() {
        let pos = Position::from_fen(
            "rnbakabnr/9/1c5c1/p1p1p1p1p/9/4R4/P1P1P1P1P/1C5C1/9/1NBAKABNR w - - 0 1",
        )
        .unwrap();
        let history = HistoryTable::new();
        let mut picker = captures_picker();
        loop {
            let m = picker.next(&pos, &history);
            if m == Move::NONE {
                break;
            }
            assert!(pos.is_capture(m), "quiescence picker yielded quiet {m}");
        }
    }

    #[test]
    fn killers_follow_captures_and_precede_quiets() {
        let pos = Position::startpos();
        let history = HistoryTable::new();
        let killer = pos.parse_move("b0c2").unwrap();
        let mut picker = MovePicker::new(false, Move::NONE, killer, Move::NONE);
        // No captures from the start position, so the killer leads.
        assert_eq!(picker.next(&pos, &history), killer);
        // And it is not repeated later.
        let mut rest = Vec::new();
        loop {
            let m = picker.next(&pos, &history);
            if m == Move::NONE {
                break;
            }
            rest.push(m);
        }
        assert!(!rest.contains(&killer));
    }
}
