use crate::bitboard::{square_bb, Bitboard};
use crate::board::{PieceType, Position};
use crate::moves::magic::tables;
use crate::moves::types::Move;
use crate::square::{Color, Square};
use arrayvec::ArrayVec;

/// Upper bound on the number of moves in any Xiangqi position.
pub const MAX_MOVES: usize = 128;

pub type MoveList = ArrayVec<Move, MAX_MOVES>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    /// All pseudo-legal captures.
    Captures,
    /// All pseudo-legal non-captures.
    Quiets,
    /// Pseudo-legal non-captures that give check.
    QuietChecks,
    /// Check evasions; only meaningful when the side to move is in check.
    Evasions,
    /// Captures and non-captures, unfiltered.
    PseudoLegal,
    /// Fully legal moves.
    Legal,
}

#[inline]
fn push_all(from: Square, mut targets: Bitboard, list: &mut MoveList) {
    while targets.any() {
        list.push(Move::make(from, targets.pop_lsb()));
    }
}

/// Generates moves for every piece of type `pt` of side `us` into `list`,
/// restricted to `target`. Kings are handled separately by `generate_all`.
fn generate_for_piece(
    pos: &Position,
    us: Color,
    pt: PieceType,
    kind: GenType,
    target: Bitboard,
    list: &mut MoveList,
) {
    let t = tables();
    let all = pos.all_pieces();
    let mut from_bb = pos.pieces(us, pt);
    while from_bb.any() {
        let from = from_bb.pop_lsb();
        let mut b = match pt {
            PieceType::Cannon => {
                // Captures jump a screen; quiets slide like a rook.
                let mut b = Bitboard::EMPTY;
                if kind != GenType::Quiets && kind != GenType::QuietChecks {
                    b |= t.attacks(PieceType::Cannon, from, all) & pos.color_pieces(!us);
                }
                if kind != GenType::Captures {
                    b |= t.attacks(PieceType::Rook, from, all) & !all;
                }
                if kind == GenType::Evasions {
                    b &= target;
                }
                b
            }
            PieceType::Pawn => t.pawn_attacks(us, from) & target,
            _ => t.attacks(pt, from, all) & target,
        };

        // A quiet check is either a direct check or a discovery by a
        // blocker stepping off the king line.
        if kind == GenType::QuietChecks {
            let oksq = pos.king_sq(!us);
            if pt == PieceType::Cannon {
                b &= !t.line(from, oksq) & pos.check_squares(pt);
            } else if (pos.blockers_for_king(!us) & square_bb(from)).any() {
                b &= !t.line(from, oksq);
            } else {
                b &= pos.check_squares(pt);
            }
        }
        push_all(from, b, list);
    }
}

fn generate_without_king(
    pos: &Position,
    us: Color,
    kind: GenType,
    target: Bitboard,
    list: &mut MoveList,
) {
    for pt in [
        PieceType::Rook,
        PieceType::Advisor,
        PieceType::Cannon,
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
    ] {
        generate_for_piece(pos, us, pt, kind, target, list);
    }
}

fn generate_all(pos: &Position, us: Color, kind: GenType, list: &mut MoveList) {
    let t = tables();
    let ksq = pos.king_sq(us);
    let target = match kind {
        GenType::PseudoLegal => !pos.color_pieces(us),
        GenType::Captures => pos.color_pieces(!us),
        _ => !pos.all_pieces(), // Quiets and QuietChecks
    };
    generate_without_king(pos, us, kind, target, list);

    // King moves. For quiet checks the king can only check by discovery,
    // which requires it to be shielding the other king on a shared line.
    if kind != GenType::Evasions
        && (kind != GenType::QuietChecks
            || (pos.blockers_for_king(!us) & square_bb(ksq)).any())
    {
        let mut b = t.pseudo_attacks(PieceType::King, ksq) & target;
        if kind == GenType::QuietChecks {
            b &= t.pseudo_attacks(PieceType::Rook, pos.king_sq(!us));
        }
        push_all(ksq, b, list);
    }
}

/// Evasions from a single checker: king steps off the attacked line, the
/// cannon's screen runs away, or a piece blocks/captures. Double check
/// falls back to unfiltered generation (only king moves survive `legal`).
fn generate_evasions(pos: &Position, list: &mut MoveList) {
    if pos.checkers().more_than_one() {
        generate(pos, GenType::PseudoLegal, list);
        return;
    }
    let t = tables();
    let us = pos.side_to_move();
    let ksq = pos.king_sq(us);
    let checksq = pos.checkers().lsb();
    let checker_pt = pos.piece_on(checksq).type_of();
    let all = pos.all_pieces();

    // King evasions, skipping squares still covered along a slider's ray.
    let mut b = t.pseudo_attacks(PieceType::King, ksq) & !pos.color_pieces(us);
    if checker_pt == PieceType::Rook || checker_pt == PieceType::Cannon {
        b &= !t.line(checksq, ksq) | pos.color_pieces(!us);
    }
    push_all(ksq, b, list);

    // A cannon check dies when its screen leaves the line.
    if checker_pt == PieceType::Cannon {
        let mut hurdle = t.between(ksq, checksq) & pos.color_pieces(us);
        if hurdle.any() {
            let hurdle_sq = hurdle.pop_lsb();
            let off_line = !t.line(checksq, hurdle_sq);
            let b = match pos.piece_on(hurdle_sq).type_of() {
                PieceType::Pawn => {
                    t.pawn_attacks(us, hurdle_sq) & off_line & !pos.color_pieces(us)
                }
                PieceType::Cannon => {
                    (t.attacks(PieceType::Rook, hurdle_sq, all) & off_line & !all)
                        | (t.attacks(PieceType::Cannon, hurdle_sq, all)
                            & pos.color_pieces(!us))
                }
                pt => t.attacks(pt, hurdle_sq, all) & off_line & !pos.color_pieces(us),
            };
            push_all(hurdle_sq, b, list);
        }
    }

    // Block the ray or capture the checker. `between` includes the checker
    // square, and for a knight checker its leg.
    let target = t.between(ksq, checksq) & !pos.color_pieces(us);
    generate_without_king(pos, us, GenType::Evasions, target, list);
}

/// Fills `list` with moves of the requested kind for the side to move.
pub fn generate(pos: &Position, kind: GenType, list: &mut MoveList) {
    match kind {
        GenType::Evasions => generate_evasions(pos, list),
        GenType::Legal => generate_legal(pos, list),
        _ => generate_all(pos, pos.side_to_move(), kind, list),
    }
}

/// All legal moves: evasions when checked, otherwise every pseudo-legal
/// move, filtered through `Position::legal`.
pub fn generate_legal(pos: &Position, list: &mut MoveList) {
    if pos.in_check() {
        generate_evasions(pos, list);
    } else {
        generate(pos, GenType::PseudoLegal, list);
    }
    list.retain(|m| pos.legal(*m));
}

pub fn has_legal_moves(pos: &Position) -> bool {
    let mut list = MoveList::new();
    generate_legal(pos, &mut list);
    !list.is_empty()
}
