//! Static exchange evaluation with Xiangqi semantics: cannons need their
//! attack set recomputed every time a piece leaves the target ray, and two
//! kings facing each other across the emptied square count as attackers.

use crate::bitboard::{square_bb, Bitboard};
use crate::board::{piece_value, Piece, PieceType, Position, Value, MG};
use crate::moves::magic::tables;
use crate::moves::types::Move;
use crate::square::Color;

pub trait SeeExt {
    /// True when the exchange starting with `m` nets at least `threshold`.
    fn see_ge(&self, m: Move, threshold: Value) -> bool;
}

impl SeeExt for Position {
    fn see_ge(&self, m: Move, threshold: Value) -> bool {
        let t = tables();
        let from = m.from_sq();
        let to = m.to_sq();

        let mut swap = piece_value(MG, self.piece_on(to)) - threshold;
        if swap < 0 {
            return false;
        }
        swap = piece_value(MG, self.piece_on(from)) - swap;
        if swap <= 0 {
            return true;
        }

        // Clearing `to` as well matters for the pinned-piece logic below.
        let mut occupied = self.all_pieces() ^ square_bb(from) ^ square_bb(to);
        let mut stm = self.side_to_move();
        let mut attackers = self.attackers_to(to, occupied);

        // Flying general: once a king joins the exchange, the opposing
        // king on the same emptied file joins too.
        let rookless = |occ: Bitboard| occ & !self.pieces_of(PieceType::Rook);
        if (attackers & self.pieces(stm, PieceType::King)).any() {
            attackers |= t.attacks(PieceType::Rook, to, rookless(occupied))
                & self.pieces(!stm, PieceType::King);
        }
        if (attackers & self.pieces(!stm, PieceType::King)).any() {
            attackers |= t.attacks(PieceType::Rook, to, rookless(occupied))
                & self.pieces(stm, PieceType::King);
        }

        let all_cannons = self.pieces_of(PieceType::Cannon);
        let mut non_cannons = attackers & !all_cannons;
        let mut cannons = attackers & all_cannons;
        let mut res: Value = 1;

        // Cheapest-first capture order for the swap loop.
        const ORDER: [PieceType; 6] = [
            PieceType::Pawn,
            PieceType::Advisor,
            PieceType::Bishop,
            PieceType::Cannon,
            PieceType::Knight,
            PieceType::Rook,
        ];

        loop {
            stm = !stm;
            attackers &= occupied;

            let mut stm_attackers = attackers & self.color_pieces(stm);
            if stm_attackers.is_empty() {
                break;
            }
            // Pinned pieces stay out of the exchange while their pinners
            // still stand.
            if (self.pinners(!stm) & occupied).any() {
                stm_attackers &= !self.blockers_for_king(stm);
                if stm_attackers.is_empty() {
                    break;
                }
            }
            res ^= 1;

            let least = ORDER.iter().copied().find_map(|pt| {
                let bb = stm_attackers & self.pieces_of(pt);
                if bb.any() { Some((pt, bb)) } else { None }
            });

            match least {
                Some((pt, bb)) => {
                    occupied ^= bb.lsb_bb();
                    swap = piece_value(MG, Piece::make(Color::White, pt)) - swap;
                    if swap < res {
                        break;
                    }
                    // Removing the attacker can uncover sliders behind it;
                    // refresh exactly the sets the removal can change.
                    match pt {
                        PieceType::Pawn | PieceType::Rook => {
                            non_cannons |= t.attacks(PieceType::Rook, to, occupied)
                                & self.pieces_of(PieceType::Rook);
                            cannons = t.attacks(PieceType::Cannon, to, occupied) & all_cannons;
                            attackers = non_cannons | cannons;
                        }
                        PieceType::Advisor => {
                            non_cannons |= t.attacks(PieceType::KnightTo, to, occupied)
                                & self.pieces_of(PieceType::Knight);
                            attackers = non_cannons | cannons;
                        }
                        PieceType::Cannon => {
                            cannons = t.attacks(PieceType::Cannon, to, occupied) & all_cannons;
                            attackers = non_cannons | cannons;
                        }
                        _ => {}
                    }
                }
                None => {
                    // Only the king is left. If the opponent still covers
                    // the square the king may not actually take, and the
                    // result flips back.
                    return if (attackers & !self.color_pieces(stm)).any() {
                        res ^ 1 != 0
                    } else {
                        res != 0
                    };
                }
            }
        }
        res != 0
    }
}
