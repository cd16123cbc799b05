//! Precomputed attack tables. Everything here is built once on first use
//! from a fixed seed and is immutable afterwards.

pub mod attacks;
pub mod search;
pub mod structs;

use crate::bitboard::{square_bb, Bitboard, PALACE};
use crate::board::{PieceType, PIECE_TYPE_NB};
use crate::moves::magic::attacks::{
    lame_leaper_path_dir, pawn_attacks_bb, pawn_attacks_to_bb, sliding_attack, step_attacks,
    ADVISOR_STEPS, KING_STEPS,
};
use crate::moves::magic::structs::{init_magics, PieceMagics};
use crate::square::{Color, Square, COLOR_NB, SQUARE_NB};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::debug;

/// Seed for the magic-number search; fixed so every run builds identical
/// tables.
const MAGIC_SEED: u64 = 0x0010_7037_2000;

pub struct AttackTables {
    rook: PieceMagics,
    cannon: PieceMagics,
    knight: PieceMagics,
    knight_to: PieceMagics,
    elephant: PieceMagics,

    /// Attacks on an empty board, plus the palace step sets for king and
    /// advisor. Indexed by piece-type index; pawn entry unused.
    pseudo: Vec<[Bitboard; SQUARE_NB]>,
    pawn_attacks: [[Bitboard; SQUARE_NB]; COLOR_NB],
    pawn_attacks_to: [[Bitboard; SQUARE_NB]; COLOR_NB],

    line: Vec<[Bitboard; SQUARE_NB]>,
    between: Vec<[Bitboard; SQUARE_NB]>,
    distance: Vec<[u8; SQUARE_NB]>,
}

impl AttackTables {
    fn new() -> AttackTables {
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
        let rook = init_magics(PieceType::Rook, &mut rng);
        let cannon = init_magics(PieceType::Cannon, &mut rng);
        let elephant = init_magics(PieceType::Bishop, &mut rng);
        let knight = init_magics(PieceType::Knight, &mut rng);
        let knight_to = init_magics(PieceType::KnightTo, &mut rng);

        let mut pseudo = vec![[Bitboard::EMPTY; SQUARE_NB]; PIECE_TYPE_NB];
        let mut pawn_attacks = [[Bitboard::EMPTY; SQUARE_NB]; COLOR_NB];
        let mut pawn_attacks_to = [[Bitboard::EMPTY; SQUARE_NB]; COLOR_NB];
        let mut line = vec![[Bitboard::EMPTY; SQUARE_NB]; SQUARE_NB];
        let mut between = vec![[Bitboard::EMPTY; SQUARE_NB]; SQUARE_NB];
        let mut distance = vec![[0u8; SQUARE_NB]; SQUARE_NB];

        for i in 0..SQUARE_NB as u8 {
            let s1 = Square(i);
            pawn_attacks[Color::White.index()][s1.index()] =
                pawn_attacks_bb(Color::White, s1);
            pawn_attacks[Color::Black.index()][s1.index()] =
                pawn_attacks_bb(Color::Black, s1);
            pawn_attacks_to[Color::White.index()][s1.index()] =
                pawn_attacks_to_bb(Color::White, s1);
            pawn_attacks_to[Color::Black.index()][s1.index()] =
                pawn_attacks_to_bb(Color::Black, s1);

            pseudo[PieceType::Rook.index()][s1.index()] =
                sliding_attack(s1, Bitboard::EMPTY, PieceType::Rook);
            pseudo[PieceType::Bishop.index()][s1.index()] =
                elephant.get_attacks(s1, Bitboard::EMPTY);
            pseudo[PieceType::Knight.index()][s1.index()] =
                knight.get_attacks(s1, Bitboard::EMPTY);

            if PALACE.contains(s1) {
                pseudo[PieceType::King.index()][s1.index()] =
                    step_attacks(s1, &KING_STEPS) & PALACE;
                pseudo[PieceType::Advisor.index()][s1.index()] =
                    step_attacks(s1, &ADVISOR_STEPS) & PALACE;
            }
        }

        for i in 0..SQUARE_NB as u8 {
            let s1 = Square(i);
            let rook_pseudo = pseudo[PieceType::Rook.index()][s1.index()];
            let knight_pseudo = pseudo[PieceType::Knight.index()][s1.index()];
            for j in 0..SQUARE_NB as u8 {
                let s2 = Square(j);
                distance[s1.index()][s2.index()] = s1.distance(s2);
                if rook_pseudo.contains(s2) {
                    line[s1.index()][s2.index()] = (rook_pseudo
                        & sliding_attack(s2, Bitboard::EMPTY, PieceType::Rook))
                        | square_bb(s1)
                        | square_bb(s2);
                    between[s1.index()][s2.index()] =
                        sliding_attack(s1, square_bb(s2), PieceType::Rook)
                            & sliding_attack(s2, square_bb(s1), PieceType::Rook);
                }
                if knight_pseudo.contains(s2) {
                    between[s1.index()][s2.index()] |= lame_leaper_path_dir(
                        PieceType::KnightTo,
                        s1,
                        s2.0 as i32 - s1.0 as i32,
                    );
                }
                between[s1.index()][s2.index()] |= square_bb(s2);
            }
        }

        debug!(elapsed = ?start.elapsed(), "attack tables initialized");
        AttackTables {
            rook,
            cannon,
            knight,
            knight_to,
            elephant,
            pseudo,
            pawn_attacks,
            pawn_attacks_to,
            line,
            between,
            distance,
        }
    }

    /// Attack set of a piece of type `pt` on `s` under `occupied`. Pawns are
    /// served by `pawn_attacks`; king and advisor fall back to their palace
    /// step sets.
    #[inline]
    pub fn attacks(&self, pt: PieceType, s: Square, occupied: Bitboard) -> Bitboard {
        debug_assert!(pt != PieceType::Pawn);
        match pt {
            PieceType::Rook => self.rook.get_attacks(s, occupied),
            PieceType::Cannon => self.cannon.get_attacks(s, occupied),
            PieceType::Bishop => self.elephant.get_attacks(s, occupied),
            PieceType::Knight => self.knight.get_attacks(s, occupied),
            PieceType::KnightTo => self.knight_to.get_attacks(s, occupied),
            _ => self.pseudo[pt.index()][s.index()],
        }
    }

    /// Attacks on an empty board.
    #[inline]
    pub fn pseudo_attacks(&self, pt: PieceType, s: Square) -> Bitboard {
        self.pseudo[pt.index()][s.index()]
    }

    #[inline]
    pub fn pawn_attacks(&self, c: Color, s: Square) -> Bitboard {
        self.pawn_attacks[c.index()][s.index()]
    }

    /// Squares from which a pawn of color `c` attacks `s`.
    #[inline]
    pub fn pawn_attacks_to(&self, c: Color, s: Square) -> Bitboard {
        self.pawn_attacks_to[c.index()][s.index()]
    }

    /// The full orthogonal line through `s1` and `s2` (empty when not
    /// aligned), both endpoints included.
    #[inline]
    pub fn line(&self, s1: Square, s2: Square) -> Bitboard {
        self.line[s1.index()][s2.index()]
    }

    /// Squares between `s1` and `s2` on a shared line, `s2` included; for a
    /// knight relation this is the leg square plus `s2`.
    #[inline]
    pub fn between(&self, s1: Square, s2: Square) -> Bitboard {
        self.between[s1.index()][s2.index()]
    }

    #[inline]
    pub fn aligned(&self, s1: Square, s2: Square, s3: Square) -> bool {
        self.line(s1, s2).contains(s3)
    }

    #[inline]
    pub fn distance(&self, s1: Square, s2: Square) -> u8 {
        self.distance[s1.index()][s2.index()]
    }
}

/// The process-wide attack tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceCell<AttackTables> = OnceCell::new();
    TABLES.get_or_init(AttackTables::new)
}
