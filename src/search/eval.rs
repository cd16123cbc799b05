//! Material + piece-square evaluation with two small structural terms: a
//! bonus for a cannon staring at the enemy king down an empty line, and a
//! mobility penalty for knights hemmed in by neighbors.

use crate::bitboard::square_bb;
use crate::board::{Piece, PieceType, Position, Value, PIECE_NB, PIECE_TYPES};
use crate::moves::magic::tables;
use crate::square::{shifted, Color, Square, EAST, NORTH, SOUTH, SQUARE_NB, WEST};
use once_cell::sync::OnceCell;

const EXPOSED_CANNON_BONUS: Value = 55;

// Red piece-square tables, rank 0 (red's back rank) first, files a..i.
// Black values come from the vertical mirror.

#[rustfmt::skip]
const RED_ROOK_PST: [[Value; 9]; 10] = [
    [-2, 10,  6, 14, 12, 14,  6, 10, -2],
    [ 8,  4,  8, 16,  8, 16,  8,  4,  8],
    [ 4,  8,  6, 14, 12, 14,  6,  8,  4],
    [ 6, 10,  8, 14, 14, 14,  8, 10,  6],
    [12, 16, 14, 20, 20, 20, 14, 16, 12],
    [12, 14, 12, 18, 18, 18, 12, 14, 12],
    [12, 18, 16, 22, 22, 22, 16, 18, 12],
    [12, 12, 12, 18, 18, 18, 12, 12, 12],
    [16, 20, 18, 24, 26, 24, 18, 20, 16],
    [14, 14, 12, 18, 16, 18, 12, 14, 14],
];

#[rustfmt::skip]
const RED_CANNON_PST: [[Value; 9]; 10] = [
    [ 0,  0,  2,  6,  6,  6,  2,  0,  0],
    [ 0,  2,  4,  6,  6,  6,  4,  2,  0],
    [ 4,  0,  8,  6, 10,  6,  8,  0,  4],
    [ 0,  0,  0,  2,  4,  2,  0,  0,  0],
    [-2,  0,  4,  2,  6,  2,  4,  0, -2],
    [ 0,  0,  0,  2,  8,  2,  0,  0,  0],
    [ 0,  0, -2,  4, 10,  4, -2,  0,  0],
    [ 2,  2,  0,-10, -8,-10,  0,  2,  2],
    [ 2,  2,  0, -4,-14, -4,  0,  2,  2],
    [ 6,  4,  0,-10,-12,-10,  0,  4,  6],
];

#[rustfmt::skip]
const RED_KNIGHT_PST: [[Value; 9]; 10] = [
    [ 0, -4,  0,  0,  0,  0,  0, -4,  0],
    [ 0,  2,  4,  4, -2,  4,  4,  2,  0],
    [ 4,  2,  8,  8,  4,  8,  8,  2,  4],
    [ 2,  6,  8,  6, 10,  6,  8,  6,  2],
    [ 4, 12, 16, 14, 12, 14, 16, 12,  4],
    [ 6, 16, 14, 18, 16, 18, 14, 16,  6],
    [ 8, 24, 18, 24, 20, 24, 18, 24,  8],
    [12, 14, 16, 20, 18, 20, 16, 14, 12],
    [ 4, 10, 28, 16,  8, 16, 28, 10,  4],
    [ 4,  8, 16, 12,  4, 12, 16,  8,  4],
];

#[rustfmt::skip]
const RED_BISHOP_PST: [[Value; 9]; 10] = [
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [-7,  0,  0,  0,  6,  0,  0,  0, -7],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0, -2,  0,  0,  0, -2,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const RED_ADVISOR_PST: [[Value; 9]; 10] = [
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0, -2,  0,  0,  0,  0],
    [ 0,  0,  0, -2,  0, -2,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const RED_KING_PST: [[Value; 9]; 10] = [
    [ 0,  0,  0, -5,  0, -5,  0,  0,  0],
    [ 0,  0,  0,-10,-10,-10,  0,  0,  0],
    [ 0,  0,  0,-15,-15,-15,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
];

#[rustfmt::skip]
const RED_PAWN_PST: [[Value; 9]; 10] = [
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0,  0,  0,  0,  0,  0,  0,  0],
    [ 0,  0, -2,  0,  4,  0, -2,  0,  0],
    [ 2,  0,  8,  0,  8,  0,  8,  0,  2],
    [ 6, 12, 18, 18, 20, 18, 18, 12,  6],
    [10, 20, 30, 34, 40, 34, 30, 20, 10],
    [14, 26, 42, 60, 80, 60, 42, 26, 14],
    [18, 36, 56, 80,120, 80, 56, 36, 18],
    [ 0,  3,  6,  9, 12,  9,  6,  3,  0],
];

fn red_table(pt: PieceType) -> &'static [[Value; 9]; 10] {
    match pt {
        PieceType::Rook => &RED_ROOK_PST,
        PieceType::Advisor => &RED_ADVISOR_PST,
        PieceType::Cannon => &RED_CANNON_PST,
        PieceType::Pawn => &RED_PAWN_PST,
        PieceType::Knight => &RED_KNIGHT_PST,
        PieceType::Bishop => &RED_BISHOP_PST,
        _ => &RED_KING_PST,
    }
}

struct PstTables {
    by_piece: [[Value; SQUARE_NB]; PIECE_NB],
}

fn pst_tables() -> &'static PstTables {
    static TABLES: OnceCell<PstTables> = OnceCell::new();
    TABLES.get_or_init(|| {
        let mut by_piece = [[0; SQUARE_NB]; PIECE_NB];
        for pt in PIECE_TYPES {
            let red = red_table(pt);
            for sq in 0..SQUARE_NB {
                let s = Square(sq as u8);
                let (file, rank) = (s.file() as usize, s.rank() as usize);
                by_piece[Piece::make(Color::White, pt).index()][sq] = red[rank][file];
                by_piece[Piece::make(Color::Black, pt).index()][sq] = red[9 - rank][file];
            }
        }
        PstTables { by_piece }
    })
}

/// Positional bonus of `pc` standing on `s`, on red's scale for red pieces
/// and the mirrored table for black.
#[inline]
pub fn pst_value(pc: Piece, s: Square) -> Value {
    pst_tables().by_piece[pc.index()][s.index()]
}

/// Static evaluation from the side to move's perspective: incrementally
/// maintained material and piece-square sums, an exposed-cannon bonus, and
/// a knight mobility penalty.
pub fn evaluate(pos: &Position) -> Value {
    let st = pos.st();
    let mut eval = st.material[Color::White.index()] + st.pst[Color::White.index()]
        - st.material[Color::Black.index()]
        - st.pst[Color::Black.index()];

    let t = tables();
    let all = pos.all_pieces();
    for c in [Color::White, Color::Black] {
        let sign = if c == Color::White { 1 } else { -1 };
        let oksq = pos.king_sq(!c);

        // A cannon on the enemy king's line with nothing between them
        // ("hollow cannon") paralyzes the defense even without a check.
        for sq in pos.pieces(c, PieceType::Cannon).iter() {
            if t.line(sq, oksq).any() && (t.between(sq, oksq) & all) == square_bb(oksq) {
                eval += sign * EXPOSED_CANNON_BONUS;
            }
        }

        // Knights lose flexibility for every occupied neighbor; an enemy
        // neighbor is worse because it cannot be asked to move.
        for sq in pos.pieces(c, PieceType::Knight).iter() {
            let mut penalty = 0;
            for d in [NORTH, SOUTH, EAST, WEST] {
                if let Some(nb) = shifted(sq, d) {
                    if pos.color_pieces(c).contains(nb) {
                        penalty -= 5;
                    } else if pos.color_pieces(!c).contains(nb) {
                        penalty -= 10;
                    }
                }
            }
            eval += sign * penalty;
        }
    }

    if pos.side_to_move() == Color::White {
        eval
    } else {
        -eval
    }
}
