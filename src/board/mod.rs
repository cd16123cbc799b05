mod fen;
pub mod repetition;

pub use fen::{FenError, MoveParseError, START_FEN};
pub use repetition::BloomFilter;

use crate::bitboard::{pawn_zone, square_bb, Bitboard, PALACE};
use crate::hash::zobrist::zobrist_keys;
use crate::moves::magic::tables;
use crate::moves::types::Move;
use crate::search::eval::pst_value;
use crate::square::{Color, Square, COLOR_NB, SQUARE_NB};
use std::fmt;
use thiserror::Error;

/// Centipawn-style score. Scores fit in an i16 once clamped for the
/// transposition table.
pub type Value = i32;

pub const VALUE_ZERO: Value = 0;
pub const VALUE_DRAW: Value = 0;
pub const VALUE_MATE: Value = 32000;
pub const VALUE_INFINITE: Value = 32001;
pub const VALUE_NONE: Value = 32002;

#[inline(always)]
pub const fn mate_in(ply: i32) -> Value {
    VALUE_MATE - ply
}

#[inline(always)]
pub const fn mated_in(ply: i32) -> Value {
    -VALUE_MATE + ply
}

/// The seven piece kinds. `KnightTo` is not a piece: it selects the inverted
/// knight attack table ("which squares attack here") used by check
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PieceType {
    Rook = 1,
    Advisor = 2,
    Cannon = 3,
    Pawn = 4,
    Knight = 5,
    Bishop = 6,
    King = 7,
    KnightTo = 8,
}

/// Array size for per-type tables; slot 0 doubles as "all pieces".
pub const PIECE_TYPE_NB: usize = 8;

pub const PIECE_TYPES: [PieceType; 7] = [
    PieceType::Rook,
    PieceType::Advisor,
    PieceType::Cannon,
    PieceType::Pawn,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::King,
];

impl PieceType {
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub const fn from_u8(v: u8) -> PieceType {
        match v {
            1 => PieceType::Rook,
            2 => PieceType::Advisor,
            3 => PieceType::Cannon,
            4 => PieceType::Pawn,
            5 => PieceType::Knight,
            6 => PieceType::Bishop,
            7 => PieceType::King,
            _ => PieceType::KnightTo,
        }
    }
}

/// A colored piece packed as `color << 3 | type`; 0 is the empty square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Piece(pub u8);

pub const PIECE_NB: usize = 16;

impl Piece {
    pub const NONE: Piece = Piece(0);

    #[inline(always)]
    pub const fn make(c: Color, pt: PieceType) -> Piece {
        Piece(((c as u8) << 3) | pt as u8)
    }

    #[inline(always)]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn type_of(self) -> PieceType {
        PieceType::from_u8(self.0 & 7)
    }

    #[inline(always)]
    pub const fn color_of(self) -> Color {
        if self.0 >> 3 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// FEN letter; red pieces are uppercase.
    pub fn to_char(self) -> char {
        const LETTERS: &[u8; 16] = b" RACPNBK racpnbk";
        LETTERS[self.index()] as char
    }

    /// Accepts both common letter sets: RACPNBK and the RACPHEK synonyms
    /// (H for horse, E for elephant).
    pub fn from_char(ch: char) -> Option<Piece> {
        let primary = " RACPNBK racpnbk";
        let synonym = " RACPHEK racphek";
        let idx = primary
            .find(ch)
            .or_else(|| synonym.find(ch))
            .filter(|&i| i > 0 && i != 8)?;
        Some(Piece(idx as u8))
    }
}

/// Midgame/endgame material, indexed `[phase][piece code]`. Kings carry no
/// material value.
pub const PIECE_VALUE: [[Value; PIECE_NB]; 2] = {
    const R: [Value; 2] = [1245, 1540];
    const A: [Value; 2] = [229, 187];
    const C: [Value; 2] = [653, 632];
    const P: [Value; 2] = [80, 129];
    const N: [Value; 2] = [574, 747];
    const B: [Value; 2] = [308, 223];
    [
        [
            0, R[0], A[0], C[0], P[0], N[0], B[0], 0, 0, R[0], A[0], C[0], P[0], N[0], B[0], 0,
        ],
        [
            0, R[1], A[1], C[1], P[1], N[1], B[1], 0, 0, R[1], A[1], C[1], P[1], N[1], B[1], 0,
        ],
    ]
};

pub const MG: usize = 0;
pub const EG: usize = 1;

#[inline(always)]
pub const fn piece_value(phase: usize, pc: Piece) -> Value {
    PIECE_VALUE[phase][pc.0 as usize]
}

/// Snapshot of everything a move changes that cannot be recomputed cheaply
/// on undo. One is pushed per `do_move`.
#[derive(Debug, Clone)]
pub struct StateInfo {
    // Copied from the previous state when making a move.
    pub material: [Value; COLOR_NB],
    pub pst: [Value; COLOR_NB],
    pub check10: [i16; COLOR_NB],
    pub rule60: i32,
    pub plies_from_null: i32,

    // Recomputed after the move.
    pub key: u64,
    pub checkers: Bitboard,
    pub blockers_for_king: [Bitboard; COLOR_NB],
    pub pinners: [Bitboard; COLOR_NB],
    pub check_squares: [Bitboard; PIECE_TYPE_NB],
    pub need_slow_check: bool,
    pub captured: Piece,
    pub mv: Move,
}

impl Default for StateInfo {
    fn default() -> StateInfo {
        StateInfo {
            material: [0; COLOR_NB],
            pst: [0; COLOR_NB],
            check10: [0; COLOR_NB],
            rule60: 0,
            plies_from_null: 0,
            key: 0,
            checkers: Bitboard::EMPTY,
            blockers_for_king: [Bitboard::EMPTY; COLOR_NB],
            pinners: [Bitboard::EMPTY; COLOR_NB],
            check_squares: [Bitboard::EMPTY; PIECE_TYPE_NB],
            need_slow_check: false,
            captured: Piece::NONE,
            mv: Move::NONE,
        }
    }
}

/// Reason categories for a failed consistency check.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("king square cache or king placement is wrong")]
    Kings,
    #[error("a pawn sits outside its legal zone or a side has too many pawns")]
    Pawns,
    #[error("color/type bitboards disagree with each other or the board array")]
    Bitboards,
    #[error("piece counts disagree with bitboards or the board array")]
    PieceCounts,
    #[error("the side not to move is in check")]
    SideNotToMoveInCheck,
}

/// The board state: piece placement, bitboards, and the StateInfo stack.
/// States are navigated by index into the stack, never by pointer.
#[derive(Debug, Clone)]
pub struct Position {
    board: [Piece; SQUARE_NB],
    by_type: [Bitboard; PIECE_TYPE_NB],
    by_color: [Bitboard; COLOR_NB],
    piece_count: [u8; PIECE_NB],
    king_sq: [Square; COLOR_NB],
    side_to_move: Color,
    pub game_ply: i32,
    pub nodes: u64,
    pub(crate) filter: BloomFilter,
    states: Vec<StateInfo>,
}

impl Position {
    pub(crate) fn empty() -> Position {
        Position {
            board: [Piece::NONE; SQUARE_NB],
            by_type: [Bitboard::EMPTY; PIECE_TYPE_NB],
            by_color: [Bitboard::EMPTY; COLOR_NB],
            piece_count: [0; PIECE_NB],
            king_sq: [Square::NONE; COLOR_NB],
            side_to_move: Color::White,
            game_ply: 0,
            nodes: 0,
            filter: BloomFilter::new(),
            states: vec![StateInfo::default()],
        }
    }

    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN is valid")
    }

    // ---- accessors ------------------------------------------------------

    #[inline(always)]
    pub fn st(&self) -> &StateInfo {
        &self.states[self.states.len() - 1]
    }

    #[inline(always)]
    fn st_mut(&mut self) -> &mut StateInfo {
        let last = self.states.len() - 1;
        &mut self.states[last]
    }

    /// The state `cnt` plies before the current one.
    #[inline(always)]
    pub fn st_prev(&self, cnt: usize) -> &StateInfo {
        &self.states[self.states.len() - cnt - 1]
    }

    #[inline(always)]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[inline(always)]
    pub fn piece_on(&self, s: Square) -> Piece {
        self.board[s.index()]
    }

    #[inline(always)]
    pub fn is_empty_sq(&self, s: Square) -> bool {
        self.board[s.index()].is_none()
    }

    #[inline(always)]
    pub fn moved_piece(&self, m: Move) -> Piece {
        self.piece_on(m.from_sq())
    }

    /// True when `m` lands on an occupied square.
    #[inline(always)]
    pub fn is_capture(&self, m: Move) -> bool {
        !self.is_empty_sq(m.to_sq())
    }

    #[inline(always)]
    pub fn all_pieces(&self) -> Bitboard {
        self.by_type[0]
    }

    #[inline(always)]
    pub fn pieces_of(&self, pt: PieceType) -> Bitboard {
        self.by_type[pt.index()]
    }

    #[inline(always)]
    pub fn color_pieces(&self, c: Color) -> Bitboard {
        self.by_color[c.index()]
    }

    #[inline(always)]
    pub fn pieces(&self, c: Color, pt: PieceType) -> Bitboard {
        self.by_color[c.index()] & self.by_type[pt.index()]
    }

    #[inline(always)]
    pub fn king_sq(&self, c: Color) -> Square {
        self.king_sq[c.index()]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.st().key
    }

    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.st().checkers
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.st().checkers.any()
    }

    #[inline(always)]
    pub fn check_squares(&self, pt: PieceType) -> Bitboard {
        self.st().check_squares[pt.index()]
    }

    #[inline(always)]
    pub fn blockers_for_king(&self, c: Color) -> Bitboard {
        self.st().blockers_for_king[c.index()]
    }

    #[inline(always)]
    pub fn pinners(&self, c: Color) -> Bitboard {
        self.st().pinners[c.index()]
    }

    #[inline(always)]
    pub fn piece_count(&self, pc: Piece) -> u8 {
        self.piece_count[pc.index()]
    }

    // ---- attack queries -------------------------------------------------

    /// All pieces of color `c` that attack `s` under `occupied`. Cannons
    /// need their screen; kings count as rook-attackers so the flying
    /// general rule falls out of the same query.
    pub fn checkers_to(&self, c: Color, s: Square, occupied: Bitboard) -> Bitboard {
        let t = tables();
        ((t.pawn_attacks_to(c, s) & self.pieces_of(PieceType::Pawn))
            | (t.attacks(PieceType::KnightTo, s, occupied) & self.pieces_of(PieceType::Knight))
            | (t.attacks(PieceType::Rook, s, occupied)
                & (self.pieces_of(PieceType::King) | self.pieces_of(PieceType::Rook)))
            | (t.attacks(PieceType::Cannon, s, occupied) & self.pieces_of(PieceType::Cannon)))
            & self.color_pieces(c)
    }

    /// `checkers_to` with the full occupancy.
    #[inline]
    pub fn checkers_to_now(&self, c: Color, s: Square) -> Bitboard {
        self.checkers_to(c, s, self.all_pieces())
    }

    /// All pieces of either color that attack `s` under `occupied`.
    pub fn attackers_to(&self, s: Square, occupied: Bitboard) -> Bitboard {
        let t = tables();
        (t.pawn_attacks_to(Color::White, s) & self.pieces(Color::White, PieceType::Pawn))
            | (t.pawn_attacks_to(Color::Black, s) & self.pieces(Color::Black, PieceType::Pawn))
            | (t.attacks(PieceType::KnightTo, s, occupied) & self.pieces_of(PieceType::Knight))
            | (t.attacks(PieceType::Rook, s, occupied) & self.pieces_of(PieceType::Rook))
            | (t.attacks(PieceType::Cannon, s, occupied) & self.pieces_of(PieceType::Cannon))
            | (t.attacks(PieceType::Bishop, s, occupied) & self.pieces_of(PieceType::Bishop))
            | (t.attacks(PieceType::Advisor, s, occupied) & self.pieces_of(PieceType::Advisor))
            | (t.attacks(PieceType::King, s, occupied) & self.pieces_of(PieceType::King))
    }

    /// Pieces of both colors shielding `s` from the given sliders, plus the
    /// snipers that pin them. A rook or king pins through exactly one piece;
    /// a cannon "pins" when exactly two pieces sit on the ray, because
    /// removing either changes its attack; a knight pins through its leg.
    fn slider_blockers(&self, sliders: Bitboard, s: Square) -> (Bitboard, Bitboard) {
        let t = tables();
        let mut blockers = Bitboard::EMPTY;
        let mut pinners = Bitboard::EMPTY;

        let cannons = self.pieces_of(PieceType::Cannon);
        let mut snipers = ((t.pseudo_attacks(PieceType::Rook, s)
            & (self.pieces_of(PieceType::Rook) | cannons | self.pieces_of(PieceType::King)))
            | (t.pseudo_attacks(PieceType::Knight, s) & self.pieces_of(PieceType::Knight)))
            & sliders;
        let occupancy = self.all_pieces() ^ (snipers & !cannons);

        while snipers.any() {
            let sniper_sq = snipers.pop_lsb();
            let is_cannon = self.piece_on(sniper_sq).type_of() == PieceType::Cannon;
            let b = if is_cannon {
                t.between(s, sniper_sq) & (self.all_pieces() ^ square_bb(sniper_sq))
            } else {
                t.between(s, sniper_sq) & occupancy
            };
            if b.any() && ((!is_cannon && !b.more_than_one()) || (is_cannon && b.pop_count() == 2))
            {
                blockers |= b;
                if (b & self.color_pieces(self.piece_on(s).color_of())).any() {
                    pinners |= square_bb(sniper_sq);
                }
            }
        }
        (blockers, pinners)
    }

    // ---- move predicates ------------------------------------------------

    /// Tests whether a pseudo-legal move leaves the mover's king safe.
    /// The fast path answers without any attack query when the mover is
    /// neither the king nor a blocker and no cannon complicates the ray.
    pub fn legal(&self, m: Move) -> bool {
        let us = self.side_to_move;
        let from = m.from_sq();
        let to = m.to_sq();
        let from_bb = square_bb(from);
        let to_bb = square_bb(to);
        let occupied = (self.all_pieces() ^ from_bb) | to_bb;
        let moved_is_king = self.moved_piece(m).type_of() == PieceType::King;
        let ksq = if moved_is_king { to } else { self.king_sq(us) };

        if !self.st().need_slow_check
            && ksq != to
            && (self.blockers_for_king(us) & from_bb).is_empty()
        {
            return true;
        }
        if moved_is_king {
            return self.checkers_to(!us, to, occupied).is_empty();
        }
        (self.checkers_to(!us, ksq, occupied) & !to_bb).is_empty()
    }

    /// Validates a move that came from the transposition table or the
    /// killer slots: the piece must exist, belong to the side to move, and
    /// be able to reach the destination in the current position.
    pub fn pseudo_legal(&self, m: Move) -> bool {
        if !m.is_ok() {
            return false;
        }
        let t = tables();
        let us = self.side_to_move;
        let from = m.from_sq();
        let to = m.to_sq();
        if !from.is_ok() || !to.is_ok() {
            return false;
        }
        let pc = self.moved_piece(m);
        if pc.is_none() || pc.color_of() != us {
            return false;
        }
        if (self.color_pieces(us) & square_bb(to)).any() {
            return false;
        }
        match pc.type_of() {
            PieceType::Pawn => (t.pawn_attacks(us, from) & square_bb(to)).any(),
            PieceType::Cannon if !self.is_capture(m) => {
                (t.attacks(PieceType::Rook, from, self.all_pieces()) & square_bb(to)).any()
            }
            pt => (t.attacks(pt, from, self.all_pieces()) & square_bb(to)).any(),
        }
    }

    /// Tests whether a pseudo-legal move checks the opponent, directly or by
    /// discovery. Cannon rays are re-derived on the post-move occupancy
    /// because the mover itself can become or remove a screen.
    pub fn gives_check(&self, m: Move) -> bool {
        let t = tables();
        let us = self.side_to_move;
        let from = m.from_sq();
        let to = m.to_sq();
        let ksq = self.king_sq(!us);
        let pt = self.moved_piece(m).type_of();
        let moved_occ = (self.all_pieces() ^ square_bb(from)) | square_bb(to);

        // Direct check.
        if pt == PieceType::Cannon {
            if (t.attacks(PieceType::Cannon, to, moved_occ) & square_bb(ksq)).any() {
                return true;
            }
        } else if (self.check_squares(pt) & square_bb(to)).any() {
            return true;
        }
        // Discovered check. With one of our cannons on the king's ray the
        // cheap blocker test is unsound, so re-derive from scratch.
        if (t.pseudo_attacks(PieceType::Rook, ksq) & self.pieces(us, PieceType::Cannon)).any() {
            (self.checkers_to(us, ksq, moved_occ) & !square_bb(from)).any()
        } else {
            (self.blockers_for_king(!us) & square_bb(from)).any() && !t.aligned(from, to, ksq)
        }
    }

    // ---- incremental board surgery --------------------------------------

    pub(crate) fn put_piece(&mut self, pc: Piece, s: Square) {
        let bb = square_bb(s);
        self.board[s.index()] = pc;
        self.by_type[pc.type_of().index()] |= bb;
        self.by_type[0] |= bb;
        self.by_color[pc.color_of().index()] |= bb;
        self.piece_count[pc.index()] += 1;
        // Slot `color << 3` doubles as the per-color total.
        self.piece_count[(pc.color_of() as usize) << 3] += 1;
        if pc.type_of() == PieceType::King {
            self.king_sq[pc.color_of().index()] = s;
        }
    }

    pub(crate) fn remove_piece(&mut self, s: Square) {
        let pc = self.board[s.index()];
        let bb = square_bb(s);
        self.by_type[0] ^= bb;
        self.by_type[pc.type_of().index()] ^= bb;
        self.by_color[pc.color_of().index()] ^= bb;
        self.board[s.index()] = Piece::NONE;
        self.piece_count[pc.index()] -= 1;
        self.piece_count[(pc.color_of() as usize) << 3] -= 1;
    }

    pub(crate) fn move_piece(&mut self, from: Square, to: Square) {
        let pc = self.board[from.index()];
        let from_to = square_bb(from) | square_bb(to);
        self.by_type[0] ^= from_to;
        self.by_type[pc.type_of().index()] ^= from_to;
        self.by_color[pc.color_of().index()] ^= from_to;
        self.board[from.index()] = Piece::NONE;
        self.board[to.index()] = pc;
        if pc.type_of() == PieceType::King {
            self.king_sq[pc.color_of().index()] = to;
        }
    }

    // ---- make / undo ----------------------------------------------------

    pub fn do_move(&mut self, m: Move) {
        let gives_check = self.gives_check(m);
        self.do_move_gc(m, gives_check);
    }

    /// Makes a move assumed to be legal. `gives_check` must be the value of
    /// `gives_check(m)` for the move in the current position.
    pub fn do_move_gc(&mut self, m: Move, gives_check: bool) {
        let zk = zobrist_keys();
        self.nodes += 1;
        self.filter.incr(self.st().key);

        let mut k = self.st().key ^ zk.side;
        let new_st = StateInfo {
            material: self.st().material,
            pst: self.st().pst,
            check10: self.st().check10,
            rule60: self.st().rule60,
            plies_from_null: self.st().plies_from_null,
            mv: m,
            ..StateInfo::default()
        };
        self.states.push(new_st);
        self.game_ply += 1;

        let us = self.side_to_move;
        let them = !us;

        // Check counting feeds the 60-ply rule: a side past ten consecutive
        // checks starts burning the counter down instead of up.
        {
            let st = self.st_mut();
            if gives_check {
                st.check10[us.index()] += 1;
            }
            if gives_check && st.check10[us.index()] > 10 {
                st.rule60 -= 1;
            } else {
                st.rule60 += 1;
            }
            st.plies_from_null += 1;
        }

        let from = m.from_sq();
        let to = m.to_sq();
        let pc = self.piece_on(from);
        let captured = self.piece_on(to);

        if !captured.is_none() {
            let st = self.st_mut();
            st.material[them.index()] -= piece_value(MG, captured);
            st.pst[them.index()] -= pst_value(captured, to);
            st.rule60 = 0;
            st.check10 = [0, 0];
            self.remove_piece(to);
            k ^= zk.piece_square(captured, to);
        }
        k ^= zk.piece_square(pc, from) ^ zk.piece_square(pc, to);

        self.st_mut().pst[us.index()] += pst_value(pc, to) - pst_value(pc, from);
        self.move_piece(from, to);

        let checkers = if gives_check {
            self.checkers_to_now(us, self.king_sq(them))
        } else {
            Bitboard::EMPTY
        };
        {
            let st = self.st_mut();
            st.captured = captured;
            st.key = k;
            st.checkers = checkers;
        }
        self.side_to_move = them;
        self.set_check_info();
    }

    /// Restores the position to the state before `do_move(m)`, bit for bit.
    pub fn undo_move(&mut self, m: Move) {
        self.side_to_move = !self.side_to_move;

        let from = m.from_sq();
        let to = m.to_sq();
        self.move_piece(to, from);

        let captured = self.st().captured;
        if !captured.is_none() {
            self.put_piece(captured, to);
        }
        self.states.pop();
        self.game_ply -= 1;
        self.filter.decr(self.st().key);
    }

    /// Flips the side to move without moving anything. The null window
    /// (`plies_from_null`) resets so repetition logic never looks across.
    pub fn do_null_move(&mut self) {
        let zk = zobrist_keys();
        self.filter.incr(self.st().key);
        let mut new_st = self.st().clone();
        new_st.key ^= zk.side;
        new_st.rule60 += 1;
        new_st.plies_from_null = 0;
        self.states.push(new_st);
        self.side_to_move = !self.side_to_move;
        self.set_check_info();
    }

    pub fn undo_null_move(&mut self) {
        self.states.pop();
        self.side_to_move = !self.side_to_move;
        self.filter.decr(self.st().key);
    }

    // ---- derived state --------------------------------------------------

    /// Recomputes the check-detection caches for the side to move: blocker
    /// and pinner sets for both kings, per-type checking squares against the
    /// opponent king, and the slow-path flag. The slow flag is forced
    /// whenever a cannon of theirs shares a rook ray with our king, since a
    /// cannon gains or loses its attack with any motion on the ray.
    pub(crate) fn set_check_info(&mut self) {
        let t = tables();
        let us = self.side_to_move;
        let them = !us;
        let uksq = self.king_sq(us);
        let oksq = self.king_sq(them);

        let (blockers_us, pinners_them) = self.slider_blockers(self.color_pieces(them), uksq);
        let (blockers_them, pinners_us) = self.slider_blockers(self.color_pieces(us), oksq);

        let need_slow_check = self.st().checkers.any()
            || (t.pseudo_attacks(PieceType::Rook, uksq) & self.pieces(them, PieceType::Cannon))
                .any();

        let all = self.all_pieces();
        let st = self.st_mut();
        st.blockers_for_king[us.index()] = blockers_us;
        st.blockers_for_king[them.index()] = blockers_them;
        st.pinners[them.index()] = pinners_them;
        st.pinners[us.index()] = pinners_us;
        st.need_slow_check = need_slow_check;
        st.check_squares[PieceType::Pawn.index()] = t.pawn_attacks_to(us, oksq);
        st.check_squares[PieceType::Knight.index()] = t.attacks(PieceType::KnightTo, oksq, all);
        st.check_squares[PieceType::Cannon.index()] = t.attacks(PieceType::Cannon, oksq, all);
        st.check_squares[PieceType::Rook.index()] = t.attacks(PieceType::Rook, oksq, all);
        st.check_squares[PieceType::Bishop.index()] = Bitboard::EMPTY;
        st.check_squares[PieceType::Advisor.index()] = Bitboard::EMPTY;
        st.check_squares[PieceType::King.index()] = Bitboard::EMPTY;
    }

    /// Computes the root state from scratch; used after a FEN load.
    pub(crate) fn set_state(&mut self) {
        let zk = zobrist_keys();
        let checkers = self.checkers_to_now(!self.side_to_move, self.king_sq(self.side_to_move));
        {
            let st = self.st_mut();
            st.key = 0;
            st.material = [VALUE_ZERO; COLOR_NB];
            st.pst = [VALUE_ZERO; COLOR_NB];
            st.checkers = checkers;
            st.mv = Move::NONE;
        }
        self.set_check_info();

        let mut key = 0u64;
        let mut material = [VALUE_ZERO; COLOR_NB];
        let mut pst = [VALUE_ZERO; COLOR_NB];
        for s in self.all_pieces().iter() {
            let pc = self.piece_on(s);
            key ^= zk.piece_square(pc, s);
            if pc.type_of() != PieceType::King {
                material[pc.color_of().index()] += piece_value(MG, pc);
            }
            pst[pc.color_of().index()] += pst_value(pc, s);
        }
        if self.side_to_move == Color::Black {
            key ^= zk.side;
        }
        let st = self.st_mut();
        st.key = key;
        st.material = material;
        st.pst = pst;
    }

    // ---- consistency ----------------------------------------------------

    /// Checks the redundant representations against each other. Reports,
    /// never aborts; debug builds assert the result where positions enter
    /// the system.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for c in [Color::White, Color::Black] {
            let ksq = self.king_sq(c);
            if !ksq.is_ok()
                || self.piece_on(ksq) != Piece::make(c, PieceType::King)
                || self.piece_count(Piece::make(c, PieceType::King)) != 1
                || !(self.pieces(c, PieceType::King) & PALACE).any()
            {
                return Err(InvariantViolation::Kings);
            }
            if (self.pieces(c, PieceType::Pawn) & !pawn_zone(c)).any()
                || self.piece_count(Piece::make(c, PieceType::Pawn)) > 5
            {
                return Err(InvariantViolation::Pawns);
            }
        }
        if self
            .checkers_to_now(self.side_to_move, self.king_sq(!self.side_to_move))
            .any()
        {
            return Err(InvariantViolation::SideNotToMoveInCheck);
        }
        if (self.color_pieces(Color::White) & self.color_pieces(Color::Black)).any()
            || self.color_pieces(Color::White) | self.color_pieces(Color::Black)
                != self.all_pieces()
            || self.color_pieces(Color::White).pop_count() > 16
            || self.color_pieces(Color::Black).pop_count() > 16
        {
            return Err(InvariantViolation::Bitboards);
        }
        for p1 in PIECE_TYPES {
            for p2 in PIECE_TYPES {
                if p1 != p2 && (self.pieces_of(p1) & self.pieces_of(p2)).any() {
                    return Err(InvariantViolation::Bitboards);
                }
            }
        }
        for c in [Color::White, Color::Black] {
            for pt in PIECE_TYPES {
                let pc = Piece::make(c, pt);
                let bb_count = self.pieces(c, pt).pop_count() as u8;
                let arr_count = self.board.iter().filter(|&&b| b == pc).count() as u8;
                if self.piece_count(pc) != bb_count || self.piece_count(pc) != arr_count {
                    return Err(InvariantViolation::PieceCounts);
                }
            }
        }
        Ok(())
    }

    /// Recomputes the Zobrist key from scratch; the incremental key must
    /// always agree.
    pub fn compute_key_full(&self) -> u64 {
        let zk = zobrist_keys();
        let mut key = 0u64;
        for s in self.all_pieces().iter() {
            key ^= zk.piece_square(self.piece_on(s), s);
        }
        if self.side_to_move == Color::Black {
            key ^= zk.side;
        }
        key
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "+---+---+---+---+---+---+---+---+---+")?;
        for r in (0..10u8).rev() {
            for file in 0..9u8 {
                let pc = self.piece_on(Square::make(file, r));
                if pc.is_none() {
                    write!(f, "|   ")?;
                } else {
                    write!(f, "| {} ", pc.to_char())?;
                }
            }
            writeln!(f, "| {}", r)?;
            writeln!(f, "+---+---+---+---+---+---+---+---+---+")?;
        }
        writeln!(f, "  a   b   c   d   e   f   g   h   i")?;
        writeln!(f, "fen: {}", self.to_fen())
    }
}
