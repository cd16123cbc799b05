use crate::board::{Piece, PieceType, Position};
use crate::moves::movegen::{generate_legal, MoveList};
use crate::moves::types::Move;
use crate::square::{Color, Square, FILE_NB};
use std::str::FromStr;
use thiserror::Error;

/// The Xiangqi opening position.
pub const START_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("unrecognized piece letter '{0}'")]
    BadPiece(char),
    #[error("expected 10 ranks, found {0}")]
    BadRankCount(usize),
    #[error("rank '{0}' does not span 9 files")]
    BadRankWidth(String),
    #[error("bad side-to-move token '{0}'")]
    BadSideToMove(String),
    #[error("bad counter field '{0}'")]
    BadCounter(String),
    #[error("side {0:?} has no king")]
    MissingKing(Color),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("malformed move '{0}'")]
    BadCoordinates(String),
    #[error("move '{0}' is not legal in this position")]
    Illegal(String),
}

impl Position {
    /// Builds a position from a Xiangqi FEN
    /// (`<placement> <side> <castling> <ep> <halfmove> <fullmove>`). Fails
    /// fast on the first malformed token; the returned position is only
    /// constructed when the whole string checks out.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut pos = Position::empty();
        let mut tokens = fen.split_whitespace();

        let placement = tokens.next().ok_or(FenError::MissingField("placement"))?;
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 10 {
            return Err(FenError::BadRankCount(ranks.len()));
        }
        // FEN lists ranks from black's back rank down.
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 9 - i as u8;
            let mut file = 0u8;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as u8;
                } else {
                    let pc = Piece::from_char(ch).ok_or(FenError::BadPiece(ch))?;
                    if file >= FILE_NB {
                        return Err(FenError::BadRankWidth(rank_str.to_string()));
                    }
                    pos.put_piece(pc, Square::make(file, rank));
                    file += 1;
                }
            }
            if file != FILE_NB {
                return Err(FenError::BadRankWidth(rank_str.to_string()));
            }
        }

        let side = tokens.next().ok_or(FenError::MissingField("side to move"))?;
        pos.side_to_move = match side {
            "w" | "r" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSideToMove(other.to_string())),
        };

        for c in [Color::White, Color::Black] {
            if pos.pieces(c, PieceType::King).is_empty() {
                return Err(FenError::MissingKing(c));
            }
        }

        // Castling and en-passant fields are placeholders in Xiangqi FENs.
        let _ = tokens.next();
        let _ = tokens.next();

        let mut rule60 = 0i32;
        if let Some(halfmove) = tokens.next() {
            rule60 = halfmove
                .parse()
                .map_err(|_| FenError::BadCounter(halfmove.to_string()))?;
        }
        let mut fullmove = 1i32;
        if let Some(field) = tokens.next() {
            fullmove = field
                .parse()
                .map_err(|_| FenError::BadCounter(field.to_string()))?;
        }
        // Fullmove counts from 1; tolerate the common incorrect 0.
        pos.game_ply = (2 * (fullmove - 1)).max(0);
        if pos.side_to_move == Color::Black {
            pos.game_ply += 1;
        }

        pos.set_state();
        pos.states.last_mut().expect("root state").rule60 = rule60;

        // Positions where the mover could take the opposing king (e.g. the
        // bare facing-generals setup) are accepted from FENs; everything
        // structural must still hold.
        debug_assert!(
            matches!(
                pos.validate(),
                Ok(()) | Err(crate::board::InvariantViolation::SideNotToMoveInCheck)
            ),
            "FEN produced a broken position"
        );
        Ok(pos)
    }

    /// Emits the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(96);
        for rank in (0..10u8).rev() {
            let mut empty_run = 0;
            for file in 0..FILE_NB {
                let pc = self.piece_on(Square::make(file, rank));
                if pc.is_none() {
                    empty_run += 1;
                } else {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(pc.to_char());
                }
            }
            if empty_run > 0 {
                out.push((b'0' + empty_run) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }
        let side = if self.side_to_move() == Color::White {
            'w'
        } else {
            'b'
        };
        let fullmove = self.game_ply / 2 + 1;
        out.push_str(&format!(
            " {} - - {} {}",
            side,
            self.st().rule60,
            fullmove
        ));
        out
    }

    /// Maps coordinate notation like "b2e2" onto the matching legal move.
    pub fn parse_move(&self, move_str: &str) -> Result<Move, MoveParseError> {
        let raw = Move::from_coords(move_str.trim())
            .ok_or_else(|| MoveParseError::BadCoordinates(move_str.to_string()))?;
        let mut list = MoveList::new();
        generate_legal(self, &mut list);
        list.iter()
            .copied()
            .find(|m| *m == raw)
            .ok_or_else(|| MoveParseError::Illegal(move_str.to_string()))
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Position, FenError> {
        Position::from_fen(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_round_trips() {
        let pos = Position::startpos();
        assert_eq!(pos.to_fen(), START_FEN);
        assert!(pos.validate().is_ok());
        assert_eq!(pos.piece_count(Piece::make(Color::White, PieceType::Pawn)), 5);
        assert_eq!(pos.piece_count(Piece::make(Color::Black, PieceType::Rook)), 2);
    }

    #[test]
    fn synonym_letters_parse() {
        // H = horse (knight), E = elephant.
        let fen = "rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR w - - 0 1";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.piece_count(Piece::make(Color::White, PieceType::Knight)), 2);
        assert_eq!(pos.piece_count(Piece::make(Color::Black, PieceType::Bishop)), 2);
    }

    #[test]
    fn bad_fens_are_rejected() {
        assert!(matches!(
            Position::from_fen("9/9/9/9/9/9/9/9/9 w - - 0 1"),
            Err(FenError::BadRankCount(9))
        ));
        assert!(matches!(
            Position::from_fen("rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR x - - 0 1"),
            Err(FenError::BadSideToMove(_))
        ));
        assert!(matches!(
            Position::from_fen("rnbakabnr/9/1z5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1"),
            Err(FenError::BadPiece('z'))
        ));
        assert!(matches!(
            Position::from_fen("9/9/9/9/9/9/9/9/9/9 w - - 0 1"),
            Err(FenError::MissingKing(_))
        ));
    }

    #[test]
    fn black_to_move_adjusts_game_ply() {
        let fen = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR b - - 3 7";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.game_ply, 13);
        assert_eq!(pos.st().rule60, 3);
    }

    #[test]
    fn parse_move_accepts_only_legal_moves() {
        let pos = Position::startpos();
        let m = pos.parse_move("b2e2").unwrap();
        assert_eq!(m.to_string(), "b2e2");
        assert!(matches!(
            pos.parse_move("a0a9"),
            Err(MoveParseError::Illegal(_))
        ));
        assert!(matches!(
            pos.parse_move("zz"),
            Err(MoveParseError::BadCoordinates(_))
        ));
    }
}
