//! Forsyth-Edwards Notation parsing and printing, plus move-string lookup.

use thiserror::Error;

use super::{zobrist, Board, GenMode};
use crate::types::{
    castling, Color, File, Move, MoveList, MoveType, Piece, PieceType, Rank, Square,
};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("unexpected piece character {0:?}")]
    BadPiece(char),
    #[error("placement runs off the board")]
    BadPlacement,
    #[error("missing or invalid side to move")]
    BadSide,
    #[error("invalid castling rights character {0:?}")]
    BadCastling(char),
    #[error("invalid en passant square")]
    BadEnPassant,
    #[error("invalid counter field {0:?}")]
    BadCounter(String),
    #[error("kings missing or doubled")]
    BadKings,
}

impl Board {
    /// Parses a FEN string. Fields after the castling rights may be
    /// truncated; the fifty-rule counter then defaults to 0 and the move
    /// number to 1.
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let mut board = Board::empty();
        let mut fields = fen.split_whitespace();

        // Piece placement, rank 8 down to rank 1.
        let placement = fields.next().ok_or(FenError::BadPlacement)?;
        let mut sq_index = Square::A8.index() as i32;
        for ch in placement.chars() {
            if let Some(skip) = ch.to_digit(10) {
                sq_index += skip as i32;
                continue;
            }
            if ch == '/' {
                // One rank down from the rank just filled.
                sq_index = ((sq_index - 1) / 8 - 1) * 8;
                if sq_index < 0 {
                    return Err(FenError::BadPlacement);
                }
                continue;
            }

            let piece = Piece::from_fen_char(ch).ok_or(FenError::BadPiece(ch))?;
            if sq_index >= 64 || sq_index < 0 {
                return Err(FenError::BadPlacement);
            }
            let sq = Square::from_index(sq_index as usize);
            board.add_piece(piece, sq);
            board.state_for_setup().hash ^= zobrist::piece_key(piece, sq);
            sq_index += 1;
        }

        if board.by_piece(Piece::W_KING).count() != 1 || board.by_piece(Piece::B_KING).count() != 1
        {
            return Err(FenError::BadKings);
        }

        // Side to move.
        let side_field = fields.next().ok_or(FenError::BadSide)?;
        let side = side_field
            .chars()
            .next()
            .and_then(Color::from_fen_char)
            .ok_or(FenError::BadSide)?;
        board.set_side(side);
        board.state_for_setup().hash ^= zobrist::ZOBRIST.side[side.index()];

        // Castling rights.
        if let Some(rights_field) = fields.next() {
            if rights_field != "-" {
                let mut rights = 0u8;
                for ch in rights_field.chars() {
                    rights |= castling::mask_from_fen_char(ch).ok_or(FenError::BadCastling(ch))?;
                }
                board.state_for_setup().castle_rights = rights;
            }
        }

        // En passant square.
        if let Some(ep_field) = fields.next() {
            if ep_field != "-" {
                let mut chars = ep_field.chars();
                let (f, r) = (
                    chars.next().ok_or(FenError::BadEnPassant)?,
                    chars.next().ok_or(FenError::BadEnPassant)?,
                );
                board.state_for_setup().ep =
                    Some(Square::from_chars(f, r).ok_or(FenError::BadEnPassant)?);
            }
        }

        // Fifty-move counter.
        if let Some(fifty_field) = fields.next() {
            let fifty: u8 = fifty_field
                .parse()
                .map_err(|_| FenError::BadCounter(fifty_field.to_string()))?;
            board.state_for_setup().fifty_rule = fifty;
        }

        // Full-move number; the internal counter is plies from move one.
        let mut move_number = 1u32;
        if let Some(moves_field) = fields.next() {
            move_number = moves_field
                .parse()
                .map_err(|_| FenError::BadCounter(moves_field.to_string()))?;
        }
        let plies = if move_number > 0 {
            2 * (move_number - 1)
        } else {
            0
        };
        board.set_move_count(plies + side.opposite() as u32);

        board.init_internal_state();
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(87);

        for rank in Rank::ALL.iter().rev() {
            let mut empties = 0;
            for file in File::ALL {
                let piece = self.piece_on(Square::new(file, *rank));
                if piece.is_none() {
                    empties += 1;
                    continue;
                }
                if empties > 0 {
                    fen.push((b'0' + empties) as char);
                    empties = 0;
                }
                fen.push(piece.to_char());
            }
            if empties > 0 {
                fen.push((b'0' + empties) as char);
            }
            if *rank != Rank::R1 {
                fen.push('/');
            }
        }

        fen.push_str(match self.side() {
            Color::Black => " b ",
            Color::White => " w ",
        });

        let rights = self.castle_rights();
        if castling::has_any_right(rights) {
            for color in [Color::White, Color::Black] {
                for side in [crate::types::CastleSide::King, crate::types::CastleSide::Queen] {
                    if castling::has_right(rights, side, color) {
                        fen.push(castling::to_fen_char(side, color));
                    }
                }
            }
            fen.push(' ');
        } else {
            fen.push_str("- ");
        }

        match self.ep() {
            Some(sq) => {
                fen.push_str(&sq.to_string());
                fen.push(' ');
            }
            None => fen.push_str("- "),
        }

        fen.push_str(&self.fifty_rule().to_string());
        fen.push(' ');

        let move_number = if self.move_count() > 0 {
            (self.move_count() - self.side().opposite() as u32) / 2 + 1
        } else {
            1
        };
        fen.push_str(&move_number.to_string());

        fen
    }

    /// Looks a move up by its long algebraic text (or `0-0` / `0-0-0`).
    /// Returns `None` when the text does not describe a legal move in this
    /// position.
    pub fn move_from_str(&self, text: &str) -> Option<Move> {
        let (from, to) = if text == "0-0" {
            (
                Square::relative(self.side(), Square::E1),
                Square::relative(self.side(), Square::G1),
            )
        } else if text == "0-0-0" {
            (
                Square::relative(self.side(), Square::E1),
                Square::relative(self.side(), Square::C1),
            )
        } else {
            let mut chars = text.chars();
            let from = Square::from_chars(chars.next()?, chars.next()?)?;
            let to = Square::from_chars(chars.next()?, chars.next()?)?;
            (from, to)
        };

        if !self.by_color(self.side()).test(from)
            || self.by_color(self.side()).test(to)
            || from == to
        {
            return None;
        }

        let mut moves = MoveList::new();
        self.generate_moves(GenMode::All, &mut moves);
        for m in moves.iter() {
            if m.from() == from && m.to() == to {
                if !self.is_legal(m) {
                    return None;
                }
                if m.move_type() == MoveType::Promotion {
                    let promoted = text
                        .chars()
                        .nth(4)
                        .and_then(PieceType::from_promotion_char)
                        .unwrap_or(PieceType::Knight);
                    return Some(Move::promotion(from, to, promoted));
                }
                return Some(m);
            }
        }

        None
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "+---+---+---+---+---+---+---+---+")?;
        for rank in Rank::ALL.iter().rev() {
            for file in File::ALL {
                write!(f, "| {} ", self.piece_on(Square::new(file, *rank)).to_char())?;
            }
            writeln!(f, "| {}", rank.to_char())?;
            writeln!(f, "+---+---+---+---+---+---+---+---+")?;
        }
        writeln!(f, "  a   b   c   d   e   f   g   h")?;
        write!(f, "FEN: {}", self.to_fen())
    }
}
