//! Static Exchange Evaluation.
//!
//! Simulates the capture sequence on the destination square, always
//! answering with the least valuable attacker, and folds the resulting
//! gain stack with alternating min/max into the net material swing from
//! the mover's perspective. Pinned pieces stay out of the exchange while
//! their pinner is on the board; removing a slider can uncover x-ray
//! attackers behind it.

use super::Board;
use crate::bitboard::{magics, Bitboard};
use crate::eval::params::simplified_value;
use crate::types::{Color, Move, MoveType, Piece, PieceType, Square, Value};

impl Board {
    /// Net material outcome of the capture sequence started by `m`, in
    /// simplified piece values. Castling scores 0.
    pub fn see(&self, m: Move) -> Value {
        let to = m.to();
        let from = m.from();
        let mut occ = self.all_pieces();

        let mut result: Value;
        // The value the next capture on `to` would win back.
        let mut next_loss: Value;

        match m.move_type() {
            MoveType::Promotion => {
                next_loss = simplified_value(m.promoted_piece());
                result = simplified_value(self.piece_on(to).piece_type()) + next_loss
                    - simplified_value(PieceType::Pawn);
                occ.clear(from);
            }
            MoveType::Simple => {
                result = simplified_value(self.piece_on(to).piece_type());
                next_loss = simplified_value(self.piece_on(from).piece_type());
                occ.clear(from);
            }
            MoveType::EnPassant => {
                let captured_sq = Square::new(to.file(), from.rank());
                result = simplified_value(PieceType::Pawn);
                next_loss = simplified_value(PieceType::Pawn);
                occ.clear(captured_sq);
                occ.clear(from);
            }
            MoveType::Castle => return 0,
        }

        let mut gains = [0 as Value; 36];
        gains[0] = result;
        let mut depth = 0usize;

        let mut side = self.side();
        let mut attackers = self.all_attackers_of(to, occ);
        let mut modifier: Value = 1;

        let all_bishops_queens =
            self.bishops_and_queens(Color::White) | self.bishops_and_queens(Color::Black);
        let all_rooks_queens =
            self.rooks_and_queens(Color::White) | self.rooks_and_queens(Color::Black);

        'exchange: loop {
            side = side.opposite();
            attackers &= occ;
            let mut current_attackers = attackers & self.by_color(side);

            // While a pinner is still standing, its pinned pieces cannot
            // join the exchange.
            if (occ & self.state().pinners[side.opposite().index()]).is_not_empty() {
                current_attackers &= !self.check_blockers(side);
            }

            if current_attackers.is_empty() {
                break;
            }

            modifier = -modifier;

            // Least valuable attacker first.
            for pt in [
                PieceType::Pawn,
                PieceType::Knight,
                PieceType::Bishop,
                PieceType::Rook,
                PieceType::Queen,
            ] {
                let b = current_attackers & self.by_piece(Piece::new(side, pt));
                if b.is_empty() {
                    continue;
                }

                result += modifier * next_loss;
                next_loss = simplified_value(pt);
                depth += 1;
                gains[depth] = result;

                occ.clear(b.lsb());

                // Uncovered x-ray attackers join in behind the piece that
                // just captured.
                match pt {
                    PieceType::Pawn | PieceType::Bishop => {
                        attackers |= magics::attacks(PieceType::Bishop, to, occ)
                            & all_bishops_queens;
                    }
                    PieceType::Rook => {
                        attackers |=
                            magics::attacks(PieceType::Rook, to, occ) & all_rooks_queens;
                    }
                    PieceType::Queen => {
                        attackers |= (magics::attacks(PieceType::Bishop, to, occ)
                            & all_bishops_queens)
                            | (magics::attacks(PieceType::Rook, to, occ) & all_rooks_queens);
                    }
                    _ => {}
                }

                continue 'exchange;
            }

            // Only the king is left; it may capture only if the other side
            // has no answer.
            if (attackers & self.by_color(side.opposite()) & occ).is_empty() {
                let b = current_attackers & self.by_piece(Piece::new(side, PieceType::King));
                if b.is_not_empty() {
                    result += modifier * next_loss;
                }
                depth += 1;
                gains[depth] = result;
            }

            break;
        }

        // Fold the gain stack from the tail: each side stands pat when
        // continuing the exchange would hurt it.
        while depth > 0 {
            if depth & 1 == 1 {
                gains[depth - 1] = gains[depth - 1].min(gains[depth]);
            } else {
                gains[depth - 1] = gains[depth - 1].max(gains[depth]);
            }
            depth -= 1;
        }

        gains[0]
    }
}
