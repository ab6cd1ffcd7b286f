//! Pseudo-legal move generation, staged by mode.

use super::Board;
use crate::bitboard::{magics, tables, Bitboard};
use crate::types::{
    castling, CastleSide, Direction, File, Move, MoveList, Piece, PieceType, Rank, Square,
};

/// What subset of pseudo-legal moves to generate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenMode {
    /// Every pseudo-legal move.
    All,
    /// Moves onto enemy-occupied squares, plus queen promotions.
    Captures,
    /// Moves that can address a check: king moves, captures of the
    /// checker, interpositions.
    CheckEvasions,
    /// Non-capturing moves that give direct or discovered check.
    QuietChecks,
}

impl Board {
    /// Fills `moves` with pseudo-legal moves. When the side to move is in
    /// check, any mode but [`GenMode::QuietChecks`] falls back to evasions.
    /// `QuietChecks` appends to the list instead of clearing it, so that
    /// quiescence can stack it on top of the captures.
    pub fn generate_moves(&self, mode: GenMode, moves: &mut MoveList) {
        if mode == GenMode::QuietChecks {
            debug_assert!(!self.is_in_check());
            self.generate_for(mode, moves);
            return;
        }

        moves.clear();

        if mode != GenMode::CheckEvasions && self.is_in_check() {
            self.generate_for(GenMode::CheckEvasions, moves);
            return;
        }

        self.generate_for(mode, moves);
    }

    fn generate_for(&self, mode: GenMode, moves: &mut MoveList) {
        let side = self.side();
        let opponent = side.opposite();

        let up = Direction::relative(side, Direction::Up);
        let up_right = Direction::relative(side, Direction::UpRight);
        let up_left = Direction::relative(side, Direction::UpLeft);
        let down = Direction::relative(side, Direction::Down);
        let down_right = Direction::relative(side, Direction::DownRight);
        let down_left = Direction::relative(side, Direction::DownLeft);
        let rank3 = Bitboard::from_rank(Rank::relative(side, Rank::R3));
        let rank7 = Bitboard::from_rank(Rank::relative(side, Rank::R7));

        let friendly = self.by_color(side);
        let enemy = if mode == GenMode::CheckEvasions {
            // In check only the checker can be captured.
            self.check_givers()
        } else {
            self.by_color(opponent)
        };

        let all_pieces = self.all_pieces();
        let empty_squares = !all_pieces;
        let king_sq = self.king(side);
        let opponent_king_sq = self.king(opponent);

        let trg = match mode {
            GenMode::Captures => enemy,
            // The inclusive between set covers both interposing and
            // capturing the checker.
            GenMode::CheckEvasions => tables::between(king_sq, self.check_givers().lsb()),
            GenMode::QuietChecks => empty_squares,
            GenMode::All => !friendly,
        };

        // King.

        if mode != GenMode::QuietChecks || self.check_blockers(opponent).test(king_sq) {
            let mut attacks = magics::attacks(PieceType::King, king_sq, all_pieces)
                & if mode != GenMode::CheckEvasions {
                    trg
                } else {
                    !friendly
                };

            if mode == GenMode::QuietChecks {
                attacks &= !tables::pseudo_attacks(PieceType::Queen, opponent_king_sq);
            }

            for to in attacks.iter() {
                moves.push(Move::new(king_sq, to));
            }

            if mode == GenMode::CheckEvasions && self.check_givers().more_than_one() {
                // Double check: only the king can move.
                return;
            }
        }

        // Pawns.

        let pawns = self.pawns(side);
        let promotable = pawns & rank7;
        let non_promotable = pawns ^ promotable;

        if mode != GenMode::QuietChecks && promotable.is_not_empty() {
            let mut push_promotions = promotable.shift(up) & empty_squares;
            let left_promotions = promotable.shift(up_left) & enemy;
            let right_promotions = promotable.shift(up_right) & enemy;

            if mode == GenMode::CheckEvasions {
                push_promotions &= trg;
            }

            for (targets, back) in [
                (push_promotions, down),
                (left_promotions, down_right),
                (right_promotions, down_left),
            ] {
                for to in targets.iter() {
                    let from = to.shift(back);
                    moves.push(Move::promotion(from, to, PieceType::Queen));
                    if mode != GenMode::Captures {
                        moves.push(Move::promotion(from, to, PieceType::Rook));
                        moves.push(Move::promotion(from, to, PieceType::Bishop));
                        moves.push(Move::promotion(from, to, PieceType::Knight));
                    }
                }
            }
        }

        if mode != GenMode::QuietChecks && non_promotable.is_not_empty() {
            let left_captures = non_promotable.shift(up_left) & enemy;
            let right_captures = non_promotable.shift(up_right) & enemy;

            for to in left_captures.iter() {
                moves.push(Move::new(to.shift(down_right), to));
            }
            for to in right_captures.iter() {
                moves.push(Move::new(to.shift(down_left), to));
            }

            if let Some(ep) = self.ep() {
                let ep_capturers =
                    pawns & Bitboard::from_square(ep).pawn_attacked_squares(opponent);
                for from in ep_capturers.iter() {
                    moves.push(Move::en_passant(from, ep));
                }
            }
        }

        if mode != GenMode::Captures {
            let mut single_push = non_promotable.shift(up) & empty_squares;
            let mut double_push = (single_push & rank3).shift(up) & empty_squares;

            if mode == GenMode::CheckEvasions {
                single_push &= trg;
                double_push &= trg;
            } else if mode == GenMode::QuietChecks {
                let pawn_checks = tables::pawn_attacks(opponent, opponent_king_sq);
                // Pawns whose advance uncovers a check; pushing along the
                // king's own file uncovers nothing.
                let blockers = self.check_blockers(opponent)
                    & !Bitboard::from_file(opponent_king_sq.file());
                let blocker_pushes = blockers.shift(up);

                single_push &= pawn_checks | blocker_pushes;
                double_push &= pawn_checks | blocker_pushes.shift(up);
            }

            for to in single_push.iter() {
                moves.push(Move::new(to.shift(down), to));
            }
            for to in double_push.iter() {
                moves.push(Move::new(to.shift(down).shift(down), to));
            }
        }

        // Knights, bishops, rooks and queens.
        self.generate_piece_moves(mode, PieceType::Knight, moves, all_pieces, trg);
        self.generate_piece_moves(mode, PieceType::Bishop, moves, all_pieces, trg);
        self.generate_piece_moves(mode, PieceType::Rook, moves, all_pieces, trg);
        self.generate_piece_moves(mode, PieceType::Queen, moves, all_pieces, trg);

        // Castlings.
        if mode == GenMode::All {
            let rights = self.castle_rights();
            let back_rank = Rank::relative(side, Rank::R1);

            if castling::has_right(rights, CastleSide::King, side)
                && (tables::castling_interior(side, CastleSide::King) & all_pieces).is_empty()
            {
                moves.push(Move::castle(king_sq, Square::new(File::G, back_rank)));
            }

            if castling::has_right(rights, CastleSide::Queen, side)
                && (tables::castling_interior(side, CastleSide::Queen) & all_pieces).is_empty()
            {
                moves.push(Move::castle(king_sq, Square::new(File::C, back_rank)));
            }
        }
    }

    fn generate_piece_moves(
        &self,
        mode: GenMode,
        pt: PieceType,
        moves: &mut MoveList,
        all_pieces: Bitboard,
        trg: Bitboard,
    ) {
        let side = self.side();
        let opponent = side.opposite();

        let opponent_king_attacks = if mode == GenMode::QuietChecks {
            // Destination squares from which this piece kind checks the
            // enemy king.
            Board::attacks_of(Piece::new(side, pt), self.king(opponent), all_pieces)
        } else {
            Bitboard::EMPTY
        };

        for from in self.by_piece(Piece::new(side, pt)).iter() {
            let mut attacks = magics::attacks(pt, from, all_pieces) & trg;
            if mode == GenMode::QuietChecks && !self.check_blockers(opponent).test(from) {
                attacks &= opponent_king_attacks;
            }

            for to in attacks.iter() {
                moves.push(Move::new(from, to));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveType;

    fn legal_count(board: &Board, mode: GenMode) -> usize {
        let mut moves = MoveList::new();
        board.generate_moves(mode, &mut moves);
        moves.iter().filter(|m| board.is_legal(*m)).count()
    }

    #[test]
    fn initial_position_has_twenty_moves() {
        let board = Board::initial_position();
        assert_eq!(legal_count(&board, GenMode::All), 20);
        assert_eq!(legal_count(&board, GenMode::Captures), 0);
    }

    #[test]
    fn captures_mode_only_takes() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut moves = MoveList::new();
        board.generate_moves(GenMode::Captures, &mut moves);
        for m in moves.iter() {
            assert!(
                !board.piece_on(m.to()).is_none() || m.move_type() == MoveType::EnPassant,
                "{m} is not a capture"
            );
        }
    }

    #[test]
    fn check_forces_evasions() {
        // White king on e1 checked by a rook on e8.
        let board = Board::from_fen("4r2k/8/8/8/8/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(board.is_in_check());

        let mut moves = MoveList::new();
        // Asking for all moves must produce evasions only.
        board.generate_moves(GenMode::All, &mut moves);
        for m in moves.iter().filter(|m| board.is_legal(*m)) {
            let mut b = Board::from_fen("4r2k/8/8/8/8/8/3P4/4K3 w - - 0 1").unwrap();
            b.make_move(m);
            assert!(
                b.attackers_of(b.side(), b.king(b.side().opposite()), b.all_pieces())
                    .is_empty(),
                "{m} leaves the king in check"
            );
        }
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Rook on e8 and knight on f3 both give check; the white queen
        // could block either line but never both.
        let board = Board::from_fen("4r2k/8/8/8/8/5n2/3Q4/4K3 w - - 0 1").unwrap();
        assert!(board.check_givers().more_than_one());

        let mut moves = MoveList::new();
        board.generate_moves(GenMode::CheckEvasions, &mut moves);
        assert!(!moves.is_empty());
        for m in moves.iter() {
            assert_eq!(board.piece_on(m.from()).piece_type(), PieceType::King);
        }
    }

    #[test]
    fn quiet_checks_land_quiet_checking_moves() {
        // A rook that can slide to the e-file to check the black king.
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut moves = MoveList::new();
        board.generate_moves(GenMode::QuietChecks, &mut moves);
        assert!(moves.iter().any(|m| m.to() == Square::A8));
        for m in moves.iter() {
            assert!(board.is_quiet(m));
            assert!(board.gives_check(m), "{m} does not give check");
        }
    }

    #[test]
    fn en_passant_is_generated() {
        let board =
            Board::from_fen("rnbqkbnr/pp1ppppp/8/8/2pPP3/5P2/PPP3PP/RNBQKBNR b KQkq d3 0 1")
                .unwrap();
        let mut moves = MoveList::new();
        board.generate_moves(GenMode::All, &mut moves);
        assert!(moves
            .iter()
            .any(|m| m.move_type() == MoveType::EnPassant && m.to() == Square::D3));
    }

    #[test]
    fn castling_requires_empty_interior() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut moves = MoveList::new();
        board.generate_moves(GenMode::All, &mut moves);
        let castles: Vec<Move> = moves
            .iter()
            .filter(|m| m.move_type() == MoveType::Castle)
            .collect();
        assert_eq!(castles.len(), 2);

        let blocked = Board::initial_position();
        let mut moves = MoveList::new();
        blocked.generate_moves(GenMode::All, &mut moves);
        assert!(!moves.iter().any(|m| m.move_type() == MoveType::Castle));
    }
}
