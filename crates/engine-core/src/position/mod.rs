//! Board state and the move machinery built on it.
//!
//! The board keeps piece placement three ways at once (square -> piece
//! array, bitboard per piece, bitboard per color) plus incremental material
//! and piece-square accumulators and an undo stack of [`StateInfo`]. Make
//! and unmake follow strict stack discipline: the search only ever extends
//! the stack and rewinds it.

mod fen;
mod movegen;
mod see;
pub mod zobrist;

pub use fen::{FenError, START_FEN};
pub use movegen::GenMode;

use crate::bitboard::{magics, tables, Bitboard};
use crate::eval::params;
use crate::types::{
    castling, Color, File, GameResult, Material, Move, MoveList, MoveType, Piece, PieceType,
    Score, Square, Value,
};

/// Everything that cannot be recomputed cheaply after an unmake.
#[derive(Clone, Default)]
pub struct StateInfo {
    /// Per color: own or enemy pieces that shield that color's king from
    /// exactly one sliding attacker.
    pub check_blockers: [Bitboard; Color::NUM],
    /// Per color: that color's sliders pinning exactly one piece to the
    /// enemy king.
    pub pinners: [Bitboard; Color::NUM],
    /// Opponent pieces currently attacking the side-to-move's king.
    pub check_givers: Bitboard,
    /// Placement hash plus the move-key cadence; side, ep and castling are
    /// folded in by [`Board::full_hash`].
    pub hash: u64,
    /// How many plies ago this position last occurred, 0 when it has not.
    pub last_repetition: u16,
    /// Plies since the last null move.
    pub moves_from_null: u32,
    pub ep: Option<Square>,
    pub captured: Piece,
    pub fifty_rule: u8,
    pub castle_rights: u8,
}

pub struct Board {
    board: [Piece; Square::NUM],
    pieces: [Bitboard; Piece::NUM],
    by_color: [Bitboard; Color::NUM],
    states: Vec<StateInfo>,
    material: [Value; Color::NUM],
    score: [Score; Color::NUM],
    move_count: u32,
    side: Color,
}

impl Board {
    /// An empty board with one root state. Populated by the FEN parser.
    pub(crate) fn empty() -> Board {
        let mut states = Vec::with_capacity(64);
        states.push(StateInfo::default());
        Board {
            board: [Piece::NONE; Square::NUM],
            pieces: [Bitboard::EMPTY; Piece::NUM],
            by_color: [Bitboard::EMPTY; Color::NUM],
            states,
            material: [0; Color::NUM],
            score: [Score::ZERO; Color::NUM],
            move_count: 1,
            side: Color::White,
        }
    }

    pub fn initial_position() -> Board {
        Board::from_fen(fen::START_FEN).expect("the initial position FEN is valid")
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn state(&self) -> &StateInfo {
        self.states.last().expect("state stack is never empty")
    }

    #[inline]
    fn state_mut(&mut self) -> &mut StateInfo {
        self.states.last_mut().expect("state stack is never empty")
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    #[inline]
    pub fn by_piece(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    #[inline]
    pub fn by_color(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    #[inline]
    pub fn by_piece_type(&self, pt: PieceType) -> Bitboard {
        self.pieces[Piece::new(Color::White, pt).index()]
            | self.pieces[Piece::new(Color::Black, pt).index()]
    }

    #[inline]
    pub fn all_pieces(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    pub fn pawns(&self, color: Color) -> Bitboard {
        self.by_piece(Piece::new(color, PieceType::Pawn))
    }

    #[inline]
    pub fn knights(&self, color: Color) -> Bitboard {
        self.by_piece(Piece::new(color, PieceType::Knight))
    }

    #[inline]
    pub fn bishops(&self, color: Color) -> Bitboard {
        self.by_piece(Piece::new(color, PieceType::Bishop))
    }

    #[inline]
    pub fn rooks(&self, color: Color) -> Bitboard {
        self.by_piece(Piece::new(color, PieceType::Rook))
    }

    #[inline]
    pub fn queens(&self, color: Color) -> Bitboard {
        self.by_piece(Piece::new(color, PieceType::Queen))
    }

    #[inline]
    pub fn rooks_and_queens(&self, color: Color) -> Bitboard {
        self.rooks(color) | self.queens(color)
    }

    #[inline]
    pub fn bishops_and_queens(&self, color: Color) -> Bitboard {
        self.bishops(color) | self.queens(color)
    }

    #[inline]
    pub fn king(&self, color: Color) -> Square {
        self.by_piece(Piece::new(color, PieceType::King)).lsb()
    }

    #[inline]
    pub fn side(&self) -> Color {
        self.side
    }

    #[inline]
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    #[inline]
    pub fn material(&self, color: Color) -> Value {
        self.material[color.index()]
    }

    #[inline]
    pub fn score_of(&self, color: Color) -> Score {
        self.score[color.index()]
    }

    #[inline]
    pub fn ep(&self) -> Option<Square> {
        self.state().ep
    }

    #[inline]
    pub fn fifty_rule(&self) -> u8 {
        self.state().fifty_rule
    }

    #[inline]
    pub fn castle_rights(&self) -> u8 {
        self.state().castle_rights
    }

    #[inline]
    pub fn moves_from_null(&self) -> u32 {
        self.state().moves_from_null
    }

    #[inline]
    pub fn check_givers(&self) -> Bitboard {
        self.state().check_givers
    }

    #[inline]
    pub fn check_blockers(&self, color: Color) -> Bitboard {
        self.state().check_blockers[color.index()]
    }

    #[inline]
    pub fn is_in_check(&self) -> bool {
        self.state().check_givers.is_not_empty()
    }

    /// The placement hash; see [`StateInfo::hash`].
    #[inline]
    pub fn hash(&self) -> u64 {
        self.state().hash
    }

    /// The complete position hash used for table probes.
    pub fn full_hash(&self) -> u64 {
        let st = self.state();
        st.hash
            ^ zobrist::ZOBRIST.side[self.side.index()]
            ^ st.ep
                .map_or(0, |sq| zobrist::ZOBRIST.ep[sq.file().index()])
            ^ zobrist::ZOBRIST.castling[(st.castle_rights & 0x3f) as usize]
    }

    /// Whether `color` still has anything besides pawns and the king.
    #[inline]
    pub fn has_non_pawns(&self, color: Color) -> bool {
        (self.by_color(color)
            ^ self.by_piece(Piece::new(color, PieceType::Pawn))
            ^ self.by_piece(Piece::new(color, PieceType::King)))
        .is_not_empty()
    }

    pub fn has_only_same_colored_bishops(&self, color: Color) -> bool {
        let bishops = self.bishops(color);
        (bishops & Bitboard::from_square_color(Color::White)).is_empty()
            || (bishops & Bitboard::from_square_color(Color::Black)).is_empty()
    }

    pub fn has_different_colored_bishops(&self, color: Color) -> bool {
        let bishops = self.bishops(color);
        (bishops & Bitboard::from_square_color(Color::White)).is_not_empty()
            && (bishops & Bitboard::from_square_color(Color::Black)).is_not_empty()
    }

    // =========================================================================
    // Attacks
    // =========================================================================

    /// The pieces of `side` that attack `sq` over the occupancy `occ`.
    pub fn attackers_of(&self, side: Color, sq: Square, occ: Bitboard) -> Bitboard {
        (tables::pawn_attacks(side.opposite(), sq) & self.pawns(side))
            | (magics::attacks(PieceType::Knight, sq, occ) & self.knights(side))
            | (magics::attacks(PieceType::Bishop, sq, occ) & self.bishops(side))
            | (magics::attacks(PieceType::Rook, sq, occ) & self.rooks(side))
            | (magics::attacks(PieceType::Queen, sq, occ) & self.queens(side))
            | (magics::attacks(PieceType::King, sq, occ)
                & self.by_piece(Piece::new(side, PieceType::King)))
    }

    /// Attackers of `sq` from both sides.
    pub fn all_attackers_of(&self, sq: Square, occ: Bitboard) -> Bitboard {
        self.attackers_of(Color::White, sq, occ) | self.attackers_of(Color::Black, sq, occ)
    }

    /// The squares `piece` standing on `sq` attacks over `occ`.
    pub fn attacks_of(piece: Piece, sq: Square, occ: Bitboard) -> Bitboard {
        match piece.piece_type() {
            PieceType::None => Bitboard::EMPTY,
            PieceType::Pawn => tables::pawn_attacks(piece.color(), sq),
            pt => magics::attacks(pt, sq, occ),
        }
    }

    // =========================================================================
    // Legality
    // =========================================================================

    /// Whether a pseudo-legal move leaves the own king safe.
    pub fn is_legal(&self, m: Move) -> bool {
        let from = m.from();
        let to = m.to();

        match m.move_type() {
            MoveType::Simple if self.board[from.index()].piece_type() == PieceType::King => {
                // The destination must be safe once the king vacates its
                // origin square.
                self.attackers_of(
                    self.side.opposite(),
                    to,
                    self.all_pieces() ^ Bitboard::from_square(from),
                )
                .is_empty()
            }
            MoveType::Simple | MoveType::Promotion => {
                !self.check_blockers(self.side).test(from)
                    || tables::are_aligned(from, to, self.king(self.side))
            }
            MoveType::EnPassant => {
                // Rebuild the occupancy as if the capture happened and look
                // for sliders hitting the king through the two vacated
                // squares.
                let king_sq = self.king(self.side);
                let captured_sq = match self.side {
                    Color::White => to.add(-8),
                    Color::Black => to.add(8),
                };
                let occ = (self.all_pieces()
                    ^ Bitboard::from_square(from)
                    ^ Bitboard::from_square(captured_sq))
                    | Bitboard::from_square(to);

                (magics::attacks(PieceType::Rook, king_sq, occ)
                    & self.rooks_and_queens(self.side.opposite()))
                .is_empty()
                    && (magics::attacks(PieceType::Bishop, king_sq, occ)
                        & self.bishops_and_queens(self.side.opposite()))
                    .is_empty()
            }
            MoveType::Castle => {
                // Every square the king passes through, destination
                // included, must be safe. The generator never emits a
                // castle while in check.
                let step: i8 = if to.file() == File::G { -1 } else { 1 };
                let mut sq = to;
                while sq != from {
                    if self
                        .attackers_of(self.side.opposite(), sq, self.all_pieces())
                        .is_not_empty()
                    {
                        return false;
                    }
                    sq = sq.add(step);
                }
                true
            }
        }
    }

    /// True when the move leaves material untouched.
    #[inline]
    pub fn is_quiet(&self, m: Move) -> bool {
        match m.move_type() {
            MoveType::Simple => self.board[m.to().index()].is_none(),
            MoveType::Promotion | MoveType::EnPassant => false,
            MoveType::Castle => true,
        }
    }

    /// Whether the move checks the opposing king, without making it.
    pub fn gives_check(&self, m: Move) -> bool {
        let from = m.from();
        let to = m.to();
        let side = self.board[from.index()].color();
        let opponent = side.opposite();
        let king_sq = self.king(opponent);

        let piece = if m.move_type() != MoveType::Promotion {
            self.board[from.index()]
        } else {
            Piece::new(side, m.promoted_piece())
        };

        // Direct check.
        let mut occ = self.all_pieces() ^ Bitboard::from_square(from);
        if Board::attacks_of(piece, to, occ).test(king_sq) {
            return true;
        }

        // Discovered check.
        if self.check_blockers(opponent).test(from) {
            // Leaving the king-sniper line uncovers the slider; a castling
            // king that was the blocker checks with its rook instead.
            return !tables::are_aligned(from, to, king_sq)
                || m.move_type() == MoveType::Castle;
        }

        match m.move_type() {
            MoveType::Simple | MoveType::Promotion => false,
            MoveType::EnPassant => {
                // The vanished pawn can open a diagonal or a rank.
                let captured_sq = Square::new(to.file(), from.rank());
                if tables::pseudo_attacks(PieceType::Bishop, king_sq).test(captured_sq) {
                    occ.move_bit(captured_sq, to);
                    (magics::attacks(PieceType::Bishop, king_sq, occ)
                        & self.bishops_and_queens(side))
                    .is_not_empty()
                } else if king_sq.rank() == captured_sq.rank() {
                    occ.move_bit(captured_sq, to);
                    (magics::attacks(PieceType::Rook, king_sq, occ)
                        & self.rooks_and_queens(side))
                    .is_not_empty()
                } else {
                    false
                }
            }
            MoveType::Castle => {
                let rook_to = Square::relative(
                    side,
                    if to == Square::relative(side, Square::G1) {
                        Square::F1
                    } else {
                        Square::D1
                    },
                );
                rook_to.file() == king_sq.file()
                    && magics::attacks(PieceType::Rook, king_sq, occ).test(rook_to)
            }
        }
    }

    // =========================================================================
    // Draw rules
    // =========================================================================

    /// Neither side can mate: no pawns and at most a minor piece each.
    pub fn low_material_draw(&self) -> bool {
        self.by_piece_type(PieceType::Pawn).is_empty()
            && self.material[0] < 5
            && self.material[1] < 5
    }

    pub fn fifty_rule_draw(&self) -> bool {
        self.state().fifty_rule >= 100
    }

    /// Three-fold at the game level; during search (`ply > 0`) a single
    /// repetition already counts.
    pub fn repetition_draw(&self, ply: i32) -> bool {
        let last_rep = self.state().last_repetition;
        if last_rep == 0 {
            return false;
        }
        ply > 0 || self.states[self.states.len() - last_rep as usize].last_repetition != 0
    }

    #[inline]
    pub fn is_draw(&self, ply: i32) -> bool {
        self.low_material_draw() || self.fifty_rule_draw() || self.repetition_draw(ply)
    }

    /// The game outcome for the side to move. Slow: generates and verifies
    /// every move, so it is for the drivers, not for the search.
    pub fn compute_game_result(&self) -> GameResult {
        if self.is_draw(0) {
            return GameResult::Draw;
        }

        let mut moves = MoveList::new();
        self.generate_moves(GenMode::All, &mut moves);
        if moves.iter().any(|m| self.is_legal(m)) {
            return GameResult::None;
        }

        if self.is_in_check() {
            match self.side {
                Color::White => GameResult::BlackWon,
                Color::Black => GameResult::WhiteWon,
            }
        } else {
            GameResult::Draw
        }
    }

    // =========================================================================
    // Make / unmake
    // =========================================================================

    pub fn make_move(&mut self, m: Move) {
        let side = self.side;
        self.push_next_state();

        let from = m.from();
        let to = m.to();
        let piece = self.board[from.index()];

        self.move_count += 1;
        self.side = side.opposite();

        let mut hash_xor = zobrist::MOVE_KEY;
        let mut new_ep = None;
        let mut reset_fifty = false;
        let mut captured = Piece::NONE;
        let mut rights_and = 0xffu8;
        let mut rights_or = 0u8;

        match m.move_type() {
            MoveType::Simple => {
                captured = self.move_piece_with_capture(side, piece, from, to);
                if !captured.is_none() {
                    hash_xor ^= zobrist::piece_key(captured, to);
                    reset_fifty = true;
                } else if piece == Piece::new(side, PieceType::Pawn) {
                    reset_fifty = true;
                    if Square::distance(from, to) == 2 {
                        new_ep = Some(match side {
                            Color::White => from.add(8),
                            Color::Black => from.add(-8),
                        });
                    }
                }

                hash_xor ^= zobrist::piece_key(piece, from) ^ zobrist::piece_key(piece, to);
                rights_and &= castling::change_mask(from) & castling::change_mask(to);
            }
            MoveType::Promotion => {
                let promoted = Piece::new(side, m.promoted_piece());
                let push_delta: i32 = match side {
                    Color::White => 8,
                    Color::Black => -8,
                };
                if to.index() as i32 - from.index() as i32 != push_delta {
                    captured = self.promote_pawn_with_capture(side, promoted, from, to);
                    if !captured.is_none() {
                        hash_xor ^= zobrist::piece_key(captured, to);
                    }
                } else {
                    self.promote_pawn(side, true, promoted, from, to);
                }

                hash_xor ^= zobrist::piece_key(Piece::new(side, PieceType::Pawn), from)
                    ^ zobrist::piece_key(promoted, to);
                reset_fifty = true;
                rights_and &= castling::change_mask(from) & castling::change_mask(to);
            }
            MoveType::EnPassant => {
                let pawn = Piece::new(side, PieceType::Pawn);
                self.do_en_passant(side, true, from, to);
                reset_fifty = true;
                hash_xor ^= zobrist::piece_key(pawn, from) ^ zobrist::piece_key(pawn, to);
            }
            MoveType::Castle => {
                let king = Piece::new(side, PieceType::King);
                let rook = Piece::new(side, PieceType::Rook);

                rights_and &= castling::change_mask(from);
                rights_or |= castling::done_mask(side);

                self.do_castling(side, true, from, to);
                hash_xor ^= zobrist::piece_key(king, from) ^ zobrist::piece_key(king, to);

                let (rook_from, rook_to) = if to.file() == File::G {
                    (
                        Square::relative(side, Square::H1),
                        Square::relative(side, Square::F1),
                    )
                } else {
                    (
                        Square::relative(side, Square::A1),
                        Square::relative(side, Square::D1),
                    )
                };
                hash_xor ^=
                    zobrist::piece_key(rook, rook_from) ^ zobrist::piece_key(rook, rook_to);
            }
        }

        {
            let st = self.state_mut();
            st.ep = new_ep;
            st.captured = captured;
            if reset_fifty {
                st.fifty_rule = 0;
            }
            st.castle_rights = (st.castle_rights & rights_and) | rights_or;
            st.hash ^= hash_xor;
        }

        self.update_internal_state();
        self.scan_repetitions();
    }

    pub fn unmake_move(&mut self, m: Move) {
        debug_assert!(self.states.len() > 1);

        let captured = self.state().captured;
        self.states.pop();

        self.move_count -= 1;
        self.side = self.side.opposite();
        let side = self.side;

        let from = m.from();
        let to = m.to();
        let piece = self.board[to.index()];

        match m.move_type() {
            MoveType::Simple => self.unmove_piece_with_capture(side, piece, captured, from, to),
            MoveType::Promotion => {
                let promoted = Piece::new(side, m.promoted_piece());
                if !captured.is_none() {
                    self.unpromote_pawn_with_capture(side, promoted, captured, from, to);
                } else {
                    self.promote_pawn(side, false, promoted, from, to);
                }
            }
            MoveType::EnPassant => self.do_en_passant(side, false, from, to),
            MoveType::Castle => self.do_castling(side, false, from, to),
        }
    }

    /// Skips the side to move. Only used by the search; never legal while
    /// in check.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.is_in_check());

        self.side = self.side.opposite();
        self.push_next_state();
        let st = self.state_mut();
        st.hash ^= zobrist::NULL_MOVE_KEY;
        st.moves_from_null = 0;
        st.ep = None;

        self.update_internal_state();
    }

    pub fn unmake_null_move(&mut self) {
        debug_assert!(self.states.len() > 1);

        self.side = self.side.opposite();
        self.states.pop();
    }

    // =========================================================================
    // Internal state
    // =========================================================================

    pub(crate) fn init_internal_state(&mut self) {
        self.update_internal_state();
    }

    fn update_internal_state(&mut self) {
        let givers = self.attackers_of(self.side.opposite(), self.king(self.side), self.all_pieces());
        {
            let st = self.state_mut();
            st.check_givers = givers;
            st.pinners = [Bitboard::EMPTY; Color::NUM];
        }

        self.update_blockers_for(Color::White);
        self.update_blockers_for(Color::Black);
    }

    /// Recomputes `side`'s check blockers and the opposing pinners.
    fn update_blockers_for(&mut self, side: Color) {
        let king_sq = self.king(side);
        let snipers = (tables::pseudo_attacks(PieceType::Bishop, king_sq)
            & self.bishops_and_queens(side.opposite()))
            | (tables::pseudo_attacks(PieceType::Rook, king_sq)
                & self.rooks_and_queens(side.opposite()));
        let occupancy = self.all_pieces() ^ snipers;

        let mut blockers = Bitboard::EMPTY;
        let mut pinners = Bitboard::EMPTY;
        for sniper in snipers.iter() {
            // The occupancy excludes all snipers, so the inclusive `between`
            // set cannot contain the sniper itself here.
            let b = tables::between(king_sq, sniper) & occupancy;
            if b.is_not_empty() && !b.more_than_one() {
                blockers |= b;
                if (b & self.by_color(side)).is_not_empty() {
                    pinners.set(sniper);
                }
            }
        }

        let st = self.state_mut();
        st.check_blockers[side.index()] = blockers;
        st.pinners[side.opposite().index()] |= pinners;
    }

    /// Pushes a new state inheriting the slow-changing fields.
    fn push_next_state(&mut self) {
        let prev = self.state();
        let next = StateInfo {
            castle_rights: prev.castle_rights,
            fifty_rule: prev.fifty_rule.saturating_add(1),
            moves_from_null: prev.moves_from_null + 1,
            hash: prev.hash,
            ..StateInfo::default()
        };
        self.states.push(next);
    }

    /// Walks back through positions with the same side to move looking for
    /// the current hash. The scan is bounded by the last irreversible move
    /// and the last null move.
    fn scan_repetitions(&mut self) {
        let st = self.state();
        let span = (st.fifty_rule as u32).min(st.moves_from_null) as usize;
        if span < 4 {
            return;
        }

        let len = self.states.len();
        let current = st.hash;
        let floor = (len - span) as isize;
        let mut found = 0u16;
        let mut i = len as isize - 5;
        while i >= floor {
            if self.states[i as usize].hash == current {
                found = (len as isize - i) as u16;
                break;
            }
            i -= 2;
        }

        if found != 0 {
            self.state_mut().last_repetition = found;
        }
    }

    // =========================================================================
    // Placement primitives: bitboards, material and PST kept in sync;
    // the hash and castling rights are the caller's business.
    // =========================================================================

    pub(crate) fn add_piece(&mut self, piece: Piece, to: Square) {
        let side = piece.color();
        self.board[to.index()] = piece;
        self.pieces[piece.index()].set(to);
        self.by_color[side.index()].set(to);
        self.score[side.index()] += params::pst(piece, to);
        self.material[side.index()] += Material::of(piece.piece_type());
    }

    fn move_piece_with_capture(&mut self, side: Color, piece: Piece, from: Square, to: Square) -> Piece {
        let captured = self.board[to.index()];

        self.board[from.index()] = Piece::NONE;
        self.board[to.index()] = piece;
        self.pieces[piece.index()].move_bit(from, to);
        self.by_color[side.index()].move_bit(from, to);
        self.score[side.index()] += params::pst(piece, to) - params::pst(piece, from);

        if !captured.is_none() {
            let opponent = side.opposite();
            self.pieces[captured.index()].clear(to);
            self.by_color[opponent.index()].clear(to);
            self.score[opponent.index()] -= params::pst(captured, to);
            self.material[opponent.index()] -= Material::of(captured.piece_type());
        }

        captured
    }

    fn unmove_piece_with_capture(
        &mut self,
        side: Color,
        piece: Piece,
        captured: Piece,
        from: Square,
        to: Square,
    ) {
        self.board[to.index()] = captured;
        self.board[from.index()] = piece;
        self.pieces[piece.index()].move_bit(from, to);
        self.by_color[side.index()].move_bit(from, to);
        self.score[side.index()] -= params::pst(piece, to) - params::pst(piece, from);

        if !captured.is_none() {
            let opponent = side.opposite();
            self.pieces[captured.index()].set(to);
            self.by_color[opponent.index()].set(to);
            self.score[opponent.index()] += params::pst(captured, to);
            self.material[opponent.index()] += Material::of(captured.piece_type());
        }
    }

    fn do_en_passant(&mut self, side: Color, doing: bool, from: Square, to: Square) {
        let opponent = side.opposite();
        let our_pawn = Piece::new(side, PieceType::Pawn);
        let their_pawn = Piece::new(opponent, PieceType::Pawn);
        let captured_sq = match side {
            Color::White => to.add(-8),
            Color::Black => to.add(8),
        };

        self.pieces[our_pawn.index()].move_bit(from, to);
        self.by_color[side.index()].move_bit(from, to);

        if doing {
            self.board[to.index()] = our_pawn;
            self.board[from.index()] = Piece::NONE;
            self.board[captured_sq.index()] = Piece::NONE;
            self.score[side.index()] += params::pst(our_pawn, to) - params::pst(our_pawn, from);

            self.pieces[their_pawn.index()].clear(captured_sq);
            self.by_color[opponent.index()].clear(captured_sq);
            self.score[opponent.index()] -= params::pst(their_pawn, captured_sq);
            self.material[opponent.index()] -= Material::of(PieceType::Pawn);
        } else {
            self.board[from.index()] = our_pawn;
            self.board[to.index()] = Piece::NONE;
            self.board[captured_sq.index()] = their_pawn;
            self.score[side.index()] -= params::pst(our_pawn, to) - params::pst(our_pawn, from);

            self.pieces[their_pawn.index()].set(captured_sq);
            self.by_color[opponent.index()].set(captured_sq);
            self.score[opponent.index()] += params::pst(their_pawn, captured_sq);
            self.material[opponent.index()] += Material::of(PieceType::Pawn);
        }
    }

    fn promote_pawn(&mut self, side: Color, doing: bool, promoted: Piece, from: Square, to: Square) {
        let pawn = Piece::new(side, PieceType::Pawn);
        let change = Bitboard::from_square(from) | Bitboard::from_square(to);
        let score_delta = params::pst(promoted, to) - params::pst(pawn, from);
        let material_delta = Material::of(promoted.piece_type()) - Material::of(PieceType::Pawn);

        if doing {
            self.board[from.index()] = Piece::NONE;
            self.board[to.index()] = promoted;
            self.pieces[pawn.index()].clear(from);
            self.pieces[promoted.index()].set(to);
            self.by_color[side.index()] ^= change;
            self.score[side.index()] += score_delta;
            self.material[side.index()] += material_delta;
        } else {
            self.board[to.index()] = Piece::NONE;
            self.board[from.index()] = pawn;
            self.pieces[pawn.index()].set(from);
            self.pieces[promoted.index()].clear(to);
            self.by_color[side.index()] ^= change;
            self.score[side.index()] -= score_delta;
            self.material[side.index()] -= material_delta;
        }
    }

    fn promote_pawn_with_capture(
        &mut self,
        side: Color,
        promoted: Piece,
        from: Square,
        to: Square,
    ) -> Piece {
        let opponent = side.opposite();
        let pawn = Piece::new(side, PieceType::Pawn);
        let captured = self.board[to.index()];

        self.board[from.index()] = Piece::NONE;
        self.board[to.index()] = promoted;
        self.pieces[pawn.index()].clear(from);
        self.pieces[promoted.index()].set(to);
        self.by_color[side.index()].move_bit(from, to);
        self.score[side.index()] += params::pst(promoted, to) - params::pst(pawn, from);
        self.material[side.index()] +=
            Material::of(promoted.piece_type()) - Material::of(PieceType::Pawn);

        if !captured.is_none() {
            self.pieces[captured.index()].clear(to);
            self.by_color[opponent.index()].clear(to);
            self.score[opponent.index()] -= params::pst(captured, to);
            self.material[opponent.index()] -= Material::of(captured.piece_type());
        }

        captured
    }

    fn unpromote_pawn_with_capture(
        &mut self,
        side: Color,
        promoted: Piece,
        captured: Piece,
        from: Square,
        to: Square,
    ) {
        let opponent = side.opposite();
        let pawn = Piece::new(side, PieceType::Pawn);

        self.board[to.index()] = captured;
        self.board[from.index()] = pawn;
        self.pieces[pawn.index()].set(from);
        self.pieces[promoted.index()].clear(to);
        self.by_color[side.index()].move_bit(from, to);
        self.score[side.index()] -= params::pst(promoted, to) - params::pst(pawn, from);
        self.material[side.index()] -=
            Material::of(promoted.piece_type()) - Material::of(PieceType::Pawn);

        if !captured.is_none() {
            self.pieces[captured.index()].set(to);
            self.by_color[opponent.index()].set(to);
            self.score[opponent.index()] += params::pst(captured, to);
            self.material[opponent.index()] += Material::of(captured.piece_type());
        }
    }

    fn do_castling(&mut self, side: Color, doing: bool, from: Square, to: Square) {
        let king = Piece::new(side, PieceType::King);
        let rook = Piece::new(side, PieceType::Rook);

        let (king_from, king_to) = if doing { (from, to) } else { (to, from) };
        let (rook_home, rook_castled) = if to.file() == File::G {
            (
                Square::relative(side, Square::H1),
                Square::relative(side, Square::F1),
            )
        } else {
            (
                Square::relative(side, Square::A1),
                Square::relative(side, Square::D1),
            )
        };
        let (rook_from, rook_to) = if doing {
            (rook_home, rook_castled)
        } else {
            (rook_castled, rook_home)
        };

        self.board[king_from.index()] = Piece::NONE;
        self.board[king_to.index()] = king;
        self.board[rook_from.index()] = Piece::NONE;
        self.board[rook_to.index()] = rook;
        self.pieces[king.index()].move_bit(king_from, king_to);
        self.pieces[rook.index()].move_bit(rook_from, rook_to);
        self.by_color[side.index()].move_bit(king_from, king_to);
        self.by_color[side.index()].move_bit(rook_from, rook_to);
        self.score[side.index()] += params::pst(king, king_to) - params::pst(king, king_from)
            + params::pst(rook, rook_to)
            - params::pst(rook, rook_from);
    }

    // Mutable hooks for the FEN parser.

    pub(crate) fn set_side(&mut self, side: Color) {
        self.side = side;
    }

    pub(crate) fn set_move_count(&mut self, count: u32) {
        self.move_count = count;
    }

    pub(crate) fn state_for_setup(&mut self) -> &mut StateInfo {
        self.state_mut()
    }
}
