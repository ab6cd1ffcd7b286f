//! The engine instance a protocol loop drives: one board, one search
//! context, and the little state the protocols share.

use engine_core::{Board, Move, SearchContext, SearchResult};

pub struct Engine {
    pub board: Board,
    pub ctx: SearchContext,
    /// Moves applied since the last position command, for undo support.
    moves_played: Vec<Move>,
    /// Cleared when a position command failed; move commands then refuse
    /// to run until a valid position arrives.
    pub valid_position: bool,
    /// Whether completed iterations are reported (xboard post mode).
    pub post: bool,
    /// xboard force mode: apply moves, never start thinking.
    pub force: bool,
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            board: Board::initial_position(),
            ctx: SearchContext::new(),
            moves_played: Vec::new(),
            valid_position: true,
            post: true,
            force: false,
        }
    }

    pub fn new_game(&mut self) {
        self.board = Board::initial_position();
        self.moves_played.clear();
        self.valid_position = true;
        self.force = false;
        self.ctx.new_game();
        self.ctx.tt.clear();
    }

    pub fn set_position(&mut self, fen: &str) -> bool {
        match Board::from_fen(fen) {
            Ok(board) => {
                self.board = board;
                self.moves_played.clear();
                self.valid_position = true;
                true
            }
            Err(err) => {
                log::warn!("rejected position {fen:?}: {err}");
                self.valid_position = false;
                false
            }
        }
    }

    /// Applies one move given as text. Returns the move on success.
    pub fn apply_move_text(&mut self, text: &str) -> Option<Move> {
        if !self.valid_position {
            return None;
        }
        let m = self.board.move_from_str(text)?;
        self.apply_move(m);
        Some(m)
    }

    pub fn apply_move(&mut self, m: Move) {
        self.board.make_move(m);
        self.moves_played.push(m);
        self.ctx.limits.add_moves(1);
    }

    /// Takes back the last applied move, if any.
    pub fn undo_move(&mut self) -> bool {
        match self.moves_played.pop() {
            Some(m) => {
                self.board.unmake_move(m);
                self.ctx.limits.add_moves(-1);
                true
            }
            None => false,
        }
    }

    /// Runs a search under the currently configured limits.
    pub fn think(&mut self) -> SearchResult {
        log::debug!(
            "thinking on {} (move {})",
            self.board.to_fen(),
            self.board.move_count()
        );
        let result = self.ctx.root_search(&mut self.board);
        log::debug!(
            "best {} value {} nodes {}",
            result.best,
            result.value,
            self.ctx.nodes()
        );
        result
    }
}
