//! Core chess engine: board representation, static evaluation and
//! alpha-beta search.
//!
//! The crate is protocol-agnostic. A driver owns a [`Board`] and a
//! [`SearchContext`], applies moves, sets [`Limits`] and calls
//! [`SearchContext::root_search`]; progress flows back through the
//! context's callbacks.

pub mod bitboard;
pub mod eval;
pub mod position;
pub mod search;
pub mod types;

pub use bitboard::Bitboard;
pub use eval::{eval, PawnHashTable};
pub use position::{zobrist, Board, FenError, GenMode, START_FEN};
pub use search::{
    getting_mated_in, giving_mate_in, is_mate_value, perft, Limits, SearchContext, SearchProgress,
    SearchResult, TranspositionTable, INF, MATE, MAX_DEPTH,
};
pub use types::{
    CastleSide, Color, Direction, File, GameResult, Material, Move, MoveList, MoveType, Piece,
    PieceType, Rank, Score, Square, Value,
};
