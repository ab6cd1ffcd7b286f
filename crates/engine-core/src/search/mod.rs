//! Best-move search.
//!
//! Implemented techniques: negamax with alpha-beta, principal variation
//! search, quiescence with SEE and delta pruning, a two-entry-cluster
//! transposition table, MVV/LVA ordering with killers and a history
//! heuristic, futility pruning, null-move pruning with verification, mate
//! distance pruning, late move reductions, shallow-depth SEE pruning,
//! history leaf pruning, aspiration windows and internal iterative
//! deepening.
//!
//! All state that engines of this kind traditionally keep in globals
//! lives in [`SearchContext`], owned by the driver and passed to the
//! search by reference.

mod alpha_beta;
mod limits;
mod movepicker;
mod perft;
mod tt;

pub use alpha_beta::SearchResult;
pub use limits::Limits;
pub use movepicker::{History, MovePicker};
pub use perft::perft;
pub use tt::{EntryKind, TranspositionTable};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::eval::PawnHashTable;
use crate::types::{Move, MoveList, Value};

pub const MAX_DEPTH: i32 = 99;

pub const INF: Value = 31000;
pub const MATE: Value = 30000;
/// Beyond any normal evaluation, used by the won-endgame paths.
pub const SURE_WIN: Value = 20000;

#[inline]
pub const fn is_mate_value(value: Value) -> bool {
    (value > MATE - MAX_DEPTH * 2 && value <= MATE)
        || (value < MAX_DEPTH * 2 - MATE && value >= -MATE)
}

/// Full moves until the side to move delivers mate.
#[inline]
pub const fn giving_mate_in(value: Value) -> i32 {
    (MATE + 2 - value) / 2
}

/// Full moves until the side to move is mated.
#[inline]
pub const fn getting_mated_in(value: Value) -> i32 {
    (value + MATE + 1) / 2
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeType {
    NonPv,
    Pv,
}

/// Killer slots for one ply.
#[derive(Clone, Copy, Default)]
pub struct SearchStack {
    pub first_killer: Move,
    pub second_killer: Move,
}

/// One completed-iteration report.
pub struct SearchProgress<'a> {
    pub depth: i32,
    pub value: Value,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: &'a MoveList,
}

pub type ProgressCallback = Box<dyn FnMut(&SearchProgress)>;
/// Invoked periodically so the driver can drain pending input; it may set
/// the stop flag.
pub type InputPoller = Box<dyn FnMut()>;

const STACK_SLOTS: usize = (2 * MAX_DEPTH + 2) as usize;

/// All mutable search state: limits, tables, heuristics and bookkeeping.
/// One context per engine instance; the board is passed in separately.
pub struct SearchContext {
    pub limits: Limits,
    pub tt: TranspositionTable,
    pub pawn_table: PawnHashTable,
    pub(crate) history: History,
    pub(crate) stacks: [SearchStack; STACK_SLOTS],
    pub(crate) pvs: Vec<MoveList>,
    pub(crate) nodes: u64,
    pub(crate) root_depth: i32,
    stop: Arc<AtomicBool>,
    pub(crate) progress: Option<ProgressCallback>,
    pub(crate) input_poller: Option<InputPoller>,
}

impl SearchContext {
    pub fn new() -> SearchContext {
        SearchContext {
            limits: Limits::default(),
            tt: TranspositionTable::new(TranspositionTable::DEFAULT_SIZE),
            pawn_table: PawnHashTable::new(),
            history: History::new(),
            stacks: [SearchStack::default(); STACK_SLOTS],
            pvs: vec![MoveList::new(); STACK_SLOTS],
            nodes: 0,
            root_depth: 0,
            stop: Arc::new(AtomicBool::new(false)),
            progress: None,
            input_poller: None,
        }
    }

    /// The flag a protocol dispatcher flips to abort the search.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    pub fn set_input_poller(&mut self, poller: InputPoller) {
        self.input_poller = Some(poller);
    }

    /// Per-game reset: history, killers, pawn cache.
    pub fn new_game(&mut self) {
        self.history.clear();
        self.stacks = [SearchStack::default(); STACK_SLOTS];
        self.pawn_table.reset();
    }

    #[inline]
    pub(crate) fn must_stop(&self) -> bool {
        self.stop.load(std::sync::atomic::Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, std::sync::atomic::Ordering::Relaxed);
    }

    pub(crate) fn clear_stop(&self) {
        self.stop.store(false, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        SearchContext::new()
    }
}
