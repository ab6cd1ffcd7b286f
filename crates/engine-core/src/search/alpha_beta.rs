//! Iterative-deepening alpha-beta with quiescence.

use crate::eval::{eval, params::simplified_value};
use crate::position::{Board, GenMode};
use crate::types::{Move, MoveList, MoveType, PieceType, Value};

use super::movepicker::MovePicker;
use super::tt::{EntryKind, KIND_PV_BIT};
use super::{
    is_mate_value, NodeType, SearchContext, SearchProgress, SearchStack, INF, MATE, MAX_DEPTH,
};

/// The outcome of one root search: the move to play and its value.
#[derive(Clone, Copy, Debug)]
pub struct SearchResult {
    pub best: Move,
    pub value: Value,
}

const DELTA_PRUNING_MARGIN: Value = 200;

const MAX_QPLY_FOR_CHECKS: i32 = 2;
const MIN_NULLMOVE_DEPTH: i32 = 2;
const NULLMOVE_DEPTH_REDUCTION_BASE: i32 = 3;
const MIN_NULLMOVE_VERIFICATION_DEPTH: i32 = 5;
const MIN_LMR_DEPTH: i32 = 3;
const MAX_LOW_DEPTH_SEE_PRUNING_DEPTH: i32 = 3;

const NULLMOVE_HIGH_DEPTH_DENOMINATOR: i32 = 5;
const NULLMOVE_BETA_DIFFERENCE_DENOMINATOR: Value = 300;
const LMR_MAX_HISTORY_SUCCESS_RATE: Value = 75;
const LMR_MIN_QUIETS_COUNT: u32 = 2;
const LMR_HIGH_DEPTH_DENOMINATOR: i32 = 9;
const LMR_MANY_QUIETS_DENOMINATOR: u32 = 9;

const ASPIRATION_WINDOWS: [Value; 4] = [35, 110, 450, 2 * INF];
const FUTILITY_MARGIN: [Value; 5] = [0, 50, 200, 400, 700];
const HISTORY_LEAF_MAX_SUCCESS_RATE: [Value; 5] = [0, 20, 12, 7, 3];

impl SearchContext {
    /// Iterative deepening from the root with an aspiration window.
    /// Returns the best move of the last completed iteration.
    pub fn root_search(&mut self, board: &mut Board) -> SearchResult {
        let mut last_best = Move::NONE;
        let mut last_value = 0;
        let mut result = 0;

        self.clear_stop();
        self.nodes = 0;
        self.root_depth = 0;

        self.history.age();
        self.tt.set_root_age(board.move_count() as u16);
        self.stacks = [SearchStack::default(); super::STACK_SLOTS];

        loop {
            self.root_depth += 1;
            if self.limits.is_depth_limit_broken(self.root_depth) {
                break;
            }

            // Start tight around the previous result and widen the failing
            // side tier by tier. The first iteration has no previous result
            // and goes straight to the widest window.
            let mut failed_low = if self.root_depth < 2 {
                ASPIRATION_WINDOWS.len() - 1
            } else {
                0
            };
            let mut failed_high = failed_low;

            let mut alpha = (result - ASPIRATION_WINDOWS[failed_low]).max(-INF);
            let mut beta = (result + ASPIRATION_WINDOWS[failed_high]).min(INF);

            loop {
                result = self.search(board, NodeType::Pv, alpha, beta, self.root_depth, 0);

                if self.must_stop() {
                    return SearchResult {
                        best: last_best,
                        value: last_value,
                    };
                }

                if result <= alpha && failed_low < ASPIRATION_WINDOWS.len() - 1 {
                    failed_low += 1;
                } else if result >= beta && failed_high < ASPIRATION_WINDOWS.len() - 1 {
                    failed_high += 1;
                } else {
                    break;
                }

                alpha = (result - ASPIRATION_WINDOWS[failed_low]).max(-INF);
                beta = (result + ASPIRATION_WINDOWS[failed_high]).min(INF);
            }

            if let Some(mut callback) = self.progress.take() {
                let report = SearchProgress {
                    depth: self.root_depth,
                    value: result,
                    nodes: self.nodes,
                    elapsed: self.limits.elapsed(),
                    pv: &self.pvs[0],
                };
                callback(&report);
                self.progress = Some(callback);
            }

            let best = if self.pvs[0].is_empty() {
                Move::NONE
            } else {
                self.pvs[0].get(0)
            };

            // Between iterations is the perfect moment to stop.
            if self.limits.is_soft_limit_broken() {
                return SearchResult {
                    best,
                    value: result,
                };
            }

            last_best = best;
            last_value = result;
        }

        SearchResult {
            best: last_best,
            value: last_value,
        }
    }

    fn search(
        &mut self,
        board: &mut Board,
        nt: NodeType,
        mut alpha: Value,
        mut beta: Value,
        depth: i32,
        ply: i32,
    ) -> Value {
        // The leaf checks all happen inside quiescence.
        if depth <= 0 {
            return self.quiescence(board, nt, alpha, beta, ply, 0);
        }

        if self.must_stop() {
            return alpha;
        }

        if self.nodes & 0x1ff == 0 {
            if self.limits.is_hard_limit_broken() || self.limits.is_nodes_limit_broken(self.nodes)
            {
                self.request_stop();
                return alpha;
            }
            if self.nodes & 0x1fff == 0 {
                if let Some(poller) = self.input_poller.as_mut() {
                    poller();
                }
            }
        }

        self.pvs[ply as usize].clear();

        if board.is_draw(ply) {
            return 0;
        }

        if ply > MAX_DEPTH {
            return alpha;
        }

        // Mate distance pruning: no line from here can beat an already
        // known closer mate.
        if nt != NodeType::Pv {
            alpha = alpha.max(-MATE + ply);
            beta = beta.min(MATE - ply);
            if alpha >= beta {
                return alpha;
            }
        }

        // Transposition table.
        let full_hash = board.full_hash();
        let mut table_move = Move::NONE;
        if let Some(entry) = self.tt.probe(full_hash) {
            if entry.depth as i32 >= depth && ply > 0 && (entry.is_pv_node() || nt != NodeType::Pv)
            {
                let value = entry.value_at(ply);
                match entry.bound() {
                    b if b == EntryKind::Exact as u8 => return value,
                    b if b == EntryKind::Alpha as u8 => {
                        if value <= alpha {
                            return alpha;
                        }
                    }
                    b if b == EntryKind::Beta as u8 => {
                        if value >= beta {
                            return beta;
                        }
                    }
                    _ => {}
                }
            }
            table_move = entry.table_move();
        }

        let is_in_check = board.is_in_check();
        if nt != NodeType::Pv && !is_in_check {
            let static_eval = eval(board, &mut self.pawn_table);

            // Futility: hopeless nodes drop straight into quiescence,
            // overwhelming ones fail high.
            if depth <= 4 {
                let margin = FUTILITY_MARGIN[depth as usize];
                if static_eval <= alpha - margin {
                    return self.quiescence(board, NodeType::Pv, alpha, beta, ply, 0);
                }
                if static_eval >= beta + margin {
                    return beta;
                }
            }

            // Null move: hand the opponent a free shot; surviving it at
            // reduced depth proves the cut.
            if static_eval >= beta
                && depth >= MIN_NULLMOVE_DEPTH
                && board.has_non_pawns(board.side())
            {
                let reduction = (NULLMOVE_DEPTH_REDUCTION_BASE
                    + (depth - MIN_NULLMOVE_DEPTH) / NULLMOVE_HIGH_DEPTH_DENOMINATOR
                    + ((static_eval - beta) / NULLMOVE_BETA_DIFFERENCE_DENOMINATOR).max(0))
                .max(0);

                board.make_null_move();
                let mut tmp = -self.search(
                    board,
                    NodeType::NonPv,
                    -beta,
                    -beta + 1,
                    depth - reduction,
                    ply + 1,
                );
                board.unmake_null_move();

                if self.must_stop() {
                    return alpha;
                }

                if tmp >= beta {
                    if is_mate_value(tmp) {
                        tmp = beta;
                    }

                    if depth >= MIN_NULLMOVE_VERIFICATION_DEPTH {
                        // Zugzwang guard: same window, same reduced depth,
                        // this time with a real move.
                        let verification =
                            self.search(board, NodeType::NonPv, beta - 1, beta, depth - reduction, ply);
                        if verification >= beta {
                            return tmp;
                        }
                    } else {
                        return tmp;
                    }
                }
            }
        }

        // Internal iterative deepening for an ordering hint when the table
        // had none.
        if table_move.is_none() && depth > 6 {
            self.search(board, nt, alpha, beta, depth - 6, ply);
            if !self.pvs[ply as usize].is_empty() {
                table_move = self.pvs[ply as usize].get(0);
            }
        }

        // Move loop.

        let mut legal_moves = 0u32;
        let mut quiet_moves = 0u32;
        let mut entry_kind = EntryKind::Alpha;
        let mut best_move = Move::NONE;

        let killers = (
            self.stacks[ply as usize].first_killer,
            self.stacks[ply as usize].second_killer,
        );
        self.stacks[(ply + 2) as usize] = SearchStack::default();

        let mut moves = MoveList::new();
        board.generate_moves(GenMode::All, &mut moves);

        let mut picker = MovePicker::new(&mut moves, board, table_move, killers, &self.history);
        while picker.has_more() {
            let m = picker.pick();
            if !board.is_legal(m) {
                continue;
            }

            legal_moves += 1;

            let is_quiet = board.is_quiet(m);
            if nt != NodeType::Pv
                && depth <= MAX_LOW_DEPTH_SEE_PRUNING_DEPTH
                && !is_in_check
                && board.has_non_pawns(board.side())
            {
                // Losing exchanges near the leaf are not worth a node.
                if board.see(m) <= -simplified_value(PieceType::Pawn) * depth {
                    continue;
                }

                // Quiets with a rotten track record go too, unless they
                // check.
                if is_quiet {
                    quiet_moves += 1;
                    if quiet_moves > LMR_MIN_QUIETS_COUNT {
                        let rate = self.history.value(board.piece_on(m.from()), m.to());
                        if rate < HISTORY_LEAF_MAX_SUCCESS_RATE[depth as usize]
                            && !board.gives_check(m)
                        {
                            continue;
                        }
                    }
                }
            }

            if is_quiet && !is_in_check {
                self.history.add_try(board.piece_on(m.from()), m.to(), depth);
            }

            self.nodes += 1;
            board.make_move(m);

            // Late move reductions for quiet moves past the first two.
            let mut reduction = 0;
            if depth >= MIN_LMR_DEPTH && !is_in_check && !board.is_in_check() && is_quiet {
                let rate = self.history.value(board.piece_on(m.to()), m.to());

                if rate < LMR_MAX_HISTORY_SUCCESS_RATE {
                    quiet_moves += 1;
                    if quiet_moves > LMR_MIN_QUIETS_COUNT {
                        reduction = 1
                            + (depth - MIN_LMR_DEPTH) / LMR_HIGH_DEPTH_DENOMINATOR
                            + ((quiet_moves - LMR_MIN_QUIETS_COUNT) / LMR_MANY_QUIETS_DENOMINATOR)
                                as i32;

                        if rate > 50 {
                            reduction -= 1;
                        } else if rate < 10 {
                            reduction += 1;
                            if rate < 2 {
                                reduction += 1;
                            }
                        }

                        if reduction >= depth {
                            reduction = depth - 1;
                        }
                    }
                }
            }

            // Principal variation search: full window for the first legal
            // move, zero width for the rest, re-searching on surprises.
            let mut tmp;
            if legal_moves == 1 {
                tmp = -self.search(board, nt, -beta, -alpha, depth - 1, ply + 1);
            } else {
                tmp = -self.search(
                    board,
                    NodeType::NonPv,
                    -alpha - 1,
                    -alpha,
                    depth - 1 - reduction,
                    ply + 1,
                );
                if tmp > alpha && reduction > 0 {
                    // The reduction was too optimistic.
                    tmp = -self.search(board, NodeType::NonPv, -alpha - 1, -alpha, depth - 1, ply + 1);
                }
                if nt == NodeType::Pv && tmp > alpha && tmp < beta {
                    tmp = -self.search(board, NodeType::Pv, -beta, -alpha, depth - 1, ply + 1);
                }
            }

            board.unmake_move(m);
            if self.must_stop() {
                return alpha;
            }

            if tmp > alpha {
                alpha = tmp;
                entry_kind = EntryKind::Exact;
                best_move = m;
                self.update_pv(ply as usize, m);
            } else if ply == 0 && legal_moves == 1 {
                // The root always keeps some move as its line.
                self.update_pv(0, m);
            }

            if alpha >= beta {
                if is_quiet && !is_in_check {
                    self.history.add_success(board.piece_on(m.from()), m.to(), depth);
                    let ss = &mut self.stacks[ply as usize];
                    if ss.first_killer.data() != m.data() {
                        ss.second_killer = ss.first_killer;
                        ss.first_killer = m;
                    }
                }

                entry_kind = EntryKind::Beta;
                break;
            }
        }

        if legal_moves == 0 {
            alpha = if board.is_in_check() {
                -MATE + ply // Mated.
            } else {
                0 // Stalemate.
            };
        }

        let kind = entry_kind as u8
            | if nt == NodeType::Pv { KIND_PV_BIT } else { 0 };
        self.tt.record(
            kind,
            full_hash,
            best_move.data(),
            alpha,
            board.move_count() as u16,
            depth as u8,
            ply,
        );

        alpha
    }

    fn quiescence(
        &mut self,
        board: &mut Board,
        nt: NodeType,
        mut alpha: Value,
        beta: Value,
        ply: i32,
        qply: i32,
    ) -> Value {
        if self.must_stop() {
            return alpha;
        }

        if self.nodes & 0x1ff == 0 {
            if self.limits.is_hard_limit_broken() || self.limits.is_nodes_limit_broken(self.nodes)
            {
                self.request_stop();
                return alpha;
            }
            if self.nodes & 0x1fff == 0 {
                if let Some(poller) = self.input_poller.as_mut() {
                    poller();
                }
            }
        }

        if nt == NodeType::Pv {
            self.pvs[ply as usize].clear();
        }

        if board.is_draw(ply) {
            return 0;
        }

        if ply > MAX_DEPTH {
            return alpha;
        }

        let static_eval = eval(board, &mut self.pawn_table);
        let is_in_check = board.is_in_check();
        if !is_in_check {
            // Standing pat: the side to move may decline all captures.
            if static_eval >= beta {
                return static_eval;
            }
            if static_eval > alpha {
                alpha = static_eval;
            }
        }

        let mut legal_moves = 0u32;

        let mut moves = MoveList::new();
        board.generate_moves(GenMode::Captures, &mut moves);
        if !is_in_check && qply < MAX_QPLY_FOR_CHECKS {
            board.generate_moves(GenMode::QuietChecks, &mut moves);
        }

        let mut picker = MovePicker::new(
            &mut moves,
            board,
            Move::NONE,
            (Move::NONE, Move::NONE),
            &self.history,
        );
        while picker.has_more() {
            let m = picker.pick();
            if !board.is_legal(m) {
                continue;
            }

            legal_moves += 1;

            if !is_in_check && board.has_non_pawns(board.side()) {
                // Delta pruning: even winning the piece with a surplus
                // margin cannot reach alpha.
                if m.move_type() != MoveType::Promotion {
                    let captured = if m.move_type() == MoveType::EnPassant {
                        PieceType::Pawn
                    } else {
                        board.piece_on(m.to()).piece_type()
                    };

                    if static_eval + simplified_value(captured) + DELTA_PRUNING_MARGIN <= alpha
                        && !board.gives_check(m)
                    {
                        continue;
                    }
                }

                // Losing exchanges are not worth resolving.
                if board.see(m) < 0 {
                    continue;
                }
            }

            self.nodes += 1;
            board.make_move(m);
            let tmp = -self.quiescence(board, nt, -beta, -alpha, ply + 1, qply + 1);
            board.unmake_move(m);

            if self.must_stop() {
                return alpha;
            }

            if tmp > alpha {
                alpha = tmp;
                if nt == NodeType::Pv {
                    self.update_pv(ply as usize, m);
                }
            }

            if alpha >= beta {
                break;
            }
        }

        if legal_moves == 0 && is_in_check {
            return -MATE + ply;
        }

        alpha
    }

    /// Sets this ply's PV to `m` followed by the child PV.
    fn update_pv(&mut self, ply: usize, m: Move) {
        let (head, tail) = self.pvs.split_at_mut(ply + 1);
        let pv = &mut head[ply];
        pv.clear();
        pv.push(m);
        pv.overwrite_from(&tail[0], 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_to_depth(fen: &str, depth: i32) -> (SearchResult, SearchContext) {
        let mut board = Board::from_fen(fen).unwrap();
        let mut ctx = SearchContext::new();
        ctx.limits.make_infinite();
        ctx.limits.set_depth_limit(depth);
        let result = ctx.root_search(&mut board);
        (result, ctx)
    }

    #[test]
    fn finds_mate_in_one() {
        // Back-rank mate: Ra8#.
        let (result, _) = search_to_depth("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4);
        assert_eq!(result.best.to_string(), "a1a8");
        assert_eq!(result.value, MATE - 1);
    }

    #[test]
    fn finds_mate_in_two() {
        // A classic two-rook ladder: lift the second rook and mate.
        let (result, _) = search_to_depth("7k/8/8/8/8/8/R7/1R4K1 w - - 0 1", 6);
        assert!(is_mate_value(result.value), "value {}", result.value);
        assert_eq!(super::super::giving_mate_in(result.value), 2);
    }

    #[test]
    fn prefers_winning_a_queen() {
        // A hanging queen should be taken.
        let (result, _) = search_to_depth("3q2k1/8/8/8/8/8/8/3R2K1 w - - 0 1", 4);
        assert_eq!(result.best.to_string(), "d1d8");
    }

    #[test]
    fn board_is_restored_after_search() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut board = Board::from_fen(fen).unwrap();
        let hash_before = board.full_hash();

        let mut ctx = SearchContext::new();
        ctx.limits.make_infinite();
        ctx.limits.set_depth_limit(4);
        ctx.root_search(&mut board);

        assert_eq!(board.to_fen(), fen);
        assert_eq!(board.full_hash(), hash_before);
    }

    #[test]
    fn respects_node_limit() {
        let mut board = Board::initial_position();
        let mut ctx = SearchContext::new();
        ctx.limits.make_infinite();
        ctx.limits.set_nodes_limit(2_000);
        ctx.root_search(&mut board);
        // The limit is polled every 512 nodes, so overshoot stays small.
        assert!(ctx.nodes() < 2_000 + 4 * 512, "nodes {}", ctx.nodes());
    }

    #[test]
    fn reports_progress_per_iteration() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let depths: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&depths);

        let mut board = Board::initial_position();
        let mut ctx = SearchContext::new();
        ctx.limits.make_infinite();
        ctx.limits.set_depth_limit(4);
        ctx.set_progress_callback(Box::new(move |progress| {
            sink.borrow_mut().push(progress.depth);
            assert!(!progress.pv.is_empty());
        }));
        ctx.root_search(&mut board);

        assert_eq!(*depths.borrow(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn draw_by_repetition_is_scored_zero() {
        // Two bare kings shuffling: any search result is a draw score.
        let (result, _) = search_to_depth("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 3);
        assert_eq!(result.value, 0);
    }

    #[test]
    fn stalemate_scores_zero_mate_scores_mate() {
        // Black to move is stalemated.
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut ctx = SearchContext::new();
        ctx.limits.make_infinite();
        ctx.limits.set_depth_limit(2);
        let result = ctx.root_search(&mut board);
        assert_eq!(result.value, 0);
        assert!(result.best.is_none());
    }
}
