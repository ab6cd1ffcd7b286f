//! Search budgets: time, depth and nodes.
//!
//! Three time regimes are supported. Conventional control hands out a
//! share of the remaining time per control period; incremental spreads the
//! base over a nominal forty moves plus the increment; exact-per-move
//! spends (nearly) the whole allotment every move. The soft break is where
//! iterative deepening stops starting new iterations; the hard break
//! aborts the search outright.

use std::time::{Duration, Instant};

use super::MAX_DEPTH;

pub struct Limits {
    soft_break: Option<Instant>,
    hard_break: Option<Instant>,
    start: Instant,

    time_control_moves: u32,
    moves_made: u32,
    base_time_ms: u64,
    inc_time_ms: u64,
    depth_limit: i32,
    nodes_limit: u64,

    /// Engine-vs-engine games shrink every budget tenfold so that two
    /// instances cannot starve each other.
    self_play: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            soft_break: None,
            hard_break: None,
            start: Instant::now(),
            time_control_moves: 0,
            moves_made: 0,
            base_time_ms: 60_000,
            inc_time_ms: 3_000,
            depth_limit: MAX_DEPTH,
            nodes_limit: u64::MAX,
            self_play: false,
        }
    }
}

impl Limits {
    /// Drops every limit; the search runs until told to stop. The time
    /// settings stay finite so a later `reset` cannot overflow the clock
    /// arithmetic.
    pub fn make_infinite(&mut self) {
        self.soft_break = None;
        self.hard_break = None;
        self.start = Instant::now();
        self.time_control_moves = 0;
        self.moves_made = 0;
        self.base_time_ms = i32::MAX as u64;
        self.inc_time_ms = i32::MAX as u64;
        self.depth_limit = MAX_DEPTH;
        self.nodes_limit = u64::MAX;
    }

    /// Starts the clock for one search and computes the breaks from the
    /// time actually left on it (0 = budget from the control settings).
    pub fn reset(&mut self, ms_left: u64) {
        self.start = Instant::now();

        if self.time_control_moves > 0 && self.base_time_ms > 0 {
            self.compute_conventional(ms_left);
        } else if self.base_time_ms > 0 {
            self.compute_incremental(ms_left);
        } else if self.inc_time_ms > 0 {
            self.compute_exact_per_move(ms_left);
        }

        if self.self_play {
            let start = self.start;
            let shrink =
                |b: Instant| start + ((b - start) / 10).max(Duration::from_millis(100));
            self.soft_break = self.soft_break.map(shrink);
            self.hard_break = self.hard_break.map(shrink);
        }
    }

    /// Accounts moves made (or taken back) against the control period.
    pub fn add_moves(&mut self, count: i32) {
        if self.time_control_moves > 0 {
            let total = self.moves_made as i64 + count as i64;
            self.moves_made = total.rem_euclid(self.time_control_moves as i64) as u32;
        }
    }

    fn compute_conventional(&mut self, ms_left: u64) {
        let ms_per_move = if ms_left > 0 {
            (ms_left / (self.time_control_moves - self.moves_made) as u64 + self.inc_time_ms)
                .min(ms_left)
        } else {
            self.base_time_ms / self.time_control_moves as u64 + self.inc_time_ms
        };

        self.soft_break = Some(self.start + Duration::from_millis(ms_per_move / 2));
        self.hard_break = Some(self.start + Duration::from_millis(ms_per_move * 9 / 10));
    }

    fn compute_incremental(&mut self, ms_left: u64) {
        const GAME_LENGTH_FACTOR: u64 = 40;

        let ms_per_move = if ms_left > 0 {
            (self.inc_time_ms + ms_left / GAME_LENGTH_FACTOR).min(ms_left)
        } else {
            self.inc_time_ms + self.base_time_ms / GAME_LENGTH_FACTOR
        };

        self.soft_break = Some(self.start + Duration::from_millis(ms_per_move / 2));
        self.hard_break = Some(self.start + Duration::from_millis(ms_per_move * 9 / 10));
    }

    fn compute_exact_per_move(&mut self, ms_left: u64) {
        let ms_for_move = if ms_left > 0 { ms_left } else { self.inc_time_ms };

        self.soft_break = Some(self.start + Duration::from_millis(ms_for_move * 9 / 10));
        self.hard_break = Some(self.start + Duration::from_millis(ms_for_move * 95 / 100));
    }

    pub fn set_time_limits(&mut self, control: u32, seconds_base: u64, seconds_inc: u64) {
        self.set_time_limits_ms(control, seconds_base * 1000, seconds_inc * 1000);
    }

    pub fn set_time_limits_ms(&mut self, control: u32, base_ms: u64, inc_ms: u64) {
        self.time_control_moves = control;
        self.base_time_ms = base_ms;
        self.inc_time_ms = inc_ms;
    }

    pub fn set_nodes_limit(&mut self, nodes: u64) {
        self.nodes_limit = nodes;
    }

    pub fn set_depth_limit(&mut self, depth: i32) {
        self.depth_limit = depth;
    }

    pub fn set_self_play(&mut self, self_play: bool) {
        self.self_play = self_play;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_milliseconds(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn elapsed_centiseconds(&self) -> u64 {
        self.elapsed_milliseconds() / 10
    }

    /// The comfortable stopping point between iterations.
    pub fn is_soft_limit_broken(&self) -> bool {
        self.soft_break.is_some_and(|b| Instant::now() >= b)
    }

    /// The drop-everything deadline.
    pub fn is_hard_limit_broken(&self) -> bool {
        self.hard_break.is_some_and(|b| Instant::now() >= b)
    }

    pub fn is_nodes_limit_broken(&self, nodes: u64) -> bool {
        nodes > self.nodes_limit
    }

    pub fn is_depth_limit_broken(&self, depth: i32) -> bool {
        depth > self.depth_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_limits_never_break() {
        let mut limits = Limits::default();
        limits.make_infinite();
        assert!(!limits.is_soft_limit_broken());
        assert!(!limits.is_hard_limit_broken());
        assert!(!limits.is_nodes_limit_broken(u64::MAX - 1));
        assert!(!limits.is_depth_limit_broken(MAX_DEPTH));
        assert!(limits.is_depth_limit_broken(MAX_DEPTH + 1));
    }

    #[test]
    fn exact_per_move_budgets_most_of_the_allotment() {
        let mut limits = Limits::default();
        limits.set_time_limits_ms(0, 0, 1000);
        limits.reset(0);
        // Soft at 900 ms, hard at 950 ms: neither fires immediately.
        assert!(!limits.is_soft_limit_broken());
        assert!(!limits.is_hard_limit_broken());
    }

    #[test]
    fn zero_allotment_breaks_at_once() {
        let mut limits = Limits::default();
        limits.set_time_limits_ms(0, 4, 2);
        limits.reset(0);
        std::thread::sleep(Duration::from_millis(5));
        assert!(limits.is_soft_limit_broken());
        assert!(limits.is_hard_limit_broken());
    }

    #[test]
    fn conventional_moves_accounting_wraps() {
        let mut limits = Limits::default();
        limits.set_time_limits(40, 300, 0);
        limits.add_moves(45);
        limits.add_moves(-3);
        // 45 - 3 = 42, wrapped into the 40-move control.
        limits.reset(120_000);
        assert!(!limits.is_hard_limit_broken());
    }

    #[test]
    fn nodes_and_depth_limits() {
        let mut limits = Limits::default();
        limits.set_nodes_limit(1000);
        limits.set_depth_limit(5);
        assert!(!limits.is_nodes_limit_broken(1000));
        assert!(limits.is_nodes_limit_broken(1001));
        assert!(!limits.is_depth_limit_broken(5));
        assert!(limits.is_depth_limit_broken(6));
    }
}
