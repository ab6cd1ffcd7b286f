//! CECP / xboard dispatcher.
//!
//! Times arrive in centiseconds, conventional controls via `level`. The
//! engine answers `usermove` (or a bare move string) with its own move
//! unless force mode is on.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use engine_core::{GameResult, SearchProgress};

use crate::engine::Engine;
use crate::input::InputQueue;

fn print_post_line(progress: &SearchProgress) {
    // depth value time(cs) nodes pv
    println!(
        "{} {} {} {} {}",
        progress.depth,
        progress.value,
        progress.elapsed.as_millis() / 10,
        progress.nodes,
        progress.pv.to_line()
    );
}

pub struct XboardState {
    /// Our remaining clock in milliseconds, from the `time` command.
    my_time_ms: Option<u64>,
}

/// Runs the xboard loop; the `xboard` command itself was already consumed.
pub fn run(engine: &mut Engine, input: &Rc<RefCell<InputQueue>>) -> Result<()> {
    let mut state = XboardState { my_time_ms: None };

    loop {
        let line = {
            let mut queue = input.borrow_mut();
            match queue.next_line() {
                Some(line) => line,
                None => return Ok(()),
            }
        };

        if !dispatch(engine, &mut state, &line)? {
            return Ok(());
        }

        if input.borrow().quit_requested() {
            return Ok(());
        }
    }
}

/// Handles one command; returns false to quit.
fn dispatch(engine: &mut Engine, state: &mut XboardState, line: &str) -> Result<bool> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Ok(true);
    };

    match command {
        "protover" => {
            println!(
                "feature myname=\"rchess {}\" setboard=1 usermove=1 time=1 \
                 colors=0 sigint=0 sigterm=0 ping=1 done=1",
                env!("CARGO_PKG_VERSION")
            );
        }
        "accepted" | "rejected" | "random" | "hard" | "easy" | "computer" | "result" => {}
        "new" => {
            engine.new_game();
            state.my_time_ms = None;
        }
        "force" => engine.force = true,
        "go" => {
            engine.force = false;
            think_and_move(engine, state);
        }
        "usermove" => {
            let text = tokens.next().unwrap_or("");
            user_move(engine, state, text);
        }
        "setboard" => {
            let fen = line.trim_start_matches("setboard").trim();
            if !engine.set_position(fen) {
                println!("tellusererror Illegal position");
            }
        }
        "time" => {
            if let Some(cs) = tokens.next().and_then(|t| t.parse::<u64>().ok()) {
                state.my_time_ms = Some(cs * 10);
            }
        }
        "otim" => {}
        "level" => {
            // level MPS BASE INC, BASE in minutes or "mm:ss", INC seconds.
            let control = tokens.next().and_then(|t| t.parse::<u32>().ok()).unwrap_or(0);
            let base_ms = tokens.next().map_or(0, parse_base_ms);
            let inc_s = tokens.next().and_then(|t| t.parse::<u64>().ok()).unwrap_or(0);
            engine.ctx.limits.set_time_limits_ms(control, base_ms, inc_s * 1000);
        }
        "st" => {
            // Exact seconds per move: no base, the increment is the budget.
            if let Some(seconds) = tokens.next().and_then(|t| t.parse::<u64>().ok()) {
                engine.ctx.limits.set_time_limits_ms(0, 0, seconds * 1000);
            }
        }
        "sd" => {
            if let Some(depth) = tokens.next().and_then(|t| t.parse::<i32>().ok()) {
                engine.ctx.limits.set_depth_limit(depth);
            }
        }
        // Both commands enable posting; drivers that expect thinking
        // output after nopost rely on it.
        "post" => engine.post = true,
        "nopost" => engine.post = true,
        "undo" => {
            engine.undo_move();
        }
        "remove" => {
            engine.undo_move();
            engine.undo_move();
        }
        "ping" => {
            if let Some(n) = tokens.next() {
                println!("pong {n}");
            }
        }
        "?" => {} // Only meaningful mid-search.
        "quit" => return Ok(false),
        _ => {
            // Bare move strings arrive without the usermove prefix when
            // the usermove feature was not accepted.
            if engine.valid_position && engine.board.move_from_str(command).is_some() {
                user_move(engine, state, command);
            } else {
                println!("Error (unknown command): {command}");
            }
        }
    }

    Ok(true)
}

fn parse_base_ms(base: &str) -> u64 {
    match base.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().unwrap_or(0);
            let seconds: u64 = seconds.parse().unwrap_or(0);
            (minutes * 60 + seconds) * 1000
        }
        None => base.parse::<u64>().unwrap_or(0) * 60 * 1000,
    }
}

fn user_move(engine: &mut Engine, state: &mut XboardState, text: &str) {
    if engine.apply_move_text(text).is_none() {
        println!("Illegal move: {text}");
        return;
    }

    if !engine.force {
        think_and_move(engine, state);
    }
}

fn think_and_move(engine: &mut Engine, state: &mut XboardState) {
    if !engine.valid_position {
        println!("tellusererror Illegal position");
        return;
    }

    match engine.board.compute_game_result() {
        GameResult::None => {}
        result => {
            print_result(result);
            return;
        }
    }

    if engine.post {
        engine.ctx.set_progress_callback(Box::new(print_post_line));
    }

    engine.ctx.limits.reset(state.my_time_ms.unwrap_or(0));
    let result = engine.think();

    if result.best.is_none() {
        print_result(engine.board.compute_game_result());
        return;
    }

    engine.apply_move(result.best);
    println!("move {}", result.best);

    match engine.board.compute_game_result() {
        GameResult::None => {}
        result => print_result(result),
    }
}

fn print_result(result: GameResult) {
    match result {
        GameResult::WhiteWon => println!("1-0 {{White mates}}"),
        GameResult::BlackWon => println!("0-1 {{Black mates}}"),
        GameResult::Draw => println!("1/2-1/2 {{Draw}}"),
        GameResult::None => {}
    }
}
