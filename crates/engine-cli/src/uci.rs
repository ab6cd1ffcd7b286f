//! UCI dispatcher. Thin by design: parse, poke the engine, print.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use engine_core::{getting_mated_in, giving_mate_in, is_mate_value, SearchProgress};

use crate::engine::Engine;
use crate::input::InputQueue;

const ENGINE_NAME: &str = concat!("rchess ", env!("CARGO_PKG_VERSION"));
const ENGINE_AUTHOR: &str = "the rchess authors";

fn print_info(progress: &SearchProgress) {
    let mut line = format!(
        "info depth {} nodes {} time {}",
        progress.depth,
        progress.nodes,
        progress.elapsed.as_millis()
    );

    if is_mate_value(progress.value) {
        let mate = if progress.value < 0 {
            -getting_mated_in(progress.value)
        } else {
            giving_mate_in(progress.value)
        };
        line.push_str(&format!(" score mate {mate}"));
    } else {
        line.push_str(&format!(" score cp {}", progress.value));
    }

    line.push_str(&format!(" pv {}", progress.pv.to_line()));
    println!("{line}");
}

/// Runs the UCI loop; the `uci` command itself was already consumed.
pub fn run(engine: &mut Engine, input: &Rc<RefCell<InputQueue>>) -> Result<()> {
    println!("id name {ENGINE_NAME}");
    println!("id author {ENGINE_AUTHOR}");
    println!("uciok");

    engine.ctx.set_progress_callback(Box::new(print_info));

    loop {
        let line = {
            let mut queue = input.borrow_mut();
            match queue.next_line() {
                Some(line) => line,
                None => return Ok(()),
            }
        };

        let mut tokens = line.split_whitespace();
        let Some(command) = tokens.next() else {
            continue;
        };

        match command {
            "isready" => println!("readyok"),
            "ucinewgame" => engine.new_game(),
            "position" => handle_position(engine, &line),
            "go" => handle_go(engine, &line),
            "stop" | "?" => {} // Only meaningful mid-search; drained there.
            "quit" => return Ok(()),
            "uci" => {
                println!("id name {ENGINE_NAME}");
                println!("id author {ENGINE_AUTHOR}");
                println!("uciok");
            }
            _ => log::debug!("ignoring unknown uci command {command:?}"),
        }

        if input.borrow().quit_requested() {
            return Ok(());
        }
    }
}

fn handle_position(engine: &mut Engine, line: &str) {
    let rest = line.trim_start_matches("position").trim();

    let (fen, moves) = match rest.split_once("moves") {
        Some((head, tail)) => (head.trim(), Some(tail.trim())),
        None => (rest, None),
    };

    let ok = if fen == "startpos" || fen.is_empty() {
        engine.set_position(engine_core::START_FEN)
    } else if let Some(fen) = fen.strip_prefix("fen") {
        engine.set_position(fen.trim())
    } else {
        false
    };

    if !ok {
        println!("info string invalid position");
        engine.valid_position = false;
        return;
    }

    if let Some(moves) = moves {
        for text in moves.split_whitespace() {
            if engine.apply_move_text(text).is_none() {
                println!("info string illegal move {text}");
                engine.valid_position = false;
                return;
            }
        }
    }
}

fn handle_go(engine: &mut Engine, line: &str) {
    if !engine.valid_position {
        println!("info string no valid position");
        println!("bestmove 0000");
        return;
    }

    let mut depth = None;
    let mut nodes = None;
    let mut movetime = None;
    let mut wtime = None;
    let mut btime = None;
    let mut winc = 0u64;
    let mut binc = 0u64;
    let mut movestogo = None;
    let mut infinite = false;

    let mut tokens = line.split_whitespace().skip(1);
    while let Some(token) = tokens.next() {
        let mut number = || tokens.next().and_then(|t| t.parse::<u64>().ok());
        match token {
            "depth" => depth = number(),
            "nodes" => nodes = number(),
            "movetime" => movetime = number(),
            "wtime" => wtime = number(),
            "btime" => btime = number(),
            "winc" => winc = number().unwrap_or(0),
            "binc" => binc = number().unwrap_or(0),
            "movestogo" => movestogo = number(),
            "infinite" => infinite = true,
            _ => {}
        }
    }

    let limits = &mut engine.ctx.limits;
    limits.make_infinite();

    if let Some(depth) = depth {
        limits.set_depth_limit(depth as i32);
    }
    if let Some(nodes) = nodes {
        limits.set_nodes_limit(nodes);
    }

    let (my_time, my_inc) = match engine.board.side() {
        engine_core::Color::White => (wtime, winc),
        engine_core::Color::Black => (btime, binc),
    };

    if let Some(movetime) = movetime {
        limits.set_time_limits_ms(0, 0, movetime);
        limits.reset(0);
    } else if let Some(my_time) = my_time {
        if !infinite {
            limits.set_time_limits_ms(movestogo.unwrap_or(0) as u32, my_time, my_inc);
            limits.reset(my_time);
        }
    }

    let result = engine.think();
    if result.best.is_none() {
        println!("bestmove 0000");
    } else {
        println!("bestmove {}", result.best);
    }
}
