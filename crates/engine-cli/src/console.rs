//! Interactive console for poking at the engine by hand.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use engine_core::{eval, perft, GameResult, SearchProgress};

use crate::engine::Engine;
use crate::input::InputQueue;

fn print_iteration(progress: &SearchProgress) {
    println!(
        "{} {} {} {} {}",
        progress.depth,
        progress.value,
        progress.elapsed.as_millis() / 10,
        progress.nodes,
        progress.pv.to_line()
    );
}

/// Runs the console loop. `first_line` is a command the auto-detection
/// already read but did not recognise as a protocol handshake.
pub fn run(
    engine: &mut Engine,
    input: &Rc<RefCell<InputQueue>>,
    first_line: Option<String>,
) -> Result<()> {
    println!("rchess {} console; 'help' lists commands", env!("CARGO_PKG_VERSION"));
    engine.ctx.set_progress_callback(Box::new(print_iteration));

    if let Some(line) = first_line {
        if !dispatch(engine, &line)? {
            return Ok(());
        }
    }

    loop {
        let line = {
            let mut queue = input.borrow_mut();
            match queue.next_line() {
                Some(line) => line,
                None => return Ok(()),
            }
        };

        if !dispatch(engine, &line)? {
            return Ok(());
        }

        if input.borrow().quit_requested() {
            return Ok(());
        }
    }
}

fn dispatch(engine: &mut Engine, line: &str) -> Result<bool> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Ok(true);
    };

    match command {
        "help" => {
            println!("new                 start a new game");
            println!("fen <FEN>           set up a position");
            println!("display             show the board");
            println!("move <m>            play a move (e2e4, e7e8q, 0-0)");
            println!("undo                take the last move back");
            println!("go                  let the engine move");
            println!("play                engine plays the game out against itself");
            println!("depth <n>           set the depth limit");
            println!("st <seconds>        set an exact time per move");
            println!("perft <n>           count move paths to depth n");
            println!("eval                static evaluation of the position");
            println!("quit                leave");
        }
        "new" => engine.new_game(),
        "fen" => {
            let fen = line.trim_start_matches("fen").trim();
            if !engine.set_position(fen) {
                println!("Invalid position: {fen}");
            }
        }
        "display" | "d" => println!("{}", engine.board),
        "move" => {
            let text = tokens.next().unwrap_or("");
            if engine.apply_move_text(text).is_none() {
                println!("Illegal move: {text}");
            }
        }
        "undo" => {
            if !engine.undo_move() {
                println!("Nothing to undo");
            }
        }
        "go" => go(engine),
        "play" => play_out(engine),
        "depth" => {
            if let Some(depth) = tokens.next().and_then(|t| t.parse::<i32>().ok()) {
                engine.ctx.limits.set_depth_limit(depth);
            }
        }
        "st" => {
            if let Some(seconds) = tokens.next().and_then(|t| t.parse::<u64>().ok()) {
                engine.ctx.limits.set_time_limits_ms(0, 0, seconds * 1000);
            }
        }
        "perft" => {
            let depth = tokens.next().and_then(|t| t.parse::<i32>().ok()).unwrap_or(1);
            let start = std::time::Instant::now();
            let nodes = perft(&mut engine.board, depth);
            println!(
                "perft({depth}) = {nodes} in {} ms",
                start.elapsed().as_millis()
            );
        }
        "eval" => {
            let value = eval(&engine.board, &mut engine.ctx.pawn_table);
            println!("static eval: {value} cp (side to move)");
        }
        "quit" | "exit" => return Ok(false),
        _ => {
            // Bare move text works too.
            if engine.valid_position && engine.apply_move_text(command).is_some() {
                println!("{}", engine.board);
            } else {
                println!("Unknown command: {command} (try 'help')");
            }
        }
    }

    Ok(true)
}

fn go(engine: &mut Engine) {
    if !engine.valid_position {
        println!("Invalid position");
        return;
    }

    engine.ctx.limits.reset(0);
    let result = engine.think();
    if result.best.is_some() {
        engine.apply_move(result.best);
        println!("my move: {}", result.best);
    } else {
        print_result(engine.board.compute_game_result());
    }
}

/// Engine versus engine from the current position; the shrunk self-play
/// budgets keep it brisk.
fn play_out(engine: &mut Engine) {
    if !engine.valid_position {
        println!("Invalid position");
        return;
    }

    engine.ctx.limits.set_self_play(true);
    loop {
        if engine.board.compute_game_result() != GameResult::None {
            break;
        }

        engine.ctx.limits.reset(0);
        let result = engine.think();
        if result.best.is_none() {
            break;
        }

        engine.apply_move(result.best);
        println!("move {}", result.best);
    }
    engine.ctx.limits.set_self_play(false);

    print_result(engine.board.compute_game_result());
    println!("{}", engine.board);
}

fn print_result(result: GameResult) {
    match result {
        GameResult::WhiteWon => println!("1-0 (white mates)"),
        GameResult::BlackWon => println!("0-1 (black mates)"),
        GameResult::Draw => println!("1/2-1/2 (draw)"),
        GameResult::None => {}
    }
}
