//! Protocol front-end: speaks UCI and the CECP/xboard dialect, plus a
//! small interactive console. All engine logic lives in `engine-core`;
//! this binary only parses commands and prints answers.

mod console;
mod engine;
mod input;
mod uci;
mod xboard;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use engine::Engine;
use input::InputQueue;

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Proto {
    /// Decide from the first command line (uci / xboard / anything else).
    Auto,
    Uci,
    Xboard,
    Console,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "rchess, a UCI / xboard chess engine")]
struct Args {
    /// Protocol to speak.
    #[arg(long, value_enum, default_value = "auto")]
    proto: Proto,

    /// Enable debug logging to stderr.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    log::info!("rchess {} starting", env!("CARGO_PKG_VERSION"));

    let mut engine = Engine::new();

    let input = Rc::new(RefCell::new(InputQueue::start(engine.ctx.stop_flag())));
    engine.ctx.set_input_poller(Box::new({
        let input = Rc::clone(&input);
        move || input.borrow_mut().poll_during_search()
    }));

    match args.proto {
        Proto::Uci => uci::run(&mut engine, &input),
        Proto::Xboard => xboard::run(&mut engine, &input),
        Proto::Console => console::run(&mut engine, &input, None),
        Proto::Auto => {
            let first = {
                let mut queue = input.borrow_mut();
                queue.next_line()
            };
            match first.as_deref().map(str::trim) {
                Some("uci") => uci::run(&mut engine, &input),
                Some("xboard") => xboard::run(&mut engine, &input),
                Some(_) => console::run(&mut engine, &input, first),
                None => Ok(()),
            }
        }
    }
}
