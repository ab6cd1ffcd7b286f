//! Non-blocking stdin: a reader thread feeds a channel, and commands that
//! arrive mid-search are either acted on immediately (stop, quit, move
//! now) or parked for the main loop.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, TryRecvError};

pub struct InputQueue {
    rx: Receiver<String>,
    pending: VecDeque<String>,
    /// Raised when the reader thread hits EOF.
    closed: bool,
    /// Commands seen during a search that must abort it.
    stop_flag: Arc<AtomicBool>,
    quit_requested: bool,
}

impl InputQueue {
    /// Spawns the reader thread over stdin.
    pub fn start(stop_flag: Arc<AtomicBool>) -> InputQueue {
        let (tx, rx) = unbounded();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        InputQueue {
            rx,
            pending: VecDeque::new(),
            closed: false,
            stop_flag,
            quit_requested: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Blocking read of the next command line. Returns `None` on EOF.
    pub fn next_line(&mut self) -> Option<String> {
        if let Some(line) = self.pending.pop_front() {
            return Some(line);
        }
        if self.closed {
            return None;
        }
        match self.rx.recv() {
            Ok(line) => Some(line),
            Err(_) => {
                self.closed = true;
                None
            }
        }
    }

    /// Drains whatever has arrived without blocking. Search-critical
    /// commands raise the stop flag; the rest queue up for the main loop.
    pub fn poll_during_search(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    let command = line.trim();
                    match command {
                        "stop" | "?" => {
                            self.stop_flag.store(true, Ordering::Relaxed);
                        }
                        "quit" => {
                            self.stop_flag.store(true, Ordering::Relaxed);
                            self.quit_requested = true;
                            self.pending.push_back(line);
                        }
                        _ => self.pending.push_back(line),
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
    }
}
