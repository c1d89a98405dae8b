//! UCI front-end: a line-oriented dialogue on stdin/stdout.
//!
//! Commands flow in, `info`/`bestmove` replies flow out, and every line
//! in either direction is mirrored to the optional protocol log. The
//! engine core underneath is the [`IterativeSearcher`]; this module only
//! parses, formats and forwards.

mod command;
pub mod logger;

pub use command::{parse, GoParams, UciCommand};

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::board::{update, Board};
use crate::search::{score, IterativeSearcher, SearchLimits, SearchResult};

const ENGINE_NAME: &str = "Ferrum 0.1";
const ENGINE_AUTHOR: &str = "the Ferrum developers";
const DEFAULT_HASH_MB: usize = 256;

/// Print a protocol line and mirror it to the log.
fn reply(line: &str) {
    println!("{line}");
    logger::outgoing(line);
}

/// Run the protocol loop until `quit` or end of input.
pub fn run() -> ExitCode {
    let stdin = io::stdin();
    let mut engine = Engine::new(DEFAULT_HASH_MB);

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        logger::incoming(&line);
        let Some(cmd) = command::parse(&line) else {
            continue;
        };
        if !engine.handle(cmd) {
            return ExitCode::SUCCESS;
        }
    }
    ExitCode::SUCCESS
}

struct Engine {
    board: Board,
    searcher: IterativeSearcher,
}

impl Engine {
    fn new(hash_mb: usize) -> Self {
        let searcher = IterativeSearcher::new(hash_mb);
        searcher.add_iteration_callback(Box::new(|result| reply(&format_info(result))));
        Engine {
            board: Board::new(),
            searcher,
        }
    }

    /// Dispatch one command; returns `false` on `quit`.
    fn handle(&mut self, cmd: UciCommand) -> bool {
        match cmd {
            UciCommand::Uci => {
                reply(&format!("id name {ENGINE_NAME}"));
                reply(&format!("id author {ENGINE_AUTHOR}"));
                reply(&format!(
                    "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max 4096"
                ));
                reply("uciok");
            }
            UciCommand::IsReady => reply("readyok"),
            UciCommand::NewGame => {
                self.searcher.new_game();
                self.board = Board::new();
            }
            UciCommand::Position { fen, moves } => self.set_position(fen.as_deref(), &moves),
            UciCommand::Go(params) => self.go(&params),
            UciCommand::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            UciCommand::Perft(depth) => self.perft(depth),
            UciCommand::Display => reply(&self.board.to_string()),
            UciCommand::Stop => {
                self.searcher.stop();
            }
            UciCommand::Quit => {
                self.searcher.stop();
                return false;
            }
            UciCommand::Unknown(text) => {
                reply(&format!("info string unknown command: {text}"));
            }
        }
        true
    }

    /// Build the new position off to the side; the engine state only
    /// changes if the whole command is valid.
    fn set_position(&mut self, fen: Option<&str>, moves: &[String]) {
        self.searcher.stop();

        let mut board = match fen {
            Some(fen) => match Board::try_from_fen(fen) {
                Ok(board) => board,
                Err(err) => {
                    reply(&format!("info string invalid fen: {err}"));
                    return;
                }
            },
            None => Board::new(),
        };

        for notation in moves {
            match board.parse_move(notation) {
                Ok(mv) => {
                    board.make_move::<{ update::ALL }>(mv);
                }
                Err(err) => {
                    reply(&format!("info string {err}"));
                    return;
                }
            }
        }

        self.board = board;
    }

    fn go(&mut self, params: &GoParams) {
        let limits = SearchLimits {
            move_time: params.movetime.map(Duration::from_millis),
            depth: params.depth,
            nodes: params.nodes,
            white_time: params.wtime.map(Duration::from_millis),
            black_time: params.btime.map(Duration::from_millis),
            white_increment: params.winc.map(Duration::from_millis),
            black_increment: params.binc.map(Duration::from_millis),
            infinite: params.infinite,
        };
        self.searcher.start(&self.board, &limits, |result| {
            let line = match result.best_move() {
                Some(mv) => format!("bestmove {mv}"),
                None => "bestmove 0000".to_string(),
            };
            reply(&line);
        });
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        if name.eq_ignore_ascii_case("hash") {
            match value.and_then(|v| v.parse::<usize>().ok()) {
                Some(mb) if (1..=4096).contains(&mb) => self.searcher.resize_table(mb),
                _ => reply("info string Hash wants a value between 1 and 4096"),
            }
        } else {
            reply(&format!("info string unknown option: {name}"));
        }
    }

    /// Perft divide: per-move subtree counts plus the total.
    fn perft(&mut self, depth: usize) {
        let start = Instant::now();
        let moves = self.board.generate_moves();
        let mut total = 0u64;
        for &mv in &moves {
            let info = self.board.make_move::<{ update::ALL }>(mv);
            let count = if depth > 1 {
                self.board.perft(depth - 1)
            } else {
                1
            };
            self.board.unmake_move::<{ update::ALL }>(mv, info);
            total += count;
            reply(&format!("{mv}: {count}"));
        }
        reply(&format!(
            "nodes {total} time {} ms",
            start.elapsed().as_millis()
        ));
    }
}

fn format_info(result: &SearchResult) -> String {
    let millis = result.elapsed.as_millis() as u64;
    let nps = if millis > 0 {
        result.nodes * 1000 / millis
    } else {
        0
    };
    let score_field = match score::moves_to_mate(result.score) {
        Some(moves) => format!("mate {moves}"),
        None => format!("cp {}", result.score),
    };
    let pv = result
        .line
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "info depth {} score {} nodes {} nps {} time {} pv {}",
        result.depth, score_field, result.nodes, nps, millis, pv
    )
}
