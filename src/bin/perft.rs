//! Perft divide from the command line:
//! `perft <depth> [fen]` (defaults to the starting position).

use std::process::ExitCode;
use std::time::Instant;

use ferrum::board::{update, Board, START_FEN};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(depth) = args.first().and_then(|d| d.parse::<usize>().ok()) else {
        eprintln!("usage: perft <depth> [fen]");
        return ExitCode::FAILURE;
    };
    let fen = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        START_FEN.to_string()
    };

    let mut board = match Board::try_from_fen(&fen) {
        Ok(board) => board,
        Err(err) => {
            eprintln!("invalid fen: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let mut total = 0u64;
    for &mv in &board.generate_moves() {
        let info = board.make_move::<{ update::ALL }>(mv);
        let count = if depth > 1 { board.perft(depth - 1) } else { 1 };
        board.unmake_move::<{ update::ALL }>(mv, info);
        println!("{mv}: {count}");
        total += count;
    }
    let elapsed = start.elapsed();
    println!("nodes {total}");
    println!(
        "time {} ms ({:.0} knps)",
        elapsed.as_millis(),
        total as f64 / elapsed.as_secs_f64() / 1000.0
    );
    ExitCode::SUCCESS
}
