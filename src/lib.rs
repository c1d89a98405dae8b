//! Ferrum, a UCI chess engine.
//!
//! The crate is organised bottom-up: `board` owns the position
//! representation, attack tables and move generation; `zobrist`, `tt` and
//! `see` provide the hashing and search support structures; `search` holds
//! the fixed-depth searcher and the iterative deepening driver; `eval` is
//! the static evaluator; `uci` is the text-protocol front-end.

pub mod board;
pub mod eval;
pub mod search;
pub mod see;
pub mod tt;
pub mod uci;
pub mod zobrist;
