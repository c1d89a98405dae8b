//! The iterative deepening driver.
//!
//! Repeats fixed-depth searches at increasing depth on a shared
//! transposition table, reporting the completed line after each depth. A
//! controller thread polls the configured limits every few milliseconds
//! and raises the halt flag; the search thread observes it at every node
//! and unwinds with balanced make/unmake pairs.
//!
//! Two mutexes mediate: the task mutex guards the driver's task state,
//! the search gate is held for the duration of each iteration. Anyone
//! taking both must take the task mutex first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::board::{Board, Color, Move};
use crate::tt::TranspositionTable;

use super::{FixedDepthSearcher, Heuristics, RootMoveList, SearchStats};

/// Controller poll interval.
const LIMIT_POLL: Duration = Duration::from_millis(5);

/// Depth cap when no explicit limit is set.
const DEFAULT_MAX_DEPTH: u16 = 64;

/// Safety margin subtracted from an allocated time budget.
const BUDGET_MARGIN: Duration = Duration::from_millis(50);

/// Result of an iterative search: the deepest fully completed iteration.
#[derive(Clone, Debug)]
pub struct SearchResult {
    pub depth: u16,
    /// Principal variation; empty when no iteration completed.
    pub line: Vec<Move>,
    pub score: i32,
    pub nodes: u64,
    pub table_hits: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    #[must_use]
    pub fn invalid() -> Self {
        SearchResult {
            depth: 0,
            line: Vec::new(),
            score: 0,
            nodes: 0,
            table_hits: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.line.is_empty()
    }

    #[must_use]
    pub fn best_move(&self) -> Option<Move> {
        self.line.first().copied()
    }
}

/// Limits for one search. All optional; absent limits mean the search
/// runs until stopped.
#[derive(Clone, Debug, Default)]
pub struct SearchLimits {
    pub move_time: Option<Duration>,
    pub depth: Option<u16>,
    pub nodes: Option<u64>,
    pub white_time: Option<Duration>,
    pub black_time: Option<Duration>,
    pub white_increment: Option<Duration>,
    pub black_increment: Option<Duration>,
    pub infinite: bool,
}

impl SearchLimits {
    /// Wall-clock budget for this move, if any: the explicit move time,
    /// or an allocation from the mover's clock (a thirtieth of the
    /// remaining time plus a quarter of the increment, less a margin).
    #[must_use]
    pub fn budget(&self, turn: Color) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(move_time) = self.move_time {
            return Some(move_time);
        }
        let (remaining, increment) = match turn {
            Color::White => (self.white_time, self.white_increment),
            Color::Black => (self.black_time, self.black_increment),
        };
        let remaining = remaining?;
        let mut budget = remaining / 30 + increment.unwrap_or(Duration::ZERO) / 4;
        budget = budget.saturating_sub(BUDGET_MARGIN);
        Some(budget.max(Duration::from_millis(1)))
    }
}

/// Per-depth reporting callback.
pub type IterationCallback = Box<dyn Fn(&SearchResult) + Send + Sync>;

struct Task {
    halt: Arc<AtomicBool>,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    result: SearchResult,
    search_thread: Option<JoinHandle<()>>,
    controller_thread: Option<JoinHandle<()>>,
}

pub struct IterativeSearcher {
    table: Arc<TranspositionTable>,
    stats: Arc<SearchStats>,
    callbacks: Arc<Mutex<Vec<IterationCallback>>>,
    /// Task mutex: all task state. Locked before the search gate.
    task: Arc<Mutex<Option<Task>>>,
    /// Search gate: held while a fixed-depth iteration runs.
    search_gate: Arc<Mutex<()>>,
}

impl IterativeSearcher {
    #[must_use]
    pub fn new(hash_size_mb: usize) -> Self {
        IterativeSearcher {
            table: Arc::new(TranspositionTable::with_hash_size_mb(hash_size_mb)),
            stats: Arc::new(SearchStats::new()),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            task: Arc::new(Mutex::new(None)),
            search_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Register a callback fired after every completed depth.
    pub fn add_iteration_callback(&self, callback: IterationCallback) {
        self.callbacks.lock().push(callback);
    }

    /// Forget everything learned: clears the shared table.
    pub fn new_game(&self) {
        self.stop();
        self.table.clear();
    }

    /// Replace the transposition table with one of `hash_size_mb`.
    pub fn resize_table(&mut self, hash_size_mb: usize) {
        self.stop();
        self.table = Arc::new(TranspositionTable::with_hash_size_mb(hash_size_mb));
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Start searching `board` under `limits`. `on_complete` fires exactly
    /// once when the search ends, whether it ran out of limits or was
    /// stopped.
    pub fn start<F>(&self, board: &Board, limits: &SearchLimits, on_complete: F)
    where
        F: FnOnce(&SearchResult) + Send + 'static,
    {
        self.stop();
        self.stats.reset();

        let halt = Arc::new(AtomicBool::new(false));
        let start_time = Instant::now();
        let deadline = limits.budget(board.turn()).map(|budget| start_time + budget);
        let max_depth = limits.depth.unwrap_or(DEFAULT_MAX_DEPTH).max(1);
        let node_limit = limits.nodes;

        // Publish the task before spawning any thread; both the search
        // thread and the controller reach it through the task mutex.
        *self.task.lock() = Some(Task {
            halt: Arc::clone(&halt),
            deadline,
            node_limit,
            result: SearchResult::invalid(),
            search_thread: None,
            controller_thread: None,
        });

        let search_thread = {
            let board = board.clone();
            let table = Arc::clone(&self.table);
            let stats = Arc::clone(&self.stats);
            let halt = Arc::clone(&halt);
            let task = Arc::clone(&self.task);
            let search_gate = Arc::clone(&self.search_gate);
            let callbacks = Arc::clone(&self.callbacks);

            std::thread::Builder::new()
                .name("search".to_string())
                .spawn(move || {
                    let mut heuristics = Heuristics::new();
                    let mut board = board;
                    let mut root_moves = RootMoveList::new(&mut board, &heuristics);
                    let mut last_completed = SearchResult::invalid();

                    for depth in 1..=max_depth {
                        if halt.load(Ordering::Acquire) {
                            break;
                        }

                        let line = {
                            let _gate = search_gate.lock();
                            let mut searcher = FixedDepthSearcher::new(
                                &board,
                                depth,
                                &table,
                                &mut heuristics,
                                &stats,
                                &halt,
                            );
                            searcher.search(&mut root_moves)
                        };

                        // A halted iteration is discarded, never reported.
                        if !line.is_valid() {
                            break;
                        }

                        root_moves.sort();
                        let result = SearchResult {
                            depth,
                            line: line.moves,
                            score: line.score,
                            nodes: stats.nodes(),
                            table_hits: stats.table_hits(),
                            elapsed: start_time.elapsed(),
                        };
                        {
                            let mut task = task.lock();
                            if let Some(task) = task.as_mut() {
                                task.result = result.clone();
                            }
                        }
                        for callback in callbacks.lock().iter() {
                            callback(&result);
                        }
                        last_completed = result;
                    }

                    // Even a stop before depth one completes must yield
                    // some legal move.
                    if !last_completed.is_valid() {
                        if let Some(mv) = root_moves.first() {
                            last_completed = SearchResult {
                                depth: 0,
                                line: vec![mv],
                                score: 0,
                                nodes: stats.nodes(),
                                table_hits: stats.table_hits(),
                                elapsed: start_time.elapsed(),
                            };
                            let mut task = task.lock();
                            if let Some(task) = task.as_mut() {
                                task.result = last_completed.clone();
                            }
                        }
                    }

                    halt.store(true, Ordering::Release);
                    on_complete(&last_completed);
                })
                .expect("failed to spawn search thread")
        };

        // The controller enforces limits the search itself never looks
        // at; it dies with its task's halt flag.
        let controller_thread = if deadline.is_some() || node_limit.is_some() {
            let halt = Arc::clone(&halt);
            let stats = Arc::clone(&self.stats);
            let task = Arc::clone(&self.task);
            Some(
                std::thread::Builder::new()
                    .name("search-controller".to_string())
                    .spawn(move || loop {
                        std::thread::sleep(LIMIT_POLL);
                        if halt.load(Ordering::Acquire) {
                            break;
                        }
                        // Re-read the limits under the task mutex and make
                        // sure the active task is still ours before
                        // halting anything.
                        let guard = task.lock();
                        let Some(active) = guard.as_ref() else { break };
                        if !Arc::ptr_eq(&active.halt, &halt) {
                            break;
                        }
                        let out_of_time =
                            active.deadline.is_some_and(|d| Instant::now() >= d);
                        let out_of_nodes =
                            active.node_limit.is_some_and(|n| stats.nodes() >= n);
                        if out_of_time || out_of_nodes {
                            halt.store(true, Ordering::Release);
                            break;
                        }
                    })
                    .expect("failed to spawn controller thread"),
            )
        } else {
            None
        };

        if let Some(task) = self.task.lock().as_mut() {
            task.search_thread = Some(search_thread);
            task.controller_thread = controller_thread;
        }
    }

    /// Halt the running search, wait for it to unwind, and return the
    /// deepest fully completed result (or the fallback move when not even
    /// depth one finished).
    pub fn stop(&self) -> SearchResult {
        // Task mutex first, then the search gate: the fixed lock order.
        let (halt, search_thread, controller_thread) = {
            let mut guard = self.task.lock();
            let Some(task) = guard.as_mut() else {
                return SearchResult::invalid();
            };
            (
                Arc::clone(&task.halt),
                task.search_thread.take(),
                task.controller_thread.take(),
            )
        };

        halt.store(true, Ordering::Release);

        // Wait for any in-flight iteration to observe the flag.
        drop(self.search_gate.lock());

        if let Some(handle) = search_thread {
            let _ = handle.join();
        }
        if let Some(handle) = controller_thread {
            let _ = handle.join();
        }

        self.task
            .lock()
            .take()
            .map_or_else(SearchResult::invalid, |task| task.result)
    }
}

impl Drop for IterativeSearcher {
    fn drop(&mut self) {
        self.stop();
    }
}
