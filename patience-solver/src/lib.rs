//! Brute-force winnability search for Klondike deals: depth-first
//! backtracking over game states with equivalence-class pruning, bounded
//! caches, and a wall-clock timeout.

mod fingerprint;
mod generator;
mod solver;

pub use crate::solver::{
    DEFAULT_MOVE_CACHE_CAPACITY, DEFAULT_STATE_CACHE_CAPACITY, SolveResult, SolveStatus, Solver,
    solve,
};
