use patience_common::game::{CardStack, Game};
use patience_common::moves::Move;

use quick_cache::unsync::Cache;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::fingerprint::state_key;
use crate::generator::{TableauMoveCache, valid_moves};

pub const DEFAULT_STATE_CACHE_CAPACITY: usize = 1_000_000;
pub const DEFAULT_MOVE_CACHE_CAPACITY: usize = 100_000;

const DIAGNOSTIC_INTERVAL: u64 = 5_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SolveStatus {
    /// A winning move sequence was found.
    Solved,
    /// The deadline expired; winnability is undecided.
    Timeout,
    /// The search space, as coarsened by the state fingerprint and the
    /// pruning heuristics, was exhausted without a win.
    NoSolution,
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub elapsed: Duration,
    /// On [`SolveStatus::Solved`], the exact move sequence from the initial
    /// state to a won game; empty otherwise.
    pub moves: Vec<Move>,
}

/// Solves with default cache capacities.
pub fn solve(game: Game, timeout: Duration) -> SolveResult {
    Solver::new(game, timeout).solve()
}

/// Depth-first backtracking search over game states.
///
/// Branches are pruned through an equivalence-class state cache, a cached
/// list of non-revealing tableau moves per tableau layout, a path-scoped
/// set of already-seen face-up stacks, and a one-shot deck-flip permission
/// that stops endless talon recycling. Single-threaded; the only side
/// effects during search are optional progress lines on stderr.
pub struct Solver {
    game: Game,
    timeout: Duration,
    verbose: bool,
    state_cache_capacity: usize,
    move_cache_capacity: usize,
    state_cache: Cache<u64, ()>,
    move_cache: TableauMoveCache,
    start_time: Instant,
    num_calls: u64,
}

impl Solver {
    pub fn new(game: Game, timeout: Duration) -> Self {
        Self {
            game,
            timeout,
            verbose: false,
            state_cache_capacity: DEFAULT_STATE_CACHE_CAPACITY,
            move_cache_capacity: DEFAULT_MOVE_CACHE_CAPACITY,
            state_cache: Cache::new(DEFAULT_STATE_CACHE_CAPACITY),
            move_cache: TableauMoveCache::new(DEFAULT_MOVE_CACHE_CAPACITY),
            start_time: Instant::now(),
            num_calls: 0,
        }
    }

    /// Bounds for the state cache and the tableau-move cache. Capacities
    /// only affect how much pruning survives eviction, never correctness.
    pub fn with_cache_capacities(mut self, state: usize, moves: usize) -> Self {
        self.state_cache_capacity = state;
        self.move_cache_capacity = moves;
        self
    }

    /// Enables periodic progress lines on stderr.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Recursive entries into the search so far.
    pub fn num_calls(&self) -> u64 {
        self.num_calls
    }

    /// Runs the search from the initial state. Each call restarts with
    /// fresh caches.
    pub fn solve(&mut self) -> SolveResult {
        self.state_cache = Cache::new(self.state_cache_capacity);
        self.move_cache = TableauMoveCache::new(self.move_cache_capacity);
        self.num_calls = 0;
        self.start_time = Instant::now();

        let game = self.game.clone();
        let mut seen_stacks = HashSet::new();
        let winning = self.search(&game, &mut seen_stacks, false, 0);
        let elapsed = self.start_time.elapsed();

        let (status, moves) = match winning {
            Some(moves) => (SolveStatus::Solved, moves),
            None if elapsed >= self.timeout => (SolveStatus::Timeout, Vec::new()),
            None => (SolveStatus::NoSolution, Vec::new()),
        };
        SolveResult {
            status,
            elapsed,
            moves,
        }
    }

    /// One search step: deadline, won-check, state-cache probe, then the
    /// prioritized candidates in order. The first winning branch returns
    /// the move list accumulated on the way back out.
    fn search(
        &mut self,
        game: &Game,
        seen_stacks: &mut HashSet<CardStack>,
        can_flip_deck: bool,
        depth: usize,
    ) -> Option<Vec<Move>> {
        if self.start_time.elapsed() >= self.timeout {
            return None;
        }
        if game.is_won() {
            return Some(Vec::new());
        }

        let key = state_key(game, can_flip_deck);
        if self.state_cache.get(&key).is_some() {
            return None;
        }
        self.state_cache.insert(key, ());

        self.num_calls += 1;
        if self.verbose && self.num_calls % DIAGNOSTIC_INTERVAL == 0 {
            self.print_progress(depth);
        }

        for mov in valid_moves(game, &mut self.move_cache) {
            if let Some(mut winning) = self.try_move(mov, game, seen_stacks, can_flip_deck, depth) {
                winning.insert(0, mov);
                return Some(winning);
            }
        }
        None
    }

    /// Applies one already-validated move to a clone of the state, prunes
    /// it if it flips an exhausted deck without permission or rebuilds only
    /// stacks this path has produced before, and recurses.
    fn try_move(
        &mut self,
        mov: Move,
        game: &Game,
        seen_stacks: &mut HashSet<CardStack>,
        mut can_flip_deck: bool,
        depth: usize,
    ) -> Option<Vec<Move>> {
        match mov {
            Move::Draw => {
                // Drawing through the whole deck without playing from the
                // waste may not be repeated.
                if game.hand_is_empty() {
                    if can_flip_deck {
                        can_flip_deck = false;
                    } else {
                        return None;
                    }
                }
            }
            Move::WasteToFoundation | Move::WasteToTableau(_) => {
                can_flip_deck = true;
            }
            _ => {}
        }

        let mut next = game.clone();
        next.apply(mov);

        let mut added: SmallVec<[CardStack; 2]> = SmallVec::new();
        if let Move::TableauToTableau(src, _, dst) = mov {
            let src_stack = next.tableau()[src as usize].face_up.clone();
            let dst_stack = next.tableau()[dst as usize].face_up.clone();
            if seen_stacks.contains(&src_stack) && seen_stacks.contains(&dst_stack) {
                return None;
            }
            if seen_stacks.insert(src_stack.clone()) {
                added.push(src_stack);
            }
            if seen_stacks.insert(dst_stack.clone()) {
                added.push(dst_stack);
            }
        }

        let winning = self.search(&next, seen_stacks, can_flip_deck, depth + 1);

        for stack in added {
            seen_stacks.remove(&stack);
        }

        winning
    }

    fn print_progress(&self, depth: usize) {
        eprintln!(
            "calls: {}  depth: {}  state cache: {}  move cache: {}  elapsed: {:.1}s",
            self.num_calls,
            depth,
            self.state_cache.len(),
            self.move_cache.len(),
            self.start_time.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patience_common::deck::Deck;

    fn replay(mut game: Game, moves: &[Move]) {
        for &mov in moves {
            assert!(game.is_valid(mov));
            game.apply(mov);
        }
        assert!(game.is_won());
    }

    #[test]
    fn test_trivially_won_state() {
        let game = Game::parse("Foundation: K♠ K♥ K♦ K♣\nDrawCount: 3").unwrap();
        assert!(game.is_won());
        let result = solve(game, Duration::from_secs(5));
        assert_eq!(result.status, SolveStatus::Solved);
        assert!(result.moves.is_empty());
    }

    #[test]
    fn test_one_move_win() {
        // The King goes up, the exposed Queen flips, and no hidden cards
        // or talon cards remain.
        let text = "Foundation: Q♠ Q♥ Q♦ J♣\nTableau0: Q♣|K♠\nDrawCount: 3";
        let game = Game::parse(text).unwrap();
        assert!(!game.is_won());

        let result = solve(game.clone(), Duration::from_secs(5));
        assert_eq!(result.status, SolveStatus::Solved);
        assert_eq!(result.moves, vec![Move::TableauToFoundation(0)]);
        replay(game, &result.moves);
    }

    #[test]
    fn test_draw_then_play_win() {
        let game = Game::parse("Talon: A♠\nDrawCount: 3").unwrap();
        let result = solve(game.clone(), Duration::from_secs(5));
        assert_eq!(result.status, SolveStatus::Solved);
        assert_eq!(result.moves, vec![Move::Draw, Move::WasteToFoundation]);
        replay(game, &result.moves);
    }

    #[test]
    fn test_dead_talon_prunes_recycling() {
        // Nothing in the talon ever plays; after one pass through the deck
        // the recycling draw is cut off by the flip permission.
        let game = Game::parse("Talon: 5♠5♥5♦\nDrawCount: 3").unwrap();
        let mut solver = Solver::new(game, Duration::from_secs(5));
        let result = solver.solve();
        assert_eq!(result.status, SolveStatus::NoSolution);
        assert!(result.moves.is_empty());
        assert!(solver.num_calls() <= 4);
    }

    #[test]
    fn test_zero_timeout_reports_timeout() {
        let game = Game::new(&Deck::sorted(), 3);
        let result = solve(game, Duration::ZERO);
        assert_eq!(result.status, SolveStatus::Timeout);
        assert!(result.moves.is_empty());
        assert!(result.elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_sorted_deck_solves_and_replays() {
        let deck = Deck::sorted();
        let result = solve(Game::new(&deck, 3), Duration::from_secs(60));
        assert_eq!(result.status, SolveStatus::Solved);
        assert!(!result.moves.is_empty());
        replay(Game::new(&deck, 3), &result.moves);
    }

    #[test]
    fn test_solver_can_rerun() {
        let game = Game::parse("Talon: A♠\nDrawCount: 3").unwrap();
        let mut solver = Solver::new(game, Duration::from_secs(5));
        let first = solver.solve();
        let second = solver.solve();
        assert_eq!(first.status, SolveStatus::Solved);
        assert_eq!(first.moves, second.moves);
    }
}
