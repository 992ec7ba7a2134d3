use anyhow::{Result, anyhow};
use patience_common::game::Game;
use patience_solver::{SolveResult, Solver};

use std::{
    io::{Write, stderr},
    thread,
    time::{Duration, Instant},
};

// The search recursion can go very deep; run it on its own thread with a
// generous stack instead of the default one.
const SOLVER_STACK_SIZE: usize = 64 * 1024 * 1024;

const PROGRESS_TICK: Duration = Duration::from_millis(250);

/// Runs the solver to completion on a dedicated thread and returns the
/// result together with the number of search calls made. The solver and its
/// caches live entirely on that thread.
///
/// With `show_progress`, the calling thread keeps a single status line on
/// stderr while it waits, counting the search time against the deadline.
pub fn run_solver(
    game: Game,
    timeout: Duration,
    state_cache_capacity: usize,
    move_cache_capacity: usize,
    verbose: bool,
    show_progress: bool,
) -> Result<(SolveResult, u64)> {
    let child = thread::Builder::new()
        .stack_size(SOLVER_STACK_SIZE)
        .spawn(move || {
            let mut solver = Solver::new(game, timeout)
                .with_cache_capacities(state_cache_capacity, move_cache_capacity)
                .with_verbose(verbose);
            let result = solver.solve();
            (result, solver.num_calls())
        })?;

    if show_progress {
        let started = Instant::now();
        while !child.is_finished() {
            let elapsed = started.elapsed();
            let left = timeout.saturating_sub(elapsed);
            let mut err = stderr().lock();
            let _ = write!(
                err,
                "\r\x1b[2KSearching... {} elapsed, {} until timeout",
                format_elapsed(elapsed),
                format_elapsed(left)
            );
            let _ = err.flush();
            thread::sleep(PROGRESS_TICK);
        }
        let mut err = stderr().lock();
        let _ = write!(err, "\r\x1b[2K");
        let _ = err.flush();
    }

    child
        .join()
        .map_err(|_| anyhow!("The solver thread panicked"))
}

/// Short human-readable duration: sub-minute times with centisecond
/// precision, longer ones as minutes and whole seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0.00s");
        assert_eq!(format_elapsed(Duration::from_millis(1504)), "1.50s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "59.00s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m05s");
    }
}
