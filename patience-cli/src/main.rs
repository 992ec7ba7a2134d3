mod utils;

use crate::utils::*;

use anyhow::{Context, Result, bail};
use clap::Parser;
use patience_common::{
    deck::Deck,
    game::Game,
    moves::{Move, NUM_MOVE_EXTRAS, format_moves},
};
use patience_solver::{
    DEFAULT_MOVE_CACHE_CAPACITY, DEFAULT_STATE_CACHE_CAPACITY, SolveResult, SolveStatus,
};
use serde::Serialize;

use std::{
    io::{IsTerminal, Read, stderr, stdin},
    path::PathBuf,
    time::Duration,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Deck as 52 two-character cards in deal order (e.g. AS2S..KC)
    #[arg(short, long, value_name = "CARDS")]
    deck: Option<String>,
    /// Cards drawn from the hand per draw
    #[arg(long, default_value_t = 3, value_name = "NUM")]
    draw_size: usize,
    /// Solver timeout in seconds
    #[arg(short, long, default_value_t = 30, value_name = "SECS")]
    timeout: u64,
    /// Max entries for the solver state cache
    #[arg(long, default_value_t = DEFAULT_STATE_CACHE_CAPACITY, value_name = "NUM")]
    state_cache_capacity: usize,
    /// Max entries for the tableau move cache
    #[arg(long, default_value_t = DEFAULT_MOVE_CACHE_CAPACITY, value_name = "NUM")]
    move_cache_capacity: usize,
    /// Print search progress to stderr
    #[arg(short, long)]
    verbose: bool,
    /// Emit the result as JSON on stdout
    #[arg(short, long)]
    json: bool,
    /// Preview the dealt game without solving
    #[arg(short, long)]
    preview: bool,
    /// Path to a file containing the deck
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let deck_text = if let Some(deck) = &cli.deck {
        deck.clone()
    } else if let Some(file) = &cli.file {
        std::fs::read_to_string(file)?
    } else if !stdin().is_terminal() {
        let mut content = String::new();
        stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        content
    } else {
        bail!("No deck provided; pass --deck, a file, or pipe one to stdin.");
    };
    let deck = Deck::parse(&deck_text).context("Failed to parse deck")?;

    if cli.draw_size == 0 {
        bail!("Draw size must be at least 1.");
    }
    let game = Game::new(&deck, cli.draw_size);

    if cli.preview {
        println!("{}", game.to_pretty_string());
        return Ok(());
    }

    let show_progress = !cli.verbose && !cli.json && stderr().is_terminal();
    let (result, calls) = run_solver(
        game.clone(),
        Duration::from_secs(cli.timeout),
        cli.state_cache_capacity,
        cli.move_cache_capacity,
        cli.verbose,
        show_progress,
    )?;

    if cli.json {
        println!("{}", serde_json::to_string(&JsonResult::new(&result))?);
    } else {
        report(&game, &result, calls);
    }

    Ok(())
}

fn report(game: &Game, result: &SolveResult, calls: u64) {
    println!("{}", game.to_pretty_string());
    let elapsed = format_elapsed(result.elapsed);
    match result.status {
        SolveStatus::Solved => {
            println!(
                "✓ Winnable in {} moves — Time: {elapsed}, Calls: {calls}\n",
                result.moves.len()
            );
            println!("{}", format_moves(&result.moves));
        }
        SolveStatus::Timeout => {
            println!("✗ Timed out after {elapsed}; winnability undecided. Calls: {calls}");
        }
        SolveStatus::NoSolution => {
            println!("✗ No solution exists — Time: {elapsed}, Calls: {calls}");
        }
    }
}

#[derive(Serialize)]
struct JsonResult {
    status: &'static str,
    elapsed: u64,
    moves: Vec<JsonMove>,
}

#[derive(Serialize)]
struct JsonMove {
    r#type: u8,
    extras: [i8; NUM_MOVE_EXTRAS],
}

impl JsonResult {
    fn new(result: &SolveResult) -> Self {
        Self {
            status: match result.status {
                SolveStatus::Solved => "SOLVED",
                SolveStatus::Timeout => "TIMEOUT",
                SolveStatus::NoSolution => "NO_SOLUTION",
            },
            elapsed: result.elapsed.as_secs(),
            moves: result.moves.iter().map(JsonMove::new).collect(),
        }
    }
}

impl JsonMove {
    fn new(mov: &Move) -> Self {
        Self {
            r#type: mov.type_tag(),
            extras: mov.extras(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_result_shape() {
        let result = SolveResult {
            status: SolveStatus::Solved,
            elapsed: Duration::from_secs(2),
            moves: vec![Move::Draw, Move::TableauToTableau(1, 0, 4)],
        };
        let json = serde_json::to_string(&JsonResult::new(&result)).unwrap();
        assert_eq!(
            json,
            r#"{"status":"SOLVED","elapsed":2,"moves":[{"type":0,"extras":[-1,-1,-1]},{"type":4,"extras":[1,0,4]}]}"#
        );
    }
}
