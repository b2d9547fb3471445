#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a paged maze layout headlessly.

mod session;

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use maze_pages_core::{Difficulty, Size};
use maze_pages_world::Layout;

use crate::session::SessionOptions;

/// Runs a seeded session on a maze layout and prints what happens.
#[derive(Parser, Debug)]
#[command(name = "maze-pages", version, about)]
struct Args {
    /// Layout or saved session file (`key=value` per line).
    #[arg(long)]
    layout: PathBuf,
    /// Player identifier; repeat for more players.
    #[arg(long = "player", default_value = "player")]
    players: Vec<String>,
    /// Columns of one page.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    page_columns: u32,
    /// Rows of one page.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    page_rows: u32,
    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 100)]
    ticks: u64,
    /// Seed for the level and the wandering players.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Overrides the difficulty stored in the layout.
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Prints the current page after every tick.
    #[arg(long)]
    frames: bool,
    /// Colors frames with ANSI escapes.
    #[arg(long)]
    color: bool,
    /// Writes the final session to this file.
    #[arg(long)]
    save: Option<PathBuf>,
}

impl Args {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            players: self.players.clone(),
            page_size: Size::new(self.page_columns, self.page_rows),
            ticks: self.ticks,
            seed: self.seed,
            difficulty: self.difficulty,
            frames: self.frames,
            colored: self.color,
        }
    }
}

/// Entry point for the paged maze command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.layout)
        .with_context(|| format!("failed to read layout {}", args.layout.display()))?;
    let layout = Layout::parse(&text)
        .with_context(|| format!("failed to parse layout {}", args.layout.display()))?;

    let summary = session::run(&layout, &args.session_options(), io::stdout().lock())?;
    debug!("{} ticks ended in {:?}", summary.ticks, summary.state);

    if let Some(path) = &args.save {
        let saved = summary.level.to_layout()?.to_text();
        fs::write(path, saved)
            .with_context(|| format!("failed to save session to {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_optional_arguments() {
        let args = Args::try_parse_from(["maze-pages", "--layout", "maze.txt"]).expect("args");
        assert_eq!(args.players, vec!["player".to_owned()]);
        assert_eq!(args.page_columns, 20);
        assert_eq!(args.ticks, 100);
        assert!(args.difficulty.is_none());
        assert!(!args.frames);
    }

    #[test]
    fn repeated_players_and_difficulty_are_parsed() {
        let args = Args::try_parse_from([
            "maze-pages",
            "--layout",
            "maze.txt",
            "--player",
            "ada",
            "--player",
            "bob",
            "--difficulty",
            "very-easy",
            "--page-rows",
            "4",
        ])
        .expect("args");
        let options = args.session_options();
        assert_eq!(options.players, vec!["ada".to_owned(), "bob".to_owned()]);
        assert_eq!(options.difficulty, Some(Difficulty::VeryEasy));
        assert_eq!(options.page_size, Size::new(20, 4));
    }

    #[test]
    fn zero_sized_pages_and_missing_layouts_are_rejected() {
        assert!(Args::try_parse_from(["maze-pages", "--layout", "m", "--page-rows", "0"]).is_err());
        assert!(Args::try_parse_from(["maze-pages"]).is_err());
    }
}
