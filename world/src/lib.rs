#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for the paged maze engine.
//!
//! A [`Level`] owns a [`PageGrid`] that tiles an oversized maze into
//! display-sized [`Page`]s, the active and dead player rosters and the
//! profiles still waiting to enter. It is mutated only through [`apply`]
//! and read through the functions in [`query`].

mod element;
mod error;
mod grid;
mod layout;
mod level;
mod page;
mod player;

pub use element::Element;
pub use error::{GridError, LayoutError, LevelError, PageError, PlayerError};
pub use grid::PageGrid;
pub use layout::{Layout, Placement};
pub use level::{Level, LevelState};
pub use page::Page;
pub use player::Player;

use maze_pages_core::{Command, Difficulty, Event, Size, MAXIMUM_LIVES};

/// Session settings chosen by the host rather than the layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    page_size: Size,
    rng_seed: u64,
    max_lives: u8,
}

impl Config {
    /// Creates a configuration with the default number of lives.
    #[must_use]
    pub const fn new(page_size: Size, rng_seed: u64) -> Self {
        Self {
            page_size,
            rng_seed,
            max_lives: MAXIMUM_LIVES,
        }
    }

    /// Overrides the lives every player starts with. At least one life is kept.
    #[must_use]
    pub fn with_max_lives(mut self, max_lives: u8) -> Self {
        self.max_lives = max_lives.max(1);
        self
    }

    /// Columns and rows of one page.
    #[must_use]
    pub const fn page_size(&self) -> Size {
        self.page_size
    }

    /// Seed of the level's random source.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Lives every player starts with.
    #[must_use]
    pub const fn max_lives(&self) -> u8 {
        self.max_lives
    }
}

/// Caller-side pacing of dynamic obstacles.
///
/// Obstacles step once every `delay + 1` ticks, where the delay comes from
/// the [`Difficulty`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleClock {
    delay: u32,
    counter: u32,
}

impl ObstacleClock {
    /// Creates a clock for the difficulty.
    #[must_use]
    pub const fn new(difficulty: Difficulty) -> Self {
        Self {
            delay: difficulty.delay(),
            counter: 0,
        }
    }

    /// Advances the clock and reports whether obstacles move this tick.
    pub fn tick(&mut self) -> bool {
        if self.counter >= self.delay {
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            false
        }
    }

    /// Switches to another difficulty and restarts the count.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        *self = Self::new(difficulty);
    }
}

/// Applies the command to the level, appending what happened to `out_events`.
pub fn apply(
    level: &mut Level,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), LevelError> {
    match command {
        Command::Tick {
            intents,
            move_obstacles,
        } => level.update(&intents, move_obstacles, out_events),
        Command::ResizePages { page_size } => level.resize_pages(page_size, out_events),
        Command::SetTheme { theme } => {
            level.set_theme(theme, out_events);
            Ok(())
        }
        Command::SetDifficulty { difficulty } => {
            level.set_difficulty(difficulty, out_events);
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the level state.
pub mod query {
    use maze_pages_core::{Difficulty, Index, PlayerId, Profile, Theme};

    use super::{Element, Level, LevelState, Page, PageGrid, Player};

    /// Name of the level.
    #[must_use]
    pub fn name(level: &Level) -> &str {
        &level.name
    }

    /// Theme the level is drawn with.
    #[must_use]
    pub fn theme(level: &Level) -> &Theme {
        &level.theme
    }

    /// Difficulty recorded for the session.
    #[must_use]
    pub fn difficulty(level: &Level) -> Difficulty {
        level.difficulty
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(level: &Level) -> LevelState {
        level.state
    }

    /// Whether the level has been won or lost.
    #[must_use]
    pub fn is_over(level: &Level) -> bool {
        level.state != LevelState::Active
    }

    /// Read-only access to the paged grid.
    #[must_use]
    pub fn grid(level: &Level) -> &PageGrid {
        &level.grid
    }

    /// Page currently shown.
    #[must_use]
    pub fn current_page(level: &Level) -> &Page {
        level.grid.current_page()
    }

    /// Index of the page currently shown.
    #[must_use]
    pub fn current_page_index(level: &Level) -> Index {
        level.grid.current_index()
    }

    /// Elements of the current page in row-major order.
    pub fn visible_elements(level: &Level) -> impl Iterator<Item = &Element> {
        level.grid.current_page().elements()
    }

    /// Active players standing on the current page.
    pub fn visible_players(level: &Level) -> impl Iterator<Item = &Player> {
        let page = level.grid.current_page();
        level
            .players
            .iter()
            .filter(move |player| page.is_inside(player.point()))
    }

    /// Active players in roster order.
    #[must_use]
    pub fn players(level: &Level) -> &[Player] {
        &level.players
    }

    /// Players that ran out of lives, in order of death.
    #[must_use]
    pub fn dead_players(level: &Level) -> &[Player] {
        &level.dead
    }

    /// Profiles still waiting to enter, front first.
    pub fn waiting(level: &Level) -> impl Iterator<Item = &Profile> {
        level.waiting.iter()
    }

    /// Active or dead player with the identifier.
    #[must_use]
    pub fn player<'a>(level: &'a Level, id: &PlayerId) -> Option<&'a Player> {
        level
            .players
            .iter()
            .chain(&level.dead)
            .find(|player| player.id() == id)
    }

    /// Keys picked up so far.
    #[must_use]
    pub fn keys_collected(level: &Level) -> u32 {
        level.keys_collected
    }

    /// Keys in the level, including spawned ones.
    #[must_use]
    pub fn total_keys(level: &Level) -> u32 {
        level.total_keys
    }

    /// Status bar text: the key count followed by one line per player.
    #[must_use]
    pub fn status_lines(level: &Level) -> Vec<String> {
        let mut lines = vec![format!(
            "Keys: {}/{}",
            level.keys_collected, level.total_keys
        )];
        lines.extend(
            level
                .players
                .iter()
                .chain(&level.dead)
                .map(ToString::to_string),
        );
        lines.extend(
            level
                .waiting
                .iter()
                .map(|profile| format!("{}: WAITING", profile.id())),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacle_clock_follows_difficulty_delay() {
        let mut hard = ObstacleClock::new(Difficulty::Hard);
        assert!((0..4).all(|_| hard.tick()));

        let mut very_easy = ObstacleClock::new(Difficulty::VeryEasy);
        let fired: Vec<bool> = (0..8).map(|_| very_easy.tick()).collect();
        assert_eq!(
            fired,
            vec![false, false, false, true, false, false, false, true]
        );

        very_easy.set_difficulty(Difficulty::Medium);
        assert!(!very_easy.tick());
        assert!(very_easy.tick());
    }

    #[test]
    fn config_keeps_at_least_one_life() {
        let config = Config::new(Size::new(8, 4), 3).with_max_lives(0);
        assert_eq!(config.max_lives(), 1);
        assert_eq!(Config::new(Size::new(8, 4), 3).max_lives(), MAXIMUM_LIVES);
    }
}
