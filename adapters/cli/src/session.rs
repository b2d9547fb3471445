use std::io::Write;

use anyhow::{Context, Result};
use log::info;
use maze_pages_core::{
    Color, Command, Difficulty, Direction, Intents, PlayerId, Profile, Representation, Size, Theme,
};
use maze_pages_rendering::{RenderingBackend, Scene, TextBackend};
use maze_pages_world::{self as world, query, Config, Layout, Level, LevelState, ObstacleClock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const PLAYER_COLORS: [Color; 6] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
];

/// Directions a wandering player picks from; standing still is allowed.
const WANDER: [Direction; 5] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
    Direction::Stay,
];

/// Settings of one headless session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SessionOptions {
    pub(crate) players: Vec<String>,
    pub(crate) page_size: Size,
    pub(crate) ticks: u64,
    pub(crate) seed: u64,
    pub(crate) difficulty: Option<Difficulty>,
    pub(crate) frames: bool,
    pub(crate) colored: bool,
}

/// Result of a finished session.
#[derive(Debug)]
pub(crate) struct Summary {
    pub(crate) ticks: u64,
    pub(crate) state: LevelState,
    pub(crate) level: Level,
}

/// Plays the layout with randomly wandering players and writes frames and a
/// summary to `out`.
pub(crate) fn run<W: Write>(
    layout: &Layout,
    options: &SessionOptions,
    out: W,
) -> Result<Summary> {
    let config = Config::new(options.page_size, options.seed);
    let roster = profiles(&options.players);
    let mut level = Level::from_layout(layout, Theme::classic(), roster, &config)
        .context("failed to build level")?;
    let mut events = Vec::new();
    if let Some(difficulty) = options.difficulty {
        world::apply(&mut level, Command::SetDifficulty { difficulty }, &mut events)?;
    }

    let mut clock = ObstacleClock::new(query::difficulty(&level));
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let mut backend = TextBackend::new(out).with_colors(options.colored);
    if options.frames {
        backend.present(&Scene::capture(&level))?;
    }

    let mut ticks = 0;
    while ticks < options.ticks && !query::is_over(&level) {
        events.clear();
        let intents = wander(&level, &mut rng);
        world::apply(
            &mut level,
            Command::Tick {
                intents,
                move_obstacles: clock.tick(),
            },
            &mut events,
        )?;
        ticks += 1;
        if options.frames {
            backend.present(&Scene::capture(&level).with_messages(&events))?;
        }
    }

    let state = query::state(&level);
    info!("session ended after {ticks} ticks: {state:?}");
    let mut out = backend.into_inner();
    writeln!(out, "{} after {ticks} ticks", outcome(state))?;
    for line in query::status_lines(&level) {
        writeln!(out, "{line}")?;
    }
    Ok(Summary {
        ticks,
        state,
        level,
    })
}

/// Glyph-only profiles: the first letter of the identifier in a rotating color.
pub(crate) fn profiles(ids: &[String]) -> Vec<Profile> {
    ids.iter()
        .zip(PLAYER_COLORS.iter().cycle())
        .map(|(id, color)| {
            let glyph = id
                .chars()
                .next()
                .map_or('@', |first| first.to_ascii_uppercase());
            Profile::new(
                PlayerId::new(id.as_str()),
                Representation::new(glyph, Color::Default, *color),
            )
        })
        .collect()
}

fn wander<R: Rng>(level: &Level, rng: &mut R) -> Intents {
    query::players(level)
        .iter()
        .map(|player| {
            let direction = WANDER[rng.gen_range(0..WANDER.len())];
            (player.id().clone(), direction)
        })
        .collect()
}

fn outcome(state: LevelState) -> &'static str {
    match state {
        LevelState::Active => "Still running",
        LevelState::Won => "Won",
        LevelState::Lost => "Lost",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(ticks: u64) -> SessionOptions {
        SessionOptions {
            players: vec!["ada".to_owned(), "bob".to_owned()],
            page_size: Size::new(3, 3),
            ticks,
            seed: 42,
            difficulty: Some(Difficulty::Hard),
            frames: true,
            colored: false,
        }
    }

    fn layout() -> Layout {
        Layout::parse("Name=Yard\nWidth=6\nHeight=4\n0,0=1\n5,3=2\n2,1=0\n4,0=5\n")
            .expect("layout")
    }

    #[test]
    fn profiles_take_initials_and_rotate_colors() {
        let profiles = profiles(&["ada".to_owned(), "".to_owned()]);
        assert_eq!(profiles[0].representation().glyph(), 'A');
        assert_eq!(profiles[0].representation().foreground(), Color::Red);
        assert_eq!(profiles[1].representation().glyph(), '@');
        assert_eq!(profiles[1].representation().foreground(), Color::Green);
    }

    #[test]
    fn session_prints_one_frame_per_tick_and_a_summary() {
        let mut out = Vec::new();
        let summary = run(&layout(), &options(5), &mut out).expect("session");
        let text = String::from_utf8(out).expect("utf8");

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.state, LevelState::Active);
        assert_eq!(text.matches("Yard page").count(), 6);
        assert!(text.contains("Still running after 5 ticks"));
        assert!(text.contains("Keys: 0/0"));
        assert_eq!(query::difficulty(&summary.level), Difficulty::Hard);
    }

    #[test]
    fn sessions_are_reproducible_for_a_seed() {
        let mut first = Vec::new();
        let mut second = Vec::new();
        let _ = run(&layout(), &options(30), &mut first).expect("first");
        let _ = run(&layout(), &options(30), &mut second).expect("second");
        assert_eq!(first, second);
    }
}
