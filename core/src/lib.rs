#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the paged maze engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pure movement systems and the adapters: geometry, the closed set of
//! element [`Kind`]s, visual [`Representation`]s supplied by a [`Theme`],
//! player [`Profile`]s, and the [`Event`] values the level simulation emits
//! after each tick so presentation layers can react without touching
//! internal state.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod geometry;

pub use geometry::{Delta, GeometryError, Index, Point, Region, Size};

/// Lives a player starts with unless configured otherwise.
pub const MAXIMUM_LIVES: u8 = 3;

/// Movement intents gathered for one tick, keyed by player.
pub type Intents = BTreeMap<PlayerId, Direction>;

/// Cardinal movement directions plus standing still.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    Up,
    /// Movement toward increasing row indices.
    Down,
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
    /// No movement.
    Stay,
}

impl Direction {
    /// The four directions that actually move.
    pub const MOTION: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Direction pointing the other way; `Stay` is its own opposite.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Stay => Self::Stay,
        }
    }

    /// Unit step taken when moving in this direction.
    #[must_use]
    pub const fn delta(self) -> Delta {
        match self {
            Self::Up => Delta::UP,
            Self::Down => Delta::DOWN,
            Self::Left => Delta::LEFT,
            Self::Right => Delta::RIGHT,
            Self::Stay => Delta::STAY,
        }
    }

    /// Whether the direction moves along the y axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Whether the direction moves along the x axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Fixed category of a game element.
///
/// Codes are stable and used by the flat layout format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    /// Impassable cell.
    Wall,
    /// Cell where players enter the level.
    Entrance,
    /// Cell that wins the level once every key is collected.
    Exit,
    /// Collectible required to use the exit.
    Key,
    /// Obstacle that stays put and injures on contact.
    StaticObstacle,
    /// Obstacle that moves on its own and injures on contact.
    DynamicObstacle,
    /// Box that triggers a random event when opened.
    MysteryBox,
    /// A player controlled by a profile.
    Player,
}

impl Kind {
    /// Every kind that can occupy a cell of the level grid.
    pub const PLACEABLE: [Kind; 7] = [
        Kind::Wall,
        Kind::Entrance,
        Kind::Exit,
        Kind::Key,
        Kind::StaticObstacle,
        Kind::DynamicObstacle,
        Kind::MysteryBox,
    ];

    /// Stable numeric code used for serialization.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Wall => 0,
            Self::Entrance => 1,
            Self::Exit => 2,
            Self::Key => 3,
            Self::StaticObstacle => 4,
            Self::DynamicObstacle => 5,
            Self::MysteryBox => 6,
            Self::Player => 7,
        }
    }

    /// Kind for a serialized code, if the code is known.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Wall),
            1 => Some(Self::Entrance),
            2 => Some(Self::Exit),
            3 => Some(Self::Key),
            4 => Some(Self::StaticObstacle),
            5 => Some(Self::DynamicObstacle),
            6 => Some(Self::MysteryBox),
            7 => Some(Self::Player),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wall => "Wall",
            Self::Entrance => "Entrance",
            Self::Exit => "Exit",
            Self::Key => "Key",
            Self::StaticObstacle => "Static Obstacle",
            Self::DynamicObstacle => "Dynamic Obstacle",
            Self::MysteryBox => "Mystery Box",
            Self::Player => "Player",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal palette color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Whatever the terminal uses by default.
    Default,
    /// Black.
    Black,
    /// Red.
    Red,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Blue.
    Blue,
    /// Magenta.
    Magenta,
    /// Cyan.
    Cyan,
    /// White.
    White,
}

/// Glyph plus background and foreground colors used to draw an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Representation {
    glyph: char,
    background: Color,
    foreground: Color,
}

impl Representation {
    /// Creates a new representation.
    #[must_use]
    pub const fn new(glyph: char, background: Color, foreground: Color) -> Self {
        Self {
            glyph,
            background,
            foreground,
        }
    }

    /// Character drawn in the cell.
    #[must_use]
    pub const fn glyph(&self) -> char {
        self.glyph
    }

    /// Cell background color.
    #[must_use]
    pub const fn background(&self) -> Color {
        self.background
    }

    /// Glyph color.
    #[must_use]
    pub const fn foreground(&self) -> Color {
        self.foreground
    }
}

/// Named mapping from kinds to representations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    name: String,
    representations: BTreeMap<Kind, Representation>,
}

impl Theme {
    /// Built-in theme used when no theme file is supplied.
    #[must_use]
    pub fn classic() -> Self {
        let representations = Kind::PLACEABLE
            .into_iter()
            .chain([Kind::Player])
            .map(|kind| (kind, classic_representation(kind)))
            .collect();
        Self {
            name: "classic".to_owned(),
            representations,
        }
    }

    /// Copy of this theme under a new name with one representation replaced.
    #[must_use]
    pub fn with_representation(mut self, kind: Kind, representation: Representation) -> Self {
        let _ = self.representations.insert(kind, representation);
        self
    }

    /// Renames the theme.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name under which the theme is stored.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Representation used for the kind; kinds a theme never mentions fall
    /// back to the classic look.
    #[must_use]
    pub fn representation_of(&self, kind: Kind) -> Representation {
        self.representations
            .get(&kind)
            .copied()
            .unwrap_or_else(|| classic_representation(kind))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

fn classic_representation(kind: Kind) -> Representation {
    match kind {
        Kind::Wall => Representation::new('#', Color::Default, Color::White),
        Kind::Entrance => Representation::new('E', Color::Default, Color::Green),
        Kind::Exit => Representation::new('X', Color::Default, Color::Green),
        Kind::Key => Representation::new('k', Color::Default, Color::Yellow),
        Kind::StaticObstacle => Representation::new('o', Color::Default, Color::Red),
        Kind::DynamicObstacle => Representation::new('*', Color::Default, Color::Red),
        Kind::MysteryBox => Representation::new('?', Color::Default, Color::Magenta),
        Kind::Player => Representation::new('@', Color::Default, Color::Cyan),
    }
}

/// Identifier of a player profile.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Player profile: an identity and the way its player is drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    id: PlayerId,
    representation: Representation,
}

impl Profile {
    /// Creates a new profile.
    #[must_use]
    pub fn new(id: PlayerId, representation: Representation) -> Self {
        Self { id, representation }
    }

    /// Identifier of the profile.
    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Representation of the profile's player.
    #[must_use]
    pub const fn representation(&self) -> Representation {
        self.representation
    }
}

/// Events hidden in mystery boxes, drawn uniformly at random.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MysteryEvent {
    /// Nothing happens.
    Empty,
    /// The player regains a life.
    Heal,
    /// The player loses a life.
    Injure,
    /// A key is spawned and the key total grows.
    NewKey,
    /// A static obstacle is spawned.
    NewStaticObstacle,
    /// A dynamic obstacle is spawned.
    NewDynamicObstacle,
    /// Another mystery box is spawned.
    NewMysteryBox,
    /// A wall is spawned.
    NewWall,
    /// One dynamic obstacle is removed.
    RemoveDynamicObstacle,
    /// One static obstacle is removed.
    RemoveStaticObstacle,
    /// A collected key is lost and placed back into the level.
    LoseKey,
}

impl MysteryEvent {
    /// The full catalogue in draw order.
    pub const ALL: [MysteryEvent; 11] = [
        MysteryEvent::Empty,
        MysteryEvent::Heal,
        MysteryEvent::Injure,
        MysteryEvent::NewKey,
        MysteryEvent::NewStaticObstacle,
        MysteryEvent::NewDynamicObstacle,
        MysteryEvent::NewMysteryBox,
        MysteryEvent::NewWall,
        MysteryEvent::RemoveDynamicObstacle,
        MysteryEvent::RemoveStaticObstacle,
        MysteryEvent::LoseKey,
    ];

    /// Message shown to players when the event fires.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Empty => "This mystery-box is empty.",
            Self::Heal => "You find a cold drink and are healed!",
            Self::Injure => "You find an exam paper and are injured!",
            Self::NewKey => "A new key appears!",
            Self::NewStaticObstacle => "A new static obstacle appears!",
            Self::NewDynamicObstacle => "A new dynamic obstacle appears!",
            Self::NewMysteryBox => "A new mystery-box appears!",
            Self::NewWall => "A new wall appears!",
            Self::RemoveDynamicObstacle => "A dynamic obstacle disappears!",
            Self::RemoveStaticObstacle => "A static obstacle disappears!",
            Self::LoseKey => "You lose a key!",
        }
    }
}

/// Why a mystery box effect could not be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MysteryFailure {
    /// There was no free cell left to spawn into.
    NoSpace,
    /// There was no element of the requested kind to remove.
    NothingToRemove,
    /// The player already has every life.
    AlreadyFullHealth,
    /// The player has not collected a key that could be lost.
    NoKeysCollected,
}

impl MysteryFailure {
    /// Message shown after the event's own message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoSpace => "But there is no space left!",
            Self::NothingToRemove => "But there are none!",
            Self::AlreadyFullHealth => "But you already have full health!",
            Self::NoKeysCollected => "But you have not collected any yet!",
        }
    }
}

/// Error returned when a difficulty name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}'")]
pub struct ParseDifficultyError(String);

/// Difficulty of a session, expressed as how many ticks obstacles wait between steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Obstacles step every fourth tick.
    VeryEasy,
    /// Obstacles step every third tick.
    Easy,
    /// Obstacles step every second tick.
    #[default]
    Medium,
    /// Obstacles step every tick.
    Hard,
}

impl Difficulty {
    /// Ticks an obstacle waits between two steps.
    #[must_use]
    pub const fn delay(self) -> u32 {
        match self {
            Self::VeryEasy => 3,
            Self::Easy => 2,
            Self::Medium => 1,
            Self::Hard => 0,
        }
    }

    /// Name used in saved sessions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryEasy => "VERY_EASY",
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let normalised = text.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalised.as_str() {
            "VERY_EASY" => Ok(Self::VeryEasy),
            "EASY" => Ok(Self::Easy),
            "MEDIUM" => Ok(Self::Medium),
            "HARD" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(text.to_owned())),
        }
    }
}

/// Commands that mutate the authoritative level state.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Resolves one game tick.
    Tick {
        /// Direction each player asked to move in.
        intents: Intents,
        /// Whether dynamic obstacles take a step this tick.
        move_obstacles: bool,
    },
    /// Re-tiles the level for a new display size.
    ResizePages {
        /// Columns and rows of one page.
        page_size: Size,
    },
    /// Re-skins every element.
    SetTheme {
        /// Theme supplying the new representations.
        theme: Theme,
    },
    /// Changes the difficulty recorded for the session.
    SetDifficulty {
        /// New difficulty.
        difficulty: Difficulty,
    },
}

/// Outcomes broadcast by the level simulation while resolving a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A player's move was applied.
    PlayerMoved {
        /// Player that moved.
        player: PlayerId,
        /// Cell left behind.
        from: Point,
        /// Cell now occupied.
        to: Point,
    },
    /// A player's move was undone.
    MoveUndone {
        /// Player that was sent back.
        player: PlayerId,
        /// Cell the player was returned to.
        to: Point,
    },
    /// A waiting profile entered the level as a new player.
    PlayerEntered {
        /// Player that entered.
        player: PlayerId,
        /// Entrance the player appeared on.
        at: Point,
    },
    /// A player picked up a key.
    KeyCollected {
        /// Player that collected the key.
        player: PlayerId,
        /// Keys collected so far.
        collected: u32,
        /// Keys in the level.
        total: u32,
    },
    /// A player lost a life.
    PlayerInjured {
        /// Player that was injured.
        player: PlayerId,
        /// Lives remaining.
        lives: u8,
    },
    /// A player regained a life.
    PlayerHealed {
        /// Player that was healed.
        player: PlayerId,
        /// Lives after healing.
        lives: u8,
    },
    /// A player ran out of lives and left the active roster.
    PlayerDied {
        /// Player that died.
        player: PlayerId,
    },
    /// A player opened a mystery box.
    MysteryBoxOpened {
        /// Player that opened the box.
        player: PlayerId,
        /// Event found inside.
        event: MysteryEvent,
    },
    /// A mystery box effect could not be applied.
    MysteryEffectFailed {
        /// Player that opened the box.
        player: PlayerId,
        /// Why nothing happened.
        reason: MysteryFailure,
    },
    /// An element appeared in the level.
    ElementSpawned {
        /// Kind of the new element.
        kind: Kind,
        /// Cell it occupies.
        point: Point,
    },
    /// An element was removed from the level.
    ElementDespawned {
        /// Kind of the removed element.
        kind: Kind,
        /// Cell it occupied.
        point: Point,
    },
    /// A dynamic obstacle moved.
    ObstacleMoved {
        /// Cell left behind.
        from: Point,
        /// Cell now occupied.
        to: Point,
    },
    /// The current page changed.
    PageChanged {
        /// Index of the new current page.
        index: Index,
    },
    /// The level was re-tiled into pages of a new size.
    PagesResized {
        /// Columns and rows of one page.
        page_size: Size,
        /// Number of pages along each axis.
        dimensions: Size,
    },
    /// Every element was re-skinned.
    ThemeChanged {
        /// Name of the new theme.
        name: String,
    },
    /// The recorded difficulty changed.
    DifficultyChanged {
        /// New difficulty.
        difficulty: Difficulty,
    },
    /// A player reached the exit with every key.
    LevelWon {
        /// Player that reached the exit.
        player: PlayerId,
    },
    /// Every player died.
    LevelLost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn kind_codes_are_stable() {
        for (expected, kind) in Kind::PLACEABLE.iter().enumerate() {
            assert_eq!(usize::from(kind.code()), expected);
            assert_eq!(Kind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(Kind::from_code(7), Some(Kind::Player));
        assert_eq!(Kind::from_code(8), None);
        assert_eq!(Kind::DynamicObstacle.to_string(), "Dynamic Obstacle");
    }

    #[test]
    fn opposite_directions_cancel() {
        for direction in Direction::MOTION {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(direction.delta().invert(), direction.opposite().delta());
        }
        assert_eq!(Direction::Stay.opposite(), Direction::Stay);
        assert!(Direction::Up.is_vertical());
        assert!(Direction::Left.is_horizontal());
    }

    #[test]
    fn theme_falls_back_to_classic_for_missing_kinds() {
        let custom = Representation::new('W', Color::Blue, Color::White);
        let theme = Theme::classic()
            .with_representation(Kind::Wall, custom)
            .renamed("blue");
        assert_eq!(theme.name(), "blue");
        assert_eq!(theme.representation_of(Kind::Wall), custom);
        assert_eq!(theme.representation_of(Kind::Key).glyph(), 'k');
    }

    #[test]
    fn difficulty_parses_saved_and_loose_names() {
        assert_eq!("VERY_EASY".parse(), Ok(Difficulty::VeryEasy));
        assert_eq!("very-easy".parse(), Ok(Difficulty::VeryEasy));
        assert_eq!("hard".parse(), Ok(Difficulty::Hard));
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default().delay(), 1);
    }

    #[test]
    fn mystery_catalogue_has_distinct_messages() {
        let mut messages: Vec<_> = MysteryEvent::ALL.iter().map(|e| e.message()).collect();
        messages.sort_unstable();
        messages.dedup();
        assert_eq!(messages.len(), MysteryEvent::ALL.len());
    }

    #[test]
    fn point_round_trips_through_bincode() {
        assert_round_trip(&Point::new(12, 40));
    }

    #[test]
    fn profile_round_trips_through_bincode() {
        let profile = Profile::new(
            PlayerId::new("ada"),
            Representation::new('A', Color::Black, Color::Yellow),
        );
        assert_round_trip(&profile);
    }
}
