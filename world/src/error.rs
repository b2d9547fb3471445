use maze_pages_core::{
    GeometryError, Index, Kind, ParseDifficultyError, PlayerId, Point, Region, Size,
};
use thiserror::Error;

/// Errors raised by a single page.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PageError {
    /// Another element already sits on the point.
    #[error("cell {point} is already occupied")]
    OccupiedCell {
        /// Contested point.
        point: Point,
    },
    /// The point lies outside the page.
    #[error("point {point} lies outside page {region}")]
    OutOfBounds {
        /// Offending point.
        point: Point,
        /// Region covered by the page.
        region: Region,
    },
    /// Nothing matching sits on the point.
    #[error("no matching element at {point}")]
    NotFound {
        /// Queried point.
        point: Point,
    },
    /// Players are tracked by the level, never stored in pages.
    #[error("players cannot be stored in a page")]
    PlayerKind,
}

/// Errors raised by the page grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The owning page rejected the operation.
    #[error(transparent)]
    Page(#[from] PageError),
    /// The point lies outside the level.
    #[error("point {point} lies outside the level")]
    OutsideLevel {
        /// Offending point.
        point: Point,
    },
    /// Level or page size has no area.
    #[error("level {level} cannot be paged into {page} pages")]
    InvalidSize {
        /// Requested level size.
        level: Size,
        /// Requested page size.
        page: Size,
    },
    /// No page exists at the index.
    #[error("no page at index {index}")]
    NoSuchPage {
        /// Requested index.
        index: Index,
    },
    /// Page regions could not be built.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Players cannot be generated as level elements.
    #[error("players cannot be generated as elements")]
    PlayerKind,
}

/// Errors raised by a player.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The player has no lives left.
    #[error("player {id} is dead")]
    Dead {
        /// Identifier of the player.
        id: PlayerId,
    },
}

/// Errors raised while reading a layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A required key is missing.
    #[error("missing key '{0}'")]
    MissingKey(&'static str),
    /// A numeric value could not be read.
    #[error("'{value}' is not a valid number for '{key}'")]
    InvalidNumber {
        /// Key of the entry.
        key: String,
        /// Offending value.
        value: String,
    },
    /// A cell key or player position is not a point.
    #[error(transparent)]
    InvalidPoint(#[from] GeometryError),
    /// The kind code is unknown.
    #[error("unknown kind code {code} at {point}")]
    UnknownKind {
        /// Cell carrying the code.
        point: Point,
        /// Offending code.
        code: u8,
    },
    /// Players must be stored under `id:` keys, not as cells.
    #[error("cell {point} stores a player; use an id: key instead")]
    PlayerCell {
        /// Offending cell.
        point: Point,
    },
    /// A cell lies outside the declared level size.
    #[error("cell {point} lies outside the {size} level")]
    CellOutsideLevel {
        /// Offending cell.
        point: Point,
        /// Declared level size.
        size: Size,
    },
    /// The declared level has no area.
    #[error("level size {0} has no area")]
    EmptyLevel(Size),
    /// The difficulty is not recognised.
    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),
    /// A line holds no key/value separator.
    #[error("line {line} is not a key=value pair: '{text}'")]
    MalformedLine {
        /// One-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },
}

/// Errors raised by the level simulation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The page grid rejected an operation.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// A player rejected an operation.
    #[error(transparent)]
    Player(#[from] PlayerError),
    /// A level needs at least one profile.
    #[error("a level needs at least one player profile")]
    NoProfiles,
    /// Two profiles share an identifier.
    #[error("profile '{0}' was supplied twice")]
    DuplicateProfile(PlayerId),
    /// A saved player position lies outside the level.
    #[error("player {player} is placed outside the level at {point}")]
    PlayerOutsideLevel {
        /// Offending player.
        player: PlayerId,
        /// Saved position.
        point: Point,
    },
    /// A saved player stands on an element players cannot occupy.
    #[error("player {player} is placed on a {} at {point}", .kind.label())]
    PlayerOnElement {
        /// Offending player.
        player: PlayerId,
        /// Saved position.
        point: Point,
        /// Element occupying the position.
        kind: Kind,
    },
    /// Two saved players share a cell.
    #[error("players {first} and {second} are both placed at {point}")]
    PlayersOverlap {
        /// Player restored first.
        first: PlayerId,
        /// Player restored second.
        second: PlayerId,
        /// Shared position.
        point: Point,
    },
    /// The level has already been won or lost.
    #[error("the level is already over")]
    Finished,
}
