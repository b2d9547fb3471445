use std::fmt;

use maze_pages_core::{Direction, PlayerId, Point, Profile, Region, Representation};

use crate::error::PlayerError;

/// Player controlled through a profile.
///
/// A player remembers one previous point so the last move can be undone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    profile: Profile,
    point: Point,
    previous: Option<Point>,
    lives: u8,
    max_lives: u8,
}

impl Player {
    /// Creates a player with full health standing on `point`.
    #[must_use]
    pub fn new(profile: Profile, point: Point, max_lives: u8) -> Self {
        Self {
            profile,
            point,
            previous: None,
            lives: max_lives,
            max_lives,
        }
    }

    /// Identifier of the owning profile.
    #[must_use]
    pub fn id(&self) -> &PlayerId {
        self.profile.id()
    }

    /// Owning profile.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// How the player is drawn.
    #[must_use]
    pub const fn representation(&self) -> Representation {
        self.profile.representation()
    }

    /// Cell the player stands on.
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Point the last move started from, while it can still be undone.
    #[must_use]
    pub const fn previous(&self) -> Option<Point> {
        self.previous
    }

    /// Whether the last move can be undone.
    #[must_use]
    pub const fn can_go_back(&self) -> bool {
        self.previous.is_some()
    }

    /// Remaining lives.
    #[must_use]
    pub const fn lives(&self) -> u8 {
        self.lives
    }

    /// Lives the player started with.
    #[must_use]
    pub const fn max_lives(&self) -> u8 {
        self.max_lives
    }

    /// Whether any life is left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.lives > 0
    }

    /// Whether no life has been lost.
    #[must_use]
    pub const fn has_full_health(&self) -> bool {
        self.lives >= self.max_lives
    }

    /// Moves one cell, remembering the start for a later undo.
    ///
    /// Moves that would leave `bounds` and `Stay` are not applied and return
    /// `Ok(false)`; the remembered point is then left untouched.
    pub fn step(&mut self, direction: Direction, bounds: &Region) -> Result<bool, PlayerError> {
        self.ensure_alive()?;
        if direction == Direction::Stay {
            return Ok(false);
        }
        match self.point.step(direction) {
            Some(next) if bounds.contains(next) => {
                self.previous = Some(self.point);
                self.point = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Undoes the last move. Returns `false` when there is nothing to undo.
    pub fn go_back(&mut self) -> Result<bool, PlayerError> {
        self.ensure_alive()?;
        Ok(match self.previous.take() {
            Some(previous) => {
                self.point = previous;
                true
            }
            None => false,
        })
    }

    /// Takes one life and returns the lives left.
    pub fn injure(&mut self) -> Result<u8, PlayerError> {
        self.ensure_alive()?;
        self.lives -= 1;
        Ok(self.lives)
    }

    /// Restores one life. Returns `false` when already at full health.
    pub fn heal(&mut self) -> Result<bool, PlayerError> {
        self.ensure_alive()?;
        if self.has_full_health() {
            return Ok(false);
        }
        self.lives += 1;
        Ok(true)
    }

    fn ensure_alive(&self) -> Result<(), PlayerError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(PlayerError::Dead {
                id: self.id().clone(),
            })
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_alive() {
            write!(
                f,
                "{}: {}/{} Lives Position: {}",
                self.id(),
                self.lives,
                self.max_lives,
                self.point
            )
        } else {
            write!(f, "{}: DEAD", self.id())
        }
    }
}
