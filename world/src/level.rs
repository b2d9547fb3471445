use std::collections::{BTreeSet, VecDeque};

use log::{debug, info, warn};
use maze_pages_core::{
    Difficulty, Event, Intents, Kind, MysteryEvent, MysteryFailure, PlayerId, Point, Profile,
    Size, Theme,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    element::Element,
    error::{LayoutError, LevelError},
    grid::PageGrid,
    layout::{Layout, Placement},
    player::Player,
    Config,
};

/// Lifecycle of a level. `Won` and `Lost` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LevelState {
    /// Players are still moving.
    #[default]
    Active,
    /// A player reached the exit holding every key.
    Won,
    /// Every player died.
    Lost,
}

/// How resolving a player's cell ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Stayed,
    Undone,
    Died,
    Won,
}

/// Authoritative state of one game session.
///
/// The level exclusively owns the paged grid and the player rosters. It is
/// mutated only through [`crate::apply`] and read through [`crate::query`].
#[derive(Clone, Debug)]
pub struct Level {
    pub(crate) name: String,
    pub(crate) theme: Theme,
    pub(crate) grid: PageGrid,
    pub(crate) players: Vec<Player>,
    pub(crate) dead: Vec<Player>,
    pub(crate) waiting: VecDeque<Profile>,
    pub(crate) total_keys: u32,
    pub(crate) keys_collected: u32,
    pub(crate) state: LevelState,
    pub(crate) difficulty: Difficulty,
    max_lives: u8,
    rng: ChaCha8Rng,
}

impl Level {
    /// Builds a level from a layout and the profiles taking part.
    ///
    /// Saved players are restored where they stood; every other profile is
    /// placed on a free entrance in page order, and profiles left over wait
    /// to enter.
    pub fn from_layout(
        layout: &Layout,
        theme: Theme,
        profiles: Vec<Profile>,
        config: &Config,
    ) -> Result<Self, LevelError> {
        if profiles.is_empty() {
            return Err(LevelError::NoProfiles);
        }
        let mut seen = BTreeSet::new();
        for profile in &profiles {
            if !seen.insert(profile.id().clone()) {
                return Err(LevelError::DuplicateProfile(profile.id().clone()));
            }
        }
        if layout.theme() != theme.name() {
            debug!(
                "layout asks for theme '{}', using '{}'",
                layout.theme(),
                theme.name()
            );
        }

        let elements = layout
            .cells()
            .map(|(point, kind)| Element::create(kind, point, &theme));
        let grid = PageGrid::with_elements(layout.size(), config.page_size(), elements)?;
        let total_keys = count(grid.elements_of_kind(Kind::Key).count());

        let mut unplaced = profiles;
        let mut players = Vec::new();
        let mut hidden = Vec::new();
        for (id, placement) in layout.players() {
            let Some(position) = unplaced.iter().position(|profile| profile.id() == id) else {
                warn!("saved player {id} has no matching profile");
                continue;
            };
            let profile = unplaced.remove(position);
            match *placement {
                Placement::At(point) => {
                    check_saved_point(&grid, &players, id, point)?;
                    players.push(Player::new(profile, point, config.max_lives()));
                }
                Placement::Hidden => hidden.push(profile),
            }
        }

        let mut level = Self {
            name: layout.name().to_owned(),
            theme,
            grid,
            players,
            dead: Vec::new(),
            waiting: unplaced.into_iter().chain(hidden).collect(),
            total_keys,
            keys_collected: 0,
            state: LevelState::Active,
            difficulty: layout.difficulty(),
            max_lives: config.max_lives(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed()),
        };
        let _ = level.fill_entrances();
        if let Some(first) = level.players.first() {
            let point = first.point();
            let _ = level.grid.fetch_page_of(point)?;
        }
        info!(
            "built level '{}' ({}): {} players placed, {} waiting, {} keys",
            level.name,
            level.grid.level_size(),
            level.players.len(),
            level.waiting.len(),
            level.total_keys
        );
        Ok(level)
    }

    /// Resolves one tick.
    ///
    /// Intents are applied in roster order, then every player's cell is
    /// resolved, collisions between players are undone, the current page
    /// follows the players and, when `move_obstacles` is set, every dynamic
    /// obstacle takes one step.
    pub fn update(
        &mut self,
        intents: &Intents,
        move_obstacles: bool,
        out: &mut Vec<Event>,
    ) -> Result<(), LevelError> {
        if self.state != LevelState::Active {
            return Err(LevelError::Finished);
        }
        self.report_stray_intents(intents);

        let bounds = self.grid.level_region();
        let mut origins: Vec<Option<Point>> = vec![None; self.players.len()];
        for (player, origin) in self.players.iter_mut().zip(&mut origins) {
            let Some(&direction) = intents.get(player.id()) else {
                continue;
            };
            let from = player.point();
            if player.step(direction, &bounds)? {
                *origin = Some(from);
                out.push(Event::PlayerMoved {
                    player: player.id().clone(),
                    from,
                    to: player.point(),
                });
            }
        }

        let mut index = 0;
        while index < self.players.len() {
            match self.resolve(index, out)? {
                Outcome::Stayed => index += 1,
                Outcome::Undone => {
                    origins[index] = None;
                    index += 1;
                }
                Outcome::Died => {
                    let player = self.players.remove(index);
                    let _ = origins.remove(index);
                    info!("player {} died at {}", player.id(), player.point());
                    out.push(Event::PlayerDied {
                        player: player.id().clone(),
                    });
                    self.dead.push(player);
                }
                Outcome::Won => break,
            }
        }

        if self.state == LevelState::Active {
            self.separate(&mut origins, out)?;
            self.admit_waiting(&origins, out);
        }
        self.follow_players(out);
        if self.state != LevelState::Active {
            return Ok(());
        }

        if move_obstacles {
            let players: Vec<Point> = self.players.iter().map(Player::point).collect();
            let moves = self
                .grid
                .update_obstacles(|point| players.contains(&point), &mut self.rng);
            out.extend(
                moves
                    .into_iter()
                    .map(|(from, to)| Event::ObstacleMoved { from, to }),
            );
        }

        if self.players.is_empty() && self.waiting.is_empty() {
            self.state = LevelState::Lost;
            info!("level '{}' lost", self.name);
            out.push(Event::LevelLost);
        }
        Ok(())
    }

    /// Re-tiles the level into pages of `page_size` and shows the page of
    /// the first player.
    pub fn resize_pages(
        &mut self,
        page_size: Size,
        out: &mut Vec<Event>,
    ) -> Result<(), LevelError> {
        let evicted = self.grid.resize(self.grid.level_size(), page_size)?;
        if !evicted.is_empty() {
            warn!("{} elements fell outside the level while re-paging", evicted.len());
        }
        if let Some(first) = self.players.first() {
            let point = first.point();
            let _ = self.grid.fetch_page_of(point)?;
        }
        out.push(Event::PagesResized {
            page_size,
            dimensions: self.grid.dimensions(),
        });
        Ok(())
    }

    /// Re-skins every element from `theme`.
    pub fn set_theme(&mut self, theme: Theme, out: &mut Vec<Event>) {
        self.grid.reskin(&theme);
        info!("theme changed to '{}'", theme.name());
        out.push(Event::ThemeChanged {
            name: theme.name().to_owned(),
        });
        self.theme = theme;
    }

    /// Records a new difficulty.
    pub fn set_difficulty(&mut self, difficulty: Difficulty, out: &mut Vec<Event>) {
        if self.difficulty != difficulty {
            self.difficulty = difficulty;
            out.push(Event::DifficultyChanged { difficulty });
        }
    }

    /// Captures the session as a layout. Dead players are not kept.
    pub fn to_layout(&self) -> Result<Layout, LayoutError> {
        let mut layout = Layout::new(self.name.clone(), self.grid.level_size())?;
        layout.set_theme(self.theme.name());
        layout.set_difficulty(self.difficulty);
        for element in self.grid.elements() {
            layout.set_cell(element.point(), element.kind())?;
        }
        for player in &self.players {
            layout.set_player(player.id().clone(), Placement::At(player.point()));
        }
        for profile in &self.waiting {
            layout.set_player(profile.id().clone(), Placement::Hidden);
        }
        Ok(layout)
    }

    fn resolve(&mut self, index: usize, out: &mut Vec<Event>) -> Result<Outcome, LevelError> {
        let point = self.players[index].point();
        let Some(kind) = self.grid.at(point).map(Element::kind) else {
            return Ok(Outcome::Stayed);
        };
        match kind {
            Kind::Wall => self.send_back(index, out),
            Kind::Entrance if self.players[index].can_go_back() => self.send_back(index, out),
            Kind::Entrance | Kind::Player => Ok(Outcome::Stayed),
            Kind::Exit if self.keys_collected == self.total_keys => {
                let player = self.players[index].id().clone();
                info!("player {player} won level '{}'", self.name);
                self.state = LevelState::Won;
                out.push(Event::LevelWon { player });
                Ok(Outcome::Won)
            }
            Kind::Exit => {
                debug!(
                    "exit locked: {}/{} keys collected",
                    self.keys_collected, self.total_keys
                );
                self.send_back(index, out)
            }
            Kind::Key => {
                let _ = self.grid.remove(point)?;
                self.keys_collected += 1;
                out.push(Event::ElementDespawned { kind, point });
                out.push(Event::KeyCollected {
                    player: self.players[index].id().clone(),
                    collected: self.keys_collected,
                    total: self.total_keys,
                });
                Ok(Outcome::Stayed)
            }
            Kind::StaticObstacle | Kind::DynamicObstacle => {
                if self.injure(index, out)? {
                    self.send_back(index, out)
                } else {
                    Ok(Outcome::Died)
                }
            }
            Kind::MysteryBox => self.open_mystery_box(index, out),
        }
    }

    fn send_back(&mut self, index: usize, out: &mut Vec<Event>) -> Result<Outcome, LevelError> {
        let player = &mut self.players[index];
        if player.go_back()? {
            debug!("player {} sent back to {}", player.id(), player.point());
            out.push(Event::MoveUndone {
                player: player.id().clone(),
                to: player.point(),
            });
        }
        Ok(Outcome::Undone)
    }

    /// Returns whether the player survived.
    fn injure(&mut self, index: usize, out: &mut Vec<Event>) -> Result<bool, LevelError> {
        let player = &mut self.players[index];
        let lives = player.injure()?;
        out.push(Event::PlayerInjured {
            player: player.id().clone(),
            lives,
        });
        Ok(lives > 0)
    }

    fn open_mystery_box(
        &mut self,
        index: usize,
        out: &mut Vec<Event>,
    ) -> Result<Outcome, LevelError> {
        let point = self.players[index].point();
        let mystery_box = self.grid.remove(point)?;
        out.push(Event::ElementDespawned {
            kind: mystery_box.kind(),
            point,
        });

        let event = MysteryEvent::ALL[self.rng.gen_range(0..MysteryEvent::ALL.len())];
        let player = self.players[index].id().clone();
        info!("player {player} opened a mystery box: {}", event.message());
        out.push(Event::MysteryBoxOpened {
            player: player.clone(),
            event,
        });

        let failure = match event {
            MysteryEvent::Empty => None,
            MysteryEvent::Heal => {
                let healed = &mut self.players[index];
                if healed.heal()? {
                    out.push(Event::PlayerHealed {
                        player: player.clone(),
                        lives: healed.lives(),
                    });
                    None
                } else {
                    Some(MysteryFailure::AlreadyFullHealth)
                }
            }
            MysteryEvent::Injure => {
                if !self.injure(index, out)? {
                    return Ok(Outcome::Died);
                }
                None
            }
            MysteryEvent::NewKey => {
                let spawned = self.spawn(Kind::Key, out)?;
                if spawned {
                    self.total_keys += 1;
                }
                (!spawned).then_some(MysteryFailure::NoSpace)
            }
            MysteryEvent::NewStaticObstacle => self.spawn_or_fail(Kind::StaticObstacle, out)?,
            MysteryEvent::NewDynamicObstacle => self.spawn_or_fail(Kind::DynamicObstacle, out)?,
            MysteryEvent::NewMysteryBox => self.spawn_or_fail(Kind::MysteryBox, out)?,
            MysteryEvent::NewWall => self.spawn_or_fail(Kind::Wall, out)?,
            MysteryEvent::RemoveDynamicObstacle => self.despawn(Kind::DynamicObstacle, out),
            MysteryEvent::RemoveStaticObstacle => self.despawn(Kind::StaticObstacle, out),
            MysteryEvent::LoseKey if self.keys_collected == 0 => {
                Some(MysteryFailure::NoKeysCollected)
            }
            MysteryEvent::LoseKey => {
                let spawned = self.spawn(Kind::Key, out)?;
                if spawned {
                    self.keys_collected -= 1;
                }
                (!spawned).then_some(MysteryFailure::NoSpace)
            }
        };
        if let Some(reason) = failure {
            debug!("mystery box effect failed: {}", reason.message());
            out.push(Event::MysteryEffectFailed { player, reason });
        }
        Ok(Outcome::Stayed)
    }

    /// Spawns `kind` on the first free cell that no player stands on or may
    /// still be sent back to.
    fn spawn(&mut self, kind: Kind, out: &mut Vec<Event>) -> Result<bool, LevelError> {
        let players: Vec<Point> = self
            .players
            .iter()
            .flat_map(|player| std::iter::once(player.point()).chain(player.previous()))
            .collect();
        let spawned = self
            .grid
            .generate_excluding(kind, &self.theme, |point| players.contains(&point))?
            .map(Element::point);
        Ok(match spawned {
            Some(point) => {
                out.push(Event::ElementSpawned { kind, point });
                true
            }
            None => false,
        })
    }

    fn spawn_or_fail(
        &mut self,
        kind: Kind,
        out: &mut Vec<Event>,
    ) -> Result<Option<MysteryFailure>, LevelError> {
        Ok((!self.spawn(kind, out)?).then_some(MysteryFailure::NoSpace))
    }

    fn despawn(&mut self, kind: Kind, out: &mut Vec<Event>) -> Option<MysteryFailure> {
        match self.grid.remove_one_of_kind(kind) {
            Some(removed) => {
                out.push(Event::ElementDespawned {
                    kind,
                    point: removed.point(),
                });
                None
            }
            None => Some(MysteryFailure::NothingToRemove),
        }
    }

    /// Undoes moves until no two players share a cell.
    ///
    /// Players that swapped cells are both sent back. When two players share
    /// a cell, the later one in roster order is sent back if it moved,
    /// otherwise the earlier one. Every undo clears the player's origin, so
    /// the loop ends once no moved player remains in conflict.
    fn separate(
        &mut self,
        origins: &mut [Option<Point>],
        out: &mut Vec<Event>,
    ) -> Result<(), LevelError> {
        while let Some((first, second)) = self.find_collision(origins) {
            for index in std::iter::once(first).chain(second) {
                let _ = self.send_back(index, out)?;
                origins[index] = None;
            }
        }
        Ok(())
    }

    fn find_collision(&self, origins: &[Option<Point>]) -> Option<(usize, Option<usize>)> {
        for (first, a) in self.players.iter().enumerate() {
            for (second, b) in self.players.iter().enumerate().skip(first + 1) {
                if origins[first] == Some(b.point()) && origins[second] == Some(a.point()) {
                    return Some((first, Some(second)));
                }
                if a.point() != b.point() {
                    continue;
                }
                if origins[second].is_some() {
                    return Some((second, None));
                }
                if origins[first].is_some() {
                    return Some((first, None));
                }
            }
        }
        None
    }

    /// Lets waiting profiles in through entrances that players just left.
    ///
    /// When nobody is left on the level, waiting profiles take every free
    /// entrance instead.
    fn admit_waiting(&mut self, origins: &[Option<Point>], out: &mut Vec<Event>) {
        for from in origins.iter().flatten().copied() {
            if self.waiting.is_empty() {
                break;
            }
            let is_entrance = self
                .grid
                .at(from)
                .is_some_and(|element| element.kind() == Kind::Entrance);
            if !is_entrance || self.is_player_at(from) {
                continue;
            }
            if let Some(profile) = self.waiting.pop_front() {
                out.push(self.enter(profile, from));
            }
        }
        if self.players.is_empty() {
            out.extend(self.fill_entrances());
        }
    }

    /// Places waiting profiles on free entrances in page order.
    fn fill_entrances(&mut self) -> Vec<Event> {
        let free: Vec<Point> = self
            .grid
            .elements_of_kind(Kind::Entrance)
            .map(Element::point)
            .filter(|point| !self.is_player_at(*point))
            .collect();
        let mut entered = Vec::new();
        for point in free {
            let Some(profile) = self.waiting.pop_front() else {
                break;
            };
            entered.push(self.enter(profile, point));
        }
        entered
    }

    fn enter(&mut self, profile: Profile, at: Point) -> Event {
        let player = profile.id().clone();
        info!("player {player} entered at {at}");
        self.players.push(Player::new(profile, at, self.max_lives));
        Event::PlayerEntered { player, at }
    }

    fn follow_players(&mut self, out: &mut Vec<Event>) {
        let before = self.grid.current_index();
        for player in &self.players {
            let _ = self.grid.follow(player.point());
        }
        let index = self.grid.current_index();
        if index != before {
            debug!("current page is now {index}");
            out.push(Event::PageChanged { index });
        }
    }

    fn is_player_at(&self, point: Point) -> bool {
        self.players.iter().any(|player| player.point() == point)
    }

    fn report_stray_intents(&self, intents: &Intents) {
        for id in intents.keys() {
            if self.players.iter().any(|player| player.id() == id) {
                continue;
            }
            if self.is_inactive(id) {
                debug!("ignoring intent of inactive player {id}");
            } else {
                warn!("ignoring intent of unknown player {id}");
            }
        }
    }

    fn is_inactive(&self, id: &PlayerId) -> bool {
        self.dead.iter().any(|player| player.id() == id)
            || self.waiting.iter().any(|profile| profile.id() == id)
    }
}

/// Saved players must stand inside the level, on an empty cell or an
/// entrance, and apart from every player restored before them.
fn check_saved_point(
    grid: &PageGrid,
    restored: &[Player],
    id: &PlayerId,
    point: Point,
) -> Result<(), LevelError> {
    if !grid.level_region().contains(point) {
        return Err(LevelError::PlayerOutsideLevel {
            player: id.clone(),
            point,
        });
    }
    if let Some(kind) = grid.at(point).map(Element::kind) {
        if kind != Kind::Entrance {
            return Err(LevelError::PlayerOnElement {
                player: id.clone(),
                point,
                kind,
            });
        }
    }
    if let Some(other) = restored.iter().find(|player| player.point() == point) {
        return Err(LevelError::PlayersOverlap {
            first: other.id().clone(),
            second: id.clone(),
            point,
        });
    }
    Ok(())
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
