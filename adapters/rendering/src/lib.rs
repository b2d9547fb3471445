#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for paged maze adapters.
//!
//! A [`Scene`] is captured from a level through the world's query functions
//! only, so backends never hold a reference into the simulation.

use std::io::Write;

use anyhow::Result as AnyResult;
use maze_pages_core::{Color, Event, Index, Kind, Point, Region, Representation};
use maze_pages_world::{query, Level};

/// Entry of the legend shown below the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    /// How the entry is drawn.
    pub representation: Representation,
    /// Kind label or player identifier.
    pub label: String,
}

/// Snapshot of everything a backend draws for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scene {
    /// Heading naming the level and the page shown.
    pub title: String,
    /// Index of the page shown.
    pub page_index: Index,
    /// Cells of the page that lie inside the level.
    pub region: Region,
    /// Row-major cells of `region`; players are drawn over elements.
    pub rows: Vec<Vec<Option<Representation>>>,
    /// Status bar lines.
    pub status: Vec<String>,
    /// Legend for the kinds and players on the page.
    pub legend: Vec<LegendEntry>,
    /// Messages describing what happened during the last tick.
    pub messages: Vec<String>,
}

impl Scene {
    /// Captures the current page of the level.
    #[must_use]
    pub fn capture(level: &Level) -> Self {
        let page = query::current_page(level);
        let region = page.area();

        let mut rows: Vec<Vec<Option<Representation>>> = (region.north_east().y()
            ..=region.south_west().y())
            .map(|y| {
                (region.south_west().x()..=region.north_east().x())
                    .map(|x| page.at(Point::new(x, y)).map(|element| element.representation()))
                    .collect()
            })
            .collect();

        let mut legend: Vec<LegendEntry> = Kind::PLACEABLE
            .iter()
            .filter(|kind| page.elements_of_kind(**kind).next().is_some())
            .map(|kind| LegendEntry {
                representation: query::theme(level).representation_of(*kind),
                label: kind.label().to_owned(),
            })
            .collect();

        for player in query::visible_players(level) {
            let point = player.point();
            if let Some(cell) = cell_mut(&mut rows, &region, point) {
                *cell = Some(player.representation());
            }
            legend.push(LegendEntry {
                representation: player.representation(),
                label: player.id().to_string(),
            });
        }

        Self {
            title: format!(
                "{} page {}",
                query::name(level),
                query::current_page_index(level)
            ),
            page_index: query::current_page_index(level),
            region,
            rows,
            status: query::status_lines(level),
            legend,
            messages: Vec::new(),
        }
    }

    /// Attaches the messages for the events of the last tick.
    #[must_use]
    pub fn with_messages(mut self, events: &[Event]) -> Self {
        self.messages = messages(events);
        self
    }

    /// Representation drawn at `point`, if the point is shown and occupied.
    #[must_use]
    pub fn representation_at(&self, point: Point) -> Option<Representation> {
        if !self.region.contains(point) {
            return None;
        }
        let row = usize::try_from(point.y() - self.region.north_east().y()).ok()?;
        let column = usize::try_from(point.x() - self.region.south_west().x()).ok()?;
        *self.rows.get(row)?.get(column)?
    }

    /// Glyph rows with blanks for empty cells.
    #[must_use]
    pub fn glyph_rows(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map_or(' ', |representation| representation.glyph()))
                    .collect()
            })
            .collect()
    }
}

fn cell_mut<'a>(
    rows: &'a mut [Vec<Option<Representation>>],
    region: &Region,
    point: Point,
) -> Option<&'a mut Option<Representation>> {
    if !region.contains(point) {
        return None;
    }
    let row = usize::try_from(point.y() - region.north_east().y()).ok()?;
    let column = usize::try_from(point.x() - region.south_west().x()).ok()?;
    rows.get_mut(row)?.get_mut(column)
}

/// Player-facing messages for a batch of events.
#[must_use]
pub fn messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PlayerEntered { player, .. } => Some(format!("{player} enters the maze.")),
            Event::KeyCollected {
                player,
                collected,
                total,
            } => Some(format!("{player} found a key ({collected}/{total}).")),
            Event::MysteryBoxOpened { event, .. } => Some(event.message().to_owned()),
            Event::MysteryEffectFailed { reason, .. } => Some(reason.message().to_owned()),
            Event::PlayerDied { player } => Some(format!("{player} died!")),
            Event::LevelWon { player } => Some(format!("{player} escaped the maze!")),
            Event::LevelLost => Some("Everybody died. Game over.".to_owned()),
            _ => None,
        })
        .collect()
}

/// Rendering backend capable of presenting scenes.
pub trait RenderingBackend {
    /// Draws one frame.
    fn present(&mut self, scene: &Scene) -> AnyResult<()>;
}

/// Backend that writes frames as plain text, optionally with ANSI colors.
#[derive(Debug)]
pub struct TextBackend<W> {
    writer: W,
    colored: bool,
    frames: usize,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing uncolored frames.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            colored: false,
            frames: 0,
        }
    }

    /// Enables or disables ANSI color escapes.
    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Number of frames presented so far.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn cell(&self, cell: Option<Representation>) -> String {
        match cell {
            Some(representation) if self.colored => format!(
                "\x1b[{};{}m{}\x1b[0m",
                ansi_code(representation.foreground(), 30),
                ansi_code(representation.background(), 40),
                representation.glyph()
            ),
            Some(representation) => representation.glyph().to_string(),
            None => " ".to_owned(),
        }
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        writeln!(self.writer, "{}", scene.title)?;
        for row in &scene.rows {
            let line: String = row.iter().map(|cell| self.cell(*cell)).collect();
            writeln!(self.writer, "|{line}|")?;
        }
        for line in &scene.status {
            writeln!(self.writer, "{line}")?;
        }
        if !scene.legend.is_empty() {
            let legend: Vec<String> = scene
                .legend
                .iter()
                .map(|entry| format!("{} {}", self.cell(Some(entry.representation)), entry.label))
                .collect();
            writeln!(self.writer, "{}", legend.join("  "))?;
        }
        for message in &scene.messages {
            writeln!(self.writer, "> {message}")?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        self.frames += 1;
        Ok(())
    }
}

fn ansi_code(color: Color, base: u8) -> u8 {
    match color {
        Color::Default => base + 9,
        Color::Black => base,
        Color::Red => base + 1,
        Color::Green => base + 2,
        Color::Yellow => base + 3,
        Color::Blue => base + 4,
        Color::Magenta => base + 5,
        Color::Cyan => base + 6,
        Color::White => base + 7,
    }
}
