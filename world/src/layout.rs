//! Flat key/value description of a level or a saved session.
//!
//! Non-player cells are stored as `"x,y" -> kind code`, players as
//! `"id:<id>" -> "x,y"` or `"id:<id>" -> "hidden"`. The top-level keys are
//! `Name`, `Width`, `Height`, `Theme` and `Difficulty`; only the size is
//! required. Entries may appear in any order.

use std::{collections::BTreeMap, fmt::Write as _};

use log::warn;
use maze_pages_core::{Difficulty, Kind, PlayerId, Point, Size};

use crate::error::LayoutError;

const NAME: &str = "Name";
const WIDTH: &str = "Width";
const HEIGHT: &str = "Height";
const THEME: &str = "Theme";
const DIFFICULTY: &str = "Difficulty";
const PLAYER_PREFIX: &str = "id:";
const HIDDEN: &str = "hidden";

/// Where a saved player stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// On a cell of the level.
    At(Point),
    /// Not yet entered.
    Hidden,
}

/// In-memory form of a layout or session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    name: String,
    size: Size,
    theme: String,
    difficulty: Difficulty,
    cells: BTreeMap<Point, Kind>,
    players: Vec<(PlayerId, Placement)>,
}

impl Layout {
    /// Creates an empty layout of the given size.
    pub fn new(name: impl Into<String>, size: Size) -> Result<Self, LayoutError> {
        if size.is_empty() {
            return Err(LayoutError::EmptyLevel(size));
        }
        Ok(Self {
            name: name.into(),
            size,
            theme: "classic".to_owned(),
            difficulty: Difficulty::default(),
            cells: BTreeMap::new(),
            players: Vec::new(),
        })
    }

    /// Builds a layout from raw key/value entries in any order.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut top_level = BTreeMap::new();
        let mut cells = Vec::new();
        let mut players = BTreeMap::new();
        for (key, value) in entries {
            let (key, value) = (key.as_ref().trim(), value.as_ref().trim());
            if let Some(id) = key.strip_prefix(PLAYER_PREFIX) {
                let placement = if value == HIDDEN {
                    Placement::Hidden
                } else {
                    Placement::At(value.parse()?)
                };
                let _ = players.insert(PlayerId::new(id), placement);
            } else if key.starts_with(|c: char| c.is_ascii_digit()) {
                cells.push((key.parse::<Point>()?, parse_number::<u8>(key, value)?));
            } else {
                let _ = top_level.insert(key.to_owned(), value.to_owned());
            }
        }

        let number = |key: &'static str| {
            let value = top_level.get(key).ok_or(LayoutError::MissingKey(key))?;
            parse_number::<u32>(key, value)
        };
        let mut layout = Self::new(
            top_level.get(NAME).cloned().unwrap_or_default(),
            Size::new(number(WIDTH)?, number(HEIGHT)?),
        )?;
        if let Some(theme) = top_level.get(THEME) {
            layout.theme.clone_from(theme);
        }
        if let Some(difficulty) = top_level.get(DIFFICULTY) {
            layout.difficulty = difficulty.parse()?;
        }
        for key in top_level.keys() {
            if ![NAME, WIDTH, HEIGHT, THEME, DIFFICULTY].contains(&key.as_str()) {
                warn!("ignoring unknown layout key '{key}'");
            }
        }
        for (point, code) in cells {
            let kind = Kind::from_code(code).ok_or(LayoutError::UnknownKind { point, code })?;
            layout.set_cell(point, kind)?;
        }
        layout.players = players.into_iter().collect();
        Ok(layout)
    }

    /// Reads the `key=value` text form. Blank lines and lines starting with
    /// `#` or `!` are skipped; `\:`, `\=` and `\\` escapes are honoured in keys.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut entries = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            let entry = split_entry(trimmed).ok_or_else(|| LayoutError::MalformedLine {
                line: number + 1,
                text: trimmed.to_owned(),
            })?;
            entries.push(entry);
        }
        Self::from_entries(entries)
    }

    /// Key/value entries in a stable order: top-level keys, cells, players.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            (NAME.to_owned(), self.name.clone()),
            (WIDTH.to_owned(), self.size.columns().to_string()),
            (HEIGHT.to_owned(), self.size.rows().to_string()),
            (DIFFICULTY.to_owned(), self.difficulty.to_string()),
            (THEME.to_owned(), self.theme.clone()),
        ];
        entries.extend(
            self.cells
                .iter()
                .map(|(point, kind)| (point.to_string(), kind.code().to_string())),
        );
        entries.extend(self.players.iter().map(|(id, placement)| {
            let value = match placement {
                Placement::At(point) => point.to_string(),
                Placement::Hidden => HIDDEN.to_owned(),
            };
            (format!("{PLAYER_PREFIX}{id}"), value)
        }));
        entries
    }

    /// Writes the `key=value` text form read by [`Layout::parse`].
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (key, value) in self.to_entries() {
            let _ = writeln!(text, "{}={}", escape_key(&key), value);
        }
        text
    }

    /// Name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Columns and rows of the level.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Name of the theme the level was saved with.
    #[must_use]
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Records the theme name.
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = theme.into();
    }

    /// Difficulty the level was saved with.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Records the difficulty.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Non-player cells ordered by point.
    pub fn cells(&self) -> impl Iterator<Item = (Point, Kind)> + '_ {
        self.cells.iter().map(|(point, kind)| (*point, *kind))
    }

    /// Places a non-player element, replacing whatever was on the cell.
    pub fn set_cell(&mut self, point: Point, kind: Kind) -> Result<(), LayoutError> {
        if kind == Kind::Player {
            return Err(LayoutError::PlayerCell { point });
        }
        if point.x() >= self.size.columns() || point.y() >= self.size.rows() {
            return Err(LayoutError::CellOutsideLevel {
                point,
                size: self.size,
            });
        }
        let _ = self.cells.insert(point, kind);
        Ok(())
    }

    /// Saved players ordered by identifier.
    #[must_use]
    pub fn players(&self) -> &[(PlayerId, Placement)] {
        &self.players
    }

    /// Records where a player stands, replacing an earlier record.
    pub fn set_player(&mut self, id: PlayerId, placement: Placement) {
        match self.players.binary_search_by(|(existing, _)| existing.cmp(&id)) {
            Ok(index) => self.players[index].1 = placement,
            Err(index) => self.players.insert(index, (id, placement)),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, LayoutError> {
    value.parse().map_err(|_| LayoutError::InvalidNumber {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

/// Splits on the first unescaped `=`, or on the first unescaped `:` when the
/// line has no `=`, so `id:ada=1,2` still names a player.
fn split_entry(line: &str) -> Option<(String, String)> {
    split_at(line, '=').or_else(|| split_at(line, ':'))
}

fn split_at(line: &str, separator: char) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.char_indices();
    while let Some((position, c)) = chars.next() {
        match c {
            '\\' => key.extend(chars.next().map(|(_, escaped)| escaped)),
            c if c == separator => {
                let value = line[position + 1..].trim().to_owned();
                return Some((key.trim().to_owned(), value));
            }
            _ => key.push(c),
        }
    }
    None
}

fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if matches!(c, ':' | '=' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# a small maze
Name=Corridor
Width=4
Height=3
Difficulty=HARD
0,0=1
3,2=2
1,1=3
id\\:ada=0,0
id\\:bob=hidden
";

    #[test]
    fn parses_cells_players_and_settings() {
        let layout = Layout::parse(SAMPLE).expect("layout");
        assert_eq!(layout.name(), "Corridor");
        assert_eq!(layout.size(), Size::new(4, 3));
        assert_eq!(layout.difficulty(), Difficulty::Hard);
        assert_eq!(layout.theme(), "classic");
        assert_eq!(
            layout.cells().collect::<Vec<_>>(),
            vec![
                (Point::new(0, 0), Kind::Entrance),
                (Point::new(1, 1), Kind::Key),
                (Point::new(3, 2), Kind::Exit),
            ]
        );
        assert_eq!(
            layout.players(),
            &[
                (PlayerId::new("ada"), Placement::At(Point::new(0, 0))),
                (PlayerId::new("bob"), Placement::Hidden),
            ]
        );
    }

    #[test]
    fn key_order_does_not_matter() {
        let shuffled = [
            ("2,0", "0"),
            ("Height", "1"),
            ("Width", "3"),
        ];
        let layout = Layout::from_entries(shuffled).expect("layout");
        assert_eq!(layout.cells().count(), 1);
        assert!(layout.players().is_empty());
        assert_eq!(layout.difficulty(), Difficulty::Medium);
    }

    #[test]
    fn text_form_reparses_to_the_same_layout() {
        let layout = Layout::parse(SAMPLE).expect("layout");
        let reparsed = Layout::parse(&layout.to_text()).expect("reparsed");
        assert_eq!(reparsed, layout);
        assert!(layout.to_text().contains("id\\:ada=0,0"));
    }

    #[test]
    fn rejects_bad_entries() {
        assert_eq!(
            Layout::from_entries([("Width", "3")]),
            Err(LayoutError::MissingKey("Height"))
        );
        assert!(matches!(
            Layout::from_entries([("Width", "3"), ("Height", "3"), ("1,1", "9")]),
            Err(LayoutError::UnknownKind { code: 9, .. })
        ));
        assert!(matches!(
            Layout::from_entries([("Width", "3"), ("Height", "3"), ("1,1", "7")]),
            Err(LayoutError::PlayerCell { .. })
        ));
        assert!(matches!(
            Layout::from_entries([("Width", "3"), ("Height", "3"), ("5,1", "0")]),
            Err(LayoutError::CellOutsideLevel { .. })
        ));
        assert!(matches!(
            Layout::from_entries([("Width", "0"), ("Height", "3")]),
            Err(LayoutError::EmptyLevel(_))
        ));
        assert!(matches!(
            Layout::parse("Width 3"),
            Err(LayoutError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn unescaped_player_keys_split_on_equals() {
        let layout = Layout::parse("Width=3\nHeight=3\nid:ada=1,2\nName: Hall\n").expect("layout");
        assert_eq!(
            layout.players(),
            &[(PlayerId::new("ada"), Placement::At(Point::new(1, 2)))]
        );
        assert_eq!(layout.name(), "Hall");
    }

    #[test]
    fn set_player_keeps_identifiers_sorted() {
        let mut layout = Layout::new("t", Size::new(2, 2)).expect("layout");
        layout.set_player(PlayerId::new("zed"), Placement::Hidden);
        layout.set_player(PlayerId::new("amy"), Placement::At(Point::new(1, 1)));
        layout.set_player(PlayerId::new("zed"), Placement::At(Point::new(0, 0)));
        let ids: Vec<_> = layout.players().iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["amy", "zed"]);
    }
}
