//! Integer geometry shared by every layer of the maze.
//!
//! The coordinate system follows the terminal: `x` grows towards the east
//! and `y` grows towards the south. A [`Region`] is therefore described by
//! its south-west corner (smallest `x`, largest `y`) and its north-east corner
//! (largest `x`, smallest `y`).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Direction;

/// Errors raised when geometry values would violate their invariants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// The south-west corner lies east of, or north of, the north-east corner.
    #[error("region corners are inverted: south-west {south_west}, north-east {north_east}")]
    InvertedRegion {
        /// Offending south-west corner.
        south_west: Point,
        /// Offending north-east corner.
        north_east: Point,
    },
    /// A size with zero columns or zero rows was supplied where an area is required.
    #[error("size {columns}x{rows} has no area")]
    EmptySize {
        /// Number of columns supplied.
        columns: u32,
        /// Number of rows supplied.
        rows: u32,
    },
    /// The computed corner does not fit into the coordinate range.
    #[error("region starting at {origin} with size {columns}x{rows} overflows")]
    Overflow {
        /// Requested north-west corner.
        origin: Point,
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// Text could not be read as an `x,y` point.
    #[error("'{0}' is not a point")]
    InvalidPoint(String),
}

/// Non-negative cell coordinate.
///
/// Points are immutable; moving produces a new point and the caller is
/// responsible for re-keying whatever container holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    x: u32,
    y: u32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Column of the point.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row of the point.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Applies the delta, returning `None` when a coordinate would go negative
    /// or overflow.
    #[must_use]
    pub fn offset(self, delta: Delta) -> Option<Self> {
        let x = self.x.checked_add_signed(delta.x())?;
        let y = self.y.checked_add_signed(delta.y())?;
        Some(Self { x, y })
    }

    /// Moves one cell in the provided direction.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        self.offset(direction.delta())
    }

    /// Offset that leads from this point to `other`, saturating at the `i32` range.
    #[must_use]
    pub fn delta_to(self, other: Point) -> Delta {
        Delta::new(
            saturating_difference(self.x, other.x),
            saturating_difference(self.y, other.y),
        )
    }
}

fn saturating_difference(from: u32, to: u32) -> i32 {
    let difference = i64::from(to) - i64::from(from);
    i32::try_from(difference).unwrap_or(if difference < 0 { i32::MIN } else { i32::MAX })
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = GeometryError;

    /// Reads the first two unsigned integers in the text, ignoring whatever
    /// separates them, so `"3,4"`, `"(3, 4)"` and `"3 4"` are all accepted.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryError::InvalidPoint(text.to_owned());
        let mut numbers = text
            .split(|c: char| !c.is_ascii_digit())
            .filter(|part| !part.is_empty());
        let x = numbers
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let y = numbers
            .next()
            .and_then(|part| part.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        if numbers.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(x, y))
    }
}

/// Signed offset between two points, one movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Delta {
    x: i32,
    y: i32,
}

impl Delta {
    /// One row towards the top of the screen.
    pub const UP: Self = Self::new(0, -1);
    /// One row towards the bottom of the screen.
    pub const DOWN: Self = Self::new(0, 1);
    /// One column to the left.
    pub const LEFT: Self = Self::new(-1, 0);
    /// One column to the right.
    pub const RIGHT: Self = Self::new(1, 0);
    /// No movement.
    pub const STAY: Self = Self::new(0, 0);

    /// Creates a new delta.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Delta pointing the opposite way.
    #[must_use]
    pub const fn invert(self) -> Self {
        Self::new(self.x.wrapping_neg(), self.y.wrapping_neg())
    }

    /// Whether the delta leaves a point where it is.
    #[must_use]
    pub const fn is_stay(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Taxicab length `|x| + |y|`.
    #[must_use]
    pub const fn manhattan(&self) -> u32 {
        self.x.unsigned_abs().saturating_add(self.y.unsigned_abs())
    }

    /// Straight-line length.
    #[must_use]
    pub fn euclidean(&self) -> f64 {
        f64::from(self.x).hypot(f64::from(self.y))
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+},{:+})", self.x, self.y)
    }
}

/// Column and row count of a rectangular area such as a level or a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    columns: u32,
    rows: u32,
}

impl Size {
    /// Creates a new size.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Whether either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

/// Position of a page within a page grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Index {
    column: u32,
    row: u32,
}

impl Index {
    /// Creates a new page index.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based page column.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based page row.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Neighbouring index in the provided direction, if it is not negative.
    #[must_use]
    pub fn neighbour(self, direction: Direction) -> Option<Self> {
        let delta = direction.delta();
        Some(Self {
            column: self.column.checked_add_signed(delta.x())?,
            row: self.row.checked_add_signed(delta.y())?,
        })
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Inclusive axis-aligned rectangle of points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    south_west: Point,
    north_east: Point,
}

impl Region {
    /// Creates a region from its south-west and north-east corners.
    pub fn new(south_west: Point, north_east: Point) -> Result<Self, GeometryError> {
        check_corners(south_west, north_east)?;
        Ok(Self {
            south_west,
            north_east,
        })
    }

    /// Creates the region whose north-west (top-left) corner is `origin`.
    pub fn from_origin_and_size(origin: Point, size: Size) -> Result<Self, GeometryError> {
        if size.is_empty() {
            return Err(GeometryError::EmptySize {
                columns: size.columns(),
                rows: size.rows(),
            });
        }
        let overflow = || GeometryError::Overflow {
            origin,
            columns: size.columns(),
            rows: size.rows(),
        };
        let east = origin
            .x()
            .checked_add(size.columns() - 1)
            .ok_or_else(overflow)?;
        let south = origin
            .y()
            .checked_add(size.rows() - 1)
            .ok_or_else(overflow)?;
        Self::new(Point::new(origin.x(), south), Point::new(east, origin.y()))
    }

    /// South-west (bottom-left) corner.
    #[must_use]
    pub const fn south_west(&self) -> Point {
        self.south_west
    }

    /// North-east (top-right) corner.
    #[must_use]
    pub const fn north_east(&self) -> Point {
        self.north_east
    }

    /// North-west (top-left) corner.
    #[must_use]
    pub const fn north_west(&self) -> Point {
        Point::new(self.south_west.x(), self.north_east.y())
    }

    /// South-east (bottom-right) corner.
    #[must_use]
    pub const fn south_east(&self) -> Point {
        Point::new(self.north_east.x(), self.south_west.y())
    }

    /// Replaces the south-west corner, keeping the corner invariant.
    pub fn set_south_west(&mut self, south_west: Point) -> Result<(), GeometryError> {
        check_corners(south_west, self.north_east)?;
        self.south_west = south_west;
        Ok(())
    }

    /// Replaces the north-east corner, keeping the corner invariant.
    pub fn set_north_east(&mut self, north_east: Point) -> Result<(), GeometryError> {
        check_corners(self.south_west, north_east)?;
        self.north_east = north_east;
        Ok(())
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.north_east.x() - self.south_west.x() + 1
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.south_west.y() - self.north_east.y() + 1
    }

    /// Number of points covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Width and height as a [`Size`].
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Whether the point lies inside the region, borders included.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x() >= self.south_west.x()
            && point.x() <= self.north_east.x()
            && point.y() <= self.south_west.y()
            && point.y() >= self.north_east.y()
    }

    /// Overlap of two regions, if any.
    #[must_use]
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let west = self.south_west.x().max(other.south_west.x());
        let east = self.north_east.x().min(other.north_east.x());
        let north = self.north_east.y().max(other.north_east.y());
        let south = self.south_west.y().min(other.south_west.y());
        Region::new(Point::new(west, south), Point::new(east, north)).ok()
    }

    /// Every point of the region, row by row from the north-west corner.
    pub fn points(&self) -> impl Iterator<Item = Point> + Clone {
        let west = self.south_west.x();
        let east = self.north_east.x();
        (self.north_east.y()..=self.south_west.y())
            .flat_map(move |y| (west..=east).map(move |x| Point::new(x, y)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.north_west(), self.south_east())
    }
}

fn check_corners(south_west: Point, north_east: Point) -> Result<(), GeometryError> {
    if south_west.x() > north_east.x() || south_west.y() < north_east.y() {
        return Err(GeometryError::InvertedRegion {
            south_west,
            north_east,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_order_lexicographically() {
        assert!(Point::new(1, 9) < Point::new(2, 0));
        assert!(Point::new(2, 0) < Point::new(2, 1));
    }

    #[test]
    fn offset_refuses_negative_coordinates() {
        assert_eq!(Point::new(0, 3).offset(Delta::LEFT), None);
        assert_eq!(Point::new(0, 0).offset(Delta::UP), None);
        assert_eq!(Point::new(2, 3).offset(Delta::new(1, -1)), Some(Point::new(3, 2)));
    }

    #[test]
    fn point_parses_plain_and_decorated_forms() {
        assert_eq!("3,4".parse::<Point>(), Ok(Point::new(3, 4)));
        assert_eq!("(12, 7)".parse::<Point>(), Ok(Point::new(12, 7)));
        assert!("12".parse::<Point>().is_err());
        assert!("1,2,3".parse::<Point>().is_err());
        assert_eq!(Point::new(5, 6).to_string(), "5,6");
    }

    #[test]
    fn delta_metrics_use_absolute_components() {
        let delta = Delta::new(3, -4);
        assert_eq!(delta.manhattan(), 7);
        assert!((delta.euclidean() - 5.0).abs() < f64::EPSILON);
        assert_eq!(delta.invert(), Delta::new(-3, 4));
        assert!(Delta::STAY.is_stay());
    }

    #[test]
    fn region_rejects_inverted_corners() {
        let error = Region::new(Point::new(4, 0), Point::new(2, 0)).expect_err("inverted");
        assert!(matches!(error, GeometryError::InvertedRegion { .. }));
        assert!(Region::new(Point::new(0, 0), Point::new(0, 1)).is_err());
    }

    #[test]
    fn region_measures_inclusive_bounds() {
        let region = Region::new(Point::new(2, 5), Point::new(4, 3)).expect("valid");
        assert_eq!(region.width(), 3);
        assert_eq!(region.height(), 3);
        assert_eq!(region.area(), 9);
        assert!(region.contains(Point::new(2, 3)));
        assert!(region.contains(Point::new(4, 5)));
        assert!(!region.contains(Point::new(5, 4)));
        assert!(!region.contains(Point::new(3, 2)));
    }

    #[test]
    fn region_mutation_keeps_invariant() {
        let mut region = Region::new(Point::new(0, 3), Point::new(3, 0)).expect("valid");
        assert!(region.set_north_east(Point::new(3, 4)).is_err());
        assert_eq!(region.north_east(), Point::new(3, 0));
        region.set_south_west(Point::new(1, 2)).expect("still valid");
        assert_eq!(region.size(), Size::new(3, 3));
    }

    #[test]
    fn region_from_origin_spans_size() {
        let region =
            Region::from_origin_and_size(Point::new(4, 2), Size::new(2, 3)).expect("valid");
        assert_eq!(region.north_west(), Point::new(4, 2));
        assert_eq!(region.south_east(), Point::new(5, 4));
        assert!(Region::from_origin_and_size(Point::new(0, 0), Size::new(0, 3)).is_err());
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let page = Region::from_origin_and_size(Point::new(2, 2), Size::new(2, 2)).expect("page");
        let level = Region::from_origin_and_size(Point::new(0, 0), Size::new(3, 3)).expect("level");
        let overlap = page.intersection(&level).expect("overlap");
        assert_eq!(overlap.north_west(), Point::new(2, 2));
        assert_eq!(overlap.area(), 1);

        let far = Region::from_origin_and_size(Point::new(9, 9), Size::new(1, 1)).expect("far");
        assert_eq!(level.intersection(&far), None);
    }

    #[test]
    fn points_walk_rows_from_north_west() {
        let region = Region::from_origin_and_size(Point::new(1, 1), Size::new(2, 2)).expect("ok");
        let points: Vec<_> = region.points().collect();
        assert_eq!(
            points,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(1, 2),
                Point::new(2, 2)
            ]
        );
    }

    #[test]
    fn index_neighbours_stop_at_origin() {
        let origin = Index::new(0, 0);
        assert_eq!(origin.neighbour(Direction::Up), None);
        assert_eq!(origin.neighbour(Direction::Right), Some(Index::new(1, 0)));
        assert_eq!(origin.neighbour(Direction::Stay), Some(origin));
    }
}
