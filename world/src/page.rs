use log::debug;
use maze_pages_core::{Delta, Kind, Point, Region};
use rand::Rng;

use crate::{element::Element, error::PageError};

/// Rectangular slice of the level and the elements located inside it.
///
/// Cells are stored densely in row-major order so lookups by point are a
/// single index computation. Only the part of the page that lies inside the
/// level has storage; see [`Page::clipped`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    region: Region,
    area: Region,
    cells: Vec<Option<Element>>,
    len: usize,
}

impl Page {
    /// Creates an empty page covering `region`.
    #[must_use]
    pub fn new(region: Region) -> Self {
        Self::with_area(region, region)
    }

    /// Creates an empty page covering `region` whose cells are limited to the
    /// part inside `bounds`, or `None` when the two do not overlap.
    #[must_use]
    pub fn clipped(region: Region, bounds: &Region) -> Option<Self> {
        let area = region.intersection(bounds)?;
        Some(Self::with_area(region, area))
    }

    fn with_area(region: Region, area: Region) -> Self {
        let capacity = usize::try_from(area.area()).unwrap_or(0);
        Self {
            region,
            area,
            cells: vec![None; capacity],
            len: 0,
        }
    }

    /// Region covered by the page.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Cells of the page that can hold elements.
    #[must_use]
    pub const fn area(&self) -> Region {
        self.area
    }

    /// Number of elements on the page.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the page holds no element.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cells the page can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cell is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.cells.len()
    }

    /// Whether the point lies within the page.
    #[must_use]
    pub const fn is_inside(&self, point: Point) -> bool {
        self.region.contains(point)
    }

    /// Whether the point lies outside the page.
    #[must_use]
    pub const fn is_outside(&self, point: Point) -> bool {
        !self.is_inside(point)
    }

    /// Inserts the element at its point.
    pub fn add(&mut self, element: Element) -> Result<(), PageError> {
        if element.kind() == Kind::Player {
            return Err(PageError::PlayerKind);
        }
        let point = element.point();
        let index = self.index(point).ok_or(PageError::OutOfBounds {
            point,
            region: self.area,
        })?;
        let slot = &mut self.cells[index];
        if slot.is_some() {
            return Err(PageError::OccupiedCell { point });
        }
        *slot = Some(element);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns whatever element sits on `point`.
    pub fn remove(&mut self, point: Point) -> Result<Element, PageError> {
        let removed = self
            .index(point)
            .and_then(|index| self.cells[index].take())
            .ok_or(PageError::NotFound { point })?;
        self.len -= 1;
        Ok(removed)
    }

    /// Removes the element if it is the one stored at its point.
    pub fn remove_element(&mut self, element: &Element) -> Result<Element, PageError> {
        if !self.contains(element) {
            return Err(PageError::NotFound {
                point: element.point(),
            });
        }
        self.remove(element.point())
    }

    /// Element on `point`, if any.
    #[must_use]
    pub fn at(&self, point: Point) -> Option<&Element> {
        self.index(point).and_then(|index| self.cells[index].as_ref())
    }

    /// Whether this exact element is stored on its point.
    #[must_use]
    pub fn contains(&self, element: &Element) -> bool {
        self.at(element.point()) == Some(element)
    }

    /// Elements in row-major order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + Clone {
        self.cells.iter().flatten()
    }

    /// Elements of one kind in row-major order.
    pub fn elements_of_kind(&self, kind: Kind) -> impl Iterator<Item = &Element> + Clone {
        self.elements().filter(move |element| element.kind() == kind)
    }

    /// First unoccupied point of the page, optionally narrowed to `within`.
    #[must_use]
    pub fn free_point(&self, within: Option<&Region>) -> Option<Point> {
        self.free_point_excluding(within, |_| false)
    }

    /// First unoccupied point for which `is_excluded` answers `false`.
    pub fn free_point_excluding<F>(
        &self,
        within: Option<&Region>,
        is_excluded: F,
    ) -> Option<Point>
    where
        F: Fn(Point) -> bool,
    {
        if self.is_full() {
            return None;
        }
        let area = match within {
            Some(bounds) => self.area.intersection(bounds)?,
            None => self.area,
        };
        area.points()
            .find(|point| self.at(*point).is_none() && !is_excluded(*point))
    }

    /// Advances every dynamic obstacle by one step inside the page.
    pub fn update<R>(&mut self, rng: &mut R) -> Vec<(Point, Point)>
    where
        R: Rng + ?Sized,
    {
        let area = self.area;
        self.update_within(&area, |_| false, rng)
    }

    /// Advances every dynamic obstacle by one step, keeping it inside the
    /// page clipped to `bounds` and off cells for which `is_excluded` answers
    /// `true`. Returns the `(from, to)` pairs of obstacles that moved.
    pub fn update_within<R, F>(
        &mut self,
        bounds: &Region,
        is_excluded: F,
        rng: &mut R,
    ) -> Vec<(Point, Point)>
    where
        R: Rng + ?Sized,
        F: Fn(Point) -> bool,
    {
        let Some(area) = self.area.intersection(bounds) else {
            return Vec::new();
        };
        let movers: Vec<Point> = self
            .elements()
            .filter(|element| element.motion().is_some())
            .map(Element::point)
            .collect();

        let mut moves = Vec::new();
        for from in movers {
            let Some(index) = self.index(from) else {
                continue;
            };
            let Some(mut obstacle) = self.cells[index].take() else {
                continue;
            };
            let delta = match obstacle.motion_mut() {
                Some(strategy) => strategy.next_step(
                    from,
                    &area,
                    |point| self.at(point).is_some() || is_excluded(point),
                    rng,
                ),
                None => Delta::STAY,
            };
            let target = from
                .offset(delta)
                .and_then(|to| self.index(to).map(|slot| (to, slot)));
            match target {
                Some((to, slot)) if to != from && self.cells[slot].is_none() => {
                    obstacle.set_point(to);
                    self.cells[slot] = Some(obstacle);
                    moves.push((from, to));
                }
                _ => {
                    self.cells[index] = Some(obstacle);
                }
            }
        }
        if !moves.is_empty() {
            debug!("{} obstacles moved on page {}", moves.len(), self.region);
        }
        moves
    }

    pub(crate) fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.cells.iter_mut().flatten()
    }

    /// Limits the page's cells to `bounds`, returning the elements left outside.
    pub(crate) fn reclip(&mut self, bounds: &Region) -> Vec<Element> {
        let elements = self.drain();
        let Some(area) = self.region.intersection(bounds) else {
            return elements;
        };
        *self = Self::with_area(self.region, area);
        let mut evicted = Vec::new();
        for element in elements {
            match self.index(element.point()) {
                Some(index) => {
                    self.cells[index] = Some(element);
                    self.len += 1;
                }
                None => evicted.push(element),
            }
        }
        evicted
    }

    pub(crate) fn drain(&mut self) -> Vec<Element> {
        self.len = 0;
        self.cells.iter_mut().filter_map(Option::take).collect()
    }

    fn index(&self, point: Point) -> Option<usize> {
        if !self.area.contains(point) {
            return None;
        }
        let north_west = self.area.north_west();
        let row = usize::try_from(point.y() - north_west.y()).ok()?;
        let column = usize::try_from(point.x() - north_west.x()).ok()?;
        let width = usize::try_from(self.area.width()).ok()?;
        let index = row * width + column;
        (index < self.cells.len()).then_some(index)
    }
}
