use std::cmp::Ordering;

use log::{debug, info};
use maze_pages_core::{Direction, Index, Kind, Point, Region, Size, Theme};
use rand::Rng;

use crate::{element::Element, error::GridError, page::Page};

/// Tiling of the whole level into display-sized pages.
///
/// The page of a point is `floor(point / page_size)` component-wise. Pages
/// always cover a full page-sized region; the level region clips the pages on
/// the east and south edge when the level is not a multiple of the page size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageGrid {
    level_size: Size,
    page_size: Size,
    dimensions: Size,
    level_region: Region,
    rows: Vec<Vec<Page>>,
    len: usize,
    current: Index,
}

impl PageGrid {
    /// Creates an empty grid for a level of `level_size` cells.
    pub fn new(level_size: Size, page_size: Size) -> Result<Self, GridError> {
        validate(level_size, page_size)?;
        let dimensions = dimensions_for(level_size, page_size);
        let level_region = Region::from_origin_and_size(Point::new(0, 0), level_size)?;
        Ok(Self {
            level_size,
            page_size,
            dimensions,
            level_region,
            rows: build_rows(dimensions, page_size, &level_region)?,
            len: 0,
            current: Index::new(0, 0),
        })
    }

    /// Creates a grid and inserts every element.
    pub fn with_elements<I>(
        level_size: Size,
        page_size: Size,
        elements: I,
    ) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut grid = Self::new(level_size, page_size)?;
        for element in elements {
            let _ = grid.add(element)?;
        }
        Ok(grid)
    }

    /// Columns and rows of the whole level.
    #[must_use]
    pub const fn level_size(&self) -> Size {
        self.level_size
    }

    /// Columns and rows of one page.
    #[must_use]
    pub const fn page_size(&self) -> Size {
        self.page_size
    }

    /// Number of pages along each axis.
    #[must_use]
    pub const fn dimensions(&self) -> Size {
        self.dimensions
    }

    /// Region covered by the level.
    #[must_use]
    pub const fn level_region(&self) -> Region {
        self.level_region
    }

    /// Number of elements in the level.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the level holds no element.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cells in the level.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.level_size.area()
    }

    /// Whether every cell of the level is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        u64::try_from(self.len).map_or(true, |len| len >= self.capacity())
    }

    /// Whether the level is an exact multiple of the page size.
    #[must_use]
    pub const fn is_perfect_fit(&self) -> bool {
        self.level_size.columns() % self.page_size.columns() == 0
            && self.level_size.rows() % self.page_size.rows() == 0
    }

    /// Index of the page holding `point`, or `None` outside the level.
    #[must_use]
    pub const fn page_index_at(&self, point: Point) -> Option<Index> {
        if !self.level_region.contains(point) {
            return None;
        }
        Some(Index::new(
            point.x() / self.page_size.columns(),
            point.y() / self.page_size.rows(),
        ))
    }

    /// Page at `index` without moving the cursor.
    #[must_use]
    pub fn get(&self, index: Index) -> Option<&Page> {
        let row = usize::try_from(index.row()).ok()?;
        let column = usize::try_from(index.column()).ok()?;
        self.rows.get(row)?.get(column)
    }

    /// Page at `index`, which becomes the current page.
    pub fn fetch(&mut self, index: Index) -> Result<&Page, GridError> {
        if self.get(index).is_none() {
            return Err(GridError::NoSuchPage { index });
        }
        self.current = index;
        Ok(self.current_page())
    }

    /// Makes the page holding `point` the current page.
    pub fn fetch_page_of(&mut self, point: Point) -> Result<&Page, GridError> {
        let index = self
            .page_index_at(point)
            .ok_or(GridError::OutsideLevel { point })?;
        self.fetch(index)
    }

    /// Index of the current page.
    #[must_use]
    pub const fn current_index(&self) -> Index {
        self.current
    }

    /// The current page.
    #[must_use]
    pub fn current_page(&self) -> &Page {
        // The cursor is reset on every resize and only ever set to existing pages.
        &self.rows[self.current.row() as usize][self.current.column() as usize]
    }

    /// Page adjacent to the current one.
    #[must_use]
    pub fn neighbour(&self, direction: Direction) -> Option<&Page> {
        self.get(self.current.neighbour(direction)?)
    }

    /// Moves the cursor to the adjacent page, if there is one.
    pub fn fetch_neighbour(&mut self, direction: Direction) -> Option<&Page> {
        let index = self.current.neighbour(direction)?;
        self.fetch(index).ok()
    }

    /// Moves the cursor at most one page per axis towards the page of `point`.
    pub fn follow(&mut self, point: Point) -> &Page {
        if let Some(target) = self.page_index_at(point) {
            let next = Index::new(
                step_toward(self.current.column(), target.column()),
                step_toward(self.current.row(), target.row()),
            );
            if next != self.current {
                debug!("page cursor follows {point} to {next}");
                self.current = next;
            }
        }
        self.current_page()
    }

    /// Every page with its index, row by row.
    pub fn pages(&self) -> impl Iterator<Item = (Index, &Page)> {
        let page_size = self.page_size;
        self.rows.iter().flatten().map(move |page| {
            let corner = page.region().north_west();
            (
                Index::new(
                    corner.x() / page_size.columns(),
                    corner.y() / page_size.rows(),
                ),
                page,
            )
        })
    }

    /// Every element, page by page in row-major order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + Clone {
        self.rows.iter().flatten().flat_map(Page::elements)
    }

    /// Every element of one kind, page by page in row-major order.
    pub fn elements_of_kind(&self, kind: Kind) -> impl Iterator<Item = &Element> + Clone {
        self.elements().filter(move |element| element.kind() == kind)
    }

    /// First element of one kind, without removing it.
    #[must_use]
    pub fn find_of_kind(&self, kind: Kind) -> Option<&Element> {
        self.elements_of_kind(kind).next()
    }

    /// Element on `point`, if any.
    #[must_use]
    pub fn at(&self, point: Point) -> Option<&Element> {
        self.get(self.page_index_at(point)?)?.at(point)
    }

    /// Inserts the element into the page that holds its point.
    pub fn add(&mut self, element: Element) -> Result<Index, GridError> {
        let point = element.point();
        let index = self
            .page_index_at(point)
            .ok_or(GridError::OutsideLevel { point })?;
        self.page_mut(index)?.add(element)?;
        self.len += 1;
        Ok(index)
    }

    /// Removes whatever element sits on `point`.
    pub fn remove(&mut self, point: Point) -> Result<Element, GridError> {
        let index = self
            .page_index_at(point)
            .ok_or(GridError::OutsideLevel { point })?;
        let removed = self.page_mut(index)?.remove(point)?;
        self.len -= 1;
        Ok(removed)
    }

    /// Removes this exact element.
    pub fn remove_element(&mut self, element: &Element) -> Result<Element, GridError> {
        let point = element.point();
        let index = self
            .page_index_at(point)
            .ok_or(GridError::OutsideLevel { point })?;
        let removed = self.page_mut(index)?.remove_element(element)?;
        self.len -= 1;
        Ok(removed)
    }

    /// Removes the first element of `kind`, if there is one.
    pub fn remove_one_of_kind(&mut self, kind: Kind) -> Option<Element> {
        let point = self.find_of_kind(kind)?.point();
        self.remove(point).ok()
    }

    /// First free cell of the level, scanning pages then cells in row-major order.
    #[must_use]
    pub fn find_free_space(&self) -> Option<(Index, Point)> {
        self.find_free_space_excluding(|_| false)
    }

    /// First free cell for which `is_excluded` answers `false`.
    pub fn find_free_space_excluding<F>(&self, is_excluded: F) -> Option<(Index, Point)>
    where
        F: Fn(Point) -> bool,
    {
        if self.is_full() {
            return None;
        }
        self.pages().find_map(|(index, page)| {
            page.free_point_excluding(Some(&self.level_region), &is_excluded)
                .map(|point| (index, point))
        })
    }

    /// Spawns an element of `kind` on the first free cell.
    ///
    /// A full level is not an error; `Ok(None)` is returned instead.
    pub fn generate(
        &mut self,
        kind: Kind,
        theme: &Theme,
    ) -> Result<Option<&Element>, GridError> {
        self.generate_excluding(kind, theme, |_| false)
    }

    /// Spawns an element of `kind` on the first free cell that is not excluded.
    pub fn generate_excluding<F>(
        &mut self,
        kind: Kind,
        theme: &Theme,
        is_excluded: F,
    ) -> Result<Option<&Element>, GridError>
    where
        F: Fn(Point) -> bool,
    {
        if kind == Kind::Player {
            return Err(GridError::PlayerKind);
        }
        let Some((_, point)) = self.find_free_space_excluding(is_excluded) else {
            return Ok(None);
        };
        let _ = self.add(Element::create(kind, point, theme))?;
        Ok(self.at(point))
    }

    /// Re-tiles the grid for a new level or page size.
    ///
    /// Elements that fall outside the new level are evicted and returned; all
    /// other elements keep their point. The cursor returns to page `(0, 0)`.
    pub fn resize(
        &mut self,
        level_size: Size,
        page_size: Size,
    ) -> Result<Vec<Element>, GridError> {
        validate(level_size, page_size)?;
        let level_region = Region::from_origin_and_size(Point::new(0, 0), level_size)?;
        let dimensions = dimensions_for(level_size, page_size);
        let far_corner = Index::new(dimensions.columns() - 1, dimensions.rows() - 1);
        let _ = page_region(far_corner, page_size)?;
        let retile = page_size != self.page_size;

        self.level_size = level_size;
        self.page_size = page_size;
        self.dimensions = dimensions;
        self.level_region = level_region;
        self.current = Index::new(0, 0);

        let evicted = if retile {
            self.retile()?
        } else {
            self.reshape()?
        };
        info!(
            "resized level to {level_size} with {page_size} pages ({dimensions}), evicted {}",
            evicted.len()
        );
        Ok(evicted)
    }

    fn retile(&mut self) -> Result<Vec<Element>, GridError> {
        let rows = build_rows(self.dimensions, self.page_size, &self.level_region)?;
        let survivors: Vec<Element> = self
            .rows
            .iter_mut()
            .flatten()
            .flat_map(Page::drain)
            .collect();
        self.rows = rows;
        self.len = 0;

        let mut evicted = Vec::new();
        for element in survivors {
            if self.level_region.contains(element.point()) {
                let _ = self.add(element)?;
            } else {
                evicted.push(element);
            }
        }
        Ok(evicted)
    }

    fn reshape(&mut self) -> Result<Vec<Element>, GridError> {
        let keep_rows = self.dimensions.rows() as usize;
        let keep_columns = self.dimensions.columns() as usize;
        let mut evicted = Vec::new();

        if self.rows.len() > keep_rows {
            for row in self.rows.drain(keep_rows..) {
                for mut page in row {
                    evicted.extend(page.drain());
                }
            }
        }
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            if row.len() > keep_columns {
                for mut page in row.drain(keep_columns..) {
                    evicted.extend(page.drain());
                }
            }
            for page in row.iter_mut() {
                evicted.extend(page.reclip(&self.level_region));
            }
            while row.len() < keep_columns {
                let index = Index::new(row.len() as u32, row_index as u32);
                row.push(build_page(index, self.page_size, &self.level_region)?);
            }
        }
        while self.rows.len() < keep_rows {
            let row_index = self.rows.len() as u32;
            let row = (0..self.dimensions.columns())
                .map(|column| {
                    let index = Index::new(column, row_index);
                    build_page(index, self.page_size, &self.level_region)
                })
                .collect::<Result<Vec<_>, _>>()?;
            self.rows.push(row);
        }

        self.len -= evicted.len();
        Ok(evicted)
    }

    /// Advances every dynamic obstacle by one step, page by page.
    ///
    /// Obstacles stay on their own page clipped to the level and never enter
    /// cells for which `is_excluded` answers `true`.
    pub fn update_obstacles<R, F>(
        &mut self,
        is_excluded: F,
        rng: &mut R,
    ) -> Vec<(Point, Point)>
    where
        R: Rng + ?Sized,
        F: Fn(Point) -> bool,
    {
        let bounds = self.level_region;
        let mut moves = Vec::new();
        for page in self.rows.iter_mut().flatten() {
            moves.extend(page.update_within(&bounds, &is_excluded, rng));
        }
        moves
    }

    pub(crate) fn reskin(&mut self, theme: &Theme) {
        for element in self.rows.iter_mut().flatten().flat_map(Page::elements_mut) {
            element.set_representation(theme.representation_of(element.kind()));
        }
    }

    fn page_mut(&mut self, index: Index) -> Result<&mut Page, GridError> {
        let row = usize::try_from(index.row()).ok();
        let column = usize::try_from(index.column()).ok();
        row.zip(column)
            .and_then(|(row, column)| self.rows.get_mut(row)?.get_mut(column))
            .ok_or(GridError::NoSuchPage { index })
    }
}

fn validate(level_size: Size, page_size: Size) -> Result<(), GridError> {
    if level_size.is_empty() || page_size.is_empty() {
        return Err(GridError::InvalidSize {
            level: level_size,
            page: page_size,
        });
    }
    Ok(())
}

fn dimensions_for(level_size: Size, page_size: Size) -> Size {
    Size::new(
        level_size.columns().div_ceil(page_size.columns()),
        level_size.rows().div_ceil(page_size.rows()),
    )
}

fn page_region(index: Index, page_size: Size) -> Result<Region, GridError> {
    let origin = Point::new(
        index.column().saturating_mul(page_size.columns()),
        index.row().saturating_mul(page_size.rows()),
    );
    Ok(Region::from_origin_and_size(origin, page_size)?)
}

fn build_page(index: Index, page_size: Size, level: &Region) -> Result<Page, GridError> {
    Page::clipped(page_region(index, page_size)?, level).ok_or(GridError::NoSuchPage { index })
}

fn build_rows(
    dimensions: Size,
    page_size: Size,
    level: &Region,
) -> Result<Vec<Vec<Page>>, GridError> {
    (0..dimensions.rows())
        .map(|row| {
            (0..dimensions.columns())
                .map(|column| build_page(Index::new(column, row), page_size, level))
                .collect()
        })
        .collect()
}

fn step_toward(from: u32, to: u32) -> u32 {
    match from.cmp(&to) {
        Ordering::Less => from + 1,
        Ordering::Greater => from - 1,
        Ordering::Equal => from,
    }
}
