use std::collections::BTreeMap;

use maze_pages_core::{Index, Kind, Point, Region, Size, Theme};
use maze_pages_world::{Element, Page, PageGrid};
use proptest::prelude::*;

fn sizes() -> impl Strategy<Value = (Size, Size)> {
    (1u32..24, 1u32..24, 1u32..8, 1u32..8)
        .prop_map(|(columns, rows, page_columns, page_rows)| {
            (Size::new(columns, rows), Size::new(page_columns, page_rows))
        })
}

fn kinds() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::PLACEABLE.to_vec())
}

fn populated(
    level: Size,
    page: Size,
    cells: &[(u32, u32, Kind)],
) -> (PageGrid, BTreeMap<Point, Kind>) {
    let theme = Theme::classic();
    let mut grid = PageGrid::new(level, page).expect("grid");
    let mut placed = BTreeMap::new();
    for &(x, y, kind) in cells {
        let point = Point::new(x % level.columns(), y % level.rows());
        if placed.contains_key(&point) {
            continue;
        }
        let _ = grid.add(Element::create(kind, point, &theme)).expect("add");
        let _ = placed.insert(point, kind);
    }
    (grid, placed)
}

proptest! {
    #[test]
    fn every_point_belongs_to_exactly_one_page((level, page) in sizes()) {
        let grid = PageGrid::new(level, page).expect("grid");
        for point in grid.level_region().points() {
            let owners: Vec<Index> = grid
                .pages()
                .filter(|(_, candidate)| candidate.is_inside(point))
                .map(|(index, _)| index)
                .collect();
            let expected = Index::new(point.x() / page.columns(), point.y() / page.rows());
            prop_assert_eq!(owners, vec![expected]);
            prop_assert_eq!(grid.page_index_at(point), Some(expected));
        }
    }

    #[test]
    fn page_holds_added_elements_until_removed(
        (x, y) in (0u32..50, 0u32..50),
        (width, height) in (1u32..10, 1u32..10),
        (dx, dy) in (0u32..12, 0u32..12),
        kind in kinds(),
    ) {
        let region = Region::from_origin_and_size(Point::new(x, y), Size::new(width, height))
            .expect("region");
        let mut page = Page::new(region);
        let point = Point::new(x + dx, y + dy);
        let element = Element::create(kind, point, &Theme::classic());

        if region.contains(point) {
            page.add(element.clone()).expect("inside");
            prop_assert_eq!(page.at(point), Some(&element));
            prop_assert!(page.add(element.clone()).is_err());
            prop_assert_eq!(page.remove(point), Ok(element));
            prop_assert!(page.at(point).is_none());
        } else {
            prop_assert!(page.add(element).is_err());
            prop_assert!(page.is_empty());
        }
    }

    #[test]
    fn resizing_keeps_exactly_the_in_bound_elements(
        (level, page) in sizes(),
        (next_level, next_page) in sizes(),
        cells in prop::collection::vec((0u32..24, 0u32..24, kinds()), 0..40),
    ) {
        let (mut grid, placed) = populated(level, page, &cells);
        let evicted = grid.resize(next_level, next_page).expect("resize");

        let bounds = grid.level_region();
        let survivors: BTreeMap<Point, Kind> = placed
            .iter()
            .filter(|(point, _)| bounds.contains(**point))
            .map(|(point, kind)| (*point, *kind))
            .collect();

        prop_assert_eq!(grid.len(), survivors.len());
        prop_assert_eq!(evicted.len(), placed.len() - survivors.len());
        for element in &evicted {
            prop_assert!(!bounds.contains(element.point()));
        }
        for (point, kind) in &survivors {
            prop_assert_eq!(grid.at(*point).map(Element::kind), Some(*kind));
            let index = grid.page_index_at(*point).expect("in level");
            let owner = grid.get(index).expect("page");
            prop_assert!(owner.at(*point).is_some());
        }
        prop_assert_eq!(grid.current_index(), Index::new(0, 0));
    }
}
