use maze_pages_core::{Delta, Direction, Point, Region, Size};
use maze_pages_system_movement::{MovementStrategy, Pattern, PatternError};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn region(columns: u32, rows: u32) -> Region {
    Region::from_origin_and_size(Point::new(0, 0), Size::new(columns, rows)).expect("region")
}

#[test]
fn compiled_patterns_match_documented_sequences() {
    let letters = Pattern::compile("2lurd").expect("letters");
    assert_eq!(
        letters.iter().collect::<Vec<_>>(),
        vec![Delta::LEFT, Delta::LEFT, Delta::UP, Delta::RIGHT, Delta::DOWN]
    );

    let pairs: Pattern = "(+1,-1)(+1,+1)".parse().expect("pairs");
    assert_eq!(
        pairs.iter().collect::<Vec<_>>(),
        vec![Delta::new(1, -1), Delta::new(1, 1)]
    );

    assert_eq!(Pattern::compile(""), Err(PatternError::Empty));
}

#[test]
fn pattern_obstacle_walks_its_cycle_when_unobstructed() {
    let mut strategy = MovementStrategy::pattern(Pattern::compile("2r2l").expect("pattern"));
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let area = region(5, 1);
    let mut point = Point::new(1, 0);
    let mut visited = Vec::new();
    for _ in 0..8 {
        let delta = strategy.next_step(point, &area, |_| false, &mut rng);
        point = point.offset(delta).expect("inside");
        visited.push(point.x());
    }
    assert_eq!(visited, vec![2, 3, 2, 1, 2, 3, 2, 1]);
}

#[test]
fn seeking_obstacle_prefers_its_heading() {
    let area = region(40, 1);
    let mut continued = 0;
    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut strategy = MovementStrategy::DirectionSeeking {
            back: Direction::Left,
            exclude_back: false,
        };
        let _ = strategy.next_step(Point::new(20, 0), &area, |_| false, &mut rng);
        if strategy.back() == Some(Direction::Left) {
            continued += 1;
        }
    }
    // Only left and right are open in a corridor, and turning back is a last resort.
    assert_eq!(continued, 200);
}

#[test]
fn seeking_obstacle_avoids_taken_cells() {
    let area = region(3, 3);
    let centre = Point::new(1, 1);
    let open = Point::new(1, 2);
    for seed in 0..50 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut strategy = MovementStrategy::intelligent();
        let delta = strategy.next_step(centre, &area, |p| p != open, &mut rng);
        assert_eq!(delta, Delta::DOWN);
        assert_eq!(strategy.back(), Some(Direction::Up));
    }
}

fn strategy_for(choice: u8, rng: &mut ChaCha8Rng) -> MovementStrategy {
    match choice % 3 {
        0 => MovementStrategy::intelligent(),
        1 => MovementStrategy::sequential(),
        _ => MovementStrategy::random_pattern(rng).expect("pool pattern"),
    }
}

proptest! {
    #[test]
    fn every_step_stays_inside_and_off_taken_cells(
        seed in any::<u64>(),
        choice in any::<u8>(),
        columns in 1u32..8,
        rows in 1u32..8,
        start in (0u32..8, 0u32..8),
        blocked in proptest::collection::btree_set((0u32..8, 0u32..8), 0..20),
    ) {
        let area = region(columns, rows);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut strategy = strategy_for(choice, &mut rng);
        let mut point = Point::new(start.0 % columns, start.1 % rows);
        let taken: Vec<Point> = blocked
            .iter()
            .map(|&(x, y)| Point::new(x, y))
            .filter(|p| *p != point)
            .collect();

        for _ in 0..12 {
            let delta = strategy.next_step(point, &area, |p| taken.contains(&p), &mut rng);
            let next = point.offset(delta).expect("never negative");
            if !delta.is_stay() {
                prop_assert!(area.contains(next));
                prop_assert!(!taken.contains(&next));
                if !matches!(strategy, MovementStrategy::PatternCycle { .. }) {
                    prop_assert_eq!(delta.manhattan(), 1);
                }
            }
            point = next;
        }
    }
}
