use std::{
    collections::{hash_map::DefaultHasher, BTreeSet},
    hash::{Hash, Hasher},
};

use maze_pages_core::{Point, Region};
use maze_pages_system_movement::MovementStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn seeded_obstacles_replay_identically() {
    let first = replay(7);
    let second = replay(7);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.trail.len(), 3 * TICKS);
}

#[test]
fn replay_keeps_obstacles_apart() {
    let outcome = replay(21);
    for tick in outcome.trail.chunks(3) {
        let distinct: BTreeSet<_> = tick.iter().collect();
        assert_eq!(distinct.len(), tick.len(), "obstacles overlapped: {tick:?}");
    }
}

const TICKS: usize = 40;

fn replay(seed: u64) -> ReplayOutcome {
    let region = Region::new(Point::new(0, 5), Point::new(5, 0)).expect("region");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut obstacles = vec![
        (Point::new(0, 0), MovementStrategy::intelligent()),
        (Point::new(5, 5), MovementStrategy::sequential()),
        (
            Point::new(2, 3),
            MovementStrategy::random_pattern(&mut rng).expect("pool pattern"),
        ),
    ];
    let mut trail = Vec::new();

    for _ in 0..TICKS {
        for index in 0..obstacles.len() {
            let taken: BTreeSet<Point> = obstacles.iter().map(|(point, _)| *point).collect();
            let (point, strategy) = &mut obstacles[index];
            let delta = strategy.next_step(*point, &region, |p| taken.contains(&p), &mut rng);
            *point = point.offset(delta).expect("valid step");
        }
        trail.extend(obstacles.iter().map(|(point, _)| *point));
    }

    ReplayOutcome { trail }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    trail: Vec<Point>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
