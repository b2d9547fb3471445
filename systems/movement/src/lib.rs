#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement strategies that drive dynamic obstacles one step per tick.
//!
//! The strategies are pure with respect to the world: they see the obstacle's
//! current point, the region it must stay inside and a predicate describing
//! cells that are already taken, and they answer with the delta to apply.
//! Randomness is always drawn from the generator supplied by the caller so a
//! seeded session replays identically.

use log::debug;
use maze_pages_core::{Delta, Direction, Point, Region};
use rand::{seq::SliceRandom, Rng};

mod pattern;

pub use pattern::{Pattern, PatternError, MAX_PATTERN_LENGTH, PATTERN_POOL};

/// Probability that a direction-seeking obstacle tries to keep going straight first.
pub const CONTINUE_PROBABILITY: f64 = 0.75;

/// How a dynamic obstacle chooses its next step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovementStrategy {
    /// Cycles through a fixed pattern, skipping steps that are blocked.
    PatternCycle {
        /// Pattern and its cursor.
        pattern: Pattern,
    },
    /// Prefers to keep its heading and only turns back when cornered.
    DirectionSeeking {
        /// Opposite of the last direction taken.
        back: Direction,
        /// Shuffle only the two perpendicular turns and place the continuing
        /// direction strictly first or last.
        exclude_back: bool,
    },
}

impl MovementStrategy {
    /// Strategy that considers all three forward-facing directions each tick.
    #[must_use]
    pub const fn intelligent() -> Self {
        Self::DirectionSeeking {
            back: Direction::Stay,
            exclude_back: false,
        }
    }

    /// Strategy that only turns perpendicular or keeps going.
    #[must_use]
    pub const fn sequential() -> Self {
        Self::DirectionSeeking {
            back: Direction::Stay,
            exclude_back: true,
        }
    }

    /// Strategy that replays the supplied pattern.
    #[must_use]
    pub const fn pattern(pattern: Pattern) -> Self {
        Self::PatternCycle { pattern }
    }

    /// Pattern strategy picked uniformly from [`PATTERN_POOL`].
    pub fn random_pattern<R>(rng: &mut R) -> Result<Self, PatternError>
    where
        R: Rng + ?Sized,
    {
        let text = PATTERN_POOL[rng.gen_range(0..PATTERN_POOL.len())];
        Ok(Self::pattern(Pattern::compile(text)?))
    }

    /// Remembered back direction of a direction-seeking strategy.
    #[must_use]
    pub const fn back(&self) -> Option<Direction> {
        match self {
            Self::DirectionSeeking { back, .. } => Some(*back),
            Self::PatternCycle { .. } => None,
        }
    }

    /// Chooses the step an obstacle standing on `from` takes this tick.
    ///
    /// The returned delta is either [`Delta::STAY`] or leads to a point inside
    /// `region` for which `is_taken` answered `false`.
    pub fn next_step<R, F>(
        &mut self,
        from: Point,
        region: &Region,
        is_taken: F,
        rng: &mut R,
    ) -> Delta
    where
        R: Rng + ?Sized,
        F: Fn(Point) -> bool,
    {
        let is_valid = |delta: Delta| {
            from.offset(delta)
                .is_some_and(|next| region.contains(next) && !is_taken(next))
        };

        match self {
            Self::PatternCycle { pattern } => {
                for _ in 0..pattern.len() {
                    let delta = pattern.peek();
                    pattern.skip();
                    if is_valid(delta) {
                        return delta;
                    }
                }
                debug!("pattern obstacle at {from} is boxed in");
                Delta::STAY
            }
            Self::DirectionSeeking { back, exclude_back } => {
                let candidates = candidates(*back, *exclude_back, rng);
                let chosen = candidates
                    .into_iter()
                    .chain([*back])
                    .find(|direction| {
                        *direction != Direction::Stay && is_valid(direction.delta())
                    })
                    .unwrap_or(Direction::Stay);
                if chosen == Direction::Stay {
                    debug!("obstacle at {from} is boxed in");
                }
                *back = chosen.opposite();
                chosen.delta()
            }
        }
    }
}

fn candidates<R>(back: Direction, exclude_back: bool, rng: &mut R) -> Vec<Direction>
where
    R: Rng + ?Sized,
{
    let forward = back.opposite();
    if back == Direction::Stay {
        let mut all = Direction::MOTION.to_vec();
        all.shuffle(rng);
        return all;
    }

    let mut turns: Vec<Direction> = Direction::MOTION
        .into_iter()
        .filter(|direction| *direction != back && *direction != forward)
        .collect();
    if exclude_back {
        turns.shuffle(rng);
        if rng.gen_bool(CONTINUE_PROBABILITY) {
            turns.insert(0, forward);
        } else {
            turns.push(forward);
        }
        turns
    } else {
        turns.push(forward);
        turns.shuffle(rng);
        if rng.gen_bool(CONTINUE_PROBABILITY) {
            turns.retain(|direction| *direction != forward);
            turns.insert(0, forward);
        }
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square(size: u32) -> Region {
        Region::new(Point::new(0, size - 1), Point::new(size - 1, 0)).expect("region")
    }

    #[test]
    fn boxed_in_pattern_stays_and_keeps_cursor() {
        let mut strategy = MovementStrategy::pattern(Pattern::compile("lur").expect("pattern"));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let delta = strategy.next_step(Point::new(0, 0), &square(1), |_| false, &mut rng);
        assert_eq!(delta, Delta::STAY);
        let MovementStrategy::PatternCycle { pattern } = &strategy else {
            panic!("strategy changed variant");
        };
        assert_eq!(pattern.position(), 0);
    }

    #[test]
    fn pattern_skips_blocked_steps() {
        let mut strategy = MovementStrategy::pattern(Pattern::compile("lur").expect("pattern"));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let delta = strategy.next_step(Point::new(0, 0), &square(3), |_| false, &mut rng);
        assert_eq!(delta, Delta::RIGHT);
        let MovementStrategy::PatternCycle { pattern } = &strategy else {
            panic!("strategy changed variant");
        };
        assert_eq!(pattern.position(), 0);
    }

    #[test]
    fn seeking_obstacle_turns_back_from_dead_end() {
        let corridor = Region::new(Point::new(0, 0), Point::new(2, 0)).expect("region");
        let mut strategy = MovementStrategy::DirectionSeeking {
            back: Direction::Left,
            exclude_back: false,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let delta = strategy.next_step(Point::new(2, 0), &corridor, |_| false, &mut rng);
        assert_eq!(delta, Delta::LEFT);
        assert_eq!(strategy.back(), Some(Direction::Right));
    }

    #[test]
    fn surrounded_obstacle_stays_and_forgets_heading() {
        let mut strategy = MovementStrategy::sequential();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let delta = strategy.next_step(Point::new(1, 1), &square(3), |_| true, &mut rng);
        assert_eq!(delta, Delta::STAY);
        assert_eq!(strategy.back(), Some(Direction::Stay));
    }

    #[test]
    fn sequential_candidates_never_include_back() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..32 {
            let list = candidates(Direction::Up, true, &mut rng);
            assert_eq!(list.len(), 3);
            assert!(!list.contains(&Direction::Up));
            assert!(
                list.first() == Some(&Direction::Down) || list.last() == Some(&Direction::Down)
            );
        }
    }

    #[test]
    fn random_pattern_draws_from_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let strategy = MovementStrategy::random_pattern(&mut rng).expect("pool compiles");
        assert!(matches!(strategy, MovementStrategy::PatternCycle { .. }));
        assert_eq!(strategy.back(), None);
    }
}
