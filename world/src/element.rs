use maze_pages_core::{Kind, Point, Representation, Theme};
use maze_pages_system_movement::MovementStrategy;

/// Positioned, drawable entity of the level.
///
/// Dynamic obstacles additionally own the strategy that moves them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    kind: Kind,
    point: Point,
    representation: Representation,
    motion: Option<MovementStrategy>,
}

impl Element {
    /// Creates an element of `kind` drawn with the theme's representation.
    ///
    /// Dynamic obstacles receive the intelligent direction-seeking strategy.
    #[must_use]
    pub fn create(kind: Kind, point: Point, theme: &Theme) -> Self {
        let motion = (kind == Kind::DynamicObstacle).then(MovementStrategy::intelligent);
        Self {
            kind,
            point,
            representation: theme.representation_of(kind),
            motion,
        }
    }

    /// Creates a dynamic obstacle driven by an explicit strategy.
    #[must_use]
    pub fn dynamic_obstacle(
        point: Point,
        representation: Representation,
        strategy: MovementStrategy,
    ) -> Self {
        Self {
            kind: Kind::DynamicObstacle,
            point,
            representation,
            motion: Some(strategy),
        }
    }

    /// Kind of the element.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Cell the element occupies.
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// How the element is drawn.
    #[must_use]
    pub const fn representation(&self) -> Representation {
        self.representation
    }

    /// Movement strategy, present only on dynamic obstacles.
    #[must_use]
    pub const fn motion(&self) -> Option<&MovementStrategy> {
        self.motion.as_ref()
    }

    pub(crate) fn motion_mut(&mut self) -> Option<&mut MovementStrategy> {
        self.motion.as_mut()
    }

    pub(crate) fn set_point(&mut self, point: Point) {
        self.point = point;
    }

    pub(crate) fn set_representation(&mut self, representation: Representation) {
        self.representation = representation;
    }
}
