//! Balloon placement geometry

use std::fmt;
use std::rc::Rc;

/// Distance between the target edge and the balloon, taken by the arrow
pub const ARROW_VERTICAL_OFFSET: f64 = 10.0;

/// Distance between a side arrow and the balloon corner
pub const ARROW_HORIZONTAL_OFFSET: f64 = 20.0;

/// An axis-aligned rectangle in viewport coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.top >= self.top
            && other.left >= self.left
            && other.bottom() <= self.bottom()
            && other.right() <= self.right()
    }
}

/// Where the balloon sits relative to its target, and where its arrow points
///
/// The first half of each name is the target corner the balloon hangs
/// from; the second half is the arrow position on the balloon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BalloonPosition {
    SouthEastArrowNorth,
    SouthEastArrowNorthEast,
    SouthEastArrowNorthWest,
    NorthEastArrowSouth,
    NorthEastArrowSouthEast,
    NorthEastArrowSouthWest,
    NorthWestArrowSouth,
    NorthWestArrowSouthWest,
    NorthWestArrowSouthEast,
    SouthWestArrowNorth,
    SouthWestArrowNorthWest,
    SouthWestArrowNorthEast,
}

#[derive(Clone, Copy)]
enum Arrow {
    Center,
    East,
    West,
}

/// A computed balloon location
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub top: f64,
    pub left: f64,
    pub position: BalloonPosition,
}

impl BalloonPosition {
    pub const ALL: [BalloonPosition; 12] = [
        Self::SouthEastArrowNorth,
        Self::SouthEastArrowNorthEast,
        Self::SouthEastArrowNorthWest,
        Self::NorthEastArrowSouth,
        Self::NorthEastArrowSouthEast,
        Self::NorthEastArrowSouthWest,
        Self::NorthWestArrowSouth,
        Self::NorthWestArrowSouthWest,
        Self::NorthWestArrowSouthEast,
        Self::SouthWestArrowNorth,
        Self::SouthWestArrowNorthWest,
        Self::SouthWestArrowNorthEast,
    ];

    /// Candidates for a toolbar following a selection, best first
    pub fn for_selection(backward: bool) -> [BalloonPosition; 6] {
        if backward {
            [
                Self::NorthWestArrowSouth,
                Self::NorthWestArrowSouthWest,
                Self::NorthWestArrowSouthEast,
                Self::SouthWestArrowNorth,
                Self::SouthWestArrowNorthWest,
                Self::SouthWestArrowNorthEast,
            ]
        } else {
            [
                Self::SouthEastArrowNorth,
                Self::SouthEastArrowNorthEast,
                Self::SouthEastArrowNorthWest,
                Self::NorthEastArrowSouth,
                Self::NorthEastArrowSouthEast,
                Self::NorthEastArrowSouthWest,
            ]
        }
    }

    /// Balloon below the target
    fn is_south(self) -> bool {
        matches!(
            self,
            Self::SouthEastArrowNorth
                | Self::SouthEastArrowNorthEast
                | Self::SouthEastArrowNorthWest
                | Self::SouthWestArrowNorth
                | Self::SouthWestArrowNorthWest
                | Self::SouthWestArrowNorthEast
        )
    }

    /// Anchored on the target's right edge
    fn is_east(self) -> bool {
        matches!(
            self,
            Self::SouthEastArrowNorth
                | Self::SouthEastArrowNorthEast
                | Self::SouthEastArrowNorthWest
                | Self::NorthEastArrowSouth
                | Self::NorthEastArrowSouthEast
                | Self::NorthEastArrowSouthWest
        )
    }

    fn arrow(self) -> Arrow {
        match self {
            Self::SouthEastArrowNorth
            | Self::NorthEastArrowSouth
            | Self::NorthWestArrowSouth
            | Self::SouthWestArrowNorth => Arrow::Center,
            Self::SouthEastArrowNorthEast
            | Self::NorthEastArrowSouthEast
            | Self::NorthWestArrowSouthEast
            | Self::SouthWestArrowNorthEast => Arrow::East,
            Self::SouthEastArrowNorthWest
            | Self::NorthEastArrowSouthWest
            | Self::NorthWestArrowSouthWest
            | Self::SouthWestArrowNorthWest => Arrow::West,
        }
    }

    /// Arrow class suffix, e.g. `arrow_nw`
    pub fn arrow_name(self) -> &'static str {
        match (self.is_south(), self.arrow()) {
            (true, Arrow::Center) => "arrow_n",
            (true, Arrow::East) => "arrow_ne",
            (true, Arrow::West) => "arrow_nw",
            (false, Arrow::Center) => "arrow_s",
            (false, Arrow::East) => "arrow_se",
            (false, Arrow::West) => "arrow_sw",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SouthEastArrowNorth => "southEastArrowNorth",
            Self::SouthEastArrowNorthEast => "southEastArrowNorthEast",
            Self::SouthEastArrowNorthWest => "southEastArrowNorthWest",
            Self::NorthEastArrowSouth => "northEastArrowSouth",
            Self::NorthEastArrowSouthEast => "northEastArrowSouthEast",
            Self::NorthEastArrowSouthWest => "northEastArrowSouthWest",
            Self::NorthWestArrowSouth => "northWestArrowSouth",
            Self::NorthWestArrowSouthWest => "northWestArrowSouthWest",
            Self::NorthWestArrowSouthEast => "northWestArrowSouthEast",
            Self::SouthWestArrowNorth => "southWestArrowNorth",
            Self::SouthWestArrowNorthWest => "southWestArrowNorthWest",
            Self::SouthWestArrowNorthEast => "southWestArrowNorthEast",
        }
    }

    /// Place a balloon of `balloon`'s size against `target`
    pub fn compute(self, target: &Rect, balloon: &Rect) -> Placement {
        let top = if self.is_south() {
            target.bottom() + ARROW_VERTICAL_OFFSET
        } else {
            target.top - balloon.height - ARROW_VERTICAL_OFFSET
        };
        let anchor = if self.is_east() {
            target.right()
        } else {
            target.left
        };
        let left = match self.arrow() {
            Arrow::Center => anchor - balloon.width / 2.0,
            Arrow::West => anchor - ARROW_HORIZONTAL_OFFSET,
            Arrow::East => anchor - balloon.width + ARROW_HORIZONTAL_OFFSET,
        };
        Placement {
            top,
            left,
            position: self,
        }
    }
}

/// Positioning request handed to the balloon
#[derive(Clone)]
pub struct PositionOptions {
    /// Re-evaluated on every placement so the balloon follows a moving target
    pub target: Rc<dyn Fn() -> Rect>,
    pub limiter: Option<Rect>,
    pub positions: Vec<BalloonPosition>,
}

impl PositionOptions {
    pub fn new<F>(target: F, positions: impl IntoIterator<Item = BalloonPosition>) -> Self
    where
        F: Fn() -> Rect + 'static,
    {
        Self {
            target: Rc::new(target),
            limiter: None,
            positions: positions.into_iter().collect(),
        }
    }

    pub fn with_limiter(mut self, limiter: Option<Rect>) -> Self {
        self.limiter = limiter;
        self
    }

    /// First candidate that fits the limiter, or the first candidate
    pub fn choose(&self, width: f64, height: f64) -> Placement {
        let target = (self.target)();
        let size = Rect::new(0.0, 0.0, width, height);
        let mut placements = self
            .positions
            .iter()
            .map(|position| position.compute(&target, &size));
        let first = placements.next();

        let fits = |placement: &Placement| match &self.limiter {
            Some(limiter) => limiter.contains(&Rect::new(placement.top, placement.left, width, height)),
            None => true,
        };
        match first {
            Some(first) if fits(&first) => first,
            Some(first) => placements.find(fits).unwrap_or(first),
            None => BalloonPosition::SouthEastArrowNorth.compute(&target, &size),
        }
    }
}

impl fmt::Debug for PositionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionOptions")
            .field("limiter", &self.limiter)
            .field("positions", &self.positions)
            .finish()
    }
}
