//! Axis-separated bounding box collision against level walls.

use delve_core::Size;
use glam::Vec2;

use crate::level::Level;

/// Outcome of resolving a displacement one axis at a time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMove {
    /// Position after applying every permitted axis.
    pub position: Vec2,
    /// Whether the horizontal component was applied.
    pub x_allowed: bool,
    /// Whether the vertical component was applied.
    pub y_allowed: bool,
}

impl AxisMove {
    /// Reports whether the resolved position differs from `from`.
    #[must_use]
    pub fn moved_from(&self, from: Vec2) -> bool {
        self.position != from
    }
}

/// Four corners of the box anchored at `position`, clockwise from the upper left.
#[must_use]
pub fn corners(position: Vec2, size: Size) -> [Vec2; 4] {
    [
        position,
        position + Vec2::new(size.width, 0.0),
        position + size.as_vec2(),
        position + Vec2::new(0.0, size.height),
    ]
}

/// Reports whether a box of `size` may occupy `candidate`.
///
/// Movement is rejected when any corner lands on a wall.
#[must_use]
pub fn attempt_move(candidate: Vec2, size: Size, level: &Level) -> bool {
    corners(candidate, size)
        .into_iter()
        .all(|corner| level.is_walkable(corner))
}

/// Resolves a displacement from `current` toward `candidate`.
///
/// Both axes are tested against the same starting position so a blocked axis
/// never stops the free one. When both axes pass on their own but the
/// combined diagonal would clip a wall corner, only the horizontal component
/// is kept.
#[must_use]
pub fn resolve(current: Vec2, candidate: Vec2, size: Size, level: &Level) -> AxisMove {
    let horizontal = Vec2::new(candidate.x, current.y);
    let vertical = Vec2::new(current.x, candidate.y);

    let x_allowed = attempt_move(horizontal, size, level);
    let mut y_allowed = attempt_move(vertical, size, level);

    if x_allowed && y_allowed && !attempt_move(candidate, size, level) {
        y_allowed = false;
    }

    let position = Vec2::new(
        if x_allowed { candidate.x } else { current.x },
        if y_allowed { candidate.y } else { current.y },
    );

    AxisMove {
        position,
        x_allowed,
        y_allowed,
    }
}
