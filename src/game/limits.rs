//! Movement Limits
//!
//! Axis-aligned boundaries a body's edges may not cross. Shared by
//! constrained enemy movement and the player's blink special.
//!
//! Each edge is optional; an open edge never blocks movement.

use crate::config::LimitFractions;
use crate::core::geometry::RectBounds;
use crate::core::vec2::Vec2;
use crate::game::physics::Body;

/// Per-axis optional boundaries in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Limits {
    /// Left edge
    pub x_min: Option<f64>,
    /// Right edge
    pub x_max: Option<f64>,
    /// Top edge
    pub y_min: Option<f64>,
    /// Bottom edge
    pub y_max: Option<f64>,
}

impl Limits {
    /// No boundaries at all.
    pub const UNBOUNDED: Limits = Limits { x_min: None, x_max: None, y_min: None, y_max: None };

    /// Closed limits matching a rectangle.
    pub fn from_rect(rect: RectBounds) -> Self {
        Self {
            x_min: Some(rect.x_min),
            x_max: Some(rect.x_max),
            y_min: Some(rect.y_min),
            y_max: Some(rect.y_max),
        }
    }

    /// Scale viewport fractions to world coordinates.
    pub fn from_fractions(fractions: &LimitFractions, width: f64, height: f64) -> Self {
        Self {
            x_min: fractions.x_min.map(|f| f * width),
            x_max: fractions.x_max.map(|f| f * width),
            y_min: fractions.y_min.map(|f| f * height),
            y_max: fractions.y_max.map(|f| f * height),
        }
    }

    /// Whether every edge is open.
    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }
}

/// Outcome of checking one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisCheck {
    /// The full displacement fits
    pub possible: bool,
    /// Signed distance to the edge in the direction of travel, if bounded
    pub rem: Option<f64>,
}

impl AxisCheck {
    const FREE: AxisCheck = AxisCheck { possible: true, rem: None };
}

fn check_axis(position: f64, half: f64, delta: f64, min: Option<f64>, max: Option<f64>) -> AxisCheck {
    if delta < 0.0 {
        match min {
            Some(min) => {
                let rem = -(position - half - min);
                AxisCheck { possible: delta >= rem, rem: Some(rem) }
            }
            None => AxisCheck::FREE,
        }
    } else if delta > 0.0 {
        match max {
            Some(max) => {
                let rem = max - (position + half);
                AxisCheck { possible: delta <= rem, rem: Some(rem) }
            }
            None => AxisCheck::FREE,
        }
    } else {
        AxisCheck::FREE
    }
}

/// Check whether moving `body` by `dx` keeps its edges inside the X limits.
pub fn check_x_movement_possible(body: &Body, dx: f64, limits: &Limits) -> AxisCheck {
    check_axis(body.position.x, body.half_size.x, dx, limits.x_min, limits.x_max)
}

/// Check whether moving `body` by `dy` keeps its edges inside the Y limits.
pub fn check_y_movement_possible(body: &Body, dy: f64, limits: &Limits) -> AxisCheck {
    check_axis(body.position.y, body.half_size.y, dy, limits.y_min, limits.y_max)
}

/// How `move_within_limits` treats a displacement that fits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveMode {
    /// The displacement comes from the body's velocity; physics applies it
    Velocity,
    /// Apply the displacement to the position right away
    Teleport,
}

/// Which axes may carry out their displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisMoves {
    /// X displacement fits
    pub x: bool,
    /// Y displacement fits
    pub y: bool,
}

/// Move a body by `delta` without crossing `limits`, each axis on its own.
///
/// A blocked axis snaps the body flush against the boundary it would have
/// crossed. With `MoveMode::Teleport`, axes that fit are moved by their
/// full displacement.
pub fn move_within_limits(body: &mut Body, limits: &Limits, delta: Vec2, mode: MoveMode) -> AxisMoves {
    let x = check_x_movement_possible(body, delta.x, limits);
    let y = check_y_movement_possible(body, delta.y, limits);

    body.position.x += axis_shift(x, delta.x, mode);
    body.position.y += axis_shift(y, delta.y, mode);

    AxisMoves { x: x.possible, y: y.possible }
}

fn axis_shift(check: AxisCheck, delta: f64, mode: MoveMode) -> f64 {
    match (check.possible, check.rem, mode) {
        (false, Some(rem), _) => rem,
        (true, _, MoveMode::Teleport) => delta,
        _ => 0.0,
    }
}
