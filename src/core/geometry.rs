//! Geometry Helpers
//!
//! Polar decomposition and rectangle bounds.
//!
//! ## Angle Convention
//!
//! Degree 0 points "down" the screen (+Y), degree 90 points right (+X):
//!
//! ```text
//!            180°
//!             │
//!    270° ────┼──── 90°
//!             │
//!             0°
//! ```

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Convert degrees to radians.
#[inline]
pub fn degree_to_radian(degree: f64) -> f64 {
    degree * std::f64::consts::PI / 180.0
}

/// Split a distance travelled at `degree` into its X and Y parts.
///
/// `x = dist * sin(θ)`, `y = dist * cos(θ)`.
#[inline]
pub fn divide_dist_x_and_y(dist: f64, degree: f64) -> Vec2 {
    let angle = degree_to_radian(degree);
    Vec2::new(dist * angle.sin(), dist * angle.cos())
}

/// Axis-aligned rectangle given by its borders.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectBounds {
    /// Left border
    pub x_min: f64,
    /// Right border
    pub x_max: f64,
    /// Top border
    pub y_min: f64,
    /// Bottom border
    pub y_max: f64,
}

impl RectBounds {
    /// Borders of a rectangle whose top-left corner is `(x, y)`.
    pub fn from_origin(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x_min: x,
            x_max: x + width,
            y_min: y,
            y_max: y + height,
        }
    }

    /// Borders of a rectangle centred on `midpoint`.
    pub fn from_midpoint(midpoint: Vec2, width: f64, height: f64) -> Self {
        Self {
            x_min: midpoint.x - width / 2.0,
            x_max: midpoint.x + width / 2.0,
            y_min: midpoint.y - height / 2.0,
            y_max: midpoint.y + height / 2.0,
        }
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Fractional placement inside a viewport (`0.5, 0.5` is the centre).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Percentages {
    /// Fraction of the viewport width
    pub x: f64,
    /// Fraction of the viewport height
    pub y: f64,
}

/// Absolute position for a fractional placement.
#[inline]
pub fn position_from_percentages(percentages: Percentages, width: f64, height: f64) -> Vec2 {
    Vec2::new(percentages.x * width, percentages.y * height)
}
