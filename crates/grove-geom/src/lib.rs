//! Geometry primitives used across grove.
//!
//! All coordinates are logical (density-independent) units stored as `f32`.
//! Rectangles are origin + size; transforms are column-major 4x4 matrices in
//! the layout used by the upstream renderer, so a matrix can be passed to the
//! native toolkit without reordering.

#![warn(missing_docs)]

/// Error types for geometry operations.
mod error;
/// Edge inset helpers.
mod insets;
/// 4x4 transform matrices.
mod matrix;
/// Point helpers.
mod point;
/// Rectangle operations.
mod rect;
/// Width/height size type.
mod size;

pub use error::{Error, Result};
pub use insets::EdgeInsets;
pub use matrix::{Matrix4, transform_around};
pub use point::Point;
pub use rect::Rect;
pub use size::Size;

/// Scroll or layout axis.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub enum Axis {
    /// Horizontal axis.
    Horizontal,
    /// Vertical axis.
    #[default]
    Vertical,
}

impl Axis {
    /// The component of `p` along this axis.
    pub fn of_point(self, p: Point) -> f32 {
        match self {
            Self::Horizontal => p.x,
            Self::Vertical => p.y,
        }
    }

    /// The extent of `s` along this axis.
    pub fn of_size(self, s: Size) -> f32 {
        match self {
            Self::Horizontal => s.width,
            Self::Vertical => s.height,
        }
    }

    /// Build a point that is `v` along this axis and zero on the other.
    pub fn point(self, v: f32) -> Point {
        match self {
            Self::Horizontal => Point::new(v, 0.0),
            Self::Vertical => Point::new(0.0, v),
        }
    }
}
