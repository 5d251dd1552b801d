use crate::geom::{Point, Rect, Size};

/// Writing direction supplied by the layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl LayoutDirection {
    /// Numeric code used for the native direction attribute.
    pub fn code(self) -> f32 {
        match self {
            Self::Ltr => 0.0,
            Self::Rtl => 1.0,
        }
    }
}

/// Output of the external layout pass for one instance. Applied verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Frame relative to the parent's content origin.
    pub frame: Rect,
    /// Physical pixels per logical unit.
    pub point_scale_factor: f32,
    /// Layout direction.
    pub direction: LayoutDirection,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            frame: Rect::zero(),
            point_scale_factor: 1.0,
            direction: LayoutDirection::Ltr,
        }
    }
}

impl LayoutMetrics {
    /// Metrics for a frame at scale 1, left to right.
    pub fn new(frame: impl Into<Rect>) -> Self {
        Self {
            frame: frame.into(),
            ..Default::default()
        }
    }

    /// Copy with a different point scale factor.
    pub fn with_scale(mut self, factor: f32) -> Self {
        self.point_scale_factor = factor;
        self
    }

    /// Copy with a different layout direction.
    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Frame origin in the parent's content coordinates.
    pub fn origin(&self) -> Point {
        self.frame.origin
    }

    /// Frame size.
    pub fn size(&self) -> Size {
        self.frame.size
    }
}
