/// Per-edge distances. Used for hit slop, border widths and content insets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeInsets {
    /// Top edge.
    pub top: f32,
    /// Left edge.
    pub left: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Right edge.
    pub right: f32,
}

impl EdgeInsets {
    /// Construct insets from individual edges.
    pub const fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// The same inset on every edge.
    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// All-zero insets.
    pub const fn zero() -> Self {
        Self::uniform(0.0)
    }

    /// Insets with every edge negated.
    pub fn negated(&self) -> Self {
        Self::new(-self.top, -self.left, -self.bottom, -self.right)
    }

    /// Return true if every edge is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Edges as `[top, left, bottom, right]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.top, self.left, self.bottom, self.right]
    }
}
