use super::{EdgeInsets, Point, Size};

/// An axis-aligned rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Width and height.
    pub size: Size,
}

impl Rect {
    /// Construct a rectangle from coordinates and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// A zero rectangle at the origin.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Construct from an origin and a size.
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// The smallest rectangle enclosing every point. Returns `None` for an
    /// empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in it {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Left edge.
    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    /// Top edge.
    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// Centre point.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Does this rect have a zero or negative size?
    pub fn is_empty(&self) -> bool {
        self.size.width <= 0.0 || self.size.height <= 0.0
    }

    /// The four corners, clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    /// Does this rectangle contain the point? The top and left edges are
    /// inside, the bottom and right edges are outside.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }

    /// Does this rectangle completely enclose the other?
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.min_x() >= self.min_x()
            && other.min_y() >= self.min_y()
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Self) -> Self {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Do the rectangles share any point, including touching edges?
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    /// The overlapping region, if it has a positive area.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Translate by an offset.
    pub fn offset_by(&self, d: Point) -> Self {
        Self {
            origin: self.origin + d,
            size: self.size,
        }
    }

    /// Shrink by the given insets. Negative insets grow the rectangle.
    pub fn inset(&self, insets: EdgeInsets) -> Self {
        Self::new(
            self.origin.x + insets.left,
            self.origin.y + insets.top,
            self.size.width - insets.left - insets.right,
            self.size.height - insets.top - insets.bottom,
        )
    }

    /// Rebase a point so that it is relative to our origin.
    pub fn rebase(&self, p: Point) -> Point {
        p - self.origin
    }

    /// True if every edge is within `eps` of the other rectangle's.
    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        (self.min_x() - other.min_x()).abs() <= eps
            && (self.min_y() - other.min_y()).abs() <= eps
            && (self.max_x() - other.max_x()).abs() <= eps
            && (self.max_y() - other.max_y()).abs() <= eps
    }
}

impl From<(f32, f32, f32, f32)> for Rect {
    fn from(v: (f32, f32, f32, f32)) -> Self {
        Self::new(v.0, v.1, v.2, v.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_half_open() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(r.contains_point(Point::new(10.0, 10.0)));
        assert!(r.contains_point(Point::new(50.0, 30.0)));
        assert!(!r.contains_point(Point::new(110.0, 30.0)));
        assert!(!r.contains_point(Point::new(5.0, 30.0)));
    }

    #[test]
    fn union_and_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 15.0));
        assert_eq!(a.intersect(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn overlaps_counts_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 100.0);
        assert!(a.overlaps(&Rect::new(0.0, 100.0, 10.0, 200.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 100.5, 10.0, 200.0)));
    }

    #[test]
    fn negative_inset_grows() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let grown = r.inset(EdgeInsets::uniform(5.0).negated());
        assert_eq!(grown, Rect::new(-5.0, -5.0, 20.0, 20.0));
        assert_eq!(r.inset(EdgeInsets::uniform(2.0)), Rect::new(2.0, 2.0, 6.0, 6.0));
    }

    #[test]
    fn bounding_points() {
        assert_eq!(Rect::bounding([]), None);
        let r = Rect::bounding([Point::new(3.0, 1.0), Point::new(-1.0, 4.0)]);
        assert_eq!(r, Some(Rect::new(-1.0, 1.0, 4.0, 3.0)));
    }
}
