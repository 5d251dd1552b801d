use std::ops::Mul;

use super::{Error, Point, Rect, Result};

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-6;

/// A 4x4 transform in column-major order, matching the renderer's layout:
/// translation lives in elements 12, 13 and 14.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// Matrix elements, column-major.
    m: [f32; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Build from column-major elements.
    pub const fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// The column-major elements.
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.m
    }

    /// A pure 2D translation.
    pub fn translation(tx: f32, ty: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.m[12] = tx;
        m.m[13] = ty;
        m
    }

    /// A pure 2D scale.
    pub fn scale(sx: f32, sy: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.m[0] = sx;
        m.m[5] = sy;
        m
    }

    /// Rotation about the Z axis, in radians. Positive angles rotate +x
    /// towards +y.
    pub fn rotation_z(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let mut m = Self::IDENTITY;
        m.m[0] = cos;
        m.m[1] = sin;
        m.m[4] = -sin;
        m.m[5] = cos;
        m
    }

    /// Return true if this is exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The 2D translation component.
    pub fn translation_part(&self) -> (f32, f32) {
        (self.m[12], self.m[13])
    }

    /// Copy of this matrix with the translation multiplied by `factor`. Used to
    /// convert logical translations to physical pixels.
    pub fn with_scaled_translation(&self, factor: f32) -> Self {
        let mut m = *self;
        m.m[12] *= factor;
        m.m[13] *= factor;
        m.m[14] *= factor;
        m
    }

    /// Apply `self` first, then `next`.
    pub fn then(&self, next: &Self) -> Self {
        *next * *self
    }

    /// Map a point in the z = 0 plane, with perspective division.
    pub fn transform_point(&self, p: Point) -> Point {
        let m = &self.m;
        let x = m[0] * p.x + m[4] * p.y + m[12];
        let y = m[1] * p.x + m[5] * p.y + m[13];
        let w = m[3] * p.x + m[7] * p.y + m[15];
        if w != 0.0 && w != 1.0 {
            Point::new(x / w, y / w)
        } else {
            Point::new(x, y)
        }
    }

    /// Inverse of the 2D affine part of this matrix. Perspective terms are
    /// ignored.
    pub fn inverse_affine(&self) -> Result<Self> {
        let m = &self.m;
        let (a, b, c, d, tx, ty) = (m[0], m[1], m[4], m[5], m[12], m[13]);
        let det = a * d - b * c;
        if det.abs() < SINGULAR_EPSILON {
            return Err(Error::Singular);
        }
        let ia = d / det;
        let ib = -b / det;
        let ic = -c / det;
        let id = a / det;
        let mut out = Self::IDENTITY;
        out.m[0] = ia;
        out.m[1] = ib;
        out.m[4] = ic;
        out.m[5] = id;
        out.m[12] = -(ia * tx + ic * ty);
        out.m[13] = -(ib * tx + id * ty);
        Ok(out)
    }

    /// Map a point through this transform applied around `center`.
    pub fn transform_point_around(&self, p: Point, center: Point) -> Point {
        self.transform_point(p - center) + center
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.m[k * 4 + row] * rhs.m[col * 4 + k];
                }
                out[col * 4 + row] = acc;
            }
        }
        Self { m: out }
    }
}

/// Transform `rect` by `m` applied around `center`, returning the axis-aligned
/// bounds of the four transformed corners. A rotated rectangle therefore maps
/// to a larger box than its untransformed origin/size would suggest.
pub fn transform_around(rect: Rect, center: Point, m: &Matrix4) -> Rect {
    if m.is_identity() {
        return rect;
    }
    let corners = rect.corners().map(|c| m.transform_point_around(c, center));
    // Four corners always produce a rectangle.
    Rect::bounding(corners).unwrap_or(rect)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;
    use std::f32::consts::FRAC_PI_4;

    use proptest::prelude::*;

    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn translate_then_scale() {
        let m = Matrix4::translation(10.0, 0.0).then(&Matrix4::scale(2.0, 2.0));
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(22.0, 2.0));
    }

    #[test]
    fn rotation_about_center_keeps_square() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let out = transform_around(r, r.center(), &Matrix4::rotation_z(FRAC_PI_2));
        assert!(out.approx_eq(&r, EPS), "{out:?}");
    }

    #[test]
    fn rotation_grows_bounds() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let out = transform_around(r, r.center(), &Matrix4::rotation_z(FRAC_PI_4));
        let half_diag = 50.0f32.sqrt();
        let expected = Rect::new(5.0 - half_diag, 5.0 - half_diag, half_diag * 2.0, half_diag * 2.0);
        assert!(out.approx_eq(&expected, EPS), "{out:?}");
    }

    #[test]
    fn scale_around_center() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let out = transform_around(r, r.center(), &Matrix4::scale(2.0, 0.5));
        assert!(out.approx_eq(&Rect::new(0.0, 15.0, 40.0, 10.0), EPS));
    }

    #[test]
    fn singular_has_no_inverse() {
        assert_eq!(
            Matrix4::scale(0.0, 1.0).inverse_affine(),
            Err(Error::Singular)
        );
    }

    proptest! {
        #[test]
        fn inverse_round_trips(
            tx in -100.0f32..100.0,
            ty in -100.0f32..100.0,
            angle in -3.0f32..3.0,
            s in 0.25f32..4.0,
            px in -50.0f32..50.0,
            py in -50.0f32..50.0,
        ) {
            let m = Matrix4::scale(s, s)
                .then(&Matrix4::rotation_z(angle))
                .then(&Matrix4::translation(tx, ty));
            let inv = m.inverse_affine().unwrap();
            let p = Point::new(px, py);
            let back = inv.transform_point(m.transform_point(p));
            prop_assert!(back.approx_eq(p, 0.01), "{back:?} != {p:?}");
        }

        #[test]
        fn bounds_enclose_every_corner(
            x in -100.0f32..100.0,
            y in -100.0f32..100.0,
            w in 0.0f32..200.0,
            h in 0.0f32..200.0,
            angle in -3.0f32..3.0,
        ) {
            let r = Rect::new(x, y, w, h);
            let m = Matrix4::rotation_z(angle);
            let out = transform_around(r, r.center(), &m);
            for c in r.corners() {
                let mapped = m.transform_point_around(c, r.center());
                let grown = out.inset(grove_insets(EPS));
                prop_assert!(grown.contains_rect(&Rect::from_origin_size(mapped, Default::default())));
            }
        }

        #[test]
        fn identity_is_noop(x in -100.0f32..100.0, y in -100.0f32..100.0, w in 0.0f32..50.0) {
            let r = Rect::new(x, y, w, w);
            prop_assert_eq!(transform_around(r, Point::zero(), &Matrix4::IDENTITY), r);
        }
    }

    /// Insets that grow a rect by `eps` on every side.
    fn grove_insets(eps: f32) -> crate::EdgeInsets {
        crate::EdgeInsets::uniform(eps).negated()
    }
}
