//! Utility types, used throughout the crate.

use crate::DVec2;

/// Rotate `v` counter-clockwise (in a y-up sense) by `angle` radians.
///
/// The single rotation convention of the crate - the camera, the culler, and the cards all go
/// through this so that they can never disagree.
#[must_use]
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    use cgmath::{Rotation, Rotation2};
    cgmath::Basis2::from_angle(cgmath::Rad(angle)).rotate_vector(v)
}

/// An axis-aligned rectangle in some `f64` space.
///
/// The default value is *empty* (inverted bounds), which is the identity for [`Rect::union`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}
impl Default for Rect {
    fn default() -> Self {
        Self::EMPTY
    }
}
impl Rect {
    pub const EMPTY: Self = Self {
        min: DVec2 {
            x: f64::INFINITY,
            y: f64::INFINITY,
        },
        max: DVec2 {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        },
    };
    #[must_use]
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }
    /// Rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: DVec2, size: DVec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }
    /// Smallest rect containing every point. Empty if there are none.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Self {
        points
            .into_iter()
            .fold(Self::EMPTY, |rect, point| rect.including(point))
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        // NaN compares false and so is considered empty too.
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }
    #[must_use = "returns a new rect without modifying `self`"]
    pub fn including(self, point: DVec2) -> Self {
        Self {
            min: DVec2::new(self.min.x.min(point.x), self.min.y.min(point.y)),
            max: DVec2::new(self.max.x.max(point.x), self.max.y.max(point.y)),
        }
    }
    #[must_use = "returns a new rect without modifying `self`"]
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        self.including(other.min).including(other.max)
    }
    #[must_use = "returns a new rect without modifying `self`"]
    pub fn translated(self, by: DVec2) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }
    /// Grow each edge outward by `margin`.
    #[must_use = "returns a new rect without modifying `self`"]
    pub fn expanded(self, margin: f64) -> Self {
        let margin = DVec2::new(margin, margin);
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }
    /// Closed-interval overlap. Touching edges count as intersecting, empty rects never intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
    #[must_use]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }
    #[must_use]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }
    /// Half the width and height.
    #[must_use]
    pub fn half_extent(&self) -> DVec2 {
        self.size() / 2.0
    }
}

#[cfg(test)]
mod test {
    use super::{rotate, Rect};
    use crate::DVec2;

    #[test]
    fn empty_is_union_identity() {
        let r = Rect::new(DVec2::new(-1.0, 2.0), DVec2::new(3.0, 4.0));
        assert_eq!(Rect::EMPTY.union(r), r);
        assert_eq!(r.union(Rect::EMPTY), r);
        assert!(Rect::default().is_empty());
        assert!(Rect::from_points([]).is_empty());
    }
    #[test]
    fn touching_edges_intersect() {
        let a = Rect::new(DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0));
        let b = Rect::new(DVec2::new(1.0, 0.5), DVec2::new(2.0, 2.0));
        let c = Rect::new(DVec2::new(1.5, 0.0), DVec2::new(2.0, 2.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&Rect::EMPTY));
    }
    #[test]
    fn rotate_quarter_turn() {
        let v = rotate(DVec2::new(1.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert!((v.x).abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }
}
