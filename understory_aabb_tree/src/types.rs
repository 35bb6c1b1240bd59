// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: [`Volume`] and [`Plane`].

use glam::Vec3;

/// Axis-aligned bounding box in 3D.
///
/// `min <= max` holds componentwise for every volume built through the
/// constructors (checked in debug builds).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Volume {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Volume {
    /// Create a volume from its min/max corners.
    #[inline]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "volume min must not exceed max");
        Self { min, max }
    }

    /// Create a volume from a centre and non-negative half extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::from_min_max(center - half_extents, center + half_extents)
    }

    /// A degenerate volume covering a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// The smallest volume containing both `a` and `b`. Exact, no slack.
    #[inline]
    pub fn merge(a: &Self, b: &Self) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Separating-axis overlap test. Touching faces count as overlapping.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.min.cmpgt(other.max).any() || other.min.cmpgt(self.max).any())
    }

    /// Whether `other` lies entirely inside this volume (boundaries included).
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Whether the point lies inside this volume (boundaries included).
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Grow both corners outward by `e`.
    #[must_use]
    #[inline]
    pub fn expand(&self, e: Vec3) -> Self {
        Self {
            min: self.min - e,
            max: self.max + e,
        }
    }

    /// Grow both corners outward by `margin` on every axis.
    #[must_use]
    #[inline]
    pub fn expand_uniform(&self, margin: f32) -> Self {
        self.expand(Vec3::splat(margin))
    }

    /// Grow only the corner lying in the direction of `e` on each axis.
    ///
    /// A positive component moves `max` up, a negative one moves `min` down,
    /// zero leaves the axis untouched.
    #[must_use]
    #[inline]
    pub fn signed_expand(&self, e: Vec3) -> Self {
        Self {
            min: Vec3::select(e.cmplt(Vec3::ZERO), self.min + e, self.min),
            max: Vec3::select(e.cmpgt(Vec3::ZERO), self.max + e, self.max),
        }
    }

    /// Sum of absolute differences of the two centres.
    ///
    /// A cheap ranking metric for picking the closer of two candidates; it is
    /// not a surface-area cost.
    #[inline]
    pub fn proximity(a: &Self, b: &Self) -> f32 {
        (a.center() - b.center()).abs().element_sum()
    }

    /// Centre point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size on each axis.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Size on each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index (0, 1 or 2) of the axis with the largest extent. Ties prefer the lower axis.
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// The corner with the smallest signed distance along `normal`.
    ///
    /// Picked per axis from the sign of the normal instead of testing all
    /// eight corners.
    #[inline]
    pub fn nearest_corner(&self, normal: Vec3) -> Vec3 {
        Vec3::select(normal.cmpge(Vec3::ZERO), self.min, self.max)
    }

    /// Whether the whole volume lies strictly on the positive side of `plane`.
    #[inline]
    pub fn is_on_positive_side(&self, plane: &Plane) -> bool {
        plane.signed_distance(self.nearest_corner(plane.normal)) > 0.0
    }
}

/// A plane `normal · p + distance = 0`.
///
/// Points with a positive signed distance are on the positive side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Plane normal. Need not be unit length; distances scale with it.
    pub normal: Vec3,
    /// Constant term of the plane equation.
    pub distance: f32,
}

impl Plane {
    /// Create a plane from its normal and constant term.
    pub const fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Create the plane through `point` with the given normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Signed distance from the plane to `p` (scaled by the normal's length).
    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.distance
    }
}
