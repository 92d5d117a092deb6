// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers: boxes, time ranges, and linear bounds.

use core::ops::RangeInclusive;

use glam::Vec3;

/// Axis-aligned bounding box in 3D.
///
/// The default value is [`Aabb3::EMPTY`], the identity for [`Aabb3::merge`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub lower: Vec3,
    /// Maximum corner.
    pub upper: Vec3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb3 {
    /// Inverted box that any merge overwrites.
    pub const EMPTY: Self = Self {
        lower: Vec3::INFINITY,
        upper: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from min/max corners.
    pub const fn new(lower: Vec3, upper: Vec3) -> Self {
        Self { lower, upper }
    }

    /// Degenerate box around a single point.
    pub const fn from_point(p: Vec3) -> Self {
        Self { lower: p, upper: p }
    }

    /// Grow this box to contain `other`.
    #[inline]
    pub fn extend(&mut self, other: &Self) {
        self.lower = self.lower.min(other.lower);
        self.upper = self.upper.max(other.upper);
    }

    /// Grow this box to contain the point.
    #[inline]
    pub fn extend_point(&mut self, p: Vec3) {
        self.lower = self.lower.min(p);
        self.upper = self.upper.max(p);
    }

    /// The union of two AABBs.
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Grow the box by `r` on every side.
    #[inline]
    pub fn enlarge(self, r: f32) -> Self {
        Self {
            lower: self.lower - Vec3::splat(r),
            upper: self.upper + Vec3::splat(r),
        }
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.upper - self.lower
    }

    /// Midpoint of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        0.5 * (self.lower + self.upper)
    }

    /// Return true if the box is inverted on any axis. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        self.upper.cmplt(self.lower).any()
    }

    /// Whether `other` lies entirely inside this box (boundaries included).
    pub fn contains(&self, other: &Self) -> bool {
        self.lower.cmple(other.lower).all() && other.upper.cmple(self.upper).all()
    }

    /// Whether this box contains the point.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.lower.cmple(p).all() && p.cmple(self.upper).all()
    }

    /// Corner-wise linear interpolation between two boxes.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            lower: self.lower.lerp(other.lower, t),
            upper: self.upper.lerp(other.upper, t),
        }
    }

    /// Half of the box surface area, the usual SAH weight.
    pub fn half_area(&self) -> f32 {
        let d = self.size().max(Vec3::ZERO);
        d.x * d.y + d.y * d.z + d.z * d.x
    }
}

/// Normalized shutter interval, with `0.0` the first and `1.0` the last time step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeRange {
    /// Start of the interval.
    pub lower: f32,
    /// End of the interval.
    pub upper: f32,
}

impl TimeRange {
    /// The whole shutter interval.
    pub const FULL: Self = Self {
        lower: 0.0,
        upper: 1.0,
    };

    /// Create a time range. `lower <= upper` is expected.
    pub const fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Length of the interval.
    pub fn size(&self) -> f32 {
        self.upper - self.lower
    }

    /// Inclusive range of time steps touched by this interval when the shutter
    /// is divided into `num_segments` equal time segments.
    pub fn step_range(&self, num_segments: usize) -> RangeInclusive<usize> {
        if num_segments == 0 {
            return 0..=0;
        }
        let n = num_segments as f32;
        let lo = libm::floorf(self.lower * n).max(0.0);
        let hi = libm::ceilf(self.upper * n).min(n);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "Both values are clamped to [0, num_segments] above."
        )]
        let (lo, hi) = (lo as usize, hi as usize);
        lo.min(hi)..=hi
    }
}

/// A pair of boxes bounding a primitive at the start and end of a time interval.
///
/// Linear interpolation between `bounds0` and `bounds1` contains the primitive
/// at every instant of the interval.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearBounds {
    /// Box at the start of the interval.
    pub bounds0: Aabb3,
    /// Box at the end of the interval.
    pub bounds1: Aabb3,
}

impl LinearBounds {
    /// Linear bounds from two end boxes.
    pub const fn new(bounds0: Aabb3, bounds1: Aabb3) -> Self {
        Self { bounds0, bounds1 }
    }

    /// Linear bounds that do not move.
    pub const fn constant(bounds: Aabb3) -> Self {
        Self {
            bounds0: bounds,
            bounds1: bounds,
        }
    }

    /// Box at normalized time `t` within the interval.
    pub fn interpolate(&self, t: f32) -> Aabb3 {
        self.bounds0.lerp(self.bounds1, t)
    }

    /// Box covering the whole interval.
    pub fn bounds(&self) -> Aabb3 {
        self.bounds0.merge(self.bounds1)
    }

    /// Fit linear bounds over `time_range` to boxes sampled at each time step.
    ///
    /// `sample(step)` must return the box at time step `step` for every step in
    /// `0..=num_segments`. The end boxes are interpolated from the bracketing
    /// samples, then pushed outwards until every interior sample lies inside the
    /// interpolated box at its time.
    pub fn fit<F>(mut sample: F, time_range: TimeRange, num_segments: usize) -> Self
    where
        F: FnMut(usize) -> Aabb3,
    {
        if num_segments == 0 {
            return Self::constant(sample(0));
        }
        let n = num_segments as f32;
        let lower = time_range.lower * n;
        let upper = time_range.upper * n;
        let steps = time_range.step_range(num_segments);
        let (ilower, iupper) = (*steps.start(), *steps.end());
        let ilower_f = ilower as f32;
        let iupper_f = iupper as f32;

        if iupper == ilower {
            return Self::constant(sample(ilower));
        }

        let blower0 = sample(ilower);
        let bupper1 = sample(iupper);
        if iupper - ilower == 1 {
            return Self {
                bounds0: blower0.lerp(bupper1, lower - ilower_f),
                bounds1: bupper1.lerp(blower0, iupper_f - upper),
            };
        }

        let blower1 = sample(ilower + 1);
        let bupper0 = sample(iupper - 1);
        let mut b0 = blower0.lerp(blower1, lower - ilower_f);
        let mut b1 = bupper1.lerp(bupper0, iupper_f - upper);

        let span = time_range.size();
        for i in (ilower + 1)..iupper {
            let f = if span > 0.0 {
                (i as f32 / n - time_range.lower) / span
            } else {
                0.0
            };
            let bt = b0.lerp(b1, f);
            let bi = sample(i);
            let dlower = (bi.lower - bt.lower).min(Vec3::ZERO);
            let dupper = (bi.upper - bt.upper).max(Vec3::ZERO);
            b0.lower += dlower;
            b1.lower += dlower;
            b0.upper += dupper;
            b1.upper += dupper;
        }
        Self {
            bounds0: b0,
            bounds1: b1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn unit_at(x: f32) -> Aabb3 {
        Aabb3::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
    }

    #[test]
    fn empty_is_merge_identity() {
        let b = unit_at(3.0);
        assert_eq!(Aabb3::EMPTY.merge(b), b);
        assert!(Aabb3::EMPTY.is_empty());
        assert!(!b.is_empty());
    }

    #[test]
    fn enlarge_grows_every_side() {
        let b = Aabb3::from_point(Vec3::ONE).enlarge(0.5);
        assert_eq!(b.lower, Vec3::splat(0.5));
        assert_eq!(b.upper, Vec3::splat(1.5));
        assert!(b.contains_point(Vec3::ONE));
    }

    #[test]
    fn step_range_covers_interval() {
        assert_eq!(TimeRange::FULL.step_range(4), 0..=4);
        assert_eq!(TimeRange::new(0.3, 0.6).step_range(4), 1..=3);
        assert_eq!(TimeRange::new(0.5, 0.5).step_range(4), 2..=2);
        assert_eq!(TimeRange::FULL.step_range(0), 0..=0);
    }

    #[test]
    fn fit_single_segment_interpolates_ends() {
        let samples = [unit_at(0.0), unit_at(4.0)];
        let lb = LinearBounds::fit(|i| samples[i], TimeRange::new(0.25, 0.75), 1);
        assert_eq!(lb.bounds0, unit_at(1.0));
        assert_eq!(lb.bounds1, unit_at(3.0));
    }

    #[test]
    fn fit_contains_interior_samples() {
        // Box moves right and then back, so a plain lerp of the ends misses the middle.
        let samples = vec![unit_at(0.0), unit_at(10.0), unit_at(0.0)];
        let lb = LinearBounds::fit(|i| samples[i], TimeRange::FULL, 2);
        assert!(lb.interpolate(0.5).contains(&samples[1]));
        assert!(lb.interpolate(0.0).contains(&samples[0]));
        assert!(lb.interpolate(1.0).contains(&samples[2]));
    }

    #[test]
    fn fit_without_motion_is_constant() {
        let lb = LinearBounds::fit(|_| unit_at(2.0), TimeRange::FULL, 0);
        assert_eq!(lb, LinearBounds::constant(unit_at(2.0)));
    }
}
