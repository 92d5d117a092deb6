// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-segment curve geometry with per-time-step vertex buffers.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

use glam::{Mat3, Vec3};

use crate::error::GeometryError;
use crate::types::{Aabb3, LinearBounds, TimeRange};

/// A curve control vertex: position and radius travel together.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vertex {
    /// Position of the control point.
    pub position: Vec3,
    /// Radius of the strand at this control point.
    pub radius: f32,
}

impl Vertex {
    /// Create a vertex from a position and a radius.
    pub const fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    /// True if position and radius are all finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.radius.is_finite()
    }
}

bitflags::bitflags! {
    /// Per-segment strand boundary flags.
    ///
    /// Traversal uses them to suppress cap geometry where a strand continues
    /// into a neighboring segment.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StrandFlags: u8 {
        /// Segment is the first of its strand.
        const START = 0b0000_0001;
        /// Segment is the last of its strand.
        const END   = 0b0000_0010;
    }
}

/// An array of line segments ("hair strands") sampled at one or more time steps.
///
/// Segment `i` spans vertices `segment(i)` and `segment(i) + 1`. Every time
/// step holds the same number of vertices. Buffers are bound before a build
/// and are read-only while the build runs.
#[derive(Clone, Debug)]
pub struct CurveGeometry {
    segments: Vec<u32>,
    vertices: Vec<Vec<Vertex>>,
    flags: Option<Vec<StrandFlags>>,
    mask: u32,
}

impl CurveGeometry {
    /// Create an empty geometry with `num_time_steps` vertex buffers.
    pub fn new(num_time_steps: usize) -> Result<Self, GeometryError> {
        if num_time_steps == 0 {
            return Err(GeometryError::NoTimeSteps);
        }
        Ok(Self {
            segments: Vec::new(),
            vertices: vec![Vec::new(); num_time_steps],
            flags: None,
            mask: u32::MAX,
        })
    }

    /// Create a geometry from a segment buffer and one vertex buffer per time step.
    pub fn from_buffers(segments: Vec<u32>, steps: Vec<Vec<Vertex>>) -> Result<Self, GeometryError> {
        let mut geometry = Self::new(steps.len())?;
        geometry.set_segments(segments);
        for (step, buffer) in steps.into_iter().enumerate() {
            geometry.set_vertices(step, buffer)?;
        }
        Ok(geometry)
    }

    /// Bind the segment index buffer.
    pub fn set_segments(&mut self, segments: Vec<u32>) {
        self.segments = segments;
    }

    /// Bind the vertex buffer of time step `step`.
    ///
    /// Fails if the step does not exist or if another bound time step holds a
    /// different number of vertices.
    pub fn set_vertices(&mut self, step: usize, buffer: Vec<Vertex>) -> Result<(), GeometryError> {
        let steps = self.vertices.len();
        if step >= steps {
            return Err(GeometryError::TimeStepOutOfRange { step, steps });
        }
        if let Some(other) = self
            .vertices
            .iter()
            .enumerate()
            .find(|(s, v)| *s != step && !v.is_empty())
            .map(|(_, v)| v.len())
            && other != buffer.len()
        {
            return Err(GeometryError::VertexCountMismatch {
                step,
                found: buffer.len(),
                expected: other,
            });
        }
        self.vertices[step] = buffer;
        Ok(())
    }

    /// Bind the per-segment start/end flag buffer.
    pub fn set_flags(&mut self, flags: Vec<StrandFlags>) -> Result<(), GeometryError> {
        if flags.len() != self.segments.len() {
            return Err(GeometryError::FlagCountMismatch {
                found: flags.len(),
                expected: self.segments.len(),
            });
        }
        self.flags = Some(flags);
        Ok(())
    }

    /// Unbind the flag buffer.
    pub fn clear_flags(&mut self) {
        self.flags = None;
    }

    /// Set the ray mask of this geometry.
    pub fn set_mask(&mut self, mask: u32) {
        self.mask = mask;
    }

    /// Ray mask of this geometry.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if no segments are bound.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of vertices per time step.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices[0].len()
    }

    /// Number of time steps.
    #[inline]
    pub fn num_time_steps(&self) -> usize {
        self.vertices.len()
    }

    /// Number of time segments between consecutive time steps.
    #[inline]
    pub fn num_time_segments(&self) -> usize {
        self.vertices.len() - 1
    }

    /// The segment index buffer.
    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Vertex buffer of the first time step.
    #[inline]
    pub fn vertices0(&self) -> &[Vertex] {
        &self.vertices[0]
    }

    /// Vertex buffer of time step `step`.
    pub fn vertices(&self, step: usize) -> &[Vertex] {
        &self.vertices[step]
    }

    /// First vertex of segment `i`.
    #[inline]
    pub fn segment(&self, i: usize) -> u32 {
        self.segments[i]
    }

    /// Start/end flags of segment `i` moved into the top two bits of a mask.
    #[inline]
    pub fn start_end_mask(&self, i: usize) -> u32 {
        self.flags
            .as_ref()
            .map_or(0, |f| u32::from(f[i].bits() & 0x3) << 30)
    }

    /// Vertex `i` of the first time step.
    #[inline]
    pub fn vertex(&self, i: usize) -> Vertex {
        self.vertices[0][i]
    }

    /// Vertex `i` of time step `step`.
    #[inline]
    pub fn vertex_at(&self, i: usize, step: usize) -> Vertex {
        self.vertices[step][i]
    }

    /// Radius of vertex `i` at the first time step.
    #[inline]
    pub fn radius(&self, i: usize) -> f32 {
        self.vertices[0][i].radius
    }

    /// Radius of vertex `i` at time step `step`.
    #[inline]
    pub fn radius_at(&self, i: usize, step: usize) -> f32 {
        self.vertices[step][i].radius
    }

    /// Bounding box of segment `i` at the first time step.
    #[inline]
    pub fn bounds(&self, i: usize) -> Aabb3 {
        self.bounds_at(i, 0)
    }

    /// Bounding box of segment `i` at time step `step`.
    ///
    /// Both endpoints are merged and the box is grown by the larger of the two
    /// radii on every axis.
    pub fn bounds_at(&self, i: usize, step: usize) -> Aabb3 {
        let index = self.segment(i) as usize;
        let v0 = self.vertex_at(index, step);
        let v1 = self.vertex_at(index + 1, step);
        Aabb3::from_point(v0.position)
            .merge(Aabb3::from_point(v1.position))
            .enlarge(v0.radius.max(v1.radius))
    }

    /// Bounding box of segment `i` after mapping the first time step by `space`.
    ///
    /// `space` must be orthonormal (radii are not rescaled).
    pub fn bounds_in_space(&self, space: &Mat3, i: usize) -> Aabb3 {
        let index = self.segment(i) as usize;
        let v0 = self.vertex(index);
        let v1 = self.vertex(index + 1);
        Aabb3::from_point(*space * v0.position)
            .merge(Aabb3::from_point(*space * v1.position))
            .enlarge(v0.radius.max(v1.radius))
    }

    /// Bounding box of segment `i` in a normalized, scaled space.
    ///
    /// Points map to `space * ((p - offset) * scale)` and radii to
    /// `r * scale * radius_scale`, where `radius_scale` bounds the row lengths
    /// of `space`.
    pub fn bounds_scaled(
        &self,
        offset: Vec3,
        scale: f32,
        radius_scale: f32,
        space: &Mat3,
        i: usize,
    ) -> Aabb3 {
        let index = self.segment(i) as usize;
        let v0 = self.vertex(index);
        let v1 = self.vertex(index + 1);
        let p0 = *space * ((v0.position - offset) * scale);
        let p1 = *space * ((v1.position - offset) * scale);
        let r = v0.radius.max(v1.radius) * scale * radius_scale;
        Aabb3::from_point(p0).merge(Aabb3::from_point(p1)).enlarge(r)
    }

    /// Check segment `i` at a single time step.
    #[inline]
    pub fn valid_at(&self, i: usize, step: usize) -> bool {
        self.valid(i, step..=step)
    }

    /// Check segment `i` over an inclusive range of time steps.
    ///
    /// Fails if the segment has no second vertex, if either endpoint is not
    /// finite at any step in range, or if the smaller radius is negative.
    pub fn valid(&self, i: usize, steps: RangeInclusive<usize>) -> bool {
        let index = self.segment(i) as usize;
        if index + 1 >= self.num_vertices() {
            return false;
        }
        for step in steps {
            let v0 = self.vertex_at(index, step);
            let v1 = self.vertex_at(index + 1, step);
            if !v0.is_finite() || !v1.is_finite() {
                return false;
            }
            if v0.radius.min(v1.radius) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Build bounds of segment `i` at the first time step, if it is valid there.
    pub fn build_bounds(&self, i: usize) -> Option<Aabb3> {
        self.valid_at(i, 0).then(|| self.bounds(i))
    }

    /// Build bounds of segment `i` for time segment `segment`.
    ///
    /// The segment must be valid at both ends of the time segment; the box of
    /// the first end is returned.
    pub fn build_bounds_at(&self, i: usize, segment: usize) -> Option<Aabb3> {
        self.valid(i, segment..=segment + 1)
            .then(|| self.bounds_at(i, segment))
    }

    /// Boxes of segment `i` at both ends of time segment `segment`.
    pub fn linear_bounds_at(&self, i: usize, segment: usize) -> LinearBounds {
        LinearBounds::new(self.bounds_at(i, segment), self.bounds_at(i, segment + 1))
    }

    /// Linear bounds of segment `i` over `time_range`, if it is valid at every
    /// time step the range touches.
    pub fn linear_bounds(&self, i: usize, time_range: TimeRange) -> Option<LinearBounds> {
        let segments = self.num_time_segments();
        if !self.valid(i, time_range.step_range(segments)) {
            return None;
        }
        Some(LinearBounds::fit(
            |step| self.bounds_at(i, step),
            time_range,
            segments,
        ))
    }

    /// Value and derivative of segment `i` at parameter `u` in `[0, 1]`.
    pub fn interpolate(&self, i: usize, u: f32, step: usize) -> (Vertex, Vertex) {
        let index = self.segment(i) as usize;
        let v0 = self.vertex_at(index, step);
        let v1 = self.vertex_at(index + 1, step);
        let value = Vertex::new(
            v0.position.lerp(v1.position, u),
            v0.radius + (v1.radius - v0.radius) * u,
        );
        let derivative = Vertex::new(v1.position - v0.position, v1.radius - v0.radius);
        (value, derivative)
    }

    /// Check every bound buffer for consistency and finite data.
    pub fn verify(&self) -> Result<(), GeometryError> {
        let vertices = self.num_vertices();
        for (segment, &start) in self.segments.iter().enumerate() {
            if start as usize + 1 >= vertices {
                return Err(GeometryError::SegmentOutOfRange {
                    segment,
                    start,
                    vertices,
                });
            }
        }
        if let Some(flags) = &self.flags
            && flags.len() != self.segments.len()
        {
            return Err(GeometryError::FlagCountMismatch {
                found: flags.len(),
                expected: self.segments.len(),
            });
        }
        for (step, buffer) in self.vertices.iter().enumerate() {
            if buffer.len() != vertices {
                return Err(GeometryError::VertexCountMismatch {
                    step,
                    found: buffer.len(),
                    expected: vertices,
                });
            }
            for (vertex, v) in buffer.iter().enumerate() {
                if !v.is_finite() {
                    return Err(GeometryError::NonFiniteVertex { vertex, step });
                }
                if v.radius < 0.0 {
                    return Err(GeometryError::NegativeRadius { vertex, step });
                }
            }
        }
        Ok(())
    }
}
