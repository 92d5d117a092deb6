// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while binding or verifying curve buffers.

use thiserror::Error;

/// Failure to bind or verify a [`CurveGeometry`](crate::CurveGeometry) buffer.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    /// A geometry needs at least one time step.
    #[error("curve geometry needs at least one time step")]
    NoTimeSteps,
    /// A vertex buffer was bound to a time step the geometry does not have.
    #[error("time step {step} out of range (geometry has {steps} time steps)")]
    TimeStepOutOfRange {
        /// Requested time step.
        step: usize,
        /// Number of time steps of the geometry.
        steps: usize,
    },
    /// Vertex buffers of different time steps disagree in length.
    #[error("vertex buffer for time step {step} has {found} vertices, expected {expected}")]
    VertexCountMismatch {
        /// Offending time step.
        step: usize,
        /// Length of the offending buffer.
        found: usize,
        /// Length of the other bound buffers.
        expected: usize,
    },
    /// The flag buffer must hold exactly one entry per segment.
    #[error("flag buffer has {found} entries, expected one per segment ({expected})")]
    FlagCountMismatch {
        /// Length of the flag buffer.
        found: usize,
        /// Number of segments.
        expected: usize,
    },
    /// A segment starts at a vertex with no successor.
    #[error("segment {segment} starts at vertex {start} but only {vertices} vertices are bound")]
    SegmentOutOfRange {
        /// Segment index.
        segment: usize,
        /// First vertex of the segment.
        start: u32,
        /// Number of bound vertices.
        vertices: usize,
    },
    /// A vertex position or radius is NaN or infinite.
    #[error("vertex {vertex} at time step {step} is not finite")]
    NonFiniteVertex {
        /// Vertex index.
        vertex: usize,
        /// Time step.
        step: usize,
    },
    /// A vertex radius is negative.
    #[error("vertex {vertex} at time step {step} has a negative radius")]
    NegativeRadius {
        /// Vertex index.
        vertex: usize,
        /// Time step.
        step: usize,
    },
}
