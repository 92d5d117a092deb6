// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strand Geometry: time-sampled line-segment curves for BVH construction.
//!
//! Strand Geometry is the data model consumed by the leaf builder in `strand_build`.
//!
//! - Bind a segment index buffer and one vertex buffer (position + radius) per time step.
//! - Query per-segment boxes at any time step, check validity, and fit linear
//!   (motion-blur) bounds over a shutter interval.
//! - Register geometries in a [`Scene`] and produce [`PrimRef`] arrays for the builder.
//!
//! Segment `i` spans vertices `segment(i)` and `segment(i) + 1`. Boxes are
//! conservative: both endpoints are merged and the box is grown by the larger
//! radius on every axis.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use strand_geometry::{CurveGeometry, Scene, TimeRange, Vertex};
//!
//! // One strand of two segments, sampled at two time steps.
//! let step0 = vec![
//!     Vertex::new(Vec3::new(0.0, 0.0, 0.0), 0.1),
//!     Vertex::new(Vec3::new(0.0, 1.0, 0.0), 0.1),
//!     Vertex::new(Vec3::new(0.0, 2.0, 0.0), 0.05),
//! ];
//! let step1: Vec<_> = step0
//!     .iter()
//!     .map(|v| Vertex::new(v.position + Vec3::X, v.radius))
//!     .collect();
//! let strand = CurveGeometry::from_buffers(vec![0, 1], vec![step0, step1]).unwrap();
//! assert!(strand.valid(1, 0..=1));
//!
//! // Motion bounds over the whole shutter.
//! let lb = strand.linear_bounds(0, TimeRange::FULL).unwrap();
//! assert!(lb.bounds1.lower.x > lb.bounds0.lower.x);
//!
//! // Build references for every valid segment.
//! let mut scene = Scene::new();
//! scene.add(strand);
//! let (refs, bounds) = scene.prim_refs();
//! assert_eq!(refs.len(), 2);
//! assert!(bounds.contains(&refs[1].bounds));
//! ```
//!
//! ### Float semantics
//!
//! Non-finite vertex data is not an error at query time: [`CurveGeometry::valid`]
//! reports it, and builders are expected to drop such primitives before they
//! reach any box arithmetic. [`CurveGeometry::verify`] reports the first
//! offending buffer entry as a [`GeometryError`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod curves;
pub mod error;
pub mod scene;
pub mod types;

pub use curves::{CurveGeometry, StrandFlags, Vertex};
pub use error::GeometryError;
pub use scene::{GeometryLookup, PrimRef, Scene};
pub use types::{Aabb3, LinearBounds, TimeRange};
