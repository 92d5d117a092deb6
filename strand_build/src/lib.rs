// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strand Build: compact BVH leaves for line-segment curves.
//!
//! Strand Build turns small groups of curve primitives into packed leaf
//! records and provides the split of last resort for the tree builder.
//!
//! - [`frame`]: deterministic aligned frames along a representative strand.
//! - [`layouts`]: four leaf encodings behind [`LeafLayout`], selected by [`LeafKind`].
//! - [`LeafEncoder`]: sizes, allocates, and fills a leaf, then hands it to a [`BuildTree`].
//! - [`FallbackSplit`]: alternates references into two halves when spatial splits fail.
//!
//! The build driver itself (primary split heuristic, node layout, traversal)
//! lives elsewhere. It reaches this crate through [`BuildTree`],
//! [`LeafAllocator`], and [`GeometryLookup`](strand_geometry::GeometryLookup).
//!
//! ## Choosing a layout
//!
//! | [`LeafKind`] | Name | Bytes per primitive (full block of 8) | Box precision |
//! |---|---|---|---|
//! | [`LeafKind::Full`] | `full` | 56.1 | `f32` per-primitive frame |
//! | [`LeafKind::SharedTransform`] | `shared` | 20.5 | `u8` in one block frame |
//! | [`LeafKind::Compressed`] | `compressed` | 32.1 | `i16` in an `i8` per-primitive frame |
//! | [`LeafKind::AabbArray`] | `aabb` | 56.25 (blocks of 4) | `f32` per-primitive frame |
//!
//! Every layout rounds boxes outward: decoding a primitive and mapping its
//! geometry by [`DecodedPrimitive::map_point`] always lands inside the decoded box.
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use strand_build::{HeapAllocator, LeafConfig, LeafEncoder, LeafKind, LeafList};
//! use strand_geometry::{CurveGeometry, Scene, Vertex};
//!
//! let vertices = vec![
//!     Vertex::new(Vec3::ZERO, 0.1),
//!     Vertex::new(Vec3::Y, 0.1),
//!     Vertex::new(Vec3::new(0.5, 2.0, 0.0), 0.05),
//! ];
//! let mut scene = Scene::new();
//! scene.add(CurveGeometry::from_buffers(vec![0, 1], vec![vertices]).unwrap());
//! let (prims, _) = scene.prim_refs();
//!
//! let encoder = LeafEncoder::new(&LeafConfig::new(LeafKind::Compressed)).unwrap();
//! let alloc = HeapAllocator::new();
//! let mut leaves = LeafList::new(&scene);
//! let leaf = encoder.create_leaf(&mut leaves, &prims, 0..prims.len(), &alloc);
//!
//! let decoded = leaves.get(leaf).unwrap().decode();
//! assert_eq!(decoded.len(), 2);
//! assert_eq!(alloc.allocated(), encoder.bytes(2));
//! ```
//!
//! This crate is `no_std` and uses `alloc`. Diagnostics go through the `log` facade.

#![no_std]

extern crate alloc;

pub mod config;
pub mod encoder;
pub mod fallback;
pub mod frame;
pub mod layouts;
pub mod quantize;
pub mod soa;

pub use config::{ConfigError, LeafConfig, LeafKind};
pub use encoder::{
    BuildTree, EncodedLeaf, HeapAllocator, LeafAllocator, LeafEncoder, LeafList, LeafRef,
    LeafStorage,
};
pub use fallback::{FallbackSplit, PrimRefBlock, PrimRefList};
pub use layouts::{DecodedPrimitive, LeafLayout, Layout};
