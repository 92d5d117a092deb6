// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene registry, primitive references, and the geometry lookup seam used by builders.

use alloc::vec::Vec;

use crate::curves::CurveGeometry;
use crate::types::Aabb3;

/// Lightweight handle to one segment of one geometry, with its build bounds.
///
/// References never own geometry data; they name it by `(geom_id, prim_id)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrimRef {
    /// Build bounds of the primitive.
    pub bounds: Aabb3,
    /// Geometry id within the scene.
    pub geom_id: u32,
    /// Segment index within the geometry.
    pub prim_id: u32,
}

impl PrimRef {
    /// Create a primitive reference.
    pub const fn new(bounds: Aabb3, geom_id: u32, prim_id: u32) -> Self {
        Self {
            bounds,
            geom_id,
            prim_id,
        }
    }

    /// Composite id: geometry id in the high half, primitive id in the low half.
    ///
    /// Ordering by this id is the deterministic tie-break used across the builder.
    #[inline]
    pub const fn id64(&self) -> u64 {
        ((self.geom_id as u64) << 32) | self.prim_id as u64
    }
}

/// Resolves geometry ids to curve geometries.
///
/// Looking up an id that was never registered is a caller error and panics.
pub trait GeometryLookup {
    /// The curve geometry registered under `geom_id`.
    fn curves(&self, geom_id: u32) -> &CurveGeometry;
}

/// Owns curve geometries under dense `u32` ids.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    geometries: Vec<CurveGeometry>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a geometry and return its id.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Geometry ids are 32-bit by design."
    )]
    pub fn add(&mut self, geometry: CurveGeometry) -> u32 {
        self.geometries.push(geometry);
        (self.geometries.len() - 1) as u32
    }

    /// Geometry registered under `geom_id`, if any.
    pub fn get(&self, geom_id: u32) -> Option<&CurveGeometry> {
        self.geometries.get(geom_id as usize)
    }

    /// Mutable access to the geometry registered under `geom_id`, if any.
    pub fn get_mut(&mut self, geom_id: u32) -> Option<&mut CurveGeometry> {
        self.geometries.get_mut(geom_id as usize)
    }

    /// Number of registered geometries.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// True if no geometry is registered.
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Iterate `(geom_id, geometry)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &CurveGeometry)> + '_ {
        (0_u32..).zip(self.geometries.iter())
    }

    /// Reference every valid primitive of the scene at the first time step.
    ///
    /// Invalid primitives (dangling segment, NaN data, negative radius) are
    /// skipped. Returns the references in `(geom_id, prim_id)` order together
    /// with the merged bounds of all of them.
    pub fn prim_refs(&self) -> (Vec<PrimRef>, Aabb3) {
        let mut out = Vec::new();
        let mut bounds = Aabb3::EMPTY;
        for (geom_id, geometry) in self.iter() {
            for (prim_id, i) in (0_u32..).zip(0..geometry.len()) {
                if let Some(b) = geometry.build_bounds(i) {
                    bounds.extend(&b);
                    out.push(PrimRef::new(b, geom_id, prim_id));
                }
            }
        }
        (out, bounds)
    }
}

impl GeometryLookup for Scene {
    #[inline]
    fn curves(&self, geom_id: u32) -> &CurveGeometry {
        &self.geometries[geom_id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::Vertex;
    use alloc::vec;
    use glam::Vec3;

    fn line(n: usize) -> CurveGeometry {
        let vertices = (0..=n)
            .map(|i| Vertex::new(Vec3::new(i as f32, 0.0, 0.0), 0.25))
            .collect();
        let segments = (0..n as u32).collect();
        CurveGeometry::from_buffers(segments, vec![vertices]).unwrap()
    }

    #[test]
    fn id64_orders_geometry_first() {
        let a = PrimRef::new(Aabb3::EMPTY, 1, 0);
        let b = PrimRef::new(Aabb3::EMPTY, 0, u32::MAX);
        assert!(b.id64() < a.id64());
        assert_eq!(a.id64(), 1 << 32);
    }

    #[test]
    fn prim_refs_skip_invalid() {
        let mut scene = Scene::new();
        let g0 = scene.add(line(3));
        let mut broken = line(2);
        broken.set_segments(vec![0, 2]);
        let g1 = scene.add(broken);
        assert_eq!((g0, g1), (0, 1));

        let (refs, bounds) = scene.prim_refs();
        let ids: Vec<_> = refs.iter().map(|r| (r.geom_id, r.prim_id)).collect();
        assert_eq!(ids, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
        assert_eq!(bounds.lower, Vec3::splat(-0.25));
        assert_eq!(bounds.upper, Vec3::new(3.25, 0.25, 0.25));
    }

    #[test]
    fn lookup_returns_registered_geometry() {
        let mut scene = Scene::new();
        let id = scene.add(line(4));
        assert_eq!(scene.curves(id).len(), 4);
        assert!(scene.get(id + 1).is_none());
    }
}
