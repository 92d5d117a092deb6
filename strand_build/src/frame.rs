// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aligned frames: orthonormal bases oriented along a representative strand.

use glam::{Mat3, Vec3};
use strand_geometry::{GeometryLookup, PrimRef};

/// Chords with a squared length at or below this do not define a direction.
pub const MIN_CHORD_LENGTH_SQUARED: f32 = 1e-18;

/// Alignment axis when no primitive has a usable chord.
pub const DEFAULT_AXIS: Vec3 = Vec3::Z;

/// Orthonormal basis whose third column is `axis`.
///
/// `axis` must be normalized.
pub fn frame(axis: Vec3) -> Mat3 {
    let (dx, dy) = axis.any_orthonormal_pair();
    Mat3::from_cols(dx, dy, axis)
}

/// Direction of the chord of the lowest-id primitive whose chord is not degenerate.
///
/// Vertices pass through `map` before the chord is taken.
fn alignment_axis<S, F>(scene: &S, prims: &[PrimRef], map: F) -> Vec3
where
    S: GeometryLookup + ?Sized,
    F: Fn(Vec3) -> Vec3,
{
    let mut best: Option<(u64, Vec3)> = None;
    for prim in prims {
        let id = prim.id64();
        if best.is_some_and(|(best_id, _)| id >= best_id) {
            continue;
        }
        let curves = scene.curves(prim.geom_id);
        let index = curves.segment(prim.prim_id as usize) as usize;
        let p0 = map(curves.vertex(index).position);
        let p1 = map(curves.vertex(index + 1).position);
        let chord = p1 - p0;
        if chord.length_squared() > MIN_CHORD_LENGTH_SQUARED {
            best = Some((id, chord.normalize()));
        }
    }
    best.map_or(DEFAULT_AXIS, |(_, axis)| axis)
}

/// World-to-frame rotation for `prims`.
///
/// The result is the transpose of [`frame`] along the alignment axis, so that
/// `space * p` expresses `p` in frame coordinates. The choice depends only on
/// primitive ids, never on slice order.
pub fn aligned_space<S>(scene: &S, prims: &[PrimRef]) -> Mat3
where
    S: GeometryLookup + ?Sized,
{
    frame(alignment_axis(scene, prims, |p| p)).transpose()
}

/// Frame for `prims` after vertices are mapped to `(p - offset) * scale`.
///
/// Unlike [`aligned_space`] the basis is returned untransposed: its columns
/// are the frame axes.
pub fn aligned_space_scaled<S>(scene: &S, prims: &[PrimRef], offset: Vec3, scale: f32) -> Mat3
where
    S: GeometryLookup + ?Sized,
{
    frame(alignment_axis(scene, prims, |p| (p - offset) * scale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use strand_geometry::{Aabb3, CurveGeometry, Scene, Vertex};

    fn near(a: Vec3, b: Vec3) -> bool {
        let d = a - b;
        d.cmplt(Vec3::splat(1e-5)).all() && d.cmpgt(Vec3::splat(-1e-5)).all()
    }

    /// One geometry whose segment `i` runs from `starts[i]` to `ends[i]`.
    fn scene_of(pairs: &[(Vec3, Vec3)]) -> (Scene, Vec<PrimRef>) {
        let mut vertices = Vec::new();
        for (a, b) in pairs {
            vertices.push(Vertex::new(*a, 0.1));
            vertices.push(Vertex::new(*b, 0.1));
        }
        let segments = (0..pairs.len() as u32).map(|i| 2 * i).collect();
        let geometry = CurveGeometry::from_buffers(segments, vec![vertices]).unwrap();
        let mut scene = Scene::new();
        scene.add(geometry);
        let (refs, _) = scene.prim_refs();
        (scene, refs)
    }

    #[test]
    fn frame_is_orthonormal_with_axis_last() {
        let axis = Vec3::new(1.0, 2.0, -0.5).normalize();
        let m = frame(axis);
        assert!(near(m.z_axis, axis));
        assert!(near(m.transpose() * m * Vec3::ONE, Vec3::ONE));
        assert!(m.x_axis.dot(axis) < 1e-6 && m.x_axis.dot(axis) > -1e-6);
    }

    #[test]
    fn skips_degenerate_chords() {
        let p = Vec3::new(3.0, 3.0, 3.0);
        let (scene, refs) = scene_of(&[(p, p), (Vec3::ZERO, Vec3::X), (Vec3::ZERO, Vec3::Y)]);
        // Prim 0 has the lowest id but no direction; prim 1 wins over prim 2.
        let space = aligned_space(&scene, &refs);
        assert!(near(space * Vec3::X, Vec3::Z));
    }

    #[test]
    fn only_non_degenerate_prim_is_chosen() {
        let p = Vec3::new(-1.0, 2.0, 0.5);
        let dir = Vec3::new(0.0, 3.0, 4.0);
        let (scene, refs) = scene_of(&[(p, p), (p, p), (p, p + dir)]);
        let space = aligned_space(&scene, &refs);
        assert!(near(space * dir.normalize(), Vec3::Z));
    }

    #[test]
    fn lowest_id_wins_regardless_of_order() {
        let (scene, mut refs) = scene_of(&[(Vec3::ZERO, Vec3::Y), (Vec3::ZERO, Vec3::X)]);
        let forward = aligned_space(&scene, &refs);
        refs.reverse();
        assert_eq!(aligned_space(&scene, &refs), forward);
        assert!(near(forward * Vec3::Y, Vec3::Z));
    }

    #[test]
    fn all_degenerate_falls_back_to_z() {
        let (scene, refs) = scene_of(&[(Vec3::ONE, Vec3::ONE)]);
        assert_eq!(frame(DEFAULT_AXIS).transpose(), aligned_space(&scene, &refs));
        assert_eq!(refs[0].bounds, Aabb3::from_point(Vec3::ONE).enlarge(0.1));
    }

    #[test]
    fn scaled_variant_maps_before_measuring() {
        // A chord of length 1e-10 is degenerate until scaled up.
        let (scene, refs) = scene_of(&[(Vec3::ZERO, Vec3::new(0.0, 1e-10, 0.0))]);
        assert_eq!(aligned_space(&scene, &refs), frame(DEFAULT_AXIS).transpose());
        let space = aligned_space_scaled(&scene, &refs, Vec3::ZERO, 1e6);
        assert!(near(space.z_axis, Vec3::Y));
    }
}
