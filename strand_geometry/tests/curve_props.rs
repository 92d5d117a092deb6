// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for curve bounds, validity, and motion bounds.

use glam::Vec3;
use proptest::prelude::*;
use strand_geometry::{Aabb3, CurveGeometry, Scene, TimeRange, Vertex};

fn vertex() -> impl Strategy<Value = Vertex> {
    (-1.0e3_f32..1.0e3, -1.0e3_f32..1.0e3, -1.0e3_f32..1.0e3, 0.0_f32..10.0)
        .prop_map(|(x, y, z, r)| Vertex::new(Vec3::new(x, y, z), r))
}

proptest! {
    #[test]
    fn bounds_contain_enlarged_endpoints(a in vertex(), b in vertex()) {
        let g = CurveGeometry::from_buffers(vec![0], vec![vec![a, b]]).unwrap();
        prop_assert!(g.valid_at(0, 0));
        let bounds = g.bounds(0);
        let r = a.radius.max(b.radius);
        for p in [a.position, b.position] {
            prop_assert!(bounds.contains(&Aabb3::from_point(p).enlarge(r)));
        }
    }

    #[test]
    fn segment_at_last_vertex_is_never_valid(
        vertices in prop::collection::vec(vertex(), 1..16),
    ) {
        let last = (vertices.len() - 1) as u32;
        let g = CurveGeometry::from_buffers(vec![last], vec![vertices]).unwrap();
        prop_assert!(!g.valid_at(0, 0));
        prop_assert!(g.build_bounds(0).is_none());
    }

    #[test]
    fn linear_bounds_contain_every_time_step(
        steps in prop::collection::vec((vertex(), vertex()), 2..6),
    ) {
        let buffers: Vec<_> = steps.iter().map(|(a, b)| vec![*a, *b]).collect();
        let g = CurveGeometry::from_buffers(vec![0], buffers).unwrap();
        let lb = g.linear_bounds(0, TimeRange::FULL).unwrap();
        let segments = g.num_time_segments();
        for step in 0..=segments {
            let t = step as f32 / segments as f32;
            let slack = lb.interpolate(t).enlarge(1.0e-2);
            prop_assert!(slack.contains(&g.bounds_at(0, step)), "step {step}");
        }
    }

    #[test]
    fn prim_refs_cover_all_valid_segments(
        vertices in prop::collection::vec(vertex(), 2..32),
    ) {
        let n = vertices.len() as u32;
        // One segment per vertex; only the last one dangles.
        let g = CurveGeometry::from_buffers((0..n).collect(), vec![vertices]).unwrap();
        let mut scene = Scene::new();
        scene.add(g);
        let (refs, bounds) = scene.prim_refs();
        prop_assert_eq!(refs.len(), n as usize - 1);
        for r in &refs {
            prop_assert!(bounds.contains(&r.bounds));
        }
    }
}
