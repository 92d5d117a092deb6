// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Strand Geometry: bind buffers, check validity, and query bounds.

use glam::Vec3;
use strand_geometry::{CurveGeometry, Scene, StrandFlags, TimeRange, Vertex};

fn main() {
    // A three-segment strand that sways along +x between two time steps.
    let step0: Vec<_> = (0..4)
        .map(|i| Vertex::new(Vec3::new(0.0, i as f32, 0.0), 0.1))
        .collect();
    let step1: Vec<_> = step0
        .iter()
        .enumerate()
        .map(|(i, v)| Vertex::new(v.position + Vec3::new(0.2 * i as f32, 0.0, 0.0), v.radius))
        .collect();
    let mut strand = CurveGeometry::from_buffers(vec![0, 1, 2], vec![step0, step1]).unwrap();
    strand
        .set_flags(vec![StrandFlags::START, StrandFlags::empty(), StrandFlags::END])
        .unwrap();
    strand.verify().unwrap();

    for i in 0..strand.len() {
        let lb = strand.linear_bounds(i, TimeRange::FULL).unwrap();
        println!(
            "segment {i}: t0={:?} t1={:?} mask={:#x}",
            strand.bounds_at(i, 0),
            lb.bounds1,
            strand.start_end_mask(i)
        );
    }

    let mut scene = Scene::new();
    scene.add(strand);
    let (refs, bounds) = scene.prim_refs();
    println!("{} prim refs, scene bounds {:?}", refs.len(), bounds);
}
