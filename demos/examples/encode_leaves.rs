// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf encoding.
//!
//! Build a small patch of hair, encode it with every leaf layout, and compare
//! sizes and how tightly each layout bounds the first strand.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p strand_demos --example encode_leaves`
//! - `cargo run -p strand_demos --example encode_leaves -- compressed 4`

use glam::Vec3;
use strand_build::{HeapAllocator, LeafConfig, LeafEncoder, LeafKind, LeafList};
use strand_geometry::{CurveGeometry, Scene, StrandFlags, Vertex};

/// A ring of curly strands, each `segments` segments long.
fn patch(strands: usize, segments: usize) -> CurveGeometry {
    let mut vertices = Vec::new();
    let mut index = Vec::new();
    let mut flags = Vec::new();
    for s in 0..strands {
        let a = s as f32 / strands as f32 * std::f32::consts::TAU;
        let root = Vec3::new(a.cos(), 0.0, a.sin()) * 2.0;
        for k in 0..=segments {
            let t = k as f32 * 0.4;
            let curl = Vec3::new((t + a).cos(), 0.0, (t + a).sin()) * 0.15;
            let radius = 0.03 * (1.0 - k as f32 / (segments as f32 + 1.0));
            if k < segments {
                index.push(vertices.len() as u32);
                let mut f = StrandFlags::empty();
                f.set(StrandFlags::START, k == 0);
                f.set(StrandFlags::END, k + 1 == segments);
                flags.push(f);
            }
            vertices.push(Vertex::new(root + Vec3::Y * t + curl, radius));
        }
    }
    let mut geometry = CurveGeometry::from_buffers(index, vec![vertices]).unwrap();
    geometry.set_flags(flags).unwrap();
    geometry
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let only: Option<LeafKind> = match args.next() {
        Some(name) => match name.parse() {
            Ok(kind) => Some(kind),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(2);
            }
        },
        None => None,
    };
    let group_size: Option<usize> = args.next().and_then(|s| s.parse().ok());

    let mut scene = Scene::new();
    scene.add(patch(24, 6));
    let (prims, bounds) = scene.prim_refs();
    println!("{} segments, scene bounds {:?}", prims.len(), bounds);

    for kind in LeafKind::ALL {
        if only.is_some_and(|k| k != kind) {
            continue;
        }
        let mut config = LeafConfig::new(kind);
        if let Some(m) = group_size {
            config = config.with_max_group_size(m);
        }
        let encoder = match LeafEncoder::new(&config) {
            Ok(encoder) => encoder,
            Err(err) => {
                eprintln!("{kind}: {err}");
                continue;
            }
        };

        let alloc = HeapAllocator::new();
        let mut leaves = LeafList::new(&scene);
        for chunk in (0..prims.len()).step_by(config.max_group_size) {
            let end = (chunk + config.max_group_size).min(prims.len());
            encoder.create_leaf(&mut leaves, &prims, chunk..end, &alloc);
        }

        let first = leaves.iter().next().map(|leaf| leaf.decode());
        println!(
            "{kind:>10}: {} leaves, {} bytes ({:.1} bytes/segment)",
            leaves.len(),
            alloc.allocated(),
            alloc.allocated() as f32 / prims.len() as f32
        );
        if let Some(d) = first.as_ref().and_then(|d| d.first()) {
            println!(
                "{:>10}  first segment ({}, {}) -> [{:?}, {:?}]",
                "", d.geom_id, d.prim_id, d.lower, d.upper
            );
        }
    }
}
