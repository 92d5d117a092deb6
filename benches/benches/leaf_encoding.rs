// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use strand_build::{HeapAllocator, LeafConfig, LeafEncoder, LeafKind, LeafLayout, LeafList};
use strand_geometry::{CurveGeometry, PrimRef, Scene, Vertex};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
    fn next_vec3(&mut self, scale: f32) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32()) * scale
    }
}

/// `strands` random strands of `segments` segments each, in one geometry.
fn gen_hair(strands: usize, segments: usize, seed: u64) -> Scene {
    let mut rng = Rng::new(seed);
    let mut vertices = Vec::with_capacity(strands * (segments + 1));
    let mut index = Vec::with_capacity(strands * segments);
    for _ in 0..strands {
        let mut p = rng.next_vec3(100.0);
        for s in 0..=segments {
            if s < segments {
                index.push(vertices.len() as u32);
            }
            vertices.push(Vertex::new(p, 0.05 + 0.05 * rng.next_f32()));
            p += Vec3::Y + rng.next_vec3(0.4) - Vec3::splat(0.2);
        }
    }
    let mut scene = Scene::new();
    scene.add(CurveGeometry::from_buffers(index, vec![vertices]).unwrap());
    scene
}

fn bench_create_leaf(c: &mut Criterion) {
    let scene = gen_hair(512, 16, 0x5eed);
    let (prims, _) = scene.prim_refs();
    for kind in LeafKind::ALL {
        let encoder = LeafEncoder::new(&LeafConfig::new(kind)).unwrap();
        let m = encoder.layout().max_group_size();
        let mut group = c.benchmark_group(format!("create_leaf_{kind}"));
        group.throughput(Throughput::Elements(prims.len() as u64));
        group.bench_function(format!("groups_of_{m}"), |b| {
            b.iter_batched(
                || LeafList::new(&scene),
                |mut leaves| {
                    let alloc = HeapAllocator::new();
                    let mut start = 0;
                    while start < prims.len() {
                        let end = (start + m).min(prims.len());
                        black_box(encoder.create_leaf(&mut leaves, &prims, start..end, &alloc));
                        start = end;
                    }
                    leaves
                },
                BatchSize::SmallInput,
            );
        });
        group.finish();
    }
}

fn bench_decode(c: &mut Criterion) {
    let scene = gen_hair(64, 16, 0xdec0de);
    let (prims, _) = scene.prim_refs();
    let mut group = c.benchmark_group("decode_leaf");
    for kind in LeafKind::ALL {
        let encoder = LeafEncoder::new(&LeafConfig::new(kind)).unwrap();
        let leaf = encoder.encode(&scene, &prims, &HeapAllocator::new());
        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(leaf.decode()));
        });
    }
    group.finish();
}

fn bench_aligned_space(c: &mut Criterion) {
    let scene = gen_hair(256, 8, 7);
    let (prims, _): (Vec<PrimRef>, _) = scene.prim_refs();
    c.bench_function("aligned_space_groups_of_8", |b| {
        b.iter(|| {
            for group in prims.chunks(8) {
                black_box(strand_build::frame::aligned_space(&scene, group));
            }
        });
    });
}

criterion_group!(benches, bench_create_leaf, bench_decode, bench_aligned_space);
criterion_main!(benches);
