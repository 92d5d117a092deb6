// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use strand_build::fallback::DEFAULT_BLOCK_CAPACITY;
use strand_build::{FallbackSplit, PrimRefList};
use strand_geometry::{Aabb3, PrimRef};

/// `n` references that all share one box, the case spatial splits cannot handle.
fn gen_coincident(n: usize) -> Vec<PrimRef> {
    let bounds = Aabb3::new(Vec3::ZERO, Vec3::ONE);
    (0..n as u32).map(|i| PrimRef::new(bounds, 0, i)).collect()
}

fn bench_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("fallback_split");
    for &n in &[64_usize, 1024, 16384] {
        let prims = gen_coincident(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("find_n{}", n), |b| {
            b.iter_batched(
                || PrimRefList::from_prims(&prims, DEFAULT_BLOCK_CAPACITY),
                |mut input| {
                    let mut left = PrimRefList::default();
                    let mut right = PrimRefList::default();
                    black_box(FallbackSplit::find(&mut input, &mut left, &mut right));
                    (left, right)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fallback);
criterion_main!(benches);
