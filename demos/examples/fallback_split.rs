// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fallback split.
//!
//! Split a set of coincident references recursively until every part fits a
//! leaf, the situation where spatial heuristics make no progress.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p strand_demos --example fallback_split`

use glam::Vec3;
use strand_build::{FallbackSplit, PrimRefList};
use strand_geometry::{Aabb3, PrimRef};

const LEAF_SIZE: usize = 8;

fn split(mut list: PrimRefList, depth: usize, leaves: &mut Vec<usize>) {
    let n = list.len();
    if n <= LEAF_SIZE {
        leaves.push(n);
        return;
    }
    let mut left = PrimRefList::default();
    let mut right = PrimRefList::default();
    let s = FallbackSplit::find(&mut list, &mut left, &mut right);
    println!(
        "{:indent$}{n} -> {} + {}",
        "",
        s.left_count,
        s.right_count,
        indent = 2 * depth
    );
    split(left, depth + 1, leaves);
    split(right, depth + 1, leaves);
}

fn main() {
    env_logger::init();

    let bounds = Aabb3::from_point(Vec3::new(1.0, 2.0, 3.0)).enlarge(0.5);
    let prims: Vec<_> = (0..100).map(|i| PrimRef::new(bounds, 0, i)).collect();

    let mut leaves = Vec::new();
    split(PrimRefList::from_prims(&prims, 16), 0, &mut leaves);
    println!("{} leaves, sizes {:?}", leaves.len(), leaves);
    assert_eq!(leaves.iter().sum::<usize>(), prims.len());
}
