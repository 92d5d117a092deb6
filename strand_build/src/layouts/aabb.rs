// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size array of normalized boxes.

use alloc::vec::Vec;

use strand_geometry::{GeometryLookup, PrimRef};

use super::{COUNT, DecodedPrimitive, FullLayout, LeafLayout, decode_affine, fill_affine};
use crate::config::LeafKind;
use crate::soa::BlockReader;

/// Per-primitive unit-box transforms in blocks that always reserve `M` lanes.
///
/// Field offsets never depend on occupancy, so every block of a leaf has the
/// same size and unused lanes stay zeroed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AabbLayout {
    m: usize,
    min_extent: f32,
}

impl AabbLayout {
    /// Layout with `m` lanes per block.
    pub const fn new(m: usize, min_extent: f32) -> Self {
        Self { m, min_extent }
    }
}

impl LeafLayout for AabbLayout {
    fn kind(&self) -> LeafKind {
        LeafKind::AabbArray
    }

    fn max_group_size(&self) -> usize {
        self.m
    }

    fn block_size(&self) -> usize {
        FullLayout::block_bytes(self.m)
    }

    fn bytes(&self, n: usize) -> usize {
        self.blocks(n) * self.block_size()
    }

    fn fill<S>(&self, scene: &S, prims: &[PrimRef], begin: &mut usize, end: usize, block: &mut [u8])
    where
        S: GeometryLookup + ?Sized,
    {
        let end = end.min(*begin + self.m);
        fill_affine(scene, prims, begin, end, self.m, self.min_extent, block);
    }

    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>) {
        let n = usize::from(BlockReader::new(block, 0).u8(&COUNT, 0));
        decode_affine(block, self.m, n, out);
    }
}
