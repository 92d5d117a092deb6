// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full-precision layout: one `f32` affine transform per primitive.

use alloc::vec::Vec;

use strand_geometry::{GeometryLookup, PrimRef};

use super::{COUNT, DecodedPrimitive, LeafLayout, decode_affine, fill_affine};
use crate::config::LeafKind;
use crate::soa::BlockReader;

/// Per-primitive transform into the unit box of the primitive's own frame.
///
/// A block holds a count byte followed by fourteen 4-byte arrays of `N`
/// values each (nine linear, three translation, geometry id, primitive id),
/// where `N` is the block's occupancy. A short trailing block of a leaf with
/// fewer than three primitives is padded so wide loads stay inside the leaf.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FullLayout {
    m: usize,
    min_extent: f32,
}

impl FullLayout {
    /// Layout with `m` lanes per block.
    pub const fn new(m: usize, min_extent: f32) -> Self {
        Self { m, min_extent }
    }

    /// Bytes of a block holding `n` primitives, without padding.
    pub const fn block_bytes(n: usize) -> usize {
        1 + 14 * 4 * n
    }

    /// Padding after the last partial block of a leaf with `n` primitives.
    pub const fn tail_padding(n: usize) -> usize {
        4 * 8_usize.saturating_sub(3 * n)
    }
}

impl LeafLayout for FullLayout {
    fn kind(&self) -> LeafKind {
        LeafKind::Full
    }

    fn max_group_size(&self) -> usize {
        self.m
    }

    fn block_size(&self) -> usize {
        Self::block_bytes(self.m)
    }

    fn bytes(&self, n: usize) -> usize {
        let (f, r) = (n / self.m, n % self.m);
        let tail = if r > 0 {
            Self::block_bytes(r) + Self::tail_padding(n)
        } else {
            0
        };
        f * self.block_size() + tail
    }

    fn fill<S>(&self, scene: &S, prims: &[PrimRef], begin: &mut usize, end: usize, block: &mut [u8])
    where
        S: GeometryLookup + ?Sized,
    {
        let end = end.min(*begin + self.m);
        let n = end - *begin;
        fill_affine(scene, prims, begin, end, n, self.min_extent, block);
    }

    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>) {
        let n = usize::from(BlockReader::new(block, 0).u8(&COUNT, 0));
        decode_affine(block, n, n, out);
    }
}
