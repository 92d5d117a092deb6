// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-transform layout: one affine per block, byte-quantized boxes.

use alloc::vec::Vec;

use glam::{Affine3A, Mat3, Vec3};
use strand_geometry::{Aabb3, GeometryLookup, PrimRef};

use super::{DecodedPrimitive, LeafLayout, rounding_slack};
use crate::config::LeafKind;
use crate::frame;
use crate::quantize::{BYTE_MAX, ceil_u8, floor_u8};
use crate::soa::{BlockReader, BlockWriter, Field, extent};

/// Scalar `k` of the shared 3x4 transform (three columns, then translation).
const fn space(k: usize) -> Field {
    Field::shared(4 * k, 0, 4)
}

const SPACE: [Field; 12] = [
    space(0),
    space(1),
    space(2),
    space(3),
    space(4),
    space(5),
    space(6),
    space(7),
    space(8),
    space(9),
    space(10),
    space(11),
];
const COUNT: Field = Field::shared(48, 0, 4);
const LOWER: [Field; 3] = [
    Field::lanes(52, 0, 1),
    Field::lanes(52, 2, 1),
    Field::lanes(52, 4, 1),
];
const UPPER: [Field; 3] = [
    Field::lanes(52, 1, 1),
    Field::lanes(52, 3, 1),
    Field::lanes(52, 5, 1),
];
const GEOM_ID: Field = Field::lanes(52, 6, 4);
const PRIM_ID: Field = Field::lanes(52, 10, 4);

/// Every field of a shared-transform block.
pub(crate) const FIELDS: [Field; 21] = [
    SPACE[0], SPACE[1], SPACE[2], SPACE[3], SPACE[4], SPACE[5], SPACE[6], SPACE[7], SPACE[8],
    SPACE[9], SPACE[10], SPACE[11], COUNT, LOWER[0], UPPER[0], LOWER[1], UPPER[1], LOWER[2],
    UPPER[2], GEOM_ID, PRIM_ID,
];

/// One aligned frame per block; each primitive keeps a `u8` box in it.
///
/// The block transform maps world space onto the `[0, 255]^3` grid spanned
/// by the group's bounds in the block frame. The header is the 48-byte
/// transform and a `u32` count, followed by six byte arrays (lower/upper per
/// axis) and the two id arrays.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SharedLayout {
    m: usize,
    min_extent: f32,
}

impl SharedLayout {
    /// Layout with `m` lanes per block.
    pub const fn new(m: usize, min_extent: f32) -> Self {
        Self { m, min_extent }
    }

    /// Bytes of a block holding `n` primitives.
    pub const fn block_bytes(n: usize) -> usize {
        52 + 14 * n
    }
}

impl LeafLayout for SharedLayout {
    fn kind(&self) -> LeafKind {
        LeafKind::SharedTransform
    }

    fn max_group_size(&self) -> usize {
        self.m
    }

    fn block_size(&self) -> usize {
        Self::block_bytes(self.m)
    }

    fn bytes(&self, n: usize) -> usize {
        let (f, r) = (n / self.m, n % self.m);
        f * self.block_size() + if r > 0 { Self::block_bytes(r) } else { 0 }
    }

    fn fill<S>(&self, scene: &S, prims: &[PrimRef], begin: &mut usize, end: usize, block: &mut [u8])
    where
        S: GeometryLookup + ?Sized,
    {
        let end = end.min(*begin + self.m);
        let group = &prims[*begin..end];
        let s = frame::aligned_space(scene, group);
        let local = |prim: &PrimRef| {
            scene
                .curves(prim.geom_id)
                .bounds_in_space(&s, prim.prim_id as usize)
        };

        let mut gbounds = Aabb3::EMPTY;
        for prim in group {
            gbounds.extend(&local(prim));
        }
        let slack = rounding_slack(&gbounds);
        let gbounds = gbounds.enlarge(slack);
        let size = gbounds.size().max(Vec3::splat(self.min_extent));
        let inv = Vec3::splat(BYTE_MAX) / size;
        let linear = Mat3::from_diagonal(inv) * s;
        let translation = -BYTE_MAX * gbounds.lower / size;

        #[allow(
            clippy::cast_possible_truncation,
            reason = "Group sizes are capped well below u32::MAX."
        )]
        let n = group.len() as u32;
        debug_assert!(
            extent(&FIELDS, group.len()) <= block.len(),
            "block too short for {n} lanes"
        );
        let mut w = BlockWriter::new(block, group.len());
        let values = linear.to_cols_array().into_iter().chain(translation.to_array());
        for (field, value) in SPACE.iter().zip(values) {
            w.f32(field, 0, value);
        }
        w.u32(&COUNT, 0, n);

        for (lane, prim) in group.iter().enumerate() {
            let b = local(prim).enlarge(slack);
            let lower = BYTE_MAX * (b.lower - gbounds.lower) / size;
            let upper = BYTE_MAX * (b.upper - gbounds.lower) / size;
            for axis in 0..3 {
                w.u8(&LOWER[axis], lane, floor_u8(lower[axis]));
                w.u8(&UPPER[axis], lane, ceil_u8(upper[axis]));
            }
            w.u32(&GEOM_ID, lane, prim.geom_id);
            w.u32(&PRIM_ID, lane, prim.prim_id);
        }
        *begin = end;
    }

    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>) {
        let header = BlockReader::new(block, 0);
        let n = header.u32(&COUNT, 0) as usize;
        let values = SPACE.map(|field| header.f32(&field, 0));
        let to_local = Affine3A::from_cols_array(&values);

        let r = BlockReader::new(block, n);
        for lane in 0..n {
            out.push(DecodedPrimitive {
                geom_id: r.u32(&GEOM_ID, lane),
                prim_id: r.u32(&PRIM_ID, lane),
                offset: Vec3::ZERO,
                scale: 1.0,
                to_local,
                lower: Vec3::from_array(LOWER.map(|f| f32::from(r.u8(&f, lane)))),
                upper: Vec3::from_array(UPPER.map(|f| f32::from(r.u8(&f, lane)))),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_sizes() {
        let l = SharedLayout::new(8, 1e-19);
        assert_eq!(l.block_size(), 164);
        assert_eq!(l.bytes(3), 52 + 42);
        assert_eq!(l.bytes(16), 328);
        assert_eq!(l.bytes(17), 328 + 66);
    }

    #[test]
    fn descriptor_matches_block_formula() {
        for n in 0..=16 {
            assert_eq!(extent(&FIELDS, n), SharedLayout::block_bytes(n));
        }
    }
}
