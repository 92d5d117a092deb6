// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compressed layout: shared offset/scale, signed-byte bases, 16-bit boxes.

use alloc::vec::Vec;

use glam::{Affine3A, Mat3, Vec3};
use strand_geometry::{Aabb3, GeometryLookup, PrimRef};

use super::{COUNT, DecodedPrimitive, LeafLayout};
use crate::config::LeafKind;
use crate::frame;
use crate::quantize::{basis_i8, ceil_i16, floor_i16};
use crate::soa::{BlockReader, BlockWriter, Field, extent};

/// Largest distance, in scaled units, between two points of a block's group box.
const GRID_DIAGONAL: f32 = 256.0;

/// Fields of one local axis: basis `x, y, z` as `i8`, then `lower, upper` as `i16`.
#[derive(Copy, Clone)]
struct AxisFields {
    basis: [Field; 3],
    lower: Field,
    upper: Field,
}

const fn axis(k: usize) -> AxisFields {
    let s = 8 + 7 * k;
    AxisFields {
        basis: [
            Field::lanes(1, s, 1),
            Field::lanes(1, s + 1, 1),
            Field::lanes(1, s + 2, 1),
        ],
        lower: Field::lanes(1, s + 3, 2),
        upper: Field::lanes(1, s + 5, 2),
    }
}

const GEOM_ID: Field = Field::lanes(1, 0, 4);
const PRIM_ID: Field = Field::lanes(1, 4, 4);
const AXES: [AxisFields; 3] = [axis(0), axis(1), axis(2)];
const OFFSET: Field = Field::shared(1, 29, 12);
const SCALE: Field = Field::shared(13, 29, 12);

/// Every field of a compressed block.
pub(crate) const FIELDS: [Field; 20] = [
    COUNT,
    GEOM_ID,
    PRIM_ID,
    AXES[0].basis[0],
    AXES[0].basis[1],
    AXES[0].basis[2],
    AXES[0].lower,
    AXES[0].upper,
    AXES[1].basis[0],
    AXES[1].basis[1],
    AXES[1].basis[2],
    AXES[1].lower,
    AXES[1].upper,
    AXES[2].basis[0],
    AXES[2].basis[1],
    AXES[2].basis[2],
    AXES[2].lower,
    AXES[2].upper,
    OFFSET,
    SCALE,
];

/// Shared offset and uniform scale per block; each primitive keeps its own
/// byte-quantized frame and a 16-bit box in that frame.
///
/// The group's world bounds are mapped so their diagonal spans at most 256
/// units. Each primitive's frame is solved in that normalized space, its
/// columns are scaled by 126 and truncated to `i8`, and the primitive's box
/// under that integer basis is rounded outward to `i16`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CompressedLayout {
    m: usize,
    min_extent: f32,
}

impl CompressedLayout {
    /// Layout with `m` lanes per block.
    pub const fn new(m: usize, min_extent: f32) -> Self {
        Self { m, min_extent }
    }

    /// Bytes of a block holding `n` primitives.
    pub const fn block_bytes(n: usize) -> usize {
        25 + 29 * n
    }

    /// Uniform scale mapping `bounds` so its diagonal spans at most 256 units.
    fn group_scale(&self, bounds: &Aabb3) -> f32 {
        let size = bounds.size().max(Vec3::splat(self.min_extent));
        (Vec3::splat(GRID_DIAGONAL) / (size * libm::sqrtf(3.0))).min_element()
    }
}

impl LeafLayout for CompressedLayout {
    fn kind(&self) -> LeafKind {
        LeafKind::Compressed
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

        let mut bounds = Aabb3::EMPTY;
        for prim in group {
            bounds.extend(&scene.curves(prim.geom_id).bounds(prim.prim_id as usize));
        }
        let offset = bounds.lower;
        let scale = self.group_scale(&bounds);

        #[allow(
            clippy::cast_possible_truncation,
            reason = "Group sizes are capped well below 256."
        )]
        let n = group.len() as u8;
        debug_assert!(
            extent(&FIELDS, group.len()) <= block.len(),
            "block too short for {n} lanes"
        );
        let mut w = BlockWriter::new(block, group.len());
        w.u8(&COUNT, 0, n);
        w.vec3(&OFFSET, 0, offset);
        w.vec3(&SCALE, 0, Vec3::splat(scale));

        for (lane, i) in (*begin..end).enumerate() {
            let prim = &prims[i];
            let space = frame::aligned_space_scaled(scene, &prims[i..=i], offset, scale);
            let basis = space.to_cols_array_2d().map(|col| col.map(basis_i8));
            let quantized = Mat3::from_cols_array_2d(&basis.map(|col| col.map(f32::from)));
            let max_length = quantized
                .x_axis
                .length()
                .max(quantized.y_axis.length())
                .max(quantized.z_axis.length());
            let b = scene.curves(prim.geom_id).bounds_scaled(
                offset,
                scale,
                max_length,
                &quantized.transpose(),
                prim.prim_id as usize,
            );
            for (k, fields) in AXES.iter().enumerate() {
                for (field, value) in fields.basis.iter().zip(basis[k]) {
                    w.i8(field, lane, value);
                }
                w.i16(&fields.lower, lane, floor_i16(b.lower[k]));
                w.i16(&fields.upper, lane, ceil_i16(b.upper[k]));
            }
            w.u32(&GEOM_ID, lane, prim.geom_id);
            w.u32(&PRIM_ID, lane, prim.prim_id);
        }
        *begin = end;
    }

    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>) {
        let n = usize::from(BlockReader::new(block, 0).u8(&COUNT, 0));
        let r = BlockReader::new(block, n);
        let offset = r.vec3(&OFFSET, 0);
        let scale = r.vec3(&SCALE, 0).x;
        for lane in 0..n {
            let basis = AXES.map(|a| a.basis.map(|f| f32::from(r.i8(&f, lane))));
            // Rows of the local map are the stored basis vectors.
            let rows = Mat3::from_cols_array_2d(&basis).transpose();
            out.push(DecodedPrimitive {
                geom_id: r.u32(&GEOM_ID, lane),
                prim_id: r.u32(&PRIM_ID, lane),
                offset,
                scale,
                to_local: Affine3A::from_mat3(rows),
                lower: Vec3::from_array(AXES.map(|a| f32::from(r.i16(&a.lower, lane)))),
                upper: Vec3::from_array(AXES.map(|a| f32::from(r.i16(&a.upper, lane)))),
            });
        }
    }
}
