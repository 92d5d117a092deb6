// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf layouts: four block encodings behind one interface.
//!
//! Each layout packs up to `max_group_size` primitives into a block whose
//! field offsets depend on the block's occupancy (see [`crate::soa`]). The
//! byte size of a leaf is a pure function of its primitive count, so storage
//! is allocated before any primitive is encoded.
//!
//! | Layout | Block bytes (M lanes) | Precision |
//! |---|---|---|
//! | [`FullLayout`] | `1 + 56 M` | `f32` affine per primitive, unit box |
//! | [`SharedLayout`] | `52 + 14 M` | shared `f32` affine, `u8` box |
//! | [`CompressedLayout`] | `25 + 29 M` | shared offset/scale, `i8` basis, `i16` box |
//! | [`AabbLayout`] | `1 + 56 M` | as [`FullLayout`], always `M` lanes |

use alloc::vec::Vec;

use glam::{Affine3A, Mat3, Vec3};
use strand_geometry::{Aabb3, GeometryLookup, PrimRef};

use crate::config::{LeafConfig, LeafKind};
use crate::frame;
use crate::soa::{BlockReader, BlockWriter, Field, extent};

mod aabb;
mod compressed;
mod full;
mod shared;

pub use aabb::AabbLayout;
pub use compressed::CompressedLayout;
pub use full::FullLayout;
pub use shared::SharedLayout;

/// One primitive recovered from an encoded block.
///
/// The primitive's geometry, mapped by [`map_point`](Self::map_point), lies
/// inside `[lower, upper]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecodedPrimitive {
    /// Geometry id.
    pub geom_id: u32,
    /// Segment index within the geometry.
    pub prim_id: u32,
    /// Subtracted from world points before they are scaled.
    pub offset: Vec3,
    /// Uniform scale applied after `offset` is subtracted.
    pub scale: f32,
    /// Map from the offset, scaled space to the local box space.
    pub to_local: Affine3A,
    /// Lower corner of the local box.
    pub lower: Vec3,
    /// Upper corner of the local box.
    pub upper: Vec3,
}

impl DecodedPrimitive {
    /// Map a world point into the local box space: `to_local((p - offset) * scale)`.
    ///
    /// The subtraction happens before the linear map, in the same order the
    /// encoder uses, so no precision is lost to a folded translation.
    pub fn map_point(&self, p: Vec3) -> Vec3 {
        self.to_local.transform_point3((p - self.offset) * self.scale)
    }
}

/// A leaf block encoding.
pub trait LeafLayout {
    /// Which encoding this is.
    fn kind(&self) -> LeafKind;

    /// Most primitives per block.
    fn max_group_size(&self) -> usize;

    /// Bytes of a full block.
    fn block_size(&self) -> usize;

    /// Blocks needed for `n` primitives.
    fn blocks(&self, n: usize) -> usize {
        n.div_ceil(self.max_group_size())
    }

    /// Bytes needed for `n` primitives.
    fn bytes(&self, n: usize) -> usize;

    /// Encode `prims[*begin..end]`, at most one block's worth, into `block`.
    ///
    /// Advances `begin` past the primitives consumed. Every primitive must be
    /// valid at the first time step.
    fn fill<S>(&self, scene: &S, prims: &[PrimRef], begin: &mut usize, end: usize, block: &mut [u8])
    where
        S: GeometryLookup + ?Sized;

    /// Append every primitive stored in `block` to `out`.
    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>);
}

/// The configured layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Layout {
    /// See [`FullLayout`].
    Full(FullLayout),
    /// See [`SharedLayout`].
    Shared(SharedLayout),
    /// See [`CompressedLayout`].
    Compressed(CompressedLayout),
    /// See [`AabbLayout`].
    AabbArray(AabbLayout),
}

impl Layout {
    /// The layout described by `config`. The configuration is not validated here.
    pub fn from_config(config: &LeafConfig) -> Self {
        let m = config.max_group_size;
        let eps = config.min_extent;
        match config.kind {
            LeafKind::Full => Self::Full(FullLayout::new(m, eps)),
            LeafKind::SharedTransform => Self::Shared(SharedLayout::new(m, eps)),
            LeafKind::Compressed => Self::Compressed(CompressedLayout::new(m, eps)),
            LeafKind::AabbArray => Self::AabbArray(AabbLayout::new(m, eps)),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $l:ident => $e:expr) => {
        match $self {
            Layout::Full($l) => $e,
            Layout::Shared($l) => $e,
            Layout::Compressed($l) => $e,
            Layout::AabbArray($l) => $e,
        }
    };
}

impl LeafLayout for Layout {
    fn kind(&self) -> LeafKind {
        dispatch!(self, l => l.kind())
    }

    fn max_group_size(&self) -> usize {
        dispatch!(self, l => l.max_group_size())
    }

    fn block_size(&self) -> usize {
        dispatch!(self, l => l.block_size())
    }

    fn bytes(&self, n: usize) -> usize {
        dispatch!(self, l => l.bytes(n))
    }

    fn fill<S>(&self, scene: &S, prims: &[PrimRef], begin: &mut usize, end: usize, block: &mut [u8])
    where
        S: GeometryLookup + ?Sized,
    {
        dispatch!(self, l => l.fill(scene, prims, begin, end, block));
    }

    fn decode_block(&self, block: &[u8], out: &mut Vec<DecodedPrimitive>) {
        dispatch!(self, l => l.decode_block(block, out));
    }
}

/// Four-byte field `k` of the per-primitive affine layouts.
const fn word(k: usize) -> Field {
    Field::lanes(1, 4 * k, 4)
}

/// Occupancy byte shared by the affine and compressed layouts.
pub(crate) const COUNT: Field = Field::shared(0, 0, 1);

/// Linear part, column-major: `vx.xyz, vy.xyz, vz.xyz`.
const LINEAR: [Field; 9] = [
    word(0),
    word(1),
    word(2),
    word(3),
    word(4),
    word(5),
    word(6),
    word(7),
    word(8),
];
const TRANSLATION: [Field; 3] = [word(9), word(10), word(11)];
const GEOM_ID: Field = word(12);
const PRIM_ID: Field = word(13);

/// Every field of a per-primitive affine block.
pub(crate) const AFFINE_FIELDS: [Field; 15] = [
    COUNT,
    LINEAR[0],
    LINEAR[1],
    LINEAR[2],
    LINEAR[3],
    LINEAR[4],
    LINEAR[5],
    LINEAR[6],
    LINEAR[7],
    LINEAR[8],
    TRANSLATION[0],
    TRANSLATION[1],
    TRANSLATION[2],
    GEOM_ID,
    PRIM_ID,
];

/// Ulps of a box's magnitude added to each of its sides before normalization.
const ROUNDING_SLACK: f32 = 64.0;

/// Padding that absorbs the rounding of a stored affine map, and of its
/// evaluation, for points inside `bounds`.
///
/// An affine map with a folded translation loses `eps * |p|` in world units
/// whatever its scale, so boxes are grown by a multiple of that before they
/// are normalized. A collapsed axis therefore keeps a width relative to its
/// position instead of the absolute `min_extent`.
pub(crate) fn rounding_slack(bounds: &Aabb3) -> f32 {
    let magnitude = bounds.lower.abs().max(bounds.upper.abs()).max_element();
    ROUNDING_SLACK * f32::EPSILON * magnitude
}

/// Transform mapping primitive `i` into the unit box of its own aligned frame.
fn unit_box_space<S>(scene: &S, prims: &[PrimRef], i: usize, min_extent: f32) -> (Mat3, Vec3)
where
    S: GeometryLookup + ?Sized,
{
    let prim = &prims[i];
    let space = frame::aligned_space(scene, &prims[i..=i]);
    let bounds = scene
        .curves(prim.geom_id)
        .bounds_in_space(&space, prim.prim_id as usize);
    let bounds = bounds.enlarge(rounding_slack(&bounds));
    let inv = bounds.size().max(Vec3::splat(min_extent)).recip();
    (Mat3::from_diagonal(inv) * space, -bounds.lower * inv)
}

/// Encode `prims[*begin..end]` as per-primitive unit-box transforms.
///
/// Fields are addressed for `lanes` primitives, which may exceed the number stored.
fn fill_affine<S>(
    scene: &S,
    prims: &[PrimRef],
    begin: &mut usize,
    end: usize,
    lanes: usize,
    min_extent: f32,
    block: &mut [u8],
) where
    S: GeometryLookup + ?Sized,
{
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Group sizes are capped well below 256."
    )]
    let n = (end - *begin) as u8;
    debug_assert!(
        extent(&AFFINE_FIELDS, lanes) <= block.len(),
        "block too short for {lanes} lanes"
    );
    let mut w = BlockWriter::new(block, lanes);
    w.u8(&COUNT, 0, n);
    for (lane, i) in (*begin..end).enumerate() {
        let (linear, translation) = unit_box_space(scene, prims, i, min_extent);
        let columns = linear.to_cols_array();
        for (field, value) in LINEAR.iter().zip(columns) {
            w.f32(field, lane, value);
        }
        for (field, value) in TRANSLATION.iter().zip(translation.to_array()) {
            w.f32(field, lane, value);
        }
        w.u32(&GEOM_ID, lane, prims[i].geom_id);
        w.u32(&PRIM_ID, lane, prims[i].prim_id);
    }
    *begin = end;
}

/// Decode `count` per-primitive unit-box transforms addressed for `lanes`.
fn decode_affine(block: &[u8], lanes: usize, count: usize, out: &mut Vec<DecodedPrimitive>) {
    let r = BlockReader::new(block, lanes);
    for lane in 0..count {
        let mut columns = [0.0_f32; 9];
        for (value, field) in columns.iter_mut().zip(&LINEAR) {
            *value = r.f32(field, lane);
        }
        let translation = Vec3::from_array(TRANSLATION.map(|field| r.f32(&field, lane)));
        out.push(DecodedPrimitive {
            geom_id: r.u32(&GEOM_ID, lane),
            prim_id: r.u32(&PRIM_ID, lane),
            offset: Vec3::ZERO,
            scale: 1.0,
            to_local: Affine3A::from_mat3_translation(Mat3::from_cols_array(&columns), translation),
            lower: Vec3::ZERO,
            upper: Vec3::ONE,
        });
    }
}
