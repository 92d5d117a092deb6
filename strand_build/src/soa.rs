// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structure-of-arrays block descriptors.
//!
//! A block stores each field as a contiguous run of `lanes` values, so the
//! byte offset of a field depends on how many primitives the block holds.
//! A [`Field`] captures that dependency as `base + stride * lanes`. All values
//! are little-endian and unaligned.

use glam::Vec3;

/// How many values a field holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    /// One value per stored primitive.
    PerLane,
    /// A single value shared by the block.
    Shared,
}

/// Placement of one field inside a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Byte offset of the field in a block laid out for zero lanes.
    pub base: usize,
    /// Bytes the field moves by per lane.
    pub stride: usize,
    /// Bytes of one value.
    pub width: usize,
    /// Number of values.
    pub arity: Arity,
}

impl Field {
    /// A per-primitive array.
    pub const fn lanes(base: usize, stride: usize, width: usize) -> Self {
        Self {
            base,
            stride,
            width,
            arity: Arity::PerLane,
        }
    }

    /// A single block-wide value.
    pub const fn shared(base: usize, stride: usize, width: usize) -> Self {
        Self {
            base,
            stride,
            width,
            arity: Arity::Shared,
        }
    }

    /// Byte offset of the first value when the block holds `lanes` primitives.
    #[inline]
    pub const fn offset(&self, lanes: usize) -> usize {
        self.base + self.stride * lanes
    }

    /// Byte offset of value `i`.
    #[inline]
    pub const fn at(&self, lanes: usize, i: usize) -> usize {
        self.offset(lanes) + self.width * i
    }

    /// One past the last byte of the field.
    pub const fn end(&self, lanes: usize) -> usize {
        let count = match self.arity {
            Arity::PerLane => lanes,
            Arity::Shared => 1,
        };
        self.offset(lanes) + self.width * count
    }
}

/// Bytes needed to hold every field of a block laid out for `lanes` primitives.
pub fn extent(fields: &[Field], lanes: usize) -> usize {
    fields.iter().map(|f| f.end(lanes)).max().unwrap_or(0)
}

/// Writes fields into a block laid out for a fixed lane count.
#[derive(Debug)]
pub struct BlockWriter<'a> {
    bytes: &'a mut [u8],
    lanes: usize,
}

impl<'a> BlockWriter<'a> {
    /// Wrap `bytes`, addressing fields for `lanes` primitives.
    pub fn new(bytes: &'a mut [u8], lanes: usize) -> Self {
        Self { bytes, lanes }
    }

    fn put<const W: usize>(&mut self, field: &Field, i: usize, value: [u8; W]) {
        debug_assert_eq!(field.width, W, "field width mismatch");
        let at = field.at(self.lanes, i);
        self.bytes[at..at + W].copy_from_slice(&value);
    }

    /// Store a byte.
    pub fn u8(&mut self, field: &Field, i: usize, value: u8) {
        self.put(field, i, [value]);
    }

    /// Store a signed byte.
    pub fn i8(&mut self, field: &Field, i: usize, value: i8) {
        self.put(field, i, value.to_le_bytes());
    }

    /// Store a signed 16-bit integer.
    pub fn i16(&mut self, field: &Field, i: usize, value: i16) {
        self.put(field, i, value.to_le_bytes());
    }

    /// Store an unsigned 32-bit integer.
    pub fn u32(&mut self, field: &Field, i: usize, value: u32) {
        self.put(field, i, value.to_le_bytes());
    }

    /// Store a float.
    pub fn f32(&mut self, field: &Field, i: usize, value: f32) {
        self.put(field, i, value.to_le_bytes());
    }

    /// Store three packed floats.
    pub fn vec3(&mut self, field: &Field, i: usize, value: Vec3) {
        let mut raw = [0_u8; 12];
        for (chunk, v) in raw.chunks_exact_mut(4).zip(value.to_array()) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        self.put(field, i, raw);
    }
}

/// Reads fields from a block laid out for a fixed lane count.
#[derive(Copy, Clone, Debug)]
pub struct BlockReader<'a> {
    bytes: &'a [u8],
    lanes: usize,
}

impl<'a> BlockReader<'a> {
    /// Wrap `bytes`, addressing fields for `lanes` primitives.
    pub fn new(bytes: &'a [u8], lanes: usize) -> Self {
        Self { bytes, lanes }
    }

    fn get<const W: usize>(&self, field: &Field, i: usize) -> [u8; W] {
        debug_assert_eq!(field.width, W, "field width mismatch");
        let at = field.at(self.lanes, i);
        let mut raw = [0_u8; W];
        raw.copy_from_slice(&self.bytes[at..at + W]);
        raw
    }

    /// Load a byte.
    pub fn u8(&self, field: &Field, i: usize) -> u8 {
        self.get::<1>(field, i)[0]
    }

    /// Load a signed byte.
    pub fn i8(&self, field: &Field, i: usize) -> i8 {
        i8::from_le_bytes(self.get(field, i))
    }

    /// Load a signed 16-bit integer.
    pub fn i16(&self, field: &Field, i: usize) -> i16 {
        i16::from_le_bytes(self.get(field, i))
    }

    /// Load an unsigned 32-bit integer.
    pub fn u32(&self, field: &Field, i: usize) -> u32 {
        u32::from_le_bytes(self.get(field, i))
    }

    /// Load a float.
    pub fn f32(&self, field: &Field, i: usize) -> f32 {
        f32::from_le_bytes(self.get(field, i))
    }

    /// Load three packed floats.
    pub fn vec3(&self, field: &Field, i: usize) -> Vec3 {
        let raw: [u8; 12] = self.get(field, i);
        let mut out = [0.0_f32; 3];
        for (v, chunk) in out.iter_mut().zip(raw.chunks_exact(4)) {
            *v = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Vec3::from_array(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const COUNT: Field = Field::shared(0, 0, 1);
    const IDS: Field = Field::lanes(1, 0, 4);
    const FLAGS: Field = Field::lanes(1, 4, 1);
    const ORIGIN: Field = Field::shared(1, 5, 12);

    #[test]
    fn offsets_move_with_lane_count() {
        assert_eq!(FLAGS.offset(3), 13);
        assert_eq!(FLAGS.at(3, 2), 15);
        assert_eq!(ORIGIN.end(3), 1 + 15 + 12);
        assert_eq!(extent(&[COUNT, IDS, FLAGS, ORIGIN], 3), 28);
        assert_eq!(extent(&[], 3), 0);
    }

    #[test]
    fn writer_and_reader_agree() {
        let lanes = 3;
        let mut block = vec![0_u8; extent(&[COUNT, IDS, FLAGS, ORIGIN], lanes)];
        let mut w = BlockWriter::new(&mut block, lanes);
        w.u8(&COUNT, 0, 3);
        for i in 0..lanes {
            w.u32(&IDS, i, 100 + i as u32);
            w.u8(&FLAGS, i, i as u8);
        }
        w.vec3(&ORIGIN, 0, Vec3::new(1.5, -2.0, 0.25));

        let r = BlockReader::new(&block, lanes);
        assert_eq!(r.u8(&COUNT, 0), 3);
        assert_eq!(r.u32(&IDS, 2), 102);
        assert_eq!(r.u8(&FLAGS, 1), 1);
        assert_eq!(r.vec3(&ORIGIN, 0), Vec3::new(1.5, -2.0, 0.25));
        // Ids are stored contiguously, little-endian.
        assert_eq!(&block[5..9], &101_u32.to_le_bytes());
    }

    #[test]
    fn signed_values_keep_sign() {
        let field = Field::lanes(0, 0, 2);
        let mut block = [0_u8; 4];
        BlockWriter::new(&mut block, 2).i16(&field, 1, -32767);
        assert_eq!(BlockReader::new(&block, 2).i16(&field, 1), -32767);
        let bytes = Field::lanes(0, 0, 1);
        BlockWriter::new(&mut block, 2).i8(&bytes, 0, -126);
        assert_eq!(BlockReader::new(&block, 2).i8(&bytes, 0), -126);
    }
}
