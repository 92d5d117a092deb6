// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf creation: allocation, block filling, and hand-off to the tree.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::Range;
use core::sync::atomic::{AtomicUsize, Ordering};

use strand_geometry::{GeometryLookup, PrimRef};

use crate::config::{ConfigError, LeafConfig, LeafKind};
use crate::layouts::{DecodedPrimitive, LeafLayout, Layout};

/// Zeroed byte buffer whose first byte sits at a requested alignment.
#[derive(Debug)]
pub struct LeafStorage {
    buffer: Vec<u8>,
    start: usize,
    len: usize,
}

impl LeafStorage {
    /// Allocate `len` zero bytes aligned to `align`, a power of two.
    pub fn zeroed(len: usize, align: usize) -> Self {
        debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
        let buffer = vec![0_u8; len + align - 1];
        // The slack bytes always hold an aligned start within `align - 1`.
        let address = buffer.as_ptr() as usize;
        let start = address.next_multiple_of(align) - address;
        Self { buffer, start, len }
    }

    /// Number of usable bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no bytes were requested.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The usable bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[self.start..self.start + self.len]
    }

    /// The usable bytes, mutably.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[self.start..self.start + self.len]
    }
}

/// Source of leaf storage.
///
/// Takes `&self` so one allocator can serve several encoding threads.
pub trait LeafAllocator {
    /// Allocate `bytes` zeroed bytes aligned to `align`.
    fn malloc1(&self, bytes: usize, align: usize) -> LeafStorage;
}

/// Heap allocator that keeps a running total of bytes handed out.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    allocated: AtomicUsize,
}

impl HeapAllocator {
    /// Create an allocator with a zero total.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes handed out so far.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}

impl LeafAllocator for HeapAllocator {
    fn malloc1(&self, bytes: usize, align: usize) -> LeafStorage {
        self.allocated.fetch_add(bytes, Ordering::Relaxed);
        LeafStorage::zeroed(bytes, align)
    }
}

/// The tree under construction, as seen by leaf creation.
pub trait BuildTree {
    /// Handle returned for an encoded leaf.
    type NodeRef;
    /// Geometry source used to encode primitives.
    type Scene: GeometryLookup + ?Sized;

    /// The scene being built.
    fn scene(&self) -> &Self::Scene;

    /// Take ownership of an encoded leaf and return its node handle.
    fn encode_leaf(&mut self, leaf: EncodedLeaf) -> Self::NodeRef;
}

/// A filled leaf: its layout, block count, and bytes.
#[derive(Debug)]
pub struct EncodedLeaf {
    layout: Layout,
    blocks: usize,
    storage: LeafStorage,
}

impl EncodedLeaf {
    /// Layout the leaf was encoded with.
    pub fn kind(&self) -> LeafKind {
        self.layout.kind()
    }

    /// Number of blocks.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }

    /// Every stored primitive, block by block.
    pub fn decode(&self) -> Vec<DecodedPrimitive> {
        let bytes = self.bytes();
        let block_size = self.layout.block_size();
        let mut out = Vec::with_capacity(self.blocks * self.layout.max_group_size());
        for i in 0..self.blocks {
            let start = i * block_size;
            let end = (start + block_size).min(bytes.len());
            self.layout.decode_block(&bytes[start..end], &mut out);
        }
        out
    }
}

/// Turns primitive ranges into leaves with the configured layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LeafEncoder {
    layout: Layout,
    byte_alignment: usize,
}

impl LeafEncoder {
    /// Encoder for a validated configuration.
    pub fn new(config: &LeafConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            layout: Layout::from_config(config),
            byte_alignment: config.byte_alignment,
        })
    }

    /// The layout in use.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Blocks needed for `n` primitives.
    pub fn blocks(&self, n: usize) -> usize {
        self.layout.blocks(n)
    }

    /// Bytes needed for `n` primitives.
    pub fn bytes(&self, n: usize) -> usize {
        self.layout.bytes(n)
    }

    /// Encode `prims` into a fresh leaf allocated from `alloc`.
    ///
    /// Every primitive must be valid at the first time step.
    pub fn encode<S, A>(&self, scene: &S, prims: &[PrimRef], alloc: &A) -> EncodedLeaf
    where
        S: GeometryLookup + ?Sized,
        A: LeafAllocator + ?Sized,
    {
        let blocks = self.layout.blocks(prims.len());
        let bytes = self.layout.bytes(prims.len());
        let block_size = self.layout.block_size();
        let mut storage = alloc.malloc1(bytes, self.byte_alignment);

        let buffer = storage.as_bytes_mut();
        let mut cursor = 0;
        for i in 0..blocks {
            let start = i * block_size;
            let end = (start + block_size).min(bytes);
            self.layout
                .fill(scene, prims, &mut cursor, prims.len(), &mut buffer[start..end]);
        }
        debug_assert_eq!(cursor, prims.len(), "every primitive is encoded");

        log::trace!(
            "encoded {} leaf: {} prims, {} blocks, {} bytes",
            self.layout.kind(),
            prims.len(),
            blocks,
            bytes
        );
        EncodedLeaf {
            layout: self.layout,
            blocks,
            storage,
        }
    }

    /// Encode `prims[range]` and hand the leaf to `tree`.
    pub fn create_leaf<T, A>(
        &self,
        tree: &mut T,
        prims: &[PrimRef],
        range: Range<usize>,
        alloc: &A,
    ) -> T::NodeRef
    where
        T: BuildTree,
        A: LeafAllocator + ?Sized,
    {
        let leaf = self.encode(tree.scene(), &prims[range], alloc);
        tree.encode_leaf(leaf)
    }
}

/// Index of a leaf inside a [`LeafList`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeafRef(pub usize);

/// Minimal [`BuildTree`] that keeps leaves in creation order.
#[derive(Debug)]
pub struct LeafList<'a, S: ?Sized> {
    scene: &'a S,
    leaves: Vec<EncodedLeaf>,
}

impl<'a, S: GeometryLookup + ?Sized> LeafList<'a, S> {
    /// Empty list over `scene`.
    pub fn new(scene: &'a S) -> Self {
        Self {
            scene,
            leaves: Vec::new(),
        }
    }

    /// Leaf behind `leaf`, if it exists.
    pub fn get(&self, leaf: LeafRef) -> Option<&EncodedLeaf> {
        self.leaves.get(leaf.0)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True if no leaf was created.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Iterate leaves in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &EncodedLeaf> + '_ {
        self.leaves.iter()
    }
}

impl<S: GeometryLookup + ?Sized> BuildTree for LeafList<'_, S> {
    type NodeRef = LeafRef;
    type Scene = S;

    fn scene(&self) -> &S {
        self.scene
    }

    fn encode_leaf(&mut self, leaf: EncodedLeaf) -> LeafRef {
        self.leaves.push(leaf);
        LeafRef(self.leaves.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use strand_geometry::{CurveGeometry, Scene, Vertex};

    fn strands(n: u32) -> Scene {
        let mut vertices = Vec::new();
        for i in 0..n {
            let base = Vec3::new(i as f32, 0.0, 0.5 * i as f32);
            vertices.push(Vertex::new(base, 0.05));
            vertices.push(Vertex::new(base + Vec3::new(0.3, 1.0, 0.1), 0.08));
        }
        let segments = (0..n).map(|i| 2 * i).collect();
        let mut scene = Scene::new();
        scene.add(CurveGeometry::from_buffers(segments, vec![vertices]).unwrap());
        scene
    }

    #[test]
    fn storage_is_aligned_and_zeroed() {
        for align in [1, 4, 16, 64] {
            let s = LeafStorage::zeroed(37, align);
            assert_eq!(s.len(), 37);
            assert_eq!(s.as_bytes().as_ptr() as usize % align, 0);
            assert!(s.as_bytes().iter().all(|&b| b == 0));
        }
        assert!(LeafStorage::zeroed(0, 16).is_empty());
    }

    #[test]
    fn storage_is_aligned_for_large_alignments() {
        for len in [0, 1, 63, 4097] {
            for align in [128, 4096] {
                let mut s = LeafStorage::zeroed(len, align);
                assert_eq!(s.len(), len);
                assert_eq!(s.as_bytes().as_ptr() as usize % align, 0, "len={len} align={align}");
                if let Some(last) = s.as_bytes_mut().last_mut() {
                    *last = 7;
                }
                assert_eq!(s.as_bytes().iter().filter(|&&b| b == 7).count(), usize::from(len > 0));
            }
        }
    }

    #[test]
    fn allocator_counts_exact_bytes() {
        let scene = strands(11);
        let (prims, _) = scene.prim_refs();
        let alloc = HeapAllocator::new();
        for kind in LeafKind::ALL {
            let encoder = LeafEncoder::new(&LeafConfig::new(kind)).unwrap();
            let before = alloc.allocated();
            let leaf = encoder.encode(&scene, &prims, &alloc);
            assert_eq!(alloc.allocated() - before, encoder.bytes(11));
            assert_eq!(leaf.bytes().len(), encoder.bytes(11));
            assert_eq!(leaf.blocks(), encoder.blocks(11));
            assert_eq!(leaf.kind(), kind);
        }
    }

    #[test]
    fn create_leaf_hands_leaf_to_tree() {
        let scene = strands(20);
        let (prims, _) = scene.prim_refs();
        let alloc = HeapAllocator::new();
        let encoder = LeafEncoder::new(&LeafConfig::new(LeafKind::SharedTransform)).unwrap();
        let mut tree = LeafList::new(&scene);
        let a = encoder.create_leaf(&mut tree, &prims, 0..5, &alloc);
        let b = encoder.create_leaf(&mut tree, &prims, 5..20, &alloc);
        assert_eq!((a, b), (LeafRef(0), LeafRef(1)));
        assert_eq!(tree.len(), 2);

        let ids: Vec<_> = tree
            .get(b)
            .unwrap()
            .decode()
            .iter()
            .map(|p| p.prim_id)
            .collect();
        assert_eq!(ids, (5..20).collect::<Vec<_>>());
        assert!(tree.get(LeafRef(2)).is_none());
    }

    #[test]
    fn empty_range_makes_empty_leaf() {
        let scene = strands(1);
        let encoder = LeafEncoder::new(&LeafConfig::default()).unwrap();
        let leaf = encoder.encode(&scene, &[], &HeapAllocator::new());
        assert_eq!(leaf.blocks(), 0);
        assert!(leaf.decode().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = LeafConfig::default().with_max_group_size(0);
        assert_eq!(
            LeafEncoder::new(&config),
            Err(ConfigError::GroupSize { size: 0 })
        );
    }
}
