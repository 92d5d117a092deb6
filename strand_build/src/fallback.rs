// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Last-resort split: alternate primitives into two halves.
//!
//! When every primitive shares one position, spatial heuristics find no
//! split. Dealing references out like cards still halves the set, so the
//! build always makes progress.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use strand_geometry::{Aabb3, PrimRef};

/// Capacity of blocks created by [`PrimRefList::push`] when none is given.
pub const DEFAULT_BLOCK_CAPACITY: usize = 128;

/// Bounded run of primitive references.
#[derive(Clone, Debug)]
pub struct PrimRefBlock {
    items: Vec<PrimRef>,
    capacity: usize,
}

impl PrimRefBlock {
    /// Empty block holding at most `capacity` references.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `prim`, or return `false` if the block is full.
    pub fn insert(&mut self, prim: PrimRef) -> bool {
        if self.items.len() >= self.capacity {
            return false;
        }
        self.items.push(prim);
        true
    }

    /// Number of stored references.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reference `i`.
    pub fn at(&self, i: usize) -> &PrimRef {
        &self.items[i]
    }

    /// Stored references in insertion order.
    pub fn as_slice(&self) -> &[PrimRef] {
        &self.items
    }
}

/// Queue of [`PrimRefBlock`]s.
#[derive(Clone, Debug)]
pub struct PrimRefList {
    blocks: VecDeque<PrimRefBlock>,
    block_capacity: usize,
}

impl Default for PrimRefList {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CAPACITY)
    }
}

impl PrimRefList {
    /// Empty list whose new blocks hold `block_capacity` references (at least one).
    pub fn new(block_capacity: usize) -> Self {
        Self {
            blocks: VecDeque::new(),
            block_capacity: block_capacity.max(1),
        }
    }

    /// List holding `prims` in order.
    pub fn from_prims(prims: &[PrimRef], block_capacity: usize) -> Self {
        let mut list = Self::new(block_capacity);
        for prim in prims {
            list.push(*prim);
        }
        list
    }

    /// Remove and return the front block.
    pub fn take(&mut self) -> Option<PrimRefBlock> {
        self.blocks.pop_front()
    }

    /// Append a block.
    pub fn insert_block(&mut self, block: PrimRefBlock) {
        self.blocks.push_back(block);
    }

    /// Append one reference, opening a new block when the last one is full.
    pub fn push(&mut self, prim: PrimRef) {
        if let Some(last) = self.blocks.back_mut()
            && last.insert(prim)
        {
            return;
        }
        let mut block = PrimRefBlock::with_capacity(self.block_capacity);
        block.insert(prim);
        self.blocks.push_back(block);
    }

    /// Number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of references across all blocks.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(PrimRefBlock::len).sum()
    }

    /// True if no block holds a reference.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(PrimRefBlock::is_empty)
    }

    /// Iterate references front to back.
    pub fn iter(&self) -> impl Iterator<Item = &PrimRef> + '_ {
        self.blocks.iter().flat_map(|b| b.as_slice().iter())
    }

    /// Merged bounds of every reference.
    pub fn bounds(&self) -> Aabb3 {
        self.iter().fold(Aabb3::EMPTY, |acc, p| acc.merge(p.bounds))
    }
}

/// Outcome of a fallback split.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FallbackSplit {
    /// Bounds of the left half.
    pub left_bounds: Aabb3,
    /// Number of references in the left half.
    pub left_count: usize,
    /// Bounds of the right half.
    pub right_bounds: Aabb3,
    /// Number of references in the right half.
    pub right_count: usize,
}

impl FallbackSplit {
    /// Drain `input` and deal its references alternately into `right` and `left`.
    ///
    /// The first reference goes right, the second left, and so on, so the
    /// right half is never smaller and never larger by more than one.
    /// Returned bounds cover exactly the references dealt to each side.
    pub fn find(input: &mut PrimRefList, left: &mut PrimRefList, right: &mut PrimRefList) -> Self {
        let mut split = Self {
            left_bounds: Aabb3::EMPTY,
            left_count: 0,
            right_bounds: Aabb3::EMPTY,
            right_count: 0,
        };
        let mut num = 0_usize;
        while let Some(block) = input.take() {
            for prim in block.as_slice() {
                if num % 2 == 1 {
                    split.left_count += 1;
                    split.left_bounds.extend(&prim.bounds);
                    left.push(*prim);
                } else {
                    split.right_count += 1;
                    split.right_bounds.extend(&prim.bounds);
                    right.push(*prim);
                }
                num += 1;
            }
        }
        log::debug!(
            "fallback split: {} left, {} right",
            split.left_count,
            split.right_count
        );
        split
    }
}
