//! Stack frame layout tracking
//!
//! One block per lexical frame. A block records its slots in declaration
//! order; offsets are byte distances from the frame base the generator keeps
//! in the base-pointer register. Offsets are 8-bit and wrap, matching the
//! register they are added to.

use std::num::Wrapping;

/// An 8-bit frame offset; negative distances are two's complement
pub type FrameOffset = Wrapping<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    size: u8,
}

#[derive(Debug)]
struct Block {
    enclosing: Option<BlockId>,
    slots: Vec<Slot>,
    /// Offset most recently handed out by `offset_from_last`
    last_offset: FrameOffset,
}

impl Block {
    fn new(enclosing: Option<BlockId>) -> Self {
        Self {
            enclosing,
            slots: Vec::new(),
            last_offset: Wrapping(0),
        }
    }

    fn local_offset(&self, name: &str) -> Option<FrameOffset> {
        let mut offset = Wrapping(0u8);
        for slot in &self.slots {
            if slot.name == name {
                return Some(offset);
            }
            offset += Wrapping(slot.size);
        }
        None
    }

    fn size(&self) -> usize {
        self.slots.iter().map(|s| s.size as usize).sum()
    }
}

/// Chain of frame layouts
#[derive(Debug)]
pub struct FrameTracker {
    blocks: Vec<Block>,
    current: BlockId,
}

impl FrameTracker {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new(None)],
            current: BlockId(0),
        }
    }

    pub fn root(&self) -> BlockId {
        BlockId(0)
    }

    pub fn current(&self) -> BlockId {
        self.current
    }

    /// Create a child block of `parent`. The new block is not entered.
    pub fn with_enclosing(&mut self, parent: BlockId) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block::new(Some(parent)));
        id
    }

    pub fn enter(&mut self, id: BlockId) {
        self.current = id;
    }

    /// Append a slot to the current block
    pub fn push(&mut self, name: impl Into<String>, size: u8) {
        self.blocks[self.current.0].slots.push(Slot {
            name: name.into(),
            size,
        });
    }

    /// Total units declared in the current block
    pub fn size(&self) -> usize {
        self.blocks[self.current.0].size()
    }

    /// Offset of `name` from the current frame base. Names owned by an
    /// enclosing block sit below the saved frame-base word:
    /// `outer_offset - outer_size - 1`.
    pub fn offset(&self, name: &str) -> Option<FrameOffset> {
        self.offset_in(self.current, name)
    }

    fn offset_in(&self, id: BlockId, name: &str) -> Option<FrameOffset> {
        let block = &self.blocks[id.0];
        if let Some(offset) = block.local_offset(name) {
            return Some(offset);
        }
        let parent = block.enclosing?;
        let outer = self.offset_in(parent, name)?;
        let outer_size = Wrapping(self.blocks[parent.0].size() as u8);
        Some(outer - outer_size - Wrapping(1))
    }

    /// Offset of `name` relative to the previously requested one in the
    /// current block. The result is what must be added to an already
    /// displaced base register to reach the slot.
    pub fn offset_from_last(&mut self, name: &str) -> Option<FrameOffset> {
        let absolute = self.offset(name)?;
        let block = &mut self.blocks[self.current.0];
        let delta = absolute - block.last_offset;
        block.last_offset = absolute;
        Some(delta)
    }

    /// Displacement currently applied to the base register in this block
    pub fn last_offset(&self) -> FrameOffset {
        self.blocks[self.current.0].last_offset
    }

    /// Forget cached displacements in the current block and all enclosing ones
    pub fn reset_cache(&mut self) {
        let mut id = Some(self.current);
        while let Some(block_id) = id {
            let block = &mut self.blocks[block_id.0];
            block.last_offset = Wrapping(0);
            id = block.enclosing;
        }
    }
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(v: u8) -> FrameOffset {
        Wrapping(v)
    }

    #[test]
    fn test_offsets_are_prefix_sums() {
        let mut frames = FrameTracker::new();
        let sizes = [1u8, 2, 2, 1, 2];
        for (i, size) in sizes.iter().enumerate() {
            frames.push(format!("v{i}"), *size);
        }

        let mut expected = 0u8;
        for (i, size) in sizes.iter().enumerate() {
            assert_eq!(frames.offset(&format!("v{i}")), Some(w(expected)));
            expected += size;
        }
        assert_eq!(frames.size(), 8);
    }

    #[test]
    fn test_enclosing_offset_skips_saved_base() {
        let mut frames = FrameTracker::new();
        frames.push("a", 1);
        frames.push("b", 2);

        let child = frames.with_enclosing(frames.root());
        frames.enter(child);
        frames.push("c", 1);

        assert_eq!(frames.offset("c"), Some(w(0)));
        // b: 1 - 3 - 1 = -3
        assert_eq!(frames.offset("b"), Some(w(0u8.wrapping_sub(3))));
        assert_eq!(frames.offset("a"), Some(w(0u8.wrapping_sub(4))));
    }

    #[test]
    fn test_empty_interposed_blocks() {
        let mut frames = FrameTracker::new();
        frames.push("a", 2);
        frames.push("b", 1);

        let mut parent = frames.root();
        for depth in 1..=4u8 {
            let child = frames.with_enclosing(parent);
            frames.enter(child);
            parent = child;

            // First hop: 2 - 3 - 1; each further empty block: -0 - 1
            let expected = 2u8.wrapping_sub(3).wrapping_sub(1).wrapping_sub(depth - 1);
            assert_eq!(frames.offset("b"), Some(w(expected)), "depth {depth}");
        }
    }

    #[test]
    fn test_missing_name() {
        let mut frames = FrameTracker::new();
        frames.push("a", 1);
        let child = frames.with_enclosing(frames.root());
        frames.enter(child);
        assert_eq!(frames.offset("zzz"), None);
        assert_eq!(frames.offset_from_last("zzz"), None);
    }

    #[test]
    fn test_offset_from_last_is_incremental() {
        let mut frames = FrameTracker::new();
        frames.push("a", 1);
        frames.push("b", 2);
        frames.push("c", 1);

        assert_eq!(frames.offset_from_last("b"), Some(w(1)));
        assert_eq!(frames.offset_from_last("c"), Some(w(2)));
        assert_eq!(frames.offset_from_last("c"), Some(w(0)));
        assert_eq!(frames.offset_from_last("a"), Some(w(0u8.wrapping_sub(3))));
        assert_eq!(frames.last_offset(), w(0));

        frames.offset_from_last("c");
        frames.reset_cache();
        assert_eq!(frames.last_offset(), w(0));
        assert_eq!(frames.offset_from_last("c"), Some(w(3)));
    }

    #[test]
    fn test_reset_cache_propagates_outward() {
        let mut frames = FrameTracker::new();
        frames.push("a", 1);
        frames.push("b", 1);
        frames.offset_from_last("b");

        let child = frames.with_enclosing(frames.root());
        frames.enter(child);
        frames.push("c", 1);
        frames.offset_from_last("c");
        frames.reset_cache();

        frames.enter(frames.root());
        assert_eq!(frames.last_offset(), w(0));
    }
}
