//! Per-level block buffers of the Merkle tree under construction.

use std::collections::TryReserveError;

use crate::ReadBlock;

/// Position of a buffer in the tree.
///
/// `Data` holds raw file bytes, `Tree(0)` is the level hashing data blocks,
/// each further `Tree(i)` hashes the level below it, and `Root` receives the
/// single digest of the topmost level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Data,
    Tree(usize),
    Root,
}

impl Level {
    /// The level receiving this level's digests in a tree of `num_levels`
    /// tree levels, or `None` above the root.
    pub fn parent(self, num_levels: usize) -> Option<Level> {
        match self {
            Level::Data if num_levels == 0 => Some(Level::Root),
            Level::Data => Some(Level::Tree(0)),
            Level::Tree(i) if i + 1 < num_levels => Some(Level::Tree(i + 1)),
            Level::Tree(i) if i < num_levels => Some(Level::Root),
            Level::Tree(_) | Level::Root => None,
        }
    }
}

/// Where a buffer keeps its bytes.
#[derive(Debug)]
enum Backing<'out> {
    /// Heap block owned by the computation
    Owned(Vec<u8>),

    /// Caller-provided output slot (the root hash)
    Borrowed(&'out mut [u8]),
}

/// A fixed-capacity byte region plus the count of bytes filled so far.
#[derive(Debug)]
pub(crate) struct BlockBuffer<'out> {
    backing: Backing<'out>,
    filled: usize,
}

impl<'out> BlockBuffer<'out> {
    /// Zeroed, owned buffer of `capacity` bytes.
    pub(crate) fn zeroed(capacity: usize) -> Result<Self, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)?;
        data.resize(capacity, 0);
        Ok(Self {
            backing: Backing::Owned(data),
            filled: 0,
        })
    }

    /// Buffer that writes straight into `slot`.
    pub(crate) fn borrowed(slot: &'out mut [u8]) -> Self {
        Self {
            backing: Backing::Borrowed(slot),
            filled: 0,
        }
    }

    fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(data) => data,
            Backing::Borrowed(slot) => slot,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match &mut self.backing {
            Backing::Owned(data) => data,
            Backing::Borrowed(slot) => slot,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.bytes().len()
    }

    pub(crate) fn filled(&self) -> usize {
        self.filled
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Replace the contents with the next `len` bytes of `source`.
    pub(crate) fn load<S: ReadBlock + ?Sized>(
        &mut self,
        source: &mut S,
        len: usize,
    ) -> std::io::Result<()> {
        debug_assert!(len <= self.capacity());
        self.filled = 0;
        source.read_block(&mut self.bytes_mut()[..len])?;
        self.filled = len;
        Ok(())
    }

    /// Zero the unfilled tail and return the whole block.
    pub(crate) fn padded_block(&mut self) -> &[u8] {
        let filled = self.filled;
        self.bytes_mut()[filled..].fill(0);
        self.bytes()
    }

    /// Append `bytes` after the filled region. Returns `false`, leaving the
    /// buffer untouched, if they do not fit.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> bool {
        let start = self.filled;
        let end = start + bytes.len();
        if end > self.capacity() {
            return false;
        }
        self.bytes_mut()[start..end].copy_from_slice(bytes);
        self.filled = end;
        true
    }

    pub(crate) fn clear(&mut self) {
        self.filled = 0;
    }
}

/// Every buffer of one computation, addressed by [`Level`].
///
/// Memory is one block per tree level plus one data block; the root lives in
/// the caller's output slot.
#[derive(Debug)]
pub(crate) struct TreeLevels<'out> {
    data: BlockBuffer<'out>,
    tree: Vec<BlockBuffer<'out>>,
    root: BlockBuffer<'out>,
}

impl<'out> TreeLevels<'out> {
    pub(crate) fn new(
        num_levels: usize,
        block_size: usize,
        root_slot: &'out mut [u8],
    ) -> Result<Self, TryReserveError> {
        let data = BlockBuffer::zeroed(block_size)?;
        let mut tree = Vec::new();
        tree.try_reserve_exact(num_levels)?;
        for _ in 0..num_levels {
            tree.push(BlockBuffer::zeroed(block_size)?);
        }
        Ok(Self {
            data,
            tree,
            root: BlockBuffer::borrowed(root_slot),
        })
    }

    pub(crate) fn num_levels(&self) -> usize {
        self.tree.len()
    }

    pub(crate) fn get(&self, level: Level) -> Option<&BlockBuffer<'out>> {
        match level {
            Level::Data => Some(&self.data),
            Level::Tree(i) => self.tree.get(i),
            Level::Root => Some(&self.root),
        }
    }

    pub(crate) fn get_mut(&mut self, level: Level) -> Option<&mut BlockBuffer<'out>> {
        match level {
            Level::Data => Some(&mut self.data),
            Level::Tree(i) => self.tree.get_mut(i),
            Level::Root => Some(&mut self.root),
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut BlockBuffer<'out> {
        &mut self.data
    }

    pub(crate) fn root(&self) -> &BlockBuffer<'out> {
        &self.root
    }

    /// Index of the lowest tree level still holding bytes.
    pub(crate) fn first_nonempty_tree_level(&self) -> Option<usize> {
        self.tree.iter().position(|buf| !buf.is_empty())
    }
}
