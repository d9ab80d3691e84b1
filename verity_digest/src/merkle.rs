//! Streaming Merkle tree root hash.
//!
//! The file is consumed one block at a time. Each data block is hashed (with
//! the salt) into the pending block of tree level 0; whenever a pending block
//! can no longer take another digest it is hashed into the level above, and so
//! on up to the root. Only one pending block per level is kept, so memory is
//! bounded by the tree depth times the block size, never by the file size.

use tracing::{debug, error, trace, warn};
use verity_hash::{HashAlgorithm, HashContext, MAX_DIGEST_SIZE};

use crate::buffer::{Level, TreeLevels};
use crate::error::{DigestError, InvariantViolation, Result};
use crate::ReadBlock;

/// Deepest tree the descriptor format allows.
pub const MAX_LEVELS: usize = 64;

/// Number of tree levels above the data for `data_blocks` blocks when every
/// tree block holds `hashes_per_block` digests.
///
/// A single data block needs no tree levels: its hash is the root.
pub fn tree_depth(data_blocks: u64, hashes_per_block: u64) -> Result<usize> {
    let mut num_levels = 0;
    let mut blocks = data_blocks;
    while blocks > 1 {
        if num_levels >= MAX_LEVELS {
            warn!(data_blocks, hashes_per_block, max = MAX_LEVELS, "Merkle tree too deep");
            return Err(DigestError::TreeTooDeep { max: MAX_LEVELS });
        }
        num_levels += 1;
        blocks = blocks.div_ceil(hashes_per_block);
    }
    Ok(num_levels)
}

/// Copy `salt` into a zeroed buffer rounded up to the hash's internal block
/// size. An empty salt stays empty and contributes nothing to block hashes.
fn pad_salt(salt: &[u8], hash_block_size: usize) -> Result<Vec<u8>> {
    let mut padded = Vec::new();
    if salt.is_empty() {
        return Ok(padded);
    }
    let padded_len = salt.len().next_multiple_of(hash_block_size.max(1));
    padded.try_reserve_exact(padded_len)?;
    padded.extend_from_slice(salt);
    padded.resize(padded_len, 0);
    Ok(padded)
}

/// Hashes full pending blocks into the level above.
struct Cascade<'a> {
    ctx: Box<dyn HashContext>,
    digest_size: usize,
    block_size: usize,
    padded_salt: &'a [u8],
}

impl<'a> Cascade<'a> {
    fn new(alg: &dyn HashAlgorithm, block_size: usize, padded_salt: &'a [u8]) -> Self {
        Self {
            ctx: alg.new_context(),
            digest_size: alg.digest_size(),
            block_size,
            padded_salt,
        }
    }

    /// Zero-pad the pending block of `level`, hash `salt || block` into the
    /// parent level and empty `level`.
    ///
    /// Returns `true` when the parent is a tree level that could not take one
    /// more digest, i.e. it must itself be advanced before anything else is
    /// appended to it. Filling the root never reports saturation.
    fn advance(&mut self, levels: &mut TreeLevels<'_>, level: Level) -> Result<bool> {
        let parent = level
            .parent(levels.num_levels())
            .ok_or(InvariantViolation::CascadePastRoot)?;

        let mut digest = [0u8; MAX_DIGEST_SIZE];
        let digest = &mut digest[..self.digest_size];
        {
            let current = levels
                .get_mut(level)
                .ok_or(InvariantViolation::CascadePastRoot)?;
            if current.is_empty() {
                return Err(InvariantViolation::EmptyBlock(level).into());
            }
            let block = current.padded_block();
            self.ctx.init();
            self.ctx.update(self.padded_salt);
            self.ctx.update(block);
            self.ctx.finalize_into(digest);
            current.clear();
        }

        let next = levels
            .get_mut(parent)
            .ok_or(InvariantViolation::CascadePastRoot)?;
        if !next.append(digest) {
            return Err(InvariantViolation::LevelOverflow(parent).into());
        }
        // The root holds exactly one digest and has no parent to flush into.
        let saturated =
            parent != Level::Root && next.filled() + self.digest_size > self.block_size;
        trace!(?level, ?parent, filled = next.filled(), saturated, "hashed block");
        Ok(saturated)
    }
}

/// Compute the Merkle tree root hash of `file_size` bytes read from `source`,
/// writing it into `root_hash`.
///
/// `root_hash` must be exactly `alg.digest_size()` bytes long. An empty file
/// has an all-zero root hash and `source` is never called. Otherwise `source`
/// is asked for consecutive chunks of `block_size` bytes, the last one
/// possibly shorter.
///
/// The salt is zero-padded to a multiple of the hash's internal block size and
/// that padded form is what gets prepended to every block.
pub fn compute_root_hash<S: ReadBlock + ?Sized>(
    source: &mut S,
    alg: &dyn HashAlgorithm,
    file_size: u64,
    block_size: u32,
    salt: &[u8],
    root_hash: &mut [u8],
) -> Result<()> {
    let digest_size = alg.digest_size();
    if digest_size == 0 || digest_size > MAX_DIGEST_SIZE {
        return Err(DigestError::UnsupportedDigestSize(digest_size));
    }
    if root_hash.len() != digest_size {
        return Err(InvariantViolation::RootSlotSize {
            got: root_hash.len(),
            expected: digest_size,
        }
        .into());
    }
    if (block_size as usize) < digest_size {
        return Err(DigestError::BlockSmallerThanDigest {
            block_size,
            digest_size,
        });
    }

    if file_size == 0 {
        root_hash.fill(0);
        return Ok(());
    }

    let block_len = u64::from(block_size);
    let hashes_per_block = block_len / digest_size as u64;
    let num_levels = tree_depth(file_size.div_ceil(block_len), hashes_per_block)?;
    debug!(num_levels, hashes_per_block, "Merkle tree depth");

    let block_size = block_size as usize;
    let padded_salt = pad_salt(salt, alg.block_size())?;
    let mut levels = TreeLevels::new(num_levels, block_size, root_hash)?;
    let mut cascade = Cascade::new(alg, block_size, &padded_salt);

    let mut offset = 0u64;
    while offset < file_size {
        let len = block_len.min(file_size - offset) as usize;
        if let Err(err) = levels.data_mut().load(source, len) {
            error!(offset, len, %err, "error reading file");
            return Err(err.into());
        }

        let mut level = Level::Data;
        while cascade.advance(&mut levels, level)? {
            level = match level.parent(num_levels) {
                Some(next @ Level::Tree(_)) => next,
                _ => {
                    error!(offset, ?level, "cascade went past the last tree level");
                    return Err(InvariantViolation::CascadePastRoot.into());
                }
            };
        }
        offset += block_len;
    }

    // Flush partial blocks bottom-up. A flush only pushes into the level
    // above, so one ascending sweep drains every level exactly once.
    for i in 0..num_levels {
        let level = Level::Tree(i);
        let pending = levels.get(level).is_some_and(|buf| !buf.is_empty());
        if pending {
            cascade.advance(&mut levels, level)?;
        }
    }
    if let Some(i) = levels.first_nonempty_tree_level() {
        error!(level = i, "tree level not drained");
        return Err(InvariantViolation::LevelNotDrained(i).into());
    }

    let filled = levels.root().filled();
    if filled != digest_size {
        error!(filled, digest_size, "root hash not filled");
        return Err(InvariantViolation::RootNotFilled {
            filled,
            expected: digest_size,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_hash::SHA256;

    #[test]
    fn depth_of_small_trees() {
        assert_eq!(tree_depth(0, 128).unwrap(), 0);
        assert_eq!(tree_depth(1, 128).unwrap(), 0);
        assert_eq!(tree_depth(2, 128).unwrap(), 1);
        assert_eq!(tree_depth(128, 128).unwrap(), 1);
        assert_eq!(tree_depth(129, 128).unwrap(), 2);
        assert_eq!(tree_depth(128 * 128, 128).unwrap(), 2);
        assert_eq!(tree_depth(128 * 128 + 1, 128).unwrap(), 3);
    }

    #[test]
    fn depth_at_level_limit() {
        assert_eq!(tree_depth(1 << 63, 2).unwrap(), 63);
        assert_eq!(tree_depth((1 << 63) + 1, 2).unwrap(), MAX_LEVELS);
        assert_eq!(tree_depth(u64::MAX, 2).unwrap(), MAX_LEVELS);
    }

    #[test]
    fn depth_past_level_limit() {
        // One digest per block never shrinks the level count.
        assert!(matches!(
            tree_depth(2, 1),
            Err(DigestError::TreeTooDeep { max: MAX_LEVELS })
        ));
        assert_eq!(tree_depth(1, 1).unwrap(), 0);
    }

    #[test]
    fn salt_padding() {
        assert!(pad_salt(&[], 64).unwrap().is_empty());

        let padded = pad_salt(&[1, 2, 3], 64).unwrap();
        assert_eq!(padded.len(), 64);
        assert_eq!(&padded[..3], &[1, 2, 3]);
        assert!(padded[3..].iter().all(|&b| b == 0));

        assert_eq!(pad_salt(&[7; 32], 128).unwrap().len(), 128);
        assert_eq!(pad_salt(&[7; 64], 64).unwrap().len(), 64);
    }

    #[test]
    fn advance_reports_saturation_one_digest_early() {
        // 64-byte blocks hold two SHA-256 digests.
        let mut root = [0u8; 32];
        let mut levels = TreeLevels::new(1, 64, &mut root).unwrap();
        let mut cascade = Cascade::new(&SHA256, 64, &[]);

        assert!(levels.data_mut().append(&[1]));
        assert!(!cascade.advance(&mut levels, Level::Data).unwrap());
        assert_eq!(levels.get(Level::Tree(0)).unwrap().filled(), 32);
        assert!(levels.get(Level::Data).unwrap().is_empty());

        assert!(levels.data_mut().append(&[2]));
        assert!(cascade.advance(&mut levels, Level::Data).unwrap());
        assert_eq!(levels.get(Level::Tree(0)).unwrap().filled(), 64);

        assert!(!cascade.advance(&mut levels, Level::Tree(0)).unwrap());
        assert_eq!(levels.root().filled(), 32);
    }

    #[test]
    fn filling_the_root_never_saturates() {
        // A 32-byte block has room for exactly one SHA-256 digest.
        let mut root = [0u8; 32];
        let mut levels = TreeLevels::new(0, 32, &mut root).unwrap();
        let mut cascade = Cascade::new(&SHA256, 32, &[]);
        assert!(levels.data_mut().append(&[1]));
        assert!(!cascade.advance(&mut levels, Level::Data).unwrap());
        assert_eq!(levels.root().filled(), 32);
    }

    #[test]
    fn single_block_as_large_as_the_digest() {
        let mut reads = 0;
        let mut source = |buf: &mut [u8]| -> std::io::Result<()> {
            reads += 1;
            buf.fill(0x42);
            Ok(())
        };
        let mut root = [0u8; 32];
        compute_root_hash(&mut source, &SHA256, 20, 32, &[], &mut root).unwrap();
        assert_eq!(reads, 1);

        let mut block = [0x42u8; 32];
        block[20..].fill(0);
        let mut expected = [0u8; 32];
        SHA256.hash_full(&block, &mut expected);
        assert_eq!(root, expected);
    }

    struct NullContext;

    impl HashContext for NullContext {
        fn init(&mut self) {}
        fn update(&mut self, _data: &[u8]) {}
        fn finalize_into(&mut self, out: &mut [u8]) {
            out.fill(0);
        }
    }

    struct OddSizedHash(usize);

    impl HashAlgorithm for OddSizedHash {
        fn id(&self) -> u32 {
            99
        }
        fn name(&self) -> &'static str {
            "odd"
        }
        fn digest_size(&self) -> usize {
            self.0
        }
        fn block_size(&self) -> usize {
            64
        }
        fn new_context(&self) -> Box<dyn HashContext> {
            Box::new(NullContext)
        }
    }

    #[test]
    fn digest_sizes_outside_the_root_field_are_rejected() {
        for size in [0, MAX_DIGEST_SIZE + 1] {
            let mut source = |_: &mut [u8]| -> std::io::Result<()> {
                panic!("source must not be read");
            };
            let mut root = vec![0u8; size];
            assert!(matches!(
                compute_root_hash(&mut source, &OddSizedHash(size), 10, 4096, &[], &mut root),
                Err(DigestError::UnsupportedDigestSize(got)) if got == size
            ));
        }
    }

    #[test]
    fn advance_rejects_empty_block() {
        let mut root = [0u8; 32];
        let mut levels = TreeLevels::new(0, 64, &mut root).unwrap();
        let mut cascade = Cascade::new(&SHA256, 64, &[]);
        assert!(matches!(
            cascade.advance(&mut levels, Level::Data),
            Err(DigestError::Invariant(InvariantViolation::EmptyBlock(Level::Data)))
        ));
    }

    #[test]
    fn advance_past_root_is_an_invariant_violation() {
        let mut root = [0u8; 32];
        let mut levels = TreeLevels::new(1, 64, &mut root).unwrap();
        let mut cascade = Cascade::new(&SHA256, 64, &[]);
        for level in [Level::Tree(1), Level::Root] {
            assert!(matches!(
                cascade.advance(&mut levels, level),
                Err(DigestError::Invariant(InvariantViolation::CascadePastRoot))
            ));
        }
    }

    #[test]
    fn full_root_overflows() {
        let mut root = [0u8; 32];
        let mut levels = TreeLevels::new(0, 64, &mut root).unwrap();
        let mut cascade = Cascade::new(&SHA256, 64, &[]);
        assert!(levels.data_mut().append(&[1]));
        cascade.advance(&mut levels, Level::Data).unwrap();
        assert!(levels.data_mut().append(&[2]));
        assert!(matches!(
            cascade.advance(&mut levels, Level::Data),
            Err(DigestError::Invariant(InvariantViolation::LevelOverflow(Level::Root)))
        ));
    }

    #[test]
    fn root_slot_must_match_digest_size() {
        let mut source = |_: &mut [u8]| -> std::io::Result<()> { Ok(()) };
        let mut root = [0u8; 16];
        assert!(matches!(
            compute_root_hash(&mut source, &SHA256, 10, 4096, &[], &mut root),
            Err(DigestError::Invariant(InvariantViolation::RootSlotSize {
                got: 16,
                expected: 32
            }))
        ));
    }

    #[test]
    fn empty_file_never_reads() {
        let mut reads = 0;
        let mut source = |_: &mut [u8]| -> std::io::Result<()> {
            reads += 1;
            Ok(())
        };
        let mut root = [0xffu8; 32];
        compute_root_hash(&mut source, &SHA256, 0, 4096, b"salt", &mut root).unwrap();
        assert_eq!(reads, 0);
        assert_eq!(root, [0u8; 32]);
    }

    #[test]
    fn reads_block_sized_chunks() {
        let mut requests = Vec::new();
        let mut source = |buf: &mut [u8]| -> std::io::Result<()> {
            requests.push(buf.len());
            buf.fill(0x5a);
            Ok(())
        };
        let mut root = [0u8; 32];
        compute_root_hash(&mut source, &SHA256, 64 * 5 + 3, 64, &[], &mut root).unwrap();
        assert_eq!(requests, vec![64, 64, 64, 64, 64, 3]);
    }
}
