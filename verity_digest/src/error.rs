use std::collections::TryReserveError;

use thiserror::Error;

use crate::buffer::Level;

/// Errors returned by the digest computation.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("unsupported version ({0})")]
    UnsupportedVersion(u32),

    #[error("unsupported block size ({0})")]
    InvalidBlockSize(u32),

    #[error("unsupported salt size ({0})")]
    SaltTooLarge(u32),

    #[error("salt_size specified, but salt is missing")]
    MissingSalt,

    #[error("salt_size is {expected}, but only {got} salt bytes were given")]
    SaltTooShort { expected: u32, got: usize },

    #[error("reserved bits set in merkle tree parameters")]
    ReservedBitsSet,

    #[error("unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(u32),

    #[error("block size {block_size} cannot hold a single {digest_size}-byte digest")]
    BlockSmallerThanDigest { block_size: u32, digest_size: usize },

    /// Digest sizes outside `1..=MAX_DIGEST_SIZE` do not fit the descriptor.
    #[error("unsupported digest size ({0})")]
    UnsupportedDigestSize(usize),

    #[error("out of memory allocating Merkle tree buffers")]
    OutOfMemory(#[from] TryReserveError),

    /// The byte source failed; the error is passed through untouched.
    #[error("error reading file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Merkle tree would need more than {max} levels")]
    TreeTooDeep { max: usize },

    #[error("internal error: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Internal consistency failures of the tree builder.
///
/// None of these can happen with a correct depth computation; they abort the
/// computation instead of producing a wrong root hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("cascade went past the root level")]
    CascadePastRoot,

    #[error("{0:?} level was asked to hash an empty block")]
    EmptyBlock(Level),

    #[error("{0:?} level has no room for another digest")]
    LevelOverflow(Level),

    #[error("tree level {0} still holds data after the drain pass")]
    LevelNotDrained(usize),

    #[error("root hash holds {filled} bytes, expected {expected}")]
    RootNotFilled { filled: usize, expected: usize },

    #[error("root hash slot is {got} bytes, expected {expected}")]
    RootSlotSize { got: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, DigestError>;
