//! Merkle tree parameters and their validation.

use tracing::error;
use verity_hash::{DEFAULT_HASH_ALGORITHM, HashAlgorithm, find_hash_alg_by_id};

use crate::error::{DigestError, Result};

/// The only descriptor version there is.
pub const VERITY_VERSION: u32 = 1;

pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Width of the salt field in the descriptor.
pub const MAX_SALT_SIZE: usize = 32;

pub const RESERVED_WORDS: usize = 11;

/// Parameters of one digest computation.
///
/// Fields are public so callers can build them directly; the builder methods
/// cover the common cases. Nothing is checked until [`validate`](Self::validate)
/// (or [`compute_digest`](crate::compute_digest)) runs.
///
/// ```rust
/// use verity_digest::MerkleTreeParams;
///
/// let params = MerkleTreeParams::new(8192)
///     .with_block_size(1024)
///     .with_salt(b"pepper");
/// assert_eq!(params.salt_size, 6);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleTreeParams<'a> {
    /// Must be [`VERITY_VERSION`].
    pub version: u32,
    pub hash_algorithm: u32,
    /// Size of data and tree blocks; a power of two.
    pub block_size: u32,
    pub salt_size: u32,
    pub salt: Option<&'a [u8]>,
    pub file_size: u64,
    /// Must be all zero.
    pub reserved: [u64; RESERVED_WORDS],
}

impl Default for MerkleTreeParams<'_> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<'a> MerkleTreeParams<'a> {
    /// Version 1, SHA-256, 4096-byte blocks, no salt.
    pub fn new(file_size: u64) -> Self {
        Self {
            version: VERITY_VERSION,
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            block_size: DEFAULT_BLOCK_SIZE,
            salt_size: 0,
            salt: None,
            file_size,
            reserved: [0; RESERVED_WORDS],
        }
    }

    pub fn with_hash_algorithm(mut self, hash_algorithm: u32) -> Self {
        self.hash_algorithm = hash_algorithm;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the salt and its size together.
    pub fn with_salt(mut self, salt: &'a [u8]) -> Self {
        self.salt_size = u32::try_from(salt.len()).unwrap_or(u32::MAX);
        self.salt = Some(salt);
        self
    }

    /// The `salt_size` salt bytes that go into the tree, empty when unsalted.
    ///
    /// Only meaningful on validated parameters.
    pub fn salt_bytes(&self) -> &'a [u8] {
        match self.salt {
            Some(salt) if self.salt_size != 0 => {
                &salt[..(self.salt_size as usize).min(salt.len())]
            }
            _ => &[],
        }
    }

    /// Check the parameters and resolve the hash algorithm.
    ///
    /// Checks run in a fixed order and the first failure is reported. No
    /// reading or allocation happens before this succeeds.
    pub fn validate(&self) -> Result<&'static dyn HashAlgorithm> {
        if self.version != VERITY_VERSION {
            error!(version = self.version, "unsupported version");
            return Err(DigestError::UnsupportedVersion(self.version));
        }
        if !self.block_size.is_power_of_two() {
            error!(block_size = self.block_size, "unsupported block size");
            return Err(DigestError::InvalidBlockSize(self.block_size));
        }
        if self.salt_size as usize > MAX_SALT_SIZE {
            error!(salt_size = self.salt_size, "unsupported salt size");
            return Err(DigestError::SaltTooLarge(self.salt_size));
        }
        if self.salt_size != 0 {
            let Some(salt) = self.salt else {
                error!(salt_size = self.salt_size, "salt_size specified, but salt is missing");
                return Err(DigestError::MissingSalt);
            };
            if salt.len() < self.salt_size as usize {
                error!(salt_size = self.salt_size, got = salt.len(), "salt shorter than salt_size");
                return Err(DigestError::SaltTooShort {
                    expected: self.salt_size,
                    got: salt.len(),
                });
            }
        }
        if self.reserved.iter().any(|&word| word != 0) {
            error!("reserved bits set in merkle tree parameters");
            return Err(DigestError::ReservedBitsSet);
        }

        let Some(alg) = find_hash_alg_by_id(self.hash_algorithm) else {
            error!(hash_algorithm = self.hash_algorithm, "unknown hash algorithm");
            return Err(DigestError::UnknownHashAlgorithm(self.hash_algorithm));
        };
        if (self.block_size as usize) < alg.digest_size() {
            error!(
                block_size = self.block_size,
                digest_size = alg.digest_size(),
                "block size smaller than digest"
            );
            return Err(DigestError::BlockSmallerThanDigest {
                block_size: self.block_size,
                digest_size: alg.digest_size(),
            });
        }
        Ok(alg)
    }
}
