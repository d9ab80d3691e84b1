//! # verity_hash
//!
//! Hash algorithm capabilities for fs-verity style Merkle trees.
//!
//! Every algorithm is selected by the small integer that the verity descriptor
//! stores in its `hash_algorithm` byte. The set of algorithms lives in a
//! read-only static table, so lookups need no locking and can be shared freely
//! between threads.
//!
//! ```rust
//! use verity_hash::{find_hash_alg_by_name, HashAlgorithm};
//!
//! let alg = find_hash_alg_by_name("sha256").unwrap();
//! assert_eq!(alg.id(), 1);
//! assert_eq!(alg.digest_size(), 32);
//!
//! let mut out = [0u8; 32];
//! alg.hash_full(b"abc", &mut out);
//! ```

mod sha2_alg;

pub use sha2_alg::{SHA256, SHA512, Sha2Algorithm};

/// Algorithm id of SHA-256 in the verity descriptor.
pub const HASH_ALG_SHA256: u32 = 1;
/// Algorithm id of SHA-512 in the verity descriptor.
pub const HASH_ALG_SHA512: u32 = 2;

pub const DEFAULT_HASH_ALGORITHM: u32 = HASH_ALG_SHA256;

/// Largest digest any supported algorithm produces. This is also the width of
/// the root hash field in the descriptor.
pub const MAX_DIGEST_SIZE: usize = 64;

/// Incremental hashing state: init, update, finalize.
pub trait HashContext {
    /// Return to the freshly initialized state, discarding any input.
    fn init(&mut self);

    fn update(&mut self, data: &[u8]);

    /// Write the digest of everything fed since the last `init` into `out`
    /// and reset the state.
    ///
    /// `out` must be exactly `digest_size()` bytes long.
    fn finalize_into(&mut self, out: &mut [u8]);
}

/// A hash primitive as seen by the Merkle tree builder.
pub trait HashAlgorithm: Sync {
    /// Descriptor id of the algorithm.
    fn id(&self) -> u32;

    fn name(&self) -> &'static str;

    /// Size of one digest in bytes.
    fn digest_size(&self) -> usize;

    /// Internal block size of the compression function in bytes.
    fn block_size(&self) -> usize;

    fn new_context(&self) -> Box<dyn HashContext>;

    /// One-shot hash of `data` into `out`.
    fn hash_full(&self, data: &[u8], out: &mut [u8]) {
        let mut ctx = self.new_context();
        ctx.update(data);
        ctx.finalize_into(out);
    }
}

static HASH_ALGORITHMS: [&dyn HashAlgorithm; 2] = [&SHA256, &SHA512];

/// All supported algorithms, in id order.
pub fn hash_algorithms() -> impl Iterator<Item = &'static dyn HashAlgorithm> {
    HASH_ALGORITHMS.iter().copied()
}

pub fn find_hash_alg_by_id(id: u32) -> Option<&'static dyn HashAlgorithm> {
    hash_algorithms().find(|alg| alg.id() == id)
}

pub fn find_hash_alg_by_name(name: &str) -> Option<&'static dyn HashAlgorithm> {
    hash_algorithms().find(|alg| alg.name() == name)
}

/// Digest size of the algorithm with the given id, if it is known.
pub fn digest_size(id: u32) -> Option<usize> {
    find_hash_alg_by_id(id).map(|alg| alg.digest_size())
}

/// Name of the algorithm with the given id, if it is known.
pub fn hash_name(id: u32) -> Option<&'static str> {
    find_hash_alg_by_id(id).map(|alg| alg.name())
}
