//! File digest computation: validate, build the tree, hash the descriptor.

use std::io::Read;

use tracing::debug;
use verity_hash::hash_name;

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::merkle::compute_root_hash;
use crate::params::MerkleTreeParams;
use crate::source::{ReadBlock, ReaderSource};

/// A computed file digest, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: u16,
    bytes: Vec<u8>,
}

impl Digest {
    /// Id of the hash algorithm that produced the digest.
    pub fn algorithm(&self) -> u16 {
        self.algorithm
    }

    pub fn algorithm_name(&self) -> Option<&'static str> {
        hash_name(u32::from(self.algorithm))
    }

    pub fn digest_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Compute the verity digest of `params.file_size` bytes supplied by `source`.
///
/// The parameters are validated first; on failure `source` is never called.
/// A failing `source` aborts the computation and its error comes back as
/// [`DigestError::Io`](crate::DigestError::Io).
///
/// ```rust
/// use verity_digest::{compute_digest, MerkleTreeParams, ReaderSource};
///
/// let data = vec![0u8; 10_000];
/// let params = MerkleTreeParams::new(data.len() as u64);
/// let digest = compute_digest(&mut ReaderSource::new(&data[..]), &params).unwrap();
/// assert_eq!(digest.algorithm_name(), Some("sha256"));
/// assert_eq!(digest.digest_size(), 32);
/// ```
pub fn compute_digest<S: ReadBlock + ?Sized>(
    source: &mut S,
    params: &MerkleTreeParams<'_>,
) -> Result<Digest> {
    let alg = params.validate()?;
    debug!(
        hash = alg.name(),
        block_size = params.block_size,
        salt_size = params.salt_size,
        file_size = params.file_size,
        "computing verity digest"
    );

    let digest_size = alg.digest_size();
    let mut desc = Descriptor::from_params(params, alg);
    compute_root_hash(
        source,
        alg,
        params.file_size,
        params.block_size,
        params.salt_bytes(),
        desc.root_hash_mut(digest_size),
    )?;

    let mut bytes = Vec::new();
    bytes.try_reserve_exact(digest_size)?;
    bytes.resize(digest_size, 0);
    alg.hash_full(desc.as_bytes(), &mut bytes);

    Ok(Digest {
        // Registered ids are all single-byte values.
        algorithm: alg.id() as u16,
        bytes,
    })
}

/// [`compute_digest`] over a [`Read`]er positioned at the start of the file.
pub fn compute_digest_from_reader<R: Read>(
    reader: R,
    params: &MerkleTreeParams<'_>,
) -> Result<Digest> {
    compute_digest(&mut ReaderSource::new(reader), params)
}
