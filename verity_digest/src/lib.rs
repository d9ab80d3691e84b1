//! # verity_digest
//!
//! Computes fs-verity style file digests: a salted Merkle tree is built over
//! the file in fixed-size blocks, its root hash is embedded in a fixed-layout
//! [`Descriptor`], and the hash of that descriptor is the digest.
//!
//! File contents are pulled through a [`ReadBlock`] source one block at a
//! time, so memory use depends on the tree depth and block size only.
//!
//! ```rust
//! use verity_digest::{compute_digest, MerkleTreeParams};
//!
//! let data = b"hello, verity".to_vec();
//! let mut remaining = &data[..];
//! let mut source = |buf: &mut [u8]| -> std::io::Result<()> {
//!     let (head, tail) = remaining.split_at(buf.len());
//!     buf.copy_from_slice(head);
//!     remaining = tail;
//!     Ok(())
//! };
//!
//! let params = MerkleTreeParams::new(data.len() as u64).with_salt(b"salt");
//! let digest = compute_digest(&mut source, &params).unwrap();
//! assert_eq!(digest.algorithm(), 1);
//! assert_eq!(digest.as_bytes().len(), 32);
//! ```
//!
//! Logging goes through `tracing`; install a subscriber to see it.

mod buffer;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod merkle;
pub mod params;
pub mod source;

pub use buffer::Level;
pub use descriptor::{DESCRIPTOR_SIZE, Descriptor};
pub use digest::{Digest, compute_digest, compute_digest_from_reader};
pub use error::{DigestError, InvariantViolation};
pub use merkle::{MAX_LEVELS, compute_root_hash, tree_depth};
pub use params::{DEFAULT_BLOCK_SIZE, MAX_SALT_SIZE, MerkleTreeParams, VERITY_VERSION};
pub use source::{ReadBlock, ReaderSource};

pub use verity_hash::{self, HashAlgorithm};
