//! The fixed-layout verity descriptor whose hash is the file digest.

use bytemuck_derive::{Pod, Zeroable};
use verity_hash::{HashAlgorithm, MAX_DIGEST_SIZE};

use crate::params::{MAX_SALT_SIZE, MerkleTreeParams, VERITY_VERSION};

/// Serialized size of [`Descriptor`].
pub const DESCRIPTOR_SIZE: usize = 256;

/// Merkle tree properties as hashed into the file digest.
///
/// Every field is a byte or byte array, so the struct has no padding and its
/// in-memory bytes are the wire format. Integers are stored little-endian.
///
/// | offset | size | field |
/// |-------:|-----:|-------|
/// | 0   | 1   | version |
/// | 1   | 1   | hash_algorithm |
/// | 2   | 1   | log_blocksize |
/// | 3   | 1   | salt_size |
/// | 4   | 4   | sig_size (always 0) |
/// | 8   | 8   | data_size |
/// | 16  | 64  | root_hash |
/// | 80  | 32  | salt |
/// | 112 | 144 | reserved |
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Descriptor {
    pub version: u8,
    pub hash_algorithm: u8,
    pub log_blocksize: u8,
    pub salt_size: u8,
    pub sig_size: [u8; 4],
    pub data_size: [u8; 8],
    pub root_hash: [u8; MAX_DIGEST_SIZE],
    pub salt: [u8; MAX_SALT_SIZE],
    pub reserved: [u8; 144],
}

const _: () = {
    use core::mem::{offset_of, size_of};
    assert!(size_of::<Descriptor>() == DESCRIPTOR_SIZE);
    assert!(offset_of!(Descriptor, version) == 0);
    assert!(offset_of!(Descriptor, hash_algorithm) == 1);
    assert!(offset_of!(Descriptor, log_blocksize) == 2);
    assert!(offset_of!(Descriptor, salt_size) == 3);
    assert!(offset_of!(Descriptor, sig_size) == 4);
    assert!(offset_of!(Descriptor, data_size) == 8);
    assert!(offset_of!(Descriptor, root_hash) == 16);
    assert!(offset_of!(Descriptor, salt) == 80);
    assert!(offset_of!(Descriptor, reserved) == 112);
};

impl Descriptor {
    /// Descriptor for validated `params`, with the root hash still zero.
    pub(crate) fn from_params(params: &MerkleTreeParams<'_>, alg: &dyn HashAlgorithm) -> Self {
        let salt = params.salt_bytes();
        let mut desc: Descriptor = bytemuck::Zeroable::zeroed();
        desc.version = VERITY_VERSION as u8;
        desc.hash_algorithm = alg.id() as u8;
        desc.log_blocksize = params.block_size.trailing_zeros() as u8;
        desc.salt_size = salt.len() as u8;
        desc.data_size = params.file_size.to_le_bytes();
        desc.salt[..salt.len()].copy_from_slice(salt);
        desc
    }

    pub fn file_size(&self) -> u64 {
        u64::from_le_bytes(self.data_size)
    }

    pub fn sig_size(&self) -> u32 {
        u32::from_le_bytes(self.sig_size)
    }

    pub fn block_size(&self) -> u64 {
        1u64 << self.log_blocksize
    }

    /// The first `digest_size` bytes of the root hash field.
    pub(crate) fn root_hash_mut(&mut self, digest_size: usize) -> &mut [u8] {
        &mut self.root_hash[..digest_size]
    }

    /// The exact bytes that are hashed into the file digest.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
