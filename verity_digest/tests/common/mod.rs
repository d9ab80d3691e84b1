//! Independent reference computations built directly on `sha2`.

#![allow(dead_code)]

use sha2::{Digest as _, Sha256, Sha512};
use std::io;

pub const SHA256: u32 = 1;
pub const SHA512: u32 = 2;

pub fn digest_len(alg: u32) -> usize {
    match alg {
        SHA256 => 32,
        SHA512 => 64,
        _ => panic!("unknown algorithm {alg}"),
    }
}

pub fn hash<T: AsRef<[u8]>>(alg: u32, parts: &[T]) -> Vec<u8> {
    match alg {
        SHA256 => {
            let mut h = Sha256::new();
            for part in parts {
                h.update(part.as_ref());
            }
            h.finalize().to_vec()
        }
        SHA512 => {
            let mut h = Sha512::new();
            for part in parts {
                h.update(part.as_ref());
            }
            h.finalize().to_vec()
        }
        _ => panic!("unknown algorithm {alg}"),
    }
}

/// Salt zero-padded to the compression function's block size.
pub fn padded_salt(alg: u32, salt: &[u8]) -> Vec<u8> {
    if salt.is_empty() {
        return Vec::new();
    }
    let unit = match alg {
        SHA256 => 64,
        _ => 128,
    };
    let mut padded = salt.to_vec();
    padded.resize(salt.len().div_ceil(unit) * unit, 0);
    padded
}

/// Hash of `salt || block`, the block zero-padded to `block_size`.
pub fn block_hash(alg: u32, salt: &[u8], block: &[u8], block_size: usize) -> Vec<u8> {
    let mut padded = block.to_vec();
    padded.resize(block_size, 0);
    hash(alg, &[&padded_salt(alg, salt), &padded])
}

/// Builds the whole tree in memory, one level at a time.
pub fn reference_root_hash(alg: u32, data: &[u8], block_size: usize, salt: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![0; digest_len(alg)];
    }
    let mut level = data.to_vec();
    loop {
        let next: Vec<u8> = level
            .chunks(block_size)
            .flat_map(|chunk| block_hash(alg, salt, chunk, block_size))
            .collect();
        if level.len() <= block_size {
            return next;
        }
        level = next;
    }
}

/// The 256-byte descriptor, laid out field by field.
pub fn reference_descriptor(
    alg: u32,
    block_size: usize,
    salt: &[u8],
    file_size: u64,
    root: &[u8],
) -> Vec<u8> {
    let mut desc = vec![0u8; 256];
    desc[0] = 1;
    desc[1] = alg as u8;
    desc[2] = block_size.trailing_zeros() as u8;
    desc[3] = salt.len() as u8;
    desc[8..16].copy_from_slice(&file_size.to_le_bytes());
    desc[16..16 + root.len()].copy_from_slice(root);
    desc[80..80 + salt.len()].copy_from_slice(salt);
    desc
}

pub fn reference_digest(alg: u32, data: &[u8], block_size: usize, salt: &[u8]) -> Vec<u8> {
    let root = reference_root_hash(alg, data, block_size, salt);
    let desc = reference_descriptor(alg, block_size, salt, data.len() as u64, &root);
    hash(alg, &[&desc])
}

/// Source serving `data` front to back.
pub fn slice_source(data: &[u8]) -> impl FnMut(&mut [u8]) -> io::Result<()> + '_ {
    let mut remaining = data;
    move |buf: &mut [u8]| -> io::Result<()> {
        if buf.len() > remaining.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let (head, tail) = remaining.split_at(buf.len());
        buf.copy_from_slice(head);
        remaining = tail;
        Ok(())
    }
}

/// Source that must never be read from.
pub fn unreadable(_: &mut [u8]) -> io::Result<()> {
    panic!("byte source was read")
}

/// Deterministic pseudo-random bytes.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(2_654_435_761).to_le_bytes()[1] ^ seed)
        .collect()
}
