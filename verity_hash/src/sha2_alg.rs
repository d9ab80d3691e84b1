//! SHA-2 family algorithms backed by the `sha2` crate.

use std::marker::PhantomData;

use sha2::digest::{Digest, FixedOutputReset};

use crate::{HASH_ALG_SHA256, HASH_ALG_SHA512, HashAlgorithm, HashContext};

pub static SHA256: Sha2Algorithm<sha2::Sha256> = Sha2Algorithm::new(HASH_ALG_SHA256, "sha256", 64);
pub static SHA512: Sha2Algorithm<sha2::Sha512> = Sha2Algorithm::new(HASH_ALG_SHA512, "sha512", 128);

/// A SHA-2 variant registered under a descriptor id.
pub struct Sha2Algorithm<D> {
    id: u32,
    name: &'static str,
    block_size: usize,
    _digest: PhantomData<fn() -> D>,
}

impl<D> Sha2Algorithm<D> {
    const fn new(id: u32, name: &'static str, block_size: usize) -> Self {
        Self {
            id,
            name,
            block_size,
            _digest: PhantomData,
        }
    }
}

impl<D> std::fmt::Debug for Sha2Algorithm<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha2Algorithm")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<D> HashAlgorithm for Sha2Algorithm<D>
where
    D: Digest + FixedOutputReset + 'static,
{
    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn digest_size(&self) -> usize {
        <D as Digest>::output_size()
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn new_context(&self) -> Box<dyn HashContext> {
        Box::new(Sha2Context(D::new()))
    }
}

struct Sha2Context<D>(D);

impl<D: Digest + FixedOutputReset> HashContext for Sha2Context<D> {
    fn init(&mut self) {
        Digest::reset(&mut self.0);
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize_into(&mut self, out: &mut [u8]) {
        out.copy_from_slice(&Digest::finalize_reset(&mut self.0));
    }
}
