//! Print the verity digest of a file.
//!
//! ```text
//! cargo run --example file_digest -- <path> [block_size] [salt]
//! ```

use std::fs::File;
use std::io::BufReader;

use verity_digest::{DEFAULT_BLOCK_SIZE, MerkleTreeParams, compute_digest_from_reader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: file_digest <path> [block_size] [salt]")?;
    let block_size = match args.next() {
        Some(arg) => arg.parse()?,
        None => DEFAULT_BLOCK_SIZE,
    };
    let salt = args.next().map(hex::decode).transpose()?;

    let file = File::open(&path)?;
    let file_size = file.metadata()?.len();

    let mut params = MerkleTreeParams::new(file_size).with_block_size(block_size);
    if let Some(salt) = &salt {
        params = params.with_salt(salt);
    }

    let digest = compute_digest_from_reader(BufReader::new(file), &params)?;
    println!(
        "{}:{} {}",
        digest.algorithm_name().unwrap_or("unknown"),
        hex::encode(digest.as_bytes()),
        path
    );
    Ok(())
}
