//! Byte sources feeding file data to the tree builder.

use std::io::{self, Read};

/// Supplies file contents in order.
///
/// Each call must fill `buf` completely with the next bytes of the file, or
/// fail. The builder asks for consecutive block-sized chunks and never seeks,
/// so the source tracks its own position.
pub trait ReadBlock {
    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<()>;
}

impl<F> ReadBlock for F
where
    F: FnMut(&mut [u8]) -> io::Result<()>,
{
    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self(buf)
    }
}

/// Adapts any [`Read`] into a [`ReadBlock`] using `read_exact`.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    bytes_read: u64,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
        }
    }

    /// Bytes delivered so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ReadBlock for ReaderSource<R> {
    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.reader.read_exact(buf)?;
        self.bytes_read += buf.len() as u64;
        Ok(())
    }
}
