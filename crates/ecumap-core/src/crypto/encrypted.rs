//! Plaintext view over an encrypted byte store
//!
//! The inner store holds ciphertext. Reads and writes may start and end at
//! any offset: the covering whole blocks are read and decrypted, the
//! caller's window is sliced out (read) or spliced in and re-encrypted
//! (write). Bytes of touched blocks outside the window are preserved.
//!
//! The read-modify-write cycle is not atomic. Callers must serialize
//! overlapping writes; [`MemorySection`](crate::memory::MemorySection)
//! does this with its mutex.

use super::cipher::Cipher;
use crate::error::{CodecError, Result};
use crate::memory::{check_store_range, ByteStore};
use std::ops::Range;

/// Block-aligned encryption wrapper around a ciphertext store
pub struct EncryptedStore {
    inner: Box<dyn ByteStore>,
    cipher: Box<dyn Cipher>,
}

impl EncryptedStore {
    /// Wrap a ciphertext store; the cipher's block size must be non-zero
    pub fn new(inner: Box<dyn ByteStore>, cipher: Box<dyn Cipher>) -> Result<Self> {
        if cipher.block_size() == 0 {
            return Err(CodecError::invalid("cipher block size must be non-zero"));
        }
        Ok(Self { inner, cipher })
    }

    /// Cipher block size in bytes
    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    /// Whole-block ciphertext range covering `[offset, offset + len)`
    pub fn covering_range(&self, offset: u64, len: usize) -> Range<u64> {
        let block = self.block_size() as u64;
        let start = offset / block * block;
        let end = (offset + len as u64).div_ceil(block) * block;
        start..end
    }

    /// Direct access to the ciphertext store
    pub fn inner_mut(&mut self) -> &mut dyn ByteStore {
        self.inner.as_mut()
    }

    /// Unwrap the ciphertext store
    pub fn into_inner(self) -> Box<dyn ByteStore> {
        self.inner
    }

    /// Read and decrypt the blocks covering a window
    fn read_blocks(&mut self, offset: u64, len: usize) -> Result<(Range<u64>, Vec<u8>)> {
        check_store_range(self.inner.len(), offset, len)?;
        let range = self.covering_range(offset, len);
        let span = (range.end - range.start) as usize;
        if range.end > self.inner.len() {
            return Err(CodecError::out_of_range(format!(
                "blocks {:#x}..{:#x} covering {offset:#x}+{len} run past the store end {:#x}",
                range.start,
                range.end,
                self.inner.len()
            )));
        }

        let mut buf = self.inner.read(range.start, span)?;
        if buf.len() != span {
            return Err(CodecError::SizeMismatch {
                expected: span,
                actual: buf.len(),
            });
        }
        self.cipher.decrypt(&mut buf, 0, span)?;
        Ok((range, buf))
    }
}

impl ByteStore for EncryptedStore {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let (range, buf) = self.read_blocks(offset, len)?;
        let start = (offset - range.start) as usize;
        Ok(buf[start..start + len].to_vec())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let (range, mut buf) = self.read_blocks(offset, data.len())?;
        let start = (offset - range.start) as usize;
        buf[start..start + data.len()].copy_from_slice(data);

        let span = buf.len();
        self.cipher.encrypt(&mut buf, 0, span)?;
        tracing::trace!(
            "Re-encrypted blocks {:#x}..{:#x} for {} byte write at {:#x}",
            range.start,
            range.end,
            data.len(),
            offset
        );
        self.inner.write(range.start, &buf)
    }
}
