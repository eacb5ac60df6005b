//! Raw byte stores
//!
//! A [`ByteStore`] is the lowest layer: a flat, zero-based run of bytes.
//! It can be a loaded calibration image ([`MemoryStore`]) or a live link to
//! a vehicle supplied by the caller.

use crate::error::{CodecError, Result};
use std::fs;
use std::path::Path;

/// Minimal synchronous byte access contract
///
/// Offsets are relative to the start of the store. Implementations report
/// failures as errors and never retry.
pub trait ByteStore: Send {
    /// Number of addressable bytes
    fn len(&self) -> u64;

    /// Whether the store holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `len` bytes starting at `offset`
    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Write `data` starting at `offset`
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Bounds check shared by store implementations
pub(crate) fn check_store_range(store_len: u64, offset: u64, len: usize) -> Result<()> {
    let end = offset.checked_add(len as u64);
    match end {
        Some(end) if end <= store_len => Ok(()),
        _ => Err(CodecError::out_of_range(format!(
            "store access {offset:#x}+{len} exceeds store length {store_len:#x}"
        ))),
    }
}

/// In-memory byte image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    data: Vec<u8>,
}

impl MemoryStore {
    /// Create a zero-filled store
    pub fn new(len: usize) -> Self {
        Self { data: vec![0u8; len] }
    }

    /// Wrap existing bytes
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Load an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        tracing::debug!(
            "Loaded {} byte image from {}",
            data.len(),
            path.as_ref().display()
        );
        Ok(Self { data })
    }

    /// Save the image to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.data)?;
        Ok(())
    }

    /// Current contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take the contents
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStore for MemoryStore {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        check_store_range(self.len(), offset, len)?;
        let start = offset as usize;
        Ok(self.data[start..start + len].to_vec())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        check_store_range(self.len(), offset, data.len())?;
        let start = offset as usize;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut store = MemoryStore::new(256);
        store.write(10, &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read(10, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(store.len(), 256);
    }

    #[test]
    fn test_memory_bounds() {
        let mut store = MemoryStore::new(16);
        assert!(store.read(15, 1).is_ok());
        assert!(store.read(15, 2).is_err());
        assert!(store.write(16, &[0]).is_err());
        assert!(store.read(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.bin");
        MemoryStore::from_bytes(vec![9, 8, 7]).save(&path).unwrap();
        let loaded = MemoryStore::from_file(&path).unwrap();
        assert_eq!(loaded.as_bytes(), &[9, 8, 7]);
    }
}
