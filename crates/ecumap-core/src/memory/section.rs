//! Bounds-checked memory sections

use super::store::ByteStore;
use crate::crypto::{Cipher, EncryptedStore};
use crate::error::{CodecError, Result};
use crate::format::Endianness;
use std::fmt;
use std::sync::Mutex;

/// Where a section's bytes live
enum Backing {
    Plain(Box<dyn ByteStore>),
    Encrypted(EncryptedStore),
}

impl Backing {
    fn store(&mut self) -> &mut (dyn ByteStore + 'static) {
        match self {
            Backing::Plain(store) => store.as_mut(),
            Backing::Encrypted(store) => store,
        }
    }
}

/// A contiguous, named region of addressable memory (code flash, RAM, ...)
///
/// Every access must satisfy `base_address <= offset` and
/// `offset + len <= base_address + length`. Accesses go through a mutex so
/// writes to one section are serialized; this is what keeps the encrypted
/// read-modify-write cycle from losing overlapping writes.
pub struct MemorySection {
    name: String,
    base_address: u64,
    length: u32,
    endianness: Endianness,
    read_only: bool,
    encrypted: bool,
    backing: Mutex<Backing>,
}

impl MemorySection {
    /// Create a plaintext section over `store`
    ///
    /// The store must hold at least `length` bytes; section offset
    /// `base_address` maps to store offset 0.
    pub fn new(
        name: impl Into<String>,
        base_address: u64,
        length: u32,
        endianness: Endianness,
        store: impl ByteStore + 'static,
    ) -> Result<Self> {
        Self::with_backing(
            name.into(),
            base_address,
            length,
            endianness,
            Backing::Plain(Box::new(store)),
        )
    }

    /// Create a section whose store holds ciphertext
    pub fn encrypted(
        name: impl Into<String>,
        base_address: u64,
        length: u32,
        endianness: Endianness,
        store: impl ByteStore + 'static,
        cipher: Box<dyn Cipher>,
    ) -> Result<Self> {
        let encrypted = EncryptedStore::new(Box::new(store), cipher)?;
        // The last block of the section must be whole in the store
        let blocks = encrypted.covering_range(0, length as usize);
        if blocks.end > encrypted.len() {
            return Err(CodecError::SizeMismatch {
                expected: blocks.end as usize,
                actual: encrypted.len() as usize,
            });
        }
        Self::with_backing(
            name.into(),
            base_address,
            length,
            endianness,
            Backing::Encrypted(encrypted),
        )
    }

    fn with_backing(
        name: String,
        base_address: u64,
        length: u32,
        endianness: Endianness,
        mut backing: Backing,
    ) -> Result<Self> {
        let store_len = backing.store().len();
        if store_len < length as u64 {
            return Err(CodecError::SizeMismatch {
                expected: length as usize,
                actual: store_len as usize,
            });
        }
        if base_address.checked_add(length as u64).is_none() {
            return Err(CodecError::out_of_range(format!(
                "section '{name}' at {base_address:#x} overflows the address space"
            )));
        }
        let encrypted = matches!(backing, Backing::Encrypted(_));
        Ok(Self {
            name,
            base_address,
            length,
            endianness,
            read_only: false,
            encrypted,
            backing: Mutex::new(backing),
        })
    }

    /// Builder-style read-only flag
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Section name, unique within its address space
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First address of the section
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    /// Size in bytes
    pub fn length(&self) -> u32 {
        self.length
    }

    /// First address past the end of the section
    pub fn end_address(&self) -> u64 {
        self.base_address + self.length as u64
    }

    /// Byte order of multi-byte values
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Change the byte order
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Whether writes are rejected
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Allow or reject writes
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether reads and writes go through an encryption layer
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether `[offset, offset + len)` lies inside the section
    pub fn contains(&self, offset: u64, len: usize) -> bool {
        match offset.checked_add(len as u64) {
            Some(end) => offset >= self.base_address && end <= self.end_address(),
            None => false,
        }
    }

    /// Whether two sections share at least one address
    pub fn overlaps(&self, other: &MemorySection) -> bool {
        self.base_address < other.end_address() && other.base_address < self.end_address()
    }

    /// Check `[offset, offset + len)` and return the store-relative offset
    pub fn check_range(&self, offset: u64, len: usize) -> Result<u64> {
        if !self.contains(offset, len) {
            return Err(CodecError::out_of_range(format!(
                "{offset:#x}+{len} is outside section '{}' [{:#x}, {:#x})",
                self.name,
                self.base_address,
                self.end_address()
            )));
        }
        Ok(offset - self.base_address)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Backing>> {
        self.backing
            .lock()
            .map_err(|_| CodecError::Poisoned(self.name.clone()))
    }

    /// Read `len` plaintext bytes at absolute `offset`
    pub fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let relative = self.check_range(offset, len)?;
        let mut backing = self.lock()?;
        let bytes = backing.store().read(relative, len)?;
        if bytes.len() != len {
            return Err(CodecError::SizeMismatch {
                expected: len,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    /// Write plaintext bytes at absolute `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(CodecError::ReadOnlyViolation(self.name.clone()));
        }
        let relative = self.check_range(offset, data.len())?;
        let mut backing = self.lock()?;
        tracing::trace!(
            "Writing {} bytes to section '{}' at {:#x}",
            data.len(),
            self.name,
            offset
        );
        backing.store().write(relative, data)
    }

    /// Plaintext copy of the whole section
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.read(self.base_address, self.length as usize)
    }
}

impl fmt::Debug for MemorySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySection")
            .field("name", &self.name)
            .field("base_address", &format_args!("{:#x}", self.base_address))
            .field("length", &self.length)
            .field("endianness", &self.endianness)
            .field("read_only", &self.read_only)
            .field("encrypted", &self.encrypted)
            .finish()
    }
}
