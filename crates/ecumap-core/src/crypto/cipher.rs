//! Block cipher capability and the built-in schemes
//!
//! Vehicle-specific ciphers plug in by implementing [`Cipher`]; the
//! built-in variants are selected through [`CipherConfig`].

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// In-place block encryption over whole blocks
///
/// `len` is always a multiple of [`Cipher::block_size`] and
/// `buffer[offset..offset + len]` is always in bounds when called by
/// [`EncryptedStore`](super::EncryptedStore).
pub trait Cipher: Send + fmt::Debug {
    /// Block length in bytes, never zero
    fn block_size(&self) -> usize;

    /// Encrypt `buffer[offset..offset + len]` in place
    fn encrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()>;

    /// Decrypt `buffer[offset..offset + len]` in place
    fn decrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()>;
}

/// Validate a cipher call window and return it as a slice range
fn block_window(
    buffer_len: usize,
    offset: usize,
    len: usize,
    block_size: usize,
) -> Result<std::ops::Range<usize>> {
    if len % block_size != 0 {
        return Err(CodecError::SizeMismatch {
            expected: len.div_ceil(block_size) * block_size,
            actual: len,
        });
    }
    match offset.checked_add(len) {
        Some(end) if end <= buffer_len => Ok(offset..end),
        _ => Err(CodecError::out_of_range(format!(
            "cipher window {offset}+{len} exceeds buffer of {buffer_len} bytes"
        ))),
    }
}

/// Pass-through scheme for unencrypted media that still want block I/O
#[derive(Debug, Clone)]
pub struct IdentityCipher {
    block_size: usize,
}

impl IdentityCipher {
    /// Pass-through cipher with the given block size
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }
}

impl Cipher for IdentityCipher {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn encrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()> {
        block_window(buffer.len(), offset, len, self.block_size).map(|_| ())
    }

    fn decrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()> {
        block_window(buffer.len(), offset, len, self.block_size).map(|_| ())
    }
}

/// Keyed XOR with ciphertext chaining inside each block
///
/// Each ciphertext byte is `plain ^ key[i] ^ previous_cipher_byte`, with
/// the chain restarting at every block boundary. A change to one plaintext
/// byte therefore alters every later byte of its block, which makes
/// misaligned block I/O show up immediately. This is an obfuscation scheme,
/// not a secure cipher.
#[derive(Clone)]
pub struct XorChainCipher {
    block_size: usize,
    key: Vec<u8>,
}

impl XorChainCipher {
    /// Fails on a zero block size or an empty key
    pub fn new(block_size: usize, key: Vec<u8>) -> Result<Self> {
        if block_size == 0 {
            return Err(CodecError::invalid("cipher block size must be non-zero"));
        }
        if key.is_empty() {
            return Err(CodecError::invalid("XOR chain cipher needs a non-empty key"));
        }
        Ok(Self { block_size, key })
    }

    fn key_at(&self, i: usize) -> u8 {
        self.key[i % self.key.len()]
    }
}

impl fmt::Debug for XorChainCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XorChainCipher")
            .field("block_size", &self.block_size)
            .field("key_len", &self.key.len())
            .finish()
    }
}

impl Cipher for XorChainCipher {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn encrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let window = block_window(buffer.len(), offset, len, self.block_size)?;
        for block in buffer[window].chunks_mut(self.block_size) {
            let mut prev = 0u8;
            for (i, byte) in block.iter_mut().enumerate() {
                *byte ^= self.key_at(i) ^ prev;
                prev = *byte;
            }
        }
        Ok(())
    }

    fn decrypt(&self, buffer: &mut [u8], offset: usize, len: usize) -> Result<()> {
        let window = block_window(buffer.len(), offset, len, self.block_size)?;
        for block in buffer[window].chunks_mut(self.block_size) {
            let mut prev = 0u8;
            for (i, byte) in block.iter_mut().enumerate() {
                let cipher_byte = *byte;
                *byte ^= self.key_at(i) ^ prev;
                prev = cipher_byte;
            }
        }
        Ok(())
    }
}

/// Configuration-selected encryption scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CipherConfig {
    /// No encryption, block-aligned access only
    Identity {
        /// Block size in bytes
        block_size: usize,
    },
    /// Chained XOR over fixed-size blocks
    XorChain {
        /// Block size in bytes
        block_size: usize,
        /// Repeating key bytes
        key: Vec<u8>,
    },
}

impl CipherConfig {
    /// Instantiate the configured cipher
    pub fn build(&self) -> Result<Box<dyn Cipher>> {
        let block_size = match self {
            CipherConfig::Identity { block_size } | CipherConfig::XorChain { block_size, .. } => {
                *block_size
            }
        };
        if block_size == 0 {
            return Err(CodecError::invalid("cipher block size must be non-zero"));
        }

        Ok(match self {
            CipherConfig::Identity { block_size } => Box::new(IdentityCipher::new(*block_size)),
            CipherConfig::XorChain { block_size, key } => {
                Box::new(XorChainCipher::new(*block_size, key.clone())?)
            }
        })
    }
}
