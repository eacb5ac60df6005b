//! Block-aligned encryption layer
//!
//! [`EncryptedStore`] owns the block arithmetic; the cipher primitive itself
//! is a pluggable [`Cipher`].

mod cipher;
mod encrypted;

pub use cipher::{Cipher, CipherConfig, IdentityCipher, XorChainCipher};
pub use encrypted::EncryptedStore;
