//! Section handles and addresses

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a section inside its owning [`AddressSpace`](super::AddressSpace)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub(crate) usize);

impl SectionId {
    /// Position of the section in its address space
    pub fn index(&self) -> usize {
        self.0
    }
}

/// An absolute address within one section
///
/// The section is referenced by handle and never owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryAddress {
    /// Owning section
    pub section: SectionId,
    /// Absolute address, not relative to the section base
    pub offset: u64,
}

impl MemoryAddress {
    /// Address `offset` in `section`
    pub fn new(section: SectionId, offset: u64) -> Self {
        Self { section, offset }
    }

    /// Address `bytes` further along in the same section
    pub fn advance(&self, bytes: u64) -> Result<Self> {
        let offset = self.offset.checked_add(bytes).ok_or_else(|| {
            CodecError::out_of_range(format!("{self} advanced by {bytes} overflows"))
        })?;
        Ok(Self {
            section: self.section,
            offset,
        })
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{:#010x}", self.section.0, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_overflow() {
        let addr = MemoryAddress::new(SectionId(0), u64::MAX - 1);
        assert_eq!(addr.advance(1).unwrap().offset, u64::MAX);
        assert!(matches!(addr.advance(2), Err(CodecError::OutOfRange(_))));
    }
}
