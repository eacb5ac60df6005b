//! Address spaces (calibrations)
//!
//! An [`AddressSpace`] owns a set of non-overlapping [`MemorySection`]s and
//! resolves [`MemoryAddress`]es against them. A whole address space may be
//! flagged read-only, which is how a reference calibration is protected.

use super::address::{MemoryAddress, SectionId};
use super::section::MemorySection;
use super::shadow::ShadowMemory;
use crate::error::{CodecError, Result};
use crate::format::Endianness;
use std::ops::Range;
use std::sync::Mutex;

/// Named collection of memory sections
#[derive(Debug)]
pub struct AddressSpace {
    name: String,
    read_only: bool,
    sections: Vec<MemorySection>,
    shadow: Mutex<ShadowMemory>,
}

impl AddressSpace {
    /// Empty, writable address space
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
            sections: Vec::new(),
            shadow: Mutex::new(ShadowMemory::new()),
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether every write is rejected, whatever the section flags
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Reject or allow writes to every section
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Add a section, rejecting duplicate names and overlapping ranges
    pub fn add_section(&mut self, section: MemorySection) -> Result<SectionId> {
        for existing in &self.sections {
            if existing.name() == section.name() {
                return Err(CodecError::DuplicateName(format!(
                    "section '{}'",
                    section.name()
                )));
            }
            if existing.overlaps(&section) {
                return Err(CodecError::SectionOverlap {
                    new: section.name().to_string(),
                    existing: existing.name().to_string(),
                });
            }
        }

        let id = SectionId(self.sections.len());
        tracing::debug!(
            "Added section '{}' [{:#x}, {:#x}) to '{}'",
            section.name(),
            section.base_address(),
            section.end_address(),
            self.name
        );
        self.sections.push(section);
        Ok(id)
    }

    /// Section by handle
    pub fn section(&self, id: SectionId) -> Result<&MemorySection> {
        self.sections
            .get(id.0)
            .ok_or_else(|| CodecError::UnknownSection(format!("#{}", id.0)))
    }

    /// Mutable section by handle
    pub fn section_mut(&mut self, id: SectionId) -> Result<&mut MemorySection> {
        self.sections
            .get_mut(id.0)
            .ok_or_else(|| CodecError::UnknownSection(format!("#{}", id.0)))
    }

    /// Look up a section handle by name
    pub fn section_id(&self, name: &str) -> Result<SectionId> {
        self.sections
            .iter()
            .position(|s| s.name() == name)
            .map(SectionId)
            .ok_or_else(|| CodecError::UnknownSection(name.to_string()))
    }

    /// All sections with their handles
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &MemorySection)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (SectionId(i), s))
    }

    /// Build an address in the named section
    pub fn address(&self, section: &str, offset: u64) -> Result<MemoryAddress> {
        Ok(MemoryAddress::new(self.section_id(section)?, offset))
    }

    /// Find the section containing an absolute address
    pub fn resolve(&self, offset: u64) -> Option<MemoryAddress> {
        self.sections()
            .find(|(_, s)| s.contains(offset, 1))
            .map(|(id, _)| MemoryAddress::new(id, offset))
    }

    /// Byte order of the section an address points into
    pub fn endianness(&self, address: &MemoryAddress) -> Result<Endianness> {
        Ok(self.section(address.section)?.endianness())
    }

    /// Read `count` bytes at `address`
    pub fn read(&self, address: &MemoryAddress, count: usize) -> Result<Vec<u8>> {
        self.section(address.section)?.read(address.offset, count)
    }

    /// Write `data` at `address`
    pub fn write(&self, address: &MemoryAddress, data: &[u8]) -> Result<()> {
        if self.read_only {
            return Err(CodecError::ReadOnlyViolation(self.name.clone()));
        }
        self.section(address.section)?.write(address.offset, data)?;
        if let Ok(mut shadow) = self.shadow.lock() {
            shadow.mark_dirty(address.section, address.offset, data.len());
        }
        Ok(())
    }

    /// CRC-32 over the plaintext contents of a section
    pub fn checksum(&self, id: SectionId) -> Result<u32> {
        let bytes = self.section(id)?.snapshot()?;
        Ok(crc32fast::hash(&bytes))
    }

    /// Whether any byte has been written since the last clear
    pub fn has_changes(&self) -> bool {
        self.shadow
            .lock()
            .map(|shadow| shadow.has_changes())
            .unwrap_or(false)
    }

    /// Written address ranges of one section
    pub fn dirty_ranges(&self, id: SectionId) -> Vec<Range<u64>> {
        self.shadow
            .lock()
            .map(|shadow| shadow.dirty_ranges(id))
            .unwrap_or_default()
    }

    /// Forget recorded writes, e.g. after syncing them to the vehicle
    pub fn clear_dirty(&self) {
        if let Ok(mut shadow) = self.shadow.lock() {
            shadow.clear();
        }
    }
}
