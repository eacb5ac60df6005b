//! Shadow memory for tracking changes
//!
//! Records which bytes of which sections have been written since the last
//! sync, so a caller can push only the modified ranges to a vehicle.

use super::address::SectionId;
use std::collections::BTreeSet;
use std::ops::Range;

/// Tracks written bytes per section
#[derive(Debug, Default, Clone)]
pub struct ShadowMemory {
    /// Set of (section, absolute address) pairs that have been modified
    dirty: BTreeSet<(SectionId, u64)>,
}

impl ShadowMemory {
    /// Empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write of `length` bytes at absolute `offset`
    pub fn mark_dirty(&mut self, section: SectionId, offset: u64, length: usize) {
        for i in 0..length as u64 {
            self.dirty.insert((section, offset + i));
        }
    }

    /// Whether one byte has been written
    pub fn is_dirty(&self, section: SectionId, offset: u64) -> bool {
        self.dirty.contains(&(section, offset))
    }

    /// Check if any changes are pending
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Sections with at least one written byte, ascending
    pub fn dirty_sections(&self) -> Vec<SectionId> {
        let mut sections: Vec<SectionId> = self.dirty.iter().map(|(s, _)| *s).collect();
        sections.dedup();
        sections
    }

    /// Dirty bytes of one section, coalesced into ascending address ranges
    pub fn dirty_ranges(&self, section: SectionId) -> Vec<Range<u64>> {
        let mut ranges: Vec<Range<u64>> = Vec::new();
        let bytes = self
            .dirty
            .range((section, 0)..=(section, u64::MAX))
            .map(|(_, addr)| *addr);

        for addr in bytes {
            match ranges.last_mut() {
                Some(last) if last.end == addr => last.end = addr + 1,
                _ => ranges.push(addr..addr + 1),
            }
        }
        ranges
    }

    /// Clear dirty flags of one section
    pub fn clear_section(&mut self, section: SectionId) {
        self.dirty.retain(|(s, _)| *s != section);
    }

    /// Clear all dirty flags
    pub fn clear(&mut self) {
        self.dirty.clear();
    }

    /// Count of dirty bytes
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }
}
