//! Addressed, scaled one-dimensional arrays
//!
//! A [`Series`] is a table axis or a table's data: `length` consecutive
//! raw values starting at `address`, each `format.width` bytes wide and
//! converted through the series' [`Scale`].

use crate::error::{CodecError, Result};
use crate::memory::{AddressSpace, MemoryAddress};
use crate::scale::Scale;
use serde::{Deserialize, Serialize};

/// A 1-D sequence of scaled values in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    address: MemoryAddress,
    /// Element count, 0 meaning "no axis / unbounded"
    length: u32,
    scale: Scale,
}

impl Series {
    /// Series of `length` elements starting at `address`
    pub fn new(name: impl Into<String>, address: MemoryAddress, length: u32, scale: Scale) -> Self {
        Self {
            name: name.into(),
            address,
            length,
            scale,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the series
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Address of element 0
    pub fn address(&self) -> MemoryAddress {
        self.address
    }

    /// Move the series
    pub fn set_address(&mut self, address: MemoryAddress) {
        self.address = address;
    }

    /// Element count
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Change the element count
    pub fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    /// Scale applied to every element
    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Mutable scale, for edits that keep its identity
    pub fn scale_mut(&mut self) -> &mut Scale {
        &mut self.scale
    }

    /// Replace the scale
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    /// Bytes per element
    pub fn width(&self) -> usize {
        self.scale.format().width()
    }

    /// Number of addressable elements (an unbounded series exposes one)
    pub fn element_count(&self) -> usize {
        (self.length as usize).max(1)
    }

    /// Bytes covered by the addressable elements
    pub fn byte_len(&self) -> usize {
        self.element_count() * self.width()
    }

    /// Commit a working copy into this series
    pub fn apply(&mut self, working: &Series) {
        self.clone_from(working);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.element_count() {
            return Err(CodecError::out_of_range(format!(
                "index {index} outside series '{}' of length {}",
                self.name, self.length
            )));
        }
        Ok(())
    }

    fn check_window(&self, start: usize, len: usize) -> Result<()> {
        match start.checked_add(len) {
            Some(end) if end <= self.element_count() => Ok(()),
            _ => Err(CodecError::out_of_range(format!(
                "range {start}+{len} outside series '{}' of length {}",
                self.name, self.length
            ))),
        }
    }

    /// Address of element `index`
    pub fn address_of(&self, index: usize) -> Result<MemoryAddress> {
        self.check_index(index)?;
        self.address.advance((index * self.width()) as u64)
    }

    /// Raw (unscaled) value of element `index`
    pub fn get_raw(&self, space: &AddressSpace, index: usize) -> Result<f64> {
        let address = self.address_of(index)?;
        let bytes = space.read(&address, self.width())?;
        self.scale
            .format()
            .decode(&bytes, space.endianness(&address)?)
    }

    /// Engineering value of element `index`
    pub fn get(&self, space: &AddressSpace, index: usize) -> Result<f64> {
        Ok(self.scale.forward(self.get_raw(space, index)?))
    }

    /// Store a raw value and return the raw value actually stored
    pub fn set_raw(&self, space: &AddressSpace, index: usize, raw: f64) -> Result<f64> {
        let address = self.address_of(index)?;
        let bytes = self.scale.format().encode(raw, space.endianness(&address)?)?;
        space.write(&address, &bytes)?;
        self.get_raw(space, index)
    }

    /// Store an engineering value and return the value actually stored
    ///
    /// Encoding to a fixed-width integer is lossy, so the returned value is
    /// re-read from memory rather than echoed back.
    pub fn set(&self, space: &AddressSpace, index: usize, value: f64) -> Result<f64> {
        let raw = self.scale.reverse(value);
        let stored = self.scale.forward(self.set_raw(space, index, raw)?);
        if stored != value {
            tracing::trace!(
                "Series '{}'[{}]: requested {} stored {}",
                self.name,
                index,
                value,
                stored
            );
        }
        Ok(stored)
    }

    /// Engineering values of `len` elements starting at `start`
    pub fn get_range(&self, space: &AddressSpace, start: usize, len: usize) -> Result<Vec<f64>> {
        self.check_window(start, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let address = self.address.advance((start * self.width()) as u64)?;
        let endian = space.endianness(&address)?;
        let bytes = space.read(&address, len * self.width())?;
        bytes
            .chunks(self.width())
            .map(|chunk| self.scale.decode(chunk, endian))
            .collect()
    }

    /// Every addressable element
    pub fn get_all(&self, space: &AddressSpace) -> Result<Vec<f64>> {
        self.get_range(space, 0, self.element_count())
    }

    /// Store values starting at `start`, returning the stored values
    ///
    /// All values are encoded before anything is written, so one bad value
    /// leaves memory untouched.
    pub fn set_range(&self, space: &AddressSpace, start: usize, values: &[f64]) -> Result<Vec<f64>> {
        self.check_window(start, values.len())?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let address = self.address.advance((start * self.width()) as u64)?;
        let endian = space.endianness(&address)?;

        let mut bytes = Vec::with_capacity(values.len() * self.width());
        for value in values {
            bytes.extend(self.scale.encode(*value, endian)?);
        }
        space.write(&address, &bytes)?;
        self.get_range(space, start, values.len())
    }

    /// Overwrite every element
    pub fn set_all(&self, space: &AddressSpace, values: &[f64]) -> Result<Vec<f64>> {
        if values.len() != self.element_count() {
            return Err(CodecError::SizeMismatch {
                expected: self.element_count(),
                actual: values.len(),
            });
        }
        self.set_range(space, 0, values)
    }
}
