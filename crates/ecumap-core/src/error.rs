//! Error types for the codec, addressing and encryption core

use thiserror::Error;

/// Errors raised by scaling, memory access and table operations
#[derive(Error, Debug)]
pub enum CodecError {
    /// Address, index or coordinate outside its container
    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    /// A buffer or store holds a different number of bytes than required
    SizeMismatch {
        /// Bytes required
        expected: usize,
        /// Bytes present
        actual: usize,
    },

    /// Malformed transform, scale or table structure
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// Write to a read-only section or address space
    #[error("Write rejected, '{0}' is read-only")]
    ReadOnlyViolation(String),

    #[error("Value {value} is outside the encodable range [{min}, {max}]")]
    /// Raw value that does not fit its numeric format
    ValueOutOfRange {
        /// Raw value after the reverse pipeline
        value: f64,
        /// Smallest encodable raw value
        min: f64,
        /// Largest encodable raw value
        max: f64,
    },

    #[error("Section '{new}' overlaps existing section '{existing}'")]
    /// Two sections of one address space share addresses
    SectionOverlap {
        /// Section being added
        new: String,
        /// Section already registered
        existing: String,
    },

    /// No section with this name or id
    #[error("Unknown section: {0}")]
    UnknownSection(String),

    /// Name already taken by a section, scale or table
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// A thread panicked while holding a section's lock
    #[error("Memory store is poisoned: {0}")]
    Poisoned(String),

    /// Image file access failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result alias used throughout the core
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Shorthand for an [`CodecError::OutOfRange`] with a formatted message
    pub(crate) fn out_of_range(message: impl Into<String>) -> Self {
        CodecError::OutOfRange(message.into())
    }

    /// Shorthand for an [`CodecError::InvalidPipeline`] with a formatted message
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CodecError::InvalidPipeline(message.into())
    }
}
