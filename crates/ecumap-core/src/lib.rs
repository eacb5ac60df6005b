//! # ecumap Core Library
//!
//! Codec between raw ECU memory (flash images, RAM snapshots) and
//! engineering values.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Fixed-width numeric formats with explicit byte order
//! - Invertible transform pipelines (scales) and a scale registry
//! - Bounds-checked memory sections and address spaces
//! - Block-aligned read-modify-write over encrypted sections
//! - Scaled series and 0/1/2-axis tables mapped onto memory
//! - JSON project configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use ecumap_core::prelude::*;
//!
//! let project = Project::open("calibration/project.json")?;
//! let rpm = project.get_cell("idle_target", Coords::X(2))?;
//! let stored = project.set_cell("idle_target", Coords::X(2), rpm + 50.0)?;
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod format;
pub mod memory;
pub mod project;
pub mod scale;
pub mod series;
pub mod table;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ProjectConfig;
    pub use crate::crypto::{Cipher, CipherConfig, EncryptedStore};
    pub use crate::error::{CodecError, Result};
    pub use crate::format::{Endianness, NumericFormat};
    pub use crate::memory::{AddressSpace, ByteStore, MemoryAddress, MemorySection, MemoryStore};
    pub use crate::project::Project;
    pub use crate::scale::{Operation, Scale, ScaleId, ScaleRegistry, Transform, Unit};
    pub use crate::series::Series;
    pub use crate::table::{Axis, Coords, Table};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
