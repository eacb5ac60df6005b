//! Ordered transform pipelines (scales)
//!
//! A [`Scale`] turns a raw integer read with its [`NumericFormat`] into an
//! engineering value by folding its transforms head to tail, and turns it
//! back by undoing them tail to head.

use super::transform::Transform;
use super::unit::Unit;
use crate::error::{CodecError, Result};
use crate::format::{Endianness, NumericFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity handle of a scale
///
/// Two scales are "the same scale" when their ids match, regardless of
/// their current contents. Working copies share the id of the scale they
/// were cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScaleId(Uuid);

impl ScaleId {
    /// Id of the identity scale returned by [`Scale::none`]
    pub const NONE: ScaleId = ScaleId(Uuid::nil());

    /// Allocate a fresh id
    pub fn new() -> Self {
        ScaleId(Uuid::new_v4())
    }
}

impl Default for ScaleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named raw <-> engineering conversion for one binary format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(default)]
    id: ScaleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    transforms: Vec<Transform>,
    format: NumericFormat,
    #[serde(default)]
    unit: Unit,
}

impl Scale {
    /// Create an empty (identity) pipeline with a fresh id
    pub fn new(format: NumericFormat, unit: Unit) -> Self {
        Self {
            id: ScaleId::new(),
            name: None,
            transforms: Vec::new(),
            format,
            unit,
        }
    }

    /// The well-known identity scale: no transforms, `UBYTE`, no unit
    pub fn none() -> Self {
        Self {
            id: ScaleId::NONE,
            name: Some("NONE".to_string()),
            transforms: Vec::new(),
            format: NumericFormat::UBYTE,
            unit: Unit::None,
        }
    }

    /// Builder-style name setter
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style transform append
    pub fn with(mut self, transform: Transform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Identity used by the registry
    pub fn id(&self) -> ScaleId {
        self.id
    }

    /// Optional display name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set or clear the display name
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Raw encoding
    pub fn format(&self) -> NumericFormat {
        self.format
    }

    /// Change the raw encoding
    pub fn set_format(&mut self, format: NumericFormat) {
        self.format = format;
    }

    /// Engineering unit of the output
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Change the engineering unit
    pub fn set_unit(&mut self, unit: Unit) {
        self.unit = unit;
    }

    /// Pipeline steps in forward order
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// True when the pipeline has no transforms
    pub fn is_identity(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Append a transform to the end of the pipeline
    pub fn push(&mut self, transform: Transform) {
        self.transforms.push(transform);
    }

    /// Insert a transform before position `index`
    pub fn insert(&mut self, index: usize, transform: Transform) -> Result<()> {
        if index > self.transforms.len() {
            return Err(CodecError::out_of_range(format!(
                "transform index {index} beyond pipeline length {}",
                self.transforms.len()
            )));
        }
        self.transforms.insert(index, transform);
        Ok(())
    }

    /// Remove and return the transform at `index`
    pub fn remove(&mut self, index: usize) -> Result<Transform> {
        if index >= self.transforms.len() {
            return Err(CodecError::out_of_range(format!(
                "no transform at index {index} (pipeline length {})",
                self.transforms.len()
            )));
        }
        Ok(self.transforms.remove(index))
    }

    /// Move the transform at `from` so that it ends up at `to`
    pub fn move_transform(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.transforms.len();
        if from >= len || to >= len {
            return Err(CodecError::out_of_range(format!(
                "cannot move transform {from} to {to} (pipeline length {len})"
            )));
        }
        let t = self.transforms.remove(from);
        self.transforms.insert(to, t);
        Ok(())
    }

    /// Compose: append every transform of `other` after this pipeline's own
    pub fn append(&mut self, other: &Scale) {
        self.transforms.extend_from_slice(&other.transforms);
    }

    /// Drop every transform
    pub fn clear(&mut self) {
        self.transforms.clear();
    }

    /// Commit a working copy into this scale, keeping this scale's identity
    pub fn apply(&mut self, working: &Scale) {
        self.name = working.name.clone();
        self.transforms = working.transforms.clone();
        self.format = working.format;
        self.unit = working.unit.clone();
    }

    /// Clone the contents under a brand new identity
    pub fn duplicate(&self) -> Scale {
        Scale {
            id: ScaleId::new(),
            ..self.clone()
        }
    }

    /// raw -> engineering
    pub fn forward(&self, raw: f64) -> f64 {
        self.transforms.iter().fold(raw, |acc, t| t.forward(acc))
    }

    /// engineering -> raw (undoes the last-applied transform first)
    pub fn reverse(&self, value: f64) -> f64 {
        self.transforms.iter().rev().fold(value, |acc, t| t.reverse(acc))
    }

    /// Engineering value of the format's minimum raw value
    ///
    /// For decreasing pipelines this is larger than [`Scale::maximum`].
    pub fn minimum(&self) -> f64 {
        self.forward(self.format.min())
    }

    /// Engineering value of the format's maximum raw value
    pub fn maximum(&self) -> f64 {
        self.forward(self.format.max())
    }

    /// Engineering distance between raw 0 and raw 1
    pub fn precision(&self) -> f64 {
        (self.forward(0.0) - self.forward(1.0)).abs()
    }

    /// Decode raw bytes and scale them forward
    pub fn decode(&self, bytes: &[u8], endian: Endianness) -> Result<f64> {
        Ok(self.forward(self.format.decode(bytes, endian)?))
    }

    /// Scale an engineering value back and encode it
    pub fn encode(&self, value: f64, endian: Endianness) -> Result<Vec<u8>> {
        self.format.encode(self.reverse(value), endian)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        write!(f, "{}", self.format)?;
        for t in &self.transforms {
            write!(f, " {t}")?;
        }
        if self.unit != Unit::None {
            write!(f, " [{}]", self.unit)?;
        }
        Ok(())
    }
}
