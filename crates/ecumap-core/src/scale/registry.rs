//! Identity-keyed registry of the scales known to a project

use super::pipeline::{Scale, ScaleId};
use crate::error::{CodecError, Result};
use std::collections::HashMap;

/// The set of scales a project knows about, keyed by [`ScaleId`]
///
/// Membership is by identity: a scale with the same transforms as a
/// registered one but a different id is not registered. The identity scale
/// [`Scale::none`] is always present and cannot be edited or removed.
#[derive(Debug, Clone)]
pub struct ScaleRegistry {
    scales: HashMap<ScaleId, Scale>,
    /// Registration order, for stable listing
    order: Vec<ScaleId>,
}

impl ScaleRegistry {
    /// Create a registry holding only the identity scale
    pub fn new() -> Self {
        let none = Scale::none();
        let mut scales = HashMap::new();
        scales.insert(none.id(), none);
        Self {
            scales,
            order: vec![ScaleId::NONE],
        }
    }

    /// Register a scale under its own id
    pub fn register(&mut self, scale: Scale) -> Result<ScaleId> {
        let id = scale.id();
        if self.scales.contains_key(&id) {
            return Err(CodecError::DuplicateName(format!(
                "scale {} is already registered",
                scale.name().unwrap_or(&id.to_string())
            )));
        }
        tracing::debug!("Registering scale {}", scale);
        self.order.push(id);
        self.scales.insert(id, scale);
        Ok(id)
    }

    /// Registered scale by id
    pub fn get(&self, id: ScaleId) -> Option<&Scale> {
        self.scales.get(&id)
    }

    /// First registered scale with the given name
    pub fn get_by_name(&self, name: &str) -> Option<&Scale> {
        self.iter().find(|s| s.name() == Some(name))
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: ScaleId) -> bool {
        self.scales.contains_key(&id)
    }

    /// Fail unless `scale` is registered
    pub fn ensure_registered(&self, scale: &Scale) -> Result<()> {
        if self.contains(scale.id()) {
            Ok(())
        } else {
            Err(CodecError::invalid(format!(
                "scale '{}' ({}) is not registered",
                scale.name().unwrap_or("unnamed"),
                scale.id()
            )))
        }
    }

    /// Commit a working copy over the registered scale with the same id
    pub fn apply(&mut self, working: &Scale) -> Result<()> {
        if working.id() == ScaleId::NONE {
            return Err(CodecError::invalid("the NONE scale cannot be edited"));
        }
        let target = self.scales.get_mut(&working.id()).ok_or_else(|| {
            CodecError::invalid(format!("cannot apply unregistered scale {}", working.id()))
        })?;
        target.apply(working);
        tracing::debug!("Applied scale edit {}", target);
        Ok(())
    }

    /// Remove a scale; the identity scale is never removed
    pub fn remove(&mut self, id: ScaleId) -> Option<Scale> {
        if id == ScaleId::NONE {
            return None;
        }
        self.order.retain(|s| *s != id);
        self.scales.remove(&id)
    }

    /// Registered scales in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Scale> {
        self.order.iter().filter_map(|id| self.scales.get(id))
    }

    /// Number of registered scales
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    /// Always false, the identity scale is permanent
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

impl Default for ScaleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NumericFormat;
    use crate::scale::{Operation, Transform, Unit};

    #[test]
    fn test_identity_membership() {
        let mut registry = ScaleRegistry::new();
        assert!(registry.contains(ScaleId::NONE));

        let scale = Scale::new(NumericFormat::UBYTE, Unit::Percent).with_name("duty");
        let look_alike = scale.duplicate();
        registry.register(scale.clone()).unwrap();

        assert!(registry.ensure_registered(&scale).is_ok());
        // Same contents, different identity
        assert!(registry.ensure_registered(&look_alike).is_err());
        assert!(registry.register(scale).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_apply_working_copy() {
        let mut registry = ScaleRegistry::new();
        let scale = Scale::new(NumericFormat::UWORD, Unit::Rpm).with_name("rpm");
        let id = registry.register(scale.clone()).unwrap();

        let mut working = scale.clone();
        working.push(Transform::new(Operation::Multiply, 0.25).unwrap());
        registry.apply(&working).unwrap();

        assert_eq!(registry.get(id).unwrap().forward(4.0), 1.0);
        assert_eq!(registry.get_by_name("rpm").unwrap().id(), id);

        assert!(registry.apply(&Scale::none()).is_err());
        assert!(registry.apply(&working.duplicate()).is_err());
    }

    #[test]
    fn test_none_cannot_be_removed() {
        let mut registry = ScaleRegistry::new();
        assert!(registry.remove(ScaleId::NONE).is_none());
        let id = registry
            .register(Scale::new(NumericFormat::SBYTE, Unit::Degrees))
            .unwrap();
        assert!(registry.remove(id).is_some());
        assert_eq!(registry.iter().count(), 1);
    }
}
