//! Scaling model
//!
//! Elementary invertible transforms, ordered pipelines of them, unit tags
//! and the identity-keyed registry a project keeps its scales in.

mod pipeline;
mod registry;
mod transform;
mod unit;

pub use pipeline::{Scale, ScaleId};
pub use registry::ScaleRegistry;
pub use transform::{Operation, Transform};
pub use unit::Unit;
