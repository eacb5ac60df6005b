//! Addressable memory model
//!
//! Byte stores, bounds-checked sections, address handles and the address
//! space that owns them.

mod address;
mod section;
mod shadow;
mod space;
mod store;

pub use address::{MemoryAddress, SectionId};
pub use section::MemorySection;
pub use shadow::ShadowMemory;
pub use space::AddressSpace;
pub use store::{ByteStore, MemoryStore};

pub(crate) use store::check_store_range;
