//! Type-erased callable storage: buffer, vtable, and the owned storage that
//! combines them.

pub(crate) mod buffer;
pub(crate) mod raw;
pub(crate) mod vtable;

pub use raw::RawFunction;
