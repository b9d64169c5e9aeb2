//! Internal utility types.

/// Marker type serving as the type identity of storage that holds no
/// callable.
///
/// The empty dispatch table reports the [`TypeId`] of this type, so "is this
/// storage empty" is the same branch-free identity test as "does this storage
/// hold a `F`". Since the type is private to this crate, no user-supplied
/// callable can ever collide with it.
///
/// [`TypeId`]: core::any::TypeId
pub(crate) struct Empty;
