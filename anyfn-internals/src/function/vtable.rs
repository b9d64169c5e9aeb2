//! Vtable for type-erased callable operations.
//!
//! This module contains the [`FunctionVtable`] which enables cloning,
//! invoking, and dropping a stored callable after its concrete type `F` has
//! been erased. The vtable stores function pointers that dispatch to the
//! correct typed implementations.
//!
//! This module encapsulates the fields of [`FunctionVtable`] so they cannot
//! be accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the payload actually
//! encoded in the buffer it is applied to**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`FunctionVtable::inline`], [`FunctionVtable::boxed`], or
//! [`FunctionVtable::empty`], which pair the function pointers with a
//! specific payload type and placement at compile time, and because
//! [`RawFunction`] only ever installs a vtable together with the matching
//! payload.
//!
//! # Placement Variants
//!
//! Each contained type gets one of two table variants, chosen once per type
//! by the placement predicate [`InlineBuffer::fits`]:
//!
//! - **inline**: the callable lives directly in the buffer; clone
//!   copy-constructs into a fresh buffer, drop runs the destructor in place.
//! - **boxed**: the buffer holds a `*mut F` to a heap allocation; clone
//!   allocates a deep copy (payloads are never shared), drop reconstitutes
//!   and drops the [`Box`].
//!
//! A third, distinguished **empty** table exists per signature for storage
//! holding no callable: its clone only propagates the empty table, its
//! invoke always fails, and its drop is a no-op. Installing it makes
//! destruction universal and branch-free for every storage state.

use alloc::boxed::Box;
use core::any::TypeId;

use crate::{
    error::BadFunctionCall,
    function::{buffer::InlineBuffer, raw::RawFunction},
    signature::{Callable, Signature},
    util::Empty,
};

/// Vtable for type-erased callable operations.
///
/// Contains function pointers for performing operations on a stored callable
/// without knowing its concrete type at compile time. One instance exists
/// per (contained type, signature) pair, shared by every storage holding
/// that type.
///
/// # Safety Invariant
///
/// The fields `clone`, `invoke`, and `drop` are guaranteed to point to the
/// functions defined below, instantiated with the payload type and placement
/// that were used to create this [`FunctionVtable`].
pub(crate) struct FunctionVtable<S: Signature> {
    /// Gets the [`TypeId`] of the callable type that was used to create this
    /// [`FunctionVtable`] (or of [`Empty`] for the empty table).
    type_id: fn() -> TypeId,
    /// Gets the diagnostic name of the callable type that was used to create
    /// this [`FunctionVtable`].
    type_name: fn() -> &'static str,
    /// Clones the payload encoded in the buffer into a complete new storage
    /// carrying this vtable.
    clone: unsafe fn(&InlineBuffer) -> RawFunction<S>,
    /// Invokes the payload encoded in the buffer with a tuple-packed
    /// argument list.
    invoke: unsafe fn(&mut InlineBuffer, S::Args) -> Result<S::Output, BadFunctionCall>,
    /// Releases the payload encoded in the buffer.
    drop: unsafe fn(&mut InlineBuffer),
}

impl<S: Signature> FunctionVtable<S> {
    /// Creates the [`FunctionVtable`] for a callable type `F` stored inline
    /// in the buffer.
    ///
    /// Must only be paired with buffers whose payload was written with
    /// [`InlineBuffer::write::<F>`](InlineBuffer::write), which implies `F`
    /// satisfies [`InlineBuffer::fits`].
    pub(super) const fn inline<F>() -> &'static Self
    where
        F: Callable<S> + Clone,
    {
        const {
            &Self {
                type_id: TypeId::of::<F>,
                type_name: core::any::type_name::<F>,
                clone: clone_inline::<S, F>,
                invoke: invoke_inline::<S, F>,
                drop: drop_inline::<F>,
            }
        }
    }

    /// Creates the [`FunctionVtable`] for a callable type `F` stored behind
    /// a heap allocation, with only the `*mut F` kept in the buffer.
    pub(super) const fn boxed<F>() -> &'static Self
    where
        F: Callable<S> + Clone,
    {
        const {
            &Self {
                type_id: TypeId::of::<F>,
                type_name: core::any::type_name::<F>,
                clone: clone_boxed::<S, F>,
                invoke: invoke_boxed::<S, F>,
                drop: drop_boxed::<F>,
            }
        }
    }

    /// Creates the distinguished empty [`FunctionVtable`] for the signature
    /// `S`, used by storage holding no callable.
    pub(super) const fn empty() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<Empty>,
                type_name: core::any::type_name::<Empty>,
                clone: clone_empty::<S>,
                invoke: invoke_empty::<S>,
                drop: drop_empty,
            }
        }
    }

    /// Gets the [`TypeId`] of the callable type that was used to create this
    /// [`FunctionVtable`] (or of [`Empty`] for the empty table).
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the diagnostic name of the callable type that was used to create
    /// this [`FunctionVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Clones the payload encoded in `buffer` into a complete new storage
    /// carrying this vtable.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`FunctionVtable`] must be the vtable installed next to
    ///    `buffer`, so that `buffer` encodes a payload of the type and
    ///    placement this vtable was created for.
    #[inline]
    pub(super) unsafe fn clone(&self, buffer: &InlineBuffer) -> RawFunction<S> {
        // SAFETY: We know that `self.clone` points to one of the functions
        // `clone_inline::<S, F>`, `clone_boxed::<S, F>`, or
        // `clone_empty::<S>` below. Their safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.clone)(buffer) }
    }

    /// Invokes the payload encoded in `buffer` with the given arguments.
    ///
    /// For the empty table this always returns [`BadFunctionCall`]; for
    /// every other table it returns whatever the callable returns.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`FunctionVtable`] must be the vtable installed next to
    ///    `buffer`, so that `buffer` encodes a payload of the type and
    ///    placement this vtable was created for.
    #[inline]
    pub(super) unsafe fn invoke(
        &self,
        buffer: &mut InlineBuffer,
        args: S::Args,
    ) -> Result<S::Output, BadFunctionCall> {
        // SAFETY: We know that `self.invoke` points to one of the functions
        // `invoke_inline::<S, F>`, `invoke_boxed::<S, F>`, or
        // `invoke_empty::<S>` below. Their safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.invoke)(buffer, args) }
    }

    /// Releases the payload encoded in `buffer`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`FunctionVtable`] must be the vtable installed next to
    ///    `buffer`, so that `buffer` encodes a payload of the type and
    ///    placement this vtable was created for.
    /// 2. The payload has not already been released or read out, and is not
    ///    used after this call.
    #[inline]
    pub(super) unsafe fn drop(&self, buffer: &mut InlineBuffer) {
        // SAFETY: We know that `self.drop` points to one of the functions
        // `drop_inline::<F>`, `drop_boxed::<F>`, or `drop_empty` below.
        // Their safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe { (self.drop)(buffer) }
    }
}

/// Clones the buffer-resident `F` into a fresh inline storage.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized inline value of type `F`.
unsafe fn clone_inline<S, F>(buffer: &InlineBuffer) -> RawFunction<S>
where
    S: Signature,
    F: Callable<S> + Clone,
{
    // SAFETY: The buffer holds an initialized inline `F`, as guaranteed by
    // the caller.
    let callable: &F = unsafe { buffer.get::<F>() };

    let mut out = InlineBuffer::new();
    out.write(callable.clone());
    RawFunction::from_parts(FunctionVtable::<S>::inline::<F>(), out)
}

/// Invokes the buffer-resident `F` with the given arguments.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized inline value of type `F`.
unsafe fn invoke_inline<S, F>(
    buffer: &mut InlineBuffer,
    args: S::Args,
) -> Result<S::Output, BadFunctionCall>
where
    S: Signature,
    F: Callable<S>,
{
    // SAFETY: The buffer holds an initialized inline `F`, as guaranteed by
    // the caller.
    let callable: &mut F = unsafe { buffer.get_mut::<F>() };
    Ok(callable.call(args))
}

/// Drops the buffer-resident `F` in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized inline value of type `F`.
/// 2. The value is not used, dropped again, or read out afterwards.
unsafe fn drop_inline<F>(buffer: &mut InlineBuffer) {
    // SAFETY: The buffer holds an initialized inline `F` that the caller is
    // giving up, so dropping it in place releases it exactly once.
    let callable: &mut F = unsafe { buffer.get_mut::<F>() };

    let ptr: *mut F = callable;
    // SAFETY: `ptr` points to the initialized `F` obtained above; ownership
    // of the value ends here per the caller's guarantee.
    unsafe { ptr.drop_in_place() }
}

/// Clones the heap-resident `F` into a fresh boxed storage.
///
/// The new storage owns a new allocation; payloads are never shared between
/// two storages.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized `*mut F` obtained from
///    [`Box::into_raw`], whose pointee is initialized.
unsafe fn clone_boxed<S, F>(buffer: &InlineBuffer) -> RawFunction<S>
where
    S: Signature,
    F: Callable<S> + Clone,
{
    // SAFETY: The buffer holds an initialized `*mut F`, as guaranteed by the
    // caller.
    let ptr: *mut F = unsafe { *buffer.get::<*mut F>() };

    // SAFETY: The pointer came from `Box::into_raw` and its pointee is
    // initialized, as guaranteed by the caller.
    let callable: &F = unsafe { &*ptr };

    let mut out = InlineBuffer::new();
    out.write::<*mut F>(Box::into_raw(Box::new(callable.clone())));
    RawFunction::from_parts(FunctionVtable::<S>::boxed::<F>(), out)
}

/// Invokes the heap-resident `F` with the given arguments.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized `*mut F` obtained from
///    [`Box::into_raw`], whose pointee is initialized.
unsafe fn invoke_boxed<S, F>(
    buffer: &mut InlineBuffer,
    args: S::Args,
) -> Result<S::Output, BadFunctionCall>
where
    S: Signature,
    F: Callable<S>,
{
    // SAFETY: The buffer holds an initialized `*mut F`, as guaranteed by the
    // caller.
    let ptr: *mut F = unsafe { *buffer.get_mut::<*mut F>() };

    // SAFETY: The pointer came from `Box::into_raw` and its pointee is
    // initialized; the storage is uniquely borrowed for the duration of the
    // call, so creating a mutable reference cannot alias.
    let callable: &mut F = unsafe { &mut *ptr };
    Ok(callable.call(args))
}

/// Drops the heap-resident `F` and releases its allocation.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `buffer` holds an initialized `*mut F` obtained from
///    [`Box::into_raw`], whose pointee is initialized.
/// 2. The allocation has not already been released, and neither the pointer
///    nor the payload is used afterwards.
unsafe fn drop_boxed<F>(buffer: &mut InlineBuffer) {
    // SAFETY: The buffer holds an initialized `*mut F`, as guaranteed by the
    // caller.
    let ptr: *mut F = unsafe { buffer.read::<*mut F>() };

    // SAFETY: The pointer came from `Box::into_raw` and ownership transfers
    // back here exactly once, per the caller's guarantee.
    let boxed: Box<F> = unsafe { Box::from_raw(ptr) };
    core::mem::drop(boxed);
}

/// Clones empty storage: there is no payload, so only the empty table
/// propagates.
///
/// # Safety
///
/// Never actually unsafe; the signature matches the vtable slot, which must
/// be callable for every table variant.
unsafe fn clone_empty<S: Signature>(_buffer: &InlineBuffer) -> RawFunction<S> {
    RawFunction::empty()
}

/// Invokes empty storage: always fails with [`BadFunctionCall`].
///
/// # Safety
///
/// Never actually unsafe; the signature matches the vtable slot, which must
/// be callable for every table variant.
unsafe fn invoke_empty<S: Signature>(
    _buffer: &mut InlineBuffer,
    _args: S::Args,
) -> Result<S::Output, BadFunctionCall> {
    Err(BadFunctionCall)
}

/// Drops empty storage: a no-op, there is no payload to release.
///
/// # Safety
///
/// Never actually unsafe; the signature matches the vtable slot, which must
/// be callable for every table variant.
unsafe fn drop_empty(_buffer: &mut InlineBuffer) {}

#[cfg(test)]
mod tests {
    use super::*;

    type Sig = fn(i32) -> i32;

    fn add_one(x: i32) -> i32 {
        x + 1
    }

    #[test]
    fn test_vtable_is_one_instance_per_type() {
        let vtable1 = FunctionVtable::<Sig>::inline::<fn(i32) -> i32>();
        let vtable2 = FunctionVtable::<Sig>::inline::<fn(i32) -> i32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_vtable_reports_the_callable_type() {
        let vtable = FunctionVtable::<Sig>::inline::<fn(i32) -> i32>();
        assert_eq!(vtable.type_id(), TypeId::of::<fn(i32) -> i32>());
        assert_ne!(vtable.type_id(), TypeId::of::<Empty>());
    }

    #[test]
    fn test_empty_vtable_reports_the_empty_marker() {
        let vtable = FunctionVtable::<Sig>::empty();
        assert_eq!(vtable.type_id(), TypeId::of::<Empty>());
    }

    #[test]
    fn test_empty_vtable_invoke_always_fails() {
        let vtable = FunctionVtable::<Sig>::empty();
        let mut buffer = InlineBuffer::new();

        // SAFETY: The empty vtable governs any buffer contents; it never
        // reads them.
        let result = unsafe { vtable.invoke(&mut buffer, (10,)) };
        assert_eq!(result, Err(BadFunctionCall));
    }

    #[test]
    fn test_inline_vtable_invokes_the_payload() {
        let vtable = FunctionVtable::<Sig>::inline::<fn(i32) -> i32>();
        let mut buffer = InlineBuffer::new();
        buffer.write::<fn(i32) -> i32>(add_one);

        // SAFETY: The buffer was just initialized with the `fn(i32) -> i32`
        // this vtable was created for.
        let result = unsafe { vtable.invoke(&mut buffer, (41,)) };
        assert_eq!(result, Ok(42));

        // SAFETY: The buffer still holds the payload; it is released here
        // exactly once and not used again.
        unsafe { vtable.drop(&mut buffer) };
    }
}
