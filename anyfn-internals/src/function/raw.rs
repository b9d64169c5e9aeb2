//! Owned type-erased callable storage.
//!
//! This module encapsulates the fields of [`RawFunction`], ensuring they are
//! only visible within this module and its siblings. This visibility
//! restriction guarantees the safety invariant: **the installed vtable
//! always matches the payload the buffer currently encodes**. The invariant
//! follows from the fact that the two are in sync when created and that the
//! API offers no way to change one without the other afterwards.
//!
//! # Placement
//!
//! Construction decides once, via [`InlineBuffer::fits`], whether a callable
//! type is stored inline in the buffer or behind a heap allocation with only
//! the pointer kept inline. The decision is a pure function of the type's
//! layout, so the same type always receives the same placement and the same
//! vtable instance.
//!
//! # Moves
//!
//! Moving a [`RawFunction`] is a compiler-tracked bitwise relocation, after
//! which the source is statically inaccessible. There is consequently no
//! runtime move operation anywhere in this module: a moved-from storage
//! cannot be invoked, dropped twice, or observed at all.

use core::{any::TypeId, mem::ManuallyDrop};

use alloc::boxed::Box;

use crate::{
    error::BadFunctionCall,
    function::{buffer::InlineBuffer, vtable::FunctionVtable},
    signature::{Callable, Signature},
    util::Empty,
};

/// Owned, type-erased storage for one callable matching the signature `S`.
///
/// The storage is empty, or holds exactly one callable of some concrete type
/// `F`, placed inline or behind a heap allocation. All operations are
/// delegated through the installed vtable, so this type contains no
/// type-specific branching of its own.
pub struct RawFunction<S: Signature> {
    /// The vtable governing the buffer contents.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long
    /// as this struct exists:
    ///
    /// 1. The reference always points to either the empty vtable for `S` or
    ///    to the vtable matching the payload the buffer currently encodes.
    /// 2. The vtable and the buffer are only ever replaced together.
    vtable: &'static FunctionVtable<S>,

    /// The buffer encoding the payload.
    ///
    /// # Safety
    ///
    /// Holds the inline payload (for types passing [`InlineBuffer::fits`]),
    /// an initialized `*mut F` from [`Box::into_raw`] (for all others), or
    /// nothing (under the empty vtable). Which of the three applies is
    /// recorded solely by `vtable`.
    buffer: InlineBuffer,
}

impl<S: Signature> RawFunction<S> {
    /// Creates empty storage: no payload, the empty vtable installed.
    ///
    /// Invoking the result fails with [`BadFunctionCall`] until a callable
    /// is stored via assignment from [`RawFunction::new`].
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            vtable: FunctionVtable::empty(),
            buffer: InlineBuffer::new(),
        }
    }

    /// Creates storage holding `callable`.
    ///
    /// Callable types that fit the inline buffer are stored without
    /// allocation; every other type is moved onto the heap, with only the
    /// pointer kept inline.
    #[inline]
    pub fn new<F>(callable: F) -> Self
    where
        F: Callable<S> + Clone,
    {
        let mut buffer = InlineBuffer::new();

        if InlineBuffer::fits::<F>() {
            buffer.write(callable);
            Self {
                vtable: FunctionVtable::inline::<F>(),
                buffer,
            }
        } else {
            buffer.write::<*mut F>(Box::into_raw(Box::new(callable)));
            Self {
                vtable: FunctionVtable::boxed::<F>(),
                buffer,
            }
        }
    }

    /// Assembles storage from a vtable and the buffer it governs.
    ///
    /// Callers (the vtable clone operations) must pass a buffer whose
    /// payload matches `vtable`; this is enforced by construction at every
    /// call site rather than by a runtime check.
    #[inline]
    pub(super) fn from_parts(vtable: &'static FunctionVtable<S>, buffer: InlineBuffer) -> Self {
        Self { vtable, buffer }
    }

    /// Returns the [`TypeId`] of the contained callable type, or of the
    /// private empty marker if the storage is empty.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the diagnostic name of the contained callable type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Returns `true` if the storage holds no callable.
    ///
    /// The test is the same vtable identity comparison as [`RawFunction::is`];
    /// no separate empty flag exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_id() == TypeId::of::<Empty>()
    }

    /// Returns `true` if the stored callable is exactly of type `F`.
    ///
    /// Supertypes, convertible types, and the empty state all report
    /// `false`.
    #[inline]
    pub fn is<F: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<F>()
    }

    /// Invokes the stored callable with the given arguments.
    ///
    /// Returns [`BadFunctionCall`] if the storage is empty; otherwise
    /// returns whatever the callable returns. Panics raised by the callable
    /// unwind through unchanged.
    #[inline]
    pub fn invoke(&mut self, args: S::Args) -> Result<S::Output, BadFunctionCall> {
        let vtable = self.vtable;
        // SAFETY:
        // 1. `vtable` is the vtable installed next to this buffer, per the
        //    field invariants of this type.
        unsafe { vtable.invoke(&mut self.buffer, args) }
    }

    /// Returns a reference to the stored callable without checking its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage currently holds a callable of exactly type `F`
    ///    (checkable via [`RawFunction::is`]).
    #[inline]
    pub unsafe fn downcast_ref_unchecked<F: 'static>(&self) -> &F {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), TypeId::of::<F>());

        if InlineBuffer::fits::<F>() {
            // SAFETY: The storage holds an `F` (guaranteed by the caller),
            // and `F` passes the placement predicate, so it was written
            // inline.
            unsafe { self.buffer.get::<F>() }
        } else {
            // SAFETY: The storage holds an `F` (guaranteed by the caller),
            // and `F` fails the placement predicate, so the buffer holds an
            // initialized `*mut F`.
            let ptr: *mut F = unsafe { *self.buffer.get::<*mut F>() };

            // SAFETY: The pointer came from `Box::into_raw` per the field
            // invariants and its pointee is initialized.
            unsafe { &*ptr }
        }
    }

    /// Returns a mutable reference to the stored callable without checking
    /// its type.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The storage currently holds a callable of exactly type `F`
    ///    (checkable via [`RawFunction::is`]).
    #[inline]
    pub unsafe fn downcast_mut_unchecked<F: 'static>(&mut self) -> &mut F {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.type_id(), TypeId::of::<F>());

        if InlineBuffer::fits::<F>() {
            // SAFETY: The storage holds an `F` (guaranteed by the caller),
            // and `F` passes the placement predicate, so it was written
            // inline.
            unsafe { self.buffer.get_mut::<F>() }
        } else {
            // SAFETY: The storage holds an `F` (guaranteed by the caller),
            // and `F` fails the placement predicate, so the buffer holds an
            // initialized `*mut F`.
            let ptr: *mut F = unsafe { *self.buffer.get::<*mut F>() };

            // SAFETY: The pointer came from `Box::into_raw` per the field
            // invariants, its pointee is initialized, and the storage is
            // uniquely borrowed, so the mutable reference cannot alias.
            unsafe { &mut *ptr }
        }
    }

    /// Takes the stored callable out, returning it by value if it is of
    /// exactly type `F`, or the intact storage otherwise.
    ///
    /// For heap-placed callables the allocation is released without the
    /// payload being dropped; for inline callables the value is read out of
    /// the buffer. Either way the storage ceases to exist, so no empty husk
    /// remains behind.
    pub fn into_callable<F: 'static>(self) -> Result<F, Self> {
        if !self.is::<F>() {
            return Err(self);
        }

        // Prevent the vtable drop from running; ownership of the payload
        // moves to the caller below.
        let this = ManuallyDrop::new(self);

        if InlineBuffer::fits::<F>() {
            // SAFETY: The storage holds an inline `F` (identity checked
            // above, placement per the predicate), and `this` is never
            // dropped, so the value is read out exactly once.
            Ok(unsafe { this.buffer.read::<F>() })
        } else {
            // SAFETY: The storage holds an `F` behind a heap allocation, so
            // the buffer holds an initialized `*mut F`; `this` is never
            // dropped, so ownership of the pointer moves here exactly once.
            let ptr: *mut F = unsafe { this.buffer.read::<*mut F>() };

            // SAFETY: The pointer came from `Box::into_raw` of a `Box<F>`;
            // `ManuallyDrop<F>` has the same layout as `F`, so the cast
            // reconstitutes the allocation while keeping the payload alive
            // for the move out below.
            let boxed: Box<ManuallyDrop<F>> = unsafe { Box::from_raw(ptr.cast::<ManuallyDrop<F>>()) };
            Ok(ManuallyDrop::into_inner(*boxed))
        }
    }
}

impl<S: Signature> Clone for RawFunction<S> {
    /// Deep-copies the storage: heap-placed payloads are cloned into a new
    /// allocation, never shared.
    fn clone(&self) -> Self {
        // SAFETY:
        // 1. `self.vtable` is the vtable installed next to this buffer, per
        //    the field invariants of this type.
        unsafe { self.vtable.clone(&self.buffer) }
    }
}

impl<S: Signature> Drop for RawFunction<S> {
    fn drop(&mut self) {
        let vtable = self.vtable;
        // SAFETY:
        // 1. `vtable` is the vtable installed next to this buffer, per the
        //    field invariants of this type.
        // 2. The payload is released exactly once here, since we are in the
        //    drop function and every payload-consuming path forgets `self`.
        unsafe { vtable.drop(&mut self.buffer) }
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use alloc::sync::Arc;

    use super::*;

    type Sig = fn(i32) -> i32;

    fn add_five(x: i32) -> i32 {
        x + 5
    }

    #[test]
    fn test_raw_function_is_two_words() {
        assert_eq!(
            core::mem::size_of::<RawFunction<Sig>>(),
            2 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_not_send_not_sync() {
        static_assertions::assert_not_impl_any!(RawFunction<Sig>: Send, Sync);
    }

    #[test]
    fn test_empty_storage() {
        let mut raw = RawFunction::<Sig>::empty();
        assert!(raw.is_empty());
        assert!(!raw.is::<fn(i32) -> i32>());
        assert_eq!(raw.invoke((1,)), Err(BadFunctionCall));
    }

    #[test]
    fn test_inline_placement_round_trip() {
        let mut raw = RawFunction::<Sig>::new(add_five as fn(i32) -> i32);
        assert!(!raw.is_empty());
        assert!(raw.is::<fn(i32) -> i32>());
        assert_eq!(raw.invoke((10,)), Ok(15));
    }

    #[test]
    fn test_boxed_placement_round_trip() {
        let weights = [1_i64; 8];
        let mut raw = RawFunction::<Sig>::new(move |x: i32| {
            let bias: i64 = weights.iter().sum();
            x + i32::try_from(bias).unwrap()
        });
        assert_eq!(raw.invoke((2,)), Ok(10));
    }

    #[test]
    fn test_clone_is_independent_for_inline_payloads() {
        let mut original = RawFunction::<fn() -> u32>::new({
            let mut calls = 0_u32;
            move || {
                calls += 1;
                calls
            }
        });
        let mut copy = original.clone();

        assert_eq!(original.invoke(()), Ok(1));
        assert_eq!(original.invoke(()), Ok(2));

        // The copy took its state at clone time and advances on its own.
        assert_eq!(copy.invoke(()), Ok(1));
        assert_eq!(original.invoke(()), Ok(3));
    }

    #[test]
    fn test_clone_is_independent_for_boxed_payloads() {
        let padding = [7_u64; 8];
        let mut original = RawFunction::<fn() -> u64>::new({
            let mut calls = 0_u64;
            move || {
                calls += 1;
                calls + padding[0] - 7
            }
        });
        let mut copy = original.clone();

        assert_eq!(original.invoke(()), Ok(1));
        assert_eq!(original.invoke(()), Ok(2));
        assert_eq!(copy.invoke(()), Ok(1));
    }

    #[test]
    fn test_into_callable_returns_the_payload() {
        let raw = RawFunction::<Sig>::new(add_five as fn(i32) -> i32);
        let f = raw.into_callable::<fn(i32) -> i32>().ok().unwrap();
        assert_eq!(f(1), 6);
    }

    #[test]
    fn test_into_callable_rejects_other_types() {
        let raw = RawFunction::<Sig>::new(add_five as fn(i32) -> i32);
        let raw = raw.into_callable::<u32>().unwrap_err();
        assert!(raw.is::<fn(i32) -> i32>());
    }

    /// Counts drops of the closure capture it travels inside.
    struct DropGuard(Arc<AtomicUsize>);

    impl Clone for DropGuard {
        fn clone(&self) -> Self {
            DropGuard(Arc::clone(&self.0))
        }
    }

    impl Drop for DropGuard {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_drop_releases_inline_payload_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropGuard(Arc::clone(&drops));
        {
            let mut raw = RawFunction::<fn() -> usize>::new(move || {
                let _held = &guard;
                0_usize
            });
            assert_eq!(raw.invoke(()), Ok(0));
        }
        assert_eq!(drops.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_drop_releases_boxed_payload_and_clone_exactly_once_each() {
        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropGuard(Arc::clone(&drops));
        let padding = [0_u64; 8];
        {
            let raw = RawFunction::<fn() -> usize>::new(move || {
                let _held = (&guard, &padding);
                0_usize
            });
            let copy = raw.clone();
            drop(raw);
            assert_eq!(drops.load(Ordering::Relaxed), 1);
            drop(copy);
        }
        assert_eq!(drops.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_into_callable_does_not_drop_the_payload() {
        /// Round-trips a concrete callable through erased storage; the
        /// generic parameter keeps the otherwise unnameable closure type
        /// nameable for the downcast.
        fn round_trip<F>(callable: F, drops: &AtomicUsize)
        where
            F: Callable<fn() -> usize> + Clone,
        {
            let raw = RawFunction::<fn() -> usize>::new(callable);
            let mut callable: F = raw.into_callable::<F>().ok().unwrap();

            assert_eq!(drops.load(Ordering::Relaxed), 0);
            assert_eq!(callable.call(()), 0);
            drop(callable);
            assert_eq!(drops.load(Ordering::Relaxed), 1);
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let guard = DropGuard(Arc::clone(&drops));
        round_trip(
            move || {
                let _held = &guard;
                0_usize
            },
            &drops,
        );
    }
}
