//! The inline byte region backing type-erased callable storage.
//!
//! This module encapsulates the raw bytes of [`InlineBuffer`]. The buffer is
//! exactly one machine word, sized and aligned like `*mut ()`, so it can hold
//! either a small callable directly or the pointer to a heap allocation for
//! everything else.
//!
//! The buffer's bytes are meaningless on their own: only the vtable installed
//! next to it in [`RawFunction`] records what (if anything) they currently
//! encode. All accessors here are therefore unchecked with respect to both
//! the payload type and its initialization state; the callers in
//! [`vtable`] and [`raw`] are responsible for using them only under a
//! matching vtable.
//!
//! [`RawFunction`]: crate::function::raw::RawFunction
//! [`vtable`]: crate::function::vtable
//! [`raw`]: crate::function::raw

use core::mem::{MaybeUninit, align_of, size_of};

/// One machine word of raw, possibly-uninitialized storage.
///
/// Basing the region on `MaybeUninit<*mut ()>` gives it pointer size and
/// pointer alignment on every target, and keeps the surrounding storage
/// `!Send`/`!Sync` by auto-trait rules, which is the intended concurrency
/// contract for type-erased payloads.
pub(super) struct InlineBuffer(MaybeUninit<*mut ()>);

impl InlineBuffer {
    /// Size of the region in bytes.
    pub(super) const SIZE: usize = size_of::<*mut ()>();

    /// Alignment of the region in bytes.
    pub(super) const ALIGN: usize = align_of::<*mut ()>();

    /// Creates a new buffer without initializing any value in it.
    pub(super) const fn new() -> Self {
        Self(MaybeUninit::uninit())
    }

    /// Returns `true` if a value of type `T` can be stored directly in the
    /// buffer.
    ///
    /// This is the placement predicate: it is a pure function of `T`'s
    /// layout, so the decision it encodes is fixed forever for a given `T`.
    /// Every type relocates by bitwise copy, so size and alignment are the
    /// only constraints.
    pub(super) const fn fits<T>() -> bool {
        size_of::<T>() <= Self::SIZE && align_of::<T>() <= Self::ALIGN
    }

    /// Writes `value` into the buffer without dropping any previous content.
    ///
    /// # Panics
    ///
    /// Panics if `T` does not satisfy [`InlineBuffer::fits`].
    pub(super) fn write<T>(&mut self, value: T) {
        assert!(Self::fits::<T>());

        // SAFETY: The assert above guarantees the region is large enough and
        // sufficiently aligned for a `T`, and writing through the cast
        // pointer does not read any uninitialized bytes.
        unsafe { self.0.as_mut_ptr().cast::<T>().write(value) }
    }

    /// Returns a shared reference to the buffer contents as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The buffer currently holds an initialized value of type `T`,
    ///    written via [`InlineBuffer::write`] and not yet read out or
    ///    dropped.
    pub(super) unsafe fn get<T>(&self) -> &T {
        debug_assert!(Self::fits::<T>());

        // SAFETY: The buffer holds an initialized `T` (guaranteed by the
        // caller), and `write` only ever stores values that fit, so the cast
        // pointer is aligned and dereferenceable.
        unsafe { &*self.0.as_ptr().cast::<T>() }
    }

    /// Returns a mutable reference to the buffer contents as a `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The buffer currently holds an initialized value of type `T`,
    ///    written via [`InlineBuffer::write`] and not yet read out or
    ///    dropped.
    pub(super) unsafe fn get_mut<T>(&mut self) -> &mut T {
        debug_assert!(Self::fits::<T>());

        // SAFETY: The buffer holds an initialized `T` (guaranteed by the
        // caller), and `write` only ever stores values that fit, so the cast
        // pointer is aligned and dereferenceable.
        unsafe { &mut *self.0.as_mut_ptr().cast::<T>() }
    }

    /// Moves the buffer contents out as a `T`, leaving the bytes logically
    /// uninitialized.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The buffer currently holds an initialized value of type `T`,
    ///    written via [`InlineBuffer::write`] and not yet read out or
    ///    dropped.
    /// 2. The contents are not read, dropped, or read out again afterwards
    ///    (ownership of the value transfers to the caller).
    pub(super) unsafe fn read<T>(&self) -> T {
        debug_assert!(Self::fits::<T>());

        // SAFETY: The buffer holds an initialized `T` (guaranteed by the
        // caller), the pointer is aligned per `write`, and the caller takes
        // ownership of the value produced by this bitwise copy.
        unsafe { self.0.as_ptr().cast::<T>().read() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_layout_matches_a_pointer() {
        assert_eq!(size_of::<InlineBuffer>(), size_of::<*mut ()>());
        assert_eq!(align_of::<InlineBuffer>(), align_of::<*mut ()>());
    }

    #[test]
    fn test_fits_small_types() {
        assert!(InlineBuffer::fits::<u8>());
        assert!(InlineBuffer::fits::<usize>());
        assert!(InlineBuffer::fits::<*mut u8>());
        assert!(InlineBuffer::fits::<()>());
    }

    #[test]
    fn test_rejects_oversized_types() {
        assert!(!InlineBuffer::fits::<[usize; 2]>());
        assert!(!InlineBuffer::fits::<[u8; 64]>());
    }

    #[test]
    fn test_rejects_overaligned_types() {
        #[repr(align(32))]
        #[derive(Clone, Copy)]
        struct LargeAlignment {
            _value: u8,
        }

        assert!(!InlineBuffer::fits::<LargeAlignment>());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let mut buffer = InlineBuffer::new();
        buffer.write(0x5a5a_usize);

        // SAFETY: The buffer was just initialized with a `usize`.
        let value: &usize = unsafe { buffer.get::<usize>() };
        assert_eq!(*value, 0x5a5a);

        // SAFETY: The buffer still holds the `usize`; `usize` is `Copy`, so
        // reading it out transfers nothing that could be double-dropped.
        let owned: usize = unsafe { buffer.read::<usize>() };
        assert_eq!(owned, 0x5a5a);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut buffer = InlineBuffer::new();
        buffer.write(1_u32);

        {
            // SAFETY: The buffer was just initialized with a `u32`.
            let value: &mut u32 = unsafe { buffer.get_mut::<u32>() };
            *value += 41;
        }

        // SAFETY: The buffer still holds the `u32` written above.
        assert_eq!(unsafe { *buffer.get::<u32>() }, 42);
    }
}
