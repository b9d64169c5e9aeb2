//! The public callable container.

use core::fmt;

use anyfn_internals::{BadFunctionCall, RawFunction};

use crate::{Callable, Signature};

/// A type-erased callable container over the signature `S`.
///
/// Holds any clonable callable whose parameter list and result type match
/// `S` (written as a function-pointer type, e.g. `fn(i32) -> i32`), or
/// nothing at all. Callables no larger than one machine word live directly
/// inside the container; larger or over-aligned ones live behind a single
/// heap allocation. Which of the two applies is decided once per callable
/// type, at compile time.
///
/// # Value Semantics
///
/// Cloning a container deep-copies the contained callable; two containers
/// never share state. Moving a container relocates it: the moved-from
/// binding is statically inaccessible afterwards, so there is no observable
/// "moved-from" state to reason about. A container you can still reach
/// always either holds its callable or is empty.
///
/// # Examples
///
/// ```
/// use anyfn::Function;
///
/// let mut counter: Function<fn() -> u32> = Function::new({
///     let mut count = 0_u32;
///     move || {
///         count += 1;
///         count
///     }
/// });
///
/// assert_eq!(counter.call(()), Ok(1));
/// assert_eq!(counter.call(()), Ok(2));
///
/// // Clones take their state at clone time and advance independently.
/// let mut snapshot = counter.clone();
/// assert_eq!(counter.call(()), Ok(3));
/// assert_eq!(snapshot.call(()), Ok(3));
/// ```
pub struct Function<S: Signature> {
    /// The type-erased storage; all behavior is delegated here.
    raw: RawFunction<S>,
}

impl<S: Signature> Function<S> {
    /// Creates an empty container.
    ///
    /// Invoking it returns [`BadFunctionCall`] until a callable is assigned.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::{BadFunctionCall, Function};
    ///
    /// let mut f = Function::<fn(i32) -> i32>::empty();
    ///
    /// assert!(f.is_empty());
    /// assert_eq!(f.call((10,)), Err(BadFunctionCall));
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            raw: RawFunction::empty(),
        }
    }

    /// Creates a container holding `callable`.
    ///
    /// The callable must match the signature `S` and be [`Clone`], since the
    /// container itself is clonable. If its type is no larger and no more
    /// aligned than one machine word it is stored inline, without
    /// allocation; otherwise it is moved onto the heap.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// // A capture-free closure: stored inline.
    /// let mut double: Function<fn(u64) -> u64> = Function::new(|x: u64| x * 2);
    /// assert_eq!(double.call((21,)), Ok(42));
    ///
    /// // A closure with a large capture: stored behind one allocation.
    /// let weights = [1.0_f64; 16];
    /// let mut dot: Function<fn(usize) -> f64> = Function::new(move |i: usize| weights[i]);
    /// assert_eq!(dot.call((3,)), Ok(1.0));
    /// ```
    #[inline]
    pub fn new<F>(callable: F) -> Self
    where
        F: Callable<S> + Clone,
    {
        Self {
            raw: RawFunction::new(callable),
        }
    }

    /// Returns `true` if the container holds no callable.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// let mut f = Function::<fn() -> u8>::empty();
    /// assert!(f.is_empty());
    ///
    /// f = Function::new(|| 7_u8);
    /// assert!(!f.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Invokes the contained callable with the tuple-packed argument list.
    ///
    /// A one-argument call takes a one-element tuple: `f.call((x,))`.
    ///
    /// Returns [`BadFunctionCall`] if the container is empty. Otherwise the
    /// callable's result comes back in `Ok`; whatever error type the
    /// callable itself may embed in that result passes through unchanged,
    /// and panics unwind through uncaught.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// let mut len: Function<fn(String) -> usize> = Function::new(|s: String| s.len());
    ///
    /// assert_eq!(len.call((String::from("four"),)), Ok(4));
    /// ```
    #[inline]
    pub fn call(&mut self, args: S::Args) -> Result<S::Output, BadFunctionCall> {
        self.raw.invoke(args)
    }

    /// Returns a reference to the contained callable if it is of exactly
    /// type `F`.
    ///
    /// Returns `None` if the container is empty or holds any other type,
    /// including convertible ones. This is the only way to observe the
    /// concrete type; there is no further introspection.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// fn add_five(x: i32) -> i32 {
    ///     x + 5
    /// }
    ///
    /// let f: Function<fn(i32) -> i32> = Function::new(add_five as fn(i32) -> i32);
    ///
    /// assert!(f.downcast_ref::<fn(i32) -> i32>().is_some());
    /// assert!(f.downcast_ref::<fn(i64) -> i64>().is_none());
    /// ```
    #[inline]
    #[must_use]
    pub fn downcast_ref<F: 'static>(&self) -> Option<&F> {
        if self.raw.is::<F>() {
            // SAFETY:
            // 1. The identity check above proves the stored type is `F`.
            Some(unsafe { self.raw.downcast_ref_unchecked() })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the contained callable if it is of
    /// exactly type `F`.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// fn add_five(x: i32) -> i32 {
    ///     x + 5
    /// }
    ///
    /// let mut f: Function<fn(i32) -> i32> = Function::new(add_five as fn(i32) -> i32);
    ///
    /// if let Some(target) = f.downcast_mut::<fn(i32) -> i32>() {
    ///     *target = |x: i32| x - 5;
    /// }
    /// assert_eq!(f.call((47,)), Ok(42));
    /// ```
    #[inline]
    #[must_use]
    pub fn downcast_mut<F: 'static>(&mut self) -> Option<&mut F> {
        if self.raw.is::<F>() {
            // SAFETY:
            // 1. The identity check above proves the stored type is `F`.
            Some(unsafe { self.raw.downcast_mut_unchecked() })
        } else {
            None
        }
    }

    /// Takes the contained callable out of the container if it is of exactly
    /// type `F`, returning the container unchanged otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyfn::Function;
    ///
    /// fn add_five(x: i32) -> i32 {
    ///     x + 5
    /// }
    ///
    /// let f: Function<fn(i32) -> i32> = Function::new(add_five as fn(i32) -> i32);
    ///
    /// let Ok(add) = f.into_callable::<fn(i32) -> i32>() else {
    ///     panic!();
    /// };
    /// assert_eq!(add(1), 6);
    /// ```
    #[inline]
    pub fn into_callable<F: 'static>(self) -> Result<F, Self> {
        self.raw.into_callable().map_err(|raw| Self { raw })
    }
}

impl<S: Signature> Clone for Function<S> {
    /// Deep-copies the container; the contained callable is cloned, never
    /// shared.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
        }
    }
}

impl<S: Signature> Default for Function<S> {
    /// Creates an empty container, equivalent to [`Function::empty`].
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature> fmt::Debug for Function<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Function(empty)")
        } else {
            write!(f, "Function({})", self.raw.type_name())
        }
    }
}
