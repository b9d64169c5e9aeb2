//! Traits that describe call signatures and the callables matching them.
//!
//! A container is parameterized by a *signature*: a fixed argument-type list
//! and result type, written as an ordinary function-pointer type such as
//! `fn(i32, String) -> bool`. The [`Signature`] trait maps that type to its
//! tuple-packed argument list and its result type, and the [`Callable`]
//! trait connects any [`FnMut`] closure (or function item) with a matching
//! parameter list to tuple-packed invocation.
//!
//! Containers of different signatures are unrelated types; there is no way
//! to call one storage through two signatures.
//!
//! Implementations are provided for arities 0 through 8. Argument and result
//! types must be `'static`, since the storage layer identifies contained
//! types by [`TypeId`].
//!
//! [`TypeId`]: core::any::TypeId

/// A call signature: a fixed argument-type list and result type.
///
/// Implemented for function-pointer types `fn(A1, ..., An) -> R` up to arity
/// 8. The signature type itself is never called; it only names the contract
/// a contained callable must satisfy.
///
/// # Examples
///
/// ```
/// use anyfn_internals::signature::Signature;
///
/// fn args_of<S: Signature>(args: S::Args) -> S::Args {
///     args
/// }
///
/// let args = args_of::<fn(i32, i32) -> i32>((1, 2));
/// assert_eq!(args, (1, 2));
/// ```
pub trait Signature: 'static {
    /// The argument list, packed as a tuple. Arguments are passed by value,
    /// so move-only argument types are supported.
    type Args;

    /// The result type of an invocation.
    type Output;
}

/// A callable object matching the signature `S`.
///
/// Implemented for every [`FnMut`] closure and function item whose parameter
/// list and result type match `S`. This is the bound a value must satisfy to
/// be stored in a container over `S`; the container additionally requires
/// [`Clone`] so that it can offer value semantics.
pub trait Callable<S: Signature>: 'static {
    /// Calls the object with the tuple-packed argument list.
    fn call(&mut self, args: S::Args) -> S::Output;
}

/// Implements [`Signature`] for one `fn(...)` arity and [`Callable`] for the
/// closures matching it.
macro_rules! impl_signature {
    ($($arg:ident),*) => {
        impl<Ret, $($arg,)*> Signature for fn($($arg),*) -> Ret
        where
            Ret: 'static,
            $($arg: 'static,)*
        {
            type Args = ($($arg,)*);
            type Output = Ret;
        }

        impl<Func, Ret, $($arg,)*> Callable<fn($($arg),*) -> Ret> for Func
        where
            Func: FnMut($($arg),*) -> Ret + 'static,
            Ret: 'static,
            $($arg: 'static,)*
        {
            #[inline]
            #[allow(non_snake_case)]
            fn call(&mut self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A1);
impl_signature!(A1, A2);
impl_signature!(A1, A2, A3);
impl_signature!(A1, A2, A3, A4);
impl_signature!(A1, A2, A3, A4, A5);
impl_signature!(A1, A2, A3, A4, A5, A6);
impl_signature!(A1, A2, A3, A4, A5, A6, A7);
impl_signature!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;

    /// Invokes a callable through the trait, the way the vtable layer does.
    fn call_through<S: Signature, F: Callable<S>>(f: &mut F, args: S::Args) -> S::Output {
        f.call(args)
    }

    #[test]
    fn test_nullary_callable() {
        let mut f = || 7_u32;
        assert_eq!(call_through::<fn() -> u32, _>(&mut f, ()), 7);
    }

    #[test]
    fn test_unary_callable() {
        let mut f = |x: i32| x + 5;
        assert_eq!(call_through::<fn(i32) -> i32, _>(&mut f, (10,)), 15);
    }

    #[test]
    fn test_function_item_is_callable() {
        fn double(x: u64) -> u64 {
            x * 2
        }
        assert_eq!(call_through::<fn(u64) -> u64, _>(&mut { double }, (21,)), 42);
    }

    #[test]
    fn test_stateful_callable() {
        let mut total = 0_i64;
        let mut accumulate = move |x: i64| {
            total += x;
            total
        };
        assert_eq!(call_through::<fn(i64) -> i64, _>(&mut accumulate, (2,)), 2);
        assert_eq!(call_through::<fn(i64) -> i64, _>(&mut accumulate, (3,)), 5);
    }

    #[test]
    fn test_move_only_argument() {
        use alloc::{boxed::Box, string::String};

        let mut f = |s: Box<String>| s.len();
        let arg = Box::new(String::from("move-only"));
        assert_eq!(call_through::<fn(Box<String>) -> usize, _>(&mut f, (arg,)), 9);
    }

    #[test]
    fn test_high_arity_callable() {
        let mut f = |a: u8, b: u8, c: u8, d: u8, e: u8, g: u8, h: u8, i: u8| {
            u32::from(a) + u32::from(b) + u32::from(c) + u32::from(d)
                + u32::from(e) + u32::from(g) + u32::from(h) + u32::from(i)
        };
        let args = (1, 2, 3, 4, 5, 6, 7, 8);
        type S = fn(u8, u8, u8, u8, u8, u8, u8, u8) -> u32;
        assert_eq!(call_through::<S, _>(&mut f, args), 36);
    }
}
