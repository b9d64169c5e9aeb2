#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A type-erased callable container with inline storage for small callables.
//!
//! ## Overview
//!
//! [`Function<S>`] holds any callable (a closure, a function item, a
//! function pointer) whose parameter list and result type match the
//! signature `S`, and invokes it uniformly without knowing the concrete type
//! it was built from. Callables no larger than one machine word are stored
//! directly inside the container; everything else goes behind a single heap
//! allocation. Either way the container itself is always exactly two words.
//!
//! Unlike `Box<dyn FnMut(...)>`, a [`Function`] has value semantics: it can
//! be cloned (deep-copying the callable, which is never shared), it can be
//! empty, and the concrete callable can be recovered by exact type.
//!
//! ## Quick Example
//!
//! ```
//! use anyfn::Function;
//!
//! let mut add: Function<fn(i32, i32) -> i32> = Function::new(|a: i32, b: i32| a + b);
//!
//! // Arguments travel as a tuple; the result comes back as `Ok`.
//! assert_eq!(add.call((1, 2)), Ok(3));
//!
//! // An empty container reports a catchable error instead.
//! let mut empty = Function::<fn(i32, i32) -> i32>::empty();
//! assert!(empty.call((1, 2)).is_err());
//! ```
//!
//! ## Core Concepts
//!
//! A **signature** is written as an ordinary function-pointer type such as
//! `fn(String) -> usize`. Containers of different signatures are unrelated
//! types, and a container only accepts callables matching its signature; the
//! [`Signature`] and [`Callable`] traits express both sides of that
//! contract. Argument and result types must be `'static` and arrivals are by
//! value, so move-only argument types work naturally.
//!
//! A container is **empty** or holds exactly one callable. Invoking an empty
//! container returns [`BadFunctionCall`] rather than panicking; errors the
//! callable itself produces are part of its own result type and pass through
//! unchanged.
//!
//! The concrete type can be recovered with [`Function::downcast_ref`],
//! [`Function::downcast_mut`], or [`Function::into_callable`], which succeed
//! only for exactly the type most recently stored.
//!
//! For implementation details, see the [`anyfn-internals`] crate.
//!
//! [`anyfn-internals`]: anyfn_internals

mod function;

pub use anyfn_internals::{
    BadFunctionCall,
    signature::{Callable, Signature},
};
pub use function::Function;
