#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`anyfn`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage and unsafe
//! operations that power the [`anyfn`] callable container. It provides the
//! foundation for zero-cost type erasure through vtable-based dispatch.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`anyfn`] crate, not
//! this one.
//!
//! # Architecture
//!
//! The crate is organized around one type-erased storage hierarchy plus the
//! trait plumbing that connects closures to it:
//!
//! - **[`function`]**: Type-erased callable storage
//!   - [`RawFunction`]: Owned storage holding either an inline payload or a
//!     [`Box`]-based allocation
//!   - [`InlineBuffer`]: One machine word of raw, alignment-matched bytes
//!   - [`FunctionVtable`]: Function pointers for type-erased dispatch
//!
//! - **[`signature`]**: Trait definitions for call signatures
//!   - [`Signature`]: Maps a `fn(Args...) -> R` type to its argument tuple
//!     and result type
//!   - [`Callable`]: Connects `FnMut` closures to tuple-packed invocation
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. Once a callable of type `F` has been written into a
//! [`RawFunction`], nothing in the storage itself remembers `F`; the vtable
//! function pointers must therefore always match the concrete type the
//! buffer currently encodes.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single
//!   file
//! - **Paired construction**: the only operations that write a payload also
//!   install that payload's vtable, so the two can never drift apart
//! - **Documented vtable contracts**: Each vtable method specifies exactly
//!   when it can be safely called
//!
//! See the individual module documentation for detailed explanations of how
//! these patterns are applied.
//!
//! [`anyfn`]: https://docs.rs/anyfn/latest/anyfn/
//! [`InlineBuffer`]: function::buffer::InlineBuffer
//! [`FunctionVtable`]: function::vtable::FunctionVtable
//! [`Signature`]: signature::Signature
//! [`Callable`]: signature::Callable
//! [`Box`]: alloc::boxed::Box

extern crate alloc;

mod error;
mod function;
pub mod signature;
mod util;

pub use error::BadFunctionCall;
pub use function::RawFunction;
