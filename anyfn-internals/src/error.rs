//! Error type for invoking empty storage.

use core::fmt;

/// The error returned when invoking a container that holds no callable.
///
/// This is the only error the container itself ever produces. Errors raised
/// by the contained callable are part of its own return type and pass
/// through the container unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadFunctionCall;

impl fmt::Display for BadFunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bad function call")
    }
}

impl core::error::Error for BadFunctionCall {}
