//! Derive macros for the `asm_unit` crate.
//!
//! Provides `#[derive(Error)]`, which turns an `#[error("...")]` message on
//! every variant (or on a struct) into `Display` and `std::error::Error` impls.

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `std::error::Error` from `#[error("...")]` messages.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
