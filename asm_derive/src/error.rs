//! `#[derive(Error)]` expansion.
//!
//! ```ignore
//! use asm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum BuildError {
//!     #[error("unknown register {name}")]
//!     UnknownRegister { name: String },
//!
//!     #[error("label {0} declared twice")]
//!     DuplicateLabel(String),
//!
//!     #[error("no registers declared")]
//!     NoRegisters,
//! }
//! ```
//!
//! Messages are ordinary `format!` strings. Named fields are referenced by
//! name, tuple fields by position (`{0}`, `{1}`, ...).

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

pub(crate) fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let message = message(&variant.attrs, variant)?;
                    let ident = &variant.ident;
                    let (pattern, args) = bind_fields(&variant.fields, &message);
                    Ok(quote! { Self::#ident #pattern => write!(f, #args), })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, name)?;
            let (pattern, args) = bind_fields(&data.fields, &message);
            quote! {
                let Self #pattern = self;
                write!(f, #args)
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                name,
                "#[derive(Error)] supports enums and structs, not unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Reads the message from the single `#[error("...")]` attribute.
fn message<T: ToTokens>(attrs: &[Attribute], owner: &T) -> syn::Result<LitStr> {
    let mut found = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("error")) {
        if found.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[error] attribute"));
        }
        found = Some(attr.parse_args::<LitStr>().map_err(|_| {
            syn::Error::new_spanned(
                attr,
                "expected a string literal, e.g. #[error(\"unknown register {name}\")]",
            )
        })?);
    }
    found.ok_or_else(|| {
        syn::Error::new_spanned(owner, "missing #[error(\"...\")] message")
    })
}

/// Builds the destructuring pattern for `fields` and the `write!` arguments
/// that feed each bound field to the message.
fn bind_fields(fields: &Fields, message: &LitStr) -> (TokenStream2, TokenStream2) {
    match fields {
        Fields::Unit => (quote! {}, quote! { #message }),
        Fields::Named(named) => {
            let idents: Vec<_> = named.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            let text = message.value();
            let used: Vec<_> = idents
                .iter()
                .filter(|ident| references(&text, &ident.to_string()))
                .collect();
            (
                quote! { { #(#idents),* } },
                quote! { #message, #(#used = #used),* },
            )
        }
        Fields::Unnamed(unnamed) => {
            let idents: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("_{}", i))
                .collect();
            let text = positional_to_named(&message.value(), idents.len());
            let used: Vec<_> = idents
                .iter()
                .filter(|ident| references(&text, &ident.to_string()))
                .collect();
            let rewritten = LitStr::new(&text, message.span());
            (
                quote! { ( #(#idents),* ) },
                quote! { #rewritten, #(#used = #used),* },
            )
        }
    }
}

/// Whether `message` interpolates `name`, with or without a format spec.
/// Unused named arguments are rejected by `format_args!`.
fn references(message: &str, name: &str) -> bool {
    message.contains(&format!("{{{name}}}")) || message.contains(&format!("{{{name}:"))
}

/// Rewrites `{0}`/`{0:?}` style references to the `{_0}` names bound by the pattern.
fn positional_to_named(message: &str, count: usize) -> String {
    let mut out = message.to_string();
    for i in (0..count).rev() {
        out = out
            .replace(&format!("{{{i}}}"), &format!("{{_{i}}}"))
            .replace(&format!("{{{i}:"), &format!("{{_{i}:"));
    }
    out
}
