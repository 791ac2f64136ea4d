//! Derive macros for the rxmvi framework
//!
//! This crate provides procedural macros to reduce boilerplate when declaring
//! action enums.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Implements `rxmvi_core::Action` and intent/effect helpers
//!
//! # Example
//!
//! ```ignore
//! use rxmvi_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum PostsAction {
//!     #[intent]
//!     Load,
//!
//!     #[effect]
//!     Loading,
//!
//!     #[effect]
//!     Loaded(Vec<Post>),
//! }
//!
//! // Generated methods:
//! assert!(PostsAction::Load.is_intent());
//! assert!(PostsAction::Loading.is_effect());
//! assert_eq!(PostsAction::Loaded(vec![]).describe(), "Loaded");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, parse_macro_input};

/// Derive macro for Action enums
///
/// Generates:
/// - `impl rxmvi_core::Action` whose `describe()` returns the variant name
/// - `is_intent()` - Returns true if this variant is marked `#[intent]`
/// - `is_effect()` - Returns true if this variant is marked `#[effect]`
///
/// # Attributes
///
/// - `#[intent]` - Mark a variant as a user intent
/// - `#[effect]` - Mark a variant as the outcome of a side effect
///
/// Unmarked variants are neither.
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant has both `#[intent]` and `#[effect]` attributes
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum CounterAction {
///     #[intent]
///     Increment(i64),
///
///     #[effect]
///     Calculating,
///
///     #[effect]
///     IncrementSuccess(i64),
/// }
///
/// let action = CounterAction::IncrementSuccess(1);
/// assert!(action.is_effect());
/// assert_eq!(action.describe(), "IncrementSuccess");
/// ```
#[proc_macro_derive(Action, attributes(intent, effect))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut describe_arms = Vec::new();
    let mut intent_arms = Vec::new();
    let mut effect_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_intent = has_attribute(&variant.attrs, "intent");
        let is_effect = has_attribute(&variant.attrs, "effect");

        if is_intent && is_effect {
            return syn::Error::new_spanned(
                variant,
                "Variant cannot be both #[intent] and #[effect]",
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(&variant.ident, &variant.fields);
        let tag = variant.ident.to_string();

        describe_arms.push(quote! { #pattern => #tag, });

        if is_intent {
            intent_arms.push(quote! { #pattern => true, });
        }

        if is_effect {
            effect_arms.push(quote! { #pattern => true, });
        }
    }

    // An enum without variants has no value to describe
    let describe_body = if describe_arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! {
            match self {
                #(#describe_arms)*
            }
        }
    };

    let expanded = quote! {
        impl #impl_generics ::rxmvi_core::action::Action for #name #type_generics #where_clause {
            fn describe(&self) -> &'static str {
                #describe_body
            }
        }

        impl #impl_generics #name #type_generics #where_clause {
            /// Returns true if this action is a user intent
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_intent(&self) -> bool {
                match self {
                    #(#intent_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is the outcome of a side effect
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_effect(&self) -> bool {
                match self {
                    #(#effect_arms)*
                    _ => false,
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Pattern matching any value of a variant, whatever its fields
fn variant_pattern(variant: &Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(_) => quote! { Self::#variant { .. } },
        Fields::Unnamed(_) => quote! { Self::#variant(..) },
        Fields::Unit => quote! { Self::#variant },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
