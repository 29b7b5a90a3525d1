//! Derive macros for minioc.
//!
//! `#[derive(Injectable)]` declares a struct's designated constructor: its
//! parameters are the struct's fields, in declaration order.
//!
//! ```rust,ignore
//! #[derive(Injectable)]
//! #[injectable(implements = "dyn Realm")]
//! struct LdapRealm {
//!     locator: Arc<dyn Locator>,
//!     #[inject(default)]
//!     hits: AtomicU64,
//! }
//! ```
//!
//! Container attributes:
//! - `implements = "Type"` (repeatable): also bind the struct to that identity
//! - `crate = "path"`: path of the `minioc` crate, `::minioc` by default
//!
//! Field attributes:
//! - `inject(default)`: fill with `Default::default()` instead of resolving

use darling::ast::{Data, Fields, Style};
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{DeriveInput, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_any))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), InjectableField>,
    #[darling(multiple)]
    implements: Vec<syn::Type>,
    #[darling(rename = "crate", default)]
    krate: Option<syn::Path>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectableField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    #[darling(default)]
    default: bool,
}

#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => expand(parsed).into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(input: InjectableInput) -> TokenStream2 {
    let krate = input
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::minioc));
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match input.data {
        Data::Struct(fields) => fields,
        Data::Enum(_) => return darling::Error::unsupported_shape("enum").write_errors(),
    };

    let constructor = match constructor_closure(&fields) {
        Ok(constructor) => constructor,
        Err(err) => return err.with_span(ident).write_errors(),
    };

    let bindings = input.implements.iter().map(|service| {
        quote! {
            impl #impl_generics #krate::Implements<#service> for #ident #ty_generics #where_clause {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<#service> {
                    self
                }
            }
        }
    });

    quote! {
        impl #impl_generics #krate::Injectable for #ident #ty_generics #where_clause {
            fn constructors() -> ::std::vec::Vec<#krate::Constructor<Self>> {
                ::std::vec![#krate::Constructor::new(#constructor)]
            }
        }

        #(#bindings)*
    }
}

/// Highest constructor arity `ConstructorFn` is implemented for.
const MAX_PARAMETERS: usize = 8;

/// A closure taking the injected fields as parameters and building `Self`.
fn constructor_closure(fields: &Fields<InjectableField>) -> darling::Result<TokenStream2> {
    let mut params = Vec::new();
    let mut values = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        if field.default {
            values.push(quote!(::core::default::Default::default()));
        } else {
            let param = format_ident!("__minioc_arg{}", index);
            let ty = &field.ty;
            params.push(quote!(#param: #ty));
            values.push(quote!(#param));
        }
    }

    if params.len() > MAX_PARAMETERS {
        return Err(darling::Error::custom(format!(
            "Injectable supports at most {MAX_PARAMETERS} injected fields, found {}; \
             mark the rest #[inject(default)] or group them into a service",
            params.len()
        )));
    }

    let body = match fields.style {
        Style::Struct => {
            let names = fields.iter().map(|field| &field.ident);
            quote!(Self { #(#names: #values),* })
        }
        Style::Tuple => quote!(Self(#(#values),*)),
        Style::Unit => quote!(Self),
    };

    Ok(quote!(|#(#params),*| #body))
}
