//! The `#[hook]` attribute.
//!
//! ```rust,ignore
//! #[wikicore::hook("TestCanonicalRedirect", order = 10)]
//! fn keep_legacy_urls(args: &mut HookArgs<'_>) -> Result<bool, BoxError> {
//!     let title = args.get::<TitleValue>(1)?;
//!     Ok(!title.db_key().starts_with("Legacy"))
//! }
//! ```
//!
//! The function is kept as written. Next to it the macro emits a wrapper
//! converting the return value into a `HookResult`, and submits a
//! `StaticHook` pointing at that wrapper to `inventory`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, Ident, ItemFn, LitInt, LitStr, Token, parse::Parse, parse_macro_input};

/// Arguments for the `#[hook]` macro.
pub(crate) struct HookAttrArgs {
    /// Event name.
    pub event: LitStr,
    /// Sort key among static handlers of the event (lower first).
    pub order: i32,
    /// Readable handler name; defaults to the function path.
    pub name: Option<LitStr>,
    /// Version the registration was deprecated in.
    pub deprecated: Option<LitStr>,
}

impl Parse for HookAttrArgs {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let event: LitStr = input.parse().map_err(|e| {
            syn::Error::new(e.span(), "expected the event name: #[hook(\"EventName\")]")
        })?;
        if event.value().is_empty() {
            return Err(syn::Error::new(event.span(), "event name cannot be empty"));
        }

        let mut order = 0;
        let mut name = None;
        let mut deprecated = None;

        while !input.is_empty() {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }

            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "order" => {
                    let negative = input.parse::<Option<Token![-]>>()?.is_some();
                    let lit: LitInt = input.parse()?;
                    let value: i32 = lit.base10_parse()?;
                    order = if negative { -value } else { value };
                }
                "name" => name = Some(input.parse()?),
                "deprecated" => deprecated = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }
        }

        Ok(HookAttrArgs {
            event,
            order,
            name,
            deprecated,
        })
    }
}

pub(crate) fn hook_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as HookAttrArgs);
    let input = parse_macro_input!(item as ItemFn);

    if let Err(err) = check_signature(&input) {
        return err.to_compile_error().into();
    }

    let fn_name = &input.sig.ident;
    let wrapper_name = format_ident!("__wikicore_hook_{}", fn_name);
    let event = &args.event;
    let order = args.order;

    let name = match &args.name {
        Some(name) => quote! { #name },
        None => quote! { ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#fn_name)) },
    };
    let deprecated = match &args.deprecated {
        Some(version) => quote! { ::core::option::Option::Some(#version) },
        None => quote! { ::core::option::Option::None },
    };

    let expanded = quote! {
        #input

        #[doc(hidden)]
        #[allow(non_snake_case)]
        fn #wrapper_name(args: &mut ::wikicore::HookArgs<'_>) -> ::wikicore::HookResult {
            ::wikicore::IntoHookOutcome::into_hook_result(#fn_name(args))
        }

        ::wikicore::inventory::submit! {
            ::wikicore::hooks::StaticHook {
                event: #event,
                name: #name,
                handler: #wrapper_name,
                order: #order,
                deprecated_since: #deprecated,
            }
        }
    };

    TokenStream::from(expanded)
}

fn check_signature(input: &ItemFn) -> syn::Result<()> {
    let sig = &input.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "hook handlers run synchronously; remove `async`",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "hook handlers cannot be generic",
        ));
    }
    match sig.inputs.len() {
        1 => match sig.inputs.first() {
            Some(FnArg::Typed(_)) => Ok(()),
            _ => Err(syn::Error::new_spanned(
                &sig.inputs,
                "hook handlers cannot take `self`",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &sig.inputs,
            "hook handlers take one argument: fn(args: &mut HookArgs<'_>)",
        )),
    }
}
