//! `#[controller]` attribute for annoroute.
//!
//! Placed on an inherent `impl` block, it leaves the block untouched and
//! generates an `annoroute::route::Reflect` impl that lists every
//! handler-shaped method together with its doc text:
//!
//! ```ignore
//! #[annoroute::controller]
//! impl User {
//!     /// @Get("profile")
//!     pub async fn show(&self, dispatch: &mut Dispatch) -> Outcome { .. }
//! }
//! ```
//!
//! A method is handler-shaped when it is `pub async`, takes `&self` plus a
//! single `&mut Dispatch`, and returns `Outcome`. Everything else in the
//! block is skipped, the same way the runtime reflector ignores methods
//! with a foreign signature.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Expr, ExprLit, FnArg, ImplItem, ImplItemFn, ItemImpl, Lit, Meta,
    ReturnType, Type, Visibility,
};

#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(attr, "#[controller] takes no arguments")
            .to_compile_error()
            .into();
    }

    let input = parse_macro_input!(item as ItemImpl);

    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(path, "#[controller] must be placed on an inherent impl block")
            .to_compile_error()
            .into();
    }

    let self_ty = &input.self_ty;
    let type_name = match type_ident(self_ty) {
        Some(name) => name,
        None => {
            return syn::Error::new_spanned(self_ty, "#[controller] needs a named self type")
                .to_compile_error()
                .into();
        }
    };

    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let actions = input.items.iter().filter_map(|item| match item {
        ImplItem::Fn(method) if is_handler(method) => Some(method),
        _ => None,
    });

    let defs = actions.map(|method| {
        let ident = &method.sig.ident;
        let name = ident.to_string();
        let doc = doc_text(&method.attrs);
        quote! {
            ::annoroute::route::ActionDef::<Self>::new(
                #name,
                #doc,
                |this, dispatch| ::annoroute::dispatch::boxed(this.#ident(dispatch)),
            )
        }
    });

    let expanded = quote! {
        #input

        impl #impl_generics ::annoroute::route::Reflect for #self_ty #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn actions() -> ::std::vec::Vec<::annoroute::route::ActionDef<Self>> {
                ::std::vec![#(#defs),*]
            }
        }
    };

    expanded.into()
}

/// Last path segment of the self type; references and parentheses are looked through.
fn type_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => type_ident(&reference.elem),
        Type::Paren(paren) => type_ident(&paren.elem),
        Type::Group(group) => type_ident(&group.elem),
        _ => None,
    }
}

fn is_handler(method: &ImplItemFn) -> bool {
    let sig = &method.sig;
    if !matches!(method.vis, Visibility::Public(_)) || sig.asyncness.is_none() {
        return false;
    }
    if sig.inputs.len() != 2 {
        return false;
    }

    let mut inputs = sig.inputs.iter();
    let receiver_ok = matches!(
        inputs.next(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    let dispatch_ok = match inputs.next() {
        Some(FnArg::Typed(arg)) => match arg.ty.as_ref() {
            Type::Reference(reference) => {
                reference.mutability.is_some() && last_segment_is(&reference.elem, "Dispatch")
            }
            _ => false,
        },
        _ => false,
    };
    let output_ok = match &sig.output {
        ReturnType::Type(_, ty) => last_segment_is(ty, "Outcome"),
        ReturnType::Default => false,
    };

    receiver_ok && dispatch_ok && output_ok
}

fn last_segment_is(ty: &Type, expected: &str) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident == expected)
            .unwrap_or(false),
        _ => false,
    }
}

/// Joins `#[doc = "..."]` attributes the way rustdoc renders `///` lines.
fn doc_text(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(meta) = &attr.meta {
            if let Expr::Lit(ExprLit { lit: Lit::Str(text), .. }) = &meta.value {
                let value = text.value();
                for line in value.lines() {
                    lines.push(line.strip_prefix(' ').unwrap_or(line).to_string());
                }
            }
        }
    }
    lines.join("\n")
}
