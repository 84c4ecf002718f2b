//! Annotation lookup in Rust source text.
//!
//! # Responsibilities
//! - Find a method by (type, method) inside the `impl` blocks of a file
//! - Hand its `///` documentation to the DSL parser
//! - List every annotated method of a file for tooling
//!
//! # Design Decisions
//! - Value and reference self types (`impl User`, `impl<'a> &'a User`) both match
//! - Generic arguments are ignored when matching the type name
//! - Inline `mod { .. }` blocks are searched too

use serde::Serialize;
use syn::{Attribute, Expr, ExprLit, ImplItem, Item, Lit, Meta, Type};

use super::{parse_doc, Annotation, AnnotationError};

/// One annotated method found by [`scan`].
#[derive(Debug, Clone, Serialize)]
pub struct ScannedMethod {
    pub type_name: String,
    pub method: String,
    pub annotations: Vec<Annotation>,
}

/// Returns the annotations attached to `type_name::method` in `source`.
pub fn locate(
    source: &str,
    type_name: &str,
    method: &str,
) -> Result<Vec<Annotation>, AnnotationError> {
    let file = syn::parse_file(source).map_err(|e| AnnotationError::Source(e.to_string()))?;

    let mut found = None;
    visit_methods(&file.items, &mut |ty, name, attrs| {
        if found.is_none() && ty == type_name && name == method {
            found = Some(doc_text(attrs));
        }
    });

    match found {
        Some(doc) => parse_doc(&doc),
        None => Err(AnnotationError::NotFound {
            type_name: type_name.to_string(),
            method: method.to_string(),
        }),
    }
}

/// Lists every method in `source` that carries at least one annotation.
pub fn scan(source: &str) -> Result<Vec<ScannedMethod>, AnnotationError> {
    let file = syn::parse_file(source).map_err(|e| AnnotationError::Source(e.to_string()))?;

    let mut methods = Vec::new();
    visit_methods(&file.items, &mut |ty, name, attrs| {
        if let Ok(annotations) = parse_doc(&doc_text(attrs)) {
            methods.push(ScannedMethod {
                type_name: ty.to_string(),
                method: name.to_string(),
                annotations,
            });
        }
    });
    Ok(methods)
}

fn visit_methods<F>(items: &[Item], visit: &mut F)
where
    F: FnMut(&str, &str, &[Attribute]),
{
    for item in items {
        match item {
            Item::Impl(block) => {
                let Some(ty) = type_ident(&block.self_ty) else {
                    continue;
                };
                for impl_item in &block.items {
                    if let ImplItem::Fn(method) = impl_item {
                        visit(&ty, &method.sig.ident.to_string(), &method.attrs);
                    }
                }
            }
            Item::Mod(module) => {
                if let Some((_, nested)) = &module.content {
                    visit_methods(nested, visit);
                }
            }
            _ => {}
        }
    }
}

fn type_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(reference) => type_ident(&reference.elem),
        Type::Paren(paren) => type_ident(&paren.elem),
        Type::Group(group) => type_ident(&group.elem),
        _ => None,
    }
}

/// Doc attribute text, one line per `///` line with the conventional leading space removed.
pub(crate) fn doc_text(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("doc")) {
        if let Meta::NameValue(meta) = &attr.meta {
            if let Expr::Lit(ExprLit { lit: Lit::Str(text), .. }) = &meta.value {
                let value = text.value();
                lines.extend(value.lines().map(|l| l.strip_prefix(' ').unwrap_or(l).to_string()));
            }
        }
    }
    lines.join("\n")
}
