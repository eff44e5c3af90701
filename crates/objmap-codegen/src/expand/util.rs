use crate::host::{TypeTable, BUILTIN_PATH};

use heck::ToSnakeCase;
use objmap_core::invoke::InvokeKind;
use objmap_core::{err, Accessibility, MethodInvokeDescriptor, Result, TypeId};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn visibility(accessibility: Accessibility) -> TokenStream {
    match accessibility {
        Accessibility::Public => quote!(pub),
        Accessibility::Internal => quote!(pub(crate)),
    }
}

/// Name of the generated function mapping `from` to `to`.
pub(super) fn map_fn(types: &TypeTable, from: TypeId, to: TypeId, without_target_instance: bool) -> syn::Ident {
    let verb = if without_target_instance { "to" } else { "onto" };
    format_ident!("map_{}_{}_{}", slug(types, from), verb, slug(types, to))
}

fn slug(types: &TypeTable, ty: TypeId) -> String {
    types.render(ty).to_string().to_snake_case()
}

/// Callable path of a hook or materializer.
pub(super) fn invoke_path(invoke: &MethodInvokeDescriptor) -> Result<syn::Path> {
    let path = match (&invoke.owner, &invoke.kind) {
        (Some(_), _) => invoke.qualified_name(),
        (None, InvokeKind::ArrayMaterialize) => format!("{}::{}", BUILTIN_PATH, invoke.method),
        (None, _) => return Err(err!("`{}` has no callable path", invoke.method)),
    };
    syn::parse_str(&path).map_err(|e| err!("invalid path `{}`: {}", path, e))
}

/// Hides trait impls in an anonymous const so they add no names to the
/// enclosing module.
pub(super) fn wrap_in_const(code: TokenStream) -> TokenStream {
    quote! {
        const _: () = {
            #code
        };
    }
}

/// Identifier for a member name, raw when the name is a keyword.
pub(super) fn member(name: &str) -> syn::Ident {
    syn::parse_str(name).unwrap_or_else(|_| syn::Ident::new_raw(name, proc_macro2::Span::call_site()))
}
