use super::attr::{self, FieldAttr, ProfileAttr};
use super::ErrorSet;

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;

/// Everything the generator reads out of one source file.
#[derive(Debug, Default)]
pub(crate) struct Items {
    /// Structs with named fields (or none), keyed by name
    pub(crate) structs: IndexMap<String, StructDef>,

    /// Enums, unions and tuple structs. Their values are copied as a whole.
    pub(crate) opaque: Vec<String>,

    /// Associated functions of inherent impls, keyed by self type name
    pub(crate) methods: HashMap<String, Vec<syn::ImplItemFn>>,

    /// Types with an `impl Default`
    pub(crate) default_impls: HashSet<String>,

    /// Types with an `impl IntoIterator for &Type<T>`
    pub(crate) iterable: HashSet<String>,

    pub(crate) conversions: Vec<ConversionImpl>,
}

#[derive(Debug)]
pub(crate) struct StructDef {
    pub(crate) ident: syn::Ident,

    /// Names of the struct's type parameters
    pub(crate) params: Vec<String>,

    pub(crate) fields: Vec<FieldDef>,

    /// `#[derive(Default)]` is present
    pub(crate) derives_default: bool,

    /// Set when the struct is a mapping profile
    pub(crate) profile: Option<ProfileAttr>,
}

#[derive(Debug)]
pub(crate) struct FieldDef {
    /// Field name without any `r#` prefix
    pub(crate) name: String,

    pub(crate) ty: syn::Type,

    /// Declared `pub`
    pub(crate) public: bool,

    pub(crate) attr: FieldAttr,
}

/// An `impl From<A> for B` or `impl TryFrom<A> for B`.
#[derive(Debug)]
pub(crate) struct ConversionImpl {
    pub(crate) from: syn::Type,
    pub(crate) to: syn::Type,

    /// Declared through `TryFrom`
    pub(crate) fallible: bool,
}

impl Items {
    pub(crate) fn from_ast(file: &syn::File) -> syn::Result<Items> {
        let mut items = Items::default();
        let mut errs = ErrorSet::new();

        items.collect(&file.items, &mut errs);

        errs.finish(items)
    }

    fn collect(&mut self, items: &[syn::Item], errs: &mut ErrorSet) {
        for item in items {
            match item {
                syn::Item::Struct(item) => match &item.fields {
                    syn::Fields::Unnamed(_) => self.opaque.push(item.ident.to_string()),
                    _ => {
                        if let Some(def) = errs.check(StructDef::from_ast(item)) {
                            self.structs.insert(def.ident.to_string(), def);
                        }
                    }
                },
                syn::Item::Enum(item) => self.opaque.push(item.ident.to_string()),
                syn::Item::Union(item) => self.opaque.push(item.ident.to_string()),
                syn::Item::Impl(item) => self.collect_impl(item),
                syn::Item::Mod(item) => {
                    if let Some((_, content)) = &item.content {
                        self.collect(content, errs);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_impl(&mut self, item: &syn::ItemImpl) {
        let (by_ref, self_ty) = match &*item.self_ty {
            syn::Type::Reference(reference) => (true, &*reference.elem),
            ty => (false, ty),
        };
        let Some(name) = path_ident(self_ty).map(ToString::to_string) else {
            return;
        };

        let Some((negative, path, _)) = &item.trait_ else {
            if !by_ref {
                let fns = item.items.iter().filter_map(|item| match item {
                    syn::ImplItem::Fn(f) => Some(f.clone()),
                    _ => None,
                });
                self.methods.entry(name).or_default().extend(fns);
            }
            return;
        };

        let Some(last) = path.segments.last() else {
            return;
        };
        if negative.is_some() {
            return;
        }

        match last.ident.to_string().as_str() {
            "Default" if !by_ref => {
                self.default_impls.insert(name);
            }
            "IntoIterator" if by_ref => {
                self.iterable.insert(name);
            }
            trait_name @ ("From" | "TryFrom") if !by_ref && item.generics.params.is_empty() => {
                if let [from] = type_args(last)[..] {
                    self.conversions.push(ConversionImpl {
                        from: from.clone(),
                        to: self_ty.clone(),
                        fallible: trait_name == "TryFrom",
                    });
                }
            }
            _ => {}
        }
    }

    pub(crate) fn profiles(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values().filter(|def| def.profile.is_some())
    }

    pub(crate) fn methods_of(&self, name: &str) -> &[syn::ImplItemFn] {
        self.methods.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn has_default(&self, def: &StructDef) -> bool {
        def.derives_default || self.default_impls.contains(&def.ident.to_string())
    }
}

impl StructDef {
    pub(crate) fn from_ast(item: &syn::ItemStruct) -> syn::Result<StructDef> {
        let mut errs = ErrorSet::new();
        let mut derives_default = false;
        let mut profile = None;

        for attr in &item.attrs {
            if attr.path().is_ident("derive") {
                let derives = errs.check(attr.parse_args_with(
                    Punctuated::<syn::Path, syn::Token![,]>::parse_terminated,
                ));
                derives_default |= derives
                    .iter()
                    .flatten()
                    .any(|path| path.segments.last().is_some_and(|s| s.ident == "Default"));
            } else if attr::is_marker(attr, "mapping_profile") {
                profile = errs.check(ProfileAttr::from_ast(attr));
            }
        }

        let mut fields = vec![];
        for field in &item.fields {
            let Some(ident) = &field.ident else {
                continue;
            };
            let Some(attr) = errs.check(FieldAttr::from_ast(&field.attrs)) else {
                continue;
            };

            fields.push(FieldDef {
                name: ident.unraw().to_string(),
                ty: field.ty.clone(),
                public: matches!(field.vis, syn::Visibility::Public(_)),
                attr,
            });
        }

        let def = StructDef {
            ident: item.ident.clone(),
            params: item
                .generics
                .type_params()
                .map(|param| param.ident.to_string())
                .collect(),
            fields,
            derives_default,
            profile,
        };

        errs.finish(def)
    }

    pub(crate) fn is_generic(&self) -> bool {
        !self.params.is_empty()
    }

    /// Every field is `pub`, so a struct literal can build the value.
    pub(crate) fn is_literal_constructible(&self) -> bool {
        self.fields.iter().all(|field| field.public)
    }
}

/// The last identifier of a plain path type.
pub(crate) fn path_ident(ty: &syn::Type) -> Option<&syn::Ident> {
    match ty {
        syn::Type::Path(path) if path.qself.is_none() => {
            path.path.segments.last().map(|segment| &segment.ident)
        }
        syn::Type::Paren(paren) => path_ident(&paren.elem),
        syn::Type::Group(group) => path_ident(&group.elem),
        _ => None,
    }
}

/// The type arguments of a path segment, skipping lifetimes and consts.
pub(crate) fn type_args(segment: &syn::PathSegment) -> Vec<&syn::Type> {
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return vec![];
    };

    args.args
        .iter()
        .filter_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use quote::quote;

    fn items(tokens: proc_macro2::TokenStream) -> Items {
        Items::from_ast(&syn::parse2(tokens).unwrap()).unwrap()
    }

    #[test]
    fn indexes_impls() {
        let items = items(quote! {
            #[derive(Debug, Default)]
            pub struct A { pub id: i32, secret: String }
            pub struct B { pub r#type: i32 }
            pub struct Meters(f64);
            pub enum Color { Red }
            pub struct Bag<T> { pub items: Vec<T> }

            impl B { pub fn new(r#type: i32) -> Self { B { r#type } } }
            impl From<A> for B { fn from(a: A) -> B { B { r#type: a.id } } }
            impl TryFrom<B> for A { type Error = (); fn try_from(b: B) -> Result<A, ()> { Err(()) } }
            impl<'a, T> IntoIterator for &'a Bag<T> {
                type Item = &'a T;
                type IntoIter = std::slice::Iter<'a, T>;
                fn into_iter(self) -> Self::IntoIter { self.items.iter() }
            }
        });

        assert_eq!(items.structs.keys().collect::<Vec<_>>(), ["A", "B", "Bag"]);
        assert_eq!(items.opaque, ["Meters", "Color"]);

        let a = &items.structs["A"];
        assert!(items.has_default(a));
        assert!(!a.is_literal_constructible());
        assert!(!a.fields[1].public);

        let b = &items.structs["B"];
        assert_eq!(b.fields[0].name, "type");
        assert_eq!(items.methods_of("B").len(), 1);
        assert!(items.methods_of("A").is_empty());

        assert_eq!(items.conversions.len(), 2);
        assert!(!items.conversions[0].fallible);
        assert!(items.conversions[1].fallible);

        assert!(items.iterable.contains("Bag"));
        assert_eq!(items.structs["Bag"].params, ["T"]);
    }

    #[test]
    fn nested_modules_are_flattened() {
        let items = items(quote! {
            mod inner {
                pub struct Deep { pub x: u8 }
            }
        });
        assert!(items.structs.contains_key("Deep"));
    }
}
