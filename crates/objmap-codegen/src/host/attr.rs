use super::ErrorSet;

use proc_macro2::TokenStream;
use syn::parse::Parser;

/// Returns `true` when the attribute's last path segment is `name`, so both
/// `#[post_mapping]` and `#[objmap::post_mapping]` match.
pub(crate) fn is_marker(attr: &syn::Attribute, name: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == name)
}

/// Access restrictions declared with `#[objmap(..)]` on a struct field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldAttr {
    /// `#[objmap(readonly)]`: the field is read but never assigned
    pub(crate) readonly: bool,

    /// `#[objmap(init)]`: the field is assigned only while constructing
    pub(crate) init: bool,
}

impl FieldAttr {
    pub(crate) fn from_ast(attrs: &[syn::Attribute]) -> syn::Result<FieldAttr> {
        let mut errs = ErrorSet::new();
        let mut result = FieldAttr::default();

        for attr in attrs {
            if !attr.path().is_ident("objmap") {
                continue;
            }

            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("readonly") {
                    result.readonly = true;
                    Ok(())
                } else if meta.path.is_ident("init") {
                    result.init = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown objmap attribute; expected `readonly` or `init`"))
                }
            });
            errs.check(parsed);

            if result.readonly && result.init {
                errs.push(syn::Error::new_spanned(
                    attr,
                    "a field cannot be both `readonly` and `init`",
                ));
                result.init = false;
            }
        }

        errs.finish(result)
    }
}

/// Arguments of `#[mapping_profile(..)]`.
#[derive(Debug, Default)]
pub(crate) struct ProfileAttr {
    /// Profiles named in `include(..)`, in declaration order
    pub(crate) includes: Vec<syn::Path>,
}

impl ProfileAttr {
    pub(crate) fn from_ast(attr: &syn::Attribute) -> syn::Result<ProfileAttr> {
        match &attr.meta {
            syn::Meta::Path(_) => Ok(ProfileAttr::default()),
            syn::Meta::List(list) => ProfileAttr::from_args(list.tokens.clone()),
            syn::Meta::NameValue(_) => Err(syn::Error::new_spanned(
                attr,
                "expected `#[mapping_profile]` or `#[mapping_profile(include(..))]`",
            )),
        }
    }

    pub(crate) fn from_args(args: TokenStream) -> syn::Result<ProfileAttr> {
        let mut includes = vec![];

        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("include") {
                let content;
                syn::parenthesized!(content in meta.input);
                let paths = content.parse_terminated(syn::Path::parse_mod_style, syn::Token![,])?;
                includes.extend(paths);
                Ok(())
            } else {
                Err(meta.error("expected `include(Profile, ..)`"))
            }
        });
        parser.parse2(args)?;

        Ok(ProfileAttr { includes })
    }
}

/// The hook attribute placed on a profile method.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum HookAttr {
    TypeMapping,
    Prepare,
    PostMapping,
    IgnoreMembers,
    CollectionMapping,
}

impl HookAttr {
    const ALL: [HookAttr; 5] = [
        HookAttr::TypeMapping,
        HookAttr::Prepare,
        HookAttr::PostMapping,
        HookAttr::IgnoreMembers,
        HookAttr::CollectionMapping,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            HookAttr::TypeMapping => "type_mapping",
            HookAttr::Prepare => "mapping_prepare",
            HookAttr::PostMapping => "post_mapping",
            HookAttr::IgnoreMembers => "ignore_members",
            HookAttr::CollectionMapping => "collection_mapping",
        }
    }

    /// Finds the hook attribute on a method, if any. A method carries at most
    /// one.
    pub(crate) fn from_ast(attrs: &[syn::Attribute]) -> syn::Result<Option<HookAttr>> {
        let mut found: Option<HookAttr> = None;

        for attr in attrs {
            let Some(hook) = HookAttr::ALL.into_iter().find(|h| is_marker(attr, h.name())) else {
                continue;
            };

            if let Some(previous) = found {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!(
                        "`#[{}]` cannot be combined with `#[{}]`",
                        hook.name(),
                        previous.name()
                    ),
                ));
            }

            if !matches!(attr.meta, syn::Meta::Path(_)) {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!("`#[{}]` takes no arguments", hook.name()),
                ));
            }

            found = Some(hook);
        }

        Ok(found)
    }
}
