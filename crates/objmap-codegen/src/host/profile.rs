use super::attr::HookAttr;
use super::item::{type_args, Items, StructDef};
use super::ty::{display_name, TypeTable};
use super::visit::{self, Construction};
use super::{site, ErrorSet};

use objmap_core::profile::{
    CollectionMethodDecl, GenericShape, HookDecl, IgnoreDecl, ProfileItem,
};
use objmap_core::{HookKind, MappingPair, ProfileDeclaration, ProfileId, TypeCatalog, TypeId};
use quote::ToTokens;
use std::collections::HashMap;
use syn::ext::IdentExt;

/// Path of the built-in profile's module in the runtime crate.
pub(crate) const BUILTIN_PATH: &str = "::objmap::builtin";

/// The built-in profile: materializes every standard collection with
/// `objmap::builtin::collect`.
pub(crate) fn builtin(types: &TypeTable) -> ProfileDeclaration {
    types.std_definitions().fold(
        ProfileDeclaration::predefined(ProfileId(0), BUILTIN_PATH),
        |decl, definition| decl.collection("collect", definition),
    )
}

/// Declarations of every `#[mapping_profile]` struct, in source order. Ids
/// start at 1.
pub(crate) fn declarations(items: &Items, types: &mut TypeTable) -> syn::Result<Vec<ProfileDeclaration>> {
    let ids: HashMap<String, ProfileId> = items
        .profiles()
        .enumerate()
        .map(|(index, def)| (def.ident.to_string(), ProfileId(index + 1)))
        .collect();

    let mut errs = ErrorSet::new();
    let mut declarations = vec![];

    for (index, def) in items.profiles().enumerate() {
        let mut builder = ProfileBuilder {
            items,
            types: &mut *types,
            ids: &ids,
        };
        if let Some(decl) = errs.check(builder.declaration(ProfileId(index + 1), def)) {
            declarations.push(decl);
        }
    }

    errs.finish(declarations)
}

struct ProfileBuilder<'a> {
    items: &'a Items,
    types: &'a mut TypeTable,
    ids: &'a HashMap<String, ProfileId>,
}

impl ProfileBuilder<'_> {
    fn declaration(&mut self, id: ProfileId, def: &StructDef) -> syn::Result<ProfileDeclaration> {
        let name = def.ident.to_string();
        let mut decl = ProfileDeclaration::new(id, &name).at(site(def.ident.span()));

        // Generated code cannot name a generic profile's hooks
        if def.is_generic() {
            decl = decl.not_extensible();
        }

        for path in def.profile.iter().flat_map(|attr| &attr.includes) {
            let included = path
                .segments
                .last()
                .and_then(|segment| self.ids.get(&segment.ident.to_string()));
            decl = match included {
                Some(included) => decl.include(*included),
                None => decl.include_unresolved(path.to_token_stream().to_string().replace(' ', "")),
            };
        }

        let mut errs = ErrorSet::new();
        for f in self.items.methods_of(&name) {
            let Some(hook) = errs.check(HookAttr::from_ast(&f.attrs)).flatten() else {
                continue;
            };
            if let Some(item) = errs.check(self.item(hook, f)) {
                decl = decl.item(item);
            }
        }

        tracing::debug!(profile = %name, items = decl.items.len(), "read mapping profile");

        errs.finish(decl)
    }

    fn item(&mut self, hook: HookAttr, f: &syn::ImplItemFn) -> syn::Result<ProfileItem> {
        if let Some(receiver) = f.sig.receiver() {
            return Err(syn::Error::new_spanned(
                receiver,
                format!("`#[{}]` methods are associated functions; remove `self`", hook.name()),
            ));
        }

        let method = f.sig.ident.unraw().to_string();
        let args: Vec<&syn::PatType> = f
            .sig
            .inputs
            .iter()
            .filter_map(|arg| match arg {
                syn::FnArg::Typed(arg) => Some(arg),
                syn::FnArg::Receiver(_) => None,
            })
            .collect();

        match hook {
            HookAttr::TypeMapping | HookAttr::Prepare => {
                let expected = "fn(&Source) -> Target";
                let kind = match hook {
                    HookAttr::TypeMapping => HookKind::TypeMapping,
                    _ => HookKind::Prepare,
                };
                let ([source], syn::ReturnType::Type(_, target)) = (&args[..], &f.sig.output) else {
                    return Err(signature_error(f, hook, expected));
                };

                let from = self.resolve(borrowed(&source.ty, false, hook, expected)?)?;
                let to = self.resolve(target)?;
                let consumed = match kind {
                    HookKind::Prepare => self.consumed(&f.block, to),
                    _ => vec![],
                };

                Ok(ProfileItem::hook(
                    kind,
                    HookDecl {
                        method,
                        pair: MappingPair::new(from, to),
                        consumed,
                        site: Some(site(f.sig.ident.span())),
                    },
                ))
            }
            HookAttr::PostMapping => {
                let expected = "fn(&Source, &mut Target)";
                let ([source, target], syn::ReturnType::Default) = (&args[..], &f.sig.output) else {
                    return Err(signature_error(f, hook, expected));
                };

                let from = self.resolve(borrowed(&source.ty, false, hook, expected)?)?;
                let to = self.resolve(borrowed(&target.ty, true, hook, expected)?)?;

                Ok(ProfileItem::PostMapping(HookDecl {
                    method,
                    pair: MappingPair::new(from, to),
                    consumed: vec![],
                    site: Some(site(f.sig.ident.span())),
                }))
            }
            HookAttr::IgnoreMembers => {
                let expected = "fn(&Target)";
                let [target] = &args[..] else {
                    return Err(signature_error(f, hook, expected));
                };
                let syn::Pat::Ident(param) = &*target.pat else {
                    return Err(syn::Error::new_spanned(
                        &target.pat,
                        "bind the parameter to a name; its field accesses list the ignored members",
                    ));
                };

                Ok(ProfileItem::IgnoreMembers(IgnoreDecl {
                    method,
                    target: self.resolve(borrowed(&target.ty, false, hook, expected)?)?,
                    members: visit::accessed_members(&f.block, &param.ident),
                }))
            }
            HookAttr::CollectionMapping => {
                let params: Vec<String> = f
                    .sig
                    .generics
                    .type_params()
                    .map(|param| param.ident.to_string())
                    .collect();
                let param = match &params[..] {
                    [param] => Some(param.as_str()),
                    _ => None,
                };

                let returns = match &f.sig.output {
                    syn::ReturnType::Type(_, ty) => self.shape(ty, param),
                    syn::ReturnType::Default => None,
                };

                Ok(ProfileItem::CollectionMapping(CollectionMethodDecl {
                    method,
                    type_parameters: params.len(),
                    parameters: args.iter().map(|arg| self.shape(&arg.ty, param)).collect(),
                    returns,
                    site: Some(site(f.sig.ident.span())),
                }))
            }
        }
    }

    fn resolve(&mut self, ty: &syn::Type) -> syn::Result<TypeId> {
        self.types.resolve(self.items, ty)
    }

    /// Target members a prepare hook's body sets while creating `target`.
    fn consumed(&self, block: &syn::Block, target: TypeId) -> Vec<String> {
        match visit::construction(block) {
            Some(Construction::Literal(fields)) => fields,
            Some(Construction::Call { owner, function }) => {
                let owned_by_target = match owner.as_deref() {
                    Some("Self") | None => false,
                    Some(owner) => self
                        .types
                        .literal_ident(target)
                        .is_some_and(|ident| ident == owner),
                };
                if !owned_by_target {
                    return vec![];
                }

                self.types
                    .catalog()
                    .public_constructors(target)
                    .unwrap_or_default()
                    .into_iter()
                    .find(|ctor| ctor.name == function)
                    .map(|ctor| ctor.parameters.into_iter().map(|p| p.name).collect())
                    .unwrap_or_default()
            }
            None => vec![],
        }
    }

    /// Summarizes a one-argument generic in a collection method signature.
    fn shape(&self, ty: &syn::Type, param: Option<&str>) -> Option<GenericShape> {
        match ty {
            syn::Type::Reference(reference) => self.shape(&reference.elem, param),
            syn::Type::Paren(paren) => self.shape(&paren.elem, param),
            syn::Type::ImplTrait(bounds) => bounds.bounds.iter().find_map(|bound| {
                let syn::TypeParamBound::Trait(bound) = bound else {
                    return None;
                };
                let segment = bound.path.segments.last()?;
                if segment.ident != "Iterator" && segment.ident != "IntoIterator" {
                    return None;
                }
                let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
                    return None;
                };
                args.args.iter().find_map(|arg| match arg {
                    syn::GenericArgument::AssocType(assoc) if assoc.ident == "Item" => Some(GenericShape {
                        definition: self.types.catalog().enumerable_definition(),
                        over_type_parameter: is_param(&assoc.ty, param),
                    }),
                    _ => None,
                })
            }),
            syn::Type::Path(path) if path.qself.is_none() => {
                let segment = path.path.segments.last()?;
                let [arg] = type_args(segment)[..] else {
                    return None;
                };
                Some(GenericShape {
                    definition: self.types.definition(&segment.ident.to_string())?,
                    over_type_parameter: is_param(arg, param),
                })
            }
            _ => None,
        }
    }
}

fn is_param(ty: &syn::Type, param: Option<&str>) -> bool {
    match (ty, param) {
        (syn::Type::Path(path), Some(param)) => path.qself.is_none() && path.path.is_ident(param),
        _ => false,
    }
}

/// The referenced type of `&T` (or `&mut T` when `mutable`).
fn borrowed<'t>(ty: &'t syn::Type, mutable: bool, hook: HookAttr, expected: &str) -> syn::Result<&'t syn::Type> {
    match ty {
        syn::Type::Reference(reference) if reference.mutability.is_some() == mutable => Ok(&reference.elem),
        _ => Err(syn::Error::new_spanned(
            ty,
            format!(
                "`#[{}]` expects `{}`, found `{}`",
                hook.name(),
                expected,
                display_name(ty)
            ),
        )),
    }
}

fn signature_error(f: &syn::ImplItemFn, hook: HookAttr, expected: &str) -> syn::Error {
    syn::Error::new_spanned(
        &f.sig,
        format!("`#[{}]` methods must have the signature `{}`", hook.name(), expected),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use objmap_core::profile::IncludeRef;
    use quote::quote;

    fn read(tokens: proc_macro2::TokenStream) -> syn::Result<(TypeTable, Vec<ProfileDeclaration>)> {
        let items = Items::from_ast(&syn::parse2(tokens)?)?;
        let mut types = TypeTable::new(&items)?;
        let declarations = declarations(&items, &mut types)?;
        Ok((types, declarations))
    }

    #[test]
    fn reads_hooks() {
        let (types, decls) = read(quote! {
            pub struct A { pub id: i32, pub name: String }
            pub struct B { pub id: i32, pub name: String }
            impl B { pub fn new(name: String) -> Self { todo!() } }

            #[mapping_profile(include(Base, Missing))]
            pub struct Profile;

            #[mapping_profile]
            pub struct Base;

            impl Profile {
                #[mapping_prepare]
                fn prepare(source: &A) -> B {
                    B::new(source.name.clone())
                }

                #[objmap::post_mapping]
                fn after(source: &A, target: &mut B) {}

                #[ignore_members]
                fn ignore(target: &B) {
                    let _ = target.id;
                }

                fn helper() {}
            }
        })
        .unwrap();

        assert_eq!(decls.len(), 2);
        let profile = &decls[0];
        assert_eq!(profile.id, ProfileId(1));
        assert_eq!(
            profile.includes,
            [IncludeRef::Resolved(ProfileId(2)), IncludeRef::Unresolved("Missing".into())]
        );
        assert_eq!(profile.items.len(), 3);

        let Some((HookKind::Prepare, prepare)) = profile.items[0].as_hook() else {
            panic!("expected prepare hook, got {:?}", profile.items[0]);
        };
        assert_eq!(prepare.consumed, ["name"]);
        assert_eq!(types.catalog().type_name(prepare.pair.to), "B");

        let ProfileItem::IgnoreMembers(ignore) = &profile.items[2] else {
            panic!("expected ignore item");
        };
        assert_eq!(ignore.members, ["id"]);
    }

    #[test]
    fn collection_methods() {
        let (types, decls) = read(quote! {
            pub struct Stack<T> { items: Vec<T> }

            #[mapping_profile]
            pub struct Collections;

            impl Collections {
                #[collection_mapping]
                fn stack<T>(items: impl Iterator<Item = T>) -> Stack<T> { todo!() }

                #[collection_mapping]
                fn broken<T, U>(items: Vec<T>) -> Stack<U> { todo!() }
            }
        })
        .unwrap();

        let stack = types.definition("Stack").unwrap();
        let ProfileItem::CollectionMapping(good) = &decls[0].items[0] else {
            panic!("expected collection method");
        };
        assert_eq!(good.target_definition(|_| true), Some(stack));

        let ProfileItem::CollectionMapping(bad) = &decls[0].items[1] else {
            panic!("expected collection method");
        };
        assert_eq!(bad.type_parameters, 2);
        assert_eq!(bad.target_definition(|_| true), None);
    }

    #[test]
    fn malformed_hooks_are_errors() {
        let err = read(quote! {
            pub struct A { pub id: i32 }

            #[mapping_profile]
            pub struct Profile;

            impl Profile {
                #[type_mapping]
                fn by_value(source: A) -> A { source }

                #[post_mapping]
                fn returns(source: &A, target: &mut A) -> bool { true }
            }
        })
        .unwrap_err();

        let messages: Vec<_> = err.into_iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("`#[type_mapping]` expects"));
        assert!(messages[1].contains("fn(&Source, &mut Target)"));
    }

    #[test]
    fn builtin_profile_covers_std_collections() {
        let items = Items::default();
        let types = TypeTable::new(&items).unwrap();
        let builtin = builtin(&types);
        assert!(builtin.predefined);
        assert_eq!(builtin.items.len(), 6);
    }
}
