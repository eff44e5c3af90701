use super::{util, Emit};
use crate::host::{DEFAULT_CONSTRUCTOR, STRUCT_LITERAL};

use objmap_core::catalog::TypeKind;
use objmap_core::identifier::ResolvedConstructor;
use objmap_core::{bail, err, Conversion, MappingPlan, Result, Strategy, TypeId};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Items generated for one plan.
pub(super) struct Expanded {
    pub(super) functions: TokenStream,

    /// Trait impls; wrapped in an anonymous const by the caller
    pub(super) impls: TokenStream,
}

impl Emit<'_> {
    pub(super) fn plan(&self, plan: &MappingPlan) -> Result<Expanded> {
        match &plan.strategy {
            Strategy::Collection(conversion) => self.collection(plan, conversion),
            _ if plan.without_target_instance => self.map_to(plan),
            _ => self.map_onto(plan),
        }
    }

    fn map_to(&self, plan: &MappingPlan) -> Result<Expanded> {
        let vis = &self.vis;
        let name = util::map_fn(self.types, plan.source, plan.target, true);
        let source_ty = self.types.render(plan.source);
        let target_ty = self.types.render(plan.target);

        let reads = !plan.assignments.is_empty()
            || matches!(&plan.strategy, Strategy::Construct(ctor) if !ctor.arguments.is_empty());
        let (check_source, source) =
            self.null_check(plan.null_check.source, plan.source, "source", quote!(source), reads);

        let create = match &plan.strategy {
            Strategy::TypeMapping(hook) | Strategy::Prepare(hook) => {
                let hook = util::invoke_path(hook)?;
                quote!(#hook(source))
            }
            Strategy::Construct(ctor) => self.construct(plan.target, ctor, &source)?,
            _ => bail!("a {} plan cannot create its target", plan.strategy_name()),
        };

        let assignments = self.assignments(plan, &source, &format_ident!("target"))?;
        let post = match &plan.post_mapping {
            Some(hook) => {
                let hook = util::invoke_path(hook)?;
                quote!(#hook(source, &mut target);)
            }
            None => quote!(),
        };
        let mutability = (!assignments.is_empty() || plan.post_mapping.is_some()).then(|| quote!(mut));

        let functions = quote! {
            #vis fn #name(source: &#source_ty) -> #target_ty {
                #check_source
                let #mutability target: #target_ty = #create;
                #( #assignments )*
                #post
                target
            }
        };

        let impls = self.forward_impl(
            plan.source,
            plan.target,
            quote! {
                impl ::objmap::MapTo<#target_ty> for #source_ty {
                    fn map_to(&self) -> #target_ty {
                        #name(self)
                    }
                }
            },
        );

        Ok(Expanded { functions, impls })
    }

    fn map_onto(&self, plan: &MappingPlan) -> Result<Expanded> {
        let vis = &self.vis;
        let name = util::map_fn(self.types, plan.source, plan.target, false);
        let source_ty = self.types.render(plan.source);
        let target_ty = self.types.render(plan.target);

        let reads = !plan.assignments.is_empty();
        let (check_source, source) =
            self.null_check(plan.null_check.source, plan.source, "source", quote!(source), reads);

        let body = match &plan.strategy {
            Strategy::TypeMapping(hook) => {
                let hook = util::invoke_path(hook)?;
                quote!(*target = #hook(source);)
            }
            Strategy::UpdateInPlace => {
                let (check_target, target) = self.null_check(
                    plan.null_check.target,
                    plan.target,
                    "target",
                    quote!(&mut *target),
                    reads,
                );
                let assignments = self.assignments(plan, &source, &target)?;
                quote! {
                    #check_target
                    #( #assignments )*
                }
            }
            _ => bail!("a {} plan cannot update an existing target", plan.strategy_name()),
        };

        let post = match &plan.post_mapping {
            Some(hook) => {
                let hook = util::invoke_path(hook)?;
                quote!(#hook(source, target);)
            }
            None => quote!(),
        };

        let functions = quote! {
            #vis fn #name(source: &#source_ty, target: &mut #target_ty) {
                #check_source
                #body
                #post
            }
        };

        let impls = self.forward_impl(
            plan.source,
            plan.target,
            quote! {
                impl ::objmap::MapOnto<#target_ty> for #source_ty {
                    fn map_onto(&self, target: &mut #target_ty) {
                        #name(self, target)
                    }
                }
            },
        );

        Ok(Expanded { functions, impls })
    }

    /// One function per concrete source collection type.
    fn collection(&self, plan: &MappingPlan, conversion: &Conversion) -> Result<Expanded> {
        let vis = &self.vis;
        let target_ty = self.types.render(plan.target);
        let mut functions = TokenStream::new();
        let mut impls = TokenStream::new();

        for &source in &plan.source_types {
            let name = util::map_fn(self.types, source, plan.target, true);
            let source_ty = self.types.render(source);
            let value = self.convert(conversion, source, plan.target, quote!((*source)))?;

            // The hook is typed for the requested source only
            let post = match &plan.post_mapping {
                Some(hook) if source == plan.source => {
                    let hook = util::invoke_path(hook)?;
                    Some(quote!(#hook(source, &mut target);))
                }
                _ => None,
            };
            let mutability = post.is_some().then(|| quote!(mut));

            functions.extend(quote! {
                #vis fn #name(source: &#source_ty) -> #target_ty {
                    let #mutability target: #target_ty = #value;
                    #post
                    target
                }
            });

            impls.extend(self.forward_impl(
                source,
                plan.target,
                quote! {
                    impl ::objmap::MapTo<#target_ty> for #source_ty {
                        fn map_to(&self) -> #target_ty {
                            #name(self)
                        }
                    }
                },
            ));
        }

        Ok(Expanded { functions, impls })
    }

    /// Creates the target with the matched constructor.
    fn construct(&self, target: TypeId, ctor: &ResolvedConstructor, source: &syn::Ident) -> Result<TokenStream> {
        let mut args = Vec::with_capacity(ctor.arguments.len());
        for argument in &ctor.arguments {
            let read = util::member(&argument.source.name);
            args.push(self.convert(
                &argument.conversion,
                argument.source.ty,
                argument.target.ty,
                quote!(#source.#read),
            )?);
        }

        let target_ty = self.types.render(target);

        Ok(match ctor.constructor.name.as_str() {
            STRUCT_LITERAL => {
                let ident = self
                    .types
                    .literal_ident(target)
                    .ok_or_else(|| err!("{} cannot be built with a struct literal", self.catalog.type_name(target)))?;
                let fields = ctor.arguments.iter().map(|argument| util::member(&argument.target.name));
                quote!(#ident { #( #fields: #args ),* })
            }
            DEFAULT_CONSTRUCTOR if args.is_empty() => {
                quote!(<#target_ty as ::core::default::Default>::default())
            }
            name => {
                let function = util::member(name);
                quote!(<#target_ty>::#function(#( #args ),*))
            }
        })
    }

    fn assignments(&self, plan: &MappingPlan, source: &syn::Ident, target: &syn::Ident) -> Result<Vec<TokenStream>> {
        plan.assignments
            .iter()
            .map(|assignment| {
                let field = util::member(&assignment.target.name);
                let read = util::member(&assignment.source.name);
                let value = self.convert(
                    &assignment.conversion,
                    assignment.source.ty,
                    assignment.target.ty,
                    quote!(#source.#read),
                )?;
                Ok(quote!(#target.#field = #value;))
            })
            .collect()
    }

    /// Fails fast on a `None` source or target. Returns the check and the
    /// binding later code reads members through.
    fn null_check(
        &self,
        enabled: bool,
        ty: TypeId,
        name: &str,
        scrutinee: TokenStream,
        unwrap: bool,
    ) -> (TokenStream, syn::Ident) {
        let binding = format_ident!("{}", name);
        if !enabled || !matches!(self.kind(ty), Some(TypeKind::Optional(_))) {
            return (quote!(), binding);
        }

        if !unwrap {
            let check = quote! {
                if ::core::option::Option::is_none(#binding) {
                    ::objmap::argument_null(#name);
                }
            };
            return (check, binding);
        }

        let value = format_ident!("{}_value", name);
        let check = quote! {
            let ::core::option::Option::Some(#value) = #scrutinee else {
                ::objmap::argument_null(#name)
            };
        };
        (check, value)
    }

    /// Keeps a trait impl only when the orphan rules allow it.
    fn forward_impl(&self, source: TypeId, target: TypeId, tokens: TokenStream) -> TokenStream {
        if self.types.is_local(source) || self.types.is_local(target) {
            tokens
        } else {
            TokenStream::new()
        }
    }
}
