use super::{util, Emit};

use objmap_core::catalog::{ConversionClass, SpecialType, TypeKind, WellKnown};
use objmap_core::invoke::InvokeKind;
use objmap_core::{bail, Conversion, MethodInvokeDescriptor, Result, TypeId};
use proc_macro2::TokenStream;
use quote::quote;

impl Emit<'_> {
    /// Renders `conversion` applied to `expr`, a place of type `from`. The
    /// result is an owned value of type `to`.
    pub(super) fn convert(
        &self,
        conversion: &Conversion,
        from: TypeId,
        to: TypeId,
        expr: TokenStream,
    ) -> Result<TokenStream> {
        match conversion {
            Conversion::Impossible => bail!(
                "no conversion from {} to {}",
                self.catalog.type_name(from),
                self.catalog.type_name(to)
            ),
            Conversion::Identity => Ok(self.owned(from, expr)),
            Conversion::Implicit => Ok(self.value(from, to, expr)),
            Conversion::Invoke(invoke) => self.invoke(invoke, from, expr),
        }
    }

    fn invoke(&self, invoke: &MethodInvokeDescriptor, from: TypeId, expr: TokenStream) -> Result<TokenStream> {
        Ok(match &invoke.kind {
            InvokeKind::Cast { to } => self.value(from, *to, expr),
            InvokeKind::Stringify => quote!(::std::string::ToString::to_string(&#expr)),
            InvokeKind::GeneratedMap { from, to } => {
                let map = util::map_fn(self.types, *from, *to, true);
                quote!(#map(&#expr))
            }
            InvokeKind::Hook(_) => {
                let path = util::invoke_path(invoke)?;
                quote!(#path(&#expr))
            }
            InvokeKind::Collection(collection) => {
                let element = self.convert(
                    &collection.element,
                    collection.source_element,
                    collection.target_element,
                    quote!((*item)),
                )?;
                let materialize = util::invoke_path(&collection.materializer)?;

                // `&Box<[T]>` is not iterable, the slice behind it is
                let items = match self.catalog.describe(from)?.kind {
                    TypeKind::Array(_) => quote!(&*#expr),
                    _ => quote!(&#expr),
                };

                quote! {
                    #materialize(::core::iter::IntoIterator::into_iter(#items).map(|item| #element))
                }
            }
            InvokeKind::CollectionConverter { .. } | InvokeKind::ArrayMaterialize => {
                bail!("`{}` needs an element mapping", invoke.qualified_name())
            }
        })
    }

    /// Converts a place of type `from` into an owned `to` the way the
    /// language allows: `as` between primitives, `Into` where a conversion is
    /// lossless and `objmap::try_cast` otherwise.
    fn value(&self, from: TypeId, to: TypeId, expr: TokenStream) -> TokenStream {
        if from == to {
            return self.owned(from, expr);
        }

        if self.catalog.is_well_known(to, WellKnown::Object) {
            let owned = self.owned(from, expr);
            return quote!(::std::boxed::Box::new(#owned) as ::std::boxed::Box<dyn ::std::any::Any>);
        }

        match (self.kind(from), self.kind(to)) {
            (Some(TypeKind::Optional(a)), Some(TypeKind::Optional(b))) => {
                let owned = self.owned(from, expr);
                let inner = self.value(a, b, quote!(value));
                return quote!(#owned.map(|value| #inner));
            }
            (_, Some(TypeKind::Optional(inner))) => {
                let inner = self.value(from, inner, expr);
                return quote!(::core::option::Option::Some(#inner));
            }
            _ => {}
        }

        let to_ty = self.types.render(to);
        // Every caller binds the result as a whole expression, so the cast
        // never needs parentheses
        if self.is_primitive(from) && self.is_primitive(to) {
            return quote!(#expr as #to_ty);
        }

        let owned = self.owned(from, expr);
        match self.catalog.classify_conversion(from, to) {
            ConversionClass::Implicit => quote!(::core::convert::Into::<#to_ty>::into(#owned)),
            _ => quote!(::objmap::try_cast::<_, #to_ty>(#owned)),
        }
    }

    /// An owned copy of the place `expr`.
    pub(super) fn owned(&self, ty: TypeId, expr: TokenStream) -> TokenStream {
        if self.is_copy(ty) {
            expr
        } else {
            quote!(::core::clone::Clone::clone(&#expr))
        }
    }

    fn is_copy(&self, ty: TypeId) -> bool {
        let Ok(info) = self.catalog.describe(ty) else {
            return false;
        };
        match (info.kind, info.special) {
            (TypeKind::Optional(inner), _) => self.is_copy(inner),
            (_, Some(SpecialType::Primitive(_) | SpecialType::Void)) => true,
            _ => false,
        }
    }

    fn is_primitive(&self, ty: TypeId) -> bool {
        self.catalog
            .describe(ty)
            .is_ok_and(|info| matches!(info.special, Some(SpecialType::Primitive(_))))
    }

    pub(super) fn kind(&self, ty: TypeId) -> Option<TypeKind> {
        self.catalog.describe(ty).ok().map(|info| info.kind)
    }
}
