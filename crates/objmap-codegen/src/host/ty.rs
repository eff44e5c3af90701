use super::item::{path_ident, type_args, Items, StructDef};
use super::ErrorSet;

use indexmap::{IndexMap, IndexSet};
use objmap_core::catalog::{Constructor, ConversionClass, Member, Primitive, TypeKind};
use objmap_core::{MemoryCatalog, TypeCatalog, TypeId};
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use std::collections::{HashMap, HashSet};
use syn::ext::IdentExt;

/// Standard library collections that map element-wise.
pub(crate) const STD_SEQUENCES: [&str; 6] = [
    "Vec",
    "VecDeque",
    "LinkedList",
    "HashSet",
    "BTreeSet",
    "BinaryHeap",
];

/// Constructor name for `<T as Default>::default()`.
pub(crate) const DEFAULT_CONSTRUCTOR: &str = "default";

/// Constructor name for a struct literal listing every field.
pub(crate) const STRUCT_LITERAL: &str = "{..}";

/// Generic parameter substitutions in effect while resolving a field type.
pub(crate) type Scope = HashMap<String, TypeId>;

/// The type catalog built from the input, plus how to spell each type back.
#[derive(Debug)]
pub(crate) struct TypeTable {
    catalog: MemoryCatalog,

    /// Source spelling of resolved types
    spelled: HashMap<TypeId, syn::Type>,

    user: HashMap<String, UserType>,

    std: IndexMap<&'static str, TypeId>,

    /// Generic instances whose members were already added
    populated: HashSet<TypeId>,

    /// Types declared in the input
    local: HashSet<TypeId>,

    /// `Option<S>` types expose the members of `S`
    optional_structs: IndexSet<(TypeId, TypeId)>,
}

#[derive(Debug, Copy, Clone)]
enum UserType {
    Struct(TypeId),
    Generic { definition: TypeId, params: usize },
    Opaque(TypeId),
}

impl TypeTable {
    pub(crate) fn new(items: &Items) -> syn::Result<TypeTable> {
        let mut table = TypeTable {
            catalog: MemoryCatalog::new(),
            spelled: HashMap::new(),
            user: HashMap::new(),
            std: IndexMap::new(),
            populated: HashSet::new(),
            local: HashSet::new(),
            optional_structs: IndexSet::new(),
        };

        for name in STD_SEQUENCES {
            let definition = table.catalog.define_generic(name, TypeKind::Value, true);
            table.std.insert(name, definition);
        }

        for name in &items.opaque {
            let id = table.catalog.define_scalar(name.as_str());
            table.user.insert(name.clone(), UserType::Opaque(id));
            table.local.insert(id);
        }

        for (name, def) in &items.structs {
            let user = if def.is_generic() {
                let sequence = def.params.len() == 1 && items.iterable.contains(name);
                UserType::Generic {
                    definition: table
                        .catalog
                        .define_generic(name.as_str(), TypeKind::Value, sequence),
                    params: def.params.len(),
                }
            } else {
                let id = table.catalog.define_struct(name.as_str());
                table.local.insert(id);
                UserType::Struct(id)
            };
            table.user.insert(name.clone(), user);
        }

        let mut errs = ErrorSet::new();

        for (name, def) in &items.structs {
            if def.profile.is_some() {
                continue;
            }
            if let Some(UserType::Struct(id)) = table.user.get(name).copied() {
                errs.check(table.populate(items, id, def, &Scope::new()));
            }
        }

        for conversion in &items.conversions {
            let from = errs.check(table.resolve(items, &conversion.from));
            let to = errs.check(table.resolve(items, &conversion.to));
            if let (Some(from), Some(to)) = (from, to) {
                let class = if conversion.fallible {
                    ConversionClass::Explicit
                } else {
                    ConversionClass::Implicit
                };
                table.catalog.declare_conversion(from, to, class);
            }
        }

        errs.finish(table)
    }

    pub(crate) fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    /// Resolves a type written outside any generic item.
    pub(crate) fn resolve(&mut self, items: &Items, ty: &syn::Type) -> syn::Result<TypeId> {
        self.resolve_in(items, ty, &Scope::new())
    }

    fn resolve_in(&mut self, items: &Items, ty: &syn::Type, scope: &Scope) -> syn::Result<TypeId> {
        let id = match ty {
            syn::Type::Paren(paren) => return self.resolve_in(items, &paren.elem, scope),
            syn::Type::Group(group) => return self.resolve_in(items, &group.elem, scope),
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => self.catalog.void(),
            syn::Type::Path(path) if path.qself.is_none() => {
                self.resolve_path(items, ty, &path.path, scope)?
            }
            _ => self.catalog.define_scalar(display_name(ty)),
        };

        if scope.is_empty() {
            self.spelled.entry(id).or_insert_with(|| ty.clone());
        }

        Ok(id)
    }

    fn resolve_path(
        &mut self,
        items: &Items,
        ty: &syn::Type,
        path: &syn::Path,
        scope: &Scope,
    ) -> syn::Result<TypeId> {
        let Some(segment) = path.segments.last() else {
            return Ok(self.catalog.define_scalar(display_name(ty)));
        };
        let name = segment.ident.to_string();
        let args = type_args(segment);

        if args.is_empty() {
            if path.segments.len() == 1 {
                if let Some(param) = scope.get(&name) {
                    return Ok(*param);
                }
            }
            if let Some(primitive) = Primitive::from_name(&name) {
                return Ok(self.catalog.primitive(primitive));
            }
            if name == "String" {
                return Ok(self.catalog.string());
            }
        }

        match (name.as_str(), &args[..]) {
            ("Option", [inner]) => {
                let inner = self.resolve_in(items, inner, scope)?;
                let id = self.catalog.optional(inner).map_err(|e| spanned(ty, e))?;
                if self.has_members(inner) {
                    self.optional_structs.insert((id, inner));
                }
                return Ok(id);
            }
            ("Box", [syn::Type::Slice(slice)]) => {
                let element = self.resolve_in(items, &slice.elem, scope)?;
                return self.catalog.array(element).map_err(|e| spanned(ty, e));
            }
            ("Box", [syn::Type::TraitObject(object)]) if is_any(object) => {
                return Ok(self.catalog.object());
            }
            (_, [element]) if self.std.contains_key(name.as_str()) => {
                let definition = self.std[name.as_str()];
                let element = self.resolve_in(items, element, scope)?;
                return self
                    .catalog
                    .instantiate(definition, &[element])
                    .map_err(|e| spanned(ty, e));
            }
            _ => {}
        }

        match self.user.get(&name).copied() {
            Some(UserType::Struct(id) | UserType::Opaque(id)) if args.is_empty() => Ok(id),
            Some(UserType::Generic { definition, params }) if args.len() == params => {
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.resolve_in(items, arg, scope)?);
                }

                let id = self
                    .catalog
                    .instantiate(definition, &arguments)
                    .map_err(|e| spanned(ty, e))?;
                self.local.insert(id);

                if self.populated.insert(id) && !self.catalog.is_sequence_definition(definition) {
                    if let Some(def) = items.structs.get(&name) {
                        let scope = def.params.iter().cloned().zip(arguments).collect();
                        self.populate(items, id, def, &scope)?;
                    }
                }

                Ok(id)
            }
            _ => Ok(self.catalog.define_scalar(display_name(ty))),
        }
    }

    /// Adds the `pub` fields and the constructors of `def` to `id`.
    fn populate(&mut self, items: &Items, id: TypeId, def: &StructDef, scope: &Scope) -> syn::Result<()> {
        let mut errs = ErrorSet::new();
        let mut fields = vec![];

        for field in def.fields.iter().filter(|field| field.public) {
            let Some(ty) = errs.check(self.resolve_in(items, &field.ty, scope)) else {
                continue;
            };
            fields.push(Member::parameter(&field.name, ty));

            let member = if field.attr.readonly {
                Member::field(&field.name, ty).read_only()
            } else if field.attr.init {
                Member::field(&field.name, ty).init_only()
            } else {
                Member::field(&field.name, ty)
            };
            errs.check(self.catalog.add_member(id, member).map_err(|e| spanned(&def.ident, e)));
        }

        let mut constructors = vec![];
        if items.has_default(def) {
            constructors.push(Constructor::new(DEFAULT_CONSTRUCTOR, vec![]));
        }

        for f in items.methods_of(&def.ident.to_string()) {
            if !is_constructor(f, &def.ident) {
                continue;
            }
            if let Some(constructor) = errs.check(self.constructor(items, f, scope)).flatten() {
                constructors.push(constructor);
            }
        }

        if def.is_literal_constructible() && fields.len() == def.fields.len() {
            constructors.push(Constructor::new(STRUCT_LITERAL, fields));
        }

        for constructor in constructors {
            errs.check(
                self.catalog
                    .add_constructor(id, constructor)
                    .map_err(|e| spanned(&def.ident, e)),
            );
        }

        errs.finish(())
    }

    /// Describes a constructor function; `None` when a parameter is not a
    /// plain binding.
    fn constructor(
        &mut self,
        items: &Items,
        f: &syn::ImplItemFn,
        scope: &Scope,
    ) -> syn::Result<Option<Constructor>> {
        let mut parameters = vec![];

        for input in &f.sig.inputs {
            let syn::FnArg::Typed(arg) = input else {
                return Ok(None);
            };
            let syn::Pat::Ident(pat) = &*arg.pat else {
                return Ok(None);
            };
            let ty = self.resolve_in(items, &arg.ty, scope)?;
            parameters.push(Member::parameter(pat.ident.unraw().to_string(), ty));
        }

        Ok(Some(Constructor::new(f.sig.ident.unraw().to_string(), parameters)))
    }

    /// Gives every `Option<S>` seen so far the members of `S`. Runs once,
    /// after every type has been resolved.
    pub(crate) fn finish(&mut self) -> syn::Result<()> {
        for (optional, inner) in std::mem::take(&mut self.optional_structs) {
            let members = self
                .catalog
                .public_members(inner)
                .map_err(|e| syn::Error::new(Span::call_site(), e))?;
            for member in members {
                self.catalog
                    .add_member(optional, member)
                    .map_err(|e| syn::Error::new(Span::call_site(), e))?;
            }
        }
        Ok(())
    }

    /// A collection definition by its type name.
    pub(crate) fn definition(&self, name: &str) -> Option<TypeId> {
        if let Some(definition) = self.std.get(name) {
            return Some(*definition);
        }
        match self.user.get(name)? {
            UserType::Generic { definition, .. } => Some(*definition),
            _ => None,
        }
    }

    pub(crate) fn std_definitions(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.std.values().copied()
    }

    /// Declared in the input, so the generated crate may implement foreign
    /// traits for it.
    pub(crate) fn is_local(&self, id: TypeId) -> bool {
        self.local.contains(&id)
    }

    /// Renders `id` as a type, preferring the input's own spelling.
    pub(crate) fn render(&self, id: TypeId) -> TokenStream {
        if let Some(ty) = self.spelled.get(&id) {
            return ty.to_token_stream();
        }
        if id == self.catalog.object() {
            return quote!(::std::boxed::Box<dyn ::std::any::Any>);
        }

        let Ok(info) = self.catalog.describe(id) else {
            return quote!(_);
        };

        match info.kind {
            TypeKind::Optional(inner) => {
                let inner = self.render(inner);
                return quote!(::core::option::Option<#inner>);
            }
            TypeKind::Array(element) => {
                let element = self.render(element);
                return quote!(::std::boxed::Box<[#element]>);
            }
            _ => {}
        }

        if let Some(generic) = &info.generic {
            if let Some(ident) = self.literal_ident(generic.definition) {
                let args = generic.arguments.iter().map(|arg| self.render(*arg));
                return quote!(#ident<#(#args),*>);
            }
        }

        match syn::parse_str::<syn::Type>(&info.name) {
            Ok(ty) => ty.to_token_stream(),
            Err(_) => quote!(_),
        }
    }

    /// The bare name of a struct type, without generic arguments.
    pub(crate) fn literal_ident(&self, id: TypeId) -> Option<syn::Ident> {
        let info = self.catalog.describe(id).ok()?;
        let name = match &info.generic {
            Some(generic) => self.catalog.type_name(generic.definition),
            None => info.name.clone(),
        };
        syn::parse_str(&name).ok()
    }

    fn has_members(&self, ty: TypeId) -> bool {
        self.local.contains(&ty)
            && self
                .catalog
                .describe(ty)
                .is_ok_and(|info| info.special.is_none())
    }
}

/// `pub fn name(..) -> Self` without a receiver or generics.
fn is_constructor(f: &syn::ImplItemFn, ident: &syn::Ident) -> bool {
    let syn::ReturnType::Type(_, output) = &f.sig.output else {
        return false;
    };

    matches!(f.vis, syn::Visibility::Public(_))
        && f.sig.receiver().is_none()
        && f.sig.generics.params.is_empty()
        && f.sig.asyncness.is_none()
        && path_ident(output).is_some_and(|name| name == "Self" || name == ident)
}

fn is_any(object: &syn::TypeTraitObject) -> bool {
    object.bounds.iter().any(|bound| match bound {
        syn::TypeParamBound::Trait(bound) => bound
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Any"),
        _ => false,
    })
}

fn spanned(tokens: impl ToTokens, err: objmap_core::Error) -> syn::Error {
    syn::Error::new_spanned(tokens, err)
}

/// Compact display form of a type, used as the catalog name of opaque types.
pub(crate) fn display_name(ty: &syn::Type) -> String {
    let mut name = ty.to_token_stream().to_string();
    for (from, to) in [
        (" :: ", "::"),
        (":: ", "::"),
        (" < ", "<"),
        ("< ", "<"),
        (" >", ">"),
        (" ,", ","),
        ("& ", "&"),
    ] {
        name = name.replace(from, to);
    }
    name
}
