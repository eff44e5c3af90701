use super::{
    Constructor, ConversionClass, GenericInstance, Member, Primitive, Sequence, SpecialType,
    TypeCatalog, TypeId, TypeInfo, TypeKind, WellKnown,
};
use crate::{Error, Result};

use std::collections::{HashMap, HashSet};

/// A type catalog populated up front by the host.
///
/// Generic instances, optional wrappers and arrays are interned, so asking for
/// `Vec<Person>` twice yields the same [`TypeId`]. Every sequence instance
/// implements the built-in `Enumerable<T>` interface, which is what
/// [`TypeCatalog::sequence_of`] reports.
#[derive(Debug, Clone)]
pub struct MemoryCatalog {
    types: Vec<TypeDef>,
    names: HashMap<String, TypeId>,
    instances: HashMap<GenericInstance, TypeId>,
    optionals: HashMap<TypeId, TypeId>,
    arrays: HashMap<TypeId, TypeId>,
    conversions: HashMap<(TypeId, TypeId), ConversionClass>,
    primitives: HashMap<Primitive, TypeId>,
    object: TypeId,
    string: TypeId,
    void: TypeId,
    enumerable: TypeId,
}

#[derive(Debug, Clone)]
struct TypeDef {
    info: TypeInfo,
    members: Vec<Member>,
    constructors: Vec<Constructor>,
    base: Option<TypeId>,
    interfaces: Vec<TypeId>,
    sequence_definition: bool,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        let mut catalog = MemoryCatalog {
            types: vec![],
            names: HashMap::new(),
            instances: HashMap::new(),
            optionals: HashMap::new(),
            arrays: HashMap::new(),
            conversions: HashMap::new(),
            primitives: HashMap::new(),
            object: TypeId(0),
            string: TypeId(0),
            void: TypeId(0),
            enumerable: TypeId(0),
        };

        catalog.object = catalog.push(
            "Box<dyn Any>",
            TypeKind::Value,
            Some(SpecialType::Object),
            None,
        );
        catalog.string = catalog.push("String", TypeKind::Value, Some(SpecialType::String), None);
        catalog.void = catalog.push("()", TypeKind::Value, Some(SpecialType::Void), None);

        for primitive in Primitive::ALL {
            let id = catalog.push(
                primitive.name(),
                TypeKind::Value,
                Some(SpecialType::Primitive(primitive)),
                None,
            );
            catalog.primitives.insert(primitive, id);
        }

        catalog.enumerable = catalog.push("Enumerable", TypeKind::Interface, None, None);
        catalog.types[catalog.enumerable.0].sequence_definition = true;

        catalog
    }

    pub fn object(&self) -> TypeId {
        self.object
    }

    pub fn string(&self) -> TypeId {
        self.string
    }

    pub fn void(&self) -> TypeId {
        self.void
    }

    pub fn primitive(&self, primitive: Primitive) -> TypeId {
        self.primitives[&primitive]
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Defines a type with value semantics. Re-defining a name returns the
    /// existing identity.
    pub fn define_struct(&mut self, name: impl Into<String>) -> TypeId {
        self.define(name.into(), TypeKind::Value, None)
    }

    /// Defines a type with reference semantics.
    pub fn define_class(&mut self, name: impl Into<String>) -> TypeId {
        self.define(name.into(), TypeKind::Reference, None)
    }

    pub fn define_interface(&mut self, name: impl Into<String>) -> TypeId {
        self.define(name.into(), TypeKind::Interface, None)
    }

    /// Defines a host scalar (durations, timestamps, ids).
    pub fn define_scalar(&mut self, name: impl Into<String>) -> TypeId {
        self.define(name.into(), TypeKind::Value, Some(SpecialType::Scalar))
    }

    /// Defines a resource-owning type.
    pub fn define_disposable(&mut self, name: impl Into<String>) -> TypeId {
        self.define(name.into(), TypeKind::Reference, Some(SpecialType::Disposable))
    }

    /// Defines a generic type definition. Instances of a `sequence`
    /// definition with one argument are sequences of that argument.
    pub fn define_generic(&mut self, name: impl Into<String>, kind: TypeKind, sequence: bool) -> TypeId {
        let id = self.define(name.into(), kind, None);
        self.types[id.0].sequence_definition = sequence;
        id
    }

    /// The built-in `Enumerable` interface definition.
    pub fn enumerable_definition(&self) -> TypeId {
        self.enumerable
    }

    pub fn enumerable(&mut self, element: TypeId) -> TypeId {
        self.intern_instance(self.enumerable, vec![element])
    }

    /// Returns the interned instance of `definition` over `arguments`.
    pub fn instantiate(&mut self, definition: TypeId, arguments: &[TypeId]) -> Result<TypeId> {
        self.def(definition)?;
        for arg in arguments {
            self.def(*arg)?;
        }
        Ok(self.intern_instance(definition, arguments.to_vec()))
    }

    pub fn optional(&mut self, inner: TypeId) -> Result<TypeId> {
        if let Some(id) = self.optionals.get(&inner) {
            return Ok(*id);
        }

        let name = format!("Option<{}>", self.def(inner)?.info.name);
        let id = self.push(name, TypeKind::Optional(inner), None, None);
        self.optionals.insert(inner, id);
        Ok(id)
    }

    pub fn array(&mut self, element: TypeId) -> Result<TypeId> {
        if let Some(id) = self.arrays.get(&element) {
            return Ok(*id);
        }

        let name = format!("[{}]", self.def(element)?.info.name);
        let id = self.push(name, TypeKind::Array(element), None, None);
        let interface = self.enumerable(element);
        self.types[id.0].interfaces.push(interface);
        self.arrays.insert(element, id);
        Ok(id)
    }

    pub fn add_member(&mut self, ty: TypeId, member: Member) -> Result<()> {
        self.def(member.ty)?;
        self.def_mut(ty)?.members.push(member);
        Ok(())
    }

    pub fn add_constructor(&mut self, ty: TypeId, constructor: Constructor) -> Result<()> {
        for param in &constructor.parameters {
            self.def(param.ty)?;
        }
        self.def_mut(ty)?.constructors.push(constructor);
        Ok(())
    }

    pub fn set_base(&mut self, ty: TypeId, base: TypeId) -> Result<()> {
        self.def(base)?;
        self.def_mut(ty)?.base = Some(base);
        Ok(())
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) -> Result<()> {
        self.def(interface)?;
        self.def_mut(ty)?.interfaces.push(interface);
        Ok(())
    }

    /// Overrides the built-in classification for one ordered pair.
    pub fn declare_conversion(&mut self, from: TypeId, to: TypeId, class: ConversionClass) {
        self.conversions.insert((from, to), class);
    }

    fn define(&mut self, name: String, kind: TypeKind, special: Option<SpecialType>) -> TypeId {
        if let Some(id) = self.names.get(&name) {
            return *id;
        }
        self.push(name, kind, special, None)
    }

    fn push(
        &mut self,
        name: impl Into<String>,
        kind: TypeKind,
        special: Option<SpecialType>,
        generic: Option<GenericInstance>,
    ) -> TypeId {
        let id = TypeId(self.types.len());
        let name = name.into();
        self.names.insert(name.clone(), id);
        self.types.push(TypeDef {
            info: TypeInfo {
                name,
                kind,
                special,
                generic,
            },
            members: vec![],
            constructors: vec![],
            base: None,
            interfaces: vec![],
            sequence_definition: false,
        });
        id
    }

    fn intern_instance(&mut self, definition: TypeId, arguments: Vec<TypeId>) -> TypeId {
        let key = GenericInstance {
            definition,
            arguments,
        };
        if let Some(id) = self.instances.get(&key) {
            return *id;
        }

        let def = &self.types[definition.0];
        let kind = def.info.kind;
        let is_sequence = def.sequence_definition;
        let args = key
            .arguments
            .iter()
            .map(|arg| self.types[arg.0].info.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let name = format!("{}<{}>", def.info.name, args);

        let id = self.push(name, kind, None, Some(key.clone()));
        self.instances.insert(key.clone(), id);

        if is_sequence && definition != self.enumerable {
            if let [element] = key.arguments[..] {
                let interface = self.enumerable(element);
                self.types[id.0].interfaces.push(interface);
            }
        }

        id
    }

    fn def(&self, ty: TypeId) -> Result<&TypeDef> {
        self.types.get(ty.0).ok_or_else(|| Error::unknown_type(ty))
    }

    fn def_mut(&mut self, ty: TypeId) -> Result<&mut TypeDef> {
        self.types.get_mut(ty.0).ok_or_else(|| Error::unknown_type(ty))
    }

    /// Base classes and implemented interfaces, transitively.
    fn supertypes(&self, ty: TypeId) -> HashSet<TypeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![ty];

        while let Some(next) = stack.pop() {
            let Some(def) = self.types.get(next.0) else {
                continue;
            };
            for parent in def.base.iter().chain(def.interfaces.iter()) {
                if seen.insert(*parent) {
                    stack.push(*parent);
                }
            }
        }

        seen
    }

    fn primitive_of(&self, ty: TypeId) -> Option<Primitive> {
        match self.types.get(ty.0)?.info.special {
            Some(SpecialType::Primitive(p)) => Some(p),
            _ => None,
        }
    }

    fn classify(&self, from: TypeId, to: TypeId) -> ConversionClass {
        if let Some(class) = self.conversions.get(&(from, to)) {
            return *class;
        }

        if from == to || to == self.object {
            return ConversionClass::Implicit;
        }

        if from == self.object {
            return ConversionClass::ExplicitUnboxing;
        }

        let (Some(from_def), Some(to_def)) = (self.types.get(from.0), self.types.get(to.0)) else {
            return ConversionClass::None;
        };

        match (from_def.info.kind, to_def.info.kind) {
            (TypeKind::Optional(a), TypeKind::Optional(b)) => {
                return match self.classify(a, b) {
                    ConversionClass::Implicit => ConversionClass::Implicit,
                    ConversionClass::None => ConversionClass::None,
                    _ => ConversionClass::Explicit,
                };
            }
            (_, TypeKind::Optional(inner)) => {
                return match self.classify(from, inner) {
                    ConversionClass::Implicit => ConversionClass::Implicit,
                    ConversionClass::None => ConversionClass::None,
                    _ => ConversionClass::Explicit,
                };
            }
            (TypeKind::Optional(inner), _) => {
                return match self.classify(inner, to) {
                    ConversionClass::None => ConversionClass::None,
                    _ => ConversionClass::ExplicitUnboxing,
                };
            }
            _ => {}
        }

        if let (Some(a), Some(b)) = (self.primitive_of(from), self.primitive_of(to)) {
            return if a.widens_to(b) {
                ConversionClass::Implicit
            } else if a.casts_to(b) {
                ConversionClass::Explicit
            } else {
                ConversionClass::None
            };
        }

        if self.supertypes(from).contains(&to) {
            ConversionClass::Implicit
        } else if self.supertypes(to).contains(&from) {
            ConversionClass::Explicit
        } else {
            ConversionClass::None
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        MemoryCatalog::new()
    }
}

impl TypeCatalog for MemoryCatalog {
    fn describe(&self, ty: TypeId) -> Result<&TypeInfo> {
        Ok(&self.def(ty)?.info)
    }

    fn public_constructors(&self, ty: TypeId) -> Result<Vec<Constructor>> {
        Ok(self.def(ty)?.constructors.clone())
    }

    fn public_members(&self, ty: TypeId) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = vec![];
        let mut next = Some(ty);

        // Derived declarations hide inherited ones of the same name
        while let Some(current) = next {
            let def = self.def(current)?;
            for member in &def.members {
                if !members.iter().any(|m| m.name == member.name) {
                    members.push(member.clone());
                }
            }
            next = def.base;
        }

        Ok(members)
    }

    fn classify_conversion(&self, from: TypeId, to: TypeId) -> ConversionClass {
        self.classify(from, to)
    }

    fn sequence_of(&self, ty: TypeId) -> Option<Sequence> {
        let def = self.types.get(ty.0)?;

        if let Some(generic) = &def.info.generic {
            if generic.definition == self.enumerable {
                return Some(Sequence {
                    element: generic.single_argument()?,
                    interface: ty,
                });
            }
        }

        let mut supertypes: Vec<_> = self.supertypes(ty).into_iter().collect();
        supertypes.sort();

        supertypes.into_iter().find_map(|parent| {
            let generic = self.types.get(parent.0)?.info.generic.as_ref()?;
            if generic.definition != self.enumerable {
                return None;
            }
            Some(Sequence {
                element: generic.single_argument()?,
                interface: parent,
            })
        })
    }

    fn is_sequence_definition(&self, definition: TypeId) -> bool {
        self.types
            .get(definition.0)
            .is_some_and(|def| def.sequence_definition)
    }

    fn well_known(&self, which: WellKnown) -> Option<TypeId> {
        Some(match which {
            WellKnown::Object => self.object,
            WellKnown::String => self.string,
        })
    }
}
