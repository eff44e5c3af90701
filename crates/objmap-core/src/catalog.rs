//! The host-program view the engine resolves against.
//!
//! The engine never inspects host types directly. Everything it knows about a
//! type (its members, constructors, how values convert between types) comes
//! from a [`TypeCatalog`]. [`MemoryCatalog`] is a complete in-memory
//! implementation that hosts populate up front.

mod memory;
pub use memory::MemoryCatalog;

mod primitive;
pub use primitive::Primitive;

use crate::Result;

/// Opaque identity of a host type.
///
/// Two types are the same type exactly when their ids are equal; catalogs
/// intern generic instances so that structurally equal instances share an id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    /// Display name, also used in diagnostics
    pub name: String,

    pub kind: TypeKind,

    /// Set for the built-in types the engine treats specially
    pub special: Option<SpecialType>,

    /// Set when the type is an instance of a generic definition
    pub generic: Option<GenericInstance>,
}

impl TypeInfo {
    /// Reference types and optional wrappers can hold "no value".
    pub fn is_nullable(&self) -> bool {
        match self.kind {
            TypeKind::Reference | TypeKind::Interface | TypeKind::Array(_) => true,
            TypeKind::Optional(_) => true,
            TypeKind::Value => false,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A type with reference semantics; values may be absent.
    Reference,

    /// A type with value semantics; values are always present.
    Value,

    Interface,

    /// Optional wrapper around a value type.
    Optional(TypeId),

    /// Built-in array of the given element type.
    Array(TypeId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpecialType {
    /// The universal type every value converts to.
    Object,
    String,
    Void,
    /// Types owning a resource that must not be copied member-wise.
    Disposable,
    Primitive(Primitive),
    /// Host scalar value types such as durations, timestamps and ids.
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericInstance {
    pub definition: TypeId,
    pub arguments: Vec<TypeId>,
}

impl GenericInstance {
    /// Returns the single type argument of a one-parameter generic.
    pub fn single_argument(&self) -> Option<TypeId> {
        match self.arguments[..] {
            [arg] => Some(arg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
    pub kind: MemberKind,
    pub readable: bool,
    pub writable: bool,

    /// Writable only while the value is being constructed
    pub init_only: bool,
}

impl Member {
    pub fn field(name: impl Into<String>, ty: TypeId) -> Member {
        Member {
            name: name.into(),
            ty,
            kind: MemberKind::Field,
            readable: true,
            writable: true,
            init_only: false,
        }
    }

    pub fn property(name: impl Into<String>, ty: TypeId) -> Member {
        Member {
            kind: MemberKind::Property,
            ..Member::field(name, ty)
        }
    }

    pub fn parameter(name: impl Into<String>, ty: TypeId) -> Member {
        Member {
            name: name.into(),
            ty,
            kind: MemberKind::Parameter,
            readable: false,
            writable: true,
            init_only: false,
        }
    }

    pub fn read_only(mut self) -> Member {
        self.writable = false;
        self.init_only = false;
        self
    }

    pub fn write_only(mut self) -> Member {
        self.readable = false;
        self
    }

    pub fn init_only(mut self) -> Member {
        self.writable = true;
        self.init_only = true;
        self
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, MemberKind::Field)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Parameter,
}

/// A public way to create a value of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constructor {
    /// Name the host uses to invoke the constructor
    pub name: String,

    pub parameters: Vec<Member>,
}

impl Constructor {
    pub fn new(name: impl Into<String>, parameters: Vec<Member>) -> Constructor {
        Constructor {
            name: name.into(),
            parameters,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// How the host language classifies a conversion between two types.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConversionClass {
    None,
    Implicit,
    Explicit,
    /// Explicit, but extracts a value out of a wrapper and may fail at runtime.
    ExplicitUnboxing,
}

/// A type recognized as holding zero or more elements of one element type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    pub element: TypeId,

    /// The single-argument sequence interface instance the type implements
    pub interface: TypeId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WellKnown {
    Object,
    String,
}

/// Read-only access to the host's type universe.
pub trait TypeCatalog: Send + Sync {
    fn describe(&self, ty: TypeId) -> Result<&TypeInfo>;

    /// Public constructors in declaration order.
    fn public_constructors(&self, ty: TypeId) -> Result<Vec<Constructor>>;

    /// Public members including inherited ones.
    fn public_members(&self, ty: TypeId) -> Result<Vec<Member>>;

    fn classify_conversion(&self, from: TypeId, to: TypeId) -> ConversionClass;

    fn sequence_of(&self, ty: TypeId) -> Option<Sequence>;

    /// Returns `true` when instances of the generic definition are sequences.
    fn is_sequence_definition(&self, definition: TypeId) -> bool;

    fn well_known(&self, which: WellKnown) -> Option<TypeId>;

    fn type_name(&self, ty: TypeId) -> String {
        match self.describe(ty) {
            Ok(info) => info.name.clone(),
            Err(_) => format!("#{}", ty.0),
        }
    }

    fn is_well_known(&self, ty: TypeId, which: WellKnown) -> bool {
        self.well_known(which) == Some(ty)
    }
}
