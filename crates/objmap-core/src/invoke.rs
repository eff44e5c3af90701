use crate::catalog::TypeId;
use crate::conversion::Conversion;
use crate::profile::HookKind;

/// A resolved call the emitter renders around argument expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInvokeDescriptor {
    /// Path of the item declaring the method; `None` for built-in operations
    pub owner: Option<String>,

    pub method: String,

    pub kind: InvokeKind,

    /// Target members the invocation already sets. Only prepare hooks
    /// populate this.
    pub consumed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeKind {
    /// Explicit cast to the target type
    Cast { to: TypeId },

    /// Render the value as a string
    Stringify,

    /// Call the mapping generated for another requested pair
    GeneratedMap { from: TypeId, to: TypeId },

    /// Call a user hook
    Hook(HookKind),

    /// Materialize an element sequence into an instance of the given
    /// collection definition
    CollectionConverter { definition: TypeId },

    /// Materialize an element sequence into an array
    ArrayMaterialize,

    /// Map every element, then materialize
    Collection(Box<CollectionInvoke>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInvoke {
    pub source_element: TypeId,
    pub target_element: TypeId,
    pub element: Conversion,
    pub materializer: MethodInvokeDescriptor,
}

impl MethodInvokeDescriptor {
    fn builtin(method: &str, kind: InvokeKind) -> MethodInvokeDescriptor {
        MethodInvokeDescriptor {
            owner: None,
            method: method.to_string(),
            kind,
            consumed: vec![],
        }
    }

    pub fn cast(to: TypeId) -> MethodInvokeDescriptor {
        Self::builtin("cast", InvokeKind::Cast { to })
    }

    pub fn stringify() -> MethodInvokeDescriptor {
        Self::builtin("to_string", InvokeKind::Stringify)
    }

    pub fn generated_map(from: TypeId, to: TypeId) -> MethodInvokeDescriptor {
        Self::builtin("map_to", InvokeKind::GeneratedMap { from, to })
    }

    pub fn array_materialize() -> MethodInvokeDescriptor {
        Self::builtin("collect", InvokeKind::ArrayMaterialize)
    }

    pub fn hook(owner: impl Into<String>, method: impl Into<String>, kind: HookKind) -> MethodInvokeDescriptor {
        MethodInvokeDescriptor {
            owner: Some(owner.into()),
            method: method.into(),
            kind: InvokeKind::Hook(kind),
            consumed: vec![],
        }
    }

    pub fn collection_converter(
        owner: impl Into<String>,
        method: impl Into<String>,
        definition: TypeId,
    ) -> MethodInvokeDescriptor {
        MethodInvokeDescriptor {
            owner: Some(owner.into()),
            method: method.into(),
            kind: InvokeKind::CollectionConverter { definition },
            consumed: vec![],
        }
    }

    /// Composes an element conversion with a materializer.
    pub fn collection(
        source_element: TypeId,
        target_element: TypeId,
        element: Conversion,
        materializer: MethodInvokeDescriptor,
    ) -> MethodInvokeDescriptor {
        Self::builtin(
            "map_elements",
            InvokeKind::Collection(Box::new(CollectionInvoke {
                source_element,
                target_element,
                element,
                materializer,
            })),
        )
    }

    pub fn with_consumed(mut self, consumed: Vec<String>) -> MethodInvokeDescriptor {
        self.consumed = consumed;
        self
    }

    /// `owner::method`, or just `method` for built-ins.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner, self.method),
            None => self.method.clone(),
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionInvoke> {
        match &self.kind {
            InvokeKind::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_hook(&self, kind: HookKind) -> bool {
        self.kind == InvokeKind::Hook(kind)
    }
}
