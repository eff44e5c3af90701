//! Mapping profiles: user-declared hooks, ignore rules and collection
//! converters.
//!
//! Hosts hand the engine typed [`ProfileDeclaration`]s. The [`Registry`]
//! resolves includes, decides the processing order and merges every profile
//! into lookup tables keyed by [`MappingPair`](crate::MappingPair) or by
//! collection definition.

mod declaration;
pub use declaration::{
    CollectionMethodDecl, GenericShape, HookDecl, IgnoreDecl, IncludeRef, ProfileDeclaration,
    ProfileId, ProfileItem,
};

mod order;

mod registry;
pub use registry::{MappingProfileItem, Registry};

/// The hooks a profile can attach to a mapping pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Creates the target instance before members are copied
    Prepare,

    /// Replaces the whole mapping
    TypeMapping,

    /// Adjusts the target after members are copied
    PostMapping,
}

impl HookKind {
    pub fn name(self) -> &'static str {
        match self {
            HookKind::Prepare => "prepare",
            HookKind::TypeMapping => "type-mapping",
            HookKind::PostMapping => "post-mapping",
        }
    }
}
