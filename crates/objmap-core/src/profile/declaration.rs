use super::HookKind;
use crate::catalog::TypeId;
use crate::descriptor::MappingPair;
use crate::diagnostic::RequestSite;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(pub usize);

/// A profile as discovered in the host program, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDeclaration {
    pub id: ProfileId,

    /// Path generated code uses to call the profile's methods
    pub path: String,

    /// Generated code can extend the profile
    pub extensible: bool,

    /// The built-in profile shipped with the host integration
    pub predefined: bool,

    pub includes: Vec<IncludeRef>,

    pub items: Vec<ProfileItem>,

    pub site: Option<RequestSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeRef {
    Resolved(ProfileId),

    /// The host could not find a profile under this name
    Unresolved(String),
}

/// One declaration inside a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileItem {
    Prepare(HookDecl),
    TypeMapping(HookDecl),
    PostMapping(HookDecl),
    IgnoreMembers(IgnoreDecl),
    CollectionMapping(CollectionMethodDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDecl {
    pub method: String,
    pub pair: MappingPair,

    /// Target members the hook body already sets
    pub consumed: Vec<String>,

    pub site: Option<RequestSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreDecl {
    pub method: String,
    pub target: TypeId,

    /// Members the hook body accesses on its parameter
    pub members: Vec<String>,
}

/// Signature summary of a collection mapping method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMethodDecl {
    pub method: String,
    pub type_parameters: usize,

    /// One entry per parameter; `None` when the parameter is not a
    /// one-argument generic
    pub parameters: Vec<Option<GenericShape>>,

    pub returns: Option<GenericShape>,

    pub site: Option<RequestSite>,
}

/// A one-argument generic type appearing in a signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GenericShape {
    pub definition: TypeId,

    /// The single argument is the method's own type parameter
    pub over_type_parameter: bool,
}

impl ProfileDeclaration {
    pub fn new(id: ProfileId, path: impl Into<String>) -> ProfileDeclaration {
        ProfileDeclaration {
            id,
            path: path.into(),
            extensible: true,
            predefined: false,
            includes: vec![],
            items: vec![],
            site: None,
        }
    }

    pub fn predefined(id: ProfileId, path: impl Into<String>) -> ProfileDeclaration {
        ProfileDeclaration {
            predefined: true,
            ..ProfileDeclaration::new(id, path)
        }
    }

    pub fn include(mut self, id: ProfileId) -> ProfileDeclaration {
        self.includes.push(IncludeRef::Resolved(id));
        self
    }

    pub fn include_unresolved(mut self, name: impl Into<String>) -> ProfileDeclaration {
        self.includes.push(IncludeRef::Unresolved(name.into()));
        self
    }

    pub fn not_extensible(mut self) -> ProfileDeclaration {
        self.extensible = false;
        self
    }

    pub fn at(mut self, site: RequestSite) -> ProfileDeclaration {
        self.site = Some(site);
        self
    }

    pub fn item(mut self, item: ProfileItem) -> ProfileDeclaration {
        self.items.push(item);
        self
    }

    pub fn hook(self, kind: HookKind, method: impl Into<String>, pair: MappingPair) -> ProfileDeclaration {
        let decl = HookDecl {
            method: method.into(),
            pair,
            consumed: vec![],
            site: None,
        };
        self.item(ProfileItem::hook(kind, decl))
    }

    pub fn ignore(self, method: impl Into<String>, target: TypeId, members: &[&str]) -> ProfileDeclaration {
        self.item(ProfileItem::IgnoreMembers(IgnoreDecl {
            method: method.into(),
            target,
            members: members.iter().map(|m| m.to_string()).collect(),
        }))
    }

    /// Adds a well-formed collection mapping method for `definition`.
    pub fn collection(self, method: impl Into<String>, definition: TypeId) -> ProfileDeclaration {
        self.item(ProfileItem::CollectionMapping(CollectionMethodDecl {
            method: method.into(),
            type_parameters: 1,
            parameters: vec![Some(GenericShape {
                definition,
                over_type_parameter: true,
            })],
            returns: Some(GenericShape {
                definition,
                over_type_parameter: true,
            }),
            site: None,
        }))
    }
}

impl ProfileItem {
    pub fn hook(kind: HookKind, decl: HookDecl) -> ProfileItem {
        match kind {
            HookKind::Prepare => ProfileItem::Prepare(decl),
            HookKind::TypeMapping => ProfileItem::TypeMapping(decl),
            HookKind::PostMapping => ProfileItem::PostMapping(decl),
        }
    }

    pub fn as_hook(&self) -> Option<(HookKind, &HookDecl)> {
        match self {
            ProfileItem::Prepare(decl) => Some((HookKind::Prepare, decl)),
            ProfileItem::TypeMapping(decl) => Some((HookKind::TypeMapping, decl)),
            ProfileItem::PostMapping(decl) => Some((HookKind::PostMapping, decl)),
            _ => None,
        }
    }
}

impl CollectionMethodDecl {
    /// Returns the collection definition the method produces, or `None` when
    /// the signature is not `fn<T>(Seq<T>) -> Collection<T>`.
    pub fn target_definition(&self, is_sequence_definition: impl Fn(TypeId) -> bool) -> Option<TypeId> {
        if self.type_parameters != 1 {
            return None;
        }

        match self.parameters[..] {
            [Some(GenericShape {
                over_type_parameter: true,
                ..
            })] => {}
            _ => return None,
        }

        let returns = self.returns?;
        if returns.over_type_parameter && is_sequence_definition(returns.definition) {
            Some(returns.definition)
        } else {
            None
        }
    }
}
