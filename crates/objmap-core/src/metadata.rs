use crate::catalog::{Constructor, Member, SpecialType, TypeCatalog, TypeId};
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::Result;

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Members bucketed by lowercase name, each bucket ordered by name.
pub type MemberGroup = IndexMap<String, Vec<Member>>;

/// Everything the resolver needs to know about one type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapMetaData {
    pub ty: TypeId,
    pub name: String,

    /// Public constructors, fewest parameters first
    pub constructors: Vec<Constructor>,

    /// Members with a getter
    pub readable: MemberGroup,

    /// Members assignable at any time
    pub writable: MemberGroup,

    /// Members assignable only during construction
    pub init_only: MemberGroup,

    /// Fields that cannot be assigned
    pub read_only: MemberGroup,

    /// Member names excluded by ignore hooks
    pub ignored: IndexSet<String>,

    pub nullable: bool,

    /// Set when the type cannot take part in member-wise mapping
    pub unmappable: Option<Diagnostic>,
}

impl TypeMapMetaData {
    pub(crate) fn build(
        catalog: &dyn TypeCatalog,
        ty: TypeId,
        ignored: IndexSet<String>,
    ) -> Result<TypeMapMetaData> {
        let info = catalog.describe(ty)?;

        let mut meta = TypeMapMetaData {
            ty,
            name: info.name.clone(),
            constructors: vec![],
            readable: MemberGroup::new(),
            writable: MemberGroup::new(),
            init_only: MemberGroup::new(),
            read_only: MemberGroup::new(),
            ignored,
            nullable: info.is_nullable(),
            unmappable: None,
        };

        if is_disallowed(info.special) {
            meta.unmappable = Some(Diagnostic::new(
                DiagnosticCode::AmbiguousMapType,
                [info.name.clone()],
            ));
            return Ok(meta);
        }

        meta.constructors = catalog.public_constructors(ty)?;
        meta.constructors.sort_by_key(Constructor::arity);

        for member in catalog.public_members(ty)? {
            if member.readable {
                insert(&mut meta.readable, &member);
            }

            if member.writable && member.init_only {
                insert(&mut meta.init_only, &member);
            } else if member.writable {
                insert(&mut meta.writable, &member);
            } else if member.is_field() {
                insert(&mut meta.read_only, &member);
            }
        }

        for group in [
            &mut meta.readable,
            &mut meta.writable,
            &mut meta.init_only,
            &mut meta.read_only,
        ] {
            for bucket in group.values_mut() {
                bucket.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }

        Ok(meta)
    }

    pub fn is_mappable(&self) -> bool {
        self.unmappable.is_none()
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Iterates the members of a group in bucket order.
    pub fn members(group: &MemberGroup) -> impl Iterator<Item = &Member> {
        group.values().flatten()
    }
}

fn insert(group: &mut MemberGroup, member: &Member) {
    group
        .entry(member.name.to_lowercase())
        .or_default()
        .push(member.clone());
}

/// Types that are converted as values and never mapped member-wise.
pub(crate) fn is_disallowed(special: Option<SpecialType>) -> bool {
    matches!(
        special,
        Some(
            SpecialType::Object
                | SpecialType::String
                | SpecialType::Void
                | SpecialType::Disposable
                | SpecialType::Primitive(_)
                | SpecialType::Scalar
        )
    )
}

/// Per-pass memo of [`TypeMapMetaData`].
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<TypeMapMetaData>>>,
}

impl MetadataCache {
    pub fn new() -> MetadataCache {
        MetadataCache::default()
    }

    /// Returns the cached metadata, building it on first use.
    ///
    /// Concurrent first calls may both build; the first insert wins and every
    /// caller gets the stored value.
    pub fn get_or_build(
        &self,
        ty: TypeId,
        build: impl FnOnce() -> Result<TypeMapMetaData>,
    ) -> Result<Arc<TypeMapMetaData>> {
        if let Some(meta) = self.read().get(&ty) {
            return Ok(meta.clone());
        }

        let meta = Arc::new(build()?);
        tracing::trace!(ty = ty.0, name = %meta.name, "cached type metadata");

        let mut entries = self.write();
        Ok(entries.entry(ty).or_insert(meta).clone())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Arc<TypeMapMetaData>>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TypeId, Arc<TypeMapMetaData>>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
