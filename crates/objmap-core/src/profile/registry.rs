use super::{order, HookKind, ProfileDeclaration, ProfileId, ProfileItem};
use crate::catalog::{TypeCatalog, TypeId};
use crate::descriptor::MappingPair;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, RequestSite};
use crate::invoke::MethodInvokeDescriptor;
use crate::{CancellationToken, Result};

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The hooks registered for one mapping pair.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingProfileItem {
    pub prepare: Option<MethodInvokeDescriptor>,
    pub type_mapping: Option<MethodInvokeDescriptor>,
    pub post_mapping: Option<MethodInvokeDescriptor>,
}

impl MappingProfileItem {
    pub fn has_profile(&self) -> bool {
        self.prepare.is_some() || self.type_mapping.is_some() || self.post_mapping.is_some()
    }

    pub fn get(&self, kind: HookKind) -> Option<&MethodInvokeDescriptor> {
        self.slot(kind).as_ref()
    }

    fn slot(&self, kind: HookKind) -> &Option<MethodInvokeDescriptor> {
        match kind {
            HookKind::Prepare => &self.prepare,
            HookKind::TypeMapping => &self.type_mapping,
            HookKind::PostMapping => &self.post_mapping,
        }
    }

    fn slot_mut(&mut self, kind: HookKind) -> &mut Option<MethodInvokeDescriptor> {
        match kind {
            HookKind::Prepare => &mut self.prepare,
            HookKind::TypeMapping => &mut self.type_mapping,
            HookKind::PostMapping => &mut self.post_mapping,
        }
    }
}

/// Merged view of every profile taking part in a pass.
///
/// Hooks and the predefined profile's collection converters are
/// insert-if-absent: the first writer for a key wins. Profiles are loaded most
/// specific first, so a base profile never overrides an including profile's
/// hooks. Collection converters from user profiles are last-write-wins and
/// every replacement is reported.
#[derive(Debug, Default)]
pub struct Registry {
    hooks: RwLock<HashMap<MappingPair, MappingProfileItem>>,
    collections: RwLock<HashMap<TypeId, MethodInvokeDescriptor>>,
    ignored: RwLock<HashMap<TypeId, IndexSet<String>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Resolves includes and registers every profile in processing order.
    ///
    /// Returns the order the profiles were processed in.
    pub fn load(
        &self,
        declarations: &[ProfileDeclaration],
        catalog: &dyn TypeCatalog,
        diagnostics: &Diagnostics,
        cancel: &CancellationToken,
    ) -> Result<Vec<ProfileId>> {
        let by_id: HashMap<ProfileId, &ProfileDeclaration> =
            declarations.iter().map(|decl| (decl.id, decl)).collect();

        let order = order::processing_order(declarations, diagnostics);

        for id in &order {
            cancel.check()?;

            let Some(decl) = by_id.get(id) else {
                continue;
            };

            if let Err(err) = self.register_profile(decl, catalog, diagnostics) {
                if err.is_cancelled() {
                    return Err(err);
                }
                tracing::warn!(profile = %decl.path, error = %err, "profile registration failed");
                diagnostics.report(
                    Diagnostic::new(DiagnosticCode::UnexpectedException, [err.to_string()])
                        .with_sites(decl.site.as_slice()),
                );
            }
        }

        Ok(order)
    }

    fn register_profile(
        &self,
        decl: &ProfileDeclaration,
        catalog: &dyn TypeCatalog,
        diagnostics: &Diagnostics,
    ) -> Result<()> {
        if !decl.extensible && !decl.predefined {
            diagnostics.report(
                Diagnostic::new(DiagnosticCode::ProfileNotExtensible, [decl.path.as_str()])
                    .with_sites(decl.site.as_slice()),
            );
            return Ok(());
        }

        tracing::debug!(profile = %decl.path, items = decl.items.len(), "registering profile");

        let mut collections: IndexMap<TypeId, (MethodInvokeDescriptor, Option<RequestSite>)> =
            IndexMap::new();

        for item in &decl.items {
            match item {
                ProfileItem::Prepare(hook)
                | ProfileItem::TypeMapping(hook)
                | ProfileItem::PostMapping(hook) => {
                    let Some((kind, _)) = item.as_hook() else {
                        continue;
                    };
                    catalog.describe(hook.pair.from)?;
                    catalog.describe(hook.pair.to)?;

                    let invoke = MethodInvokeDescriptor::hook(&decl.path, &hook.method, kind)
                        .with_consumed(hook.consumed.clone());
                    self.register_hook(hook.pair, kind, invoke);
                }
                ProfileItem::IgnoreMembers(ignore) => {
                    catalog.describe(ignore.target)?;
                    self.ignore(ignore.target, ignore.members.iter().cloned());
                }
                ProfileItem::CollectionMapping(method) => {
                    let Some(definition) =
                        method.target_definition(|def| catalog.is_sequence_definition(def))
                    else {
                        diagnostics.report(
                            Diagnostic::new(
                                DiagnosticCode::CollectionMappingMethodDefineError,
                                [format!("{}::{}", decl.path, method.method)],
                            )
                            .with_sites(method.site.as_slice()),
                        );
                        continue;
                    };

                    let invoke = MethodInvokeDescriptor::collection_converter(
                        &decl.path,
                        &method.method,
                        definition,
                    );

                    if collections.insert(definition, (invoke, method.site.clone())).is_some() {
                        diagnostics.report(
                            Diagnostic::new(
                                DiagnosticCode::DuplicateDefinitionCollectionMappingMethod,
                                [catalog.type_name(definition), decl.path.clone()],
                            )
                            .with_sites(method.site.as_slice()),
                        );
                    }
                }
            }
        }

        for (definition, (invoke, site)) in collections {
            // The predefined profile only fills definitions no user profile covers
            if decl.predefined {
                self.register_collection(definition, invoke);
                continue;
            }

            if let Some(previous) = self.replace_collection(definition, invoke) {
                tracing::debug!(
                    definition = %catalog.type_name(definition),
                    replaced = ?previous.owner,
                    profile = %decl.path,
                    "collection converter replaced"
                );
                diagnostics.report(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateDefinitionCollectionMappingMethod,
                        [catalog.type_name(definition), decl.path.clone()],
                    )
                    .with_sites(site.as_slice()),
                );
            }
        }

        Ok(())
    }

    /// Stores a hook unless one of the same kind is already registered for
    /// the pair. Returns `true` when stored.
    pub fn register_hook(&self, pair: MappingPair, kind: HookKind, invoke: MethodInvokeDescriptor) -> bool {
        let mut hooks = write(&self.hooks);
        let slot = hooks.entry(pair).or_default().slot_mut(kind);

        if slot.is_some() {
            tracing::trace!(?pair, kind = kind.name(), "hook already registered; keeping first");
            return false;
        }

        *slot = Some(invoke);
        true
    }

    /// Stores a collection converter unless the definition already has one.
    pub fn register_collection(&self, definition: TypeId, invoke: MethodInvokeDescriptor) -> bool {
        let mut collections = write(&self.collections);
        if collections.contains_key(&definition) {
            return false;
        }
        collections.insert(definition, invoke);
        true
    }

    /// Stores a collection converter, returning the one it replaced.
    pub fn replace_collection(
        &self,
        definition: TypeId,
        invoke: MethodInvokeDescriptor,
    ) -> Option<MethodInvokeDescriptor> {
        write(&self.collections).insert(definition, invoke)
    }

    pub fn ignore(&self, ty: TypeId, members: impl IntoIterator<Item = String>) {
        write(&self.ignored).entry(ty).or_default().extend(members);
    }

    pub fn hooks(&self, pair: MappingPair) -> Option<MappingProfileItem> {
        read(&self.hooks).get(&pair).cloned()
    }

    pub fn hook(&self, pair: MappingPair, kind: HookKind) -> Option<MethodInvokeDescriptor> {
        read(&self.hooks)
            .get(&pair)
            .and_then(|item| item.get(kind))
            .cloned()
    }

    pub fn collection_converter(&self, definition: TypeId) -> Option<MethodInvokeDescriptor> {
        read(&self.collections).get(&definition).cloned()
    }

    pub fn ignored_members(&self, ty: TypeId) -> IndexSet<String> {
        read(&self.ignored).get(&ty).cloned().unwrap_or_default()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
