use crate::catalog::{TypeCatalog, TypeId, TypeKind};
use crate::diagnostic::RequestSite;
use crate::metadata::is_disallowed;
use crate::Result;

use indexmap::IndexMap;

/// Ordered `(from, to)` key used by the profile registry and the conversion
/// cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MappingPair {
    pub from: TypeId,
    pub to: TypeId,
}

impl MappingPair {
    pub fn new(from: TypeId, to: TypeId) -> MappingPair {
        MappingPair { from, to }
    }
}

/// A mapping the host program asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRequest {
    pub source: TypeId,
    pub target: TypeId,

    /// The caller supplies the target instance to update
    pub with_target_instance: bool,

    pub site: Option<RequestSite>,
}

impl MappingRequest {
    pub fn new(source: TypeId, target: TypeId) -> MappingRequest {
        MappingRequest {
            source,
            target,
            with_target_instance: false,
            site: None,
        }
    }

    pub fn onto(source: TypeId, target: TypeId) -> MappingRequest {
        MappingRequest {
            with_target_instance: true,
            ..MappingRequest::new(source, target)
        }
    }

    pub fn at(mut self, site: RequestSite) -> MappingRequest {
        self.site = Some(site);
        self
    }
}

/// One requested mapping unit after deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapDescriptor {
    pub source: TypeId,
    pub target: TypeId,
    pub without_target_instance: bool,

    /// Set when both sides are sequences
    pub collection: Option<CollectionShape>,

    pub sites: Vec<RequestSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionShape {
    pub source_item: TypeId,
    pub target_item: TypeId,

    /// Every concrete source collection type folded into this descriptor
    pub source_types: Vec<TypeId>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum DescriptorKey {
    Single {
        source: TypeId,
        target: TypeId,
        without_target_instance: bool,
    },
    Collection {
        source_item: TypeId,
        target: TypeId,
        without_target_instance: bool,
    },
}

impl TypeMapDescriptor {
    pub fn single(source: TypeId, target: TypeId, without_target_instance: bool) -> TypeMapDescriptor {
        TypeMapDescriptor {
            source,
            target,
            without_target_instance,
            collection: None,
            sites: vec![],
        }
    }

    pub fn pair(&self) -> MappingPair {
        MappingPair::new(self.source, self.target)
    }

    pub fn is_collection(&self) -> bool {
        self.collection.is_some()
    }

    fn key(&self) -> DescriptorKey {
        match &self.collection {
            Some(shape) => DescriptorKey::Collection {
                source_item: shape.source_item,
                target: self.target,
                without_target_instance: self.without_target_instance,
            },
            None => DescriptorKey::Single {
                source: self.source,
                target: self.target,
                without_target_instance: self.without_target_instance,
            },
        }
    }

    fn merge(&mut self, other: TypeMapDescriptor) {
        for site in other.sites {
            if !self.sites.contains(&site) {
                self.sites.push(site);
            }
        }

        if let (Some(shape), Some(other)) = (&mut self.collection, other.collection) {
            for ty in other.source_types {
                if !shape.source_types.contains(&ty) {
                    shape.source_types.push(ty);
                }
            }
        }
    }
}

/// Whether `ty`, or the value an optional `ty` wraps, converts as a value.
fn value_like(catalog: &dyn TypeCatalog, ty: TypeId) -> Result<bool> {
    let info = catalog.describe(ty)?;
    match info.kind {
        TypeKind::Optional(inner) => value_like(catalog, inner),
        _ => Ok(is_disallowed(info.special)),
    }
}

/// All descriptors registered for a pass, deduplicated structurally and kept
/// in registration order.
#[derive(Debug, Default)]
pub struct DescriptorSet {
    descriptors: IndexMap<DescriptorKey, TypeMapDescriptor>,
}

/// Descriptors sharing one source type, in registration order with the
/// instance-less ones first.
#[derive(Debug, Clone)]
pub struct DescriptorGroup {
    /// Source type, normalized to its sequence interface for collections
    pub source: TypeId,
    pub descriptors: Vec<TypeMapDescriptor>,
}

impl DescriptorSet {
    pub fn new() -> DescriptorSet {
        DescriptorSet::default()
    }

    /// Adds a descriptor, merging sites into an equal one if present.
    pub fn add(&mut self, descriptor: TypeMapDescriptor) {
        match self.descriptors.get_mut(&descriptor.key()) {
            Some(existing) => existing.merge(descriptor),
            None => {
                self.descriptors.insert(descriptor.key(), descriptor);
            }
        }
    }

    /// Turns a host request into descriptors.
    ///
    /// A request between two sequences becomes a collection descriptor plus
    /// an instance-less descriptor for the element pair, so the element
    /// mapping is generated too. Element pairs involving a value-like type
    /// (primitive, string, scalar, object) are converted directly instead.
    pub fn register(&mut self, catalog: &dyn TypeCatalog, request: &MappingRequest) -> Result<()> {
        let sites: Vec<RequestSite> = request.site.iter().cloned().collect();
        catalog.describe(request.source)?;
        catalog.describe(request.target)?;

        match (
            catalog.sequence_of(request.source),
            catalog.sequence_of(request.target),
        ) {
            (Some(source), Some(target)) => {
                self.add(TypeMapDescriptor {
                    source: request.source,
                    target: request.target,
                    without_target_instance: !request.with_target_instance,
                    collection: Some(CollectionShape {
                        source_item: source.element,
                        target_item: target.element,
                        source_types: vec![request.source],
                    }),
                    sites: sites.clone(),
                });

                if value_like(catalog, source.element)? || value_like(catalog, target.element)? {
                    return Ok(());
                }

                let item = MappingRequest {
                    source: source.element,
                    target: target.element,
                    with_target_instance: false,
                    site: request.site.clone(),
                };
                self.register(catalog, &item)
            }
            _ => {
                let mut descriptor = TypeMapDescriptor::single(
                    request.source,
                    request.target,
                    !request.with_target_instance,
                );
                descriptor.sites = sites;
                self.add(descriptor);
                Ok(())
            }
        }
    }

    /// Whether an instance-less mapping is generated for exactly this pair.
    pub fn contains_generated(&self, from: TypeId, to: TypeId) -> bool {
        self.descriptors.contains_key(&DescriptorKey::Single {
            source: from,
            target: to,
            without_target_instance: true,
        })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeMapDescriptor> {
        self.descriptors.values()
    }

    /// Groups descriptors by source type in first-registration order.
    pub fn groups(&self, catalog: &dyn TypeCatalog) -> Vec<DescriptorGroup> {
        let mut groups: IndexMap<TypeId, Vec<TypeMapDescriptor>> = IndexMap::new();

        for descriptor in self.descriptors.values() {
            let key = if descriptor.is_collection() {
                catalog
                    .sequence_of(descriptor.source)
                    .map(|seq| seq.interface)
                    .unwrap_or(descriptor.source)
            } else {
                descriptor.source
            };
            groups.entry(key).or_default().push(descriptor.clone());
        }

        groups
            .into_iter()
            .map(|(source, mut descriptors)| {
                // stable: keeps registration order inside each half
                descriptors.sort_by_key(|d| !d.without_target_instance);
                DescriptorGroup {
                    source,
                    descriptors,
                }
            })
            .collect()
    }
}
