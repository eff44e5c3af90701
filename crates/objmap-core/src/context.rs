use crate::catalog::{TypeCatalog, TypeId};
use crate::conversion::{Conversion, ConversionCache, ConversionMatcher};
use crate::descriptor::{DescriptorSet, MappingPair, MappingRequest};
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::metadata::{MetadataCache, TypeMapMetaData};
use crate::profile::{ProfileDeclaration, ProfileId, Registry};
use crate::{CancellationToken, Config, Result};

use std::sync::Arc;

/// State shared by every component during one resolution pass.
///
/// Profiles and requests are loaded first (`&mut self` where needed); plan
/// building afterwards only reads, so the caches are filled through `&self`.
pub struct ResolutionContext<'a> {
    catalog: &'a dyn TypeCatalog,
    config: Config,
    registry: Registry,
    descriptors: DescriptorSet,
    metadata: MetadataCache,
    conversions: ConversionCache,
    diagnostics: Diagnostics,
    cancel: CancellationToken,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(catalog: &'a dyn TypeCatalog, config: Config) -> ResolutionContext<'a> {
        ResolutionContext {
            catalog,
            config,
            registry: Registry::new(),
            descriptors: DescriptorSet::new(),
            metadata: MetadataCache::new(),
            conversions: ConversionCache::default(),
            diagnostics: Diagnostics::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> ResolutionContext<'a> {
        self.cancel = cancel;
        self
    }

    pub fn catalog(&self) -> &'a dyn TypeCatalog {
        self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn descriptors(&self) -> &DescriptorSet {
        &self.descriptors
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn check_cancelled(&self) -> Result<()> {
        self.cancel.check()
    }

    /// Registers every profile. Must run before any metadata is computed so
    /// that ignore rules apply.
    pub fn load_profiles(&self, declarations: &[ProfileDeclaration]) -> Result<Vec<ProfileId>> {
        debug_assert!(self.metadata.is_empty(), "profiles loaded after metadata");
        self.registry
            .load(declarations, self.catalog, &self.diagnostics, &self.cancel)
    }

    /// Registers a host mapping request.
    pub fn add_request(&mut self, request: &MappingRequest) -> Result<()> {
        self.check_cancelled()?;
        self.descriptors.register(self.catalog, request)
    }

    pub fn metadata(&self, ty: TypeId) -> Result<Arc<TypeMapMetaData>> {
        self.metadata.get_or_build(ty, || {
            TypeMapMetaData::build(self.catalog, ty, self.registry.ignored_members(ty))
        })
    }

    pub fn conversion(&self, pair: MappingPair, allow_implicit: bool) -> Result<Conversion> {
        ConversionMatcher::new(self).get_conversion(pair, allow_implicit)
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    pub(crate) fn conversion_cache(&self) -> &ConversionCache {
        &self.conversions
    }

    /// Number of cached `allow_implicit` conversions.
    pub fn cached_conversions(&self) -> usize {
        self.conversions.len()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_vec()
    }
}
