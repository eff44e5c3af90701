use crate::catalog::TypeCatalog;
use crate::plan::PlanGroup;
use crate::{Config, Result};

/// Renders resolved plans into host code.
///
/// Called once per source group, in the deterministic group order of the
/// pass. Plans arrive fully resolved; an emitter never needs to consult the
/// registry or the caches.
pub trait CodeEmitter {
    type Output;

    fn emit_group(
        &mut self,
        group: &PlanGroup,
        catalog: &dyn TypeCatalog,
        config: &Config,
    ) -> Result<Self::Output>;
}
