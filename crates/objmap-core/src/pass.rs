use crate::catalog::TypeCatalog;
use crate::context::ResolutionContext;
use crate::descriptor::MappingRequest;
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::emit::CodeEmitter;
use crate::plan::{PlanBuilder, PlanGroup};
use crate::profile::{ProfileDeclaration, ProfileId};
use crate::{CancellationToken, Config, Result};

/// Everything one resolution pass works on.
#[derive(Debug, Default, Clone)]
pub struct PassInput {
    pub profiles: Vec<ProfileDeclaration>,
    pub requests: Vec<MappingRequest>,
}

/// Result of a completed pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub groups: Vec<PlanGroup>,
    pub diagnostics: Vec<crate::Diagnostic>,

    /// Order in which profiles were merged into the registry
    pub profile_order: Vec<ProfileId>,
}

impl PassInput {
    pub fn new() -> PassInput {
        PassInput::default()
    }

    pub fn profile(mut self, profile: ProfileDeclaration) -> PassInput {
        self.profiles.push(profile);
        self
    }

    pub fn request(mut self, request: MappingRequest) -> PassInput {
        self.requests.push(request);
        self
    }
}

/// Runs a full resolution pass: profiles, then requests, then plans.
///
/// Only cancellation aborts the pass; every other failure is confined to the
/// unit it happened in and reported as a diagnostic.
pub fn resolve(
    catalog: &dyn TypeCatalog,
    config: &Config,
    input: &PassInput,
    cancel: &CancellationToken,
) -> Result<PassOutput> {
    let mut cx = ResolutionContext::new(catalog, config.clone()).with_cancellation(cancel.clone());

    let profile_order = cx.load_profiles(&input.profiles)?;

    for request in &input.requests {
        if let Err(err) = cx.add_request(request) {
            if err.is_cancelled() {
                return Err(err);
            }
            tracing::warn!(error = %err, "skipping mapping request");
            cx.report(
                Diagnostic::new(DiagnosticCode::UnexpectedException, [err.to_string()])
                    .with_sites(request.site.as_slice()),
            );
        }
    }

    let groups = build_groups(&cx)?;

    tracing::debug!(
        groups = groups.len(),
        cached_conversions = cx.cached_conversions(),
        "resolution pass complete"
    );

    Ok(PassOutput {
        groups,
        diagnostics: cx.into_diagnostics(),
        profile_order,
    })
}

fn build_groups(cx: &ResolutionContext<'_>) -> Result<Vec<PlanGroup>> {
    let builder = PlanBuilder::new(cx);
    let mut groups = vec![];

    for group in cx.descriptors().groups(cx.catalog()) {
        cx.check_cancelled()?;
        groups.push(builder.build_group(&group)?);
    }

    Ok(groups)
}

impl PassOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Renders every group with `emitter`.
    ///
    /// A group the emitter fails on is reported as an unexpected failure and
    /// left out; the other groups are still rendered.
    pub fn emit<E: CodeEmitter>(
        &mut self,
        emitter: &mut E,
        catalog: &dyn TypeCatalog,
        config: &Config,
    ) -> Vec<E::Output> {
        let mut outputs = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            match emitter.emit_group(group, catalog, config) {
                Ok(output) => outputs.push(output),
                Err(err) => {
                    tracing::warn!(
                        source = %catalog.type_name(group.source),
                        error = %err,
                        "emitter failed"
                    );
                    let sites: Vec<_> = group
                        .plans
                        .iter()
                        .flat_map(|plan| plan.sites.iter().cloned())
                        .collect();
                    self.diagnostics.push(
                        Diagnostic::new(DiagnosticCode::UnexpectedException, [err.to_string()])
                            .with_sites(&sites),
                    );
                }
            }
        }

        outputs
    }
}
