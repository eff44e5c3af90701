use super::{MappingPlan, MemberAssignment, NullCheck, PlanGroup, Strategy};
use crate::catalog::Member;
use crate::context::ResolutionContext;
use crate::descriptor::{DescriptorGroup, TypeMapDescriptor};
use crate::diagnostic::{Diagnostic, DiagnosticCode, RequestSite};
use crate::identifier::{ConstructorMatch, IdentifierMatcher, MemberMatch};
use crate::metadata::TypeMapMetaData;
use crate::profile::HookKind;
use crate::Result;

use std::collections::HashSet;

/// Turns descriptors into [`MappingPlan`]s.
///
/// A descriptor that cannot be resolved reports its diagnostics and yields no
/// plan; its siblings are unaffected.
pub struct PlanBuilder<'a> {
    cx: &'a ResolutionContext<'a>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(cx: &'a ResolutionContext<'a>) -> PlanBuilder<'a> {
        PlanBuilder { cx }
    }

    pub fn build_group(&self, group: &DescriptorGroup) -> Result<PlanGroup> {
        self.cx.check_cancelled()?;

        let mut plans = Vec::with_capacity(group.descriptors.len());
        let source_mappable = match self.check_source(group) {
            Ok(mappable) => mappable,
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => {
                tracing::warn!(
                    source = %self.cx.catalog().type_name(group.source),
                    error = %err,
                    "unexpected failure describing source"
                );
                self.report(
                    Diagnostic::new(DiagnosticCode::UnexpectedException, [err.to_string()]),
                    &member_wise_sites(group),
                );
                false
            }
        };

        for descriptor in &group.descriptors {
            self.cx.check_cancelled()?;

            if !descriptor.is_collection() && !source_mappable {
                continue;
            }

            match self.build(descriptor) {
                Ok(Some(plan)) => plans.push(plan),
                Ok(None) => {}
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        source = %self.cx.catalog().type_name(descriptor.source),
                        target = %self.cx.catalog().type_name(descriptor.target),
                        error = %err,
                        "unexpected failure building plan"
                    );
                    self.report(
                        Diagnostic::new(DiagnosticCode::UnexpectedException, [err.to_string()]),
                        &descriptor.sites,
                    );
                }
            }
        }

        Ok(PlanGroup {
            source: group.source,
            plans,
        })
    }

    /// Reports an unmappable source once for all of the group's member-wise
    /// descriptors.
    fn check_source(&self, group: &DescriptorGroup) -> Result<bool> {
        if group.descriptors.iter().all(TypeMapDescriptor::is_collection) {
            return Ok(true);
        }

        let meta = self.cx.metadata(group.source)?;
        match &meta.unmappable {
            Some(diagnostic) => {
                self.report(diagnostic.clone(), &member_wise_sites(group));
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Builds the plan for one descriptor.
    pub fn build(&self, descriptor: &TypeMapDescriptor) -> Result<Option<MappingPlan>> {
        if descriptor.is_collection() {
            return self.build_collection(descriptor);
        }

        let target = self.cx.metadata(descriptor.target)?;
        if let Some(diagnostic) = &target.unmappable {
            self.report(diagnostic.clone(), &descriptor.sites);
            return Ok(None);
        }

        let source = self.cx.metadata(descriptor.source)?;
        let hooks = self
            .cx
            .registry()
            .hooks(descriptor.pair())
            .unwrap_or_default();
        let sites = &descriptor.sites;

        let (strategy, assignments) = if let Some(hook) = hooks.type_mapping {
            (Strategy::TypeMapping(hook), vec![])
        } else if !descriptor.without_target_instance {
            let assignments =
                self.copy_members(&source, &target, false, |m| target.is_ignored(&m.name), sites)?;
            self.check_init_only(&source, &target, sites)?;
            (Strategy::UpdateInPlace, assignments)
        } else if let Some(prepare) = hooks.prepare {
            let consumed: HashSet<&str> = prepare.consumed.iter().map(String::as_str).collect();
            let assignments = self.copy_members(
                &source,
                &target,
                false,
                |m| target.is_ignored(&m.name) || consumed.contains(m.name.as_str()),
                sites,
            )?;
            (Strategy::Prepare(prepare), assignments)
        } else {
            let matcher = IdentifierMatcher::new(self.cx);

            match matcher.match_constructor(&target.constructors, &source.readable)? {
                ConstructorMatch::NoPublicConstructor => {
                    self.report(
                        Diagnostic::new(DiagnosticCode::NoAnyPublicConstructor, [target.name.as_str()]),
                        sites,
                    );
                    return Ok(None);
                }
                ConstructorMatch::NoneSatisfiable => {
                    self.report(
                        Diagnostic::new(
                            DiagnosticCode::ConstructorMatchFailed,
                            [target.name.as_str(), source.name.as_str()],
                        ),
                        sites,
                    );
                    return Ok(None);
                }
                ConstructorMatch::Matched(ctor) => {
                    let covered: HashSet<String> = ctor
                        .constructor
                        .parameters
                        .iter()
                        .map(|p| p.name.to_lowercase())
                        .collect();
                    let assignments = self.copy_members(
                        &source,
                        &target,
                        true,
                        |m| target.is_ignored(&m.name) || covered.contains(&m.name.to_lowercase()),
                        sites,
                    )?;
                    (Strategy::Construct(ctor), assignments)
                }
            }
        };

        let plan = MappingPlan {
            source: descriptor.source,
            target: descriptor.target,
            without_target_instance: descriptor.without_target_instance,
            strategy,
            assignments,
            post_mapping: hooks.post_mapping,
            null_check: NullCheck {
                source: source.nullable,
                target: !descriptor.without_target_instance && target.nullable,
            },
            sites: descriptor.sites.clone(),
            source_types: vec![],
        };

        tracing::debug!(
            source = %source.name,
            target = %target.name,
            strategy = plan.strategy_name(),
            assignments = plan.assignments.len(),
            "built mapping plan"
        );

        Ok(Some(plan))
    }

    fn build_collection(&self, descriptor: &TypeMapDescriptor) -> Result<Option<MappingPlan>> {
        let catalog = self.cx.catalog();
        let source_name = catalog.type_name(descriptor.source);
        let target_name = catalog.type_name(descriptor.target);

        if !descriptor.without_target_instance {
            self.report(
                Diagnostic::new(
                    DiagnosticCode::CollectionMapIncorrectUsage,
                    [source_name, target_name],
                ),
                &descriptor.sites,
            );
            return Ok(None);
        }

        let conversion = self.cx.conversion(descriptor.pair(), false)?;
        if !conversion.is_possible() {
            self.report(
                Diagnostic::new(
                    DiagnosticCode::UndefinedCollectionMapping,
                    [source_name, target_name],
                ),
                &descriptor.sites,
            );
            return Ok(None);
        }

        let source = catalog.describe(descriptor.source)?;
        let source_types = descriptor
            .collection
            .as_ref()
            .map(|shape| shape.source_types.clone())
            .unwrap_or_else(|| vec![descriptor.source]);

        tracing::debug!(source = %source_name, target = %target_name, "built collection plan");

        Ok(Some(MappingPlan {
            source: descriptor.source,
            target: descriptor.target,
            without_target_instance: true,
            strategy: Strategy::Collection(conversion),
            assignments: vec![],
            post_mapping: self
                .cx
                .registry()
                .hook(descriptor.pair(), HookKind::PostMapping),
            null_check: NullCheck {
                source: source.is_nullable(),
                target: false,
            },
            sites: descriptor.sites.clone(),
            source_types,
        }))
    }

    /// Matches target members against the source's readable members.
    ///
    /// Reports type mismatches as warnings, targets without any candidate as
    /// one aggregated info, and read-only target fields that the source could
    /// have fed. Members accepted by `skip` take no part in any of it.
    fn copy_members(
        &self,
        source: &TypeMapMetaData,
        target: &TypeMapMetaData,
        include_init_only: bool,
        skip: impl Fn(&Member) -> bool,
        sites: &[RequestSite],
    ) -> Result<Vec<MemberAssignment>> {
        let matcher = IdentifierMatcher::new(self.cx);
        let mut assignments = vec![];
        let mut not_found = vec![];

        let init_only = include_init_only
            .then(|| TypeMapMetaData::members(&target.init_only))
            .into_iter()
            .flatten();

        for member in TypeMapMetaData::members(&target.writable).chain(init_only) {
            if skip(member) {
                continue;
            }

            match matcher.match_member(member, &source.readable, 0, true)? {
                MemberMatch::Matched { source, conversion } => assignments.push(MemberAssignment {
                    target: member.clone(),
                    source,
                    conversion,
                }),
                MemberMatch::Mismatched(diagnostic) => self.report(diagnostic, sites),
                MemberMatch::NotFound => not_found.push(member.name.clone()),
            }
        }

        if !not_found.is_empty() {
            self.report(
                Diagnostic::new(
                    DiagnosticCode::NotFoundMatchPropertyOrField,
                    [target.name.clone(), not_found.join(", ")],
                ),
                sites,
            );
        }

        let read_only = TypeMapMetaData::members(&target.read_only).filter(|m| !skip(m));
        let blocked = self.fed_members(source, target, read_only)?;
        if !blocked.is_empty() {
            self.report(
                Diagnostic::new(
                    DiagnosticCode::ReadOnlyFieldCanNotMap,
                    [target.name.clone(), blocked.join(", ")],
                ),
                sites,
            );
        }

        Ok(assignments)
    }

    fn check_init_only(
        &self,
        source: &TypeMapMetaData,
        target: &TypeMapMetaData,
        sites: &[RequestSite],
    ) -> Result<()> {
        let blocked = self.fed_members(source, target, TypeMapMetaData::members(&target.init_only))?;
        if !blocked.is_empty() {
            self.report(
                Diagnostic::new(
                    DiagnosticCode::InitOnlyPropertyCanNotMap,
                    [target.name.clone(), blocked.join(", ")],
                ),
                sites,
            );
        }
        Ok(())
    }

    /// Names of non-ignored target members a readable source member matches.
    fn fed_members<'m>(
        &self,
        source: &TypeMapMetaData,
        target: &TypeMapMetaData,
        members: impl Iterator<Item = &'m Member>,
    ) -> Result<Vec<String>> {
        let matcher = IdentifierMatcher::new(self.cx);
        let mut names = vec![];

        for member in members {
            if target.is_ignored(&member.name) {
                continue;
            }
            if let MemberMatch::Matched { .. } = matcher.match_member(member, &source.readable, 0, true)? {
                names.push(member.name.clone());
            }
        }

        Ok(names)
    }

    fn report(&self, diagnostic: Diagnostic, sites: &[RequestSite]) {
        self.cx.report(diagnostic.with_sites(sites));
    }
}

/// Request sites of every non-collection descriptor in the group.
fn member_wise_sites(group: &DescriptorGroup) -> Vec<RequestSite> {
    group
        .descriptors
        .iter()
        .filter(|d| !d.is_collection())
        .flat_map(|d| d.sites.iter().cloned())
        .collect()
}
