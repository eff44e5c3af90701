//! Resolved mapping plans, the engine's output.

mod builder;
pub use builder::PlanBuilder;

use crate::catalog::{Member, TypeId};
use crate::conversion::Conversion;
use crate::diagnostic::RequestSite;
use crate::identifier::ResolvedConstructor;
use crate::invoke::MethodInvokeDescriptor;

/// Plans for every target requested from one source type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanGroup {
    /// Source type, normalized to its sequence interface for collections
    pub source: TypeId,
    pub plans: Vec<MappingPlan>,
}

/// How to produce one target from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPlan {
    pub source: TypeId,
    pub target: TypeId,

    /// `false` when the caller supplies the target instance
    pub without_target_instance: bool,

    pub strategy: Strategy,

    /// Member assignments after the target instance exists, in target
    /// member order
    pub assignments: Vec<MemberAssignment>,

    pub post_mapping: Option<MethodInvokeDescriptor>,

    pub null_check: NullCheck,

    pub sites: Vec<RequestSite>,

    /// For collection plans, every concrete source collection type requested
    pub source_types: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// A type-mapping hook produces the target
    TypeMapping(MethodInvokeDescriptor),

    /// A prepare hook creates the target, remaining members are copied
    Prepare(MethodInvokeDescriptor),

    /// A constructor creates the target, remaining members are initialized
    Construct(ResolvedConstructor),

    /// Members are copied onto the supplied target
    UpdateInPlace,

    /// Elements are mapped and materialized
    Collection(Conversion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAssignment {
    pub target: Member,
    pub source: Member,
    pub conversion: Conversion,
}

/// Fail-fast checks emitted before any member is read.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct NullCheck {
    pub source: bool,
    pub target: bool,
}

impl MappingPlan {
    pub fn strategy_name(&self) -> &'static str {
        match self.strategy {
            Strategy::TypeMapping(_) => "type-mapping",
            Strategy::Prepare(_) => "prepare",
            Strategy::Construct(_) => "construct",
            Strategy::UpdateInPlace => "update-in-place",
            Strategy::Collection(_) => "collection",
        }
    }

    /// Target member names receiving a value, constructor arguments included.
    pub fn covered_members(&self) -> Vec<&str> {
        let mut names = vec![];
        if let Strategy::Construct(ctor) = &self.strategy {
            names.extend(ctor.arguments.iter().map(|a| a.target.name.as_str()));
        }
        names.extend(self.assignments.iter().map(|a| a.target.name.as_str()));
        names
    }
}
