use crate::catalog::{Constructor, Member};
use crate::context::ResolutionContext;
use crate::conversion::Conversion;
use crate::descriptor::MappingPair;
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::metadata::MemberGroup;
use crate::plan::MemberAssignment;
use crate::Result;

/// Outcome of matching one target member against source candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberMatch {
    Matched { source: Member, conversion: Conversion },

    /// Candidates with the same name exist but none converts. Carries the
    /// warning the caller may report.
    Mismatched(Diagnostic),

    /// No candidate shares the name.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorMatch {
    Matched(ResolvedConstructor),
    NoPublicConstructor,
    NoneSatisfiable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConstructor {
    pub constructor: Constructor,

    /// One assignment per parameter, in parameter order
    pub arguments: Vec<MemberAssignment>,
}

/// Offset used when scoring constructor parameters; their first character
/// conventionally differs in case from the member they come from.
pub const PARAMETER_OFFSET: usize = 1;

/// Similarity of two case-insensitively equal names.
///
/// Walks positions from `offset` to the end of the shorter name and adds
/// `target.len() - i` for every position where the characters match exactly,
/// so agreement early in the name weighs more.
pub fn score(target: &str, candidate: &str, offset: usize) -> usize {
    let a: Vec<char> = target.chars().collect();
    let b: Vec<char> = candidate.chars().collect();
    let len = a.len().min(b.len());

    (offset..len)
        .filter(|&i| a[i] == b[i])
        .map(|i| a.len() - i)
        .sum()
}

/// Finds the source member that feeds a target member.
pub struct IdentifierMatcher<'a> {
    cx: &'a ResolutionContext<'a>,
}

impl<'a> IdentifierMatcher<'a> {
    pub fn new(cx: &'a ResolutionContext<'a>) -> IdentifierMatcher<'a> {
        IdentifierMatcher { cx }
    }

    pub fn match_member(
        &self,
        target: &Member,
        candidates: &MemberGroup,
        offset: usize,
        allow_implicit: bool,
    ) -> Result<MemberMatch> {
        let Some(bucket) = candidates.get(&target.name.to_lowercase()) else {
            return Ok(MemberMatch::NotFound);
        };

        if let Some(exact) = bucket.iter().find(|c| c.name == target.name) {
            let conversion = self.convert(exact, target, allow_implicit)?;
            if conversion.is_possible() {
                return Ok(MemberMatch::Matched {
                    source: exact.clone(),
                    conversion,
                });
            }
        }

        let mut ranked: Vec<(usize, &Member)> = bucket
            .iter()
            .filter(|c| c.name != target.name)
            .map(|c| (score(&target.name, &c.name, offset), c))
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, candidate) in ranked {
            let conversion = self.convert(candidate, target, allow_implicit)?;
            if conversion.is_possible() {
                return Ok(MemberMatch::Matched {
                    source: candidate.clone(),
                    conversion,
                });
            }
        }

        let catalog = self.cx.catalog();
        let listed = bucket
            .iter()
            .map(|c| format!("{}({})", c.name, catalog.type_name(c.ty)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(MemberMatch::Mismatched(Diagnostic::new(
            DiagnosticCode::PropertyOrFieldTypeNotMatch,
            [
                target.name.clone(),
                listed,
                format!("{}({})", target.name, catalog.type_name(target.ty)),
            ],
        )))
    }

    /// Picks the first constructor whose parameters can all be fed from
    /// `readable`. A parameterless constructor at the front wins outright.
    pub fn match_constructor(
        &self,
        constructors: &[Constructor],
        readable: &MemberGroup,
    ) -> Result<ConstructorMatch> {
        let Some(first) = constructors.first() else {
            return Ok(ConstructorMatch::NoPublicConstructor);
        };

        if first.arity() == 0 {
            return Ok(ConstructorMatch::Matched(ResolvedConstructor {
                constructor: first.clone(),
                arguments: vec![],
            }));
        }

        'constructors: for constructor in constructors {
            let mut arguments = Vec::with_capacity(constructor.arity());

            for param in &constructor.parameters {
                match self.match_member(param, readable, PARAMETER_OFFSET, false)? {
                    MemberMatch::Matched { source, conversion } => arguments.push(MemberAssignment {
                        target: param.clone(),
                        source,
                        conversion,
                    }),
                    _ => continue 'constructors,
                }
            }

            return Ok(ConstructorMatch::Matched(ResolvedConstructor {
                constructor: constructor.clone(),
                arguments,
            }));
        }

        Ok(ConstructorMatch::NoneSatisfiable)
    }

    fn convert(&self, source: &Member, target: &Member, allow_implicit: bool) -> Result<Conversion> {
        self.cx
            .conversion(MappingPair::new(source.ty, target.ty), allow_implicit)
    }
}
