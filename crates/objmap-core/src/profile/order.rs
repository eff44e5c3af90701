use super::{IncludeRef, ProfileDeclaration, ProfileId};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Diagnostics};

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// Computes the order in which profiles write into the registry.
///
/// Every profile reachable from a non-predefined profile is visited once,
/// even when includes form a cycle. The reachable set is sorted so that
/// includes come before the profiles including them, the predefined profiles
/// are put in front, and the whole list is reversed: the most specific
/// profile writes first and the predefined profile writes last.
pub(super) fn processing_order(
    declarations: &[ProfileDeclaration],
    diagnostics: &Diagnostics,
) -> Vec<ProfileId> {
    let by_id: IndexMap<ProfileId, &ProfileDeclaration> =
        declarations.iter().map(|decl| (decl.id, decl)).collect();

    let mut reachable = IndexSet::new();
    for decl in declarations.iter().filter(|decl| !decl.predefined) {
        collect_includes(decl.id, &by_id, &mut reachable, diagnostics);
    }

    let mut sorted = Vec::with_capacity(reachable.len());
    let mut visited = HashSet::new();
    for id in &reachable {
        sort_by_dependencies(*id, &by_id, &reachable, &mut visited, &mut sorted);
    }

    sorted.retain(|id| by_id.get(id).is_some_and(|decl| !decl.predefined));

    let mut order: Vec<ProfileId> = declarations
        .iter()
        .filter(|decl| decl.predefined)
        .map(|decl| decl.id)
        .collect();
    order.extend(sorted);
    order.reverse();
    order
}

fn collect_includes(
    id: ProfileId,
    by_id: &IndexMap<ProfileId, &ProfileDeclaration>,
    reachable: &mut IndexSet<ProfileId>,
    diagnostics: &Diagnostics,
) {
    if !reachable.insert(id) {
        return;
    }

    let Some(decl) = by_id.get(&id) else {
        return;
    };

    for include in &decl.includes {
        match include {
            IncludeRef::Resolved(next) if by_id.contains_key(next) => {
                collect_includes(*next, by_id, reachable, diagnostics);
            }
            IncludeRef::Resolved(next) => {
                report_bad_include(decl, &format!("#{}", next.0), diagnostics);
            }
            IncludeRef::Unresolved(name) => report_bad_include(decl, name, diagnostics),
        }
    }
}

fn report_bad_include(decl: &ProfileDeclaration, include: &str, diagnostics: &Diagnostics) {
    let diagnostic = Diagnostic::new(
        DiagnosticCode::ErrorMappingProfileInclude,
        [decl.path.as_str(), include],
    );
    diagnostics.report(diagnostic.with_sites(decl.site.as_slice()));
}

fn sort_by_dependencies(
    id: ProfileId,
    by_id: &IndexMap<ProfileId, &ProfileDeclaration>,
    reachable: &IndexSet<ProfileId>,
    visited: &mut HashSet<ProfileId>,
    sorted: &mut Vec<ProfileId>,
) {
    if !visited.insert(id) {
        return;
    }

    if let Some(decl) = by_id.get(&id) {
        for include in &decl.includes {
            if let IncludeRef::Resolved(dep) = include {
                if reachable.contains(dep) {
                    sort_by_dependencies(*dep, by_id, reachable, visited, sorted);
                }
            }
        }
    }

    sorted.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: usize) -> ProfileDeclaration {
        ProfileDeclaration::new(ProfileId(id), format!("P{id}"))
    }

    fn order(decls: &[ProfileDeclaration]) -> Vec<usize> {
        let diagnostics = Diagnostics::new();
        processing_order(decls, &diagnostics)
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    #[test]
    fn specific_first_predefined_last() {
        let decls = [
            ProfileDeclaration::predefined(ProfileId(0), "Builtin"),
            profile(1),
            profile(2).include(ProfileId(1)),
        ];
        assert_eq!(order(&decls), [2, 1, 0]);
    }

    #[test]
    fn includes_precede_their_includers_before_reversal() {
        // 3 includes 2 includes 1; declared out of order
        let decls = [
            profile(1),
            profile(3).include(ProfileId(2)),
            profile(2).include(ProfileId(1)),
        ];
        assert_eq!(order(&decls), [3, 2, 1]);
    }

    #[test]
    fn cycles_visit_each_profile_once() {
        let decls = [
            profile(1).include(ProfileId(2)),
            profile(2).include(ProfileId(1)),
        ];
        let got = order(&decls);
        assert_eq!(got.len(), 2);
        assert_eq!(got, order(&decls));
    }

    #[test]
    fn predefined_included_by_user_is_still_last() {
        let decls = [
            ProfileDeclaration::predefined(ProfileId(0), "Builtin"),
            profile(1).include(ProfileId(0)),
        ];
        assert_eq!(order(&decls), [1, 0]);
    }

    #[test]
    fn unresolved_include_is_reported() {
        let diagnostics = Diagnostics::new();
        let decls = [profile(1).include_unresolved("Missing")];
        let got = processing_order(&decls, &diagnostics);

        assert_eq!(got, [ProfileId(1)]);
        let reported = diagnostics.into_vec();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].code, DiagnosticCode::ErrorMappingProfileInclude);
        assert_eq!(reported[0].args, ["P1", "Missing"]);
    }
}
