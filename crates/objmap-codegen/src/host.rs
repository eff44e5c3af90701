//! Reads a Rust source file into the engine's view: a type catalog, the
//! mapping profiles and the requested mappings.

mod attr;
pub(crate) use attr::{FieldAttr, HookAttr, ProfileAttr};

mod error;
pub(crate) use error::ErrorSet;

mod item;
pub(crate) use item::Items;

mod profile;
pub(crate) use profile::BUILTIN_PATH;

mod request;

mod ty;
pub(crate) use ty::{TypeTable, DEFAULT_CONSTRUCTOR, STRUCT_LITERAL};

mod visit;

use objmap_core::{MappingRequest, PassInput, RequestSite};
use proc_macro2::Span;

/// The input program as the resolution engine sees it.
#[derive(Debug)]
pub(crate) struct Program {
    pub(crate) types: TypeTable,
    pub(crate) input: PassInput,
}

impl Program {
    pub(crate) fn from_ast(file: &syn::File) -> syn::Result<Program> {
        let items = Items::from_ast(file)?;
        let mut types = TypeTable::new(&items)?;
        let mut errs = ErrorSet::new();

        let mut input = PassInput::new().profile(profile::builtin(&types));
        if let Some(profiles) = errs.check(profile::declarations(&items, &mut types)) {
            input.profiles.extend(profiles);
        }

        for request in errs.check(request::collect(file)).into_iter().flatten() {
            let source = errs.check(types.resolve(&items, &request.source));
            let target = errs.check(types.resolve(&items, &request.target));
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };

            let mapping = match request.onto {
                true => MappingRequest::onto(source, target),
                false => MappingRequest::new(source, target),
            };
            input.requests.push(mapping.at(request.site));
        }

        errs.check(types.finish());

        tracing::debug!(
            structs = items.structs.len(),
            profiles = input.profiles.len(),
            requests = input.requests.len(),
            "read input program"
        );

        errs.finish(Program { types, input })
    }
}

/// 1-based line and column of where `span` starts.
pub(crate) fn site(span: Span) -> RequestSite {
    let start = span.start();
    RequestSite::new(start.line, start.column + 1)
}
