use super::{site, ErrorSet};

use objmap_core::RequestSite;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::visit::Visit;

/// One `Source => Target` entry of a `request!` invocation.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) source: syn::Type,
    pub(crate) target: syn::Type,

    /// Written `Source => &mut Target`: copy onto an existing target
    pub(crate) onto: bool,

    pub(crate) site: RequestSite,
}

impl Parse for Request {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let source: syn::Type = input.parse()?;
        input.parse::<syn::Token![=>]>()?;
        let target: syn::Type = input.parse()?;

        let (target, onto) = match target {
            syn::Type::Reference(reference) if reference.mutability.is_some() => {
                (*reference.elem, true)
            }
            syn::Type::Reference(reference) => {
                return Err(syn::Error::new_spanned(
                    reference,
                    "use `&mut Target` to map onto an existing value",
                ))
            }
            target => (target, false),
        };

        Ok(Request {
            site: site(source.span()),
            source,
            target,
            onto,
        })
    }
}

/// Finds every `request!` / `objmap::request!` invocation in the file, in
/// source order.
pub(crate) fn collect(file: &syn::File) -> syn::Result<Vec<Request>> {
    let mut collector = Collector {
        requests: vec![],
        errs: ErrorSet::new(),
    };
    collector.visit_file(file);
    collector.errs.finish(collector.requests)
}

struct Collector {
    requests: Vec<Request>,
    errs: ErrorSet,
}

impl<'ast> Visit<'ast> for Collector {
    fn visit_macro(&mut self, node: &'ast syn::Macro) {
        if is_request_macro(&node.path) {
            let parsed = node.parse_body_with(Punctuated::<Request, syn::Token![,]>::parse_terminated);
            if let Some(requests) = self.errs.check(parsed) {
                self.requests.extend(requests);
            }
        }
        syn::visit::visit_macro(self, node);
    }
}

fn is_request_macro(path: &syn::Path) -> bool {
    let segments: Vec<_> = path.segments.iter().map(|s| s.ident.to_string()).collect();
    match &segments[..] {
        [name] => name == "request",
        [krate, name] => krate == "objmap" && name == "request",
        _ => false,
    }
}
