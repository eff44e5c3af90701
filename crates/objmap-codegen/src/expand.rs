mod convert;
mod plan;
mod util;

use crate::host::TypeTable;

use objmap_core::{CodeEmitter, Config, PlanGroup, TypeCatalog};
use proc_macro2::TokenStream;
use quote::quote;

/// Renders plan groups as Rust items.
///
/// Every plan becomes a free function, `map_<source>_to_<target>` or
/// `map_<source>_onto_<target>`. When either type is declared in the input,
/// an `objmap::MapTo` or `objmap::MapOnto` impl forwarding to that function
/// is added as well.
pub(crate) struct Expand<'a> {
    types: &'a TypeTable,
}

/// Rendering state for one group.
struct Emit<'a> {
    types: &'a TypeTable,
    catalog: &'a dyn TypeCatalog,

    /// Visibility of the generated functions
    vis: TokenStream,
}

impl<'a> Expand<'a> {
    pub(crate) fn new(types: &'a TypeTable) -> Expand<'a> {
        Expand { types }
    }
}

impl CodeEmitter for Expand<'_> {
    type Output = TokenStream;

    fn emit_group(
        &mut self,
        group: &PlanGroup,
        catalog: &dyn TypeCatalog,
        config: &Config,
    ) -> objmap_core::Result<TokenStream> {
        let emit = Emit {
            types: self.types,
            catalog,
            vis: util::visibility(config.accessibility),
        };

        let mut functions = TokenStream::new();
        let mut impls = TokenStream::new();

        for plan in &group.plans {
            let expanded = emit.plan(plan)?;
            functions.extend(expanded.functions);
            impls.extend(expanded.impls);
        }

        if impls.is_empty() {
            return Ok(functions);
        }

        let impls = util::wrap_in_const(impls);
        Ok(quote! {
            #functions
            #impls
        })
    }
}
