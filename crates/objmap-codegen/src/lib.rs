//! Reads Rust source, resolves the mappings it requests and renders them as
//! Rust items.
//!
//! The resolution itself happens in `objmap-core`; this crate is the Rust
//! host around it. [`generate_file`] builds the type catalog, profiles and
//! requests from a parsed file, runs the pass and renders every plan group.
//! The `check_*` functions back the attribute macros in `objmap-macros`.

mod expand;
mod host;

use host::{ErrorSet, FieldAttr, HookAttr, ProfileAttr, Program};

use objmap_core::{CancellationToken, Config, Diagnostic};
use proc_macro2::{Span, TokenStream};

/// Output of one generator run.
#[derive(Debug)]
pub struct Generated {
    /// Rendered items, one entry per source type group
    pub items: Vec<TokenStream>,

    pub diagnostics: Vec<Diagnostic>,

    /// Paths of the profiles in the order their hooks were merged
    pub profile_order: Vec<String>,
}

impl Generated {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Every rendered item as one token stream.
    pub fn tokens(&self) -> TokenStream {
        self.items.iter().cloned().collect()
    }

    /// Source text suitable for `include!`.
    pub fn to_source(&self) -> String {
        let mut source = String::from("// @generated by objmap. Do not edit.\n");
        for item in &self.items {
            source.push('\n');
            source.push_str(&item.to_string());
            source.push('\n');
        }
        source
    }
}

/// Generates mappings for the items in `input`, a whole source file.
pub fn generate(input: TokenStream, config: &Config) -> syn::Result<Generated> {
    let file: syn::File = syn::parse2(input)?;
    generate_file(&file, config)
}

/// Generates mappings for an already parsed file.
///
/// Malformed declarations (hook signatures, attributes, request syntax) are
/// returned as `Err`. Mapping problems are reported as diagnostics in the
/// result.
pub fn generate_file(file: &syn::File, config: &Config) -> syn::Result<Generated> {
    generate_file_with(file, config, &CancellationToken::new())
}

/// Like [`generate_file`], stopping early once `cancel` is triggered.
pub fn generate_file_with(
    file: &syn::File,
    config: &Config,
    cancel: &CancellationToken,
) -> syn::Result<Generated> {
    let program = Program::from_ast(file)?;
    let catalog = program.types.catalog();

    let mut output = objmap_core::resolve(catalog, config, &program.input, cancel)
        .map_err(|err| syn::Error::new(Span::call_site(), err))?;

    let mut expand = expand::Expand::new(&program.types);
    let items = output.emit(&mut expand, catalog, config);

    tracing::debug!(
        items = items.len(),
        diagnostics = output.diagnostics.len(),
        "generated mappings"
    );

    let profile_order = output
        .profile_order
        .iter()
        .filter_map(|id| program.input.profiles.iter().find(|p| p.id == *id))
        .map(|p| p.path.clone())
        .collect();

    Ok(Generated {
        items,
        diagnostics: output.diagnostics,
        profile_order,
    })
}

/// Validates the `#[objmap(..)]` field attributes of a `#[derive(Mappable)]`
/// struct. The derive itself adds no items.
pub fn check_mappable(input: TokenStream) -> syn::Result<TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;

    let syn::Data::Struct(data) = &item.data else {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "`Mappable` can only be derived for structs",
        ));
    };

    let mut errs = ErrorSet::new();
    for field in &data.fields {
        errs.check(FieldAttr::from_ast(&field.attrs));
    }

    errs.finish(TokenStream::new())
}

/// Validates `#[mapping_profile(..)]` and returns the struct unchanged.
pub fn check_profile(args: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    ProfileAttr::from_args(args)?;
    let _: syn::ItemStruct = syn::parse2(item.clone())?;
    Ok(item)
}

/// Validates a hook attribute such as `#[post_mapping]` and returns the
/// method unchanged. Signatures are checked by the generator, which knows
/// the hook's profile.
pub fn check_hook(name: &str, args: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !args.is_empty() {
        return Err(syn::Error::new_spanned(
            args,
            format!("`#[{name}]` takes no arguments"),
        ));
    }

    let f: syn::ImplItemFn = syn::parse2(item.clone())?;
    if HookAttr::from_ast(&f.attrs)?.is_some() {
        return Err(syn::Error::new_spanned(
            &f.sig.ident,
            format!("`#[{name}]` cannot be combined with another hook attribute"),
        ));
    }

    Ok(item)
}
