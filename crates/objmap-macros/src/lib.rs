extern crate proc_macro;

use proc_macro::TokenStream;

/// Declares `#[objmap(..)]` field attributes and checks them. Generates no
/// code; mappings are produced by `objmap generate`.
#[proc_macro_derive(Mappable, attributes(objmap))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
    match objmap_codegen::check_mappable(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_attribute]
pub fn mapping_profile(args: TokenStream, item: TokenStream) -> TokenStream {
    match objmap_codegen::check_profile(args.into(), item.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_attribute]
pub fn type_mapping(args: TokenStream, item: TokenStream) -> TokenStream {
    hook("type_mapping", args, item)
}

#[proc_macro_attribute]
pub fn mapping_prepare(args: TokenStream, item: TokenStream) -> TokenStream {
    hook("mapping_prepare", args, item)
}

#[proc_macro_attribute]
pub fn post_mapping(args: TokenStream, item: TokenStream) -> TokenStream {
    hook("post_mapping", args, item)
}

#[proc_macro_attribute]
pub fn ignore_members(args: TokenStream, item: TokenStream) -> TokenStream {
    hook("ignore_members", args, item)
}

#[proc_macro_attribute]
pub fn collection_mapping(args: TokenStream, item: TokenStream) -> TokenStream {
    hook("collection_mapping", args, item)
}

fn hook(name: &str, args: TokenStream, item: TokenStream) -> TokenStream {
    match objmap_codegen::check_hook(name, args.into(), item.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
