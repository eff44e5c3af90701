//! Runtime support for code generated by `objmap generate`.
//!
//! Mappings are requested in ordinary source with [`request!`], which expands
//! to nothing. The generator reads those requests, resolves how each target
//! is produced, and writes plain functions plus [`MapTo`] / [`MapOnto`]
//! implementations that the crate pulls in with `include!`.
//!
//! ```ignore
//! #[derive(objmap::Mappable)]
//! pub struct User {
//!     pub id: i32,
//!     pub name: String,
//! }
//!
//! #[derive(Default, objmap::Mappable)]
//! pub struct UserDto {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! objmap::request!(User => UserDto);
//!
//! include!(concat!(env!("OUT_DIR"), "/objmap.rs"));
//! ```

pub mod builtin;

pub use objmap_macros::{
    collection_mapping, ignore_members, mapping_prepare, mapping_profile, post_mapping,
    type_mapping, Mappable,
};

/// Produces a new `T` from `self`.
pub trait MapTo<T> {
    fn map_to(&self) -> T;
}

/// Copies `self` onto an existing `T`.
pub trait MapOnto<T> {
    fn map_onto(&self, target: &mut T);
}

/// Marks mapping requests for the generator. Expands to nothing.
///
/// `request!(A => B)` asks for a new `B` built from an `A`;
/// `request!(A => &mut B)` asks for copying an `A` onto an existing `B`.
/// Several requests may be listed, separated by commas.
#[macro_export]
macro_rules! request {
    ($($tt:tt)*) => {};
}

/// Fails a mapping whose source or target is `None`.
#[cold]
#[track_caller]
pub fn argument_null(name: &str) -> ! {
    panic!("objmap: `{name}` is None")
}

/// Converts with `TryFrom`, panicking when the value does not fit.
#[track_caller]
pub fn try_cast<S, T>(value: S) -> T
where
    T: TryFrom<S>,
    T::Error: core::fmt::Debug,
{
    match T::try_from(value) {
        Ok(value) => value,
        Err(err) => panic!(
            "objmap: conversion to `{}` failed: {err:?}",
            core::any::type_name::<T>()
        ),
    }
}
