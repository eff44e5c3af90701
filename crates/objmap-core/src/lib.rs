mod cancel;
pub use cancel::CancellationToken;

pub mod catalog;
pub use catalog::{MemoryCatalog, TypeCatalog, TypeId};

mod config;
pub use config::{Accessibility, Config};

mod context;
pub use context::ResolutionContext;

pub mod conversion;
pub use conversion::{Conversion, ConversionMatcher};

pub mod descriptor;
pub use descriptor::{MappingPair, MappingRequest, TypeMapDescriptor};

mod diagnostic;
pub use diagnostic::{Diagnostic, DiagnosticCode, Diagnostics, RequestSite, Severity};

mod emit;
pub use emit::CodeEmitter;

mod error;
pub use error::{Error, IntoError};

pub mod identifier;
pub use identifier::IdentifierMatcher;

pub mod invoke;
pub use invoke::{InvokeKind, MethodInvokeDescriptor};

pub mod metadata;
pub use metadata::TypeMapMetaData;

mod pass;
pub use pass::{resolve, PassInput, PassOutput};

pub mod plan;
pub use plan::{MappingPlan, PlanGroup, Strategy};

pub mod profile;
pub use profile::{HookKind, ProfileDeclaration, ProfileId, Registry};

/// A Result type alias that uses objmap's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
