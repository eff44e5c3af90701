use crate::catalog::TypeId;

/// Error when the type catalog cannot describe a type identity.
#[derive(Debug)]
pub(super) struct UnknownTypeError {
    pub(super) ty: TypeId,
}

impl std::error::Error for UnknownTypeError {}

impl core::fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown type id #{}", self.ty.0)
    }
}
