use crate::access::AccessError;
use crate::entity::FinalizeError;
use crate::ErrorKind;
use thiserror::Error;

/// Errors raised while patching host registries or running a patch.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PatchError {
    #[error("an entry with key '{key}' already exists")]
    DuplicateKey { key: String },

    #[error("type id {type_id} is already registered")]
    DuplicateTypeId { type_id: i32 },

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),
}

impl PatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::DuplicateKey { .. } | PatchError::DuplicateTypeId { .. } => {
                ErrorKind::DuplicateKey
            }
            PatchError::Access(err) => err.kind(),
            PatchError::Finalize(err) => err.kind(),
        }
    }
}
