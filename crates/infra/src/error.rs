use thiserror::Error;

use printworks_core::DomainError;

use crate::store::StoreError;

/// Error returned by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found() -> Self {
        Self::Domain(DomainError::NotFound)
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}
