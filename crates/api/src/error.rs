use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use thiserror::Error;

use crate::{auth::AuthError, store::StoreError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced at the GraphQL edge. Field validation failures are not in
/// here: they travel inside mutation payloads so the client can show them
/// next to the offending input.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("Login required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    RemoteOperation(String),
    #[error("internal server error")]
    Internal(Arc<anyhow::Error>),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION",
            ApiError::RemoteOperation(_) => "REMOTE_OPERATION",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(Arc::new(err.into()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::RemoteOperation(value.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::RegistrationDisabled => ApiError::Forbidden(value.to_string()),
            AuthError::Hash | AuthError::Token(_) | AuthError::Db(_) => ApiError::internal(value),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> Error {
        Error::new(self.to_string()).extend_with(|_err, e| e.set("code", self.code()))
    }
}
