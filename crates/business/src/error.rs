//! Business layer errors
//!
//! Wraps core and persistence errors; [`BusinessError::kind`] collapses
//! everything into the taxonomy callers branch on.

use lendbook_core::CoreError;
use lendbook_persistence::PersistenceError;
use thiserror::Error;

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Authentication errors ===
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential error: {0}")]
    Credential(String),

    // === Wrapped errors ===
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

/// Error category independent of the layer that raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotYetChargeable,
    Conflict,
    NotFound,
    Forbidden,
    Internal,
}

impl BusinessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusinessError::InvalidCredentials => ErrorKind::Forbidden,
            BusinessError::Credential(_) => ErrorKind::Internal,
            BusinessError::Core(err) => core_kind(err),
            BusinessError::Persistence(err) => match err {
                PersistenceError::NotFound { .. } => ErrorKind::NotFound,
                PersistenceError::UniqueViolation(_) => ErrorKind::Conflict,
                PersistenceError::Protected(_) => ErrorKind::Forbidden,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Shorthand for `InvalidInput`
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Core(CoreError::invalid(message))
    }
}

fn core_kind(err: &CoreError) -> ErrorKind {
    match err {
        CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
        CoreError::NotYetChargeable { .. } => ErrorKind::NotYetChargeable,
        CoreError::Conflict(_) => ErrorKind::Conflict,
        CoreError::NotFound { .. } => ErrorKind::NotFound,
        CoreError::Forbidden(_) => ErrorKind::Forbidden,
        CoreError::Store(_) => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_core() {
        let err: BusinessError = CoreError::not_found("Loan", 3).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Loan not found: 3");

        let err = BusinessError::invalid("principal must be positive");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_kind_from_persistence() {
        let err: BusinessError = PersistenceError::UniqueViolation("username".into()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: BusinessError = PersistenceError::InvalidDecimal("x".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_invalid_credentials_is_forbidden() {
        assert_eq!(BusinessError::InvalidCredentials.kind(), ErrorKind::Forbidden);
    }
}
