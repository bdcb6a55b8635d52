//! # Persistence Errors
//!
//! Error types cho persistence layer, wrapping sqlx errors.
//! Ra khỏi crate này, lỗi được quy về `CoreError` qua `From`.

use lendbook_core::CoreError;
use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    // === Database errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Protected record: {0}")]
    Protected(String),

    // === Conversion errors ===
    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),

    #[error("Invalid enum value: {field} = {value}")]
    InvalidEnumValue { field: String, value: String },
}

/// Result type alias cho PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    /// Tạo NotFound error
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Tạo InvalidEnumValue error
    pub fn invalid_value(field: &str, value: &str) -> Self {
        Self::InvalidEnumValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Phân loại lỗi ghi: vi phạm unique constraint thành `UniqueViolation`
    pub fn on_write(err: sqlx::Error, what: &str) -> Self {
        let unique = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);
        if unique {
            Self::UniqueViolation(what.to_string())
        } else {
            Self::Database(err)
        }
    }

    /// Kiểm tra có phải lỗi not found không
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Kiểm tra có phải lỗi database không
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

impl From<PersistenceError> for CoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            PersistenceError::UniqueViolation(what) => CoreError::Conflict(what),
            PersistenceError::Protected(what) => CoreError::Forbidden(what),
            other => CoreError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_core_taxonomy() {
        let err: CoreError = PersistenceError::not_found("Loan", 7).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Loan not found: 7");

        let err: CoreError = PersistenceError::UniqueViolation("client document".into()).into();
        assert!(err.is_conflict());

        let err: CoreError = PersistenceError::InvalidDecimal("abc".into()).into();
        assert!(matches!(err, CoreError::Store(_)));
    }

    #[test]
    fn test_non_database_error_is_not_unique() {
        let err = PersistenceError::on_write(sqlx::Error::RowNotFound, "user");
        assert!(err.is_database_error());
    }
}
