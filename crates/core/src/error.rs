//! # Error Module
//!
//! Định nghĩa các domain errors cho Lendbook sử dụng thiserror.

use crate::calendar::MonthKey;
use chrono::NaiveDate;
use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi nghiệp vụ cốt lõi, không liên quan đến infrastructure.
/// Lỗi của tầng lưu trữ được quy về `Conflict`, `NotFound` hoặc `Store`.
#[derive(Debug, Error)]
pub enum CoreError {
    // === Validation errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // === Billing errors ===
    #[error("User {user_id} is not chargeable for {month} (billing starts {start_date})")]
    NotYetChargeable {
        user_id: i64,
        month: MonthKey,
        start_date: NaiveDate,
    },

    // === Store errors ===
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Store error: {0}")]
    Store(String),

    // === Permission errors ===
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Tạo InvalidInput error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Tạo NotFound error
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Kiểm tra có phải lỗi not found không
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }

    /// Kiểm tra có phải lỗi conflict (unique constraint) không
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }

    /// Kiểm tra có phải lỗi validation không
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, CoreError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid("principal must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid input: principal must be positive"
        );

        let err = CoreError::not_found("Loan", 42);
        assert_eq!(err.to_string(), "Loan not found: 42");
    }

    #[test]
    fn test_not_yet_chargeable_display() {
        let err = CoreError::NotYetChargeable {
            user_id: 7,
            month: MonthKey::new(2024, 3).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        };
        let text = err.to_string();
        assert!(text.contains("2024-03"));
        assert!(text.contains("2024-04-01"));
    }

    #[test]
    fn test_error_checks() {
        assert!(CoreError::not_found("Client", 1).is_not_found());
        assert!(CoreError::Conflict("dup".into()).is_conflict());
        assert!(CoreError::invalid("x").is_invalid_input());
        assert!(!CoreError::Forbidden("x".into()).is_not_found());
    }
}
