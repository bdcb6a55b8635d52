//! # Payment Module
//!
//! Payment cộng dồn vào khoản vay. `organization_id` được denormalize
//! từ loan để tiện truy vấn theo tenant.

use crate::error::{CoreError, CoreResult};
use crate::loan::{validate_payment_amount, LoanStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Một lần trả tiền cho khoản vay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub loan_id: i64,
    pub amount: Decimal,
    /// Hình thức trả (cash, pix, transfer, ...), free text
    pub payment_type: String,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Dữ liệu ghi nhận payment mới
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub loan_id: i64,
    pub amount: Decimal,
    pub payment_type: String,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn new(loan_id: i64, amount: Decimal, payment_type: &str, payment_date: NaiveDate) -> Self {
        Self {
            loan_id,
            amount,
            payment_type: payment_type.to_string(),
            payment_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Kiểm tra trước khi ghi: số tiền dương, có hình thức trả
    pub fn validated(mut self) -> CoreResult<Self> {
        validate_payment_amount(self.amount)?;
        self.payment_type = self.payment_type.trim().to_string();
        if self.payment_type.is_empty() {
            return Err(CoreError::invalid("payment type is required"));
        }
        if self.notes.as_deref().map(str::trim).is_some_and(str::is_empty) {
            self.notes = None;
        }
        Ok(self)
    }
}

/// Kết quả ghi nhận payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// Tổng đã trả sau payment này
    pub total_paid: Decimal,
    pub remaining: Decimal,
    pub status: LoanStatus,
    /// Payment này vừa tất toán khoản vay
    pub settled_now: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 20).unwrap()
    }

    #[test]
    fn test_new_payment_validation() {
        let p = NewPayment::new(1, dec!(150), " pix ", date())
            .with_notes("  ")
            .validated()
            .unwrap();
        assert_eq!(p.payment_type, "pix");
        assert_eq!(p.notes, None);
    }

    #[test]
    fn test_new_payment_rejects_non_positive() {
        assert!(NewPayment::new(1, dec!(0), "cash", date()).validated().is_err());
        assert!(NewPayment::new(1, dec!(-10), "cash", date()).validated().is_err());
        assert!(NewPayment::new(1, dec!(10), "", date()).validated().is_err());
    }
}
