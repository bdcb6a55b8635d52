//! Database schema definitions
//!
//! Row types cho sqlx mapping từ SQLite tables.
//! Schema được định nghĩa trong migrations/20260301000000_init.sql

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, NaiveDate, Utc};
use lendbook_core::{
    BillingRecord, BillingStatus, Client, Loan, LoanStatus, LoanType, MonthKey, Organization,
    OrganizationSummary, Payment, User, UserRole,
};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Row type cho bảng `organizations`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Organization kèm số user (LEFT JOIN users)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationCountRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub user_count: i64,
}

/// Row type cho bảng `users`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub organization_id: i64,
    pub monthly_fee: String, // Decimal stored as TEXT
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Row type cho bảng `clients`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub full_name: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Row type cho bảng `loans`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoanRow {
    pub id: i64,
    pub client_id: i64,
    pub amount: String,
    pub interest_rate: String,
    pub loan_type: String,
    pub installments: i64,
    pub installment_amount: String,
    pub total_amount: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Row type cho bảng `payments`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub loan_id: i64,
    pub amount: String,
    pub payment_type: String,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Row type cho bảng `user_billing`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillingRow {
    pub id: i64,
    pub user_id: i64,
    pub month_year: String,
    pub amount: String,
    pub payment_date: Option<NaiveDate>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

// === Conversion helpers ===

/// Đọc Decimal từ cột TEXT
pub fn parse_decimal(field: &str, value: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(value).map_err(|e| PersistenceError::InvalidDecimal(format!("{field}: {e}")))
}

fn parse_count(field: &str, value: i64) -> PersistenceResult<u32> {
    u32::try_from(value).map_err(|_| PersistenceError::invalid_value(field, &value.to_string()))
}

// === Conversion implementations ===

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<OrganizationCountRow> for OrganizationSummary {
    fn from(row: OrganizationCountRow) -> Self {
        OrganizationSummary {
            organization: Organization {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
            },
            user_count: row.user_count.max(0) as u64,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> PersistenceResult<Self> {
        let role = UserRole::from_str(&row.role)
            .ok_or_else(|| PersistenceError::invalid_value("role", &row.role))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            organization_id: row.organization_id,
            monthly_fee: parse_decimal("monthly_fee", &row.monthly_fee)?,
            start_date: row.start_date,
            created_at: row.created_at,
        })
    }
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            full_name: row.full_name,
            document: row.document,
            phone: row.phone,
            email: row.email,
            address: row.address,
            organization_id: row.organization_id,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<LoanRow> for Loan {
    type Error = PersistenceError;

    fn try_from(row: LoanRow) -> PersistenceResult<Self> {
        let loan_type = LoanType::from_str(&row.loan_type)
            .ok_or_else(|| PersistenceError::invalid_value("loan_type", &row.loan_type))?;
        let status = LoanStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_value("status", &row.status))?;
        Ok(Loan {
            id: row.id,
            client_id: row.client_id,
            amount: parse_decimal("amount", &row.amount)?,
            interest_rate: parse_decimal("interest_rate", &row.interest_rate)?,
            loan_type,
            installments: parse_count("installments", row.installments)?,
            installment_amount: parse_decimal("installment_amount", &row.installment_amount)?,
            total_amount: parse_decimal("total_amount", &row.total_amount)?,
            loan_date: row.loan_date,
            due_date: row.due_date,
            status,
            organization_id: row.organization_id,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = PersistenceError;

    fn try_from(row: PaymentRow) -> PersistenceResult<Self> {
        Ok(Payment {
            id: row.id,
            loan_id: row.loan_id,
            amount: parse_decimal("amount", &row.amount)?,
            payment_type: row.payment_type,
            payment_date: row.payment_date,
            notes: row.notes,
            organization_id: row.organization_id,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<BillingRow> for BillingRecord {
    type Error = PersistenceError;

    fn try_from(row: BillingRow) -> PersistenceResult<Self> {
        let month = MonthKey::from_str(&row.month_year)
            .map_err(|_| PersistenceError::invalid_value("month_year", &row.month_year))?;
        let status = BillingStatus::from_str(&row.status)
            .ok_or_else(|| PersistenceError::invalid_value("status", &row.status))?;
        Ok(BillingRecord {
            id: row.id,
            user_id: row.user_id,
            month,
            amount: parse_decimal("amount", &row.amount)?,
            payment_date: row.payment_date,
            status,
            start_date: row.start_date,
            created_at: row.created_at,
        })
    }
}

/// Chuyển danh sách row sang domain type, dừng ở row lỗi đầu tiên
pub fn convert_all<R, T>(rows: Vec<R>) -> PersistenceResult<Vec<T>>
where
    T: TryFrom<R, Error = PersistenceError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan_row() -> LoanRow {
        LoanRow {
            id: 1,
            client_id: 2,
            amount: "1000".to_string(),
            interest_rate: "10".to_string(),
            loan_type: "installment".to_string(),
            installments: 3,
            installment_amount: "366.66666666666666666666666667".to_string(),
            total_amount: "1100".to_string(),
            loan_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
            status: "active".to_string(),
            organization_id: 4,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_loan_row_conversion() {
        let loan = Loan::try_from(loan_row()).unwrap();
        assert_eq!(loan.total_amount, dec!(1100));
        assert_eq!(loan.loan_type, LoanType::Installment);
        assert_eq!(loan.installments, 3);
        assert!(loan.is_active());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut row = loan_row();
        row.status = "closed".to_string();
        assert!(matches!(
            Loan::try_from(row),
            Err(PersistenceError::InvalidEnumValue { .. })
        ));

        let mut row = loan_row();
        row.amount = "12,50".to_string();
        assert!(matches!(
            Loan::try_from(row),
            Err(PersistenceError::InvalidDecimal(_))
        ));
    }

    #[test]
    fn test_billing_row_month_parsed() {
        let row = BillingRow {
            id: 1,
            user_id: 3,
            month_year: "2024-03".to_string(),
            amount: "200.00".to_string(),
            payment_date: None,
            status: "pending".to_string(),
            start_date: None,
            created_at: Utc::now(),
        };
        let record = BillingRecord::try_from(row).unwrap();
        assert_eq!(record.month, MonthKey::new(2024, 3).unwrap());
        assert_eq!(record.status, BillingStatus::Pending);
    }
}
