//! # Billing Module
//!
//! Billing Cycle: quyết định user có phải trả phí nền tảng trong một tháng
//! hay không, và dựng bản ghi thu phí cho thao tác "mark paid".
//!
//! Mỗi (user, tháng) có tối đa một `BillingRecord`; tính duy nhất do store
//! đảm bảo bằng unique constraint + upsert.

use crate::calendar::MonthKey;
use crate::error::{CoreError, CoreResult};
use crate::user::User;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trạng thái thu phí của một tháng.
///
/// `Overdue` được nhận diện và thống kê nhưng hệ thống này không tạo ra nó;
/// việc đánh dấu quá hạn thuộc về một job bên ngoài.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    Pending,
    Paid,
    Overdue,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Paid => "paid",
            BillingStatus::Overdue => "overdue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BillingStatus::Pending),
            "paid" => Some(BillingStatus::Paid),
            "overdue" => Some(BillingStatus::Overdue),
            _ => None,
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bản ghi phí nền tảng của một user trong một tháng
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: i64,
    pub user_id: i64,
    pub month: MonthKey,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub status: BillingStatus,
    /// start_date của user tại thời điểm thu phí
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Dữ liệu upsert cho (user, month)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingCharge {
    pub user_id: i64,
    pub month: MonthKey,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub status: BillingStatus,
    pub start_date: Option<NaiveDate>,
}

/// User có bị tính phí trong tháng bắt đầu từ `month_start` không.
///
/// Master không bao giờ bị tính phí; user không có start_date bị tính ngay.
pub fn is_chargeable_this_month(user: &User, month_start: NaiveDate) -> bool {
    if user.is_master() {
        return false;
    }
    match user.start_date {
        None => true,
        Some(start) => start <= month_start,
    }
}

/// Dựng bản ghi "paid" cho `user` trong `month`.
///
/// # Errors
/// - `Forbidden` nếu user là master (không thuộc diện thu phí)
/// - `NotYetChargeable` nếu user chưa đến kỳ tính phí
pub fn plan_paid_charge(user: &User, month: MonthKey, as_of: NaiveDate) -> CoreResult<BillingCharge> {
    if user.is_master() {
        return Err(CoreError::Forbidden(format!(
            "master user {} is never billed",
            user.id
        )));
    }
    if let Some(start_date) = user.start_date.filter(|start| *start > month.first_day()) {
        return Err(CoreError::NotYetChargeable {
            user_id: user.id,
            month,
            start_date,
        });
    }
    Ok(BillingCharge {
        user_id: user.id,
        month,
        amount: user.monthly_fee,
        payment_date: as_of,
        status: BillingStatus::Paid,
        start_date: user.start_date,
    })
}

/// User đã bắt đầu bị tính phí trong tháng, hay còn ở tương lai
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chargeability {
    Active,
    Future,
}

impl Chargeability {
    pub fn of(user: &User, month_start: NaiveDate) -> Self {
        if is_chargeable_this_month(user, month_start) {
            Chargeability::Active
        } else {
            Chargeability::Future
        }
    }
}

/// Một dòng thất bại trong batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub user_id: i64,
    pub error: String,
}

/// Kết quả của "mark all paid": các dòng thành công đã được commit
/// riêng lẻ, các dòng lỗi được liệt kê, không dòng nào bị che giấu.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub month: MonthKey,
    pub marked: Vec<i64>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn new(month: MonthKey) -> Self {
        Self {
            month,
            marked: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
