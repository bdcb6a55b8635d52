//! # Loan Module
//!
//! Loan Accounting: tính số tiền mỗi kỳ, tổng phải trả, ngày đến hạn,
//! dư nợ còn lại, trạng thái quá hạn và tất toán.
//!
//! Mọi phép tính dùng `Decimal`, không dùng floating point.
//!
//! ## Chính sách làm tròn kỳ trả góp
//!
//! `installment_amount = total_amount / installments` được giữ ở độ chính xác
//! đầy đủ của `Decimal` (28 chữ số), nên `installment_amount * installments`
//! luôn lệch `total_amount` ít hơn một đơn vị nhỏ nhất. Lịch trả theo cent
//! lấy từ [`installment_schedule`]: mỗi kỳ làm tròn về cent, kỳ cuối nhận
//! phần chênh lệch để tổng lịch đúng bằng `total_amount`.

use crate::error::{CoreError, CoreResult};
use crate::money::{ensure_positive, round_minor, sum_amounts};
use crate::payment::Payment;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Số ngày từ ngày vay đến hạn kỳ đầu của khoản trả góp
pub const INSTALLMENT_DUE_OFFSET_DAYS: u64 = 30;

/// Số kỳ trả góp tối đa (30 năm trả hằng tháng)
pub const MAX_INSTALLMENTS: u32 = 360;

/// Hình thức trả nợ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    /// Trả một lần vào ngày đến hạn
    Single,
    /// Trả góp nhiều kỳ
    Installment,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Single => "single",
            LoanType::Installment => "installment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" => Some(LoanType::Single),
            "installment" => Some(LoanType::Installment),
            _ => None,
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trạng thái khoản vay. Chỉ chuyển một chiều Active -> Paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Paid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(LoanStatus::Active),
            "paid" => Some(LoanStatus::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Khoản vay.
///
/// Bất biến: `total_amount = amount * (1 + interest_rate / 100)`.
/// Chỉ ngày đến hạn của kỳ đầu được lưu, không có bảng lịch từng kỳ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub client_id: i64,
    /// Tiền gốc
    pub amount: Decimal,
    /// Lãi suất (%)
    pub interest_rate: Decimal,
    pub loan_type: LoanType,
    pub installments: u32,
    pub installment_amount: Decimal,
    pub total_amount: Decimal,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loan {} ({} {}x{}, total {}, due {}, {})",
            self.id,
            self.loan_type,
            self.installments,
            self.installment_amount.round_dp(2),
            self.total_amount,
            self.due_date,
            self.status
        )
    }
}

/// Input cho [`compute_loan_terms`]
#[derive(Debug, Clone)]
pub struct LoanTermsInput {
    pub principal: Decimal,
    pub interest_rate: Decimal,
    pub loan_type: LoanType,
    /// Bắt buộc với `installment`, bỏ qua với `single`
    pub installments: Option<u32>,
    pub loan_date: NaiveDate,
    /// Bắt buộc với `single`, bỏ qua với `installment`
    pub due_date: Option<NaiveDate>,
}

/// Kết quả tính toán điều khoản khoản vay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub installments: u32,
    pub installment_amount: Decimal,
    pub total_amount: Decimal,
    pub due_date: NaiveDate,
}

/// Tổng phải trả = principal * (1 + rate / 100)
pub fn total_with_interest(principal: Decimal, interest_rate: Decimal) -> CoreResult<Decimal> {
    let factor = Decimal::ONE + interest_rate / Decimal::ONE_HUNDRED;
    principal
        .checked_mul(factor)
        .ok_or_else(|| CoreError::invalid("loan amount out of range"))
}

/// Tính điều khoản khoản vay từ input của người dùng.
///
/// # Errors
/// `InvalidInput` khi principal <= 0, lãi suất âm, số kỳ < 1,
/// hoặc khoản `single` không có ngày đến hạn.
pub fn compute_loan_terms(input: &LoanTermsInput) -> CoreResult<LoanTerms> {
    if input.principal <= Decimal::ZERO {
        return Err(CoreError::invalid(format!(
            "principal must be positive: {}",
            input.principal
        )));
    }
    if input.interest_rate < Decimal::ZERO {
        return Err(CoreError::invalid(format!(
            "interest rate must not be negative: {}",
            input.interest_rate
        )));
    }

    let total_amount = total_with_interest(input.principal, input.interest_rate)?;

    match input.loan_type {
        LoanType::Single => {
            let due_date = input
                .due_date
                .ok_or_else(|| CoreError::invalid("single loans require a due date"))?;
            Ok(LoanTerms {
                installments: 1,
                installment_amount: total_amount,
                total_amount,
                due_date,
            })
        }
        LoanType::Installment => {
            let installments = input
                .installments
                .ok_or_else(|| CoreError::invalid("installment loans require an installment count"))?;
            check_installments(installments)?;
            let due_date = input
                .loan_date
                .checked_add_days(Days::new(INSTALLMENT_DUE_OFFSET_DAYS))
                .ok_or_else(|| CoreError::invalid("loan date out of range"))?;
            Ok(LoanTerms {
                installments,
                installment_amount: (total_amount / Decimal::from(installments)).normalize(),
                total_amount,
                due_date,
            })
        }
    }
}

fn check_installments(installments: u32) -> CoreResult<()> {
    if installments < 1 {
        return Err(CoreError::invalid("installments must be at least 1"));
    }
    if installments > MAX_INSTALLMENTS {
        return Err(CoreError::invalid(format!(
            "installments must be at most {MAX_INSTALLMENTS}: {installments}"
        )));
    }
    Ok(())
}

/// Lịch trả theo cent: `installments` kỳ, kỳ cuối nhận phần chênh lệch
/// làm tròn để tổng đúng bằng `total_amount`.
pub fn installment_schedule(total_amount: Decimal, installments: u32) -> CoreResult<Vec<Decimal>> {
    check_installments(installments)?;
    let regular = round_minor(total_amount / Decimal::from(installments));
    let mut schedule = vec![regular; installments as usize];
    let allocated = regular * Decimal::from(installments - 1);
    if let Some(last) = schedule.last_mut() {
        *last = total_amount - allocated;
    }
    Ok(schedule)
}

/// Tổng các khoản đã trả cho `loan`. Payment của khoản vay khác bị bỏ qua.
pub fn total_paid(loan: &Loan, payments: &[Payment]) -> Decimal {
    sum_amounts(
        payments
            .iter()
            .filter(|p| p.loan_id == loan.id)
            .map(|p| p.amount),
    )
}

/// Dư nợ còn lại; có thể âm nếu trả thừa.
pub fn remaining_balance(loan: &Loan, payments: &[Payment]) -> Decimal {
    loan.total_amount - total_paid(loan, payments)
}

/// Quá hạn khi còn active và `due_date < as_of` (đến hạn hôm nay chưa tính là quá hạn)
pub fn is_overdue(loan: &Loan, as_of: NaiveDate) -> bool {
    loan.status == LoanStatus::Active && loan.due_date < as_of
}

/// Quyết định trạng thái sau khi tổng đã trả là `paid_sum`.
///
/// Paid là trạng thái cuối: không có đường quay về Active.
pub fn settle_status(current: LoanStatus, total_amount: Decimal, paid_sum: Decimal) -> LoanStatus {
    match current {
        LoanStatus::Paid => LoanStatus::Paid,
        LoanStatus::Active if paid_sum >= total_amount => LoanStatus::Paid,
        LoanStatus::Active => LoanStatus::Active,
    }
}

/// Số tiền payment phải dương
pub fn validate_payment_amount(amount: Decimal) -> CoreResult<Decimal> {
    ensure_positive("payment amount", amount)
}

/// Trạng thái mới sau khi ghi nhận payment (`payments` đã gồm payment mới)
pub fn apply_payment(loan: &Loan, payments: &[Payment]) -> LoanStatus {
    settle_status(loan.status, loan.total_amount, total_paid(loan, payments))
}

/// Dữ liệu tạo khoản vay mới, đã qua [`compute_loan_terms`]
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub client_id: i64,
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub loan_type: LoanType,
    pub loan_date: NaiveDate,
    pub terms: LoanTerms,
}

impl NewLoan {
    /// Tính terms và đóng gói thành NewLoan
    pub fn build(client_id: i64, input: &LoanTermsInput) -> CoreResult<Self> {
        let terms = compute_loan_terms(input)?;
        Ok(Self {
            client_id,
            amount: input.principal,
            interest_rate: input.interest_rate,
            loan_type: input.loan_type,
            loan_date: input.loan_date,
            terms,
        })
    }
}
