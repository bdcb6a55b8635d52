//! # Lendbook Core
//!
//! Domain types và quy tắc nghiệp vụ thuần (không I/O):
//!
//! - [`loan`] - Loan Accounting: điều khoản, dư nợ, quá hạn, tất toán
//! - [`billing`] - Billing Cycle: phí nền tảng hằng tháng
//! - [`calendar`] - `MonthKey` và `DateWindow`
//! - [`repository`] - trait truy cập dữ liệu, store cụ thể nằm ở `lendbook-persistence`
//! - [`context`] - `RequestContext` của người gọi

pub mod billing;
pub mod calendar;
pub mod client;
pub mod context;
pub mod error;
pub mod loan;
pub mod money;
pub mod payment;
pub mod repository;
pub mod user;

pub use billing::{
    is_chargeable_this_month, plan_paid_charge, BatchFailure, BatchOutcome, BillingCharge,
    BillingRecord, BillingStatus, Chargeability,
};
pub use calendar::{CalendarWindow, DateWindow, MonthKey};
pub use client::{Client, NewClient};
pub use context::RequestContext;
pub use error::{CoreError, CoreResult};
pub use loan::{
    apply_payment, compute_loan_terms, installment_schedule, is_overdue, remaining_balance,
    settle_status, total_paid, validate_payment_amount, Loan, LoanStatus, LoanTerms,
    LoanTermsInput, LoanType, NewLoan, INSTALLMENT_DUE_OFFSET_DAYS, MAX_INSTALLMENTS,
};
pub use money::Currency;
pub use payment::{NewPayment, Payment, PaymentReceipt};
pub use repository::{
    BillingRepository, ClientRepository, LedgerStore, LoanRepository, OrganizationRepository,
    OrganizationSummary, PaymentRepository, UserRepository,
};
pub use user::{
    NewUser, Organization, User, UserRole, LEGACY_DEFAULT_MONTHLY_FEE, MASTER_ORGANIZATION_ID,
    MASTER_ORGANIZATION_NAME,
};
