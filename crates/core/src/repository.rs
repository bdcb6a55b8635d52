//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! (clients, loans, payments) take the caller's `org_id` and must filter
//! every read and write by it; a row that exists in another organization
//! is reported as `NotFound`, never revealed.

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::billing::{BillingCharge, BillingRecord, BillingStatus};
use crate::calendar::MonthKey;
use crate::client::{Client, NewClient};
use crate::error::CoreResult;
use crate::loan::{Loan, NewLoan};
use crate::payment::{NewPayment, Payment, PaymentReceipt};
use crate::user::{NewUser, Organization, User};

/// Organization with the number of users attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSummary {
    pub organization: Organization,
    pub user_count: u64,
}

// ---------------------------------------------------------------------------
// Platform scope
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    /// Returns the organization with this exact name, creating it if absent.
    fn find_or_create_organization(
        &self,
        name: &str,
    ) -> impl Future<Output = CoreResult<Organization>> + Send;
    fn find_organization(&self, id: i64) -> impl Future<Output = CoreResult<Organization>> + Send;
    /// Every organization except the master one, ordered by name.
    fn list_organizations(
        &self,
    ) -> impl Future<Output = CoreResult<Vec<OrganizationSummary>>> + Send;
}

pub trait UserRepository: Send + Sync {
    /// `Conflict` when the username is taken.
    fn create_user(&self, input: NewUser) -> impl Future<Output = CoreResult<User>> + Send;
    fn find_user(&self, id: i64) -> impl Future<Output = CoreResult<User>> + Send;
    fn find_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = CoreResult<Option<User>>> + Send;
    fn update_monthly_fee(
        &self,
        id: i64,
        fee: Decimal,
    ) -> impl Future<Output = CoreResult<User>> + Send;
    /// Non-master users, ordered by organization name then username.
    fn list_billable_users(&self) -> impl Future<Output = CoreResult<Vec<User>>> + Send;
    /// Non-master users whose record for `month` is missing or not `paid`.
    fn list_unpaid_users(
        &self,
        month: MonthKey,
    ) -> impl Future<Output = CoreResult<Vec<User>>> + Send;
    /// Moves non-master users from `legacy_fee` to `new_fee`; returns rows changed.
    fn replace_monthly_fee(
        &self,
        legacy_fee: Decimal,
        new_fee: Decimal,
    ) -> impl Future<Output = CoreResult<u64>> + Send;
    /// Deletes the user, its billing rows and its organization's business data.
    fn delete_user_cascade(&self, id: i64) -> impl Future<Output = CoreResult<()>> + Send;
}

pub trait BillingRepository: Send + Sync {
    /// Insert-or-replace keyed by `(user_id, month)`.
    fn upsert_billing_record(
        &self,
        charge: BillingCharge,
    ) -> impl Future<Output = CoreResult<BillingRecord>> + Send;
    fn find_billing_record(
        &self,
        user_id: i64,
        month: MonthKey,
    ) -> impl Future<Output = CoreResult<Option<BillingRecord>>> + Send;
    fn list_billing_for_month(
        &self,
        month: MonthKey,
    ) -> impl Future<Output = CoreResult<Vec<BillingRecord>>> + Send;
    fn count_billing_by_status(
        &self,
        status: BillingStatus,
    ) -> impl Future<Output = CoreResult<u64>> + Send;
    /// Most recent `paid` records by payment date.
    fn recent_paid_billing(
        &self,
        limit: u32,
    ) -> impl Future<Output = CoreResult<Vec<BillingRecord>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait ClientRepository: Send + Sync {
    /// `Conflict` when the document already exists in this organization.
    fn insert_client(
        &self,
        org_id: i64,
        input: NewClient,
    ) -> impl Future<Output = CoreResult<Client>> + Send;
    fn find_client(&self, org_id: i64, id: i64) -> impl Future<Output = CoreResult<Client>> + Send;
    fn list_clients(&self, org_id: i64) -> impl Future<Output = CoreResult<Vec<Client>>> + Send;
}

pub trait LoanRepository: Send + Sync {
    /// `NotFound` when the client is not in this organization.
    fn insert_loan(
        &self,
        org_id: i64,
        input: NewLoan,
    ) -> impl Future<Output = CoreResult<Loan>> + Send;
    fn find_loan(&self, org_id: i64, id: i64) -> impl Future<Output = CoreResult<Loan>> + Send;
    /// Newest loan date first.
    fn list_loans(&self, org_id: i64) -> impl Future<Output = CoreResult<Vec<Loan>>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    fn sum_payments(
        &self,
        org_id: i64,
        loan_id: i64,
    ) -> impl Future<Output = CoreResult<Decimal>> + Send;
    /// Newest payment date first.
    fn list_loan_payments(
        &self,
        org_id: i64,
        loan_id: i64,
    ) -> impl Future<Output = CoreResult<Vec<Payment>>> + Send;
    fn list_payments(&self, org_id: i64) -> impl Future<Output = CoreResult<Vec<Payment>>> + Send;
    /// Inserts the payment and settles the loan atomically: the running
    /// total is read and the status written inside the same transaction.
    fn record_payment(
        &self,
        org_id: i64,
        input: NewPayment,
    ) -> impl Future<Output = CoreResult<PaymentReceipt>> + Send;
}

/// Everything the services need from the ledger store.
pub trait LedgerStore:
    OrganizationRepository
    + UserRepository
    + BillingRepository
    + ClientRepository
    + LoanRepository
    + PaymentRepository
{
}

impl<T> LedgerStore for T where
    T: OrganizationRepository
        + UserRepository
        + BillingRepository
        + ClientRepository
        + LoanRepository
        + PaymentRepository
{
}
