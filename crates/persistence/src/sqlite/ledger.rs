//! `SqliteLedger` - implementation của các repository trait trong core.
//!
//! Mỏng: mỗi method gọi repo tương ứng rồi quy lỗi về `CoreError`.

use crate::error::PersistenceResult;
use crate::sqlite::repos::*;
use lendbook_core::{
    BillingCharge, BillingRecord, BillingRepository, BillingStatus, Client, ClientRepository,
    CoreResult, Loan, LoanRepository, MonthKey, NewClient, NewLoan, NewPayment, NewUser,
    Organization, OrganizationRepository, OrganizationSummary, Payment, PaymentReceipt,
    PaymentRepository, User, UserRepository,
};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Ledger store trên SQLite. Clone rẻ (chỉ clone pool).
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mở database, chạy migrations và seed master organization
    pub async fn open(database_url: &str, max_connections: u32) -> PersistenceResult<Self> {
        let pool = init_database(database_url, max_connections).await?;
        bootstrap(&pool, None).await?;
        Ok(Self { pool })
    }

    /// Database trong bộ nhớ, một connection (mỗi connection `:memory:` là một DB riêng)
    pub async fn in_memory() -> PersistenceResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        run_migrations(&pool).await?;
        bootstrap(&pool, None).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrganizationRepository for SqliteLedger {
    async fn find_or_create_organization(&self, name: &str) -> CoreResult<Organization> {
        Ok(OrganizationRepo::find_or_create(&self.pool, name).await?)
    }

    async fn find_organization(&self, id: i64) -> CoreResult<Organization> {
        Ok(OrganizationRepo::get_by_id(&self.pool, id).await?)
    }

    async fn list_organizations(&self) -> CoreResult<Vec<OrganizationSummary>> {
        Ok(OrganizationRepo::list_with_user_counts(&self.pool).await?)
    }
}

impl UserRepository for SqliteLedger {
    async fn create_user(&self, input: NewUser) -> CoreResult<User> {
        Ok(UserRepo::insert(&self.pool, &input).await?)
    }

    async fn find_user(&self, id: i64) -> CoreResult<User> {
        Ok(UserRepo::get_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
        Ok(UserRepo::get_by_username(&self.pool, username).await?)
    }

    async fn update_monthly_fee(&self, id: i64, fee: Decimal) -> CoreResult<User> {
        Ok(UserRepo::update_fee(&self.pool, id, fee).await?)
    }

    async fn list_billable_users(&self) -> CoreResult<Vec<User>> {
        Ok(UserRepo::list_billable(&self.pool).await?)
    }

    async fn list_unpaid_users(&self, month: MonthKey) -> CoreResult<Vec<User>> {
        Ok(UserRepo::list_unpaid(&self.pool, month).await?)
    }

    async fn replace_monthly_fee(&self, legacy_fee: Decimal, new_fee: Decimal) -> CoreResult<u64> {
        Ok(UserRepo::replace_fee(&self.pool, legacy_fee, new_fee).await?)
    }

    async fn delete_user_cascade(&self, id: i64) -> CoreResult<()> {
        Ok(UserRepo::delete_cascade(&self.pool, id).await?)
    }
}

impl BillingRepository for SqliteLedger {
    async fn upsert_billing_record(&self, charge: BillingCharge) -> CoreResult<BillingRecord> {
        Ok(BillingRepo::upsert(&self.pool, &charge).await?)
    }

    async fn find_billing_record(
        &self,
        user_id: i64,
        month: MonthKey,
    ) -> CoreResult<Option<BillingRecord>> {
        Ok(BillingRepo::get(&self.pool, user_id, month).await?)
    }

    async fn list_billing_for_month(&self, month: MonthKey) -> CoreResult<Vec<BillingRecord>> {
        Ok(BillingRepo::get_by_month(&self.pool, month).await?)
    }

    async fn count_billing_by_status(&self, status: BillingStatus) -> CoreResult<u64> {
        Ok(BillingRepo::count_by_status(&self.pool, status).await?)
    }

    async fn recent_paid_billing(&self, limit: u32) -> CoreResult<Vec<BillingRecord>> {
        Ok(BillingRepo::recent_paid(&self.pool, limit).await?)
    }
}

impl ClientRepository for SqliteLedger {
    async fn insert_client(&self, org_id: i64, input: NewClient) -> CoreResult<Client> {
        Ok(ClientRepo::insert(&self.pool, org_id, &input).await?)
    }

    async fn find_client(&self, org_id: i64, id: i64) -> CoreResult<Client> {
        Ok(ClientRepo::get_by_id(&self.pool, org_id, id).await?)
    }

    async fn list_clients(&self, org_id: i64) -> CoreResult<Vec<Client>> {
        Ok(ClientRepo::get_all(&self.pool, org_id).await?)
    }
}

impl LoanRepository for SqliteLedger {
    async fn insert_loan(&self, org_id: i64, input: NewLoan) -> CoreResult<Loan> {
        Ok(LoanRepo::insert(&self.pool, org_id, &input).await?)
    }

    async fn find_loan(&self, org_id: i64, id: i64) -> CoreResult<Loan> {
        Ok(LoanRepo::get_by_id(&self.pool, org_id, id).await?)
    }

    async fn list_loans(&self, org_id: i64) -> CoreResult<Vec<Loan>> {
        Ok(LoanRepo::get_all(&self.pool, org_id).await?)
    }
}

impl PaymentRepository for SqliteLedger {
    async fn sum_payments(&self, org_id: i64, loan_id: i64) -> CoreResult<Decimal> {
        Ok(PaymentRepo::sum_for_loan(&self.pool, org_id, loan_id).await?)
    }

    async fn list_loan_payments(&self, org_id: i64, loan_id: i64) -> CoreResult<Vec<Payment>> {
        Ok(PaymentRepo::get_by_loan(&self.pool, org_id, loan_id).await?)
    }

    async fn list_payments(&self, org_id: i64) -> CoreResult<Vec<Payment>> {
        Ok(PaymentRepo::get_all(&self.pool, org_id).await?)
    }

    async fn record_payment(&self, org_id: i64, input: NewPayment) -> CoreResult<PaymentReceipt> {
        Ok(PaymentRepo::record(&self.pool, org_id, &input).await?)
    }
}
