//! Repository implementations cho SQLite
//!
//! Các truy vấn trên từng bảng. Mọi truy vấn vào clients/loans/payments
//! đều lọc theo `organization_id`.

use crate::error::{PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use chrono::{NaiveDate, Utc};
use lendbook_core::loan::settle_status;
use lendbook_core::money::sum_amounts;
use lendbook_core::{
    BillingCharge, BillingRecord, BillingStatus, Client, Loan, LoanStatus, MonthKey, NewClient,
    NewLoan, NewPayment, NewUser, Organization, OrganizationSummary, Payment, PaymentReceipt,
    User, UserRole, MASTER_ORGANIZATION_ID, MASTER_ORGANIZATION_NAME,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;

// ============================================================================
// Organization Repository
// ============================================================================

/// Repository cho organizations table
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Lấy organization theo ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> PersistenceResult<Organization> {
        sqlx::query_as::<_, OrganizationRow>("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Organization::from)
            .ok_or_else(|| PersistenceError::not_found("Organization", id))
    }

    /// Tìm theo tên, tạo mới nếu chưa có
    pub async fn find_or_create(pool: &SqlitePool, name: &str) -> PersistenceResult<Organization> {
        sqlx::query(
            "INSERT INTO organizations (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        sqlx::query_as::<_, OrganizationRow>("SELECT * FROM organizations WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .map(Organization::from)
            .ok_or_else(|| PersistenceError::not_found("Organization", name))
    }

    /// Tất cả organizations (trừ master) kèm số user
    pub async fn list_with_user_counts(
        pool: &SqlitePool,
    ) -> PersistenceResult<Vec<OrganizationSummary>> {
        let rows = sqlx::query_as::<_, OrganizationCountRow>(
            r#"
            SELECT o.id, o.name, o.created_at, COUNT(u.id) AS user_count
            FROM organizations o
            LEFT JOIN users u ON u.organization_id = o.id
            WHERE o.id != ?
            GROUP BY o.id, o.name, o.created_at
            ORDER BY o.name
            "#,
        )
        .bind(MASTER_ORGANIZATION_ID)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(OrganizationSummary::from).collect())
    }
}

// ============================================================================
// User Repository
// ============================================================================

/// Repository cho users table
pub struct UserRepo;

impl UserRepo {
    /// Lấy user theo ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> PersistenceResult<User> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", id))?;
        User::try_from(row)
    }

    /// Lấy user theo username
    pub async fn get_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> PersistenceResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    /// Thêm user mới
    pub async fn insert(pool: &SqlitePool, user: &NewUser) -> PersistenceResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, organization_id, monthly_fee, start_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.organization_id)
        .bind(user.monthly_fee.to_string())
        .bind(user.start_date)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| {
            PersistenceError::on_write(e, &format!("username '{}' already exists", user.username))
        })?;

        Self::get_by_id(pool, result.last_insert_rowid()).await
    }

    /// Cập nhật phí hằng tháng
    pub async fn update_fee(pool: &SqlitePool, id: i64, fee: Decimal) -> PersistenceResult<User> {
        let result = sqlx::query("UPDATE users SET monthly_fee = ? WHERE id = ?")
            .bind(fee.to_string())
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("User", id));
        }
        Self::get_by_id(pool, id).await
    }

    /// User không phải master, theo tên organization rồi username
    pub async fn list_billable(pool: &SqlitePool) -> PersistenceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.*
            FROM users u
            JOIN organizations o ON o.id = u.organization_id
            WHERE u.role != ?
            ORDER BY o.name, u.username
            "#,
        )
        .bind(UserRole::Master.as_str())
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// User không phải master chưa có bản ghi `paid` cho tháng
    pub async fn list_unpaid(pool: &SqlitePool, month: MonthKey) -> PersistenceResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.*
            FROM users u
            LEFT JOIN user_billing b ON b.user_id = u.id AND b.month_year = ?
            WHERE u.role != ? AND (b.id IS NULL OR b.status != ?)
            ORDER BY u.id
            "#,
        )
        .bind(month.to_string())
        .bind(UserRole::Master.as_str())
        .bind(BillingStatus::Paid.as_str())
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// Đổi phí `legacy_fee` thành `new_fee` cho user không phải master.
    ///
    /// So sánh bằng Decimal trong Rust: "29.9" và "29.90" là cùng một phí.
    pub async fn replace_fee(
        pool: &SqlitePool,
        legacy_fee: Decimal,
        new_fee: Decimal,
    ) -> PersistenceResult<u64> {
        let mut tx = pool.begin().await?;
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE role != ?")
            .bind(UserRole::Master.as_str())
            .fetch_all(&mut *tx)
            .await?;

        let mut changed = 0u64;
        for row in rows {
            if parse_decimal("monthly_fee", &row.monthly_fee)? != legacy_fee {
                continue;
            }
            sqlx::query("UPDATE users SET monthly_fee = ? WHERE id = ?")
                .bind(new_fee.to_string())
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            changed += 1;
        }
        tx.commit().await?;
        Ok(changed)
    }

    /// Xóa user, billing của user và toàn bộ dữ liệu nghiệp vụ của organization
    pub async fn delete_cascade(pool: &SqlitePool, id: i64) -> PersistenceResult<()> {
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| PersistenceError::not_found("User", id))?;
        let user = User::try_from(row)?;
        if user.is_master() {
            return Err(PersistenceError::Protected(format!(
                "master user {} cannot be deleted",
                user.username
            )));
        }

        sqlx::query("DELETE FROM user_billing WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for table in ["payments", "loans", "clients"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE organization_id = ?"))
                .bind(user.organization_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Client Repository
// ============================================================================

/// Repository cho clients table
pub struct ClientRepo;

impl ClientRepo {
    /// Lấy client theo ID trong organization
    pub async fn get_by_id(pool: &SqlitePool, org_id: i64, id: i64) -> PersistenceResult<Client> {
        sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await?
            .map(Client::from)
            .ok_or_else(|| PersistenceError::not_found("Client", id))
    }

    /// Tất cả clients của organization, theo tên
    pub async fn get_all(pool: &SqlitePool, org_id: i64) -> PersistenceResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT * FROM clients WHERE organization_id = ? ORDER BY full_name, id",
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Client::from).collect())
    }

    /// Thêm client mới
    pub async fn insert(pool: &SqlitePool, org_id: i64, client: &NewClient) -> PersistenceResult<Client> {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (full_name, document, phone, email, address, organization_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.full_name)
        .bind(&client.document)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(org_id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| {
            PersistenceError::on_write(e, &format!("client document '{}' already exists", client.document))
        })?;

        Self::get_by_id(pool, org_id, result.last_insert_rowid()).await
    }
}

// ============================================================================
// Loan Repository
// ============================================================================

/// Repository cho loans table
pub struct LoanRepo;

impl LoanRepo {
    /// Lấy loan theo ID trong organization
    pub async fn get_by_id(pool: &SqlitePool, org_id: i64, id: i64) -> PersistenceResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = ? AND organization_id = ?")
            .bind(id)
            .bind(org_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Loan", id))?;
        Loan::try_from(row)
    }

    /// Tất cả loans của organization, mới nhất trước
    pub async fn get_all(pool: &SqlitePool, org_id: i64) -> PersistenceResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(
            "SELECT * FROM loans WHERE organization_id = ? ORDER BY loan_date DESC, id DESC",
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// Thêm loan mới; client phải thuộc organization
    pub async fn insert(pool: &SqlitePool, org_id: i64, loan: &NewLoan) -> PersistenceResult<Loan> {
        let mut tx = pool.begin().await?;
        let owned: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM clients WHERE id = ? AND organization_id = ?")
                .bind(loan.client_id)
                .bind(org_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(PersistenceError::not_found("Client", loan.client_id));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO loans (client_id, amount, interest_rate, loan_type, installments,
                               installment_amount, total_amount, loan_date, due_date, status,
                               organization_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(loan.client_id)
        .bind(loan.amount.to_string())
        .bind(loan.interest_rate.to_string())
        .bind(loan.loan_type.as_str())
        .bind(i64::from(loan.terms.installments))
        .bind(loan.terms.installment_amount.to_string())
        .bind(loan.terms.total_amount.to_string())
        .bind(loan.loan_date)
        .bind(loan.terms.due_date)
        .bind(LoanStatus::Active.as_str())
        .bind(org_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Self::get_by_id(pool, org_id, result.last_insert_rowid()).await
    }
}

// ============================================================================
// Payment Repository
// ============================================================================

/// Repository cho payments table
pub struct PaymentRepo;

impl PaymentRepo {
    /// Payments của một loan, mới nhất trước
    pub async fn get_by_loan(
        pool: &SqlitePool,
        org_id: i64,
        loan_id: i64,
    ) -> PersistenceResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT * FROM payments
            WHERE loan_id = ? AND organization_id = ?
            ORDER BY payment_date DESC, id DESC
            "#,
        )
        .bind(loan_id)
        .bind(org_id)
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// Tất cả payments của organization
    pub async fn get_all(pool: &SqlitePool, org_id: i64) -> PersistenceResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE organization_id = ? ORDER BY payment_date DESC, id DESC",
        )
        .bind(org_id)
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// Tổng đã trả cho loan. Cộng bằng Decimal, không dùng SQL SUM trên TEXT.
    pub async fn sum_for_loan(pool: &SqlitePool, org_id: i64, loan_id: i64) -> PersistenceResult<Decimal> {
        let mut conn = pool.acquire().await?;
        Self::sum_on(&mut *conn, org_id, loan_id).await
    }

    async fn sum_on(
        conn: &mut SqliteConnection,
        org_id: i64,
        loan_id: i64,
    ) -> PersistenceResult<Decimal> {
        let amounts: Vec<(String,)> =
            sqlx::query_as("SELECT amount FROM payments WHERE loan_id = ? AND organization_id = ?")
                .bind(loan_id)
                .bind(org_id)
                .fetch_all(&mut *conn)
                .await?;
        let parsed = amounts
            .iter()
            .map(|(a,)| parse_decimal("amount", a))
            .collect::<PersistenceResult<Vec<_>>>()?;
        Ok(sum_amounts(parsed))
    }

    /// Ghi payment và cập nhật trạng thái loan trong cùng một transaction.
    ///
    /// INSERT chạy trước để giữ write lock của SQLite trước khi đọc tổng,
    /// nên hai payment đồng thời không thể cùng đọc một tổng cũ.
    pub async fn record(
        pool: &SqlitePool,
        org_id: i64,
        payment: &NewPayment,
    ) -> PersistenceResult<PaymentReceipt> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO payments (loan_id, amount, payment_type, payment_date, notes, organization_id, created_at)
            SELECT id, ?, ?, ?, ?, organization_id, ?
            FROM loans WHERE id = ? AND organization_id = ?
            "#,
        )
        .bind(payment.amount.to_string())
        .bind(&payment.payment_type)
        .bind(payment.payment_date)
        .bind(&payment.notes)
        .bind(Utc::now())
        .bind(payment.loan_id)
        .bind(org_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Loan", payment.loan_id));
        }
        let payment_id = result.last_insert_rowid();

        let loan_row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = ?")
            .bind(payment.loan_id)
            .fetch_one(&mut *tx)
            .await?;
        let loan = Loan::try_from(loan_row)?;

        let total_paid = Self::sum_on(&mut *tx, org_id, loan.id).await?;
        let status = settle_status(loan.status, loan.total_amount, total_paid);
        if status != loan.status {
            sqlx::query("UPDATE loans SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(loan.id)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE id = ?")
            .bind(payment_id)
            .fetch_one(&mut *tx)
            .await?;
        let recorded = Payment::try_from(row)?;

        tx.commit().await?;

        Ok(PaymentReceipt {
            payment: recorded,
            total_paid,
            remaining: loan.total_amount - total_paid,
            status,
            settled_now: loan.status == LoanStatus::Active && status == LoanStatus::Paid,
        })
    }
}

// ============================================================================
// Billing Repository
// ============================================================================

/// Repository cho user_billing table
pub struct BillingRepo;

impl BillingRepo {
    /// Lấy bản ghi của (user, tháng)
    pub async fn get(
        pool: &SqlitePool,
        user_id: i64,
        month: MonthKey,
    ) -> PersistenceResult<Option<BillingRecord>> {
        let row = sqlx::query_as::<_, BillingRow>(
            "SELECT * FROM user_billing WHERE user_id = ? AND month_year = ?",
        )
        .bind(user_id)
        .bind(month.to_string())
        .fetch_optional(pool)
        .await?;
        row.map(BillingRecord::try_from).transpose()
    }

    /// Upsert (insert hoặc update) theo (user_id, month_year), một câu lệnh
    pub async fn upsert(pool: &SqlitePool, charge: &BillingCharge) -> PersistenceResult<BillingRecord> {
        sqlx::query(
            r#"
            INSERT INTO user_billing (user_id, month_year, amount, payment_date, status, start_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, month_year) DO UPDATE SET
                amount = excluded.amount,
                payment_date = excluded.payment_date,
                status = excluded.status,
                start_date = excluded.start_date
            "#,
        )
        .bind(charge.user_id)
        .bind(charge.month.to_string())
        .bind(charge.amount.to_string())
        .bind(charge.payment_date)
        .bind(charge.status.as_str())
        .bind(charge.start_date)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::get(pool, charge.user_id, charge.month)
            .await?
            .ok_or_else(|| {
                PersistenceError::not_found("Billing", format!("{}:{}", charge.user_id, charge.month))
            })
    }

    /// Tất cả bản ghi của tháng
    pub async fn get_by_month(pool: &SqlitePool, month: MonthKey) -> PersistenceResult<Vec<BillingRecord>> {
        let rows = sqlx::query_as::<_, BillingRow>(
            "SELECT * FROM user_billing WHERE month_year = ? ORDER BY user_id",
        )
        .bind(month.to_string())
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }

    /// Đếm bản ghi theo trạng thái
    pub async fn count_by_status(pool: &SqlitePool, status: BillingStatus) -> PersistenceResult<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_billing WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(pool)
            .await?;
        Ok(row.0.max(0) as u64)
    }

    /// Các bản ghi `paid` gần nhất
    pub async fn recent_paid(pool: &SqlitePool, limit: u32) -> PersistenceResult<Vec<BillingRecord>> {
        let rows = sqlx::query_as::<_, BillingRow>(
            r#"
            SELECT * FROM user_billing
            WHERE status = ?
            ORDER BY payment_date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(BillingStatus::Paid.as_str())
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;
        convert_all(rows)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Khởi tạo database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Chạy migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Tạo database mới với schema
pub async fn init_database(database_url: &str, max_connections: u32) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(database_url, max_connections).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Master user được seed khi khởi tạo
#[derive(Debug, Clone)]
pub struct MasterSeed {
    pub username: String,
    pub password_hash: String,
}

/// Seed master organization (id 0) và master user nếu có. Chạy lại nhiều lần không sao.
pub async fn bootstrap(pool: &SqlitePool, master: Option<&MasterSeed>) -> PersistenceResult<()> {
    sqlx::query(
        "INSERT INTO organizations (id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(MASTER_ORGANIZATION_ID)
    .bind(MASTER_ORGANIZATION_NAME)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    if let Some(seed) = master {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, organization_id, monthly_fee, start_date, created_at)
            VALUES (?, ?, ?, ?, ?, NULL, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(&seed.username)
        .bind(&seed.password_hash)
        .bind(UserRole::Master.as_str())
        .bind(MASTER_ORGANIZATION_ID)
        .bind(Decimal::ZERO.to_string())
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }
    Ok(())
}
