//! Platform billing - monthly fees charged to each organization's users
//!
//! All operations here are master-only. Marking a month paid is an upsert,
//! so repeating it is harmless; the batch variant commits each user on its
//! own and reports failures instead of rolling back the successes.

use chrono::NaiveDate;
use lendbook_core::{
    plan_paid_charge, BatchFailure, BatchOutcome, BillingRecord, BillingRepository, BillingStatus,
    Chargeability, MonthKey, OrganizationRepository, OrganizationSummary, RequestContext, User,
    UserRepository, LEGACY_DEFAULT_MONTHLY_FEE,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;

/// Number of paid records shown in the overview
const RECENT_PAID_LIMIT: u32 = 10;

/// One billable user and where they stand for the month
#[derive(Debug, Clone, Serialize)]
pub struct UserBillingLine {
    pub user: User,
    pub organization_name: String,
    /// `None` when nothing was recorded for the month yet
    pub status: Option<BillingStatus>,
    pub payment_date: Option<NaiveDate>,
    pub chargeability: Chargeability,
}

impl UserBillingLine {
    pub fn is_paid(&self) -> bool {
        self.status == Some(BillingStatus::Paid)
    }
}

/// Master billing screen
#[derive(Debug, Clone, Serialize)]
pub struct BillingOverview {
    pub month: MonthKey,
    pub organizations: Vec<OrganizationSummary>,
    pub users: Vec<UserBillingLine>,
    /// Sum of paid amounts recorded for the month
    pub month_revenue: Decimal,
    pub overdue_count: u64,
    pub recent_paid: Vec<BillingRecord>,
}

/// Billing Service - platform fees, master only
pub struct BillingService<'a, S> {
    services: &'a ServiceContext<S>,
}

impl<'a, S> BillingService<'a, S> {
    pub fn new(services: &'a ServiceContext<S>) -> Self {
        Self { services }
    }
}

impl<'a, S> BillingService<'a, S>
where
    S: OrganizationRepository + UserRepository + BillingRepository,
{
    /// Mark one user's month as paid.
    ///
    /// `month` defaults to the month containing `as_of`. Fails with
    /// `NotYetChargeable` when the user's billing starts after the month,
    /// `Forbidden` when the target is a master account.
    #[tracing::instrument(skip(self, ctx), fields(caller = ctx.user_id))]
    pub async fn mark_paid(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        month: Option<MonthKey>,
        as_of: NaiveDate,
    ) -> BusinessResult<BillingRecord> {
        ctx.require_master()?;
        let month = month.unwrap_or_else(|| MonthKey::from_date(as_of));
        let store = self.services.store();

        let user = store.find_user(user_id).await?;
        let charge = plan_paid_charge(&user, month, as_of)?;
        let record = store.upsert_billing_record(charge).await?;

        info!(user_id, %month, amount = %record.amount, "month marked paid");
        Ok(record)
    }

    /// Mark every chargeable, unpaid user as paid for `month`.
    ///
    /// Each row is its own store write; a failure is logged, collected in
    /// the outcome and does not undo the rows already written.
    #[tracing::instrument(skip(self, ctx), fields(caller = ctx.user_id))]
    pub async fn mark_all_paid_for_month(
        &self,
        ctx: &RequestContext,
        month: MonthKey,
        as_of: NaiveDate,
    ) -> BusinessResult<BatchOutcome> {
        ctx.require_master()?;
        let store = self.services.store();
        let month_start = month.first_day();

        let candidates: Vec<User> = store
            .list_unpaid_users(month)
            .await?
            .into_iter()
            .filter(|u| Chargeability::of(u, month_start) == Chargeability::Active)
            .collect();

        let mut outcome = BatchOutcome::new(month);
        for user in &candidates {
            let written = match plan_paid_charge(user, month, as_of) {
                Ok(charge) => store.upsert_billing_record(charge).await,
                Err(err) => Err(err),
            };
            match written {
                Ok(_) => outcome.marked.push(user.id),
                Err(err) => {
                    warn!(user_id = user.id, %month, error = %err, "failed to mark month paid");
                    outcome.failed.push(BatchFailure {
                        user_id: user.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            %month,
            candidates = candidates.len(),
            marked = outcome.marked_count(),
            failed = outcome.failed.len(),
            "batch mark paid finished"
        );
        Ok(outcome)
    }

    /// Organizations, billable users and the month's billing position
    pub async fn overview(
        &self,
        ctx: &RequestContext,
        month: Option<MonthKey>,
        as_of: NaiveDate,
    ) -> BusinessResult<BillingOverview> {
        ctx.require_master()?;
        let month = month.unwrap_or_else(|| MonthKey::from_date(as_of));
        let month_start = month.first_day();
        let store = self.services.store();

        let organizations = store.list_organizations().await?;
        let org_names: HashMap<i64, &str> = organizations
            .iter()
            .map(|s| (s.organization.id, s.organization.name.as_str()))
            .collect();

        let records = store.list_billing_for_month(month).await?;
        let by_user: HashMap<i64, &BillingRecord> =
            records.iter().map(|r| (r.user_id, r)).collect();

        let users = store
            .list_billable_users()
            .await?
            .into_iter()
            .map(|user| {
                let record = by_user.get(&user.id);
                UserBillingLine {
                    organization_name: org_names
                        .get(&user.organization_id)
                        .map(|n| n.to_string())
                        .unwrap_or_default(),
                    status: record.map(|r| r.status),
                    payment_date: record.and_then(|r| r.payment_date),
                    chargeability: Chargeability::of(&user, month_start),
                    user,
                }
            })
            .collect();

        let month_revenue = records
            .iter()
            .filter(|r| r.status == BillingStatus::Paid)
            .map(|r| r.amount)
            .sum();

        let overdue_count = store.count_billing_by_status(BillingStatus::Overdue).await?;
        let recent_paid = store.recent_paid_billing(RECENT_PAID_LIMIT).await?;

        Ok(BillingOverview {
            month,
            organizations,
            users,
            month_revenue,
            overdue_count,
            recent_paid,
        })
    }

    #[tracing::instrument(skip(self, ctx), fields(caller = ctx.user_id))]
    pub async fn update_monthly_fee(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        fee: Decimal,
    ) -> BusinessResult<User> {
        ctx.require_master()?;
        if fee <= Decimal::ZERO {
            return Err(BusinessError::invalid("monthly fee must be positive"));
        }
        let user = self.services.store().update_monthly_fee(user_id, fee).await?;
        info!(user_id, fee = %user.monthly_fee, "monthly fee updated");
        Ok(user)
    }

    /// Move every user still on the legacy default fee to `standard_fee`.
    /// Returns the number of users changed.
    #[tracing::instrument(skip(self, ctx), fields(caller = ctx.user_id))]
    pub async fn migrate_legacy_fees(
        &self,
        ctx: &RequestContext,
        standard_fee: Decimal,
    ) -> BusinessResult<u64> {
        ctx.require_master()?;
        if standard_fee <= Decimal::ZERO {
            return Err(BusinessError::invalid("standard fee must be positive"));
        }
        let changed = self
            .services
            .store()
            .replace_monthly_fee(LEGACY_DEFAULT_MONTHLY_FEE, standard_fee)
            .await?;
        info!(changed, fee = %standard_fee, "legacy fees migrated");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::{DateTime, Utc};
    use lendbook_core::{
        BillingCharge, CoreError, CoreResult, NewUser, Organization, UserRole,
        MASTER_ORGANIZATION_ID,
    };
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(0, 0).unwrap()
    }

    fn user(id: i64, start_date: Option<NaiveDate>) -> User {
        User {
            id,
            username: format!("user{id}"),
            password_hash: String::new(),
            role: UserRole::User,
            organization_id: id,
            monthly_fee: dec!(200.00),
            start_date,
            created_at: epoch(),
        }
    }

    /// In-memory store whose billing upsert fails for one user
    struct FlakyStore {
        users: Vec<User>,
        fail_for: i64,
        records: Mutex<Vec<BillingRecord>>,
    }

    impl FlakyStore {
        fn new(users: Vec<User>, fail_for: i64) -> Self {
            Self {
                users,
                fail_for,
                records: Mutex::new(Vec::new()),
            }
        }

        fn paid_users(&self) -> Vec<i64> {
            let records = self.records.lock().unwrap();
            records.iter().map(|r| r.user_id).collect()
        }
    }

    impl OrganizationRepository for FlakyStore {
        async fn find_or_create_organization(&self, name: &str) -> CoreResult<Organization> {
            Ok(Organization {
                id: 1,
                name: name.to_string(),
                created_at: epoch(),
            })
        }

        async fn find_organization(&self, id: i64) -> CoreResult<Organization> {
            Err(CoreError::not_found("Organization", id))
        }

        async fn list_organizations(&self) -> CoreResult<Vec<OrganizationSummary>> {
            Ok(Vec::new())
        }
    }

    impl UserRepository for FlakyStore {
        async fn create_user(&self, _input: NewUser) -> CoreResult<User> {
            Err(CoreError::Store("read only".to_string()))
        }

        async fn find_user(&self, id: i64) -> CoreResult<User> {
            self.users
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("User", id))
        }

        async fn find_user_by_username(&self, username: &str) -> CoreResult<Option<User>> {
            Ok(self.users.iter().find(|u| u.username == username).cloned())
        }

        async fn update_monthly_fee(&self, id: i64, _fee: Decimal) -> CoreResult<User> {
            self.find_user(id).await
        }

        async fn list_billable_users(&self) -> CoreResult<Vec<User>> {
            Ok(self.users.clone())
        }

        async fn list_unpaid_users(&self, _month: MonthKey) -> CoreResult<Vec<User>> {
            let paid = self.paid_users();
            Ok(self
                .users
                .iter()
                .filter(|u| !paid.contains(&u.id))
                .cloned()
                .collect())
        }

        async fn replace_monthly_fee(&self, _legacy: Decimal, _new: Decimal) -> CoreResult<u64> {
            Ok(0)
        }

        async fn delete_user_cascade(&self, _id: i64) -> CoreResult<()> {
            Ok(())
        }
    }

    impl BillingRepository for FlakyStore {
        async fn upsert_billing_record(&self, charge: BillingCharge) -> CoreResult<BillingRecord> {
            if charge.user_id == self.fail_for {
                return Err(CoreError::Store("disk I/O error".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let record = BillingRecord {
                id: records.len() as i64 + 1,
                user_id: charge.user_id,
                month: charge.month,
                amount: charge.amount,
                payment_date: Some(charge.payment_date),
                status: charge.status,
                start_date: charge.start_date,
                created_at: epoch(),
            };
            records.push(record.clone());
            Ok(record)
        }

        async fn find_billing_record(
            &self,
            user_id: i64,
            month: MonthKey,
        ) -> CoreResult<Option<BillingRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .find(|r| r.user_id == user_id && r.month == month)
                .cloned())
        }

        async fn list_billing_for_month(&self, month: MonthKey) -> CoreResult<Vec<BillingRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|r| r.month == month).cloned().collect())
        }

        async fn count_billing_by_status(&self, status: BillingStatus) -> CoreResult<u64> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|r| r.status == status).count() as u64)
        }

        async fn recent_paid_billing(&self, limit: u32) -> CoreResult<Vec<BillingRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().rev().take(limit as usize).cloned().collect())
        }
    }

    fn master() -> RequestContext {
        RequestContext::new(99, UserRole::Master, MASTER_ORGANIZATION_ID)
    }

    #[tokio::test]
    async fn test_batch_keeps_committed_rows_when_one_fails() {
        let users = vec![user(1, None), user(2, None), user(3, None)];
        let services = ServiceContext::new(FlakyStore::new(users, 2));
        let month = MonthKey::new(2024, 5).unwrap();

        let outcome = services
            .billing()
            .mark_all_paid_for_month(&master(), month, date(2024, 5, 10))
            .await
            .unwrap();

        assert_eq!(outcome.marked, vec![1, 3]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].user_id, 2);
        assert!(!outcome.is_complete());
        assert_eq!(services.store().paid_users(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_batch_skips_future_users() {
        let users = vec![user(1, None), user(2, Some(date(2024, 6, 1)))];
        let services = ServiceContext::new(FlakyStore::new(users, -1));
        let month = MonthKey::new(2024, 5).unwrap();

        let outcome = services
            .billing()
            .mark_all_paid_for_month(&master(), month, date(2024, 5, 10))
            .await
            .unwrap();

        assert_eq!(outcome.marked, vec![1]);
        assert!(outcome.is_complete());
    }

    #[tokio::test]
    async fn test_mark_paid_defaults_to_current_month() {
        let services = ServiceContext::new(FlakyStore::new(vec![user(1, None)], -1));
        let record = services
            .billing()
            .mark_paid(&master(), 1, None, date(2024, 7, 15))
            .await
            .unwrap();
        assert_eq!(record.month, MonthKey::new(2024, 7).unwrap());
        assert_eq!(record.payment_date, Some(date(2024, 7, 15)));
    }

    #[tokio::test]
    async fn test_mark_paid_not_yet_chargeable() {
        let services = ServiceContext::new(FlakyStore::new(vec![user(1, Some(date(2024, 8, 1)))], -1));
        let err = services
            .billing()
            .mark_paid(&master(), 1, MonthKey::new(2024, 7).ok(), date(2024, 7, 15))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotYetChargeable);
    }

    #[tokio::test]
    async fn test_billing_requires_master() {
        let services = ServiceContext::new(FlakyStore::new(vec![user(1, None)], -1));
        let tenant = RequestContext::new(1, UserRole::User, 1);
        let err = services
            .billing()
            .mark_paid(&tenant, 1, None, date(2024, 7, 15))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_update_fee_must_be_positive() {
        let services = ServiceContext::new(FlakyStore::new(vec![user(1, None)], -1));
        let err = services
            .billing()
            .update_monthly_fee(&master(), 1, Decimal::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_overview_status_and_revenue() {
        let users = vec![user(1, None), user(2, None), user(3, Some(date(2024, 6, 1)))];
        let services = ServiceContext::new(FlakyStore::new(users, -1));
        let month = MonthKey::new(2024, 5).unwrap();
        services
            .billing()
            .mark_paid(&master(), 1, Some(month), date(2024, 5, 3))
            .await
            .unwrap();

        let overview = services
            .billing()
            .overview(&master(), Some(month), date(2024, 5, 20))
            .await
            .unwrap();

        assert_eq!(overview.month_revenue, dec!(200.00));
        assert!(overview.users[0].is_paid());
        assert_eq!(overview.users[1].status, None);
        assert_eq!(overview.users[2].chargeability, Chargeability::Future);
        assert_eq!(overview.overdue_count, 0);
        assert_eq!(overview.recent_paid.len(), 1);
    }
}
