//! Dashboard Service - reporting views over one organization's loan book

use chrono::NaiveDate;
use lendbook_core::{ClientRepository, LoanRepository, PaymentRepository, RequestContext};
use lendbook_reports::{
    dashboard_stats, monthly_activity, monthly_profit, ActivitySeries, DashboardReport,
    MonthlyProfit,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::BusinessResult;
use crate::services::ServiceContext;

pub struct DashboardService<'a, S> {
    services: &'a ServiceContext<S>,
}

impl<'a, S> DashboardService<'a, S> {
    pub fn new(services: &'a ServiceContext<S>) -> Self {
        Self { services }
    }
}

impl<'a, S> DashboardService<'a, S>
where
    S: ClientRepository + LoanRepository + PaymentRepository,
{
    /// Headline totals with overdue and upcoming loans, client names resolved
    pub async fn dashboard(&self, ctx: &RequestContext, as_of: NaiveDate) -> BusinessResult<DashboardReport> {
        let org_id = ctx.require_tenant()?;
        let book = self.services.lending().loan_book(ctx).await?;
        let upcoming_days = self.services.settings().upcoming_window_days;

        let stats = dashboard_stats(
            &book.loans,
            &book.payments,
            as_of,
            org_id,
            upcoming_days,
            self.services.window(),
        );
        let client_names: BTreeMap<i64, String> = book
            .clients
            .into_iter()
            .map(|c| (c.id, c.full_name))
            .collect();

        debug!(
            org_id,
            overdue = stats.overdue_loans.len(),
            upcoming = stats.upcoming_loans.len(),
            "dashboard computed"
        );
        Ok(DashboardReport::new("Dashboard", stats, client_names))
    }

    /// Lent vs received per month, newest first
    pub async fn profit(&self, ctx: &RequestContext) -> BusinessResult<Vec<MonthlyProfit>> {
        let book = self.services.lending().loan_book(ctx).await?;
        Ok(monthly_profit(&book.loans, &book.payments))
    }

    /// Trailing per-month activity; `months` defaults to the configured window
    pub async fn activity(
        &self,
        ctx: &RequestContext,
        as_of: NaiveDate,
        months: Option<u32>,
    ) -> BusinessResult<ActivitySeries> {
        let book = self.services.lending().loan_book(ctx).await?;
        let months = months.unwrap_or(self.services.settings().activity_months);
        Ok(monthly_activity(
            &book.loans,
            &book.payments,
            as_of,
            months,
            self.services.window(),
        ))
    }
}
