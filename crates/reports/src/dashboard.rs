//! Dashboard statistics for one organization.

use chrono::{DateTime, NaiveDate, Utc};
use lendbook_core::loan::is_overdue;
use lendbook_core::money::format_minor;
use lendbook_core::{Currency, DateWindow, Loan, Payment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::exporters::ReportData;

/// Headline numbers and the two due-date lists of the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub as_of: NaiveDate,
    /// Principal of active loans
    pub total_lent: Decimal,
    /// Total (principal + interest) of active loans
    pub total_to_receive: Decimal,
    /// Every payment received, regardless of loan status
    pub total_received: Decimal,
    /// Distinct clients with at least one overdue loan
    pub overdue_client_count: usize,
    /// Active loans due in `[as_of, as_of + upcoming_days]`, by due date
    pub upcoming_loans: Vec<Loan>,
    /// Active loans with `due_date < as_of`, by due date
    pub overdue_loans: Vec<Loan>,
}

/// Computes dashboard stats. Loans and payments of other organizations are ignored.
pub fn dashboard_stats(
    loans: &[Loan],
    payments: &[Payment],
    as_of: NaiveDate,
    org_id: i64,
    upcoming_days: u32,
    window: &dyn DateWindow,
) -> DashboardStats {
    let horizon = window.days_after(as_of, upcoming_days);
    let active: Vec<&Loan> = loans
        .iter()
        .filter(|l| l.organization_id == org_id && l.is_active())
        .collect();

    let mut upcoming: Vec<Loan> = active
        .iter()
        .filter(|l| l.due_date >= as_of && l.due_date <= horizon)
        .map(|l| (*l).clone())
        .collect();
    upcoming.sort_by_key(|l| (l.due_date, l.id));

    let mut overdue: Vec<Loan> = active
        .iter()
        .filter(|l| is_overdue(l, as_of))
        .map(|l| (*l).clone())
        .collect();
    overdue.sort_by_key(|l| (l.due_date, l.id));

    let overdue_clients: BTreeSet<i64> = overdue.iter().map(|l| l.client_id).collect();

    DashboardStats {
        as_of,
        total_lent: active.iter().map(|l| l.amount).sum(),
        total_to_receive: active.iter().map(|l| l.total_amount).sum(),
        total_received: payments
            .iter()
            .filter(|p| p.organization_id == org_id)
            .map(|p| p.amount)
            .sum(),
        overdue_client_count: overdue_clients.len(),
        upcoming_loans: upcoming,
        overdue_loans: overdue,
    }
}

// ============================================================================
// Dashboard Report
// ============================================================================

/// Dashboard with client names resolved, ready for export
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub title: String,
    pub stats: DashboardStats,
    pub client_names: BTreeMap<i64, String>,
    #[serde(skip)]
    pub currency: Currency,
    pub generated_at: DateTime<Utc>,
}

impl DashboardReport {
    pub fn new(title: &str, stats: DashboardStats, client_names: BTreeMap<i64, String>) -> Self {
        Self {
            title: title.to_string(),
            stats,
            client_names,
            currency: Currency::default(),
            generated_at: Utc::now(),
        }
    }

    pub fn client_name(&self, client_id: i64) -> &str {
        self.client_names
            .get(&client_id)
            .map(String::as_str)
            .unwrap_or("?")
    }

    fn loan_row(&self, kind: &str, loan: &Loan) -> Vec<String> {
        let days = (loan.due_date - self.stats.as_of).num_days();
        vec![
            kind.to_string(),
            loan.id.to_string(),
            self.client_name(loan.client_id).to_string(),
            loan.due_date.to_string(),
            format_minor(loan.total_amount),
            days.to_string(),
        ]
    }
}

impl ReportData for DashboardReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        ["Kind", "Loan", "Client", "Due Date", "Total", "Days"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let overdue = self.stats.overdue_loans.iter().map(|l| self.loan_row("overdue", l));
        let upcoming = self.stats.upcoming_loans.iter().map(|l| self.loan_row("upcoming", l));
        overdue.chain(upcoming).collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("As Of".to_string(), self.stats.as_of.to_string()),
            ("Total Lent".to_string(), self.currency.format(self.stats.total_lent)),
            ("Total To Receive".to_string(), self.currency.format(self.stats.total_to_receive)),
            ("Total Received".to_string(), self.currency.format(self.stats.total_received)),
            ("Overdue Clients".to_string(), self.stats.overdue_client_count.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{loan, payment, ORG};
    use lendbook_core::{CalendarWindow, LoanStatus};
    use rust_decimal_macros::dec;

    /// Window where every day span is doubled
    struct DoubledDays;

    impl DateWindow for DoubledDays {
        fn month_start(&self, date: NaiveDate) -> NaiveDate {
            CalendarWindow.month_start(date)
        }

        fn months_back(&self, date: NaiveDate, months: u32) -> NaiveDate {
            CalendarWindow.months_back(date, months)
        }

        fn days_after(&self, date: NaiveDate, days: u32) -> NaiveDate {
            CalendarWindow.days_after(date, days * 2)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book() -> (Vec<Loan>, Vec<Payment>) {
        let as_of = date(2024, 6, 15);
        let mut paid = loan(5, 3, dec!(900), date(2024, 4, 1), date(2024, 5, 1));
        paid.status = LoanStatus::Paid;
        let mut foreign = loan(6, 9, dec!(5000), date(2024, 6, 1), as_of);
        foreign.organization_id = ORG + 1;

        let mut with_interest = loan(4, 2, dec!(200), date(2024, 6, 1), date(2024, 6, 22));
        with_interest.total_amount = dec!(220);

        let loans = vec![
            loan(1, 1, dec!(1000), date(2024, 5, 1), date(2024, 6, 14)), // overdue by one day
            loan(2, 1, dec!(300), date(2024, 5, 2), date(2024, 6, 1)),   // same client, overdue
            loan(3, 2, dec!(400), date(2024, 6, 1), as_of),              // due today: upcoming
            with_interest,                                               // exactly 7 days out
            paid,
            foreign,
        ];
        let mut foreign_payment = payment(6, dec!(999), date(2024, 6, 2));
        foreign_payment.organization_id = ORG + 1;
        let payments = vec![
            payment(1, dec!(100), date(2024, 6, 1)),
            payment(5, dec!(900), date(2024, 5, 1)),
            foreign_payment,
        ];
        (loans, payments)
    }

    #[test]
    fn test_dashboard_totals() {
        let (loans, payments) = book();
        let stats = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 7, &CalendarWindow);

        assert_eq!(stats.total_lent, dec!(1900));
        assert_eq!(stats.total_to_receive, dec!(1920));
        assert_eq!(stats.total_received, dec!(1000));
    }

    #[test]
    fn test_overdue_counts_distinct_clients() {
        let (loans, payments) = book();
        let stats = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 7, &CalendarWindow);

        let overdue: Vec<i64> = stats.overdue_loans.iter().map(|l| l.id).collect();
        assert_eq!(overdue, vec![2, 1]);
        assert_eq!(stats.overdue_client_count, 1);
    }

    #[test]
    fn test_upcoming_window_inclusive() {
        let (loans, payments) = book();
        let stats = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 7, &CalendarWindow);
        let upcoming: Vec<i64> = stats.upcoming_loans.iter().map(|l| l.id).collect();
        assert_eq!(upcoming, vec![3, 4]);

        let narrow = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 6, &CalendarWindow);
        assert_eq!(narrow.upcoming_loans.len(), 1);
    }

    #[test]
    fn test_upcoming_horizon_follows_window() {
        let (loans, payments) = book();
        // 4 days doubled reaches loan 4, due 7 days out
        let stats = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 4, &DoubledDays);
        let upcoming: Vec<i64> = stats.upcoming_loans.iter().map(|l| l.id).collect();
        assert_eq!(upcoming, vec![3, 4]);
    }

    #[test]
    fn test_dashboard_report_rows() {
        let (loans, payments) = book();
        let stats = dashboard_stats(&loans, &payments, date(2024, 6, 15), ORG, 7, &CalendarWindow);
        let names = BTreeMap::from([(1, "Maria".to_string()), (2, "João".to_string())]);
        let report = DashboardReport::new("Dashboard", stats, names);

        let rows = report.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], "overdue");
        assert_eq!(rows[0][2], "Maria");
        assert_eq!(rows[0][5], "-14");
        assert_eq!(rows[3][4], "220.00");
    }
}
