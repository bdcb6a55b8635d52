//! Trailing monthly activity: what was lent and received each month.
//!
//! This is the chart feed of the dashboard. The window starts at
//! `window.months_back(as_of, months)` and includes everything dated on or
//! after that day up to `as_of`.

use chrono::NaiveDate;
use lendbook_core::money::format_minor;
use lendbook_core::{DateWindow, Loan, MonthKey, Payment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::exporters::ReportData;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthActivity {
    pub loan_total: Decimal,
    pub loan_count: usize,
    pub payment_total: Decimal,
}

/// Activity per month, ascending
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySeries {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub months: Vec<(MonthKey, MonthActivity)>,
}

impl ActivitySeries {
    pub fn get(&self, month: MonthKey) -> Option<&MonthActivity> {
        self.months
            .iter()
            .find(|(key, _)| *key == month)
            .map(|(_, activity)| activity)
    }
}

pub fn monthly_activity(
    loans: &[Loan],
    payments: &[Payment],
    as_of: NaiveDate,
    months: u32,
    window: &dyn DateWindow,
) -> ActivitySeries {
    let since = window.months_back(as_of, months);
    let in_window = |d: NaiveDate| d >= since && d <= as_of;

    let mut by_month: BTreeMap<MonthKey, MonthActivity> = BTreeMap::new();
    for loan in loans.iter().filter(|l| in_window(l.loan_date)) {
        let entry = by_month.entry(MonthKey::from_date(loan.loan_date)).or_default();
        entry.loan_total += loan.amount;
        entry.loan_count += 1;
    }
    for payment in payments.iter().filter(|p| in_window(p.payment_date)) {
        by_month
            .entry(MonthKey::from_date(payment.payment_date))
            .or_default()
            .payment_total += payment.amount;
    }

    ActivitySeries {
        since,
        until: as_of,
        months: by_month.into_iter().collect(),
    }
}

impl ReportData for ActivitySeries {
    fn title(&self) -> &str {
        "Monthly Activity"
    }

    fn headers(&self) -> Vec<String> {
        ["Month", "Lent", "Loans", "Received"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.months
            .iter()
            .map(|(key, a)| {
                vec![
                    key.to_string(),
                    format_minor(a.loan_total),
                    a.loan_count.to_string(),
                    format_minor(a.payment_total),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        vec![
            ("Since".to_string(), self.since.to_string()),
            ("Until".to_string(), self.until.to_string()),
        ]
    }
}
