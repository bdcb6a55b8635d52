//! Monthly profit series.
//!
//! Lending is grouped by the calendar month of `loan_date`, receipts by the
//! calendar month of `payment_date`, and the two are joined on the month.
//! Only months present in the lending series are reported: a month with
//! receipts but no new loans does not appear.
//!
//! `profit = total_received - total_lent` is a cash-flow figure, not a
//! matched profit: receipts may belong to loans issued in other months.

use chrono::{DateTime, Utc};
use lendbook_core::money::{format_minor, round_minor};
use lendbook_core::{Currency, Loan, MonthKey, Payment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::exporters::ReportData;

/// One month of the profit series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProfit {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub total_lent: Decimal,
    pub total_received: Decimal,
    pub profit: Decimal,
    /// `profit / total_lent * 100`, two decimals; zero when nothing was lent
    pub margin: Decimal,
    pub loan_count: usize,
}

impl MonthlyProfit {
    pub fn key(&self) -> Option<MonthKey> {
        MonthKey::new(self.year, self.month).ok()
    }
}

/// Builds the profit series, newest month first.
pub fn monthly_profit(loans: &[Loan], payments: &[Payment]) -> Vec<MonthlyProfit> {
    let mut lent: BTreeMap<MonthKey, (Decimal, usize)> = BTreeMap::new();
    for loan in loans {
        let entry = lent
            .entry(MonthKey::from_date(loan.loan_date))
            .or_insert((Decimal::ZERO, 0));
        entry.0 += loan.amount;
        entry.1 += 1;
    }

    let mut received: BTreeMap<MonthKey, Decimal> = BTreeMap::new();
    for payment in payments {
        *received
            .entry(MonthKey::from_date(payment.payment_date))
            .or_insert(Decimal::ZERO) += payment.amount;
    }

    lent.into_iter()
        .rev()
        .map(|(key, (total_lent, loan_count))| {
            let total_received = received.get(&key).copied().unwrap_or(Decimal::ZERO);
            let profit = total_received - total_lent;
            MonthlyProfit {
                year: key.year(),
                month: key.month(),
                month_name: key.month_name().to_string(),
                total_lent,
                total_received,
                profit,
                margin: margin(profit, total_lent),
                loan_count,
            }
        })
        .collect()
}

fn margin(profit: Decimal, total_lent: Decimal) -> Decimal {
    if total_lent > Decimal::ZERO {
        round_minor(profit / total_lent * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

// ============================================================================
// Profit Report
// ============================================================================

/// Exportable profit report
#[derive(Debug, Clone)]
pub struct ProfitReport {
    pub title: String,
    pub months: Vec<MonthlyProfit>,
    pub currency: Currency,
    pub generated_at: DateTime<Utc>,
}

impl ProfitReport {
    pub fn new(title: &str, months: Vec<MonthlyProfit>) -> Self {
        Self {
            title: title.to_string(),
            months,
            currency: Currency::default(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn total_profit(&self) -> Decimal {
        self.months.iter().map(|m| m.profit).sum()
    }
}

impl ReportData for ProfitReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        [
            "Month", "Lent", "Received", "Profit", "Margin %", "Loans",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.months
            .iter()
            .map(|m| {
                vec![
                    format!("{} {}", m.month_name, m.year),
                    format_minor(m.total_lent),
                    format_minor(m.total_received),
                    format_minor(m.profit),
                    format_minor(m.margin),
                    m.loan_count.to_string(),
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let lent: Decimal = self.months.iter().map(|m| m.total_lent).sum();
        let received: Decimal = self.months.iter().map(|m| m.total_received).sum();
        vec![
            ("Months".to_string(), self.months.len().to_string()),
            ("Total Lent".to_string(), self.currency.format(lent)),
            ("Total Received".to_string(), self.currency.format(received)),
            ("Net".to_string(), self.currency.format(self.total_profit())),
            ("Generated At".to_string(), self.generated_at.to_rfc3339()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{loan, payment};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_month() {
        let loans = vec![loan(1, 1, dec!(1000), date(2024, 1, 10), date(2024, 2, 10))];
        let payments = vec![payment(1, dec!(300), date(2024, 1, 25))];

        let series = monthly_profit(&loans, &payments);
        assert_eq!(series.len(), 1);
        let jan = &series[0];
        assert_eq!((jan.year, jan.month), (2024, 1));
        assert_eq!(jan.month_name, "January");
        assert_eq!(jan.total_lent, dec!(1000));
        assert_eq!(jan.total_received, dec!(300));
        assert_eq!(jan.profit, dec!(-700));
        assert_eq!(jan.margin, dec!(-70.0));
        assert_eq!(jan.loan_count, 1);
    }

    #[test]
    fn test_newest_first_and_payment_only_months_dropped() {
        let loans = vec![
            loan(1, 1, dec!(500), date(2024, 1, 3), date(2024, 2, 3)),
            loan(2, 1, dec!(250), date(2024, 1, 20), date(2024, 2, 20)),
            loan(3, 2, dec!(400), date(2024, 3, 1), date(2024, 4, 1)),
        ];
        let payments = vec![
            payment(1, dec!(100), date(2024, 2, 5)), // no loans in February
            payment(3, dec!(440), date(2024, 3, 30)),
        ];

        let series = monthly_profit(&loans, &payments);
        let months: Vec<(i32, u32)> = series.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(months, vec![(2024, 3), (2024, 1)]);
        assert_eq!(series[0].profit, dec!(40));
        assert_eq!(series[0].margin, dec!(10));
        assert_eq!(series[1].total_lent, dec!(750));
        assert_eq!(series[1].loan_count, 2);
        assert_eq!(series[1].total_received, dec!(0));
        assert_eq!(series[1].margin, dec!(-100));
    }

    #[test]
    fn test_margin_rounded_to_two_places() {
        let loans = vec![loan(1, 1, dec!(300), date(2024, 5, 1), date(2024, 6, 1))];
        let payments = vec![payment(1, dec!(100), date(2024, 5, 2))];
        let series = monthly_profit(&loans, &payments);
        assert_eq!(series[0].margin, dec!(-66.67));
    }

    #[test]
    fn test_profit_report_rows() {
        let loans = vec![loan(1, 1, dec!(1000), date(2024, 1, 10), date(2024, 2, 10))];
        let report = ProfitReport::new("Profit", monthly_profit(&loans, &[]));
        assert_eq!(report.rows()[0][0], "January 2024");
        assert_eq!(report.rows()[0][3], "-1000.00");
        assert_eq!(report.total_profit(), dec!(-1000));
        assert!(report
            .summary()
            .iter()
            .any(|(k, v)| k == "Total Lent" && v == "R$ 1000.00"));
    }
}
