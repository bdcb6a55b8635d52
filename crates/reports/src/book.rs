//! Loan book views: loans with their client and repayment position, and
//! clients with their loan count and active debt.

use chrono::{DateTime, NaiveDate, Utc};
use lendbook_core::loan::is_overdue;
use lendbook_core::money::format_minor;
use lendbook_core::{Client, Currency, Loan, Payment};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::exporters::ReportData;

/// A loan with its client and repayment position
#[derive(Debug, Clone, Serialize)]
pub struct LoanLine {
    pub loan: Loan,
    pub client_name: String,
    pub client_document: String,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub overdue: bool,
}

/// A client with loan count and the total owed on active loans
#[derive(Debug, Clone, Serialize)]
pub struct ClientLine {
    pub client: Client,
    pub loan_count: usize,
    pub active_debt: Decimal,
}

fn paid_by_loan(payments: &[Payment]) -> HashMap<i64, Decimal> {
    let mut paid: HashMap<i64, Decimal> = HashMap::new();
    for p in payments {
        *paid.entry(p.loan_id).or_insert(Decimal::ZERO) += p.amount;
    }
    paid
}

/// Joins loans with clients and payments, keeping the order of `loans`
pub fn loan_lines(
    clients: &[Client],
    loans: &[Loan],
    payments: &[Payment],
    as_of: NaiveDate,
) -> Vec<LoanLine> {
    let by_id: HashMap<i64, &Client> = clients.iter().map(|c| (c.id, c)).collect();
    let paid = paid_by_loan(payments);

    loans
        .iter()
        .map(|loan| {
            let client = by_id.get(&loan.client_id);
            let paid = paid.get(&loan.id).copied().unwrap_or(Decimal::ZERO);
            LoanLine {
                loan: loan.clone(),
                client_name: client.map(|c| c.full_name.clone()).unwrap_or_default(),
                client_document: client.map(|c| c.document.clone()).unwrap_or_default(),
                paid,
                remaining: loan.total_amount - paid,
                overdue: is_overdue(loan, as_of),
            }
        })
        .collect()
}

pub fn client_lines(clients: &[Client], loans: &[Loan]) -> Vec<ClientLine> {
    clients
        .iter()
        .map(|client| {
            let own = loans.iter().filter(|l| l.client_id == client.id);
            let (count, debt) = own.fold((0usize, Decimal::ZERO), |(n, debt), l| {
                let debt = if l.is_active() { debt + l.total_amount } else { debt };
                (n + 1, debt)
            });
            ClientLine {
                client: client.clone(),
                loan_count: count,
                active_debt: debt,
            }
        })
        .collect()
}

// ============================================================================
// Loan Book Report
// ============================================================================

#[derive(Debug, Clone)]
pub struct LoanBookReport {
    pub title: String,
    pub lines: Vec<LoanLine>,
    pub currency: Currency,
    pub generated_at: DateTime<Utc>,
}

impl LoanBookReport {
    pub fn new(title: &str, lines: Vec<LoanLine>) -> Self {
        Self {
            title: title.to_string(),
            lines,
            currency: Currency::default(),
            generated_at: Utc::now(),
        }
    }
}

impl ReportData for LoanBookReport {
    fn title(&self) -> &str {
        &self.title
    }

    fn headers(&self) -> Vec<String> {
        [
            "Loan", "Client", "Document", "Type", "Installments", "Principal", "Total", "Paid",
            "Remaining", "Due Date", "Status",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.lines
            .iter()
            .map(|line| {
                let status = if line.overdue {
                    "overdue".to_string()
                } else {
                    line.loan.status.to_string()
                };
                vec![
                    line.loan.id.to_string(),
                    line.client_name.clone(),
                    line.client_document.clone(),
                    line.loan.loan_type.to_string(),
                    line.loan.installments.to_string(),
                    format_minor(line.loan.amount),
                    format_minor(line.loan.total_amount),
                    format_minor(line.paid),
                    format_minor(line.remaining),
                    line.loan.due_date.to_string(),
                    status,
                ]
            })
            .collect()
    }

    fn summary(&self) -> Vec<(String, String)> {
        let active: Vec<&LoanLine> = self.lines.iter().filter(|l| l.loan.is_active()).collect();
        let outstanding: Decimal = active.iter().map(|l| l.remaining).sum();
        vec![
            ("Loans".to_string(), self.lines.len().to_string()),
            ("Active".to_string(), active.len().to_string()),
            ("Overdue".to_string(), self.lines.iter().filter(|l| l.overdue).count().to_string()),
            ("Outstanding".to_string(), self.currency.format(outstanding)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{loan, payment, ORG};
    use lendbook_core::LoanStatus;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(id: i64, name: &str) -> Client {
        Client {
            id,
            full_name: name.to_string(),
            document: format!("DOC-{id}"),
            phone: None,
            email: None,
            address: None,
            organization_id: ORG,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_loan_lines() {
        let clients = vec![client(1, "Maria"), client(2, "João")];
        let loans = vec![
            loan(10, 1, dec!(1000), date(2024, 1, 1), date(2024, 2, 1)),
            loan(11, 2, dec!(500), date(2024, 1, 5), date(2024, 3, 5)),
        ];
        let payments = vec![
            payment(10, dec!(600), date(2024, 1, 20)),
            payment(10, dec!(100), date(2024, 1, 25)),
        ];

        let lines = loan_lines(&clients, &loans, &payments, date(2024, 2, 10));
        assert_eq!(lines[0].client_name, "Maria");
        assert_eq!(lines[0].paid, dec!(700));
        assert_eq!(lines[0].remaining, dec!(300));
        assert!(lines[0].overdue);
        assert_eq!(lines[1].client_document, "DOC-2");
        assert!(!lines[1].overdue);

        let report = LoanBookReport::new("Loans", lines);
        assert_eq!(report.rows()[0][10], "overdue");
        assert_eq!(report.rows()[1][8], "500.00");
    }

    #[test]
    fn test_client_lines_count_active_debt() {
        let clients = vec![client(1, "Maria"), client(2, "João")];
        let mut settled = loan(12, 1, dec!(200), date(2024, 1, 1), date(2024, 2, 1));
        settled.status = LoanStatus::Paid;
        let loans = vec![loan(10, 1, dec!(1000), date(2024, 1, 1), date(2024, 2, 1)), settled];

        let lines = client_lines(&clients, &loans);
        assert_eq!(lines[0].loan_count, 2);
        assert_eq!(lines[0].active_debt, dec!(1000));
        assert_eq!(lines[1].loan_count, 0);
        assert_eq!(lines[1].active_debt, Decimal::ZERO);
    }
}
