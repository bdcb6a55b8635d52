//! Builders for report tests.

use chrono::{NaiveDate, Utc};
use lendbook_core::{Loan, LoanStatus, LoanType, Payment};
use rust_decimal::Decimal;

pub const ORG: i64 = 1;

pub fn loan(id: i64, client_id: i64, amount: Decimal, loan_date: NaiveDate, due_date: NaiveDate) -> Loan {
    Loan {
        id,
        client_id,
        amount,
        interest_rate: Decimal::ZERO,
        loan_type: LoanType::Single,
        installments: 1,
        installment_amount: amount,
        total_amount: amount,
        loan_date,
        due_date,
        status: LoanStatus::Active,
        organization_id: ORG,
        created_at: Utc::now(),
    }
}

pub fn payment(loan_id: i64, amount: Decimal, payment_date: NaiveDate) -> Payment {
    Payment {
        id: 0,
        loan_id,
        amount,
        payment_type: "cash".to_string(),
        payment_date,
        notes: None,
        organization_id: ORG,
        created_at: Utc::now(),
    }
}
