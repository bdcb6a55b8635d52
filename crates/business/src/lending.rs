//! Lending operations - clients, loans, payments
//!
//! Every operation is scoped to the caller's organization: the tenant id
//! comes from the request context, never from the request data.

use chrono::NaiveDate;
use lendbook_core::{
    installment_schedule, ClientRepository, Client, Loan, LoanRepository, LoanTermsInput, NewClient,
    NewLoan, NewPayment, Payment, PaymentReceipt, PaymentRepository, RequestContext,
};
use lendbook_reports::{client_lines, loan_lines, ClientLine, LoanLine};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::BusinessResult;
use crate::services::ServiceContext;

/// One loan with everything the detail screen shows
#[derive(Debug, Clone, Serialize)]
pub struct LoanDetail {
    pub line: LoanLine,
    pub client: Client,
    /// Newest first
    pub payments: Vec<Payment>,
    /// Cent amounts per installment, summing exactly to the total
    pub schedule: Vec<Decimal>,
}

/// All loans and payments of one organization
#[derive(Debug, Clone, Default)]
pub struct LoanBook {
    pub clients: Vec<Client>,
    pub loans: Vec<Loan>,
    pub payments: Vec<Payment>,
}

/// Lending Service - handles clients, loans and payments
pub struct LendingService<'a, S> {
    services: &'a ServiceContext<S>,
}

impl<'a, S> LendingService<'a, S> {
    pub fn new(services: &'a ServiceContext<S>) -> Self {
        Self { services }
    }
}

impl<'a, S> LendingService<'a, S>
where
    S: ClientRepository + LoanRepository + PaymentRepository,
{
    /// Register a client. `Conflict` if the document exists in this organization.
    #[tracing::instrument(skip(self, ctx, input), fields(user_id = ctx.user_id))]
    pub async fn add_client(&self, ctx: &RequestContext, input: NewClient) -> BusinessResult<Client> {
        let org_id = ctx.require_tenant()?;
        let input = input.validated()?;
        let client = self.services.store().insert_client(org_id, input).await?;
        info!(org_id, client_id = client.id, "client registered");
        Ok(client)
    }

    /// Clients ordered by name, with loan count and active debt
    pub async fn list_clients(&self, ctx: &RequestContext) -> BusinessResult<Vec<ClientLine>> {
        let org_id = ctx.require_tenant()?;
        let store = self.services.store();
        let clients = store.list_clients(org_id).await?;
        let loans = store.list_loans(org_id).await?;
        Ok(client_lines(&clients, &loans))
    }

    /// Create a loan for a client of the caller's organization.
    ///
    /// Terms are computed and validated before the store is touched.
    #[tracing::instrument(skip(self, ctx, terms), fields(user_id = ctx.user_id))]
    pub async fn create_loan(
        &self,
        ctx: &RequestContext,
        client_id: i64,
        terms: LoanTermsInput,
    ) -> BusinessResult<Loan> {
        let org_id = ctx.require_tenant()?;
        let new_loan = NewLoan::build(client_id, &terms)?;
        let store = self.services.store();
        store.find_client(org_id, client_id).await?;

        let loan = store.insert_loan(org_id, new_loan).await?;
        info!(
            org_id,
            loan_id = loan.id,
            client_id,
            total = %loan.total_amount,
            due_date = %loan.due_date,
            "loan created"
        );
        Ok(loan)
    }

    /// Loans newest first, with client, paid total, remaining and overdue flag
    pub async fn list_loans(&self, ctx: &RequestContext, as_of: NaiveDate) -> BusinessResult<Vec<LoanLine>> {
        let book = self.loan_book(ctx).await?;
        Ok(loan_lines(&book.clients, &book.loans, &book.payments, as_of))
    }

    pub async fn loan_detail(
        &self,
        ctx: &RequestContext,
        loan_id: i64,
        as_of: NaiveDate,
    ) -> BusinessResult<LoanDetail> {
        let org_id = ctx.require_tenant()?;
        let store = self.services.store();
        let loan = store.find_loan(org_id, loan_id).await?;
        let client = store.find_client(org_id, loan.client_id).await?;
        let payments = store.list_loan_payments(org_id, loan_id).await?;
        let schedule = installment_schedule(loan.total_amount, loan.installments)?;

        let line = loan_lines(std::slice::from_ref(&client), std::slice::from_ref(&loan), &payments, as_of)
            .into_iter()
            .next()
            .ok_or_else(|| lendbook_core::CoreError::not_found("Loan", loan_id))?;

        Ok(LoanDetail {
            line,
            client,
            payments,
            schedule,
        })
    }

    /// Record a payment; the loan flips to `paid` in the same transaction
    /// once the running total reaches the loan total.
    #[tracing::instrument(skip(self, ctx, input), fields(user_id = ctx.user_id, loan_id = input.loan_id))]
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        input: NewPayment,
    ) -> BusinessResult<PaymentReceipt> {
        let org_id = ctx.require_tenant()?;
        let input = input.validated()?;
        let receipt = self.services.store().record_payment(org_id, input).await?;

        info!(
            org_id,
            loan_id = receipt.payment.loan_id,
            amount = %receipt.payment.amount,
            remaining = %receipt.remaining,
            "payment recorded"
        );
        if receipt.settled_now {
            info!(org_id, loan_id = receipt.payment.loan_id, "loan paid off");
        }
        Ok(receipt)
    }

    /// Everything the reports need for the caller's organization
    pub async fn loan_book(&self, ctx: &RequestContext) -> BusinessResult<LoanBook> {
        let org_id = ctx.require_tenant()?;
        let store = self.services.store();
        let book = LoanBook {
            clients: store.list_clients(org_id).await?,
            loans: store.list_loans(org_id).await?,
            payments: store.list_payments(org_id).await?,
        };
        debug!(
            org_id,
            clients = book.clients.len(),
            loans = book.loans.len(),
            payments = book.payments.len(),
            "loan book loaded"
        );
        Ok(book)
    }
}
