//! Loan and payment commands

use anyhow::Result;
use lendbook_core::{LoanTermsInput, NewPayment};

use super::{today, truncate, App};
use crate::{LoanAction, Login, PaymentAction};

/// Handle loan subcommands
pub async fn handle(app: &App, login: &Login, action: LoanAction) -> Result<()> {
    let ctx = app.login(login).await?;
    let lending = app.services.lending();

    match action {
        LoanAction::Create {
            client_id,
            principal,
            rate,
            loan_type,
            installments,
            date,
            due,
        } => {
            let terms = LoanTermsInput {
                principal,
                interest_rate: rate,
                loan_type: loan_type.to_core_type(),
                installments,
                loan_date: date.unwrap_or_else(today),
                due_date: due,
            };
            let loan = lending.create_loan(&ctx, client_id, terms).await?;
            println!("✅ Created loan:");
            println!("   ID:          {}", loan.id);
            println!("   Type:        {}", loan.loan_type);
            println!("   Principal:   {:.2}", loan.amount);
            println!("   Interest:    {}%", loan.interest_rate);
            println!("   Total:       {:.2}", loan.total_amount);
            println!("   Installment: {} x {:.2}", loan.installments, loan.installment_amount);
            println!("   Due:         {}", loan.due_date);
        }

        LoanAction::List => {
            let lines = lending.list_loans(&ctx, today()).await?;
            if lines.is_empty() {
                println!("No loans yet.");
                return Ok(());
            }
            println!(
                "{:<6} {:<24} {:>12} {:>12} {:>12} {:<12} {:<8}",
                "ID", "Client", "Total", "Paid", "Remaining", "Due", "Status"
            );
            println!("{}", "-".repeat(92));
            for line in lines {
                let status = if line.overdue {
                    "⚠️ overdue".to_string()
                } else {
                    line.loan.status.to_string()
                };
                println!(
                    "{:<6} {:<24} {:>12.2} {:>12.2} {:>12.2} {:<12} {:<8}",
                    line.loan.id,
                    truncate(&line.client_name, 24),
                    line.loan.total_amount,
                    line.paid,
                    line.remaining,
                    line.loan.due_date.to_string(),
                    status
                );
            }
        }

        LoanAction::Show { loan_id } => {
            let detail = lending.loan_detail(&ctx, loan_id, today()).await?;
            let loan = &detail.line.loan;
            println!("📄 Loan {}", loan.id);
            println!("   Client:    {} ({})", detail.client.full_name, detail.client.document);
            println!("   Type:      {} ({} installments)", loan.loan_type, loan.installments);
            println!("   Principal: {:.2} at {}%", loan.amount, loan.interest_rate);
            println!("   Total:     {:.2}", loan.total_amount);
            println!("   Paid:      {:.2}", detail.line.paid);
            println!("   Remaining: {:.2}", detail.line.remaining);
            println!("   Loan date: {}", loan.loan_date);
            println!("   Due date:  {}{}", loan.due_date, if detail.line.overdue { " ⚠️ overdue" } else { "" });
            println!("   Status:    {}", loan.status);

            if detail.schedule.len() > 1 {
                println!();
                println!("   Schedule:");
                for (i, amount) in detail.schedule.iter().enumerate() {
                    println!("     {:>3}. {:.2}", i + 1, amount);
                }
            }

            println!();
            if detail.payments.is_empty() {
                println!("   No payments yet.");
            } else {
                println!("   Payments:");
                for p in &detail.payments {
                    println!(
                        "     {} {:>12.2} {}{}",
                        p.payment_date,
                        p.amount,
                        p.payment_type,
                        p.notes.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Handle payment subcommands
pub async fn handle_payment(app: &App, login: &Login, action: PaymentAction) -> Result<()> {
    let ctx = app.login(login).await?;

    match action {
        PaymentAction::Add {
            loan_id,
            amount,
            method,
            date,
            notes,
        } => {
            let mut input = NewPayment::new(loan_id, amount, &method, date.unwrap_or_else(today));
            if let Some(notes) = notes.as_deref() {
                input = input.with_notes(notes);
            }

            let receipt = app.services.lending().record_payment(&ctx, input).await?;
            println!("✅ Payment recorded:");
            println!("   Loan:      {}", receipt.payment.loan_id);
            println!("   Amount:    {:.2}", receipt.payment.amount);
            println!("   Paid:      {:.2}", receipt.total_paid);
            println!("   Remaining: {:.2}", receipt.remaining);
            if receipt.settled_now {
                println!("🎉 Loan {} is fully paid", receipt.payment.loan_id);
            }
        }
    }

    Ok(())
}
