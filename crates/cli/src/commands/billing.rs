//! Platform billing commands (master only)

use anyhow::Result;
use lendbook_core::{Chargeability, MonthKey};

use super::{today, truncate, App};
use crate::{BillingAction, Login};

/// Handle billing subcommands
pub async fn handle(app: &App, login: &Login, action: BillingAction) -> Result<()> {
    let ctx = app.login(login).await?;
    let billing = app.services.billing();
    let as_of = today();

    match action {
        BillingAction::MarkPaid { user_id, month } => {
            let record = billing.mark_paid(&ctx, user_id, month, as_of).await?;
            println!(
                "✅ User {} paid {:.2} for {}",
                record.user_id, record.amount, record.month
            );
        }

        BillingAction::MarkAll { month } => {
            let month = month.unwrap_or_else(|| MonthKey::from_date(as_of));
            let outcome = billing.mark_all_paid_for_month(&ctx, month, as_of).await?;
            println!("✅ {} user(s) marked paid for {}", outcome.marked_count(), outcome.month);
            for failure in &outcome.failed {
                println!("   ❌ user {}: {}", failure.user_id, failure.error);
            }
            if !outcome.is_complete() {
                anyhow::bail!("{} user(s) could not be marked paid", outcome.failed.len());
            }
        }

        BillingAction::Overview { month } => {
            let overview = billing.overview(&ctx, month, as_of).await?;
            println!("💳 Billing {} ({})", overview.month, overview.month.month_name());
            println!("   Revenue:          {:.2}", overview.month_revenue);
            println!("   Overdue records:  {}", overview.overdue_count);
            println!("   Organizations:    {}", overview.organizations.len());
            println!();

            println!(
                "{:<6} {:<16} {:<24} {:>10} {:<8} {:<12}",
                "ID", "User", "Organization", "Fee", "Status", "Paid on"
            );
            println!("{}", "-".repeat(82));
            for line in &overview.users {
                let status = match (line.chargeability, line.status) {
                    (Chargeability::Future, _) => "future".to_string(),
                    (_, Some(status)) => status.to_string(),
                    (_, None) => "pending".to_string(),
                };
                println!(
                    "{:<6} {:<16} {:<24} {:>10.2} {:<8} {:<12}",
                    line.user.id,
                    truncate(&line.user.username, 16),
                    truncate(&line.organization_name, 24),
                    line.user.monthly_fee,
                    status,
                    line.payment_date.map(|d| d.to_string()).unwrap_or_default()
                );
            }

            if !overview.recent_paid.is_empty() {
                println!();
                println!("   Recent payments:");
                for record in &overview.recent_paid {
                    println!(
                        "     {} user {} {} {:.2}",
                        record.payment_date.map(|d| d.to_string()).unwrap_or_default(),
                        record.user_id,
                        record.month,
                        record.amount
                    );
                }
            }
        }
    }

    Ok(())
}
