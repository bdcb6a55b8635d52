//! Account administration commands (master only)

use anyhow::Result;
use lendbook_business::NewAccount;

use super::App;
use crate::{Login, UserAction};

/// Handle user subcommands
pub async fn handle(app: &App, login: &Login, action: UserAction) -> Result<()> {
    let ctx = app.login(login).await?;
    let admin = app.services.admin();

    match action {
        UserAction::Create {
            username,
            account_password,
            org,
            fee,
            start,
        } => {
            let user = admin
                .create_user(
                    &ctx,
                    NewAccount {
                        username,
                        password: account_password,
                        organization_name: org.clone(),
                        monthly_fee: fee,
                        start_date: start,
                    },
                )
                .await?;
            println!("✅ Created user:");
            println!("   ID:           {}", user.id);
            println!("   Username:     {}", user.username);
            println!("   Organization: {} (id {})", org.trim(), user.organization_id);
            println!("   Monthly fee:  {:.2}", user.monthly_fee);
            match user.start_date {
                Some(start) => println!("   Billing from: {}", start),
                None => println!("   Billing from: now"),
            }
        }

        UserAction::Fee { user_id, fee } => {
            let user = app.services.billing().update_monthly_fee(&ctx, user_id, fee).await?;
            println!("✅ {} now pays {:.2} per month", user.username, user.monthly_fee);
        }

        UserAction::Delete { user_id } => {
            admin.delete_user(&ctx, user_id).await?;
            println!("🗑️  Deleted user {} and their organization's data", user_id);
        }

        UserAction::MigrateFees { fee } => {
            let fee = fee.unwrap_or(app.config.billing.standard_monthly_fee);
            let changed = app.services.billing().migrate_legacy_fees(&ctx, fee).await?;
            println!("✅ {} user(s) moved to {:.2}", changed, fee);
        }
    }

    Ok(())
}
