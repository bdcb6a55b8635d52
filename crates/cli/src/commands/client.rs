//! Client commands

use anyhow::Result;
use lendbook_core::NewClient;

use super::{truncate, App};
use crate::{ClientAction, Login};

/// Handle client subcommands
pub async fn handle(app: &App, login: &Login, action: ClientAction) -> Result<()> {
    let ctx = app.login(login).await?;
    let lending = app.services.lending();

    match action {
        ClientAction::Add {
            name,
            document,
            phone,
            email,
            address,
        } => {
            let mut input = NewClient::new(&name, &document);
            if let Some(phone) = phone.as_deref() {
                input = input.with_phone(phone);
            }
            if let Some(email) = email.as_deref() {
                input = input.with_email(email);
            }
            if let Some(address) = address.as_deref() {
                input = input.with_address(address);
            }

            let client = lending.add_client(&ctx, input).await?;
            println!("✅ Registered client:");
            println!("   ID:       {}", client.id);
            println!("   Name:     {}", client.full_name);
            println!("   Document: {}", client.document);
        }

        ClientAction::List => {
            let lines = lending.list_clients(&ctx).await?;
            if lines.is_empty() {
                println!("No clients yet.");
                return Ok(());
            }
            println!("{:<6} {:<28} {:<18} {:>6} {:>14}", "ID", "Name", "Document", "Loans", "Active debt");
            println!("{}", "-".repeat(76));
            for line in lines {
                println!(
                    "{:<6} {:<28} {:<18} {:>6} {:>14.2}",
                    line.client.id,
                    truncate(&line.client.full_name, 28),
                    truncate(&line.client.document, 18),
                    line.loan_count,
                    line.active_debt
                );
            }
        }
    }

    Ok(())
}
