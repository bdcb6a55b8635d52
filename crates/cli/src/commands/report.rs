//! Report commands

use anyhow::{Context, Result};
use lendbook_reports::{LoanBookReport, ProfitReport, ReportData};
use std::fs;
use std::path::PathBuf;

use super::{today, App};
use crate::{FormatArg, Login, ReportKind};

/// Generate a report for the caller's organization
pub async fn handle(
    app: &App,
    login: &Login,
    kind: ReportKind,
    format: FormatArg,
    output: Option<PathBuf>,
) -> Result<()> {
    let ctx = app.login(login).await?;
    let dashboard = app.services.dashboard();
    let as_of = today();

    let report: Box<dyn ReportData> = match kind {
        ReportKind::Profit => Box::new(ProfitReport::new("Monthly Profit", dashboard.profit(&ctx).await?)),
        ReportKind::Dashboard => Box::new(dashboard.dashboard(&ctx, as_of).await?),
        ReportKind::Activity { months } => Box::new(dashboard.activity(&ctx, as_of, months).await?),
        ReportKind::Loans => {
            let lines = app.services.lending().list_loans(&ctx, as_of).await?;
            Box::new(LoanBookReport::new("Loan Book", lines))
        }
    };

    let content = format.to_report_format().exporter().export(report.as_ref());

    match output {
        Some(path) => {
            fs::write(&path, &content).context("Failed to write report file")?;
            println!("✅ Report generated: {}", path.display());
        }
        None => {
            println!("{}", content);
        }
    }

    Ok(())
}
