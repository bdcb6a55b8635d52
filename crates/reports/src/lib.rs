//! # Lendbook Reports
//!
//! Reporting aggregator and report export - CSV, JSON, Markdown.
//!
//! Every function here is pure: it works on loans and payments already
//! loaded for one organization and never touches the store.
//!
//! ## Aggregations
//!
//! - [`monthly_profit`] - lent vs received per month, newest first
//! - [`dashboard_stats`] - headline totals, overdue and upcoming loans
//! - [`monthly_activity`] - trailing per-month chart series
//! - [`loan_lines`] / [`client_lines`] - loan book views
//!
//! ## Exporters
//!
//! - [`CsvExporter`] - CSV format with proper escaping
//! - [`JsonExporter`] - JSON format (pretty or compact)
//! - [`MarkdownExporter`] - Markdown tables for documentation
//!
//! ## Example
//!
//! ```rust,ignore
//! use lendbook_reports::{monthly_profit, MarkdownExporter, ProfitReport, ReportExporter};
//!
//! let report = ProfitReport::new("Monthly Profit", monthly_profit(&loans, &payments));
//! let md = MarkdownExporter::new().export(&report);
//! ```

pub mod activity;
pub mod book;
pub mod dashboard;
pub mod exporters;
pub mod profit;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use activity::{monthly_activity, ActivitySeries, MonthActivity};
pub use book::{client_lines, loan_lines, ClientLine, LoanBookReport, LoanLine};
pub use dashboard::{dashboard_stats, DashboardReport, DashboardStats};
pub use exporters::{
    CsvExporter, JsonExporter, MarkdownExporter, ReportData, ReportExporter, ReportFormat,
};
pub use profit::{monthly_profit, MonthlyProfit, ProfitReport};
