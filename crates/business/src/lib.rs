//! # Lendbook Business
//!
//! Business logic layer - lending, platform billing, administration, dashboard.
//!
//! Every operation takes the caller's [`RequestContext`](lendbook_core::RequestContext);
//! tenant operations filter by its organization, billing and administration
//! require a master account.
//!
//! ```rust,ignore
//! let services = ServiceContext::new(SqliteLedger::open(url, 5).await?);
//! let ctx = services.admin().authenticate("ana", "secret").await?;
//! let loans = services.lending().list_loans(&ctx, today).await?;
//! ```

pub mod admin;
pub mod billing;
pub mod dashboard;
pub mod error;
pub mod lending;
pub mod services;

pub use admin::{hash_password, verify_password, AdminService, NewAccount};
pub use billing::{BillingOverview, BillingService, UserBillingLine};
pub use dashboard::DashboardService;
pub use error::{BusinessError, BusinessResult, ErrorKind};
pub use lending::{LendingService, LoanBook, LoanDetail};
pub use services::{ServiceContext, ServiceSettings};
