//! # Lendbook Persistence
//!
//! Ledger Store cho Lendbook trên SQLite.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SqliteLedger                          │
//! │  ┌───────────────────┐    ┌────────────────────────────┐ │
//! │  │ core repository   │ -> │ Repos (sqlx queries)       │ │
//! │  │ traits            │    │ OrganizationRepo, LoanRepo │ │
//! │  └───────────────────┘    └────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lendbook_core::LoanRepository;
//! use lendbook_persistence::SqliteLedger;
//!
//! let ledger = SqliteLedger::open("sqlite:data/lendbook.db?mode=rwc", 5).await?;
//! let loans = ledger.list_loans(org_id).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::{
    bootstrap, create_pool, init_database, run_migrations, BillingRepo, ClientRepo, LoanRepo,
    MasterSeed, OrganizationRepo, PaymentRepo, SqliteLedger, UserRepo,
};
