//! SQLite persistence module
//!
//! Repository pattern cho SQLite database access.

pub mod ledger;
pub mod repos;
pub mod schema;

pub use ledger::SqliteLedger;
pub use repos::{
    bootstrap, create_pool, init_database, run_migrations, BillingRepo, ClientRepo, LoanRepo,
    MasterSeed, OrganizationRepo, PaymentRepo, UserRepo,
};
pub use schema::{
    BillingRow, ClientRow, LoanRow, OrganizationCountRow, OrganizationRow, PaymentRow, UserRow,
};
