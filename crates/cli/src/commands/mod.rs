//! Command handlers
//!
//! Each handler authenticates the caller first, then calls one service.

pub mod billing;
pub mod client;
pub mod loan;
pub mod report;
pub mod user;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use lendbook_business::ServiceContext;
use lendbook_core::RequestContext;
use lendbook_persistence::SqliteLedger;

use crate::config::AppConfig;
use crate::db;
use crate::Login;

/// Opened store plus configuration for one command
pub struct App {
    pub services: ServiceContext<SqliteLedger>,
    pub config: AppConfig,
}

impl App {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let ledger = db::open(&config.database).await?;
        let services = ServiceContext::new(ledger).with_settings(config.service_settings());
        Ok(Self {
            services,
            config: config.clone(),
        })
    }

    /// Authenticate `--user` / `--password`
    pub async fn login(&self, login: &Login) -> Result<RequestContext> {
        let (Some(user), Some(password)) = (login.user.as_deref(), login.password.as_deref()) else {
            anyhow::bail!("--user and --password are required for this command");
        };
        self.services
            .admin()
            .authenticate(user, password)
            .await
            .with_context(|| format!("Login failed for '{user}'"))
    }
}

/// Local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Truncate string for display
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Maria", 10), "Maria");
        assert_eq!(truncate("Maria Aparecida da Silva", 10), "Maria A...");
        assert_eq!(truncate("João Gonçalves", 7), "João...");
    }
}
