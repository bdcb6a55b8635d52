//! Database initialization and status

use anyhow::{bail, Context, Result};
use lendbook_business::hash_password;
use lendbook_core::OrganizationRepository;
use lendbook_persistence::{bootstrap, MasterSeed, SqliteLedger};
use std::path::Path;

use crate::config::DatabaseConfig;

/// File path behind a `sqlite:` URL, `None` for in-memory databases
fn database_file(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

/// Connect, creating the data directory and applying migrations
pub async fn open(config: &DatabaseConfig) -> Result<SqliteLedger> {
    if let Some(parent) = database_file(&config.url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    SqliteLedger::open(&config.url, config.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.url))
}

/// Initialize the database and optionally seed a master account
pub async fn init_database(
    config: &DatabaseConfig,
    master_user: Option<&str>,
    master_password: Option<&str>,
) -> Result<()> {
    let ledger = open(config).await?;

    match (master_user, master_password) {
        (Some(username), Some(password)) => {
            let seed = MasterSeed {
                username: username.to_string(),
                password_hash: hash_password(password)?,
            };
            bootstrap(ledger.pool(), Some(&seed))
                .await
                .context("Failed to seed master account")?;
            println!("👤 Master account: {}", username);
        }
        (None, None) => {}
        _ => bail!("--master-user and --master-password must be given together"),
    }

    ledger.pool().close().await;
    Ok(())
}

/// Show database status
pub async fn show_status(config: &DatabaseConfig) -> Result<()> {
    if let Some(path) = database_file(&config.url) {
        if !path.exists() {
            println!("❌ Database not found at {}", path.display());
            println!("   Run 'lendbook init' to create the database");
            return Ok(());
        }
    }

    let ledger = open(config).await?;
    let pool = ledger.pool();

    println!("📊 Database Status");
    println!("   URL: {}", config.url);
    println!();

    for (label, table) in [
        ("Organizations", "organizations"),
        ("Users", "users"),
        ("Clients", "clients"),
        ("Loans", "loans"),
        ("Payments", "payments"),
        ("Billing records", "user_billing"),
    ] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("Failed to count {table}"))?;
        println!("   {:<16} {}", format!("{label}:"), count.0);
    }

    let organizations = ledger.list_organizations().await?;
    if !organizations.is_empty() {
        println!();
        for summary in &organizations {
            println!(
                "   🏢 {} (id {}, {} users)",
                summary.organization.name, summary.organization.id, summary.user_count
            );
        }
    }

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file() {
        assert_eq!(
            database_file("sqlite:data/lendbook.db?mode=rwc"),
            Some(Path::new("data/lendbook.db"))
        );
        assert_eq!(database_file("sqlite:///tmp/x.db"), Some(Path::new("/tmp/x.db")));
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://localhost"), None);
    }

    #[tokio::test]
    async fn test_init_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lendbook.db");
        let config = DatabaseConfig {
            url: format!("sqlite:{}", path.display()),
            max_connections: 1,
        };

        init_database(&config, Some("root"), Some("secret")).await.unwrap();
        assert!(path.exists());

        let err = init_database(&config, Some("root"), None).await.unwrap_err();
        assert!(err.to_string().contains("together"));
    }
}
