//! Configuration file (`lendbook.toml`)
//!
//! ```toml
//! [database]
//! url = "sqlite:data/lendbook.db?mode=rwc"
//! max_connections = 5
//!
//! [billing]
//! standard_monthly_fee = "200.00"
//!
//! [dashboard]
//! upcoming_window_days = 7
//! activity_months = 12
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{bail, Context, Result};
use lendbook_business::ServiceSettings;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "lendbook.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub billing: BillingConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/lendbook.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Fee for new accounts and target of the legacy fee migration
    pub standard_monthly_fee: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            standard_monthly_fee: ServiceSettings::default().standard_monthly_fee,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub upcoming_window_days: u32,
    pub activity_months: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let settings = ServiceSettings::default();
        Self {
            upcoming_window_days: settings.upcoming_window_days,
            activity_months: settings.activity_months,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter; `RUST_LOG` wins when set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `path`, or `lendbook.toml` if present, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            bail!("database.url must not be empty");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.billing.standard_monthly_fee <= Decimal::ZERO {
            bail!("billing.standard_monthly_fee must be positive");
        }
        if self.dashboard.upcoming_window_days == 0 {
            bail!("dashboard.upcoming_window_days must be at least 1");
        }
        if self.dashboard.activity_months == 0 {
            bail!("dashboard.activity_months must be at least 1");
        }
        Ok(())
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            standard_monthly_fee: self.billing.standard_monthly_fee,
            upcoming_window_days: self.dashboard.upcoming_window_days,
            activity_months: self.dashboard.activity_months,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.billing.standard_monthly_fee, dec!(200.00));
        assert_eq!(config.dashboard.upcoming_window_days, 7);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::parse(
            r#"
            [billing]
            standard_monthly_fee = "250.00"

            [dashboard]
            upcoming_window_days = 14
            "#,
        )
        .unwrap();
        assert_eq!(config.billing.standard_monthly_fee, dec!(250.00));
        assert_eq!(config.dashboard.upcoming_window_days, 14);
        assert_eq!(config.dashboard.activity_months, 12);

        let settings = config.service_settings();
        assert_eq!(settings.upcoming_window_days, 14);
    }

    #[test]
    fn test_rejects_zero_window() {
        let config = AppConfig::parse("[dashboard]\nupcoming_window_days = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_fee() {
        let config = AppConfig::parse("[billing]\nstandard_monthly_fee = \"0\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_key() {
        assert!(AppConfig::parse("[database]\nhost = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\nurl = \"sqlite::memory:\"\nmax_connections = 1").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
