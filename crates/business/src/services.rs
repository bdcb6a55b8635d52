//! Service context shared by every business service.
//!
//! Owns the ledger store and the date primitives. Services borrow it for
//! the length of one call; the caller's identity travels separately as a
//! [`RequestContext`](lendbook_core::RequestContext).

use lendbook_core::{CalendarWindow, DateWindow};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::admin::AdminService;
use crate::billing::BillingService;
use crate::dashboard::DashboardService;
use crate::lending::LendingService;

/// Tunables that come from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Fee given to new users and to legacy-default users on migration
    pub standard_monthly_fee: Decimal,
    pub upcoming_window_days: u32,
    pub activity_months: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            standard_monthly_fee: Decimal::new(20000, 2),
            upcoming_window_days: 7,
            activity_months: 12,
        }
    }
}

/// Context for business operations - store access plus calendar
pub struct ServiceContext<S> {
    store: S,
    window: Arc<dyn DateWindow>,
    settings: ServiceSettings,
}

impl<S> ServiceContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            window: Arc::new(CalendarWindow),
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_window(mut self, window: Arc<dyn DateWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn window(&self) -> &dyn DateWindow {
        self.window.as_ref()
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn lending(&self) -> LendingService<'_, S> {
        LendingService::new(self)
    }

    pub fn billing(&self) -> BillingService<'_, S> {
        BillingService::new(self)
    }

    pub fn admin(&self) -> AdminService<'_, S> {
        AdminService::new(self)
    }

    pub fn dashboard(&self) -> DashboardService<'_, S> {
        DashboardService::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct FixedWindow;

    impl DateWindow for FixedWindow {
        fn month_start(&self, date: NaiveDate) -> NaiveDate {
            date
        }

        fn months_back(&self, date: NaiveDate, _months: u32) -> NaiveDate {
            date
        }

        fn days_after(&self, date: NaiveDate, _days: u32) -> NaiveDate {
            date
        }
    }

    #[test]
    fn test_defaults() {
        let ctx = ServiceContext::new(());
        assert_eq!(ctx.settings().standard_monthly_fee, dec!(200.00));
        assert_eq!(ctx.settings().upcoming_window_days, 7);

        let d = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            ctx.window().months_back(d, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_window_override() {
        let ctx = ServiceContext::new(()).with_window(Arc::new(FixedWindow));
        let d = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(ctx.window().months_back(d, 6), d);
    }
}
