//! # Calendar Module
//!
//! `MonthKey` (định danh tháng dạng `YYYY-MM`) và `DateWindow` -
//! các phép tính ngày tháng mà tầng nghiệp vụ cần ("ngày đầu tháng",
//! "lùi N tháng", "N ngày sau").

use crate::error::{CoreError, CoreResult};
use chrono::{Datelike, Days, Month, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Định danh một tháng dương lịch, hiển thị dạng `YYYY-MM`.
///
/// # Examples
/// ```
/// use lendbook_core::MonthKey;
///
/// let key: MonthKey = "2024-01".parse().unwrap();
/// assert_eq!(key.to_string(), "2024-01");
/// assert_eq!(key.month(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// Tạo MonthKey, month phải nằm trong 1..=12
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::invalid(format!("month out of range: {}", month)));
        }
        if !(0..=9999).contains(&year) {
            return Err(CoreError::invalid(format!("year out of range: {}", year)));
        }
        Ok(Self { year, month })
    }

    /// Tháng chứa ngày `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Ngày đầu tiên của tháng
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Kiểm tra `date` có thuộc tháng này không
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Tên tháng tiếng Anh ("January", ...)
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("")
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::invalid(format!("month key must be YYYY-MM: {:?}", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Các phép tính cửa sổ thời gian.
///
/// Tầng nghiệp vụ không tự làm phép toán lịch mà gọi qua trait này,
/// để có thể thay bằng primitive của store (ví dụ `date('now', 'start of month')`).
pub trait DateWindow: Send + Sync {
    /// Ngày đầu tháng chứa `date`
    fn month_start(&self, date: NaiveDate) -> NaiveDate;

    /// Lùi `months` tháng kể từ `date`
    fn months_back(&self, date: NaiveDate, months: u32) -> NaiveDate;

    /// `days` ngày sau `date`
    fn days_after(&self, date: NaiveDate, days: u32) -> NaiveDate;
}

/// DateWindow dùng lịch Gregorian của chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarWindow;

impl DateWindow for CalendarWindow {
    fn month_start(&self, date: NaiveDate) -> NaiveDate {
        date - Days::new(u64::from(date.day0()))
    }

    fn months_back(&self, date: NaiveDate, months: u32) -> NaiveDate {
        date.checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN)
    }

    fn days_after(&self, date: NaiveDate, days: u32) -> NaiveDate {
        date.checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_key_parse_and_display() {
        let key: MonthKey = "2024-03".parse().unwrap();
        assert_eq!(key.year(), 2024);
        assert_eq!(key.month(), 3);
        assert_eq!(key.to_string(), "2024-03");
        assert_eq!(key.month_name(), "March");
    }

    #[test]
    fn test_month_key_rejects_malformed() {
        assert!("2024-13".parse::<MonthKey>().is_err());
        assert!("2024-3".parse::<MonthKey>().is_err());
        assert!("24-03".parse::<MonthKey>().is_err());
        assert!("2024/03".parse::<MonthKey>().is_err());
        assert!("".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_month_key_from_date() {
        let key = MonthKey::from_date(date(2024, 12, 31));
        assert_eq!(key.to_string(), "2024-12");
        assert_eq!(key.first_day(), date(2024, 12, 1));
        assert!(key.contains(date(2024, 12, 1)));
        assert!(!key.contains(date(2025, 1, 1)));
    }

    #[test]
    fn test_month_key_ordering() {
        let a = MonthKey::new(2023, 12).unwrap();
        let b = MonthKey::new(2024, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_month_key_serde_as_string() {
        let key = MonthKey::new(2024, 1).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2024-01\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_calendar_window() {
        let window = CalendarWindow;
        assert_eq!(window.month_start(date(2024, 2, 29)), date(2024, 2, 1));
        assert_eq!(window.months_back(date(2024, 3, 15), 12), date(2023, 3, 15));
        assert_eq!(window.days_after(date(2024, 1, 30), 7), date(2024, 2, 6));
    }
}
