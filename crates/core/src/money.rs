//! # Money Module
//!
//! Tiền tệ và các helper tính toán với rust_decimal để đảm bảo độ chính xác
//! tuyệt đối cho các phép tính tài chính. Không dùng f64 cho tiền.

use crate::error::{CoreError, CoreResult};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Số chữ số thập phân của đơn vị tiền nhỏ nhất (cent / centavo)
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Đại diện cho một loại tiền tệ.
///
/// # Examples
/// ```
/// use lendbook_core::Currency;
/// use rust_decimal::Decimal;
///
/// let brl = Currency::brl();
/// assert_eq!(brl.format(Decimal::new(20000, 2)), "R$ 200.00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    /// Mã tiền tệ ISO 4217
    pub code: String,
    /// Số chữ số thập phân
    pub decimals: u32,
    /// Ký hiệu hiển thị
    pub symbol: String,
}

impl Currency {
    /// Tạo Currency mới
    pub fn new(code: &str, decimals: u32, symbol: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            decimals,
            symbol: symbol.to_string(),
        }
    }

    /// Brazilian Real (2 decimals)
    pub fn brl() -> Self {
        Self::new("BRL", 2, "R$")
    }

    /// US Dollar (2 decimals)
    pub fn usd() -> Self {
        Self::new("USD", 2, "$")
    }

    /// Hiển thị số tiền, làm tròn theo số decimals của currency
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(
            self.decimals,
            RoundingStrategy::MidpointAwayFromZero,
        );
        format!("{} {:.*}", self.symbol, self.decimals as usize, rounded)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::brl()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Làm tròn về đơn vị nhỏ nhất (2 chữ số), half away from zero
pub fn round_minor(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Hiển thị với đúng 2 chữ số thập phân, không ký hiệu ("1000.00")
pub fn format_minor(amount: Decimal) -> String {
    format!("{:.2}", round_minor(amount))
}

/// Một đơn vị tiền nhỏ nhất (0.01)
pub fn minor_unit() -> Decimal {
    Decimal::new(1, MINOR_UNIT_SCALE)
}

/// Tổng các số tiền
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |acc, x| acc + x)
}

/// Parse số tiền từ input dạng text ("1500.00", "29.9")
pub fn parse_amount(input: &str) -> CoreResult<Decimal> {
    Decimal::from_str(input.trim())
        .map_err(|e| CoreError::invalid(format!("invalid amount {:?}: {}", input, e)))
}

/// Yêu cầu số tiền dương
pub fn ensure_positive(field: &str, amount: Decimal) -> CoreResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::invalid(format!(
            "{} must be positive: {}",
            field, amount
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_minor() {
        assert_eq!(format_minor(dec!(1000)), "1000.00");
        assert_eq!(format_minor(dec!(-66.666)), "-66.67");
    }

    #[test]
    fn test_round_minor() {
        assert_eq!(round_minor(dec!(33.335)), dec!(33.34));
        assert_eq!(round_minor(dec!(33.334)), dec!(33.33));
        assert_eq!(round_minor(dec!(-0.005)), dec!(-0.01));
    }

    #[test]
    fn test_sum_amounts() {
        let total = sum_amounts(vec![dec!(0.1), dec!(0.2), dec!(0.3)]);
        assert_eq!(total, dec!(0.6));
        assert_eq!(sum_amounts(Vec::new()), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 1500.50 ").unwrap(), dec!(1500.50));
        assert!(parse_amount("abc").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("amount", dec!(0.01)).is_ok());
        assert!(ensure_positive("amount", Decimal::ZERO).is_err());
        assert!(ensure_positive("amount", dec!(-5)).is_err());
    }

    #[test]
    fn test_currency_format() {
        assert_eq!(Currency::brl().format(dec!(1234.5)), "R$ 1234.50");
        assert_eq!(Currency::usd().format(dec!(0.005)), "$ 0.01");
        assert_eq!(Currency::default().code, "BRL");
    }
}
