//! # User Module
//!
//! Organization (tenant) và User (tài khoản đăng nhập).
//! - Master: người vận hành nền tảng, thuộc organization 0, không bị thu phí
//! - User: tài khoản của một organization, trả phí nền tảng hằng tháng

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Organization dành riêng cho master, không sở hữu dữ liệu nghiệp vụ
pub const MASTER_ORGANIZATION_ID: i64 = 0;

/// Tên của master organization
pub const MASTER_ORGANIZATION_NAME: &str = "Master Admin";

/// Phí mặc định cũ (29.90) mà các user tạo ngoài hệ thống có thể mang theo.
/// Billing xử lý nó như mọi `monthly_fee` khác.
pub const LEGACY_DEFAULT_MONTHLY_FEE: Decimal = Decimal::from_parts(2990, 0, 0, false, 2);

/// Organization - ranh giới tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Kiểm tra có phải master organization không
    pub fn is_master(&self) -> bool {
        self.id == MASTER_ORGANIZATION_ID
    }
}

/// Vai trò của user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Quản trị nền tảng - miễn phí, quản lý mọi organization
    Master,
    /// User thường của một organization
    User,
}

impl UserRole {
    /// Trả về code string cho DB
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Master => "master",
            UserRole::User => "user",
        }
    }

    /// Parse từ string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "master" => Some(UserRole::Master),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tài khoản đăng nhập.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string, không bao giờ là mật khẩu gốc
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub organization_id: i64,
    /// Phí nền tảng hằng tháng
    pub monthly_fee: Decimal,
    /// Ngày bắt đầu tính phí; None = tính phí ngay
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_master(&self) -> bool {
        self.role == UserRole::Master
    }

    /// Phí đang áp dụng có phải phí mặc định cũ không
    pub fn has_legacy_fee(&self) -> bool {
        !self.is_master() && self.monthly_fee == LEGACY_DEFAULT_MONTHLY_FEE
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User {} ({}, role: {}, org: {})",
            self.username, self.id, self.role, self.organization_id
        )
    }
}

/// Dữ liệu tạo user mới (mật khẩu đã được hash)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub organization_id: i64,
    pub monthly_fee: Decimal,
    pub start_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn user(role: UserRole, fee: Decimal) -> User {
        User {
            id: 1,
            username: "ana".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role,
            organization_id: 3,
            monthly_fee: fee,
            start_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [UserRole::Master, UserRole::User] {
            assert_eq!(UserRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::from_str("MASTER"), Some(UserRole::Master));
        assert_eq!(UserRole::from_str("admin"), None);
    }

    #[test]
    fn test_legacy_fee_constant() {
        assert_eq!(LEGACY_DEFAULT_MONTHLY_FEE, dec!(29.90));
        assert!(user(UserRole::User, dec!(29.9)).has_legacy_fee());
        assert!(!user(UserRole::Master, dec!(29.90)).has_legacy_fee());
        assert!(!user(UserRole::User, dec!(200)).has_legacy_fee());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&user(UserRole::User, dec!(200))).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
