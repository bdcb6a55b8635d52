//! # Client Module
//!
//! Khách hàng vay tiền của một organization. `document` là duy nhất
//! trong phạm vi organization (không phải toàn cục).

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Khách hàng của một organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub full_name: String,
    /// Giấy tờ tùy thân (CPF, CNPJ, ...)
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub organization_id: i64,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name, self.document)
    }
}

/// Dữ liệu tạo client mới
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub full_name: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewClient {
    pub fn new(full_name: &str, document: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            document: document.to_string(),
            ..Default::default()
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Chuẩn hóa và kiểm tra input trước khi ghi
    pub fn validated(mut self) -> CoreResult<Self> {
        self.full_name = self.full_name.trim().to_string();
        self.document = self.document.trim().to_string();
        if self.full_name.is_empty() {
            return Err(CoreError::invalid("client name is required"));
        }
        if self.document.is_empty() {
            return Err(CoreError::invalid("client document is required"));
        }
        // Trường tùy chọn rỗng được lưu là NULL
        for field in [&mut self.phone, &mut self.email, &mut self.address] {
            if field.as_deref().map(str::trim).is_some_and(str::is_empty) {
                *field = None;
            }
        }
        Ok(self)
    }
}
