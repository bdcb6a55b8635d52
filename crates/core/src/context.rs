//! # Context Module
//!
//! `RequestContext` - danh tính đã xác thực của người gọi, được truyền
//! tường minh vào mọi thao tác nghiệp vụ thay cho session toàn cục.

use crate::error::{CoreError, CoreResult};
use crate::user::{User, UserRole, MASTER_ORGANIZATION_ID};
use serde::{Deserialize, Serialize};

/// Người gọi đã xác thực
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: i64,
    pub role: UserRole,
    pub organization_id: i64,
}

impl RequestContext {
    pub fn new(user_id: i64, role: UserRole, organization_id: i64) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    /// Context cho user đã đăng nhập
    pub fn for_user(user: &User) -> Self {
        Self::new(user.id, user.role, user.organization_id)
    }

    pub fn is_master(&self) -> bool {
        self.role == UserRole::Master
    }

    /// Chỉ master mới được quản trị billing và user
    pub fn require_master(&self) -> CoreResult<()> {
        if !self.is_master() {
            return Err(CoreError::Forbidden(format!(
                "user {} is not a master account",
                self.user_id
            )));
        }
        Ok(())
    }

    /// Organization dùng để lọc dữ liệu nghiệp vụ (client/loan/payment).
    ///
    /// Master organization không sở hữu dữ liệu nghiệp vụ.
    pub fn require_tenant(&self) -> CoreResult<i64> {
        if self.is_master() || self.organization_id == MASTER_ORGANIZATION_ID {
            return Err(CoreError::Forbidden(
                "master accounts have no business data".to_string(),
            ));
        }
        Ok(self.organization_id)
    }
}
