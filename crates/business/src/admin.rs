//! Account administration and authentication
//!
//! Passwords are stored as Argon2id PHC strings with a random salt.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::NaiveDate;
use lendbook_core::{
    CoreError, NewUser, OrganizationRepository, RequestContext, User, UserRepository, UserRole,
    MASTER_ORGANIZATION_NAME,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;

/// Request to open an account for an organization
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    /// Created when no organization has this name yet
    pub organization_name: String,
    /// Falls back to the configured standard fee
    pub monthly_fee: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
}

/// Hash a plaintext password into an Argon2id PHC string
pub fn hash_password(password: &str) -> BusinessResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BusinessError::Credential(format!("hash error: {e}")))
}

/// `Ok(false)` on mismatch; `Err` only if the stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> BusinessResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| BusinessError::Credential(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(BusinessError::Credential(format!("verify error: {e}"))),
    }
}

/// Admin Service - accounts and login
pub struct AdminService<'a, S> {
    services: &'a ServiceContext<S>,
}

impl<'a, S> AdminService<'a, S> {
    pub fn new(services: &'a ServiceContext<S>) -> Self {
        Self { services }
    }
}

impl<'a, S> AdminService<'a, S>
where
    S: OrganizationRepository + UserRepository,
{
    /// Create a regular user, creating the organization on first use.
    #[tracing::instrument(skip(self, ctx, account), fields(caller = ctx.user_id, username = %account.username))]
    pub async fn create_user(&self, ctx: &RequestContext, account: NewAccount) -> BusinessResult<User> {
        ctx.require_master()?;

        let username = account.username.trim();
        if username.is_empty() {
            return Err(BusinessError::invalid("username is required"));
        }
        if account.password.is_empty() {
            return Err(BusinessError::invalid("password is required"));
        }
        let org_name = account.organization_name.trim();
        if org_name.is_empty() {
            return Err(BusinessError::invalid("organization name is required"));
        }
        if org_name == MASTER_ORGANIZATION_NAME {
            return Err(BusinessError::invalid("the master organization cannot hold users"));
        }
        let monthly_fee = account
            .monthly_fee
            .unwrap_or(self.services.settings().standard_monthly_fee);
        if monthly_fee <= Decimal::ZERO {
            return Err(BusinessError::invalid("monthly fee must be positive"));
        }

        let store = self.services.store();
        if store.find_user_by_username(username).await?.is_some() {
            return Err(CoreError::Conflict(format!("username '{username}' already exists")).into());
        }

        let organization = store.find_or_create_organization(org_name).await?;
        let user = store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(&account.password)?,
                role: UserRole::User,
                organization_id: organization.id,
                monthly_fee,
                start_date: account.start_date,
            })
            .await?;

        info!(
            user_id = user.id,
            org_id = organization.id,
            fee = %user.monthly_fee,
            "user created"
        );
        Ok(user)
    }

    /// Delete a user together with their organization's business data.
    #[tracing::instrument(skip(self, ctx), fields(caller = ctx.user_id))]
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: i64) -> BusinessResult<()> {
        ctx.require_master()?;
        if user_id == ctx.user_id {
            return Err(CoreError::Forbidden("cannot delete your own account".to_string()).into());
        }
        let store = self.services.store();
        let user = store.find_user(user_id).await?;
        store.delete_user_cascade(user.id).await?;
        warn!(user_id, org_id = user.organization_id, "user and organization data deleted");
        Ok(())
    }

    /// Check credentials and build the caller's context
    pub async fn authenticate(&self, username: &str, password: &str) -> BusinessResult<RequestContext> {
        let user = self
            .services
            .store()
            .find_user_by_username(username.trim())
            .await?
            .ok_or(BusinessError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            warn!(username = %user.username, "login rejected");
            return Err(BusinessError::InvalidCredentials);
        }
        Ok(RequestContext::for_user(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let err = verify_password("hunter2", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, BusinessError::Credential(_)));
    }
}
