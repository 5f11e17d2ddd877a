use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::password::{hash_password, hash_password_blocking, verify_password_blocking};
use super::repo::CredentialStore;
use super::repo_types::User;
use crate::error::{AuthError, StoreError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases an email before it reaches the store.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup and credential verification over an injected store.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    cost: u32,
    // Verified against when the email is unknown, so both failure paths hash once.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, cost: u32) -> anyhow::Result<Self> {
        let dummy_hash = hash_password("authgate-timing-equaliser", cost)?;
        Ok(Self {
            store,
            cost,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Hashes the password and inserts a regular (non-admin) user.
    #[instrument(skip(self, password))]
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, StoreError> {
        self.insert_with_role(email, password, false).await
    }

    #[instrument(skip(self, password))]
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, StoreError> {
        self.insert_with_role(email, password, true).await
    }

    /// Creates the bootstrap admin unless an account with that email exists.
    /// An existing account is left untouched, admin or not.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<User, StoreError> {
        if let Some(existing) = self.store.find_user_by_email(email).await? {
            if !existing.is_admin {
                warn!(user_id = existing.id, "bootstrap admin email belongs to a regular user");
            }
            return Ok(existing);
        }
        let user = self.create_admin(email, password).await?;
        info!(user_id = user.id, "bootstrap admin created");
        Ok(user)
    }

    async fn insert_with_role(
        &self,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        let hash = hash_password_blocking(password.to_owned(), self.cost)
            .await
            .map_err(|e| StoreError::Hashing(e.to_string()))?;
        self.store.insert_user(email, &hash, is_admin).await
    }

    /// Returns the user on a matching password, `InvalidCredentials` otherwise.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.store.find_user_by_email(email).await?;

        let hash = match &user {
            Some(u) => u.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let matches = verify_password_blocking(password.to_owned(), hash)
            .await
            .map_err(|e| {
                error!(error = %e, "verify_password failed");
                AuthError::Internal(e.to_string())
            })?;

        match user {
            Some(u) if matches => Ok(u),
            Some(u) => {
                warn!(user_id = u.id, "login invalid password");
                Err(AuthError::InvalidCredentials)
            }
            None => {
                warn!("login unknown email");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}
