//! Account records and the persistence boundary.
//!
//! The [`AccountStore`] trait is the only thing the credential service knows
//! about storage. [`postgres::PgStore`] backs production; [`memory::MemoryStore`]
//! backs tests. Implementations carry no business logic.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::token::Purpose;

/// One registered user.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Stored lower-cased; unique.
    pub email: String,
    /// bcrypt hash. Never serialized and stripped before an account leaves
    /// the credential service.
    #[serde(skip)]
    pub password_hash: String,
    pub active: bool,
    pub admin: bool,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Copy with the password hash blanked, safe to hand to callers.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            password_hash: String::new(),
            ..self.clone()
        }
    }
}

/// Insert shape for a new account. Accounts start unconfirmed and active.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// The outstanding token persisted for one account and purpose.
#[derive(Clone, Debug)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique-constraint conflict (email already registered).
    #[error("account already exists")]
    Conflict,
    /// Infrastructure failure; surfaced to callers as a generic internal
    /// error, detail stays in logs.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary consumed by the credential service.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account>;

    /// Lookup by normalized (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Replace the stored password hash and clear any outstanding reset
    /// token as a single unit.
    async fn replace_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    /// Set `email_confirmed` and clear the confirmation token as a single
    /// unit. Confirmation is never undone by this subsystem.
    async fn mark_confirmed(&self, id: Uuid) -> StoreResult<()>;

    /// Overwrites any previous outstanding token of the same purpose for
    /// that account.
    async fn save_token(
        &self,
        id: Uuid,
        purpose: Purpose,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn load_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<Option<StoredToken>>;

    /// Idempotent; clearing an already-absent token is not an error.
    async fn clear_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<()>;
}
