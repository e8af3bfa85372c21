//! In-memory [`AccountStore`] used by tests and local demos.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Account, AccountStore, NewAccount, StoreError, StoreResult, StoredToken};
use crate::auth::token::Purpose;

#[derive(Clone, Debug)]
struct Row {
    account: Account,
    confirmation: Option<StoredToken>,
    reset: Option<StoredToken>,
}

impl Row {
    fn slot(&mut self, purpose: Purpose) -> &mut Option<StoredToken> {
        match purpose {
            Purpose::EmailConfirmation => &mut self.confirmation,
            Purpose::PasswordReset => &mut self.reset,
        }
    }
}

/// Same semantics as the Postgres store, without the database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<Uuid, Row>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        let mut rows = self.rows.write().await;

        if rows.values().any(|row| row.account.email == account.email) {
            return Err(StoreError::Conflict);
        }

        let account = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            active: true,
            admin: false,
            email_confirmed: false,
            created_at: Utc::now(),
        };

        rows.insert(
            account.id,
            Row {
                account: account.clone(),
                confirmation: None,
                reset: None,
            },
        );

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|row| row.account.email == email)
            .map(|row| row.account.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).map(|row| row.account.clone()))
    }

    async fn replace_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.account.password_hash = password_hash.to_string();
            row.reset = None;
        }
        Ok(())
    }

    async fn mark_confirmed(&self, id: Uuid) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.account.email_confirmed = true;
            row.confirmation = None;
        }
        Ok(())
    }

    async fn save_token(
        &self,
        id: Uuid,
        purpose: Purpose,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            *row.slot(purpose) = Some(StoredToken {
                token: token.to_string(),
                expires_at,
            });
        }
        Ok(())
    }

    async fn load_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<Option<StoredToken>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).and_then(|row| match purpose {
            Purpose::EmailConfirmation => row.confirmation.clone(),
            Purpose::PasswordReset => row.reset.clone(),
        }))
    }

    async fn clear_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            *row.slot(purpose) = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_starts_unconfirmed_and_active() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        assert!(account.active);
        assert!(!account.admin);
        assert!(!account.email_confirmed);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        let result = store.insert_account(new_account("ana@example.com")).await;
        assert!(matches!(result, Err(StoreError::Conflict)));
    }

    #[tokio::test]
    async fn save_token_overwrites_previous() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() + chrono::Duration::hours(1);
        store
            .save_token(account.id, Purpose::PasswordReset, "first", expires)
            .await
            .unwrap();
        store
            .save_token(account.id, Purpose::PasswordReset, "second", expires)
            .await
            .unwrap();

        let stored = store
            .load_token(account.id, Purpose::PasswordReset)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.token, "second");
    }

    #[tokio::test]
    async fn token_purposes_are_independent() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        let expires = Utc::now() + chrono::Duration::hours(1);
        store
            .save_token(account.id, Purpose::EmailConfirmation, "confirm", expires)
            .await
            .unwrap();
        store
            .save_token(account.id, Purpose::PasswordReset, "reset", expires)
            .await
            .unwrap();
        store
            .clear_token(account.id, Purpose::PasswordReset)
            .await
            .unwrap();

        assert!(store
            .load_token(account.id, Purpose::PasswordReset)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store
                .load_token(account.id, Purpose::EmailConfirmation)
                .await
                .unwrap()
                .unwrap()
                .token,
            "confirm"
        );
    }

    #[tokio::test]
    async fn clear_absent_token_is_not_an_error() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        store
            .clear_token(account.id, Purpose::EmailConfirmation)
            .await
            .unwrap();
        store
            .clear_token(account.id, Purpose::EmailConfirmation)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn replace_password_clears_reset_token() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        store
            .save_token(
                account.id,
                Purpose::PasswordReset,
                "reset",
                Utc::now() + chrono::Duration::hours(1),
            )
            .await
            .unwrap();
        store
            .replace_password(account.id, "$2b$12$newhashnewhashnewhash")
            .await
            .unwrap();

        assert!(store
            .load_token(account.id, Purpose::PasswordReset)
            .await
            .unwrap()
            .is_none());
        let account = store.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(account.password_hash, "$2b$12$newhashnewhashnewhash");
    }

    #[tokio::test]
    async fn mark_confirmed_clears_confirmation_token() {
        let store = MemoryStore::new();
        let account = store
            .insert_account(new_account("ana@example.com"))
            .await
            .unwrap();

        store
            .save_token(
                account.id,
                Purpose::EmailConfirmation,
                "confirm",
                Utc::now() + chrono::Duration::hours(24),
            )
            .await
            .unwrap();
        store.mark_confirmed(account.id).await.unwrap();

        let account = store.find_by_id(account.id).await.unwrap().unwrap();
        assert!(account.email_confirmed);
        assert!(store
            .load_token(account.id, Purpose::EmailConfirmation)
            .await
            .unwrap()
            .is_none());
    }
}
