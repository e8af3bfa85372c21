//! Postgres-backed [`AccountStore`].
//!
//! Thin persistence layer: every method is one statement (token writes fold
//! the related column updates into the same `UPDATE`), so the last write
//! wins under concurrency and the single-outstanding-token invariant holds
//! without explicit locking.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{Account, AccountStore, NewAccount, StoreError, StoreResult, StoredToken};
use crate::auth::token::Purpose;

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, active, admin, email_confirmed, created_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `accounts` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL cannot be executed.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let query = r"
            CREATE TABLE IF NOT EXISTS accounts (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                admin BOOLEAN NOT NULL DEFAULT FALSE,
                email_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
                confirmation_token TEXT,
                confirmation_token_expires TIMESTAMPTZ,
                reset_token TEXT,
                reset_token_expires TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE TABLE",
            db.statement = query
        );
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to create accounts table")?;

        Ok(())
    }
}

/// Column pair holding the outstanding token and its expiry for a purpose.
const fn token_columns(purpose: Purpose) -> (&'static str, &'static str) {
    match purpose {
        Purpose::EmailConfirmation => ("confirmation_token", "confirmation_token_expires"),
        Purpose::PasswordReset => ("reset_token", "reset_token_expires"),
    }
}

fn row_to_account(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        active: row.get("active"),
        admin: row.get("admin"),
        email_confirmed: row.get("email_confirmed"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_account(&self, account: NewAccount) -> StoreResult<Account> {
        let query = format!(
            "INSERT INTO accounts (name, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(row_to_account(&row)),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(StoreError::Unavailable(
                anyhow::Error::new(err).context("failed to insert account"),
            )),
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by email")?;

        Ok(row.as_ref().map(row_to_account))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by id")?;

        Ok(row.as_ref().map(row_to_account))
    }

    async fn replace_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        // Single statement so the new hash and the token clear cannot be
        // observed separately.
        let query = "UPDATE accounts SET password_hash = $1, reset_token = NULL, \
                     reset_token_expires = NULL WHERE id = $2";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to replace password")?;

        Ok(())
    }

    async fn mark_confirmed(&self, id: Uuid) -> StoreResult<()> {
        let query = "UPDATE accounts SET email_confirmed = TRUE, confirmation_token = NULL, \
                     confirmation_token_expires = NULL WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark account confirmed")?;

        Ok(())
    }

    async fn save_token(
        &self,
        id: Uuid,
        purpose: Purpose,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let (token_col, expires_col) = token_columns(purpose);
        let query =
            format!("UPDATE accounts SET {token_col} = $1, {expires_col} = $2 WHERE id = $3");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        sqlx::query(&query)
            .bind(token)
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to save token")?;

        Ok(())
    }

    async fn load_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<Option<StoredToken>> {
        let (token_col, expires_col) = token_columns(purpose);
        let query = format!("SELECT {token_col}, {expires_col} FROM accounts WHERE id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to load token")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token: Option<String> = row.get(0);
        let expires_at: Option<DateTime<Utc>> = row.get(1);

        // A token without an expiry is invalid by construction.
        Ok(match (token, expires_at) {
            (Some(token), Some(expires_at)) => Some(StoredToken { token, expires_at }),
            _ => None,
        })
    }

    async fn clear_token(&self, id: Uuid, purpose: Purpose) -> StoreResult<()> {
        let (token_col, expires_col) = token_columns(purpose);
        let query =
            format!("UPDATE accounts SET {token_col} = NULL, {expires_col} = NULL WHERE id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query.as_str()
        );
        sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to clear token")?;

        Ok(())
    }
}
