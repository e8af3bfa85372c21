//! Credential flows: registration, email confirmation, login and password
//! reset.
//!
//! The service is stateless; everything it knows lives behind the injected
//! [`AccountStore`] and [`Mailer`]. Concurrent requests for the same account
//! race at the store: the last `save_token` wins, which is exactly what
//! keeps a single outstanding token per purpose.

use chrono::Utc;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::api::email::{self, Mailer};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{Purpose, TokenCodec, DEFAULT_CONFIRMATION_TTL, DEFAULT_RESET_TTL};
use crate::store::{Account, AccountStore, NewAccount, StoreError};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Response for every reset request, registered address or not.
pub const RESET_REQUEST_MESSAGE: &str =
    "If the email is registered you will receive a reset link";

/// Response for every confirmation resend request.
pub const RESEND_CONFIRMATION_MESSAGE: &str =
    "If the email is registered you will receive a confirmation link";

/// Typed rejections per flow. `Internal` is the only variant whose detail is
/// logged; everything else is a user-facing outcome.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account disabled")]
    AccountDisabled,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::EmailTaken,
            StoreError::Unavailable(err) => Self::Internal(err),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Outcome of a successful registration.
#[derive(Debug)]
pub struct Registration {
    /// The created account, password hash stripped.
    pub account: Account,
    /// False when the confirmation email could not be delivered. The account
    /// exists either way; callers report this as a partial success.
    pub email_delivered: bool,
}

pub struct CredentialService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    codec: TokenCodec,
    base_url: String,
    confirmation_ttl: Duration,
    reset_ttl: Duration,
}

impl CredentialService {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn Mailer>,
        codec: TokenCodec,
        base_url: String,
    ) -> Self {
        Self {
            store,
            mailer,
            codec,
            base_url,
            confirmation_ttl: DEFAULT_CONFIRMATION_TTL,
            reset_ttl: DEFAULT_RESET_TTL,
        }
    }

    /// Override the default token lifetimes.
    #[must_use]
    pub fn with_ttls(mut self, confirmation_ttl: Duration, reset_ttl: Duration) -> Self {
        self.confirmation_ttl = confirmation_ttl;
        self.reset_ttl = reset_ttl;
        self
    }

    /// Register a new account and send the confirmation email.
    ///
    /// A delivery failure does not roll back the account; it is reported via
    /// [`Registration::email_delivered`].
    ///
    /// # Errors
    ///
    /// Rejects on invalid email, short password or an already-registered
    /// address.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Registration, CredentialError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(CredentialError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooShort);
        }

        // Lookup first so we never hash for an address that is taken; the
        // insert still maps a unique violation to the same rejection, which
        // covers the lookup/insert race.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(CredentialError::EmailTaken);
        }

        let password_hash = hash_password(password).map_err(CredentialError::Internal)?;
        let account = self
            .store
            .insert_account(NewAccount {
                name: name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        info!(account_id = %account.id, "account created");

        let email_delivered = self.send_confirmation(&account).await?;

        Ok(Registration {
            account: account.sanitized(),
            email_delivered,
        })
    }

    /// Consume a confirmation token and mark the account confirmed.
    ///
    /// Re-confirming an already-confirmed account succeeds without mutation.
    ///
    /// # Errors
    ///
    /// Rejects uniformly on any token failure, including a token superseded
    /// by a newer one.
    #[instrument(skip_all)]
    pub async fn confirm_email(&self, token: &str) -> Result<(), CredentialError> {
        let subject = self
            .codec
            .parse(token, Purpose::EmailConfirmation)
            .map_err(|_| CredentialError::InvalidToken)?;

        let account = self
            .store
            .find_by_email(&subject)
            .await?
            .ok_or(CredentialError::InvalidToken)?;

        if account.email_confirmed {
            debug!(account_id = %account.id, "email already confirmed");
            return Ok(());
        }

        match self
            .store
            .load_token(account.id, Purpose::EmailConfirmation)
            .await?
        {
            Some(stored) if stored.token == token => {}
            _ => {
                // Consumed or superseded; the signed token itself may still
                // be within its lifetime.
                debug!(account_id = %account.id, "confirmation token missing or superseded");
                return Err(CredentialError::InvalidToken);
            }
        }

        self.store.mark_confirmed(account.id).await?;
        info!(account_id = %account.id, "email confirmed");

        Ok(())
    }

    /// Re-issue and send a confirmation token.
    ///
    /// Succeeds for unknown addresses and already-confirmed accounts so the
    /// response never reveals whether an address is registered.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures surface.
    #[instrument(skip_all)]
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), CredentialError> {
        let email = normalize_email(email);
        let Some(account) = self.store.find_by_email(&email).await? else {
            debug!("confirmation resend requested for unknown email");
            return Ok(());
        };
        if account.email_confirmed {
            debug!(account_id = %account.id, "confirmation resend for confirmed account");
            return Ok(());
        }

        self.send_confirmation(&account).await?;

        Ok(())
    }

    /// Check credentials and return the account, password hash stripped.
    ///
    /// # Errors
    ///
    /// An unknown email and a wrong password yield the same rejection so
    /// addresses cannot be enumerated. An inactive account gets a specific
    /// message; its existence is already implied by the password check.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, CredentialError> {
        let email = normalize_email(email);

        let Some(account) = self.store.find_by_email(&email).await? else {
            return Err(CredentialError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash) {
            return Err(CredentialError::InvalidCredentials);
        }

        if !account.active {
            return Err(CredentialError::AccountDisabled);
        }

        info!(account_id = %account.id, "login successful");

        Ok(account.sanitized())
    }

    /// Issue a reset token and send the reset email.
    ///
    /// Always succeeds for unknown addresses, and a delivery failure is only
    /// logged: the caller sees the same generic outcome in every case.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures surface.
    #[instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), CredentialError> {
        let email = normalize_email(email);

        let Some(account) = self.store.find_by_email(&email).await? else {
            debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = self
            .codec
            .issue(&account.email, Purpose::PasswordReset, self.reset_ttl)
            .map_err(CredentialError::Internal)?;
        let expires_at = expiry_instant(self.reset_ttl)?;

        self.store
            .save_token(account.id, Purpose::PasswordReset, &token, expires_at)
            .await?;

        let message = email::reset_message(&self.base_url, &account.email, &token);
        if let Err(err) = self.mailer.send(&message) {
            error!(account_id = %account.id, "reset email delivery failed: {err}");
        } else {
            info!(account_id = %account.id, "reset email queued");
        }

        Ok(())
    }

    /// Consume a reset token and replace the password.
    ///
    /// The stored token is cleared together with the hash replacement so it
    /// can never be consumed twice.
    ///
    /// # Errors
    ///
    /// Rejects uniformly on any token failure; rejects a too-short new
    /// password without consuming the token.
    #[instrument(skip_all)]
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let subject = self
            .codec
            .parse(token, Purpose::PasswordReset)
            .map_err(|_| CredentialError::InvalidToken)?;

        let account = self
            .store
            .find_by_email(&subject)
            .await?
            .ok_or(CredentialError::InvalidToken)?;

        let Some(stored) = self
            .store
            .load_token(account.id, Purpose::PasswordReset)
            .await?
        else {
            debug!(account_id = %account.id, "reset token already consumed");
            return Err(CredentialError::InvalidToken);
        };

        if stored.expires_at <= Utc::now() {
            // Expiry detection clears the stored token.
            self.store
                .clear_token(account.id, Purpose::PasswordReset)
                .await?;
            debug!(account_id = %account.id, "stored reset token expired");
            return Err(CredentialError::InvalidToken);
        }

        if stored.token != token {
            debug!(account_id = %account.id, "reset token superseded");
            return Err(CredentialError::InvalidToken);
        }

        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooShort);
        }

        let password_hash = hash_password(new_password).map_err(CredentialError::Internal)?;
        self.store
            .replace_password(account.id, &password_hash)
            .await?;

        info!(account_id = %account.id, "password reset completed");

        Ok(())
    }

    /// Issue, persist and send a confirmation token. Returns whether the
    /// email went out; a delivery failure is never fatal.
    async fn send_confirmation(&self, account: &Account) -> Result<bool, CredentialError> {
        let token = self
            .codec
            .issue(&account.email, Purpose::EmailConfirmation, self.confirmation_ttl)
            .map_err(CredentialError::Internal)?;
        let expires_at = expiry_instant(self.confirmation_ttl)?;

        self.store
            .save_token(account.id, Purpose::EmailConfirmation, &token, expires_at)
            .await?;

        let message = email::confirmation_message(&self.base_url, &account.email, &token);
        match self.mailer.send(&message) {
            Ok(()) => Ok(true),
            Err(err) => {
                error!(account_id = %account.id, "confirmation email delivery failed: {err}");
                Ok(false)
            }
        }
    }
}

fn expiry_instant(ttl: Duration) -> Result<chrono::DateTime<Utc>, CredentialError> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|err| CredentialError::Internal(anyhow::Error::new(err).context("ttl out of range")))?;
    Ok(Utc::now() + ttl)
}
