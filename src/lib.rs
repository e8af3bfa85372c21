//! # PETdor accounts service
//!
//! Credential backend for the PETdor pet health assessment application.
//! It owns password hashing, issuance and validation of single-use
//! email-confirmation and password-reset tokens, and the account state
//! machine behind registration, login and password recovery.
//!
//! ## Tokens
//!
//! Tokens are signed (HS256) and self-describing: subject, purpose and
//! expiry travel inside the token. The currently-outstanding token per
//! purpose is also persisted per account, which is what enforces
//! single-use semantics: a cryptographically valid token that no longer
//! matches the stored one is rejected.
//!
//! ## Anti-enumeration
//!
//! Login and password-reset requests return the same response whether or
//! not the address is registered. Rejection reasons for tokens are only
//! distinguished in logs, never in responses.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
