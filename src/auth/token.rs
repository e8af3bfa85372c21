//! Purpose-tagged, time-limited tokens for email confirmation and password
//! reset.
//!
//! Tokens are HS256-signed JWTs carrying subject, purpose, issued-at and
//! expiry. Parsing rejects uniformly: bad signature, wrong purpose and
//! expiry all surface as the same [`TokenRejected`] value, with the distinct
//! reason recorded in logs only.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Minimum signing-secret length in bytes. A shorter secret is a fatal
/// configuration error at startup, never silently accepted.
pub const MIN_SECRET_BYTES: usize = 32;

/// Default lifetime for email confirmation tokens (24 hours).
pub const DEFAULT_CONFIRMATION_TTL: Duration = Duration::from_secs(86_400);

/// Default lifetime for password reset tokens (1 hour).
pub const DEFAULT_RESET_TTL: Duration = Duration::from_secs(3_600);

/// The single intended use of a token. A token minted for one flow can never
/// be consumed by another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    EmailConfirmation,
    PasswordReset,
}

impl Purpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailConfirmation => "email_confirmation",
            Self::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform rejection. Callers cannot tell from this value why a token
/// failed; only logs distinguish the reason.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid or expired token")]
pub struct TokenRejected;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    purpose: Purpose,
    iat: i64,
    exp: i64,
    /// Unique per issuance. `iat`/`exp` only have second resolution, so
    /// without it two same-second issuances would collide and a re-request
    /// could not supersede the outstanding token.
    jti: String,
}

/// Issues and validates signed tokens with a process-wide secret.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    /// Build a codec from the signing secret.
    ///
    /// # Errors
    ///
    /// Fails when the secret is shorter than [`MIN_SECRET_BYTES`].
    pub fn new(secret: &SecretString) -> Result<Self> {
        let bytes = secret.expose_secret().as_bytes();
        if bytes.len() < MIN_SECRET_BYTES {
            anyhow::bail!(
                "signing secret must be at least {MIN_SECRET_BYTES} bytes, got {}",
                bytes.len()
            );
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    /// Issue a signed token for `subject`, valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or `ttl` is out of range.
    pub fn issue(&self, subject: &str, purpose: Purpose, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).context("token ttl out of range")?;

        let claims = Claims {
            sub: subject.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding).context("failed to sign token")
    }

    /// Validate `token` and return its subject.
    ///
    /// # Errors
    ///
    /// Rejects uniformly on bad signature, wrong purpose or expiry.
    pub fn parse(&self, token: &str, expected: Purpose) -> Result<String, TokenRejected> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            debug!("token rejected: {err}");
            TokenRejected
        })?;

        if data.claims.purpose != expected {
            debug!(
                expected = expected.as_str(),
                got = data.claims.purpose.as_str(),
                "token rejected: purpose mismatch"
            );
            return Err(TokenRejected);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        let secret = SecretString::from("0123456789abcdef0123456789abcdef".to_string());
        TokenCodec::new(&secret).unwrap()
    }

    #[test]
    fn issue_then_parse_returns_subject() {
        let codec = codec();
        let token = codec
            .issue("ana@example.com", Purpose::EmailConfirmation, DEFAULT_CONFIRMATION_TTL)
            .unwrap();

        let subject = codec.parse(&token, Purpose::EmailConfirmation).unwrap();
        assert_eq!(subject, "ana@example.com");
    }

    #[test]
    fn purpose_mismatch_is_rejected_both_ways() {
        let codec = codec();

        let confirmation = codec
            .issue("a@example.com", Purpose::EmailConfirmation, DEFAULT_CONFIRMATION_TTL)
            .unwrap();
        let reset = codec
            .issue("a@example.com", Purpose::PasswordReset, DEFAULT_RESET_TTL)
            .unwrap();

        assert_eq!(
            codec.parse(&confirmation, Purpose::PasswordReset),
            Err(TokenRejected)
        );
        assert_eq!(
            codec.parse(&reset, Purpose::EmailConfirmation),
            Err(TokenRejected)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();

        // Hand-encode claims with an expiry in the past; the signature is
        // valid, only the clock check fails.
        let claims = Claims {
            sub: "a@example.com".to_string(),
            purpose: Purpose::PasswordReset,
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &codec.encoding).unwrap();

        assert_eq!(codec.parse(&token, Purpose::PasswordReset), Err(TokenRejected));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let codec = codec();
        let other = TokenCodec::new(&SecretString::from(
            "ffffffffffffffffffffffffffffffff".to_string(),
        ))
        .unwrap();

        let token = other
            .issue("a@example.com", Purpose::EmailConfirmation, DEFAULT_CONFIRMATION_TTL)
            .unwrap();

        assert_eq!(
            codec.parse(&token, Purpose::EmailConfirmation),
            Err(TokenRejected)
        );
    }

    #[test]
    fn back_to_back_issues_are_distinct_strings() {
        let codec = codec();

        // Two issuances within the same second must still produce different
        // tokens, or re-requesting a token could never supersede the
        // previous one.
        let first = codec
            .issue("a@example.com", Purpose::PasswordReset, DEFAULT_RESET_TTL)
            .unwrap();
        let second = codec
            .issue("a@example.com", Purpose::PasswordReset, DEFAULT_RESET_TTL)
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(codec.parse(&first, Purpose::PasswordReset).unwrap(), "a@example.com");
        assert_eq!(codec.parse(&second, Purpose::PasswordReset).unwrap(), "a@example.com");
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = codec();

        assert_eq!(codec.parse("", Purpose::PasswordReset), Err(TokenRejected));
        assert_eq!(
            codec.parse("not.a.token", Purpose::PasswordReset),
            Err(TokenRejected)
        );
    }

    #[test]
    fn short_secret_is_a_startup_error() {
        let secret = SecretString::from("too-short".to_string());
        assert!(TokenCodec::new(&secret).is_err());
    }

    #[test]
    fn purpose_serializes_snake_case() {
        assert_eq!(Purpose::EmailConfirmation.as_str(), "email_confirmation");
        assert_eq!(Purpose::PasswordReset.as_str(), "password_reset");
        assert_eq!(
            serde_json::to_string(&Purpose::EmailConfirmation).unwrap(),
            "\"email_confirmation\""
        );
    }
}
