//! End-to-end credential flows against the in-memory store.

use petdor::api::email::{EmailMessage, Mailer};
use petdor::auth::{CredentialError, CredentialService, TokenCodec};
use petdor::store::memory::MemoryStore;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    fn last_token(&self) -> String {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last().expect("no email sent").body;
        body.split("token=")
            .nth(1)
            .expect("no token link in body")
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn service_with_ttls(
    confirmation_ttl: Duration,
    reset_ttl: Duration,
) -> (CredentialService, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let codec = TokenCodec::new(&SecretString::from(
        "an-integration-test-secret-of-32b!".to_string(),
    ))
    .unwrap();
    let service = CredentialService::new(
        Arc::new(MemoryStore::new()),
        mailer.clone(),
        codec,
        "http://localhost:8080".to_string(),
    )
    .with_ttls(confirmation_ttl, reset_ttl);
    (service, mailer)
}

fn service() -> (CredentialService, Arc<RecordingMailer>) {
    service_with_ttls(Duration::from_secs(86_400), Duration::from_secs(3_600))
}

#[tokio::test]
async fn signup_confirm_login() {
    let (service, mailer) = service();

    let registration = service
        .register("Ana", "ana@example.com", "correct horse battery")
        .await
        .unwrap();
    assert!(registration.email_delivered);
    assert!(!registration.account.email_confirmed);

    let token = mailer.last_token();
    service.confirm_email(&token).await.unwrap();

    let account = service
        .login("ana@example.com", "correct horse battery")
        .await
        .unwrap();
    assert!(account.email_confirmed);
    assert!(account.password_hash.is_empty());
}

#[tokio::test]
async fn expired_confirmation_token_forces_a_resend() {
    let (service, mailer) = service_with_ttls(Duration::from_secs(1), Duration::from_secs(3_600));

    service
        .register("Ana", "ana@example.com", "correct horse battery")
        .await
        .unwrap();
    let stale = mailer.last_token();

    // Outlive the one-second token lifetime.
    tokio::time::sleep(Duration::from_millis(2_500)).await;

    assert!(matches!(
        service.confirm_email(&stale).await,
        Err(CredentialError::InvalidToken)
    ));

    // A fresh token still works; the stale one is gone for good.
    service.resend_confirmation("ana@example.com").await.unwrap();
    let fresh = mailer.last_token();
    assert_ne!(stale, fresh);
    service.confirm_email(&fresh).await.unwrap();
}

#[tokio::test]
async fn password_reset_without_prior_confirmation() {
    let (service, mailer) = service();

    service
        .register("Ana", "ana@example.com", "original password")
        .await
        .unwrap();

    service
        .request_password_reset("ana@example.com")
        .await
        .unwrap();
    let token = mailer.last_token();

    service
        .complete_password_reset(&token, "replacement pass")
        .await
        .unwrap();

    // Old credentials are dead, new ones work; the reset never touched the
    // confirmation state.
    assert!(matches!(
        service.login("ana@example.com", "original password").await,
        Err(CredentialError::InvalidCredentials)
    ));
    let account = service
        .login("ana@example.com", "replacement pass")
        .await
        .unwrap();
    assert!(!account.email_confirmed);

    // And the token was single-use.
    assert!(matches!(
        service
            .complete_password_reset(&token, "third password!")
            .await,
        Err(CredentialError::InvalidToken)
    ));
}
