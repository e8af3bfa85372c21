use secrecy::SecretString;
use std::time::Duration;

/// Process-wide configuration loaded once at startup.
#[derive(Clone)]
pub struct GlobalArgs {
    pub secret_key: SecretString,
    pub base_url: String,
    pub confirmation_ttl: Duration,
    pub reset_ttl: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(
        secret_key: SecretString,
        base_url: String,
        confirmation_ttl_secs: u64,
        reset_ttl_secs: u64,
    ) -> Self {
        Self {
            secret_key,
            base_url,
            confirmation_ttl: Duration::from_secs(confirmation_ttl_secs),
            reset_ttl: Duration::from_secs(reset_ttl_secs),
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .field("confirmation_ttl", &self.confirmation_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}
