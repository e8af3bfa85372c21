use crate::api;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            secret_key,
            base_url,
            confirmation_ttl,
            reset_ttl,
        } => {
            let globals = GlobalArgs::new(secret_key, base_url, confirmation_ttl, reset_ttl);

            api::new(port, dsn, &globals).await?;
        }
    }

    Ok(())
}
