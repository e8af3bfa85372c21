pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        secret_key: SecretString,
        base_url: String,
        confirmation_ttl: u64,
        reset_ttl: u64,
    },
}
