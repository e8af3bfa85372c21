pub mod password;
pub mod service;
pub mod token;

pub use self::service::{CredentialError, CredentialService, Registration};
pub use self::token::{Purpose, TokenCodec};
