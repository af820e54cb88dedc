//! Credential handling and bearer-token management
//!
//! - `credentials`: static basic-auth credentials, read from the
//!   environment at first use
//! - `token`: fetches the upstream bearer token and caches it with an
//!   expiration buffer

pub mod credentials;
pub mod token;

pub use credentials::{CredentialSource, Credentials};
pub use token::TokenManager;
