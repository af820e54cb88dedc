//! Upstream login credentials
//!
//! Credentials are read from the environment when the first operation
//! needs them, not at process start, so containerized deployments can
//! inject them late.

use crate::constants::{ENV_PASSWORD, ENV_USERNAME};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `WTT_USERNAME` / `WTT_PASSWORD`, failing with a message
    /// that names the missing variable.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            username: require_env(ENV_USERNAME)?,
            password: require_env(ENV_PASSWORD)?,
        })
    }
}

/// Where the token manager obtains credentials from.
#[derive(Debug, Clone, Default)]
pub enum CredentialSource {
    /// Resolve from the environment on every fresh token fetch
    #[default]
    Env,
    /// Use fixed credentials (embedders, tests)
    Static(Credentials),
}

impl CredentialSource {
    pub fn resolve(&self) -> Result<Credentials, ApiError> {
        match self {
            CredentialSource::Env => Credentials::from_env(),
            CredentialSource::Static(credentials) => Ok(credentials.clone()),
        }
    }
}

fn require_env(name: &str) -> Result<String, ApiError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Configuration(format!("{name} environment variable is not set")))
}
