//! Resolver configuration
//!
//! Every TTL here is a tunable reflecting observed upstream volatility,
//! not a contract. Defaults live in `constants`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::ApiCacheConfig;
use crate::constants::{
    DEFAULT_API_URL, DEFAULT_BRANCHES_TTL_SECS, DEFAULT_GROUPS_TTL_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LANGUAGE, DEFAULT_LECTURES_TTL_SECS,
    DEFAULT_PROGRAMMES_TTL_SECS, DEFAULT_SCHOOL_INFO_TTL_SECS, DEFAULT_SERVER_URL_TTL_SECS,
    DEFAULT_TOKEN_TTL_SECS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableConfig {
    /// Provider base URL; must end with a slash
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Language code sent with every call
    #[serde(default = "default_language")]
    pub language: String,
    /// Rewrite http:// server URLs to https://. Off only for test
    /// harnesses that cannot serve TLS.
    #[serde(default = "default_force_https")]
    pub force_https: bool,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_server_url_ttl_secs")]
    pub server_url_ttl_secs: u64,
    #[serde(default = "default_school_info_ttl_secs")]
    pub school_info_ttl_secs: u64,
    #[serde(default = "default_programmes_ttl_secs")]
    pub programmes_ttl_secs: u64,
    #[serde(default = "default_branches_ttl_secs")]
    pub branches_ttl_secs: u64,
    #[serde(default = "default_groups_ttl_secs")]
    pub groups_ttl_secs: u64,
    #[serde(default = "default_lectures_ttl_secs")]
    pub lectures_ttl_secs: u64,
    #[serde(default)]
    pub cache: ApiCacheConfig,
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            language: default_language(),
            force_https: default_force_https(),
            http_timeout_secs: default_http_timeout_secs(),
            token_ttl_secs: default_token_ttl_secs(),
            server_url_ttl_secs: default_server_url_ttl_secs(),
            school_info_ttl_secs: default_school_info_ttl_secs(),
            programmes_ttl_secs: default_programmes_ttl_secs(),
            branches_ttl_secs: default_branches_ttl_secs(),
            groups_ttl_secs: default_groups_ttl_secs(),
            lectures_ttl_secs: default_lectures_ttl_secs(),
            cache: ApiCacheConfig::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_force_https() -> bool {
    true
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_server_url_ttl_secs() -> u64 {
    DEFAULT_SERVER_URL_TTL_SECS
}

fn default_school_info_ttl_secs() -> u64 {
    DEFAULT_SCHOOL_INFO_TTL_SECS
}

fn default_programmes_ttl_secs() -> u64 {
    DEFAULT_PROGRAMMES_TTL_SECS
}

fn default_branches_ttl_secs() -> u64 {
    DEFAULT_BRANCHES_TTL_SECS
}

fn default_groups_ttl_secs() -> u64 {
    DEFAULT_GROUPS_TTL_SECS
}

fn default_lectures_ttl_secs() -> u64 {
    DEFAULT_LECTURES_TTL_SECS
}

impl TimetableConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn server_url_ttl(&self) -> Duration {
        Duration::from_secs(self.server_url_ttl_secs)
    }

    pub fn school_info_ttl(&self) -> Duration {
        Duration::from_secs(self.school_info_ttl_secs)
    }

    pub fn programmes_ttl(&self) -> Duration {
        Duration::from_secs(self.programmes_ttl_secs)
    }

    pub fn branches_ttl(&self) -> Duration {
        Duration::from_secs(self.branches_ttl_secs)
    }

    pub fn groups_ttl(&self) -> Duration {
        Duration::from_secs(self.groups_ttl_secs)
    }

    pub fn lectures_ttl(&self) -> Duration {
        Duration::from_secs(self.lectures_ttl_secs)
    }

    /// Validate resolver configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("api_url cannot be empty".to_string());
        }
        if !self.api_url.ends_with('/') {
            return Err(format!("api_url must end with '/': {}", self.api_url));
        }
        if self.token_ttl_secs == 0 {
            return Err("token_ttl_secs must be greater than 0".to_string());
        }
        self.cache.validate()
    }
}
