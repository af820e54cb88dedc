//! Cache error types
//!
//! The cache stores plain JSON values and has no knowledge of the API
//! layer, so its error type stays independent of `ApiError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be converted to or from its stored JSON form
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_converts_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json}").unwrap_err();
        let cache_err: CacheError = serde_err.into();
        matches!(cache_err, CacheError::Serialization(_));
    }

    #[test]
    fn test_cache_error_implements_error_trait() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<CacheError>();
    }
}
