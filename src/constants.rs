// Constants module - centralized default values for configuration
//
// TTLs are heuristics tuned to how often the upstream data actually
// changes; override them through the config structs, not here.

// =============================================================================
// Upstream provider defaults
// =============================================================================

/// Base URL of the Wise Timetable REST API (must end with a slash)
pub const DEFAULT_API_URL: &str = "https://wise-tt.com/WTTWebRestAPI/ws/rest/";

/// Language code sent with every upstream call
pub const DEFAULT_LANGUAGE: &str = "slo";

/// Default HTTP request timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Credential environment variables
// =============================================================================

/// Environment variable holding the upstream username
pub const ENV_USERNAME: &str = "WTT_USERNAME";

/// Environment variable holding the upstream password
pub const ENV_PASSWORD: &str = "WTT_PASSWORD";

// =============================================================================
// Token defaults
// =============================================================================

/// Well-known cache key for the bearer token
pub const TOKEN_CACHE_KEY: &str = "auth_token";

/// Token cache TTL in seconds (25 minutes).
/// The provider's JWTs live about 30 minutes; caching for less keeps an
/// expiration buffer so a cached token is never presented stale.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 25 * 60;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default entry TTL in seconds when a request does not specify one
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10 * 60;

/// Default maximum number of cache entries
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Default interval between background sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

// =============================================================================
// Resolver TTL defaults (per-resource, by upstream volatility)
// =============================================================================

/// Per-school server URL, rarely changes
pub const DEFAULT_SERVER_URL_TTL_SECS: u64 = 60 * 60;

/// School metadata
pub const DEFAULT_SCHOOL_INFO_TTL_SECS: u64 = 30 * 60;

/// Programme list
pub const DEFAULT_PROGRAMMES_TTL_SECS: u64 = 20 * 60;

/// Branch list per programme/year
pub const DEFAULT_BRANCHES_TTL_SECS: u64 = 15 * 60;

/// Group list per branch
pub const DEFAULT_GROUPS_TTL_SECS: u64 = 10 * 60;

/// Lectures, the most volatile resource
pub const DEFAULT_LECTURES_TTL_SECS: u64 = 5 * 60;
