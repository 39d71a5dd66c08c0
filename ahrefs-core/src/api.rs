//! Ahrefs API v3 constants and transport metadata
//!
//! Values shared by the HTTP client, the renderers and the tests.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const BASE_URL: &str = "https://api.ahrefs.com/v3";

/// Default per-attempt timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff between attempts; attempt `n` waits `n` times this value
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("ahrefs-cli/", env!("CARGO_PKG_VERSION"));

/// Response header carrying the API units billed for a request
pub const HEADER_UNITS_CONSUMED: &str = "x-api-units-consumed";

/// Response header carrying the remaining rate limit budget
pub const HEADER_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Endpoint used to check that an API key is accepted
pub const LIMITS_AND_USAGE_ENDPOINT: &str = "/subscription-info/limits-and-usage";

/// Transport metadata attached to a successful response
///
/// Counters are only reported when the server sent a positive value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Wall-clock latency of the attempt that succeeded
    pub response_time_ms: u64,
    /// API units consumed by the request
    #[serde(default, skip_serializing_if = "not_positive")]
    pub units_consumed: Option<u64>,
    /// Requests left in the current rate limit window
    #[serde(default, skip_serializing_if = "not_positive")]
    pub rate_limit_remaining: Option<u64>,
}

fn not_positive(value: &Option<u64>) -> bool {
    !matches!(value, Some(count) if *count > 0)
}

/// Parse a numeric response header, ignoring anything malformed
pub fn parse_header_count(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
