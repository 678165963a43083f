//! API constants

/// Every route is mounted under this prefix.
pub const API_PREFIX: &str = "/api";

/// Where the OpenAPI document is served.
pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";

/// Response header telling the client whether it received the uploaded file or a specimen.
pub const DOCUMENT_SOURCE_HEADER: &str = "x-document-source";

/// Bearer failures tolerated per client before it is throttled.
pub const AUTH_MAX_FAILURES: u32 = 10;

/// Window for [`AUTH_MAX_FAILURES`], in seconds.
pub const AUTH_FAILURE_WINDOW_SECS: u64 = 900;

/// Default page size of the realtime access feed.
pub const REALTIME_FEED_LIMIT: usize = 20;

/// Upper bound on `expires_hours` when issuing a code (one year).
pub const MAX_CODE_TTL_HOURS: i64 = 8760;
