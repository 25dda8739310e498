/// Default number of rows returned by list endpoints
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Maximum number of rows a list endpoint will return
pub const MAX_LIST_LIMIT: usize = 100;

// =============================================================================
// HEADERS & COOKIES
// =============================================================================

/// Header carrying the caller identity used for per-user rate limiting
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the CSRF token on mutating requests
pub const CSRF_TOKEN_HEADER: &str = "x-csrf-token";

/// Cookie holding the session id the CSRF token is bound to
pub const SESSION_COOKIE: &str = "sid";

/// Identity used when neither a user header nor a peer address is available
pub const UNKNOWN_IDENTITY: &str = "unknown";
