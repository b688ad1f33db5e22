use std::time::Duration;

/// Upper bound on a single store query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Events per page on the day view.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long to wait for a pooled connection before giving up.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Minimum length for titles and locations.
pub const MIN_TEXT_LEN: usize = 3;
