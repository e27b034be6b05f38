use camino::Utf8Path;

use crate::logging::LogFormat;

/// Editor executable started when none is configured.
pub const DEFAULT_NVIM_BIN: &str = "nvim";

/// Grid rows requested at attach time.
pub const DEFAULT_START_ROWS: u32 = 64;

/// Grid columns requested at attach time.
pub const DEFAULT_START_COLS: u32 = 160;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Pending-request count above which a warning is logged.
pub const DEFAULT_PENDING_REQUEST_WARN_THRESHOLD: usize = 64;

/// Default editor executable.
#[must_use]
pub fn default_nvim_bin() -> &'static Utf8Path {
    Utf8Path::new(DEFAULT_NVIM_BIN)
}

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
