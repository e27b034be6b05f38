//! Layered configuration for the Quill front-end.
//!
//! Values are resolved by `ortho_config` from, in increasing precedence:
//! built-in defaults, a TOML file (`--config-path` or `QUILL_CONFIG_PATH`),
//! `QUILL_*` environment variables and command-line flags. Unset values fall
//! back to the defaults in [`defaults`](crate::DEFAULT_NVIM_BIN) through the
//! accessors on [`Config`].

mod args;
mod defaults;
mod logging;

use std::ffi::OsString;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::args::{LaunchArguments, split_launch_arguments};
pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_NVIM_BIN, DEFAULT_PENDING_REQUEST_WARN_THRESHOLD,
    DEFAULT_START_COLS, DEFAULT_START_ROWS, default_log_filter, default_log_format,
    default_nvim_bin,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Errors raised while resolving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[source] Arc<OrthoError>),

    /// The start geometry has no cells.
    #[error("start geometry must be at least 1x1, got {cols}x{rows}")]
    EmptyGeometry {
        /// Configured columns.
        cols: u32,
        /// Configured rows.
        rows: u32,
    },
}

/// Front-end configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "QUILL")]
pub struct Config {
    /// Editor executable, started as `<nvim_bin> --embed`.
    nvim_bin: Option<Utf8PathBuf>,
    /// Grid rows requested when attaching.
    start_rows: Option<u32>,
    /// Grid columns requested when attaching.
    start_cols: Option<u32>,
    /// `tracing` filter directives.
    log_filter: Option<String>,
    /// Log output format.
    log_format: Option<LogFormat>,
    /// Pending-request count that triggers a warning.
    pending_request_warn_threshold: Option<usize>,
    /// Print the final grid contents to stdout on exit.
    dump_grid_on_exit: Option<bool>,
}

impl Config {
    /// Resolves every layer, using `args` as the command line.
    ///
    /// `args` must start with the program name; see
    /// [`split_launch_arguments`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer is malformed and
    /// [`ConfigError::EmptyGeometry`] when the start geometry has no cells.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = OsString>,
    {
        let config = Self::load_from_iter(args).map_err(ConfigError::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that every layer may set but not every value is valid.
    ///
    /// # Errors
    ///
    /// See [`Config::from_args`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (cols, rows) = (self.start_cols(), self.start_rows());
        if cols == 0 || rows == 0 {
            return Err(ConfigError::EmptyGeometry { cols, rows });
        }
        Ok(())
    }

    /// Editor executable.
    #[must_use]
    pub fn nvim_bin(&self) -> &Utf8Path {
        self.nvim_bin
            .as_deref()
            .unwrap_or_else(|| default_nvim_bin())
    }

    /// Grid rows requested when attaching.
    #[must_use]
    pub fn start_rows(&self) -> u32 {
        self.start_rows.unwrap_or(DEFAULT_START_ROWS)
    }

    /// Grid columns requested when attaching.
    #[must_use]
    pub fn start_cols(&self) -> u32 {
        self.start_cols.unwrap_or(DEFAULT_START_COLS)
    }

    /// `tracing` filter directives.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Pending-request count that triggers a warning.
    #[must_use]
    pub fn pending_request_warn_threshold(&self) -> usize {
        self.pending_request_warn_threshold
            .unwrap_or(DEFAULT_PENDING_REQUEST_WARN_THRESHOLD)
    }

    /// Whether the final grid is printed on exit.
    #[must_use]
    pub const fn dump_grid_on_exit(&self) -> bool {
        matches!(self.dump_grid_on_exit, Some(true))
    }
}
