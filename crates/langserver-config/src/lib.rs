//! Shared configuration for the language server cluster.
//!
//! The daemon is configured entirely from its command line: the listening
//! endpoint, the number of workers, protocol strictness, payload tracing and
//! logging. Values carry no protocol semantics themselves; they only shape how
//! the dispatcher and sessions are constructed.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_LSP_PORT, default_cluster_size, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line parsing failed, or help/version output was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// The listening host was blank.
    #[error("listening host must not be empty")]
    EmptyHost,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "langserverd",
    version,
    about = "Accepts language server connections and spreads them across a worker pool"
)]
pub struct Config {
    /// Interface the listener binds to.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port the listener binds to (0 picks an ephemeral port).
    #[arg(short = 'p', long, default_value_t = DEFAULT_LSP_PORT)]
    port: u16,

    /// Number of concurrent workers (defaults to the number of CPUs).
    #[arg(short = 'c', long = "cluster", value_name = "NUM")]
    cluster: Option<NonZeroUsize>,

    /// Enable strict protocol handling.
    #[arg(short = 's', long)]
    strict: bool,

    /// Log every request and response payload.
    #[arg(short = 't', long)]
    trace: bool,

    /// Also log to this file (in addition to stderr).
    #[arg(short = 'l', long = "logfile", value_name = "FILE")]
    log_file: Option<Utf8PathBuf>,

    /// Tracing filter directive, e.g. `info` or `langserver_protocol=debug`.
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// Output format for log lines.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_LSP_PORT,
            cluster: None,
            strict: false,
            trace: false,
            log_file: None,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Parses the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] for invalid flags (including `--help`) and
    /// [`ConfigError::EmptyHost`] when `--host` is blank.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_parse()?.validated()
    }

    /// Parses an explicit argument list; the first item is the binary name.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(self)
    }

    /// Host the listener binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// Port the listener binds to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Number of workers, falling back to the available parallelism.
    #[must_use]
    pub fn cluster_size(&self) -> NonZeroUsize {
        self.cluster.unwrap_or_else(default_cluster_size)
    }

    /// Whether protocol violations are reported instead of tolerated.
    #[must_use]
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Whether every payload is logged.
    #[must_use]
    pub fn trace(&self) -> bool {
        self.trace
    }

    /// Optional file receiving a copy of the log output.
    #[must_use]
    pub fn log_file(&self) -> Option<&Utf8Path> {
        self.log_file.as_deref()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns a copy listening on `host:port`.
    #[must_use]
    pub fn with_listen_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Returns a copy with a fixed worker count.
    #[must_use]
    pub fn with_cluster_size(mut self, size: NonZeroUsize) -> Self {
        self.cluster = Some(size);
        self
    }

    /// Returns a copy with strict protocol handling toggled.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
