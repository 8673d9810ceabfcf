use std::num::NonZeroUsize;
use std::thread;

/// Port the listener binds when none is supplied.
pub const DEFAULT_LSP_PORT: u16 = 2089;

/// Interface the listener binds when none is supplied.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Returns [`DEFAULT_LOG_FILTER`].
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Worker count used when `--cluster` is omitted: one per available CPU.
pub fn default_cluster_size() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
