//! Configuration loaders for scenarios covering success and failure paths.

use std::num::NonZeroUsize;

use langserver_config::{Config, ConfigError};

use crate::bootstrap::{ConfigLoader, StaticConfigLoader};

/// Loader for a loopback daemon on an ephemeral port with `workers` workers.
pub fn loopback_loader(workers: usize, strict: bool) -> StaticConfigLoader {
    let size = NonZeroUsize::new(workers).expect("at least one worker");
    StaticConfigLoader::new(
        Config::default()
            .with_listen_address("127.0.0.1", 0)
            .with_cluster_size(size)
            .with_strict(strict),
    )
}

/// Loader that intentionally fails by passing an invalid worker count.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load_from_iter(["langserverd", "--cluster", "0"])
    }
}
