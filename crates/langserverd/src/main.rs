use std::process::ExitCode;

use langserver_config::ConfigError;
use langserverd::{BootstrapError, LaunchError};

fn main() -> ExitCode {
    match langserverd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(LaunchError::Bootstrap {
            source:
                BootstrapError::Configuration {
                    source: ConfigError::Cli(error),
                },
        }) => error.exit(),
        Err(error) => {
            eprintln!("langserverd: {error}");
            ExitCode::FAILURE
        }
    }
}
