//! netif-watch: network interface and address watcher
//!
//! Parses the command line, resolves configuration and hands the selected
//! subcommand to [`run::execute`].

use std::path::Path;
use std::process::ExitCode;

use netif_watch::config::{Cli, Command, ValidatedConfig, write_default_config};

mod app;
mod run;

use app::{exit_code, print_config_hint, setup_tracing};

#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // `init` must work even when the config file it would replace is broken.
    if let Some(Command::Init { output }) = &cli.command {
        return write_template(output);
    }

    match ValidatedConfig::load(&cli) {
        Ok(config) => {
            setup_tracing(config.verbose);
            tracing::debug!("{config}");
            block_on_command(config)
        }
        Err(e) => {
            eprintln!("Configuration error: {e}");
            print_config_hint(&e);
            exit_code::CONFIG_ERROR
        }
    }
}

fn write_template(output: &Path) -> ExitCode {
    if let Err(e) = write_default_config(output) {
        eprintln!("Error: {e}");
        return exit_code::CONFIG_ERROR;
    }
    println!("Configuration template written to: {}", output.display());
    exit_code::SUCCESS
}

/// Runs the subcommand on a multi-threaded runtime and maps the outcome to an exit code.
#[cfg(not(tarpaulin_include))]
fn block_on_command(config: ValidatedConfig) -> ExitCode {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    runtime
        .block_on(run::execute(config))
        .map_or_else(
            |e| {
                tracing::error!("Application error: {e}");
                exit_code::runtime_error()
            },
            |()| exit_code::SUCCESS,
        )
}
