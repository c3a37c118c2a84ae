//! Application execution logic.
//!
//! This module wires the platform collaborators into the engine and runs
//! the selected subcommand: the watch loop that streams framed changes
//! until a shutdown signal, or one of the single-shot queries.

use std::future::Future;
use std::io::{self, Write};

use thiserror::Error;
use tokio::signal;
use tokio_stream::{Stream, StreamExt};

use netif_watch::config::{Command, ValidatedConfig};
use netif_watch::encoding::{Framing, Timestamped};
use netif_watch::monitor::{NetworkInterfaces, WatchError};
use netif_watch::network::filter::FilteredEnumerator;
use netif_watch::network::platform::{NetdevActiveLookup, PlatformEnumerator, PlatformNicTypes};
use netif_watch::network::{ActiveInterfaceLookup, InterfaceEnumerator, NicTypeLookup};
use netif_watch::time::{Clock, unix_millis};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A reconciliation pass failed.
    #[error("Failed to read network interfaces: {0}")]
    Watch(#[from] WatchError),

    /// Unexpected stream termination.
    #[error("Change stream terminated unexpectedly")]
    StreamTerminated,

    /// Writing to stdout or stderr failed.
    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Output options extracted from validated config.
#[derive(Debug, Clone, Copy)]
struct OutputOptions {
    framing: Framing,
    warnings: bool,
}

impl From<&ValidatedConfig> for OutputOptions {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            framing: config.framing,
            warnings: config.warnings,
        }
    }
}

/// Executes the configured subcommand.
///
/// # Errors
///
/// Returns an error if:
/// - A reconciliation pass fails to enumerate interfaces
/// - The change stream terminates unexpectedly
/// - Output cannot be written
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires:
/// - Platform-specific network APIs
/// - Real async runtime with signal handling
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let options = OutputOptions::from(&config);
    let watch_options = config.watch_options();

    let engine = NetworkInterfaces::new(
        watch_options,
        FilteredEnumerator::new(PlatformEnumerator::new(), config.filter),
        NetdevActiveLookup::new(config.lookup_timeout),
        PlatformNicTypes::new(config.lookup_timeout),
    );

    let mut stdout = io::stdout();

    if config.command == Command::Watch {
        tracing::info!(
            "Watching network interfaces (max age: {}ms, framing: {})",
            watch_options.max_age.as_millis(),
            options.framing
        );
        let mut stderr = io::stderr();
        return watch(&engine, options, &mut stdout, &mut stderr, shutdown_signal()).await;
    }

    query(&engine, &config.command, options.framing, &mut stdout).await
}

/// Streams framed changes to `out` and framed warnings to `err` until
/// `shutdown` completes.
async fn watch<E, A, N, C, O, W>(
    engine: &NetworkInterfaces<E, A, N, C>,
    options: OutputOptions,
    out: &mut O,
    err: &mut W,
    shutdown: impl Future<Output = ()>,
) -> Result<(), RunError>
where
    E: InterfaceEnumerator + 'static,
    A: ActiveInterfaceLookup + 'static,
    N: NicTypeLookup + 'static,
    C: Clock + Clone + Unpin + 'static,
    O: Write,
    W: Write,
{
    let (mut changes, warnings) = engine.stream(options.framing).await?;
    let mut warnings = options.warnings.then_some(warnings);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping...");
                return Ok(());
            }

            frame = changes.next() => {
                let Some(frame) = frame else {
                    return Err(RunError::StreamTerminated);
                };
                write_frame(out, &frame)?;
            }

            frame = next_or_pending(warnings.as_mut()) => {
                match frame {
                    Some(frame) => write_frame(err, &frame)?,
                    None => warnings = None,
                }
            }
        }
    }
}

/// Runs a single-shot subcommand and writes its result to `out`.
async fn query<E, A, N, C, O>(
    engine: &NetworkInterfaces<E, A, N, C>,
    command: &Command,
    framing: Framing,
    out: &mut O,
) -> Result<(), RunError>
where
    E: InterfaceEnumerator + 'static,
    A: ActiveInterfaceLookup + 'static,
    N: NicTypeLookup + 'static,
    C: Clock + Clone + Unpin + 'static,
    O: Write,
{
    match command {
        Command::State => {
            let snapshot = engine.state().await?;
            let time = unix_millis(engine.clock().now());
            for change in snapshot.changes() {
                match framing.encode(&Timestamped::new(time, &change)) {
                    Ok(frame) => write_frame(out, &frame)?,
                    Err(e) => tracing::error!("Failed to encode {change}: {e}"),
                }
            }
        }
        Command::Active => {
            if let Some(record) = engine.active().await? {
                write_line(out, record.id())?;
            }
        }
        Command::IsLocal { family, address } => {
            let local = engine.is_local_address(*family, address).await?;
            write_line(out, if local { "true" } else { "false" })?;
        }
        Command::PreferInternal { family, address } => {
            let preferred = engine.prefer_internal_for_local(*family, address).await?;
            write_line(out, &preferred)?;
        }
        Command::Watch | Command::Init { .. } => {
            tracing::debug!("Nothing to query for {command:?}");
        }
    }

    out.flush().map_err(RunError::Output)
}

/// Yields the next item of `stream`, or never resolves when there is none.
async fn next_or_pending<S: Stream + Unpin>(stream: Option<&mut S>) -> Option<S::Item> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

fn write_frame<O: Write>(out: &mut O, frame: &str) -> Result<(), RunError> {
    out.write_all(frame.as_bytes())
        .and_then(|()| out.flush())
        .map_err(RunError::Output)
}

fn write_line<O: Write>(out: &mut O, line: &str) -> Result<(), RunError> {
    writeln!(out, "{line}").map_err(RunError::Output)
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
