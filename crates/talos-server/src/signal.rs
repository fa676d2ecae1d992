//! OS signal handling.
//!
//! The service stops on SIGINT, SIGQUIT, or SIGTERM; all three mean the
//! same thing. The first signal starts a graceful drain, a second one cuts
//! the drain short. That policy lives in the lifecycle controller; this
//! module only reports which signal arrived.

use crate::shutdown::ShutdownSignal;

/// The OS signal that asked the service to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGQUIT.
    Quit,
    /// SIGTERM.
    Terminate,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Quit => "SIGQUIT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Waits for the next stop signal.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be registered.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let received = tokio::select! {
        _ = sigint.recv() => Signal::Interrupt,
        _ = sigquit.recv() => Signal::Quit,
        _ = sigterm.recv() => Signal::Terminate,
    };

    Ok(received)
}

/// Waits for the next stop signal.
///
/// On non-Unix platforms only Ctrl+C is available.
///
/// # Errors
///
/// Returns an error if the Ctrl+C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    tokio::signal::ctrl_c().await?;
    Ok(Signal::Interrupt)
}

/// Spawns the watcher implementing the two-stage stop policy.
///
/// The first signal triggers `shutdown` and starts the graceful drain; a
/// second signal triggers `forced`, which abandons whatever is still in
/// flight.
pub fn spawn_watcher(shutdown: ShutdownSignal, forced: ShutdownSignal) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(received) => {
                tracing::info!(signal = %received, "stop signal received, draining");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register signal handlers");
                shutdown.trigger();
                return;
            }
        }

        match wait_for_signal().await {
            Ok(received) => {
                tracing::warn!(signal = %received, "second stop signal, forcing shutdown");
                forced.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to re-register signal handlers");
            }
        }
    });
}
