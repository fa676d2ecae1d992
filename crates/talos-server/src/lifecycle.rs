//! The lifecycle controller.
//!
//! Drives the whole service through its four states:
//!
//! ```text
//! Starting ──open datastore──▶ Serving ──stop signal──▶ Draining ──▶ Stopped
//! ```
//!
//! Startup is ordered bind, then datastore open, then accept: a datastore
//! that fails to open aborts before a single connection is taken. Once
//! serving, the first stop signal closes the listener and drains in-flight
//! connections; the datastore is closed exactly once after the drain ends,
//! whatever way it ends. A close failure is logged but never turns a clean
//! shutdown into an error.

use thiserror::Error;
use tokio::sync::watch;

use talos_config::{ConfigError, TalosConfig};
use talos_core::{Datastore, DatastoreError};

use crate::handler::HandlerRegistry;
use crate::server::{Server, ServerError};
use crate::shutdown::{DrainOutcome, ShutdownSignal};
use crate::signal;
use crate::state::{ServerState, SharedState};

/// Errors that abort the lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Configuration failed to load or validate.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The listener could not start.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The datastore failed to open during startup.
    #[error(transparent)]
    Datastore(#[from] DatastoreError),
}

/// Owns the service from startup through shutdown.
///
/// # Example
///
/// ```rust,ignore
/// use talos_config::TalosConfig;
/// use talos_server::{HandlerRegistry, Lifecycle};
///
/// let config = TalosConfig::load_profile("prod", None)?;
/// let mut registry = HandlerRegistry::new();
/// // ... register routes ...
///
/// Lifecycle::new(config, registry).run().await?;
/// ```
pub struct Lifecycle {
    config: TalosConfig,
    registry: HandlerRegistry,
    datastore: Option<Box<dyn Datastore>>,
    shutdown: ShutdownSignal,
    forced: ShutdownSignal,
    state: SharedState,
    bound_tx: watch::Sender<Option<std::net::SocketAddr>>,
    bound_rx: watch::Receiver<Option<std::net::SocketAddr>>,
}

impl Lifecycle {
    /// Creates a controller for the given configuration and routes.
    #[must_use]
    pub fn new(config: TalosConfig, registry: HandlerRegistry) -> Self {
        let (bound_tx, bound_rx) = watch::channel(None);
        Self {
            config,
            registry,
            datastore: None,
            shutdown: ShutdownSignal::new(),
            forced: ShutdownSignal::new(),
            state: SharedState::new(),
            bound_tx,
            bound_rx,
        }
    }

    /// Attaches the datastore opened before serving and closed after drain.
    #[must_use]
    pub fn with_datastore(mut self, datastore: impl Datastore) -> Self {
        self.datastore = Some(Box::new(datastore));
        self
    }

    /// A handle that triggers graceful shutdown when fired.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// A handle that cuts the drain short when fired.
    #[must_use]
    pub fn forced_handle(&self) -> ShutdownSignal {
        self.forced.clone()
    }

    /// The shared lifecycle state, observable from other tasks.
    #[must_use]
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Reports the listener address once bound.
    ///
    /// Starts as `None` and flips to `Some(addr)` when the listener is up;
    /// useful when the configuration asks for port 0.
    #[must_use]
    pub fn bound_addr(&self) -> watch::Receiver<Option<std::net::SocketAddr>> {
        self.bound_rx.clone()
    }

    /// Runs the service until an OS stop signal arrives.
    ///
    /// SIGINT, SIGQUIT, and SIGTERM all start a graceful drain; a second
    /// signal abandons whatever is still in flight.
    ///
    /// # Errors
    ///
    /// Fails when the datastore cannot open or the listener cannot start.
    pub async fn run(self) -> Result<(), LifecycleError> {
        signal::spawn_watcher(self.shutdown.clone(), self.forced.clone());
        self.run_until_shutdown().await
    }

    /// Runs the service until [`Lifecycle::shutdown_handle`] is triggered.
    ///
    /// No OS signal handlers are installed; shutdown is entirely under the
    /// caller's control.
    ///
    /// # Errors
    ///
    /// Fails when the datastore cannot open or the listener cannot start.
    pub async fn run_until_shutdown(mut self) -> Result<(), LifecycleError> {
        tracing::info!(listen = %self.config.listen, "starting");

        let mut datastore = self.datastore.take();
        let result = self.phases(&mut datastore).await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "lifecycle aborted");
        }
        self.state.advance(ServerState::Stopped);
        tracing::info!("stopped");

        result
    }

    async fn phases(
        &mut self,
        datastore: &mut Option<Box<dyn Datastore>>,
    ) -> Result<(), LifecycleError> {
        let registry = std::mem::take(&mut self.registry);
        let server = Server::new(self.config.clone(), registry, self.state.clone());
        let bound = server.bind().await?;

        // The datastore opens after the bind and before the first accept,
        // so no request ever sees a half-started service. A failed open
        // drops the bound listener without serving anything.
        if let Some(store) = datastore.as_mut() {
            tracing::info!(datastore = store.name(), "opening datastore");
            store.open().await?;
        }

        let _ = self.bound_tx.send(Some(bound.local_addr()));

        match bound.serve(self.shutdown.clone(), self.forced.clone()).await {
            DrainOutcome::Completed => tracing::info!("drain complete"),
            DrainOutcome::DeadlineExpired { abandoned } => {
                tracing::warn!(abandoned, "drain deadline expired");
            }
            DrainOutcome::Forced { abandoned } => {
                tracing::warn!(abandoned, "drain cut short by second stop signal");
            }
        }

        // The datastore outlives the last in-flight request: it closes
        // exactly once, only after the drain has ended.
        if let Some(store) = datastore.as_mut() {
            tracing::info!(datastore = store.name(), "closing datastore");
            if let Err(e) = store.close().await {
                tracing::error!(datastore = store.name(), error = %e, "datastore close failed");
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("listen", &self.config.listen)
            .field("routes", &self.registry.len())
            .field("datastore", &self.datastore.is_some())
            .field("state", &self.state.current())
            .finish()
    }
}
