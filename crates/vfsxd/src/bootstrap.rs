//! Daemon bootstrap orchestration.
//!
//! Bootstrapping resolves configuration, installs telemetry, prepares the
//! socket directory and builds the session registry. The resulting
//! [`Daemon`] can still have its handler factory replaced; [`Daemon::start`]
//! then binds the socket and hands back a [`RunningDaemon`].

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use vfsx_config::{Config, SocketPath, SocketPreparationError};

use crate::dispatch::{DispatchConnectionHandler, Dispatcher};
use crate::handler::stock_factory;
use crate::health::HealthReporter;
use crate::session::{HandlerFactory, SessionRegistry};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already resolved configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare bridge socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    registry: SessionRegistry,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Replaces the configured stock handler with a custom factory.
    ///
    /// Only possible before [`Daemon::start`]; once serving, every session is
    /// built by the same factory.
    pub fn set_handler_factory(&mut self, factory: Arc<dyn HandlerFactory>) {
        self.registry.set_handler_factory(factory);
    }

    /// Binds the bridge socket and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns a [`ListenerError`] when the socket is held by a live process,
    /// the path is occupied by something other than a socket, or binding
    /// fails.
    pub fn start(self) -> Result<RunningDaemon, ListenerError> {
        let Self {
            config,
            registry,
            reporter,
            ..
        } = self;
        let socket = config.socket();

        let listener = match SocketListener::bind(&socket) {
            Ok(listener) => listener,
            Err(error) => {
                reporter.listener_failed(&error);
                return Err(error);
            }
        };

        let registry = Arc::new(registry);
        let handler = DispatchConnectionHandler::new(
            Dispatcher::new(Arc::clone(&registry)),
            config.status_policy(),
        )
        .with_io_timeout(config.io_timeout());

        let listener = match listener.start(Arc::new(handler)) {
            Ok(handle) => handle,
            Err(error) => {
                reporter.listener_failed(&error);
                return Err(error);
            }
        };
        reporter.listener_ready(&socket);

        Ok(RunningDaemon {
            socket,
            registry,
            listener,
            reporter,
        })
    }
}

/// A daemon that is accepting connections.
pub struct RunningDaemon {
    socket: SocketPath,
    registry: Arc<SessionRegistry>,
    listener: ListenerHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl RunningDaemon {
    /// Socket the daemon listens on.
    #[must_use]
    pub fn socket(&self) -> &SocketPath {
        &self.socket
    }

    /// Live session registry.
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Stops accepting connections, waits for the listener thread and
    /// removes the socket file.
    ///
    /// Connections already being served finish on their own threads.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept loop panicked.
    pub fn stop(self) -> Result<(), ListenerError> {
        let Self {
            socket,
            listener,
            reporter,
            ..
        } = self;
        listener.shutdown();
        let joined = listener.join();
        match &joined {
            Ok(()) => reporter.listener_stopped(&socket),
            Err(error) => reporter.listener_failed(error),
        }
        joined
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration, telemetry or socket
/// preparation fails. Every failure is reported to `reporter` first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    if let Err(source) = config.socket().prepare_filesystem() {
        let error = BootstrapError::Socket { source };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let registry = SessionRegistry::new(stock_factory(config.handler()));
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        registry,
        telemetry,
        reporter,
    })
}
