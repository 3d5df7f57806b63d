//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use vfsx_config::{Config, SocketPath};

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the socket accepts connections.
    fn listener_ready(&self, socket: &SocketPath);

    /// Invoked when the socket cannot be bound or served.
    fn listener_failed(&self, error: &ListenerError);

    /// Invoked after the listener has shut down and released the socket.
    fn listener_stopped(&self, socket: &SocketPath);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_ready(&self, socket: &SocketPath) {
        (**self).listener_ready(socket);
    }

    fn listener_failed(&self, error: &ListenerError) {
        (**self).listener_failed(error);
    }

    fn listener_stopped(&self, socket: &SocketPath) {
        (**self).listener_stopped(socket);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "vfsxd::health",
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: "vfsxd::health",
            event = "bootstrap_succeeded",
            socket = %config.socket(),
            handler = %config.handler(),
            status_policy = %config.status_policy(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "vfsxd::health",
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn listener_ready(&self, socket: &SocketPath) {
        tracing::info!(
            target: "vfsxd::health",
            event = "listener_ready",
            socket = %socket,
            "bridge accepting connections"
        );
    }

    fn listener_failed(&self, error: &ListenerError) {
        tracing::error!(
            target: "vfsxd::health",
            event = "listener_failed",
            error = %error,
            "bridge listener failed"
        );
    }

    fn listener_stopped(&self, socket: &SocketPath) {
        tracing::info!(
            target: "vfsxd::health",
            event = "listener_stopped",
            socket = %socket,
            "bridge listener stopped"
        );
    }
}
