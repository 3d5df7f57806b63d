//! BDD test world for the bootstrap lifecycle: loader, reporter and daemon
//! state shared between step functions.

use std::cell::RefCell;
use std::sync::Arc;

use camino::Utf8PathBuf;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, RunningDaemon, bootstrap_with};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: TestConfigLoader,
    failing: bool,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    running: Option<RunningDaemon>,
    bootstrap_error: Option<BootstrapError>,
    start_error: Option<String>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            failing: false,
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            running: None,
            bootstrap_error: None,
            start_error: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.failing = true;
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.failing = false;
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }

        let loader: &dyn ConfigLoader = if self.failing {
            &FailingConfigLoader
        } else {
            &self.loader
        };
        match bootstrap_with(loader, self.reporter.clone()) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Starts serving with the bootstrapped daemon.
    pub fn start(&mut self) {
        let Some(daemon) = self.daemon.take() else {
            self.start_error = Some(String::from("daemon was not bootstrapped"));
            return;
        };
        match daemon.start() {
            Ok(running) => self.running = Some(running),
            Err(error) => self.start_error = Some(error.to_string()),
        }
    }

    /// Stops a running daemon.
    pub fn stop(&mut self) -> Result<(), String> {
        let running = self
            .running
            .take()
            .ok_or_else(|| String::from("daemon is not running"))?;
        running.stop().map_err(|error| error.to_string())
    }

    /// Returns whether bootstrap produced an error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns true when the daemon handle is available.
    #[must_use]
    pub fn daemon_bootstrapped(&self) -> bool {
        self.daemon.is_some()
    }

    /// Error reported by the last start attempt.
    #[must_use]
    pub fn start_error(&self) -> Option<&str> {
        self.start_error.as_deref()
    }

    /// Socket path the daemon is configured with.
    #[must_use]
    pub fn socket_path(&self) -> Utf8PathBuf {
        self.loader.socket_path()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop();
        }
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
