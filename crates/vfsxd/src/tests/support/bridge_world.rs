//! World for wire-level scenarios: a daemon on a temporary socket and a
//! client speaking the shim's framing.

use std::os::unix::net::UnixListener;
use std::sync::Arc;

use vfsx_config::{HandlerKind, StatusPolicy};

use crate::bootstrap::{RunningDaemon, bootstrap_with};
use crate::client::BridgeClient;
use crate::protocol::{MAX_FRAME_BYTES, Status};
use crate::session::{HandlerFactory, SessionKey};

use super::config_loader::TestConfigLoader;
use super::reporter::RecordingHealthReporter;

/// Scenario world holding the running bridge and one shim connection.
pub struct BridgeWorld {
    loader: TestConfigLoader,
    reporter: Arc<RecordingHealthReporter>,
    factory: Option<Arc<dyn HandlerFactory>>,
    running: Option<RunningDaemon>,
    client: Option<BridgeClient>,
    squatter: Option<UnixListener>,
    last_status: Option<Status>,
    start_error: Option<String>,
}

impl BridgeWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: TestConfigLoader::new(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            factory: None,
            running: None,
            client: None,
            squatter: None,
            last_status: None,
            start_error: None,
        }
    }

    /// Selects a stock handler through configuration.
    pub fn use_stock_handler(&mut self, kind: HandlerKind) {
        self.loader.configure(|config| config.handler = kind);
        self.factory = None;
    }

    /// Replaces the configured handler with a custom factory.
    pub fn use_factory(&mut self, factory: Arc<dyn HandlerFactory>) {
        self.factory = Some(factory);
    }

    /// Sets the status policy applied to responses.
    pub fn use_status_policy(&mut self, policy: StatusPolicy) {
        self.loader.configure(|config| config.status_policy = policy);
    }

    /// Leaves a socket file behind with nothing listening on it.
    pub fn leave_stale_socket(&mut self) {
        let path = self.loader.socket_path();
        drop(UnixListener::bind(path.as_std_path()).expect("bind stale socket"));
        assert!(path.exists(), "stale socket file should remain");
    }

    /// Keeps another listener on the socket path.
    pub fn occupy_socket(&mut self) {
        let path = self.loader.socket_path();
        self.squatter = Some(UnixListener::bind(path.as_std_path()).expect("bind squatter"));
    }

    /// Bootstraps and starts the daemon, then connects the shim.
    pub fn start(&mut self) {
        let mut daemon = match bootstrap_with(&self.loader, self.reporter.clone()) {
            Ok(daemon) => daemon,
            Err(error) => {
                self.start_error = Some(error.to_string());
                return;
            }
        };
        if let Some(factory) = self.factory.clone() {
            daemon.set_handler_factory(factory);
        }
        match daemon.start() {
            Ok(running) => {
                let client =
                    BridgeClient::connect(self.loader.socket_path()).expect("connect shim");
                self.running = Some(running);
                self.client = Some(client);
            }
            Err(error) => self.start_error = Some(error.to_string()),
        }
    }

    /// Sends `text` as one zero-padded frame and records the answer.
    pub fn send(&mut self, text: &str) -> Result<(), String> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| String::from("bridge is not running"))?;
        let mut frame = [0_u8; MAX_FRAME_BYTES];
        frame
            .get_mut(..text.len())
            .ok_or_else(|| format!("frame '{text}' exceeds {MAX_FRAME_BYTES} bytes"))?
            .copy_from_slice(text.as_bytes());
        let status = client.send_raw(&frame).map_err(|error| error.to_string())?;
        self.last_status = Some(status);
        Ok(())
    }

    /// Status returned for the last frame.
    #[must_use]
    pub fn last_status(&self) -> Option<Status> {
        self.last_status
    }

    /// Number of live sessions in the running daemon.
    pub fn session_count(&self) -> Result<usize, String> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| String::from("bridge is not running"))?;
        Ok(running.registry().len())
    }

    /// Whether the running daemon holds a session for `key`.
    pub fn has_session(&self, key: &str) -> Result<bool, String> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| String::from("bridge is not running"))?;
        Ok(running.registry().contains(&SessionKey::from(key)))
    }

    /// Whether a shim connection is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Error reported while starting, if any.
    #[must_use]
    pub fn start_error(&self) -> Option<&str> {
        self.start_error.as_deref()
    }

    /// Recorded lifecycle events.
    #[must_use]
    pub fn reporter(&self) -> &RecordingHealthReporter {
        &self.reporter
    }
}

impl Default for BridgeWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BridgeWorld {
    fn drop(&mut self) {
        self.client = None;
        if let Some(running) = self.running.take() {
            let _ = running.stop();
        }
    }
}
