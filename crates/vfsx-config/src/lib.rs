//! Shared configuration for the VFSX bridge daemon.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (`.vfsx.toml`, or the path given with `--config-path` or
//! `VFSX_CONFIG_PATH`), then `VFSX_*` environment variables, and finally CLI
//! flags. The defaults match the socket path hard-coded by the filesystem
//! shim, so a bare `vfsxd` invocation is immediately usable.

mod defaults;
mod logging;
mod policy;
mod socket;

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SOCKET_PATH, default_log_filter, default_log_filter_string,
    default_log_format, default_socket_path,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{HandlerKind, PolicyParseError, StatusPolicy};
pub use socket::{SocketPath, SocketPreparationError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "VFSX")]
pub struct Config {
    /// Filesystem path of the bridge's Unix domain socket.
    #[ortho_config(default = defaults::default_socket_path())]
    pub socket_path: Utf8PathBuf,
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Stock handler constructed for every new session.
    #[ortho_config(default = HandlerKind::default())]
    pub handler: HandlerKind,
    /// Which status code is written back to the shim.
    #[ortho_config(default = StatusPolicy::default())]
    pub status_policy: StatusPolicy,
    /// Read and write timeout applied to every accepted connection.
    pub io_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            handler: HandlerKind::default(),
            status_policy: StatusPolicy::default(),
            io_timeout_secs: None,
        }
    }
}

impl Config {
    /// Resolves the configuration from the process arguments, environment
    /// and configuration file.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] when arguments, the file or environment
    /// values cannot be parsed.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Resolves the configuration from explicit arguments. The first item is
    /// the program name.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] when arguments, the file or environment
    /// values cannot be parsed.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Socket the daemon binds and the shim connects to.
    #[must_use]
    pub fn socket(&self) -> SocketPath {
        SocketPath::new(self.socket_path.clone())
    }

    /// Raw socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        self.socket_path.as_path()
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Handler selected for new sessions.
    #[must_use]
    pub fn handler(&self) -> HandlerKind {
        self.handler
    }

    /// Policy governing the status written on the wire.
    #[must_use]
    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// Per-connection I/O timeout, if configured. Zero disables the timeout.
    #[must_use]
    pub fn io_timeout(&self) -> Option<std::time::Duration> {
        self.io_timeout_secs
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}
