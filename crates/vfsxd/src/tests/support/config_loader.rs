//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;
use vfsx_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader that places the bridge socket under a temporary directory.
pub struct TestConfigLoader {
    _socket_dir: TempDir,
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let socket_dir =
            TempDir::new().expect("failed to create temporary directory for socket");
        let socket_path = Utf8PathBuf::from_path_buf(socket_dir.path().join("vfsx.sock"))
            .expect("temporary socket path was not valid UTF-8");
        Self {
            _socket_dir: socket_dir,
            config: Config {
                socket_path,
                ..Config::default()
            },
        }
    }

    /// Applies `change` to the configuration handed out by the loader.
    pub fn configure(&mut self, change: impl FnOnce(&mut Config)) {
        change(&mut self.config);
    }

    /// Socket path the loaded configuration points at.
    #[must_use]
    pub fn socket_path(&self) -> Utf8PathBuf {
        self.config.socket_path.clone()
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by asking for a handler that does not exist.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("vfsxd"),
            OsString::from("--handler"),
            OsString::from("teleport"),
        ];
        Config::load_from_iter(args)
    }
}
