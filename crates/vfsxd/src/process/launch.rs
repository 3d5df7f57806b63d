//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::info;

use crate::StructuredHealthReporter;
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::HealthReporter;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
}

/// Runs the daemon in the foreground until a termination signal arrives.
///
/// # Errors
///
/// Returns a [`LaunchError`] when bootstrap fails, the socket cannot be
/// served, or signal handlers cannot be installed.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
    } = plan;

    info!(target: PROCESS_TARGET, "starting bridge daemon");
    let daemon = bootstrap_with(&loader, reporter)?;
    let running = daemon.start()?;

    // The listener is stopped even when waiting for a signal fails, so the
    // socket file never outlives the process.
    let waited = shutdown.wait();
    running.stop()?;
    waited?;

    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;
    use vfsx_config::{Config, HandlerKind};

    use super::*;
    use crate::bootstrap::StaticConfigLoader;
    use crate::client::BridgeClient;
    use crate::process::shutdown::ShutdownError;
    use crate::protocol::{Request, Status};

    /// Exercises the live socket, then lets shutdown proceed.
    struct ProbeThenStop {
        socket: Utf8PathBuf,
        statuses: Mutex<Vec<Status>>,
        fail: bool,
    }

    impl ShutdownSignal for ProbeThenStop {
        fn wait(&self) -> Result<(), ShutdownError> {
            let mut client = BridgeClient::connect(&self.socket).expect("connect to daemon");
            let connect = client
                .send(&Request::new("connect", "/srv/share", Vec::<String>::new()))
                .expect("connect status");
            let mkdir = client
                .send(&Request::new("mkdir", "/srv/share", ["docs", "493"]))
                .expect("mkdir status");
            self.statuses
                .lock()
                .expect("statuses lock")
                .extend([connect, mkdir]);
            if self.fail {
                Err(ShutdownError::Install {
                    source: io::Error::other("signal handlers unavailable"),
                })
            } else {
                Ok(())
            }
        }
    }

    struct Workspace {
        _dir: TempDir,
        config: Config,
    }

    #[fixture]
    fn workspace() -> Workspace {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = Utf8PathBuf::from_path_buf(dir.path().join("run").join("vfsx.sock"))
            .expect("utf8 temp path");
        let config = Config {
            socket_path: socket,
            handler: HandlerKind::ReadOnly,
            ..Config::default()
        };
        Workspace { _dir: dir, config }
    }

    fn probe(config: &Config, fail: bool) -> ProbeThenStop {
        ProbeThenStop {
            socket: config.socket_path().to_owned(),
            statuses: Mutex::new(Vec::new()),
            fail,
        }
    }

    #[rstest]
    fn daemon_serves_until_shutdown(workspace: Workspace) {
        let shutdown = probe(&workspace.config, false);
        let plan = LaunchPlan {
            loader: StaticConfigLoader::new(workspace.config.clone()),
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown,
        };

        run_daemon_with(plan).expect("daemon run");

        assert!(
            !workspace.config.socket_path().exists(),
            "socket should be removed on shutdown"
        );
    }

    #[rstest]
    fn read_only_daemon_answers_over_the_socket(workspace: Workspace) {
        let shutdown = Arc::new(probe(&workspace.config, false));
        let plan = LaunchPlan {
            loader: StaticConfigLoader::new(workspace.config.clone()),
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: SharedSignal(Arc::clone(&shutdown)),
        };

        run_daemon_with(plan).expect("daemon run");

        let statuses = shutdown.statuses.lock().expect("statuses lock").clone();
        assert_eq!(statuses, [Status::Transparent, Status::Unauthorized]);
    }

    #[rstest]
    fn failed_signal_wait_still_releases_socket(workspace: Workspace) {
        let plan = LaunchPlan {
            loader: StaticConfigLoader::new(workspace.config.clone()),
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: probe(&workspace.config, true),
        };

        let error = run_daemon_with(plan).expect_err("signal wait fails");

        assert!(matches!(error, LaunchError::Shutdown { .. }));
        assert!(!workspace.config.socket_path().exists());
    }

    struct SharedSignal(Arc<ProbeThenStop>);

    impl ShutdownSignal for SharedSignal {
        fn wait(&self) -> Result<(), ShutdownError> {
            self.0.wait()
        }
    }
}
