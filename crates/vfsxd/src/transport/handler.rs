//! Connection handling abstraction for the listener.

use std::os::unix::net::UnixStream;

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection until it closes. Implementations should
    /// avoid panicking; a panic only ends that connection's thread.
    fn handle(&self, stream: UnixStream);
}
