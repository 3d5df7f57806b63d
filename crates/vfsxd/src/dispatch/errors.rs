//! Error types for dispatch and connection failures.
//!
//! None of these reach the shim. Handler faults are reported as `-1` on the
//! wire and logged with the detail carried here; connection errors close the
//! affected connection only.

use std::io;

use thiserror::Error;

use crate::handler::{HandlerError, Operation};
use crate::session::SessionKey;

/// A handler failed while serving an operation.
#[derive(Debug, Error)]
pub enum HandlerFault {
    /// The handler returned an error.
    #[error("{operation} handler for session '{session}' failed: {source}")]
    Failed {
        operation: Operation,
        session: SessionKey,
        #[source]
        source: HandlerError,
    },
    /// The handler panicked.
    #[error("{operation} handler for session '{session}' panicked: {message}")]
    Panicked {
        operation: Operation,
        session: SessionKey,
        message: String,
    },
}

/// Transport faults that end a single connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket timeouts could not be applied.
    #[error("failed to configure connection timeouts: {source}")]
    Configure {
        #[source]
        source: io::Error,
    },
    /// Reading from the peer failed.
    #[error("failed to read request: {source}")]
    Read {
        #[source]
        source: io::Error,
    },
    /// Writing a response failed.
    #[error("failed to write response: {source}")]
    Write {
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Whether the fault was a configured I/O timeout expiring.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        let source = match self {
            Self::Configure { .. } => return false,
            Self::Read { source } | Self::Write { source } => source,
        };
        matches!(
            source.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        )
    }
}
