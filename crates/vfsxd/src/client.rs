//! Shim side of the bridge protocol.
//!
//! [`BridgeClient`] speaks to a running daemon exactly as the filesystem shim
//! does: each request is written as a zero-padded buffer of
//! [`MAX_FRAME_BYTES`] bytes and the answer is read with a single short read.
//! It is used by the behaviour suites and is handy for probing a live socket.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::{MAX_FRAME_BYTES, ProtocolError, Request, Status};

/// Largest response the shim reads back, matching its three byte buffer.
pub const MAX_RESPONSE_BYTES: usize = 3;

/// Errors raised while talking to the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to apply socket timeout: {source}")]
    Timeout {
        #[source]
        source: io::Error,
    },
    #[error("request of {size} bytes does not fit a {max} byte frame")]
    FrameTooLarge { size: usize, max: usize },
    #[error("failed to send request: {source}")]
    Send {
        #[source]
        source: io::Error,
    },
    #[error("failed to receive response: {source}")]
    Receive {
        #[source]
        source: io::Error,
    },
    #[error("daemon closed the connection without answering")]
    Closed,
    #[error("daemon sent an unreadable response: {source}")]
    Response {
        #[source]
        source: ProtocolError,
    },
}

/// Connection to a bridge daemon.
#[derive(Debug)]
pub struct BridgeClient {
    stream: UnixStream,
}

impl BridgeClient {
    /// Connects to the daemon listening at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] if nothing accepts connections there.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|source| ClientError::Connect {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { stream })
    }

    /// Bounds how long a send or receive may block.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] if the socket rejects the timeout.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), ClientError> {
        self.stream
            .set_read_timeout(timeout)
            .and_then(|()| self.stream.set_write_timeout(timeout))
            .map_err(|source| ClientError::Timeout { source })
    }

    /// Sends one request as a padded frame and waits for its status.
    ///
    /// # Errors
    ///
    /// Fails when the encoded request leaves no room for a NUL terminator in
    /// the frame, on I/O faults, or when the daemon hangs up or answers with
    /// something other than a status code.
    pub fn send(&mut self, request: &Request) -> Result<Status, ClientError> {
        let encoded = request.encode();
        if encoded.len() >= MAX_FRAME_BYTES {
            return Err(ClientError::FrameTooLarge {
                size: encoded.len(),
                max: MAX_FRAME_BYTES - 1,
            });
        }
        let mut frame = [0_u8; MAX_FRAME_BYTES];
        frame[..encoded.len()].copy_from_slice(&encoded);
        self.send_raw(&frame)
    }

    /// Writes `bytes` verbatim and reads one status.
    ///
    /// # Errors
    ///
    /// Fails on I/O faults, when the daemon hangs up, or when the response is
    /// not a status code.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<Status, ClientError> {
        self.stream
            .write_all(bytes)
            .and_then(|()| self.stream.flush())
            .map_err(|source| ClientError::Send { source })?;
        self.receive()
    }

    fn receive(&mut self) -> Result<Status, ClientError> {
        let mut response = [0_u8; MAX_RESPONSE_BYTES];
        let read = loop {
            match self.stream.read(&mut response) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(ClientError::Receive { source }),
            }
        };
        if read == 0 {
            return Err(ClientError::Closed);
        }
        Status::decode(&response[..read]).map_err(|source| ClientError::Response { source })
    }
}
