//! Per-connection request loop.
//!
//! A connection cycles through reading, dispatching and responding until the
//! peer closes it or a transport fault occurs. Each read is capped at
//! [`MAX_FRAME_BYTES`], the size of the buffers the shim writes, and is split
//! into frames at NUL or newline terminators. Every frame gets exactly one
//! status back, in order. Framing follows read boundaries: a frame that
//! arrives in two pieces is answered as two frames.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use tracing::{debug, info, warn};
use vfsx_config::StatusPolicy;

use super::errors::ConnectionError;
use super::router::{DISPATCH_TARGET, Dispatcher};
use crate::protocol::{MAX_FRAME_BYTES, Request, Status, split_frames};
use crate::transport::ConnectionHandler;

/// Connection handler that serves bridge requests until the peer hangs up.
#[derive(Debug)]
pub(crate) struct DispatchConnectionHandler {
    dispatcher: Dispatcher,
    policy: StatusPolicy,
    io_timeout: Option<Duration>,
}

impl DispatchConnectionHandler {
    /// Creates a handler that answers through `dispatcher` under `policy`.
    pub fn new(dispatcher: Dispatcher, policy: StatusPolicy) -> Self {
        Self {
            dispatcher,
            policy,
            io_timeout: None,
        }
    }

    /// Applies a read and write timeout to every accepted connection.
    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Serves frames from `stream` until end of stream.
    ///
    /// Returns the number of frames answered.
    pub(crate) fn serve<S: Read + Write>(&self, stream: &mut S) -> Result<usize, ConnectionError> {
        let mut buffer = [0_u8; MAX_FRAME_BYTES];
        let mut answered = 0_usize;
        loop {
            let bytes_read = read_with_retry(stream, &mut buffer)
                .map_err(|source| ConnectionError::Read { source })?;
            if bytes_read == 0 {
                return Ok(answered);
            }

            for frame in split_frames(&buffer[..bytes_read]) {
                let status = self.respond_to(frame);
                stream
                    .write_all(&status.encode())
                    .map_err(|source| ConnectionError::Write { source })?;
                answered += 1;
            }
            stream
                .flush()
                .map_err(|source| ConnectionError::Write { source })?;
        }
    }

    fn respond_to(&self, frame: &[u8]) -> Status {
        let computed = match Request::decode(frame) {
            Ok(request) => self.dispatcher.dispatch(&request),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request frame");
                Status::Error
            }
        };
        let written = wire_status(self.policy, computed);
        if written != computed {
            debug!(
                target: DISPATCH_TARGET,
                %computed,
                %written,
                "status masked by policy"
            );
        }
        written
    }

    fn configure(&self, stream: &UnixStream) -> Result<(), ConnectionError> {
        stream
            .set_read_timeout(self.io_timeout)
            .and_then(|()| stream.set_write_timeout(self.io_timeout))
            .map_err(|source| ConnectionError::Configure { source })
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, mut stream: UnixStream) {
        if let Err(error) = self.configure(&stream) {
            warn!(target: DISPATCH_TARGET, %error, "dropping connection");
            return;
        }

        match self.serve(&mut stream) {
            Ok(answered) => {
                debug!(target: DISPATCH_TARGET, answered, "connection closed by peer");
            }
            Err(error) if error.is_timeout() => {
                info!(target: DISPATCH_TARGET, %error, "connection timed out");
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "connection closed after transport fault");
            }
        }
    }
}

/// Status actually written for a dispatched status under `policy`.
fn wire_status(policy: StatusPolicy, computed: Status) -> Status {
    match policy {
        StatusPolicy::Report => computed,
        StatusPolicy::Transparent => Status::Transparent,
    }
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<S: Read>(stream: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}
