//! Textual wire codec shared by the daemon and the filesystem shim.
//!
//! Requests are single frames of the form `operation:key[:arg1,arg2,...]`.
//! The operation and the session key are mandatory; the argument segment is
//! optional and split on commas. Only the first two colons delimit fields, so
//! arguments may themselves contain colons.
//!
//! Responses are the decimal ASCII rendering of a [`Status`] code with no
//! delimiter or length prefix:
//!
//! | code | meaning                                   |
//! |------|-------------------------------------------|
//! | `0`  | transparent success, the caller proceeds  |
//! | `-1` | general error, the caller aborts          |
//! | `-2` | authorisation failure, the caller aborts  |
//! | `-3` | operation not implemented                 |
//!
//! ## Framing
//!
//! The protocol has no length prefix. The shim writes one fixed-size,
//! NUL-padded buffer per request and waits for the answer, so one read
//! normally carries exactly one frame. [`split_frames`] additionally splits a
//! read at NUL and newline terminators so that several terminated frames
//! arriving together are answered individually. A frame cut in half by a read
//! boundary cannot be detected and is decoded as two separate frames.

use std::fmt;
use std::str::Utf8Error;

use thiserror::Error;

/// Size of the shim's request buffer, and of a single server read.
pub const MAX_FRAME_BYTES: usize = 512;

const FIELD_SEPARATOR: char = ':';
const ARGUMENT_SEPARATOR: &str = ",";

/// Errors raised while decoding frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame carried no text once padding was removed.
    #[error("empty request frame")]
    Empty,
    /// The frame was not valid UTF-8.
    #[error("request frame is not valid UTF-8: {source}")]
    InvalidUtf8 {
        #[source]
        source: Utf8Error,
    },
    /// The frame lacked the `operation:key` prefix.
    #[error("request frame '{frame}' has no session key")]
    MissingKey { frame: String },
    /// The operation field was empty.
    #[error("request frame '{frame}' has an empty operation")]
    EmptyOperation { frame: String },
    /// A response was not a decimal status code.
    #[error("invalid status response '{text}'")]
    InvalidStatus { text: String },
}

/// A decoded operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    operation: String,
    key: String,
    arguments: Vec<String>,
}

impl Request {
    /// Builds a request from its parts.
    #[must_use]
    pub fn new(
        operation: impl Into<String>,
        key: impl Into<String>,
        arguments: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            operation: operation.into(),
            key: key.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Decodes a single frame.
    ///
    /// Trailing NUL padding and a trailing line ending are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] when the frame is empty, is not UTF-8, has
    /// no key field, or has an empty operation.
    ///
    /// A frame such as `:key` has both fields but no operation name. It is
    /// rejected here and answered with `-1`, rather than being dispatched to
    /// the unknown-operation fallback (`-3`). An empty name is treated as a
    /// malformed frame, not as an operation the daemon does not know.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let trimmed = trim_frame(frame);
        if trimmed.is_empty() {
            return Err(ProtocolError::Empty);
        }
        let text =
            std::str::from_utf8(trimmed).map_err(|source| ProtocolError::InvalidUtf8 { source })?;

        let mut fields = text.splitn(3, FIELD_SEPARATOR);
        let operation = fields.next().unwrap_or_default();
        let Some(key) = fields.next() else {
            return Err(ProtocolError::MissingKey {
                frame: text.to_owned(),
            });
        };
        if operation.is_empty() {
            return Err(ProtocolError::EmptyOperation {
                frame: text.to_owned(),
            });
        }
        let arguments = fields.next().map(split_arguments).unwrap_or_default();

        Ok(Self {
            operation: operation.to_owned(),
            key: key.to_owned(),
            arguments,
        })
    }

    /// Renders the request as frame text, without padding or terminator.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = format!("{}{FIELD_SEPARATOR}{}", self.operation, self.key);
        if !self.arguments.is_empty() {
            frame.push(FIELD_SEPARATOR);
            frame.push_str(&self.arguments.join(ARGUMENT_SEPARATOR));
        }
        frame.into_bytes()
    }

    /// Operation name exactly as received.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Opaque session key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Positional arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

/// Outcome of an operation, as seen by the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation proceeds with unmodified semantics.
    Transparent,
    /// General failure; the operation must not proceed.
    Error,
    /// The caller is not allowed to perform the operation.
    Unauthorized,
    /// No handler method serves the operation.
    NotImplemented,
    /// Handler-defined code outside the reserved set.
    Custom(i32),
}

impl Status {
    /// Wire code for this status.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Transparent => 0,
            Self::Error => -1,
            Self::Unauthorized => -2,
            Self::NotImplemented => -3,
            Self::Custom(code) => code,
        }
    }

    /// Maps a wire code onto a status, preferring the reserved variants.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Transparent,
            -1 => Self::Error,
            -2 => Self::Unauthorized,
            -3 => Self::NotImplemented,
            other => Self::Custom(other),
        }
    }

    /// Whether the shim should go on to perform the operation.
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.code() == 0
    }

    /// Renders the status as a response frame.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        self.code().to_string().into_bytes()
    }

    /// Parses a response frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidStatus`] when the frame is not a
    /// decimal integer.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let text = String::from_utf8_lossy(trim_frame(frame)).into_owned();
        text.trim()
            .parse::<i32>()
            .map(Self::from_code)
            .map_err(|_| ProtocolError::InvalidStatus { text })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transparent => write!(formatter, "transparent"),
            Self::Error => write!(formatter, "error"),
            Self::Unauthorized => write!(formatter, "unauthorized"),
            Self::NotImplemented => write!(formatter, "not-implemented"),
            Self::Custom(code) => write!(formatter, "custom({code})"),
        }
    }
}

/// Splits the bytes of one read into candidate frames.
///
/// Frames end at a NUL byte or a newline. Padding and blank segments are
/// dropped. Unterminated trailing bytes form a frame of their own.
pub fn split_frames(read: &[u8]) -> impl Iterator<Item = &[u8]> {
    read.split(|byte| *byte == b'\0' || *byte == b'\n')
        .filter(|segment| !trim_frame(segment).is_empty())
}

fn split_arguments(segment: &str) -> Vec<String> {
    if segment.is_empty() {
        return Vec::new();
    }
    segment
        .split(ARGUMENT_SEPARATOR)
        .map(str::to_owned)
        .collect()
}

/// Trims trailing NUL padding and line endings.
fn trim_frame(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| !matches!(byte, b'\0' | b'\r' | b'\n'))
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}
