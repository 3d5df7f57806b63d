//! Pluggable handler contract for bridged VFS operations.
//!
//! Each session owns one [`VfsHandler`]. The recognised operation set is
//! closed ([`Operation`]) and every operation maps to one trait method. A
//! handler overrides the operations it cares about; anything else falls
//! through to [`VfsHandler::unhandled`], which answers
//! [`Status::NotImplemented`] unless the handler chooses otherwise.
//!
//! Handlers receive a [`SessionContext`] and the raw positional arguments
//! sent by the shim. Parsing those strings is the handler's business; [`Arguments`]
//! provides helpers that turn missing or malformed values into
//! [`HandlerError`]s.

mod arguments;
mod stock;

use std::any::Any;

use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::protocol::Status;
use crate::session::SessionKey;

pub use self::arguments::Arguments;
pub use self::stock::{AuditHandler, ReadOnlyHandler, TransparentHandler, stock_factory};

/// Result returned by every handler method.
pub type HandlerResult = Result<Status, HandlerError>;

/// VFS operations the shim forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    /// A share or volume is being mounted.
    Connect,
    /// The share or volume is being released.
    Disconnect,
    /// `opendir(path)`.
    Opendir,
    /// `mkdir(path, mode)`.
    Mkdir,
    /// `rmdir(path)`.
    Rmdir,
    /// `open(path, flags, mode)`.
    Open,
    /// `close(path)`.
    Close,
    /// `create(path)`.
    Create,
    /// `read(path)`.
    Read,
    /// `pread(path)`.
    Pread,
    /// `write(path)`.
    Write,
    /// `pwrite(path)`.
    Pwrite,
    /// `lseek(path)`.
    Lseek,
    /// `rename(old_path, new_path)`.
    Rename,
    /// `unlink(path)`.
    Unlink,
}

impl Operation {
    /// Every recognised operation, in protocol order.
    pub const ALL: [Self; 15] = [
        Self::Connect,
        Self::Disconnect,
        Self::Opendir,
        Self::Mkdir,
        Self::Rmdir,
        Self::Open,
        Self::Close,
        Self::Create,
        Self::Read,
        Self::Pread,
        Self::Write,
        Self::Pwrite,
        Self::Lseek,
        Self::Rename,
        Self::Unlink,
    ];

    /// Wire name of the operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the operation changes filesystem contents or layout.
    ///
    /// `open` is excluded: whether it mutates depends on its flags.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(
            self,
            Self::Mkdir
                | Self::Rmdir
                | Self::Create
                | Self::Write
                | Self::Pwrite
                | Self::Rename
                | Self::Unlink
        )
    }
}

/// Faults raised by handler methods.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A positional argument the operation needs was not sent.
    #[error("missing argument {index} ({name})")]
    MissingArgument { index: usize, name: &'static str },
    /// A positional argument could not be interpreted.
    #[error("invalid {name} argument '{value}': {message}")]
    InvalidArgument {
        name: &'static str,
        value: String,
        message: String,
    },
    /// Handler-specific failure.
    #[error("{message}")]
    Failed { message: String },
}

impl HandlerError {
    /// Creates a handler-specific failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// What a handler knows about the call it is serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    key: SessionKey,
    operation: Operation,
}

impl SessionContext {
    /// Creates the context for `operation` on the session keyed by `key`.
    pub fn new(key: SessionKey, operation: Operation) -> Self {
        Self { key, operation }
    }

    /// Key of the session the operation targets.
    #[must_use]
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Operation being served.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Per-session handler for bridged operations.
///
/// All operation methods default to [`VfsHandler::unhandled`].
pub trait VfsHandler: Send {
    /// Fallback for recognised operations the handler does not override.
    fn unhandled(&mut self, _session: &SessionContext, _args: &Arguments) -> HandlerResult {
        Ok(Status::NotImplemented)
    }

    /// Handles `connect`.
    fn connect(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `disconnect`. The session has already left the registry.
    fn disconnect(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `opendir`.
    fn opendir(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `mkdir`.
    fn mkdir(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `rmdir`.
    fn rmdir(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `open`.
    fn open(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `close`.
    fn close(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `create`.
    fn create(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `read`.
    fn read(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `pread`.
    fn pread(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `write`.
    fn write(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `pwrite`.
    fn pwrite(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `lseek`.
    fn lseek(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `rename`.
    fn rename(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }

    /// Handles `unlink`.
    fn unlink(&mut self, session: &SessionContext, args: &Arguments) -> HandlerResult {
        self.unhandled(session, args)
    }
}

/// Calls the handler method serving `operation`.
pub(crate) fn invoke(
    handler: &mut dyn VfsHandler,
    session: &SessionContext,
    args: &Arguments,
) -> HandlerResult {
    match session.operation() {
        Operation::Connect => handler.connect(session, args),
        Operation::Disconnect => handler.disconnect(session, args),
        Operation::Opendir => handler.opendir(session, args),
        Operation::Mkdir => handler.mkdir(session, args),
        Operation::Rmdir => handler.rmdir(session, args),
        Operation::Open => handler.open(session, args),
        Operation::Close => handler.close(session, args),
        Operation::Create => handler.create(session, args),
        Operation::Read => handler.read(session, args),
        Operation::Pread => handler.pread(session, args),
        Operation::Write => handler.write(session, args),
        Operation::Pwrite => handler.pwrite(session, args),
        Operation::Lseek => handler.lseek(session, args),
        Operation::Rename => handler.rename(session, args),
        Operation::Unlink => handler.unlink(session, args),
    }
}

/// Text carried by a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}
