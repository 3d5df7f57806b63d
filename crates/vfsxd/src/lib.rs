//! VFSX bridge daemon.
//!
//! A filesystem shim (typically a Samba VFS module) forwards a fixed set of
//! virtual-filesystem operations over a local Unix socket. The daemon decodes
//! each request, routes it to the handler of the session named by the
//! request's key, and answers with a status code telling the shim whether to
//! proceed (`0`), abort (`-1`), treat the operation as unauthorised (`-2`),
//! or fall back because nothing handled it (`-3`).
//!
//! Sessions follow the share's lifecycle: the first request for a key
//! creates one, `disconnect` removes it. Handlers are pluggable through
//! [`HandlerFactory`]; the stock [`TransparentHandler`], [`AuditHandler`] and
//! [`ReadOnlyHandler`] can be selected from configuration.
//!
//! The connection loop never lets a malformed frame or a failing handler take
//! the daemon down. Malformed frames and handler faults are logged and
//! answered with `-1`, and the connection carries on.

mod bootstrap;
pub mod client;
pub mod dispatch;
pub mod handler;
mod health;
mod process;
pub mod protocol;
pub mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, RunningDaemon, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use client::{BridgeClient, ClientError};
pub use dispatch::{Dispatcher, Resolution};
pub use handler::{
    Arguments, AuditHandler, HandlerError, HandlerResult, Operation, ReadOnlyHandler,
    SessionContext, TransparentHandler, VfsHandler,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use protocol::{ProtocolError, Request, Status};
pub use session::{HandlerFactory, RegistryError, SessionKey, SessionRegistry};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
