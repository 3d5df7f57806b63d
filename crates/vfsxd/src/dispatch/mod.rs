//! Request dispatch for bridged VFS operations.
//!
//! The dispatcher turns a decoded [`Request`](crate::protocol::Request) into a
//! [`Status`](crate::protocol::Status): it looks up or creates the session for
//! the request's key, resolves the operation name against the closed
//! operation table, and invokes the session's handler inside a fault boundary.
//! Handler faults never escape; they are logged and answered with `-1`.
//!
//! The connection handler wires the dispatcher to the transport layer. It
//! reads whatever the shim sends, splits the read into frames, and writes one
//! status per frame:
//!
//! ```text
//! shim   -> mkdir:/srv/share:docs,493
//! daemon <- 0
//! shim   -> truncate:/srv/share:file.txt
//! daemon <- -3
//! ```

mod connection;
mod errors;
mod router;

pub(crate) use self::connection::DispatchConnectionHandler;
pub use self::errors::{ConnectionError, HandlerFault};
pub use self::router::{Dispatcher, Resolution};
