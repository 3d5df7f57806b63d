//! Handlers used by the wire-level scenarios.

use std::sync::Arc;

use crate::handler::{Arguments, HandlerError, HandlerResult, SessionContext, VfsHandler};
use crate::protocol::Status;
use crate::session::{HandlerFactory, SessionKey};

/// Implements `connect`, fails `write` and panics on `lseek`.
///
/// Every other operation keeps the default not-implemented answer.
#[derive(Debug, Default)]
pub struct ProbeHandler;

impl VfsHandler for ProbeHandler {
    fn connect(&mut self, _session: &SessionContext, _args: &Arguments) -> HandlerResult {
        Ok(Status::Transparent)
    }

    fn write(&mut self, session: &SessionContext, _args: &Arguments) -> HandlerResult {
        Err(HandlerError::failed(format!(
            "write refused for {}",
            session.key()
        )))
    }

    fn lseek(&mut self, _session: &SessionContext, _args: &Arguments) -> HandlerResult {
        panic!("probe handler cannot seek");
    }
}

/// Factory building a [`ProbeHandler`] per session.
#[must_use]
pub fn probe_factory() -> Arc<dyn HandlerFactory> {
    Arc::new(|_: &SessionKey| -> Box<dyn VfsHandler> { Box::new(ProbeHandler) })
}
